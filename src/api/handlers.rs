use crate::api::AppState;
use crate::domain::model::{ClassificationRequest, ClassificationResponse};
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub classes: Vec<String>,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Support Ticket Classifier API",
    })
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        classes: state.classifier.classes().to_vec(),
    })
}

/// 分類一段工單文字；純計算，不會失敗
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<ClassificationRequest>,
) -> Json<ClassificationResponse> {
    let result = state.classifier.classify(&request.text);
    Json(ClassificationResponse::new(request.text, result))
}
