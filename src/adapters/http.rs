use crate::domain::model::{ClassificationRequest, ClassificationResponse, ClassificationResult};
use crate::domain::ports::TicketClassifier;
use crate::utils::error::{Result, TriageError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// 透過 HTTP 呼叫 `/predict` 的分類客戶端
#[derive(Debug, Clone)]
pub struct HttpClassifierClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpClassifierClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub async fn predict(&self, text: &str) -> Result<ClassificationResponse> {
        tracing::debug!("Sending classification request to: {}", self.endpoint);

        let request = ClassificationRequest {
            text: text.to_string(),
        };
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        tracing::debug!("Classifier response status: {}", response.status());

        if !response.status().is_success() {
            return Err(TriageError::ClassifierUnavailable {
                message: format!("{} returned HTTP {}", self.endpoint, response.status()),
            });
        }

        Ok(response.json::<ClassificationResponse>().await?)
    }
}

#[async_trait]
impl TicketClassifier for HttpClassifierClient {
    async fn classify_ticket(&self, text: &str) -> Result<ClassificationResult> {
        let response = self.predict(text).await?;
        Ok(ClassificationResult {
            category: response.category,
            confidence: response.confidence,
            all_probas: response.all_probas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_classify_ticket_success() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/predict")
                .json_body(serde_json::json!({"text": "Не работает интернет"}));
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "text": "Не работает интернет",
                    "category": "Интернет",
                    "confidence": 0.8,
                    "all_probas": {"Интернет": 0.8, "Оплата": 0.2}
                }));
        });

        let client = HttpClassifierClient::new(server.url("/predict"), Duration::from_secs(5));
        let result = client.classify_ticket("Не работает интернет").await.unwrap();

        api_mock.assert();
        assert_eq!(result.category, "Интернет");
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.all_probas.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_confidence_defaults_to_zero() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/predict");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"text": "x", "category": "Другое"}));
        });

        let client = HttpClassifierClient::new(server.url("/predict"), Duration::from_secs(5));
        let result = client.classify_ticket("x").await.unwrap();

        api_mock.assert();
        assert_eq!(result.category, "Другое");
        assert_eq!(result.confidence, 0.0);
        assert!(result.all_probas.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_classifier_unavailable() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/predict");
            then.status(503);
        });

        let client = HttpClassifierClient::new(server.url("/predict"), Duration::from_secs(5));
        let err = client.classify_ticket("текст").await.unwrap_err();

        api_mock.assert();
        assert!(matches!(err, TriageError::ClassifierUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        // nothing listens on port 9 in the test environment
        let client = HttpClassifierClient::new("http://127.0.0.1:9/predict", Duration::from_secs(1));
        let err = client.classify_ticket("текст").await.unwrap_err();

        assert!(matches!(err, TriageError::HttpError(_)));
    }
}
