use crate::domain::model::ClassificationResult;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 詞形還原器：把單詞還原成詞典形式
pub trait Lemmatizer: Send + Sync {
    fn lemmatize(&self, token: &str) -> String;
}

/// 預先訓練好的機率分類模型
pub trait ClassificationModel: Send + Sync {
    /// Class labels in the order `predict_proba` reports them.
    fn classes(&self) -> &[String];

    fn n_features(&self) -> usize;

    /// One probability per class; `features.len()` must equal `n_features()`.
    fn predict_proba(&self, features: &[f64]) -> Vec<f64>;
}

/// 工單儲存呼叫的分類服務
#[async_trait]
pub trait TicketClassifier: Send + Sync {
    async fn classify_ticket(&self, text: &str) -> Result<ClassificationResult>;
}
