pub mod classifier;
pub mod lemmatizer;
pub mod model;
pub mod preprocess;
pub mod stopwords;
pub mod vectorizer;

pub use crate::domain::model::{ClassificationRequest, ClassificationResult};
pub use crate::domain::ports::{ClassificationModel, Lemmatizer, Storage, TicketClassifier};
pub use crate::utils::error::Result;
