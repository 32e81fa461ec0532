pub mod adapters;
pub mod api;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{HttpClassifierClient, LocalStorage};
pub use app::TicketStore;
pub use config::{ServerArgs, TriageConfig};
pub use core::{classifier::ClassifierService, preprocess::Preprocessor};
pub use utils::error::{Result, TriageError};
