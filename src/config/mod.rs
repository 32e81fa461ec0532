pub mod cli;
pub mod toml_config;

pub use cli::ServerArgs;
pub use toml_config::TriageConfig;
