use crate::utils::error::{Result, TriageError};
use crate::utils::validation::{self, Validate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static RE_ENV_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactsConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub vectorizer_path: String,
    pub model_path: String,
    pub lemmas_path: String,
    pub stopwords_path: Option<String>,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            vectorizer_path: "models/tfidf_vectorizer.json".to_string(),
            model_path: "models/classifier.json".to_string(),
            lemmas_path: "models/lemmas.tsv".to_string(),
            stopwords_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub tickets_path: String,
    pub classifier_url: String,
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            tickets_path: "tickets/tickets.json".to_string(),
            classifier_url: "http://localhost:8000/predict".to_string(),
            timeout_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl TriageConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TriageError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 有指定路徑就讀檔，否則使用預設值
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| TriageError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TICKETS_PATH})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        RE_ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Validate for TriageConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("server.host", &self.server.host)?;
        if self.server.port == 0 {
            return Err(TriageError::InvalidConfigValueError {
                field: "server.port".to_string(),
                value: "0".to_string(),
                reason: "Port must be at least 1".to_string(),
            });
        }

        validation::validate_path("artifacts.vectorizer_path", &self.artifacts.vectorizer_path)?;
        validation::validate_path("artifacts.model_path", &self.artifacts.model_path)?;
        validation::validate_path("artifacts.lemmas_path", &self.artifacts.lemmas_path)?;
        if let Some(path) = &self.artifacts.stopwords_path {
            validation::validate_path("artifacts.stopwords_path", path)?;
        }

        validation::validate_path("store.tickets_path", &self.store.tickets_path)?;
        validation::validate_url("store.classifier_url", &self.store.classifier_url)?;
        validation::validate_range("store.timeout_seconds", self.store.timeout_seconds, 1, 300)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[server]
host = "127.0.0.1"
port = 9000

[artifacts]
vectorizer_path = "artifacts/tfidf.json"
model_path = "artifacts/rf.json"
lemmas_path = "artifacts/lemmas.tsv"
stopwords_path = "artifacts/stopwords.txt"

[store]
tickets_path = "data/tickets.json"
classifier_url = "http://127.0.0.1:9000/predict"
timeout_seconds = 10

[logging]
level = "debug"
json = true
"#;

        let config = TriageConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.server_addr(), "127.0.0.1:9000");
        assert_eq!(config.artifacts.model_path, "artifacts/rf.json");
        assert_eq!(
            config.artifacts.stopwords_path.as_deref(),
            Some("artifacts/stopwords.txt")
        );
        assert_eq!(config.store.timeout_seconds, 10);
        assert!(config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config = TriageConfig::from_toml_str("[server]\nport = 8080\n").unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.artifacts.vectorizer_path, "models/tfidf_vectorizer.json");
        assert_eq!(config.store.classifier_url, "http://localhost:8000/predict");
        assert_eq!(config.store.timeout_seconds, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TRIAGE_TEST_TICKETS", "/var/lib/triage/tickets.json");

        let toml_content = r#"
[store]
tickets_path = "${TRIAGE_TEST_TICKETS}"
"#;

        let config = TriageConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.store.tickets_path, "/var/lib/triage/tickets.json");

        std::env::remove_var("TRIAGE_TEST_TICKETS");
    }

    #[test]
    fn test_config_validation() {
        let config = TriageConfig::from_toml_str(
            r#"
[store]
classifier_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TriageConfig::from_toml_str(
            r#"
[store]
timeout_seconds = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TriageConfig::from_toml_str("[server]\nport = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let err = TriageConfig::from_toml_str("[server\nport = ").unwrap_err();
        assert!(matches!(err, TriageError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[artifacts]
model_path = "file-test/classifier.json"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TriageConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.artifacts.model_path, "file-test/classifier.json");
        assert_eq!(config.artifacts.lemmas_path, "models/lemmas.tsv");
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        let config = TriageConfig::load(None).unwrap();
        assert_eq!(config.server.port, 8000);
        assert!(TriageConfig::load(Some("/nonexistent/triage.toml")).is_err());
    }
}
