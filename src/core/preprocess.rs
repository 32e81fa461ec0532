use crate::core::stopwords::default_stopwords;
use crate::domain::ports::Lemmatizer;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;

static RE_NON_CYRILLIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^а-яё\s]+").expect("valid regex"));

const MIN_TOKEN_CHARS: usize = 3;

/// 文字正規化：小寫、只保留俄文字母、去停用詞與短詞、詞形還原
pub struct Preprocessor {
    stopwords: HashSet<String>,
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl std::fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preprocessor")
            .field("stopwords", &self.stopwords.len())
            .finish()
    }
}

impl Preprocessor {
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self::with_stopwords(lemmatizer, default_stopwords())
    }

    pub fn with_stopwords(lemmatizer: Arc<dyn Lemmatizer>, stopwords: HashSet<String>) -> Self {
        Self {
            stopwords,
            lemmatizer,
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    fn keep(&self, token: &str) -> bool {
        token.chars().count() >= MIN_TOKEN_CHARS && !self.stopwords.contains(token)
    }

    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let cleaned = RE_NON_CYRILLIC.replace_all(&lowered, "");

        cleaned
            .split_whitespace()
            .filter(|token| self.keep(token))
            .map(|token| self.lemmatizer.lemmatize(token))
            // 詞元也可能是停用詞或過短
            .filter(|lemma| self.keep(lemma))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
