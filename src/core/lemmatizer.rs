//! Dictionary-backed morphological analyzer.
//!
//! The dictionary is a TSV file with one analysis per line:
//! `form<TAB>lemma[<TAB>score]`. A form may appear several times; the
//! analysis with the highest score wins and the first listed wins ties.
//! Chains (a lemma that is itself listed as a form) are followed at load
//! time, so lemmatizing a lemma always returns it unchanged.

use crate::domain::ports::Lemmatizer;
use crate::utils::error::{Result, TriageError};
use std::collections::HashMap;
use std::path::Path;

pub struct DictionaryLemmatizer {
    lemmas: HashMap<String, String>,
}

impl std::fmt::Debug for DictionaryLemmatizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictionaryLemmatizer")
            .field("forms", &self.lemmas.len())
            .finish()
    }
}

fn is_cyrillic_word(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| matches!(c, 'а'..='я' | 'ё'))
}

/// Follows `form -> lemma` links until a word maps to itself or has no entry.
/// A cycle resolves to its alphabetically smallest member.
fn resolve_chain(direct: &HashMap<String, String>, form: &str) -> String {
    let mut path: Vec<&str> = vec![form];
    let mut current = form;

    loop {
        let next = match direct.get(current) {
            Some(next) if next != current => next.as_str(),
            _ => return current.to_string(),
        };
        if let Some(start) = path.iter().position(|seen| *seen == next) {
            let smallest = path[start..].iter().copied().min().unwrap_or(next);
            return smallest.to_string();
        }
        path.push(next);
        current = next;
    }
}

impl DictionaryLemmatizer {
    /// 由 (詞形, 詞元, 分數) 建立；分數最高的分析優先
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S, f64)>,
        S: Into<String>,
    {
        let mut best: HashMap<String, (String, f64)> = HashMap::new();

        for (form, lemma, score) in entries {
            let (form, lemma) = (form.into(), lemma.into());
            if !is_cyrillic_word(&form) || !is_cyrillic_word(&lemma) {
                continue;
            }
            match best.get(&form) {
                Some((_, current)) if *current >= score => {}
                _ => {
                    best.insert(form, (lemma, score));
                }
            }
        }

        let direct: HashMap<String, String> =
            best.into_iter().map(|(form, (lemma, _))| (form, lemma)).collect();

        // 詞元可能又是另一個詞形；沿鏈走到不動點，還原結果再還原一次不變
        let mut lemmas: HashMap<String, String> = direct
            .keys()
            .map(|form| (form.clone(), resolve_chain(&direct, form)))
            .collect();
        let bare: Vec<String> = lemmas
            .values()
            .filter(|lemma| !lemmas.contains_key(*lemma))
            .cloned()
            .collect();
        for lemma in bare {
            lemmas.insert(lemma.clone(), lemma);
        }

        Self { lemmas }
    }

    pub fn from_tsv_str(content: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for (line_no, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split('\t');
            let form = fields.next().unwrap_or_default().trim();
            let lemma = fields.next().map(str::trim).unwrap_or_default();
            if form.is_empty() || lemma.is_empty() {
                return Err(TriageError::ConfigError {
                    message: format!(
                        "lemma dictionary line {}: expected 'form<TAB>lemma[<TAB>score]'",
                        line_no + 1
                    ),
                });
            }

            let score = match fields.next().map(str::trim) {
                Some(s) if !s.is_empty() => s.parse::<f64>().map_err(|e| {
                    TriageError::ConfigError {
                        message: format!(
                            "lemma dictionary line {}: invalid score '{}': {}",
                            line_no + 1,
                            s,
                            e
                        ),
                    }
                })?,
                _ => 1.0,
            };

            entries.push((form.to_lowercase(), lemma.to_lowercase(), score));
        }

        Ok(Self::from_entries(entries))
    }

    /// 從 TSV 詞典檔載入；檔案缺失或格式錯誤屬於啟動錯誤
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| TriageError::artifact(&display, e))?;
        Self::from_tsv_str(&content).map_err(|e| TriageError::artifact(display, e))
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }
}

impl Lemmatizer for DictionaryLemmatizer {
    fn lemmatize(&self, token: &str) -> String {
        self.lemmas
            .get(token)
            .cloned()
            .unwrap_or_else(|| token.to_string())
    }
}
