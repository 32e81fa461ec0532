use crate::utils::error::{Result, TriageError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// 已擬合的 TF-IDF 向量器匯出檔
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    pub vocabulary: HashMap<String, usize>,
    #[serde(default)]
    pub idf: Option<Vec<f64>>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// Sparse feature vector as `(feature index, weight)` pairs sorted by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_dense(&self, n_features: usize) -> Vec<f64> {
        let mut dense = vec![0.0; n_features];
        for &(idx, weight) in &self.entries {
            if idx < n_features {
                dense[idx] = weight;
            }
        }
        dense
    }
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f64>>,
    ngram_range: (usize, usize),
    sublinear_tf: bool,
    norm: Option<Norm>,
}

impl TfidfVectorizer {
    pub fn from_artifact(artifact: VectorizerArtifact) -> Result<Self> {
        let size = artifact.vocabulary.len();
        let invalid = |message: String| TriageError::ConfigError { message };

        if let Some(idf) = &artifact.idf {
            if idf.len() != size {
                return Err(invalid(format!(
                    "idf has {} entries but vocabulary has {} terms",
                    idf.len(),
                    size
                )));
            }
        }

        let mut seen = HashSet::with_capacity(size);
        for (term, &idx) in &artifact.vocabulary {
            if idx >= size || !seen.insert(idx) {
                return Err(invalid(format!(
                    "vocabulary term '{}' has invalid or duplicate index {}",
                    term, idx
                )));
            }
        }

        let (min_n, max_n) = artifact.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(invalid(format!(
                "invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }

        Ok(Self {
            vocabulary: artifact.vocabulary,
            idf: artifact.idf,
            ngram_range: artifact.ngram_range,
            sublinear_tf: artifact.sublinear_tf,
            norm: artifact.norm,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content =
            std::fs::read_to_string(path).map_err(|e| TriageError::artifact(&display, e))?;
        let artifact: VectorizerArtifact =
            serde_json::from_str(&content).map_err(|e| TriageError::artifact(&display, e))?;
        Self::from_artifact(artifact).map_err(|e| TriageError::artifact(display, e))
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn transform(&self, document: &str) -> SparseVector {
        let tokens: Vec<&str> = RE_TOKEN.find_iter(document).map(|m| m.as_str()).collect();
        let (min_n, max_n) = self.ngram_range;

        // 詞頻計數；不在詞彙表中的詞直接忽略
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for n in min_n..=max_n {
            for window in tokens.windows(n) {
                let term = window.join(" ");
                if let Some(&idx) = self.vocabulary.get(&term) {
                    *counts.entry(idx).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                let idf = self.idf.as_ref().map_or(1.0, |idf| idf[idx]);
                (idx, tf * idf)
            })
            .collect();

        let norm = match self.norm {
            Some(Norm::L2) => entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt(),
            Some(Norm::L1) => entries.iter().map(|(_, w)| w.abs()).sum::<f64>(),
            None => 1.0,
        };
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        }

        SparseVector { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(json: serde_json::Value) -> VectorizerArtifact {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_tfidf_l2_normalized() {
        let v = TfidfVectorizer::from_artifact(artifact(serde_json::json!({
            "vocabulary": {"интернет": 0, "работать": 1, "день": 2},
            "idf": [1.0, 2.0, 1.5]
        })))
        .unwrap();

        let vec = v.transform("работать интернет интернет");
        assert_eq!(vec.entries.len(), 2);
        let (i0, w0) = vec.entries[0];
        let (i1, w1) = vec.entries[1];
        assert_eq!((i0, i1), (0, 1));
        // raw weights 2.0 and 2.0 before normalization
        assert!((w0 - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
        assert!((w1 - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_vocabulary_and_empty() {
        let v = TfidfVectorizer::from_artifact(artifact(serde_json::json!({
            "vocabulary": {"интернет": 0}
        })))
        .unwrap();

        assert!(v.transform("").is_empty());
        assert!(v.transform("роутер модем").is_empty());
        assert_eq!(v.transform("").to_dense(1), vec![0.0]);
    }

    #[test]
    fn test_sublinear_tf_without_norm() {
        let v = TfidfVectorizer::from_artifact(artifact(serde_json::json!({
            "vocabulary": {"ошибка": 0},
            "sublinear_tf": true,
            "norm": null
        })))
        .unwrap();

        let vec = v.transform("ошибка ошибка ошибка");
        assert!((vec.entries[0].1 - (1.0 + 3f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_bigrams() {
        let v = TfidfVectorizer::from_artifact(artifact(serde_json::json!({
            "vocabulary": {"личный кабинет": 0, "кабинет": 1},
            "ngram_range": [1, 2],
            "norm": "l1"
        })))
        .unwrap();

        let vec = v.transform("личный кабинет");
        assert_eq!(vec.entries, vec![(0, 0.5), (1, 0.5)]);
    }

    #[test]
    fn test_rejects_inconsistent_artifacts() {
        let mismatched_idf = artifact(serde_json::json!({
            "vocabulary": {"день": 0, "сеть": 1},
            "idf": [1.0]
        }));
        assert!(TfidfVectorizer::from_artifact(mismatched_idf).is_err());

        let bad_index = artifact(serde_json::json!({
            "vocabulary": {"день": 0, "сеть": 5}
        }));
        assert!(TfidfVectorizer::from_artifact(bad_index).is_err());

        let bad_ngrams = artifact(serde_json::json!({
            "vocabulary": {"день": 0},
            "ngram_range": [2, 1]
        }));
        assert!(TfidfVectorizer::from_artifact(bad_ngrams).is_err());
    }

    #[test]
    fn test_corrupt_file_is_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tfidf_vectorizer.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = TfidfVectorizer::from_file(&path).unwrap_err();
        assert!(matches!(err, TriageError::ArtifactError { .. }));
    }
}
