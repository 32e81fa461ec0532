use crate::config::toml_config::ArtifactsConfig;
use crate::core::lemmatizer::DictionaryLemmatizer;
use crate::core::model::load_model;
use crate::core::preprocess::Preprocessor;
use crate::core::stopwords::{default_stopwords, load_stopwords};
use crate::core::vectorizer::TfidfVectorizer;
use crate::domain::model::ClassificationResult;
use crate::domain::ports::{ClassificationModel, TicketClassifier};
use crate::utils::error::{Result, TriageError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

fn round3(p: f64) -> f64 {
    (p * 1000.0).round() / 1000.0
}

/// 分類服務：正規化 → TF-IDF → 模型機率
///
/// Built once at startup and shared read-only; `classify` is a pure function
/// of the loaded artifacts and the input text.
pub struct ClassifierService {
    preprocessor: Preprocessor,
    vectorizer: TfidfVectorizer,
    model: Box<dyn ClassificationModel>,
}

impl std::fmt::Debug for ClassifierService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierService")
            .field("classes", &self.model.classes())
            .field("n_features", &self.vectorizer.n_features())
            .finish()
    }
}

impl ClassifierService {
    pub fn new(
        preprocessor: Preprocessor,
        vectorizer: TfidfVectorizer,
        model: Box<dyn ClassificationModel>,
    ) -> Result<Self> {
        if vectorizer.n_features() != model.n_features() {
            return Err(TriageError::ConfigError {
                message: format!(
                    "vectorizer produces {} features but the model expects {}",
                    vectorizer.n_features(),
                    model.n_features()
                ),
            });
        }
        Ok(Self {
            preprocessor,
            vectorizer,
            model,
        })
    }

    /// 載入全部預訓練資源；任何一項失敗都讓服務無法啟動
    pub fn load(artifacts: &ArtifactsConfig) -> Result<Self> {
        let lemmatizer = DictionaryLemmatizer::from_file(&artifacts.lemmas_path)?;
        let stopwords = match &artifacts.stopwords_path {
            Some(path) => load_stopwords(path)?,
            None => default_stopwords(),
        };
        let preprocessor = Preprocessor::with_stopwords(Arc::new(lemmatizer), stopwords);
        let vectorizer = TfidfVectorizer::from_file(&artifacts.vectorizer_path)?;
        let model = load_model(&artifacts.model_path)?;

        Self::new(preprocessor, vectorizer, model)
            .map_err(|e| TriageError::artifact(&artifacts.model_path, e))
    }

    pub fn classes(&self) -> &[String] {
        self.model.classes()
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn classify(&self, text: &str) -> ClassificationResult {
        let normalized = self.preprocessor.normalize(text);
        let features = self
            .vectorizer
            .transform(&normalized)
            .to_dense(self.vectorizer.n_features());
        let probas = self.model.predict_proba(&features);
        let classes = self.model.classes();

        // 取第一個最大值，與 argmax 行為一致
        let mut best = 0;
        for (i, p) in probas.iter().enumerate() {
            if *p > probas[best] {
                best = i;
            }
        }

        let all_probas: BTreeMap<String, f64> = classes
            .iter()
            .zip(&probas)
            .map(|(label, p)| (label.clone(), round3(*p)))
            .collect();

        ClassificationResult {
            category: classes[best].clone(),
            confidence: round3(probas[best]),
            all_probas,
        }
    }
}

#[async_trait]
impl TicketClassifier for ClassifierService {
    async fn classify_ticket(&self, text: &str) -> Result<ClassificationResult> {
        Ok(self.classify(text))
    }
}
