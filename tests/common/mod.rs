#![allow(dead_code)]

use std::path::Path;
use ticket_triage::config::toml_config::ArtifactsConfig;
use ticket_triage::ClassifierService;

pub const LEMMAS_TSV: &str = "\
# form\tlemma\tscore
работает\tработать\t1.0
работал\tработать\t1.0
дня\tдень\t1.0
дней\tдень\t1.0
оплаты\tоплата\t1.0
оплату\tоплата\t1.0
выиграли\tвыиграть\t0.9
выиграли\tвыигрывать\t0.1
";

pub fn vectorizer_json() -> serde_json::Value {
    serde_json::json!({
        "vocabulary": {"интернет": 0, "работать": 1, "оплата": 2, "день": 3, "выиграть": 4},
        "idf": [1.2, 1.5, 1.1, 2.0, 1.8],
        "ngram_range": [1, 1],
        "sublinear_tf": false,
        "norm": "l2"
    })
}

pub fn model_json() -> serde_json::Value {
    serde_json::json!({
        "kind": "random_forest",
        "classes": ["Интернет", "Оплата", "Спам"],
        "n_features": 5,
        "trees": [
            {
                "children_left": [1, 3, -1, -1, -1],
                "children_right": [2, 4, -1, -1, -1],
                "feature": [0, 2, -2, -2, -2],
                "threshold": [0.0, 0.0, -2.0, -2.0, -2.0],
                "value": [[4, 3, 3], [1, 3, 3], [9, 1, 0], [2, 2, 6], [1, 8, 1]]
            },
            {
                "children_left": [1, -1, -1],
                "children_right": [2, -1, -1],
                "feature": [1, -2, -2],
                "threshold": [0.0, -2.0, -2.0],
                "value": [[0.5, 0.25, 0.25], [0.3, 0.3, 0.4], [0.7, 0.2, 0.1]]
            }
        ]
    })
}

/// Writes a small but complete artifact set into `dir`.
pub fn write_artifacts(dir: &Path) -> ArtifactsConfig {
    let vectorizer_path = dir.join("tfidf_vectorizer.json");
    let model_path = dir.join("classifier.json");
    let lemmas_path = dir.join("lemmas.tsv");

    std::fs::write(&vectorizer_path, vectorizer_json().to_string()).unwrap();
    std::fs::write(&model_path, model_json().to_string()).unwrap();
    std::fs::write(&lemmas_path, LEMMAS_TSV).unwrap();

    ArtifactsConfig {
        vectorizer_path: vectorizer_path.to_string_lossy().into_owned(),
        model_path: model_path.to_string_lossy().into_owned(),
        lemmas_path: lemmas_path.to_string_lossy().into_owned(),
        stopwords_path: None,
    }
}

pub fn load_service(dir: &Path) -> ClassifierService {
    ClassifierService::load(&write_artifacts(dir)).unwrap()
}
