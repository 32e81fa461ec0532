//! Pretrained classification models loaded from JSON exports.
//!
//! Two model families are supported: a random forest stored in the column
//! layout of fitted decision trees, and a (binary or multinomial) logistic
//! regression stored as coefficient rows plus intercepts.

use crate::domain::ports::ClassificationModel;
use crate::utils::error::{Result, TriageError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const LEAF: i64 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    RandomForest {
        classes: Vec<String>,
        n_features: usize,
        trees: Vec<TreeArtifact>,
    },
    LogisticRegression {
        classes: Vec<String>,
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    },
}

fn invalid(message: impl Into<String>) -> TriageError {
    TriageError::ConfigError {
        message: message.into(),
    }
}

#[derive(Debug, Clone)]
struct DecisionTree {
    children_left: Vec<usize>,
    children_right: Vec<usize>,
    feature: Vec<usize>,
    threshold: Vec<f64>,
    // 葉節點的類別機率，已正規化
    proba: Vec<Vec<f64>>,
    leaf: Vec<bool>,
}

impl DecisionTree {
    fn from_artifact(tree: TreeArtifact, n_classes: usize, n_features: usize) -> Result<Self> {
        let n_nodes = tree.children_left.len();
        if n_nodes == 0 {
            return Err(invalid("decision tree has no nodes"));
        }
        if tree.children_right.len() != n_nodes
            || tree.feature.len() != n_nodes
            || tree.threshold.len() != n_nodes
            || tree.value.len() != n_nodes
        {
            return Err(invalid("decision tree columns have different lengths"));
        }

        let mut children_left = Vec::with_capacity(n_nodes);
        let mut children_right = Vec::with_capacity(n_nodes);
        let mut feature = Vec::with_capacity(n_nodes);
        let mut leaf = Vec::with_capacity(n_nodes);
        let mut proba = Vec::with_capacity(n_nodes);

        for node in 0..n_nodes {
            let is_leaf = tree.children_left[node] == LEAF;
            leaf.push(is_leaf);

            if is_leaf {
                children_left.push(node);
                children_right.push(node);
                feature.push(0);
            } else {
                let child = |raw: i64| -> Result<usize> {
                    // 子節點必須在自己之後，避免環
                    if raw > node as i64 && (raw as usize) < n_nodes {
                        Ok(raw as usize)
                    } else {
                        Err(invalid(format!("node {} has invalid child {}", node, raw)))
                    }
                };
                children_left.push(child(tree.children_left[node])?);
                children_right.push(child(tree.children_right[node])?);

                let f = tree.feature[node];
                if f < 0 || f as usize >= n_features {
                    return Err(invalid(format!(
                        "node {} splits on feature {} outside 0..{}",
                        node, f, n_features
                    )));
                }
                feature.push(f as usize);
            }

            let row = &tree.value[node];
            if row.len() != n_classes {
                return Err(invalid(format!(
                    "node {} has {} class values, expected {}",
                    node,
                    row.len(),
                    n_classes
                )));
            }
            let total: f64 = row.iter().sum();
            proba.push(if total > 0.0 {
                row.iter().map(|v| v / total).collect()
            } else {
                vec![0.0; n_classes]
            });
        }

        Ok(Self {
            children_left,
            children_right,
            feature,
            threshold: tree.threshold,
            proba,
            leaf,
        })
    }

    fn leaf_proba(&self, x: &[f64]) -> &[f64] {
        let mut node = 0;
        while !self.leaf[node] {
            node = if x[self.feature[node]] <= self.threshold[node] {
                self.children_left[node]
            } else {
                self.children_right[node]
            };
        }
        &self.proba[node]
    }
}

#[derive(Debug, Clone)]
pub struct RandomForestModel {
    classes: Vec<String>,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl ClassificationModel for RandomForestModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut sums = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (sum, p) in sums.iter_mut().zip(tree.leaf_proba(features)) {
                *sum += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        sums.into_iter().map(|s| s / n_trees).collect()
    }
}

#[derive(Debug, Clone)]
pub struct LogisticRegressionModel {
    classes: Vec<String>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

impl LogisticRegressionModel {
    fn decision(&self, features: &[f64]) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect()
    }
}

impl ClassificationModel for LogisticRegressionModel {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        self.coef.first().map_or(0, Vec::len)
    }

    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let scores = self.decision(features);

        if scores.len() == 1 {
            let p = 1.0 / (1.0 + (-scores[0]).exp());
            return vec![1.0 - p, p];
        }

        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }
}

impl ModelArtifact {
    pub fn into_model(self) -> Result<Box<dyn ClassificationModel>> {
        match self {
            ModelArtifact::RandomForest {
                classes,
                n_features,
                trees,
            } => {
                check_classes(&classes)?;
                if trees.is_empty() {
                    return Err(invalid("random forest has no trees"));
                }
                let trees = trees
                    .into_iter()
                    .map(|t| DecisionTree::from_artifact(t, classes.len(), n_features))
                    .collect::<Result<Vec<_>>>()?;

                Ok(Box::new(RandomForestModel {
                    classes,
                    n_features,
                    trees,
                }))
            }
            ModelArtifact::LogisticRegression {
                classes,
                coef,
                intercept,
            } => {
                check_classes(&classes)?;
                let expected_rows = if classes.len() == 2 { 1 } else { classes.len() };
                if coef.len() != expected_rows || intercept.len() != expected_rows {
                    return Err(invalid(format!(
                        "logistic regression with {} classes needs {} coefficient rows, got {} (intercepts: {})",
                        classes.len(),
                        expected_rows,
                        coef.len(),
                        intercept.len()
                    )));
                }
                let width = coef[0].len();
                if coef.iter().any(|row| row.len() != width) {
                    return Err(invalid("coefficient rows have different lengths"));
                }

                Ok(Box::new(LogisticRegressionModel {
                    classes,
                    coef,
                    intercept,
                }))
            }
        }
    }
}

fn check_classes(classes: &[String]) -> Result<()> {
    if classes.len() < 2 {
        return Err(invalid(format!(
            "model needs at least 2 classes, got {}",
            classes.len()
        )));
    }
    let mut seen = HashSet::new();
    if let Some(duplicate) = classes.iter().find(|label| !seen.insert(label.as_str())) {
        return Err(invalid(format!("duplicate class label '{}'", duplicate)));
    }
    Ok(())
}

/// 從 JSON 匯出檔載入模型；任何錯誤都視為啟動失敗
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Box<dyn ClassificationModel>> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| TriageError::artifact(&display, e))?;
    let artifact: ModelArtifact =
        serde_json::from_str(&content).map_err(|e| TriageError::artifact(&display, e))?;
    artifact
        .into_model()
        .map_err(|e| TriageError::artifact(display, e))
}
