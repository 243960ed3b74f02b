//! Gradient-boosted tree classifier
//!
//! Evaluates the XGBoost JSON artifact produced by the offline training
//! pipeline (`binary:logistic`, five features in `FeatureVector` order).

use crate::oracle::{ClassifierOracle, ClassifierOutcome};
use crate::{Error, FeatureVector, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{error, info, warn};

const LOGISTIC_OBJECTIVE: &str = "binary:logistic";

#[derive(Debug, Deserialize)]
struct XgbDocument {
    learner: XgbLearner,
}

#[derive(Debug, Deserialize)]
struct XgbLearner {
    learner_model_param: LearnerModelParam,
    gradient_booster: GradientBooster,
    objective: Objective,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    num_feature: String,
}

#[derive(Debug, Deserialize)]
struct Objective {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    #[serde(default)]
    model: Option<GbTreeModel>,
}

#[derive(Debug, Deserialize)]
struct GbTreeModel {
    trees: Vec<RawTree>,
}

#[derive(Debug, Deserialize)]
struct RawTree {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f64>,
    default_left: Vec<Flag>,
}

// Older writers emit 0/1, newer ones booleans
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Int(i) => *i != 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    left: Option<usize>,
    right: Option<usize>,
    feature: usize,
    // Split threshold on internal nodes, leaf value on leaves
    value: f64,
    default_left: bool,
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_raw(index: usize, raw: RawTree, num_feature: usize) -> Result<Self> {
        let n = raw.left_children.len();
        if n == 0
            || raw.right_children.len() != n
            || raw.split_indices.len() != n
            || raw.split_conditions.len() != n
            || raw.default_left.len() != n
        {
            return Err(Error::Model(format!("tree {} has inconsistent node arrays", index)));
        }

        let child = |c: i64| -> Result<Option<usize>> {
            match c {
                -1 => Ok(None),
                c if c > 0 && (c as usize) < n => Ok(Some(c as usize)),
                c => Err(Error::Model(format!("tree {} references invalid node {}", index, c))),
            }
        };

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let left = child(raw.left_children[i])?;
            let right = child(raw.right_children[i])?;
            if left.is_some() != right.is_some() {
                return Err(Error::Model(format!("tree {} node {} has one child", index, i)));
            }

            let feature = raw.split_indices[i];
            if left.is_some() && (feature < 0 || feature as usize >= num_feature) {
                return Err(Error::Model(format!(
                    "tree {} node {} splits on unknown feature {}",
                    index, i, feature
                )));
            }

            nodes.push(Node {
                left,
                right,
                feature: feature.max(0) as usize,
                value: raw.split_conditions[i],
                default_left: raw.default_left[i].is_set(),
            });
        }

        Ok(Self { nodes })
    }

    fn leaf_value(&self, features: &[f64]) -> Result<f64> {
        let mut idx = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.nodes.len() {
            let node = &self.nodes[idx];
            match (node.left, node.right) {
                (Some(left), Some(right)) => {
                    let x = features[node.feature];
                    let go_left = if x.is_nan() {
                        node.default_left
                    } else {
                        (x as f32) < (node.value as f32)
                    };
                    idx = if go_left { left } else { right };
                }
                _ => return Ok(node.value),
            }
        }
        Err(Error::Model("tree walk did not terminate".to_string()))
    }
}

/// Loaded boosted-tree model
#[derive(Debug, Clone)]
pub struct BoostedTreesModel {
    base_margin: f64,
    num_feature: usize,
    trees: Vec<Tree>,
}

impl BoostedTreesModel {
    /// Parse an XGBoost JSON model and check it against the feature schema
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: XgbDocument = serde_json::from_str(json)
            .map_err(|e| Error::Model(format!("unreadable model JSON: {}", e)))?;
        let learner = doc.learner;

        if learner.objective.name != LOGISTIC_OBJECTIVE {
            return Err(Error::Model(format!(
                "unsupported objective '{}', expected {}",
                learner.objective.name, LOGISTIC_OBJECTIVE
            )));
        }

        let num_feature: usize = learner
            .learner_model_param
            .num_feature
            .trim()
            .parse()
            .map_err(|_| Error::Model("num_feature is not an integer".to_string()))?;
        if num_feature != FeatureVector::FEATURE_NAMES.len() {
            return Err(Error::Model(format!(
                "model expects {} features, schema has {}",
                num_feature,
                FeatureVector::FEATURE_NAMES.len()
            )));
        }

        // Newer writers wrap the value in brackets
        let base_score: f64 = learner
            .learner_model_param
            .base_score
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(|_| Error::Model("base_score is not a number".to_string()))?;
        if !(base_score > 0.0 && base_score < 1.0) {
            return Err(Error::Model(format!("base_score {} outside (0, 1)", base_score)));
        }

        let booster = learner.gradient_booster;
        let model = match (booster.name.as_str(), booster.model) {
            ("gbtree", Some(model)) => model,
            (name, _) => {
                return Err(Error::Model(format!("unsupported booster '{}'", name)));
            }
        };

        let trees = model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, raw)| Tree::from_raw(i, raw, num_feature))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            base_margin: (base_score / (1.0 - base_score)).ln(),
            num_feature,
            trees,
        })
    }

    /// Read and parse a model file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Model(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Probability of the positive (fraud) class
    pub fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.num_feature {
            return Err(Error::Model(format!(
                "got {} features, model expects {}",
                features.len(),
                self.num_feature
            )));
        }

        let mut margin = self.base_margin;
        for tree in &self.trees {
            margin += tree.leaf_value(features)?;
        }

        Ok(1.0 / (1.0 + (-margin).exp()))
    }

    /// Number of boosted trees
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

/// Classifier oracle backed by an optional boosted-tree model
#[derive(Debug, Clone, Default)]
pub struct TreeEnsembleClassifier {
    model: Option<BoostedTreesModel>,
}

impl TreeEnsembleClassifier {
    /// Wrap a model; `None` yields a permanently unavailable oracle
    pub fn new(model: Option<BoostedTreesModel>) -> Self {
        Self { model }
    }

    /// Load from disk, degrading to unavailable when the artifact is missing or invalid
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match BoostedTreesModel::from_path(path) {
            Ok(model) => {
                info!(
                    path = %path.display(),
                    trees = model.tree_count(),
                    "Classifier model loaded"
                );
                Self::new(Some(model))
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Classifier model not loaded, tier disabled");
                Self::new(None)
            }
        }
    }
}

impl ClassifierOracle for TreeEnsembleClassifier {
    fn is_available(&self) -> bool {
        self.model.is_some()
    }

    fn predict(&self, features: &FeatureVector) -> ClassifierOutcome {
        let Some(model) = &self.model else {
            return ClassifierOutcome::Unavailable;
        };

        match model.predict_proba(&features.to_array()) {
            Ok(p) if p.is_finite() => ClassifierOutcome::Probability(p.clamp(0.0, 1.0)),
            Ok(p) => {
                warn!(probability = p, "Classifier produced a non-finite probability");
                ClassifierOutcome::Unavailable
            }
            Err(e) => {
                warn!(error = %e, "Classifier inference failed");
                ClassifierOutcome::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tree 0 splits on keyword_match, tree 1 on amount (missing goes right)
    const MODEL: &str = r#"{
        "learner": {
            "attributes": {},
            "feature_names": ["amount", "vpa_length", "vpa_entropy", "keyword_match", "is_numeric_handle"],
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "gbtree_model_param": {"num_trees": "2"},
                    "trees": [
                        {
                            "id": 0,
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_indices": [3, 0, 0],
                            "split_conditions": [0.5, -1.0, 2.0],
                            "default_left": [0, 0, 0]
                        },
                        {
                            "id": 1,
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_indices": [0, 0, 0],
                            "split_conditions": [10000.0, 0.0, 0.5],
                            "default_left": [false, false, false]
                        }
                    ],
                    "tree_info": [0, 0]
                }
            },
            "learner_model_param": {"base_score": "5E-1", "num_class": "0", "num_feature": "5"},
            "objective": {"name": "binary:logistic"}
        },
        "version": [1, 7, 6]
    }"#;

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    fn features(amount: f64, keyword: f64) -> FeatureVector {
        FeatureVector {
            amount,
            vpa_length: 12.0,
            vpa_entropy: 3.1,
            keyword_match: keyword,
            is_numeric_handle: 0.0,
        }
    }

    #[test]
    fn test_predict_walks_trees() {
        let model = BoostedTreesModel::from_json(MODEL).unwrap();
        assert_eq!(model.tree_count(), 2);

        // keyword=0 -> -1.0, amount<10000 -> 0.0
        let p = model.predict_proba(&features(500.0, 0.0).to_array()).unwrap();
        assert!((p - sigmoid(-1.0)).abs() < 1e-9);

        // keyword=1 -> 2.0, amount>=10000 -> 0.5
        let p = model.predict_proba(&features(20000.0, 1.0).to_array()).unwrap();
        assert!((p - sigmoid(2.5)).abs() < 1e-9);
    }

    #[test]
    fn test_missing_value_follows_default() {
        let model = BoostedTreesModel::from_json(MODEL).unwrap();
        let p = model.predict_proba(&features(f64::NAN, 0.0).to_array()).unwrap();
        assert!((p - sigmoid(-0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let bad = MODEL.replace("\"num_feature\": \"5\"", "\"num_feature\": \"3\"");
        assert!(matches!(BoostedTreesModel::from_json(&bad), Err(Error::Model(_))));

        let bad = MODEL.replace("binary:logistic", "reg:squarederror");
        assert!(BoostedTreesModel::from_json(&bad).is_err());

        assert!(BoostedTreesModel::from_json("not json").is_err());
    }

    #[test]
    fn test_bracketed_base_score() {
        let json = MODEL.replace("\"5E-1\"", "\"[5E-1]\"");
        assert!(BoostedTreesModel::from_json(&json).is_ok());
    }

    #[test]
    fn test_oracle_unavailable_without_model() {
        let oracle = TreeEnsembleClassifier::load("/nonexistent/fraud_xgb_model.json");
        assert!(!oracle.is_available());
        assert_eq!(oracle.predict(&features(1.0, 0.0)), ClassifierOutcome::Unavailable);
    }

    #[test]
    fn test_oracle_probability() {
        let oracle = TreeEnsembleClassifier::new(Some(BoostedTreesModel::from_json(MODEL).unwrap()));
        assert!(oracle.is_available());
        match oracle.predict(&features(20000.0, 1.0)) {
            ClassifierOutcome::Probability(p) => assert!(p > 0.9),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
