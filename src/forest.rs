//! Tree-ensemble inference over trees exported in scikit-learn's flat layout.

use crate::{
    error::{model_load_error, AppError},
    model::{Classifier, ModelOutput},
};
use serde::{Deserialize, Serialize};

// scikit-learn marks leaves with this child index.
const TREE_LEAF: i64 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class counts or fractions, in the artifact's class order.
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestSpec {
    pub trees: Vec<TreeSpec>,
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        distribution: Vec<f64>,
    },
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn from_spec(spec: &TreeSpec, n_features: usize, n_classes: usize) -> Result<Self, AppError> {
        let n = spec.children_left.len();
        if n == 0 {
            return Err(model_load_error("tree has no nodes"));
        }
        if spec.children_right.len() != n
            || spec.feature.len() != n
            || spec.threshold.len() != n
            || spec.value.len() != n
        {
            return Err(model_load_error("tree arrays have different lengths"));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (spec.children_left[i], spec.children_right[i]);
            if left == TREE_LEAF || right == TREE_LEAF {
                if left != right {
                    return Err(model_load_error(format!("node {} has a single child", i)));
                }
                nodes.push(Node::Leaf {
                    distribution: normalize(&spec.value[i], n_classes, i)?,
                });
                continue;
            }

            // Children always come after their parent, so traversal terminates.
            let child = |c: i64| -> Result<usize, AppError> {
                usize::try_from(c)
                    .ok()
                    .filter(|c| *c > i && *c < n)
                    .ok_or_else(|| model_load_error(format!("node {} has invalid child {}", i, c)))
            };
            let feature = usize::try_from(spec.feature[i])
                .ok()
                .filter(|f| *f < n_features)
                .ok_or_else(|| {
                    model_load_error(format!(
                        "node {} splits on feature {} of {}",
                        i, spec.feature[i], n_features
                    ))
                })?;
            let threshold = spec.threshold[i];
            if !threshold.is_finite() {
                return Err(model_load_error(format!("node {} has non-finite threshold", i)));
            }

            nodes.push(Node::Split {
                feature,
                threshold,
                left: child(left)?,
                right: child(right)?,
            });
        }

        Ok(Self { nodes })
    }

    pub fn predict_proba(&self, x: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

fn normalize(counts: &[f64], n_classes: usize, node: usize) -> Result<Vec<f64>, AppError> {
    if counts.len() != n_classes {
        return Err(model_load_error(format!(
            "leaf {} has {} class values, expected {}",
            node,
            counts.len(),
            n_classes
        )));
    }
    if counts.iter().any(|c| !c.is_finite() || *c < 0.0) {
        return Err(model_load_error(format!("leaf {} has invalid class values", node)));
    }
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return Err(model_load_error(format!("leaf {} is empty", node)));
    }
    Ok(counts.iter().map(|c| c / total).collect())
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForest {
    pub fn from_spec(spec: &ForestSpec, n_features: usize, n_classes: usize) -> Result<Self, AppError> {
        if spec.trees.is_empty() {
            return Err(model_load_error("forest has no trees"));
        }
        let trees = spec
            .trees
            .iter()
            .enumerate()
            .map(|(i, tree)| {
                DecisionTree::from_spec(tree, n_features, n_classes)
                    .map_err(|e| model_load_error(format!("tree {}: {}", i, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            trees,
            n_features,
            n_classes,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the trees' leaf distributions.
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let mut sum = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.predict_proba(x)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        sum.into_iter().map(|s| s / n).collect()
    }
}

impl Classifier for RandomForest {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn infer(&self, features: &[f64]) -> Result<ModelOutput, AppError> {
        if features.len() != self.n_features {
            return Err(AppError::ModelInference(format!(
                "expected {} inputs, got {}",
                self.n_features,
                features.len()
            )));
        }
        Ok(ModelOutput::Probabilities(self.predict_proba(features)))
    }
}
