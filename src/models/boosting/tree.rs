//! Second-order regression tree grown by exact greedy split search.

/// Number of input features seen by the trees.
pub const N_FEATURES: usize = 2;

/// One model input.
pub type FeatureVector = [f64; N_FEATURES];

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    /// L2 penalty on leaf weights.
    pub l2_regularization: f64,
    pub min_samples_leaf: usize,
    /// Splits must improve the regularised objective by more than this.
    pub min_split_gain: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 6,
            l2_regularization: 1.0,
            min_samples_leaf: 1,
            min_split_gain: 1e-12,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        /// Samples with `x[feature] < threshold` go left.
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A binary regression tree stored as a flat node arena; node 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Grow a tree on per-sample gradients and hessians.
    ///
    /// Leaf weights are `-G / (H + lambda)` over the samples in the leaf.
    pub fn fit(
        features: &[FeatureVector],
        gradients: &[f64],
        hessians: &[f64],
        params: &TreeParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let indices: Vec<usize> = (0..features.len()).collect();
        tree.grow(features, gradients, hessians, indices, 0, params);
        tree
    }

    /// Weight of the leaf `x` falls into.
    pub fn predict(&self, x: &FeatureVector) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { weight } => return weight,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[feature] < threshold { left } else { right };
                }
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn depth_from(nodes: &[Node], idx: usize) -> usize {
            match nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => {
                    1 + depth_from(nodes, left).max(depth_from(nodes, right))
                }
            }
        }
        depth_from(&self.nodes, 0)
    }

    /// Append the subtree for `indices` and return its node index.
    fn grow(
        &mut self,
        features: &[FeatureVector],
        gradients: &[f64],
        hessians: &[f64],
        indices: Vec<usize>,
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let g: f64 = indices.iter().map(|&i| gradients[i]).sum();
        let h: f64 = indices.iter().map(|&i| hessians[i]).sum();
        let lambda = params.l2_regularization;

        let node_idx = self.nodes.len();
        self.nodes.push(Node::Leaf {
            weight: -g / (h + lambda),
        });

        if depth >= params.max_depth || indices.len() < 2 * params.min_samples_leaf {
            return node_idx;
        }

        let Some(split) = best_split(features, gradients, hessians, &indices, g, h, params) else {
            return node_idx;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| features[i][split.feature] < split.threshold);

        let left = self.grow(features, gradients, hessians, left_idx, depth + 1, params);
        let right = self.grow(features, gradients, hessians, right_idx, depth + 1, params);

        self.nodes[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_idx
    }
}

/// Exhaustive search over midpoints between distinct sorted feature values.
fn best_split(
    features: &[FeatureVector],
    gradients: &[f64],
    hessians: &[f64],
    indices: &[usize],
    g_total: f64,
    h_total: f64,
    params: &TreeParams,
) -> Option<SplitCandidate> {
    let lambda = params.l2_regularization;
    let score = |g: f64, h: f64| g * g / (h + lambda);
    let parent = score(g_total, h_total);
    let mut best: Option<SplitCandidate> = None;

    for feature in 0..N_FEATURES {
        let mut sorted = indices.to_vec();
        sorted.sort_by(|&a, &b| features[a][feature].total_cmp(&features[b][feature]));

        let (mut g_left, mut h_left) = (0.0, 0.0);
        for (pos, pair) in sorted.windows(2).enumerate() {
            g_left += gradients[pair[0]];
            h_left += hessians[pair[0]];

            let n_left = pos + 1;
            let n_right = sorted.len() - n_left;
            if n_left < params.min_samples_leaf || n_right < params.min_samples_leaf {
                continue;
            }

            let (lo, hi) = (features[pair[0]][feature], features[pair[1]][feature]);
            if lo == hi {
                continue;
            }

            let gain = 0.5
                * (score(g_left, h_left) + score(g_total - g_left, h_total - h_left) - parent);
            if gain > params.min_split_gain && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: lo + (hi - lo) / 2.0,
                    gain,
                });
            }
        }
    }

    best
}
