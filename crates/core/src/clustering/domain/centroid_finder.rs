use crate::clustering::domain::kmeans::{kmeans, KMeansResult};
use crate::shared::constants::DEFAULT_MAX_CLUSTERS;
use crate::shared::embedding::Embedding;

const MAX_ITERATIONS: usize = 100;

/// How many identities to look for in a set of embeddings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClusterCount {
    /// Exactly `k` clusters, clamped to the number of embeddings.
    Fixed(usize),
    /// Try every k in `1..=max_k` and keep the one after the largest
    /// inertia drop.
    Elbow { max_k: usize },
}

impl Default for ClusterCount {
    fn default() -> Self {
        Self::Elbow {
            max_k: DEFAULT_MAX_CLUSTERS,
        }
    }
}

/// Groups face embeddings into identities and returns one centroid each.
///
/// Results depend only on the input order: seeding is farthest-first from
/// the first embedding and no randomness is involved.
pub struct CentroidFinder {
    count: ClusterCount,
}

impl CentroidFinder {
    pub fn new(count: ClusterCount) -> Self {
        Self { count }
    }

    /// Returns at most `embeddings.len()` unit-length centroids; none for
    /// empty input.
    pub fn find(&self, embeddings: &[Embedding]) -> Vec<Embedding> {
        if embeddings.is_empty() {
            return Vec::new();
        }
        let points: Vec<&[f32]> = embeddings.iter().map(|e| e.as_slice()).collect();
        let n = points.len();

        let result = match self.count {
            ClusterCount::Fixed(k) => kmeans(&points, k.clamp(1, n), MAX_ITERATIONS),
            ClusterCount::Elbow { max_k } => {
                let max_k = max_k.clamp(1, n);
                let runs: Vec<KMeansResult> = (1..=max_k)
                    .map(|k| kmeans(&points, k, MAX_ITERATIONS))
                    .collect();
                let inertias: Vec<f64> = runs.iter().map(|r| r.inertia).collect();
                let k = elbow_k(&inertias);
                log::debug!("Elbow over inertias {inertias:?} selected k = {k}");
                match runs.into_iter().nth(k - 1) {
                    Some(run) => run,
                    None => return Vec::new(),
                }
            }
        };

        result.centroids.into_iter().map(Embedding::new).collect()
    }
}

/// `inertias[i]` is the inertia for k = i + 1. Returns the k that follows
/// the largest drop; the first maximum wins.
fn elbow_k(inertias: &[f64]) -> usize {
    if inertias.len() < 2 {
        return 1;
    }
    let mut best_drop = f64::NEG_INFINITY;
    let mut best_k = 1;
    for (i, pair) in inertias.windows(2).enumerate() {
        let drop = pair[0] - pair[1];
        if drop > best_drop {
            best_drop = drop;
            best_k = i + 2;
        }
    }
    best_k
}
