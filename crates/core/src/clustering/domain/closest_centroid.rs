use crate::shared::embedding::Embedding;

/// Index of the centroid nearest to `query` and its cosine distance.
///
/// Returns `None` only for an empty centroid list. Ties go to the lower
/// index.
pub fn closest_centroid(centroids: &[Embedding], query: &Embedding) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, centroid) in centroids.iter().enumerate() {
        let distance = centroid.cosine_distance(query);
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((i, distance)),
        }
    }
    best
}
