//! Deterministic Lloyd's k-means over embedding vectors.
//!
//! Seeding is farthest-first starting from the first point, so identical
//! input order always yields identical centroids.

pub(crate) struct KMeansResult {
    pub centroids: Vec<Vec<f32>>,
    pub inertia: f64,
}

/// Clusters `points` into `k` groups (`1 <= k <= points.len()`).
pub(crate) fn kmeans(points: &[&[f32]], k: usize, max_iterations: usize) -> KMeansResult {
    debug_assert!(k >= 1 && k <= points.len());

    let mut centroids = farthest_first_seeds(points, k);
    let mut assignments = vec![usize::MAX; points.len()];

    for _ in 0..max_iterations {
        let mut changed = false;
        for (i, p) in points.iter().enumerate() {
            let nearest = nearest_centroid(&centroids, p);
            if assignments[i] != nearest {
                assignments[i] = nearest;
                changed = true;
            }
        }
        if !changed {
            break;
        }
        update_centroids(points, &assignments, &mut centroids);
    }

    let inertia = points
        .iter()
        .zip(assignments.iter())
        .map(|(p, &c)| squared_distance(p, &centroids[c]))
        .sum();

    KMeansResult { centroids, inertia }
}

pub(crate) fn squared_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x as f64) - (*y as f64);
            d * d
        })
        .sum()
}

/// First seed is point 0; each next seed is the point farthest from all
/// chosen seeds (lowest index on ties).
fn farthest_first_seeds(points: &[&[f32]], k: usize) -> Vec<Vec<f32>> {
    let mut seeds: Vec<Vec<f32>> = vec![points[0].to_vec()];
    let mut min_dist: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, points[0]))
        .collect();

    while seeds.len() < k {
        let mut best = 0;
        for i in 1..points.len() {
            if min_dist[i] > min_dist[best] {
                best = i;
            }
        }
        let seed = points[best].to_vec();
        for (i, p) in points.iter().enumerate() {
            min_dist[i] = min_dist[i].min(squared_distance(p, &seed));
        }
        seeds.push(seed);
    }
    seeds
}

fn nearest_centroid(centroids: &[Vec<f32>], point: &[f32]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// Recomputes each centroid as the mean of its members. A centroid with no
/// members keeps its previous position.
fn update_centroids(points: &[&[f32]], assignments: &[usize], centroids: &mut [Vec<f32>]) {
    let dim = centroids[0].len();
    let mut sums = vec![vec![0.0f64; dim]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for (p, &c) in points.iter().zip(assignments.iter()) {
        counts[c] += 1;
        for (s, v) in sums[c].iter_mut().zip(p.iter()) {
            *s += *v as f64;
        }
    }

    for (c, centroid) in centroids.iter_mut().enumerate() {
        if counts[c] == 0 {
            continue;
        }
        for (dst, s) in centroid.iter_mut().zip(sums[c].iter()) {
            *dst = (*s / counts[c] as f64) as f32;
        }
    }
}
