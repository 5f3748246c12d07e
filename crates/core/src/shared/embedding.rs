use serde::Serialize;

/// A face identity vector, L2-normalized at construction.
///
/// Dot product of two embeddings equals their cosine similarity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Normalizes `values` to unit length. A zero vector stays zero.
    pub fn new(mut values: Vec<f32>) -> Self {
        l2_normalize(&mut values);
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dot(&self, other: &Embedding) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(x, y)| (*x as f64) * (*y as f64))
            .sum()
    }

    /// `1 - cosine similarity`, floored at zero to absorb rounding.
    pub fn cosine_distance(&self, other: &Embedding) -> f64 {
        (1.0 - self.dot(other)).max(0.0)
    }
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
