// 🔗 Similarity Index - Dense pairwise cosine similarity over the catalog
// Built once at startup, read-only afterwards, indexed by catalog row

use crate::catalog::Catalog;
use crate::error::{RecommendError, RecommendResult};
use crate::features::FeatureBuilder;
use anyhow::{ensure, Result};

/// Cosine similarity of two real vectors. A zero vector scores 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a < 1e-15 || norm_b < 1e-15 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    matrix: Vec<Vec<f64>>,
}

impl SimilarityIndex {
    pub fn build(catalog: &Catalog, features: &FeatureBuilder) -> Self {
        let vectors = features.similarity_matrix(catalog);
        let n = vectors.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in i..n {
                let score = cosine_similarity(&vectors[i], &vectors[j]);
                matrix[i][j] = score;
                matrix[j][i] = score;
            }
        }

        tracing::info!(rows = n, "similarity index built");
        SimilarityIndex { matrix }
    }

    /// Restore a persisted matrix; it must be square and match the catalog
    pub fn from_matrix(matrix: Vec<Vec<f64>>, catalog: &Catalog) -> Result<Self> {
        ensure!(
            matrix.len() == catalog.len(),
            "Similarity matrix has {} rows but catalog has {} products",
            matrix.len(),
            catalog.len()
        );
        ensure!(
            matrix.iter().all(|row| row.len() == matrix.len()),
            "Similarity matrix is not square"
        );
        Ok(SimilarityIndex { matrix })
    }

    pub fn matrix(&self) -> &[Vec<f64>] {
        &self.matrix
    }

    /// Rows most similar to `row`, excluding itself, best first.
    /// Ties keep catalog order.
    pub fn similar_rows(&self, row: usize, top_n: usize) -> Vec<(usize, f64)> {
        let mut scored: Vec<(usize, f64)> = self.matrix[row]
            .iter()
            .copied()
            .enumerate()
            .filter(|(other, _)| *other != row)
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_n);
        scored
    }

    /// Most similar products to `product_id` as `(row, score)` pairs
    pub fn get_similar(
        &self,
        catalog: &Catalog,
        product_id: &str,
        top_n: usize,
    ) -> RecommendResult<Vec<(usize, f64)>> {
        let row = catalog
            .position(product_id)
            .ok_or_else(|| RecommendError::NotFound(product_id.to_string()))?;

        Ok(self.similar_rows(row, top_n))
    }
}
