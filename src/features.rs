// 🧮 Feature Builder - Numeric vectors per catalog product
//
// Similarity vector: [one-hot category] + [z-scored price] + [raw rating]
// Predictor vector:  [raw price] + [one-hot category]
//
// The predictor deliberately sees the unscaled price.

use crate::catalog::{Catalog, Product};
use serde::{Deserialize, Serialize};

// ============================================================================
// PRICE SCALER
// ============================================================================

/// Z-score scaler fitted once over the whole catalog, never refit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceScaler {
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl PriceScaler {
    pub fn fit(prices: &[f64]) -> Self {
        if prices.is_empty() {
            return PriceScaler { mean: 0.0, std_dev: 1.0 };
        }

        let n = prices.len() as f64;
        let mean = prices.iter().sum::<f64>() / n;
        let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;

        PriceScaler {
            mean,
            std_dev: variance.sqrt(),
        }
    }

    /// Constant prices have no spread; they are centered but not scaled.
    pub fn transform(&self, price: f64) -> f64 {
        let scale = if self.std_dev > 0.0 { self.std_dev } else { 1.0 };
        (price - self.mean) / scale
    }
}

// ============================================================================
// CATEGORY ENCODER
// ============================================================================

/// One-hot columns in first-seen order
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEncoder {
    categories: Vec<String>,
}

impl CategoryEncoder {
    pub fn fit(catalog: &Catalog) -> Self {
        let mut categories: Vec<String> = Vec::new();
        for product in catalog.products() {
            if !categories.contains(&product.category) {
                categories.push(product.category.clone());
            }
        }
        CategoryEncoder { categories }
    }

    pub fn from_categories(categories: Vec<String>) -> Self {
        CategoryEncoder { categories }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Unknown categories encode as all zeros
    pub fn encode(&self, category: &str) -> Vec<f64> {
        self.categories
            .iter()
            .map(|c| if c == category { 1.0 } else { 0.0 })
            .collect()
    }
}

// ============================================================================
// FEATURE BUILDER
// ============================================================================

/// Fitted encoder + scaler, reused for every later lookup
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    encoder: CategoryEncoder,
    scaler: PriceScaler,
}

impl FeatureBuilder {
    pub fn fit(catalog: &Catalog) -> Self {
        let prices: Vec<f64> = catalog.products().iter().map(|p| p.price).collect();

        FeatureBuilder {
            encoder: CategoryEncoder::fit(catalog),
            scaler: PriceScaler::fit(&prices),
        }
    }

    /// Rebuild from persisted parts
    pub fn from_parts(encoder: CategoryEncoder, scaler: PriceScaler) -> Self {
        FeatureBuilder { encoder, scaler }
    }

    pub fn encoder(&self) -> &CategoryEncoder {
        &self.encoder
    }

    pub fn scaler(&self) -> &PriceScaler {
        &self.scaler
    }

    pub fn similarity_vector(&self, product: &Product) -> Vec<f64> {
        let mut vector = self.encoder.encode(&product.category);
        vector.push(self.scaler.transform(product.price));
        vector.push(product.rating);
        vector
    }

    pub fn predictor_vector(&self, product: &Product) -> Vec<f64> {
        let mut vector = Vec::with_capacity(self.encoder.width() + 1);
        vector.push(product.price);
        vector.extend(self.encoder.encode(&product.category));
        vector
    }

    pub fn similarity_matrix(&self, catalog: &Catalog) -> Vec<Vec<f64>> {
        catalog.products().iter().map(|p| self.similarity_vector(p)).collect()
    }

    pub fn predictor_matrix(&self, catalog: &Catalog) -> Vec<Vec<f64>> {
        catalog.products().iter().map(|p| self.predictor_vector(p)).collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::from_products(vec![
            Product::new("S1", "Chips", "Snacks", 10.0, 4.0),
            Product::new("B1", "Tea", "Beverages", 20.0, 3.0),
            Product::new("S2", "Nuts", "Snacks", 30.0, 5.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_scaler_fit() {
        let scaler = PriceScaler::fit(&[10.0, 20.0, 30.0]);

        assert_eq!(scaler.mean, 20.0);
        assert!((scaler.std_dev - (200.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(scaler.transform(20.0), 0.0);
        assert!(scaler.transform(30.0) > 1.22 && scaler.transform(30.0) < 1.23);
    }

    #[test]
    fn test_scaler_constant_prices() {
        let scaler = PriceScaler::fit(&[5.0, 5.0]);

        assert_eq!(scaler.std_dev, 0.0);
        assert_eq!(scaler.transform(5.0), 0.0);
        assert_eq!(scaler.transform(7.0), 2.0);
    }

    #[test]
    fn test_categories_first_seen_order() {
        let encoder = CategoryEncoder::fit(&catalog());

        assert_eq!(encoder.categories(), &["Snacks".to_string(), "Beverages".to_string()]);
        assert_eq!(encoder.encode("Beverages"), vec![0.0, 1.0]);
        assert_eq!(encoder.encode("Pharmacy"), vec![0.0, 0.0]);
    }

    #[test]
    fn test_vectors() {
        let catalog = catalog();
        let builder = FeatureBuilder::fit(&catalog);
        let tea = catalog.get("B1").unwrap();

        assert_eq!(builder.similarity_vector(tea), vec![0.0, 1.0, 0.0, 3.0]);
        assert_eq!(builder.predictor_vector(tea), vec![20.0, 0.0, 1.0]);
        assert_eq!(builder.similarity_matrix(&catalog).len(), 3);
        assert_eq!(builder.predictor_matrix(&catalog)[2], vec![30.0, 1.0, 0.0]);
    }
}
