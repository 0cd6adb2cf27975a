// 🛒 Product Catalog - Typed, validated, immutable
// Loaded once at startup; every recommender structure is indexed by row position

use crate::error::CatalogError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns the catalog CSV must provide
pub const REQUIRED_COLUMNS: [&str; 5] = ["product_id", "product_name", "category", "price", "rating"];

pub const MAX_RATING: f64 = 5.0;

// ============================================================================
// PRODUCT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
}

impl Product {
    pub fn new(product_id: &str, product_name: &str, category: &str, price: f64, rating: f64) -> Self {
        Product {
            product_id: product_id.to_string(),
            product_name: product_name.to_string(),
            category: category.to_string(),
            price,
            rating,
        }
    }

    /// Rating per unit of price
    pub fn value_score(&self) -> f64 {
        self.rating / self.price
    }
}

/// Row as it appears in the CSV, before numeric validation
#[derive(Debug, Deserialize)]
struct RawProduct {
    product_id: String,
    product_name: String,
    category: String,
    price: String,
    rating: String,
}

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    positions: HashMap<String, usize>,
}

impl Catalog {
    /// Validate and index a list of products
    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        if products.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut positions = HashMap::with_capacity(products.len());

        for (row, product) in products.iter().enumerate() {
            let line = row + 2; // 1-indexed + header row

            if !(product.price > 0.0) || !product.price.is_finite() {
                return Err(CatalogError::NonPositivePrice { line, price: product.price });
            }
            if !(0.0..=MAX_RATING).contains(&product.rating) {
                return Err(CatalogError::RatingOutOfRange { line, rating: product.rating });
            }
            if positions.insert(product.product_id.clone(), row).is_some() {
                return Err(CatalogError::DuplicateId {
                    line,
                    id: product.product_id.clone(),
                });
            }
        }

        Ok(Catalog { products, positions })
    }

    /// Read a catalog from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(CatalogError::MissingColumn(column.to_string()));
            }
        }

        let mut products = Vec::new();
        for (row, result) in rdr.deserialize::<RawProduct>().enumerate() {
            let raw = result?;
            let line = row + 2;

            products.push(Product {
                price: parse_numeric(&raw.price, "price", line)?,
                rating: parse_numeric(&raw.rating, "rating", line)?,
                product_id: raw.product_id,
                product_name: raw.product_name,
                category: raw.category,
            });
        }

        Catalog::from_products(products)
    }

    /// Load the catalog CSV from disk
    pub fn load_csv(csv_path: &Path) -> Result<Self> {
        let file = File::open(csv_path)
            .with_context(|| format!("Failed to open catalog file: {}", csv_path.display()))?;

        let catalog = Catalog::from_reader(file)
            .with_context(|| format!("Invalid catalog: {}", csv_path.display()))?;

        tracing::info!(products = catalog.len(), path = %csv_path.display(), "catalog loaded");
        Ok(catalog)
    }

    /// Row position of a product id
    pub fn position(&self, product_id: &str) -> Option<usize> {
        self.positions.get(product_id).copied()
    }

    pub fn get(&self, product_id: &str) -> Option<&Product> {
        self.position(product_id).map(|row| &self.products[row])
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

fn parse_numeric(value: &str, field: &'static str, line: usize) -> Result<f64, CatalogError> {
    value.trim().parse::<f64>().map_err(|_| CatalogError::NonNumeric {
        line,
        field,
        value: value.to_string(),
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
product_id,product_name,category,price,rating
HO_1,Floor Cleaner 1L,Household,250,4.2
HO_2,Floor Cleaner 500ml,Household,140,4.0
BE_1,Green Tea,Beverages,180.5,4.6
";

    #[test]
    fn test_load_from_reader() {
        let catalog = Catalog::from_reader(CSV.as_bytes()).unwrap();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.position("HO_2"), Some(1));
        assert_eq!(catalog.get("BE_1").unwrap().price, 180.5);
        assert!(catalog.get("XX_9").is_none());
    }

    #[test]
    fn test_value_score() {
        let product = Product::new("P1", "Soap", "Personal Care", 50.0, 4.0);
        assert_eq!(product.value_score(), 0.08);
    }

    #[test]
    fn test_extra_columns_and_reordering_are_accepted() {
        let csv = "rating,price,brand,category,product_name,product_id\n4.1,99,Acme,Snacks,Chips,SN_1\n";
        let catalog = Catalog::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(catalog.get("SN_1").unwrap().rating, 4.1);
    }

    #[test]
    fn test_missing_column() {
        let csv = "product_id,product_name,category,price\nP1,Soap,Care,10\n";

        match Catalog::from_reader(csv.as_bytes()) {
            Err(CatalogError::MissingColumn(column)) => assert_eq!(column, "rating"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_price() {
        let csv = "product_id,product_name,category,price,rating\nP1,Soap,Care,ten,4\n";

        match Catalog::from_reader(csv.as_bytes()) {
            Err(CatalogError::NonNumeric { line, field, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(field, "price");
            }
            other => panic!("expected NonNumeric, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_values() {
        let zero_price = vec![Product::new("P1", "Soap", "Care", 0.0, 4.0)];
        assert!(matches!(
            Catalog::from_products(zero_price),
            Err(CatalogError::NonPositivePrice { .. })
        ));

        let bad_rating = vec![Product::new("P1", "Soap", "Care", 1.0, 5.5)];
        assert!(matches!(
            Catalog::from_products(bad_rating),
            Err(CatalogError::RatingOutOfRange { .. })
        ));

        let duplicate = vec![
            Product::new("P1", "Soap", "Care", 1.0, 4.0),
            Product::new("P1", "Soap", "Care", 2.0, 4.0),
        ];
        assert!(matches!(
            Catalog::from_products(duplicate),
            Err(CatalogError::DuplicateId { line: 3, .. })
        ));

        assert!(matches!(Catalog::from_products(vec![]), Err(CatalogError::Empty)));
    }

    #[test]
    fn test_load_csv_missing_file() {
        assert!(Catalog::load_csv(Path::new("/nonexistent/catalog.csv")).is_err());
    }
}
