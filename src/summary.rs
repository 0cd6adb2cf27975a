// 📊 Bill Digest - Category aggregation for a parsed bill
// Structured text handed to an external summarizer, never prose itself

use crate::parser::{LineItem, ParsedBill};
use crate::util::format_amount;
use serde::Serialize;
use std::fmt;

// ============================================================================
// CATEGORY TOTALS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub item_count: usize,
}

/// Spending per category, largest first; equal totals keep first-seen order
pub fn category_totals(items: &[LineItem]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();

    for item in items {
        match totals.iter_mut().find(|t| t.category == item.category) {
            Some(entry) => {
                entry.total += item.price;
                entry.item_count += 1;
            }
            None => totals.push(CategoryTotal {
                category: item.category.clone(),
                total: item.price,
                item_count: 1,
            }),
        }
    }

    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals
}

// ============================================================================
// BILL DIGEST
// ============================================================================

/// BillDigest - Everything a summarizer needs to know about one bill
#[derive(Debug, Clone, Serialize)]
pub struct BillDigest {
    pub items: Vec<LineItem>,
    pub calculated_total: Option<f64>,
    pub by_category: Vec<CategoryTotal>,
}

impl BillDigest {
    pub fn from_bill(bill: &ParsedBill) -> Self {
        BillDigest {
            items: bill.items().to_vec(),
            calculated_total: bill.total(),
            by_category: category_totals(bill.items()),
        }
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Top spending category, if any item was parsed
    pub fn top_category(&self) -> Option<&CategoryTotal> {
        self.by_category.first()
    }
}

impl fmt::Display for BillDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parsed Bill Content:")?;

        if !self.items.is_empty() {
            writeln!(f, "Items:")?;
            for item in &self.items {
                writeln!(f, "- {} ({}): ₹{}", item.name, item.category, format_amount(item.price))?;
            }
        }

        match self.calculated_total {
            Some(total) => {
                writeln!(f, "\nCalculated Total (Sum of items): ₹{}", format_amount(total))?
            }
            None => writeln!(f, "\nCalculated Total: N/A (No items found)")?,
        }

        if !self.by_category.is_empty() {
            writeln!(f, "\nSpending by Category (from identified items):")?;
            for entry in &self.by_category {
                writeln!(f, "- {}: ₹{}", entry.category, format_amount(entry.total))?;
            }
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::BillParser;

    #[test]
    fn test_category_totals_sorted_desc() {
        let bill = BillParser::default()
            .parse("MILK 2.00\nBEEF 10.00\nCOFFEE 3.00\nSHAMPOO 4.00")
            .unwrap();
        let totals = category_totals(bill.items());

        assert_eq!(totals.len(), 3);
        assert_eq!(totals[0].category, "Meat & Seafood");
        assert_eq!(totals[1].category, "Beverages");
        assert_eq!(totals[1].total, 5.0);
        assert_eq!(totals[1].item_count, 2);
        assert_eq!(totals[2].category, "Personal Care");
    }

    #[test]
    fn test_category_totals_ties_keep_first_seen_order() {
        let bill = BillParser::default()
            .parse("SHAMPOO 1.00\nMILK 1.00\nBREAD 1.00")
            .unwrap();
        let names: Vec<String> = category_totals(bill.items())
            .into_iter()
            .map(|t| t.category)
            .collect();

        assert_eq!(names, vec!["Personal Care", "Beverages", "Food"]);
    }

    #[test]
    fn test_digest_text() {
        let bill = BillParser::default().parse("MILK 2.50\nBREAD 1,200.00").unwrap();
        let text = BillDigest::from_bill(&bill).to_string();

        assert!(text.starts_with("Parsed Bill Content:\nItems:\n"));
        assert!(text.contains("- MILK (Beverages): ₹2.50\n"));
        assert!(text.contains("- BREAD (Food): ₹1,200.00\n"));
        assert!(text.contains("Calculated Total (Sum of items): ₹1,202.50"));
        assert!(text.contains("Spending by Category (from identified items):\n- Food: ₹1,200.00\n- Beverages: ₹2.50\n"));
    }

    #[test]
    fn test_digest_without_items() {
        let bill = BillParser::default().parse("WELCOME").unwrap();
        let digest = BillDigest::from_bill(&bill);

        assert_eq!(digest.item_count(), 0);
        assert!(digest.top_category().is_none());
        assert!(digest.to_string().contains("Calculated Total: N/A (No items found)"));
    }
}
