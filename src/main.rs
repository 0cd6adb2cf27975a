use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::io::{self, Read};

use receipt_lens::{
    init_tracing, load_recommender, save_models, AppConfig, BillDigest, BillParser, Catalog,
    CategoryRules, FinancialInput, FinancialSnapshot, ForestConfig, RecommendError,
    Recommender, ScanOutcome,
};

const USAGE: &str = "\
Usage:
  receipt-lens parse <file|->              Parse a bill and print classified items
  receipt-lens digest <file|->             Print the category digest of a bill
  receipt-lens scan <product_id> [method]  Cheaper alternatives (basic | similar)
  receipt-lens train                       Train and save recommender models
  receipt-lens finances <file.json>        Monthly income / expenses snapshot";

fn main() -> Result<()> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let config = AppConfig::from_env();

    match args.get(1).map(String::as_str) {
        Some("parse") => run_parse(&config, arg(&args, 2)?),
        Some("digest") => run_digest(&config, arg(&args, 2)?),
        Some("scan") => run_scan(
            &config,
            arg(&args, 2)?,
            args.get(3).map(String::as_str).unwrap_or("basic"),
        ),
        Some("train") => run_train(&config),
        Some("finances") => run_finances(arg(&args, 2)?),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn arg(args: &[String], index: usize) -> Result<&str> {
    match args.get(index) {
        Some(value) => Ok(value.as_str()),
        None => bail!("Missing argument\n\n{}", USAGE),
    }
}

/// Read bill text from a file, or stdin for "-"
fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(source).with_context(|| format!("Failed to read bill: {}", source))
    }
}

fn load_rules(config: &AppConfig) -> Result<CategoryRules> {
    match &config.data.rules_path {
        Some(path) => CategoryRules::from_file(path),
        None => Ok(CategoryRules::default()),
    }
}

fn run_parse(config: &AppConfig, source: &str) -> Result<()> {
    let parser = BillParser::new(load_rules(config)?);
    let bill = parser.parse(&read_input(source)?)?;

    println!("🧾 Products Extracted ({}):", bill.items().len());
    if bill.is_empty() {
        println!("  (No products meeting criteria found)");
    }
    for item in bill.items() {
        println!("  - {:<32} {:>10.2}  {}", item.name, item.price, item.category);
    }

    match bill.total() {
        Some(total) => println!("\n✓ Final Amount (Sum of prices): {:.2}", total),
        None => println!("\n⚠️  Final Amount: N/A (No products found)"),
    }

    Ok(())
}

fn run_digest(config: &AppConfig, source: &str) -> Result<()> {
    let parser = BillParser::new(load_rules(config)?);
    let bill = parser.parse(&read_input(source)?)?;

    let digest = BillDigest::from_bill(&bill);
    print!("{}", digest);

    if let Some(top) = digest.top_category() {
        println!("\n📊 Top category: {} ({:.2})", top.category, top.total);
    }
    Ok(())
}

fn run_scan(config: &AppConfig, product_id: &str, method: &str) -> Result<()> {
    let catalog = Catalog::load_csv(&config.data.catalog_path)?;

    let recommender = match load_recommender(catalog.clone(), &config.data.models_dir)? {
        Some(recommender) => recommender,
        None => Recommender::trained(catalog, ForestConfig::default()),
    };

    match recommender.scan_product(product_id, method) {
        Ok(outcome @ ScanOutcome::Found(_)) => print!("{}", outcome),
        Ok(outcome @ ScanOutcome::NoAlternativesFound { .. }) => print!("ℹ️  {}", outcome),
        Err(e @ RecommendError::NotFound(_)) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
        Err(e @ RecommendError::InvalidMethod(_)) => {
            eprintln!("❌ {}", e);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn run_train(config: &AppConfig) -> Result<()> {
    println!("🌲 Training recommender models");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let catalog = Catalog::load_csv(&config.data.catalog_path)?;
    println!("✓ Loaded {} products from {}", catalog.len(), config.data.catalog_path.display());

    let recommender = Recommender::trained(catalog, ForestConfig::default());
    if let Some(forest) = recommender.predictor().map(|p| p.forest()) {
        println!(
            "✓ Similarity index and satisfaction predictor trained ({} trees, seed {})",
            forest.tree_count(),
            forest.config().seed
        );
    }

    save_models(&recommender, &config.data.models_dir)?;
    println!("✓ Models saved to {}", config.data.models_dir.display());

    Ok(())
}

fn run_finances(source: &str) -> Result<()> {
    let input: FinancialInput = serde_json::from_str(&read_input(source)?)
        .context("Failed to parse financial input JSON")?;
    let snapshot = FinancialSnapshot::compute(&input)?;

    println!("💰 Income:                {:>12.2}", snapshot.income);
    println!("   Fixed expenses:        {:>12.2}", snapshot.fixed_expenses);
    println!("   Discretionary:         {:>12.2}", snapshot.discretionary_expenses);
    println!("   Monthly surplus:       {:>12.2}", snapshot.monthly_surplus);
    println!("   Savings rate:          {:>11.1}%", snapshot.savings_rate() * 100.0);

    for goal in &snapshot.goals {
        match goal.months_to_goal {
            Some(months) => println!("🎯 {}: {:.2} in {} month(s)", goal.goal, goal.target, months),
            None => println!("🎯 {}: {:.2} not reachable without a surplus", goal.goal, goal.target),
        }
    }

    Ok(())
}
