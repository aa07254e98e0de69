use anyhow::{Context, Result};
use rusqlite::Connection;
use std::env;
use std::path::PathBuf;

use civic_budget::{
    active_impact, calc_percent, compute_range, create_plan, deficit,
    fetch_categories, format_mln, get_active_config, global_expenses,
    insert_catalog, insert_config, list_plans, setup_database,
    AdjustmentSession, Aggregator, BudgetConfig, Plan, Submitter,
};

/// Income for the demo config, in so'm
const DEMO_TOTAL_INCOME: i64 = 52_000_000_000;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("seed") => run_seed(),
        Some("demo") => run_demo(),
        Some("aggregate") => run_aggregate(),
        _ => {
            println!("Civic Budget v{}", civic_budget::VERSION);
            println!();
            println!("Usage:");
            println!("  civic-budget seed        Create the database with the demo catalog");
            println!("  civic-budget demo        Run a sample adjustment session and submit it");
            println!("  civic-budget aggregate   Print population statistics across all plans");
            Ok(())
        }
    }
}

fn db_path() -> PathBuf {
    env::var("CIVIC_BUDGET_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("civic_budget.db"))
}

fn open_db() -> Result<Connection> {
    let path = db_path();

    if !path.exists() {
        anyhow::bail!(
            "Database not found at {:?}. Run: civic-budget seed",
            path
        );
    }

    Connection::open(&path).with_context(|| format!("Failed to open database at {:?}", path))
}

fn run_seed() -> Result<()> {
    println!("🗄️  Seeding catalog → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let path = db_path();
    let conn = Connection::open(&path)?;

    println!("\n🔧 Setting up database...");
    setup_database(&conn)?;
    println!("✓ Database initialized with WAL mode: {:?}", path);

    println!("\n🗂️  Inserting demo catalog...");
    let catalog = civic_budget::default_catalog();
    insert_catalog(&conn, &catalog)?;
    let subcategory_count: usize = catalog.iter().map(|c| c.subcategories.len()).sum();
    println!(
        "✓ Inserted {} categories, {} subcategories",
        catalog.len(),
        subcategory_count
    );

    println!("\n💰 Activating income config...");
    let config = BudgetConfig::new(DEMO_TOTAL_INCOME);
    insert_config(&conn, &config)?;
    println!("✓ Total income: {}", format_mln(DEMO_TOTAL_INCOME as f64));

    println!("\n✅ Seed complete");

    Ok(())
}

fn run_demo() -> Result<()> {
    println!("✏️  Demo adjustment session");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let conn = open_db()?;
    let categories = fetch_categories(&conn)?;
    let config = get_active_config(&conn)?
        .context("No active budget config. Run: civic-budget seed")?;

    // Raise the first subcategory by 5% and cut the second by 8%
    let mut session = AdjustmentSession::new();

    let first = &categories[0].subcategories[0];
    let raised = first.default_value as f64 * 1.05;
    session.set_change(&first.id, raised)?;

    let second = &categories[0].subcategories[1];
    let cut = second.default_value as f64 * 0.92;
    session.set_change(&second.id, cut)?;

    println!("\n📐 Adjustments:");
    for category in &categories {
        for sub in &category.subcategories {
            if !session.is_changed(&sub.id) {
                continue;
            }

            let current = session.current_value(sub);
            let (min, max) = compute_range(sub.default_value);
            let percent = calc_percent(sub.default_value as f64, current);

            println!(
                "  {} {} → {} ({:+.1}%), allowed {} – {}",
                category.icon,
                sub.name,
                format_mln(current),
                percent,
                format_mln(min),
                format_mln(max),
            );

            if let Some(impact) = active_impact(current, sub.default_value, &sub.impacts) {
                println!("    💬 [{}] {}", impact.threshold_type.label(), impact.message);
            }
        }
    }

    let expenses = global_expenses(&categories, &session);
    let current_deficit = deficit(config.total_income, expenses);

    println!("\n📊 Totals:");
    println!("  Income:   {}", format_mln(config.total_income as f64));
    println!("  Expenses: {}", format_mln(expenses));
    println!(
        "  {} {}",
        if current_deficit >= 0.0 { "Surplus: " } else { "Shortfall:" },
        format_mln(current_deficit.abs())
    );

    println!("\n💾 Submitting plan...");
    let plan = Plan::from_session(
        &session,
        &categories,
        config.total_income,
        Submitter::named("Demo user"),
    );
    create_plan(&conn, &plan)?;
    println!("✓ Plan {} archived", plan.id);

    Ok(())
}

fn run_aggregate() -> Result<()> {
    println!("📊 Population statistics");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let conn = open_db()?;
    let categories = fetch_categories(&conn)?;
    let plans = list_plans(&conn)?;

    // Prefer income from the live config; fall back to first-plan income
    // for archives seeded before configs existed
    let aggregator = match get_active_config(&conn)? {
        Some(config) => Aggregator::with_income(config.total_income),
        None => Aggregator::new(),
    };

    let stats = aggregator.aggregate(&plans, &categories);

    println!("\n{}", stats.summary());

    for category in &stats.categories {
        println!("\n{} {}", category.category_icon, category.category_name);

        for sub in &category.subcategories {
            if sub.participant_count == 0 {
                println!("  {} — unchanged", sub.subcategory_name);
                continue;
            }

            println!(
                "  {} — {} → {} ({:+.1}%), {} participants",
                sub.subcategory_name,
                format_mln(sub.default_value as f64),
                format_mln((sub.default_value + sub.total_change) as f64),
                sub.percent_change,
                sub.participant_count,
            );
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Deficit: {} → {}",
        format_mln(stats.original_deficit as f64),
        format_mln(stats.proposed_deficit as f64),
    );

    Ok(())
}
