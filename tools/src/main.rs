//! kanri: command-line front end for the management ledger.
//!
//! Usage:
//!   kanri terms   [--today 2025-03-15]
//!   kanri pl      --term 5 --division 事業本部 [--json]
//!   kanri summary --month 2025-02 --division 飲食事業
//!   kanri trend   --period current|previous|custom [--from 2024-01-01 --to 2024-12-31]
//!   kanri demo-seed
//!
//! Common flags: --db <path>, --config <path>, --today <YYYY-MM-DD>, --json

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use kanri_core::{
    config::KanriConfig,
    fiscal::{default_month, month_of, months_in_term, DateRange, FiscalCalendar},
    report::{PlReport, ReportEngine},
    store::{ExpenseEntry, FixedExpense, LedgerStore, SalesEntry},
    summary::{month_expense_summary, month_sales_summary, LineAmount},
    targets::{DisplayCell, TargetRatio},
    trends::{resolve_period, DivisionTrend, PeriodOption, TrendAnalyzer},
    types::{CostCategory, MonthKey, TaxBucket},
};
use std::env;

const DEFAULT_CONFIG: &str = "kanri.json";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("pl");

    let config_path = flag(&args, "--config").unwrap_or(DEFAULT_CONFIG);
    let config = KanriConfig::load_or_default(config_path)?;
    let db = flag(&args, "--db").unwrap_or(config.db_path.as_str());
    let today = match flag(&args, "--today") {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("--today expects YYYY-MM-DD, got '{s}'"))?,
        None => chrono::Local::now().date_naive(),
    };
    let json = args.iter().any(|a| a == "--json");

    let store = LedgerStore::open(db)?;
    store.migrate()?;
    log::debug!("{command}: db={db} today={today}");
    let calendar = FiscalCalendar::from_config(&config)?;

    match command {
        "terms" => run_terms(&calendar, today, json),
        "pl" => run_pl(&args, &store, &config, today, json),
        "summary" => run_summary(&args, &store, &config, &calendar, today, json),
        "trend" => run_trend(&args, &store, &config, &calendar, today, json),
        "demo-seed" => run_demo_seed(&store, &config, &calendar, today),
        other => bail!("unknown command '{other}' (expected terms, pl, summary, trend, demo-seed)"),
    }
}

fn run_terms(calendar: &FiscalCalendar, today: NaiveDate, json: bool) -> Result<()> {
    let terms = calendar.list_terms(today);
    if json {
        println!("{}", serde_json::to_string_pretty(&terms)?);
        return Ok(());
    }
    if terms.is_empty() {
        println!("  (No fiscal term has started yet)");
    }
    for t in &terms {
        println!("  {:>6}  {} .. {}", t.label, t.start, t.end);
    }
    Ok(())
}

fn run_pl(
    args: &[String],
    store: &LedgerStore,
    config: &KanriConfig,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let engine = ReportEngine::from_config(store, config)?;
    let term = match flag(args, "--term") {
        Some(_) => engine.calendar().started_term(parse_arg(args, "--term", 0u32), today)?,
        None => engine
            .calendar()
            .latest_term(today)
            .ok_or_else(|| anyhow!("no fiscal term has started by {today}"))?,
    };
    let division = flag(args, "--division").unwrap_or(config.all_divisions_label.as_str());
    let report = engine.build_pl_table(&term, &engine.scope_for(division));

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_pl(&report, division);
    }
    Ok(())
}

fn print_pl(report: &PlReport, division: &str) {
    println!("=== {} / {} ===", report.term.label, division);
    if !report.has_data() {
        println!("  (No data for this term)");
        return;
    }
    let display = &report.display;
    let header: Vec<String> = display.columns.iter().map(|c| format!("{c:>14}")).collect();
    println!("{:<24}{}", "", header.join(""));
    for row in &display.rows {
        let cells: Vec<String> = std::iter::once(&row.total)
            .chain(row.cells.iter())
            .map(render_cell)
            .collect();
        println!("{:<24}{}", row.label, cells.join(""));
    }
    println!();
    println!("  flagged cells: {}", display.flagged_count());
}

fn render_cell(cell: &DisplayCell) -> String {
    let text = if cell.flagged { format!("*{}", cell.text) } else { cell.text.clone() };
    format!("{text:>14}")
}

fn run_summary(
    args: &[String],
    store: &LedgerStore,
    config: &KanriConfig,
    calendar: &FiscalCalendar,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let month = match flag(args, "--month") {
        Some(s) => MonthKey::parse(s)?,
        None => {
            let term = calendar
                .latest_term(today)
                .ok_or_else(|| anyhow!("no fiscal term has started by {today}"))?;
            default_month(today, &months_in_term(&term))
                .ok_or_else(|| anyhow!("term {} has no months", term.label))?
        }
    };
    let division = flag(args, "--division").unwrap_or(config.all_divisions_label.as_str());

    let sales = month_sales_summary(store, month.year, month.month, division)?;
    let expenses = month_expense_summary(store, month.year, month.month, division)?;

    if json {
        let out = serde_json::json!({
            "month": month,
            "division": division,
            "sales": sales,
            "expenses": expenses,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("=== {month} / {division} ===");
    match sales {
        Some(s) => print_lines("入金", &s.lines()),
        None => println!("  (No sales this month)"),
    }
    match expenses {
        Some(e) => {
            print_lines("変動費", &e.variable_lines());
            print_lines("固定費", &e.fixed_lines());
        }
        None => println!("  (No expenses this month)"),
    }
    Ok(())
}

fn print_lines(title: &str, lines: &[LineAmount]) {
    println!("--- {title} ---");
    for l in lines {
        println!("  {:<28}{:>16.0}", l.label, l.amount);
    }
}

fn run_trend(
    args: &[String],
    store: &LedgerStore,
    config: &KanriConfig,
    calendar: &FiscalCalendar,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let option = match flag(args, "--period").unwrap_or("current") {
        "current" => PeriodOption::CurrentTerm,
        "previous" => PeriodOption::PreviousTerm,
        "custom" => {
            let start = parse_date(args, "--from")?
                .ok_or_else(|| anyhow!("--period custom needs --from"))?;
            let end = parse_date(args, "--to")?.unwrap_or(today);
            PeriodOption::Custom(DateRange { start, end })
        }
        other => bail!("unknown period '{other}' (expected current, previous, custom)"),
    };
    let range = resolve_period(option, calendar, today);

    let divisions = match flag(args, "--division") {
        Some(d) => vec![d.to_string()],
        None => {
            let mut names = store.division_names()?;
            if !names.contains(&config.all_divisions_label) {
                names.insert(0, config.all_divisions_label.clone());
            }
            names
        }
    };
    let categories = store.expense_category_names()?;

    let analyzer = TrendAnalyzer::new(store, config.page_size, &config.all_divisions_label);
    let trends = analyzer.trends(&range, &divisions, &categories)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&trends)?);
    } else {
        println!("=== {} .. {} ===", range.start, range.end);
        for t in &trends {
            print_trend(t);
        }
    }
    Ok(())
}

fn print_trend(trend: &DivisionTrend) {
    println!("--- {} ---", trend.division);
    if trend.is_empty() {
        println!("  (No data in this period)");
        return;
    }
    for p in &trend.sales {
        println!("  {}  売上 {:>14.0}", p.label, p.value);
    }
    for c in &trend.categories {
        println!("  [{}]", c.category);
        for (actual, target) in c.actual.iter().zip(c.target.iter()) {
            println!(
                "  {}  実績 {:>12.0}  目標額 {:>12.0}",
                actual.label, actual.value, target.value
            );
        }
    }
}

/// Populate an empty ledger with two divisions and a term of entries.
fn run_demo_seed(
    store: &LedgerStore,
    config: &KanriConfig,
    calendar: &FiscalCalendar,
    today: NaiveDate,
) -> Result<()> {
    let term = calendar
        .latest_term(today)
        .ok_or_else(|| anyhow!("no fiscal term has started by {today}"))?;
    let divisions = ["飲食事業", "物販事業"];

    store.add_division(&config.all_divisions_label)?;
    for d in divisions {
        store.add_division(d)?;
    }
    for c in CostCategory::ALL {
        let is_fixed = matches!(
            c,
            CostCategory::OtherFixed
                | CostCategory::Rent
                | CostCategory::LoanInterest
                | CostCategory::LoanPrincipal
        );
        store.add_expense_category(c.key(), is_fixed)?;
    }
    store.upsert_expense_target(&TargetRatio {
        division: divisions[0].to_string(),
        cost_rate: 30.0,
        labor_rate: 25.0,
        fl_rate: 55.0,
        utility_rate: 5.0,
        misc_rate: 5.0,
        other_fixed_rate: 3.0,
        rent_rate: 10.0,
        flr_rate: 65.0,
        op_profit_rate: 10.0,
    })?;

    for (n, division) in divisions.iter().enumerate() {
        store.save_fixed_expense(&FixedExpense {
            id: None,
            partner: "大家".to_string(),
            account: "地代家賃".to_string(),
            detail: "店舗家賃".to_string(),
            payment: "振込".to_string(),
            cost: 200_000.0 + 50_000.0 * n as f64,
            division: division.to_string(),
            category: CostCategory::Rent.key().to_string(),
        })?;
    }

    let mut months = 0;
    for month in months_in_term(&term) {
        if month > month_of(today) {
            break;
        }
        for (n, division) in divisions.iter().enumerate() {
            let base = 1_000_000.0 * (n as f64 + 1.0) + 10_000.0 * month.month as f64;
            let sales = [
                (TaxBucket::Standard10, base),
                (TaxBucket::Standard8, base * 0.4),
            ];
            for (bucket, amount) in sales {
                store.add_sales_entry(&SalesEntry {
                    id: None,
                    year: month.year,
                    month: month.month,
                    partner: "店頭".to_string(),
                    detail: "売上".to_string(),
                    expected_amount: amount,
                    received_amount: amount,
                    payment: "現金".to_string(),
                    invoice_issued: false,
                    division: division.to_string(),
                    tax_rate: Some(bucket.key().to_string()),
                })?;
            }
            let costs = [
                (CostCategory::CostOfGoods, base * 0.35),
                (CostCategory::Labor, base * 0.22),
                (CostCategory::Utilities, base * 0.04),
                (CostCategory::Misc, base * 0.03),
            ];
            for (category, cost) in costs {
                store.add_expense_entry(&ExpenseEntry {
                    id: None,
                    year: month.year,
                    month: month.month,
                    partner: "取引先".to_string(),
                    account: category.key().to_string(),
                    detail: String::new(),
                    payment: "振込".to_string(),
                    cost,
                    category: category.key().to_string(),
                    division: division.to_string(),
                })?;
            }
            store.apply_fixed_expenses(month.year, month.month, division)?;
            store.refresh_sales_totals(month.year, month.month, division)?;
            store.refresh_expense_totals(month.year, month.month, division)?;
        }
        months += 1;
    }

    println!("=== DEMO SEED ===");
    println!("  db:         {}", store.path().unwrap_or(":memory:"));
    println!("  term:       {}", term.label);
    println!("  divisions:  {}", divisions.join(", "));
    println!("  months:     {months}");
    Ok(())
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == name).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], name: &str, default: T) -> T {
    flag(args, name).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_date(args: &[String], name: &str) -> Result<Option<NaiveDate>> {
    flag(args, name)
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("{name} expects YYYY-MM-DD, got '{s}'"))
        })
        .transpose()
}
