use chrono::NaiveDate;
use kanri_core::{
    config::ALL_DIVISIONS_LABEL,
    fiscal::{DateRange, FiscalCalendar},
    store::LedgerStore,
    summary::{
        month_expense_summary, month_sales_summary, summarize_expenses, summarize_sales,
        FIXED_TOTAL_LABEL, SALES_TOTAL_LABEL, VARIABLE_TOTAL_LABEL,
    },
    targets::TargetRatio,
    trends::{fetch_years, resolve_period, PeriodOption, TrendAnalyzer},
    types::{CostCategory, MonthKey, TaxBucket},
};
use std::collections::BTreeMap;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn test_store() -> LedgerStore {
    let store = LedgerStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.add_expense_category(CostCategory::CostOfGoods.key(), false).unwrap();
    store.add_expense_category(CostCategory::Labor.key(), false).unwrap();
    store.add_expense_category(CostCategory::Rent.key(), true).unwrap();
    store
}

// ── Monthly summary ──────────────────────────────────────────────

#[test]
fn sales_summary_lists_buckets_in_order_with_total() {
    let store = test_store();
    store
        .put_sales_total(2024, 9, "飲食事業", TaxBucket::Standard10.key(), 1_000.0)
        .unwrap();
    store
        .put_sales_total(2024, 9, "飲食事業", TaxBucket::Other8.key(), 200.0)
        .unwrap();

    let summary = month_sales_summary(&store, 2024, 9, "飲食事業").unwrap().unwrap();
    let lines = summary.lines();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0].label, "売上10%");
    assert_eq!(lines[1].label, "売上8%");
    assert_eq!(lines[1].amount, 0.0);
    assert_eq!(lines[3].label, "その他売上8%");
    assert_eq!(lines[3].amount, 200.0);
    assert_eq!(lines[4].label, SALES_TOTAL_LABEL);
    assert_eq!(lines[4].amount, 1_200.0);
}

#[test]
fn sales_summary_empty_when_nothing_received() {
    let store = test_store();
    assert!(month_sales_summary(&store, 2024, 9, "飲食事業").unwrap().is_none());

    let mut zeros = BTreeMap::new();
    zeros.insert("売上10%".to_string(), 0.0);
    assert!(summarize_sales(&zeros).is_none());
}

#[test]
fn expense_summary_splits_variable_and_fixed() {
    let store = test_store();
    store
        .put_expense_total(2024, 9, "飲食事業", CostCategory::CostOfGoods.key(), 100.0)
        .unwrap();
    store
        .put_expense_total(2024, 9, "飲食事業", CostCategory::Rent.key(), 50.0)
        .unwrap();

    let summary = month_expense_summary(&store, 2024, 9, "飲食事業").unwrap().unwrap();
    assert_eq!(summary.variable.len(), 1, "categories without totals are left out");
    assert_eq!(summary.variable[0].label, CostCategory::CostOfGoods.key());
    assert_eq!(summary.variable_total, 100.0);
    assert_eq!(summary.fixed_total, 50.0);

    let variable = summary.variable_lines();
    assert_eq!(variable.last().unwrap().label, VARIABLE_TOTAL_LABEL);
    let fixed = summary.fixed_lines();
    assert_eq!(fixed.last().unwrap().label, FIXED_TOTAL_LABEL);
    assert_eq!(fixed.last().unwrap().amount, 50.0);

    assert!(month_expense_summary(&store, 2024, 10, "飲食事業").unwrap().is_none());
}

#[test]
fn expense_summary_follows_registration_order() {
    let mut totals = BTreeMap::new();
    totals.insert("b".to_string(), 2.0);
    totals.insert("a".to_string(), 1.0);
    totals.insert("c".to_string(), 3.0);
    let variable = vec!["c".to_string(), "a".to_string(), "b".to_string()];

    let summary = summarize_expenses(&totals, &variable, &[]).unwrap();
    let labels: Vec<&str> = summary.variable.iter().map(|l| l.label.as_str()).collect();
    assert_eq!(labels, vec!["c", "a", "b"]);
    assert_eq!(summary.variable_total, 6.0);
    assert!(summary.fixed.is_empty());
    assert_eq!(summary.fixed_total, 0.0);
}

// ── Trends ───────────────────────────────────────────────────────

fn trend_store() -> LedgerStore {
    let store = test_store();
    let s10 = TaxBucket::Standard10.key();
    let s8 = TaxBucket::Standard8.key();
    let cogs = CostCategory::CostOfGoods.key();
    store.put_sales_total(2024, 8, "飲食事業", s10, 1_000_000.0).unwrap();
    store.put_sales_total(2024, 8, "飲食事業", s8, 200_000.0).unwrap();
    store.put_sales_total(2024, 9, "飲食事業", s10, 800_000.0).unwrap();
    store.put_sales_total(2024, 8, "物販事業", s10, 500_000.0).unwrap();
    // Before the period.
    store.put_sales_total(2024, 7, "飲食事業", s10, 999.0).unwrap();
    store.put_expense_total(2024, 8, "飲食事業", cogs, 360_000.0).unwrap();
    store.put_expense_total(2024, 9, "飲食事業", cogs, 200_000.0).unwrap();
    store.put_expense_total(2024, 8, "物販事業", cogs, 100_000.0).unwrap();
    store
        .upsert_expense_target(&TargetRatio {
            division: "飲食事業".to_string(),
            cost_rate: 30.0,
            ..TargetRatio::default()
        })
        .unwrap();
    store
}

#[test]
fn period_options_resolve_against_today() {
    let cal = FiscalCalendar::default();
    let today = date(2025, 3, 15);

    let current = resolve_period(PeriodOption::CurrentTerm, &cal, today);
    assert_eq!((current.start, current.end), (date(2024, 8, 1), date(2025, 7, 31)));

    let previous = resolve_period(PeriodOption::PreviousTerm, &cal, today);
    assert_eq!((previous.start, previous.end), (date(2023, 8, 1), date(2024, 7, 31)));

    let custom = DateRange { start: date(2024, 1, 1), end: date(2024, 6, 30) };
    assert_eq!(resolve_period(PeriodOption::Custom(custom), &cal, today), custom);
    assert_eq!(fetch_years(&custom), vec![2023, 2024]);
}

#[test]
fn trends_per_division_with_targets() {
    let store = trend_store();
    let range = FiscalCalendar::default().current_period(date(2025, 3, 15));
    let divisions = vec![
        ALL_DIVISIONS_LABEL.to_string(),
        "飲食事業".to_string(),
        "物販事業".to_string(),
    ];
    let categories = store.expense_category_names().unwrap();

    let analyzer = TrendAnalyzer::new(&store, 1000, ALL_DIVISIONS_LABEL);
    let trends = analyzer.trends(&range, &divisions, &categories).unwrap();
    assert_eq!(trends.len(), 3);

    let all = &trends[0];
    assert_eq!(all.division, ALL_DIVISIONS_LABEL);
    assert_eq!(all.sales.len(), 2, "July is outside the period");
    assert_eq!(all.sales[0].month, MonthKey::new(2024, 8).unwrap());
    assert_eq!(all.sales[0].label, "2024 / 08");
    assert_eq!(all.sales[0].value, 1_700_000.0);
    assert_eq!(all.sales[1].value, 800_000.0);
    // Only cost of goods has data; labor and rent are skipped.
    assert_eq!(all.categories.len(), 1);
    let all_cogs = all.category(CostCategory::CostOfGoods.key()).unwrap();
    assert_eq!(all_cogs.actual[0].value, 460_000.0);
    assert!(all_cogs.target.iter().all(|p| p.value == 0.0), "no target for the all label");

    let food = &trends[1];
    assert_eq!(food.sales[0].value, 1_200_000.0);
    let food_cogs = food.category(CostCategory::CostOfGoods.key()).unwrap();
    assert_eq!(food_cogs.actual.len(), 2);
    assert_eq!(food_cogs.target.len(), 2);
    assert!(approx(food_cogs.target[0].value, 360_000.0));
    assert!(approx(food_cogs.target[1].value, 240_000.0));
    assert_eq!(food_cogs.target[1].label, "2024 / 09");

    let retail = &trends[2];
    assert_eq!(retail.sales.len(), 1);
    assert_eq!(retail.category(CostCategory::CostOfGoods.key()).unwrap().actual[0].value, 100_000.0);
    assert!(retail.category(CostCategory::Labor.key()).is_none());
}

#[test]
fn empty_period_yields_empty_trends() {
    let store = trend_store();
    let range = DateRange { start: date(2021, 1, 1), end: date(2021, 12, 31) };
    let analyzer = TrendAnalyzer::new(&store, 1000, ALL_DIVISIONS_LABEL);
    let trends = analyzer
        .trends(&range, &["飲食事業".to_string()], &store.expense_category_names().unwrap())
        .unwrap();
    assert!(trends[0].is_empty());
}

#[test]
fn reversed_custom_range_is_rejected() {
    let store = trend_store();
    let range = DateRange { start: date(2024, 12, 1), end: date(2024, 1, 1) };
    let analyzer = TrendAnalyzer::new(&store, 1000, ALL_DIVISIONS_LABEL);
    assert!(analyzer.trends(&range, &["飲食事業".to_string()], &[]).is_err());
}
