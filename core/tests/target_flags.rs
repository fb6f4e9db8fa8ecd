use kanri_core::{
    fetcher::aggregate_across_divisions,
    pnl::{build_pl_rows, PlLine, PlTable, TOTAL_LABEL},
    ratios::insert_ratio_rows,
    store::CategoryAggregate,
    targets::{annotate, cell_flagged, RowEmphasis, TargetRatio, Thresholds},
    types::{CostCategory, MonthKey, TaxBucket},
};

fn month(y: i32, m: u32) -> MonthKey {
    MonthKey::new(y, m).unwrap()
}

fn agg(id: i64, m: MonthKey, key: &str, amount: f64) -> CategoryAggregate {
    CategoryAggregate {
        id,
        year: m.year,
        month: m.month,
        division: "飲食事業".to_string(),
        key: key.to_string(),
        amount,
    }
}

fn target(cost_rate: f64) -> TargetRatio {
    TargetRatio {
        division: "飲食事業".to_string(),
        cost_rate,
        ..TargetRatio::default()
    }
}

/// Two months: 35% cost ratio in August, 25% in September.
fn table_with_costs() -> PlTable {
    let aug = month(2024, 8);
    let sep = month(2024, 9);
    let sales = aggregate_across_divisions(&[
        agg(1, aug, TaxBucket::Standard10.key(), 1_000_000.0),
        agg(2, sep, TaxBucket::Standard10.key(), 1_000_000.0),
    ]);
    let expenses = aggregate_across_divisions(&[
        agg(3, aug, CostCategory::CostOfGoods.key(), 350_000.0),
        agg(4, sep, CostCategory::CostOfGoods.key(), 250_000.0),
        agg(5, sep, CostCategory::Labor.key(), 900_000.0),
    ]);
    let mut table = build_pl_rows(&[aug, sep], &sales, &expenses);
    insert_ratio_rows(&mut table);
    table
}

#[test]
fn ratio_above_target_is_flagged() {
    let t = target(30.0);
    let thresholds = Thresholds::from_target(Some(&t));
    assert!(cell_flagged(PlLine::CostRatio, "35.0%", &thresholds));
    assert!(!cell_flagged(PlLine::CostRatio, "25.0%", &thresholds));
    assert!(!cell_flagged(PlLine::CostRatio, "30.0%", &thresholds));
}

#[test]
fn zero_target_never_flags() {
    let t = target(0.0);
    let thresholds = Thresholds::from_target(Some(&t));
    assert!(!cell_flagged(PlLine::CostRatio, "95.0%", &thresholds));
}

#[test]
fn missing_target_flags_no_ratio() {
    let thresholds = Thresholds::from_target(None);
    assert!(thresholds.is_empty());
    assert!(!cell_flagged(PlLine::CostRatio, "99.9%", &thresholds));
    // Negative amounts are flagged regardless of targets.
    assert!(cell_flagged(PlLine::OperatingProfit, "¥-1,234", &thresholds));
}

#[test]
fn negative_amounts_are_flagged() {
    let thresholds = Thresholds::default();
    assert!(cell_flagged(PlLine::RetainedEarnings, "¥-1", &thresholds));
    assert!(!cell_flagged(PlLine::RetainedEarnings, "¥0", &thresholds));
    assert!(!cell_flagged(PlLine::RetainedEarnings, "¥1,000", &thresholds));
    assert!(!cell_flagged(PlLine::RetainedEarnings, "-", &thresholds));
}

#[test]
fn flags_use_the_displayed_percentage() {
    let t = target(30.0);
    let thresholds = Thresholds::from_target(Some(&t));
    // 30.04% displays as 30.0%, which is not above 30.
    assert!(!cell_flagged(PlLine::CostRatio, "30.0%", &thresholds));
    assert!(cell_flagged(PlLine::CostRatio, "30.1%", &thresholds));
}

#[test]
fn annotate_formats_and_flags_cells() {
    let table = table_with_costs();
    let t = target(30.0);
    let display = annotate(&table, Some(&t));

    assert_eq!(display.columns, vec![TOTAL_LABEL, "2024-08", "2024-09"]);
    assert_eq!(display.rows.len(), table.rows.len());

    let cost = display.row(PlLine::CostRatio).unwrap();
    assert_eq!(cost.cells[0].text, "35.0%");
    assert!(cost.cells[0].flagged);
    assert_eq!(cost.cells[1].text, "25.0%");
    assert!(!cost.cells[1].flagged);
    // 600,000 / 2,000,000 is exactly on target.
    assert_eq!(cost.total.text, "30.0%");
    assert!(!cost.total.flagged);

    let revenue = display.row(PlLine::GrossRevenue).unwrap();
    assert_eq!(revenue.total.text, "¥2,000,000");
    assert_eq!(revenue.emphasis, RowEmphasis::Highlight);

    // September loses money: 1,000,000 - 250,000 - 900,000.
    let profit = display.row(PlLine::OperatingProfit).unwrap();
    assert_eq!(profit.cells[1].text, "¥-150,000");
    assert!(profit.cells[1].flagged);
    assert!(!profit.cells[0].flagged);

    assert_eq!(cost.emphasis, RowEmphasis::Warning);
    assert!(display.flagged_count() >= 2);
}

#[test]
fn annotate_without_target_only_flags_negatives() {
    let table = table_with_costs();
    let display = annotate(&table, None);
    for row in display.rows.iter().filter(|r| r.line.is_ratio()) {
        assert!(
            row.cells.iter().all(|c| !c.flagged) && !row.total.flagged,
            "{} should not be flagged without a target",
            row.label
        );
    }
    assert!(display.row(PlLine::OperatingProfit).unwrap().cells[1].flagged);
}

#[test]
fn category_rates_map_onto_target_columns() {
    let t = TargetRatio {
        division: "飲食事業".to_string(),
        cost_rate: 30.0,
        labor_rate: 25.0,
        fl_rate: 55.0,
        rent_rate: 10.0,
        op_profit_rate: 8.0,
        ..TargetRatio::default()
    };
    assert_eq!(t.category_rate("原価（仕入れ高）"), Some(30.0));
    assert_eq!(t.category_rate("人件費"), Some(25.0));
    assert_eq!(t.category_rate("家賃"), Some(10.0));
    assert_eq!(t.category_rate("営業利益"), Some(8.0));
    assert_eq!(t.category_rate("広告費"), None);
    assert_eq!(t.category_rate("FL比率"), None);
    assert_eq!(t.threshold(PlLine::FlRatio), Some(55.0));
    assert_eq!(t.threshold(PlLine::GrossRevenue), None);
}
