use kanri_core::{
    fetcher::aggregate_across_divisions,
    pnl::{build_pl_rows, PlLine, PlRow, PlTable},
    ratios::{insert_ratio_rows, ratio, RATIO_ROWS},
    store::CategoryAggregate,
    types::{CostCategory, MonthKey, TaxBucket},
};
use std::collections::BTreeMap;

fn month(y: i32, m: u32) -> MonthKey {
    MonthKey::new(y, m).unwrap()
}

fn agg(id: i64, m: MonthKey, key: &str, amount: f64) -> CategoryAggregate {
    CategoryAggregate {
        id,
        year: m.year,
        month: m.month,
        division: "A".to_string(),
        key: key.to_string(),
        amount,
    }
}

fn sample_table() -> PlTable {
    let aug = month(2024, 8);
    let sep = month(2024, 9);
    let sales = aggregate_across_divisions(&[
        agg(1, aug, TaxBucket::Standard10.key(), 1_000.0),
        agg(2, sep, TaxBucket::Standard10.key(), 3_000.0),
    ]);
    let expenses = aggregate_across_divisions(&[
        agg(3, aug, CostCategory::CostOfGoods.key(), 500.0),
        agg(4, sep, CostCategory::CostOfGoods.key(), 300.0),
        agg(5, aug, CostCategory::Labor.key(), 200.0),
        agg(6, aug, CostCategory::Rent.key(), 100.0),
    ]);
    let mut table = build_pl_rows(&[aug, sep], &sales, &expenses);
    insert_ratio_rows(&mut table);
    table
}

#[test]
fn ratio_rows_sit_after_their_anchors() {
    let table = sample_table();
    let lines: Vec<PlLine> = table.rows.iter().map(|r| r.line).collect();
    assert_eq!(
        lines,
        vec![
            PlLine::Sales10,
            PlLine::Sales8,
            PlLine::OtherSales10,
            PlLine::OtherSales8,
            PlLine::GrossRevenue,
            PlLine::CostOfGoods,
            PlLine::CostRatio,
            PlLine::GrossProfit,
            PlLine::Labor,
            PlLine::LaborRatio,
            PlLine::FlRatio,
            PlLine::Utilities,
            PlLine::UtilitiesRatio,
            PlLine::Misc,
            PlLine::MiscRatio,
            PlLine::Extraordinary,
            PlLine::OtherFixed,
            PlLine::OtherFixedRatio,
            PlLine::Rent,
            PlLine::RentRatio,
            PlLine::FlrRatio,
            PlLine::Advertising,
            PlLine::LoanInterest,
            PlLine::OperatingProfit,
            PlLine::OperatingMargin,
            PlLine::ConsumptionTax,
            PlLine::CorporateTax,
            PlLine::LoanPrincipal,
            PlLine::RetainedEarnings,
        ]
    );

    let labels = table.labels();
    let pos = |label: &str| labels.iter().position(|l| *l == label).unwrap();
    assert_eq!(pos("原価率"), pos("原価") + 1);
    assert_eq!(pos("FLR比率"), pos("家賃率") + 1);
    assert_eq!(pos("FL比率"), pos("人件費率") + 1);
}

#[test]
fn monthly_ratios_divide_by_gross_revenue() {
    let table = sample_table();
    let aug = month(2024, 8);
    let sep = month(2024, 9);

    let cost = table.row(PlLine::CostRatio).unwrap();
    assert_eq!(cost.value(aug), 0.5);
    assert_eq!(cost.value(sep), 0.1);

    let fl = table.row(PlLine::FlRatio).unwrap();
    assert_eq!(fl.value(aug), 0.7);

    let flr = table.row(PlLine::FlrRatio).unwrap();
    assert!((flr.value(aug) - 0.8).abs() < 1e-12);
}

#[test]
fn total_ratio_is_ratio_of_totals() {
    let table = sample_table();
    let cost = table.row(PlLine::CostRatio).unwrap();
    // 800 / 4000, not the mean of 50% and 10%.
    assert_eq!(cost.total, 0.2);
}

#[test]
fn zero_revenue_gives_zero_ratio() {
    assert_eq!(ratio(500.0, 0.0), 0.0);
    assert_eq!(ratio(0.0, 0.0), 0.0);

    let m = month(2024, 8);
    let empty = aggregate_across_divisions(&[]);
    let mut table = build_pl_rows(&[m], &empty, &empty);
    insert_ratio_rows(&mut table);
    for rule in &RATIO_ROWS {
        let row = table.row(rule.line).unwrap();
        assert_eq!(row.value(m), 0.0);
        assert_eq!(row.total, 0.0);
    }
}

#[test]
fn missing_anchor_appends_ratio_row() {
    let m = month(2024, 8);
    let mut values = BTreeMap::new();
    values.insert(m, 1_000.0);
    let mut table = PlTable {
        months: vec![m],
        rows: vec![PlRow::new(PlLine::GrossRevenue, values, 1_000.0)],
    };
    insert_ratio_rows(&mut table);

    assert_eq!(table.rows.len(), 1 + RATIO_ROWS.len());
    assert_eq!(table.rows[0].line, PlLine::GrossRevenue);
    for rule in &RATIO_ROWS {
        assert!(table.row(rule.line).is_some(), "{} missing", rule.line.label());
    }
}
