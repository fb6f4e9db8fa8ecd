use chrono::NaiveDate;
use kanri_core::{
    config::KanriConfig,
    error::KanriError,
    fiscal::{default_month, months_in_term, term_years, FiscalCalendar, MONTHS_PER_TERM},
    types::MonthKey,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn month(y: i32, m: u32) -> MonthKey {
    MonthKey::new(y, m).unwrap()
}

#[test]
fn term_count_rolls_over_on_start_month() {
    let cal = FiscalCalendar::default();
    assert_eq!(cal.term_count(date(2025, 3, 15)), 5);
    assert_eq!(cal.term_count(date(2025, 7, 31)), 5);
    assert_eq!(cal.term_count(date(2025, 8, 1)), 6);
}

#[test]
fn no_terms_before_the_first_one_starts() {
    let cal = FiscalCalendar::default();
    assert_eq!(cal.term_count(date(2020, 7, 31)), 0);
    assert!(cal.list_terms(date(2020, 7, 31)).is_empty());
    assert!(cal.latest_term(date(2020, 7, 31)).is_none());
    assert_eq!(cal.term_count(date(2020, 8, 1)), 1);
}

#[test]
fn terms_are_labelled_and_span_twelve_months() {
    let cal = FiscalCalendar::default();
    let terms = cal.list_terms(date(2025, 3, 15));
    let labels: Vec<&str> = terms.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["1期目", "2期目", "3期目", "4期目", "5期目"]);

    let fifth = &terms[4];
    assert_eq!(fifth.start, month(2024, 8));
    assert_eq!(fifth.end, month(2025, 7));

    let months = months_in_term(fifth);
    assert_eq!(months.len(), MONTHS_PER_TERM);
    assert_eq!(months.first().copied(), Some(month(2024, 8)));
    assert_eq!(months[5], month(2025, 1));
    assert_eq!(months.last().copied(), Some(month(2025, 7)));
    assert_eq!(term_years(fifth), vec![2024, 2025]);
}

#[test]
fn january_start_keeps_term_in_one_year() {
    let cal = FiscalCalendar::new(2020, 1).unwrap();
    let term = cal.term(1);
    assert_eq!(term.end, month(2020, 12));
    assert_eq!(term_years(&term), vec![2020]);
}

#[test]
fn unstarted_term_is_rejected() {
    let cal = FiscalCalendar::default();
    let today = date(2025, 3, 15);
    assert!(matches!(
        cal.started_term(6, today),
        Err(KanriError::TermNotFound { index: 6 })
    ));
    assert!(matches!(
        cal.started_term(0, today),
        Err(KanriError::TermNotFound { index: 0 })
    ));
    assert_eq!(cal.started_term(5, today).unwrap().label, "5期目");
}

#[test]
fn invalid_start_month_is_rejected() {
    assert!(matches!(
        FiscalCalendar::new(2020, 13),
        Err(KanriError::InvalidMonth { month: 13, .. })
    ));
    let mut config = KanriConfig::default_test();
    config.fiscal_start_month = 0;
    assert!(FiscalCalendar::from_config(&config).is_err());
    assert!(config.validate().is_err());
}

#[test]
fn current_and_previous_periods() {
    let cal = FiscalCalendar::default();
    let today = date(2025, 3, 15);

    let current = cal.current_period(today);
    assert_eq!(current.start, date(2024, 8, 1));
    assert_eq!(current.end, date(2025, 7, 31));

    let previous = cal.previous_period(today);
    assert_eq!(previous.start, date(2023, 8, 1));
    assert_eq!(previous.end, date(2024, 7, 31));

    assert!(current.contains_month(month(2024, 8)));
    assert!(current.contains_month(month(2025, 7)));
    assert!(!current.contains_month(month(2025, 8)));
}

#[test]
fn default_month_is_last_month_within_term() {
    let cal = FiscalCalendar::default();
    let today = date(2025, 3, 15);

    let current = months_in_term(&cal.term(5));
    assert_eq!(default_month(today, &current), Some(month(2025, 2)));

    // Last month is outside an earlier term, so its final month is used.
    let earlier = months_in_term(&cal.term(4));
    assert_eq!(default_month(today, &earlier), Some(month(2024, 7)));

    assert_eq!(default_month(today, &[]), None);
}

#[test]
fn month_key_round_trips_through_text() {
    let m = MonthKey::parse("2024-03").unwrap();
    assert_eq!(m, month(2024, 3));
    assert_eq!(m.to_string(), "2024-03");
    assert_eq!(m.axis_label(), "2024 / 03");
    assert_eq!(month(2024, 12).succ(), month(2025, 1));
    assert_eq!(month(2025, 1).pred(), month(2024, 12));
    assert!(MonthKey::parse("2024/03").is_err());
    assert!(MonthKey::parse("2024-13").is_err());
}
