//! Integration tests for loading prices and computing aligned returns

use approx::assert_abs_diff_eq;
use chrono::NaiveDate;
use frontier_data::returns::MIN_ALIGNED_DATES;
use frontier_data::{DataError, ReturnCalculator, read_price_table, read_price_table_path};
use rstest::rstest;

const WIDE: &str = "\
Date,AAA,BBB
2024-01-02,100,50
2024-01-03,110,
2024-01-04,121,55
2024-01-05,NaN,60
2024-01-08,133.1,66
";

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

#[test]
fn test_wide_table_to_returns() {
    let table = read_price_table(WIDE.as_bytes()).unwrap();
    assert_eq!(table.tickers(), vec!["AAA", "BBB"]);
    assert_eq!(table.raw_rows(), 5);

    let returns = ReturnCalculator::new().compute_table(&table).unwrap();

    // Jan 3 (BBB missing) and Jan 5 (AAA NaN) drop out of the calendar
    assert_eq!(returns.dates(), &[day(4), day(8)]);
    assert_eq!(returns.n_observations(), 2);
    assert_eq!(returns.n_assets(), 2);
    assert_eq!(returns.raw_rows(), 5);

    let aaa = returns.asset(0);
    assert_abs_diff_eq!(aaa[0], 0.21, epsilon = 1e-12);
    assert_abs_diff_eq!(aaa[1], 0.1, epsilon = 1e-12);

    let bbb = returns.asset(1);
    assert_abs_diff_eq!(bbb[0], 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(bbb[1], 0.2, epsilon = 1e-12);
}

#[test]
fn test_multi_header_matches_wide_layout() {
    let multi = "\
Price,Close,Close,Volume,Volume
Ticker,AAA,BBB,AAA,BBB
Date,,,,
2024-01-02,100,50,1000,2000
2024-01-03,110,,1000,2000
2024-01-04,121,55,1000,2000
2024-01-05,NaN,60,1000,2000
2024-01-08,133.1,66,1000,2000
";
    let calculator = ReturnCalculator::new();
    let from_multi = calculator
        .compute_table(&read_price_table(multi.as_bytes()).unwrap())
        .unwrap();
    let from_wide = calculator
        .compute_table(&read_price_table(WIDE.as_bytes()).unwrap())
        .unwrap();

    assert_eq!(from_multi.tickers(), from_wide.tickers());
    assert_eq!(from_multi.dates(), from_wide.dates());
    assert_eq!(from_multi.returns(), from_wide.returns());
    assert_eq!(from_multi.raw_rows(), from_wide.raw_rows());
}

#[test]
fn test_load_from_file() {
    let path = std::env::temp_dir().join(format!("frontier-prices-{}.csv", std::process::id()));
    std::fs::write(&path, WIDE).unwrap();

    let table = read_price_table_path(&path).unwrap();
    assert_eq!(table.series().len(), 2);
    assert_eq!(table.series()[1].price(day(8)), Some(66.0));

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_missing_file() {
    let result = read_price_table_path("/nonexistent/frontier/prices.csv");
    assert!(matches!(result, Err(DataError::Io(_))));
}

#[rstest]
#[case::zero("0")]
#[case::negative("-5")]
#[case::infinite("inf")]
fn test_degenerate_price_rejected(#[case] price: &str) {
    let csv = format!("Date,AAA,BBB\n2024-01-02,100,50\n2024-01-03,{},51\n", price);
    let table = read_price_table(csv.as_bytes()).unwrap();
    let err = ReturnCalculator::new().compute_table(&table).unwrap_err();

    match err {
        DataError::DegenerateAsset { ticker, date, .. } => {
            assert_eq!(ticker, "AAA");
            assert_eq!(date, day(3));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_single_aligned_date_is_insufficient() {
    let csv = "Date,AAA,BBB\n2024-01-02,100,\n2024-01-03,101,50\n2024-01-04,,51\n";
    let table = read_price_table(csv.as_bytes()).unwrap();
    let err = ReturnCalculator::new().compute_table(&table).unwrap_err();

    assert!(matches!(
        err,
        DataError::InsufficientData { required, actual: 1 } if required == MIN_ALIGNED_DATES
    ));
}

#[rstest]
#[case::empty("")]
#[case::bad_date("Date,AAA\n2024-01-02,1\nyesterday,2\n")]
#[case::bad_price("Date,AAA\n2024-01-02,1\n2024-01-03,abc\n")]
fn test_malformed_csv(#[case] csv: &str) {
    assert!(matches!(
        read_price_table(csv.as_bytes()),
        Err(DataError::Parse(_))
    ));
}

#[test]
fn test_duplicate_ticker_rejected() {
    let csv = "Date,AAA,AAA\n2024-01-02,1,2\n2024-01-03,1,2\n";
    assert!(matches!(
        read_price_table(csv.as_bytes()),
        Err(DataError::DuplicateTicker(t)) if t == "AAA"
    ));
}
