//! End-to-end tests: price CSV on disk to exported report

use approx::assert_abs_diff_eq;
use chrono::{Duration, NaiveDate};
use frontier::data::read_price_table_path;
use frontier::output::{ExportFormat, Exporter, FrontierReport};
use frontier::{Pipeline, PipelineConfig};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

const DAYS: usize = 60;

/// Three tickers with smooth, mutually distinct return paths
fn price_csv() -> String {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut prices = [100.0_f64, 50.0, 20.0];
    let mut csv = String::from("Date,AAA,BBB,CCC\n");

    for t in 0..DAYS {
        if t > 0 {
            let x = t as f64;
            prices[0] *= 1.0 + 0.001 + 0.010 * (0.7 * x).sin();
            prices[1] *= 1.0 + 0.0005 + 0.015 * (1.3 * x + 1.0).sin();
            prices[2] *= 1.0 + 0.0008 + 0.008 * (0.4 * x).cos();
        }
        let date = start + Duration::days(t as i64);
        writeln!(csv, "{},{},{},{}", date, prices[0], prices[1], prices[2]).unwrap();
    }
    csv
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("frontier-e2e-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn config_toml() -> &'static str {
    r#"
parallel = true

[sampler]
samples = 200
seed = 11

[frontier]
grid_points = 20
"#
}

#[test]
fn test_csv_to_json_report() {
    let dir = scratch_dir("json");
    let input = dir.join("prices.csv");
    let config_path = dir.join("frontier.toml");
    let output = dir.join("out").join("frontier.json");
    fs::write(&input, price_csv()).unwrap();
    fs::write(&config_path, config_toml()).unwrap();

    let config = PipelineConfig::from_file(&config_path).unwrap();
    assert_eq!(config.sampler.samples, 200);
    assert_eq!(config.frontier.grid_points, 20);

    let table = read_price_table_path(&input).unwrap();
    let result = Pipeline::new(config).unwrap().run(&table).unwrap();
    result
        .report
        .export_to_file(&output, ExportFormat::PrettyJson)
        .unwrap();

    let report = FrontierReport::from_json(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(report, result.report);

    assert_eq!(report.metadata.tickers, vec!["AAA", "BBB", "CCC"]);
    assert_eq!(report.metadata.observations, DAYS - 1);
    assert_eq!(report.metadata.raw_rows, DAYS);
    assert!(!report.metadata.regularized);
    assert_eq!(report.metadata.skipped_targets, 0);
    assert!(report.metadata.condition_number.is_some());

    assert_eq!(report.assets.len(), 3);
    assert_eq!(report.portfolios.len(), 200);
    assert!(report.efficient_frontier.len() >= 2);
    assert!(report.efficient_frontier.len() <= 20);

    for record in report.portfolios.iter().chain(&report.efficient_frontier) {
        assert_eq!(record.weights.len(), 3);
        assert_abs_diff_eq!(record.total_weight(), 1.0, epsilon = 1e-9);
        assert!(record.weights.values().all(|&w| w >= -1e-9));
    }
    for pair in report.efficient_frontier.windows(2) {
        assert!(pair[1].risk > pair[0].risk);
        assert!(pair[1].expected_return > pair[0].expected_return);
    }

    // The top of the frontier is the best single asset
    let best = report
        .assets
        .iter()
        .map(|a| a.expected_return)
        .fold(f64::NEG_INFINITY, f64::max);
    let top = report.efficient_frontier.last().unwrap();
    assert_abs_diff_eq!(top.expected_return, best, epsilon = 1e-12);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_csv_export_lists_every_row() {
    let dir = scratch_dir("csv");
    let input = dir.join("prices.csv");
    fs::write(&input, price_csv()).unwrap();

    let config = PipelineConfig::from_toml(config_toml()).unwrap();
    let table = read_price_table_path(&input).unwrap();
    let result = Pipeline::new(config).unwrap().run(&table).unwrap();

    let csv = result.report.export_to_string(ExportFormat::Csv).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    let expected =
        1 + 3 + result.report.portfolios.len() + result.report.efficient_frontier.len();

    assert_eq!(lines.len(), expected);
    assert_eq!(lines[0], "section,label,expected_return,risk,AAA,BBB,CCC");
    assert!(lines[1].starts_with("asset,AAA,"));
    assert!(lines.last().unwrap().starts_with("frontier,"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_same_seed_same_report() {
    let table = frontier::data::read_price_table(price_csv().as_bytes()).unwrap();
    let run = || {
        Pipeline::new(PipelineConfig::from_toml(config_toml()).unwrap())
            .unwrap()
            .run(&table)
            .unwrap()
            .report
    };

    let first = run().export_to_string(ExportFormat::Json).unwrap();
    let second = run().export_to_string(ExportFormat::Json).unwrap();
    assert_eq!(first, second);
}
