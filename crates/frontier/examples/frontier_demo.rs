//! Demonstration of a full frontier run on synthetic prices.

use chrono::{Duration, NaiveDate};
use frontier::data::PriceSeries;
use frontier::output::{ExportFormat, Exporter, MarketSummary};
use frontier::portfolio::SamplingMethod;
use frontier::{Pipeline, PipelineConfig};

fn synthetic_series() -> Vec<PriceSeries> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let drifts = [
        ("BOND", 0.0002, 0.003),
        ("GOLD", 0.0004, 0.009),
        ("TECH", 0.0009, 0.02),
    ];

    drifts
        .iter()
        .enumerate()
        .map(|(k, &(ticker, drift, vol))| {
            let mut price = 100.0;
            let quotes = (0..250).map(|t| {
                let shock = vol * ((t as f64) * (0.37 + 0.21 * k as f64)).sin();
                if t > 0 {
                    price *= 1.0 + drift + shock;
                }
                (start + Duration::days(t), price)
            });
            PriceSeries::from_quotes(ticker, quotes)
        })
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Frontier Demo ===\n");

    let series = synthetic_series();

    let mut config = PipelineConfig::default();
    config.sampler.method = SamplingMethod::Lattice { step: 0.1 };
    config.frontier.grid_points = 15;
    let pipeline = Pipeline::new(config)?;

    let output = pipeline.run_series(&series)?;

    let summary = MarketSummary::new(&output.moments, None, output.report.metadata.raw_rows);
    println!("{}", summary.to_ascii_table());

    println!(
        "Efficient frontier ({} points):",
        output.report.efficient_frontier.len()
    );
    for point in &output.report.efficient_frontier {
        let weights: Vec<String> = point
            .weights
            .iter()
            .map(|(ticker, w)| format!("{}={:.2}", ticker, w))
            .collect();
        println!(
            "  return={:.4}%  risk={:.4}%  [{}]",
            point.expected_return * 100.0,
            point.risk * 100.0,
            weights.join(", ")
        );
    }

    println!(
        "\nSampled {} lattice portfolios; {} skipped targets.",
        output.report.portfolios.len(),
        output.diagnostics.skipped_targets()
    );

    let json = output.report.export_to_string(ExportFormat::Json)?;
    println!("\nCompact JSON size: {} bytes", json.len());

    Ok(())
}
