//! Non-dominated filtering of risk/return points

use crate::portfolio::Portfolio;

/// Relative return improvement a point needs over its predecessors to be kept.
const RETURN_TOLERANCE: f64 = 1e-12;

/// Reduce a set of portfolios to its non-dominated subset, sorted by risk.
///
/// Points are swept in order of ascending risk (ties broken by descending
/// return) and a point is kept only if its return strictly exceeds every
/// return kept before it. The result is strictly increasing in both risk
/// and return, so no point dominates another. Points with non-finite
/// statistics are discarded.
pub fn pareto_filter(points: Vec<Portfolio>) -> Vec<Portfolio> {
    let mut points: Vec<Portfolio> = points
        .into_iter()
        .filter(|p| p.risk().is_finite() && p.expected_return().is_finite())
        .collect();

    points.sort_by(|a, b| {
        a.risk()
            .total_cmp(&b.risk())
            .then_with(|| b.expected_return().total_cmp(&a.expected_return()))
    });

    let scale = points
        .iter()
        .map(|p| p.expected_return().abs())
        .fold(0.0_f64, f64::max)
        .max(f64::MIN_POSITIVE);
    let tolerance = RETURN_TOLERANCE * scale;

    let mut kept: Vec<Portfolio> = Vec::with_capacity(points.len());
    for point in points {
        let improves = kept
            .last()
            .is_none_or(|best| point.expected_return() > best.expected_return() + tolerance);
        if improves {
            kept.push(point);
        }
    }
    kept
}

/// Upper-left boundary of a sampled portfolio cloud.
///
/// Unlike the optimized frontier this is only as good as the samples; it is
/// useful for comparing a cloud against the exact frontier.
pub fn empirical_frontier(portfolios: &[Portfolio]) -> Vec<Portfolio> {
    pareto_filter(portfolios.to_vec())
}
