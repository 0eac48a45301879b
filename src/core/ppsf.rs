use crate::models::{ComparableSale, EstimatorParams, PpsfEstimate};

/// Estimate an ARV range from a comp set
///
/// Trimmed top-slice average:
/// 1. PPSF for every comp with a known sale amount and a positive living
///    area (others are excluded, not counted as zero)
/// 2. Sort descending
/// 3. Drop the top `outlier_fraction` by count (truncated)
/// 4. Keep the top `top_fraction` of the remainder (truncated)
/// 5. Average the kept values
/// 6. Point estimate = average * subject living area
/// 7. Band = point estimate * (1 ± band_fraction)
///
/// Never fails. Degenerate input resolves to a zero result with
/// `comps_used == 0`.
pub fn estimate_arv(
    comps: &[ComparableSale],
    subject_sqft: Option<f64>,
    params: &EstimatorParams,
) -> PpsfEstimate {
    let mut values: Vec<f64> = comps
        .iter()
        .filter_map(ComparableSale::price_per_square_foot)
        .filter(|ppsf| ppsf.is_finite())
        .collect();
    let comps_eligible = values.len();

    values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let selected = select_top_slice(&values, params.outlier_fraction, params.top_fraction);
    let comps_used = selected.len();

    let avg_ppsf = if comps_used > 0 {
        selected.iter().sum::<f64>() / comps_used as f64
    } else {
        0.0
    };

    let point_estimate = match subject_sqft {
        Some(sqft) if sqft > 0.0 && sqft.is_finite() => avg_ppsf * sqft,
        _ => 0.0,
    };

    let band = clamp_fraction(params.band_fraction);

    tracing::trace!(
        comps_eligible,
        comps_used,
        avg_ppsf,
        point_estimate,
        "PPSF estimate computed"
    );

    PpsfEstimate {
        low: point_estimate * (1.0 - band),
        high: point_estimate * (1.0 + band),
        avg_ppsf,
        point_estimate,
        comps_used,
        comps_eligible,
    }
}

/// Slice of a descending-sorted list left after outlier trimming and top
/// selection
#[inline]
fn select_top_slice(sorted_desc: &[f64], outlier_fraction: f64, top_fraction: f64) -> &[f64] {
    let dropped = fraction_of(sorted_desc.len(), outlier_fraction);
    let remaining = &sorted_desc[dropped..];
    let kept = fraction_of(remaining.len(), top_fraction);
    &remaining[..kept]
}

/// `int(count * fraction)` with the fraction clamped into [0, 1]
#[inline]
fn fraction_of(count: usize, fraction: f64) -> usize {
    let n = (count as f64 * clamp_fraction(fraction)).floor() as usize;
    n.min(count)
}

#[inline]
fn clamp_fraction(fraction: f64) -> f64 {
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}
