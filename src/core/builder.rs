use crate::core::distance::distance_between;
use crate::models::{
    CompMetrics, ComparableSale, FlatTable, FlatValue, PpsfEstimate, SubjectProperty,
    ValuationResult,
};

/// Subject columns of a flattened row, in output order
pub const SUBJECT_COLUMNS: &[&str] = &[
    "address",
    "normalized_address",
    "bedrooms",
    "bathrooms",
    "year_built",
    "living_square_feet",
    "lot_square_feet",
    "lot_acres",
    "latitude",
    "longitude",
    "enrichment_matched",
    "estimated_arv_low",
    "estimated_arv_high",
    "average_ppsf",
    "number_of_comps",
];

/// Per-comp column suffixes; each is emitted as `comp_N_<suffix>`
pub const COMP_COLUMN_SUFFIXES: &[&str] = &[
    "address",
    "bedrooms",
    "bathrooms",
    "year_built",
    "living_square_feet",
    "lot_square_feet",
    "last_sale_amount",
    "last_sale_date",
    "ppsf",
    "distance_miles",
];

/// Assemble the output record for one subject
///
/// Every numeric field is coerced: unknown or non-finite values are
/// emitted as 0 so the record is always structurally complete.
pub fn build_valuation(
    subject: &SubjectProperty,
    normalized_address: &str,
    enrichment_matched: bool,
    estimate: &PpsfEstimate,
) -> ValuationResult {
    let attrs = &subject.attributes;

    let comps = subject
        .comps
        .iter()
        .map(|comp| build_comp_metrics(subject, comp))
        .collect();

    ValuationResult {
        address: subject.address.clone(),
        normalized_address: normalized_address.to_string(),
        bedrooms: attrs.bedrooms.unwrap_or(0),
        bathrooms: number(attrs.bathrooms),
        year_built: attrs.year_built.unwrap_or(0),
        living_square_feet: number(attrs.living_square_feet),
        lot_square_feet: number(attrs.lot_square_feet),
        lot_acres: number(attrs.lot_acres),
        latitude: number(attrs.latitude),
        longitude: number(attrs.longitude),
        enrichment_matched,
        estimated_arv_low: finite_or_zero(estimate.low),
        estimated_arv_high: finite_or_zero(estimate.high),
        average_price_per_square_foot: finite_or_zero(estimate.avg_ppsf),
        number_of_comps: estimate.comps_used,
        comps,
    }
}

fn build_comp_metrics(subject: &SubjectProperty, comp: &ComparableSale) -> CompMetrics {
    let attrs = &comp.attributes;
    CompMetrics {
        address: comp.address.clone(),
        bedrooms: attrs.bedrooms.unwrap_or(0),
        bathrooms: number(attrs.bathrooms),
        year_built: attrs.year_built.unwrap_or(0),
        living_square_feet: number(attrs.living_square_feet),
        lot_square_feet: number(attrs.lot_square_feet),
        last_sale_amount: number(comp.last_sale_amount),
        last_sale_date: comp.last_sale_date,
        ppsf: number(comp.price_per_square_foot()),
        distance_miles: finite_or_zero(distance_between(&subject.attributes, attrs)),
    }
}

#[inline]
fn number(value: Option<f64>) -> f64 {
    value.map(finite_or_zero).unwrap_or(0.0)
}

#[inline]
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

impl ValuationResult {
    /// Flatten into ordered `(column, value)` pairs with 1-indexed comp blocks
    pub fn flatten(&self) -> Vec<(String, FlatValue)> {
        let mut row: Vec<(String, FlatValue)> = SUBJECT_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .zip(self.subject_values())
            .collect();

        for (i, comp) in self.comps.iter().enumerate() {
            let values = comp_values(comp);
            row.extend(comp_columns(i + 1).into_iter().zip(values));
        }

        row
    }

    fn subject_values(&self) -> Vec<FlatValue> {
        vec![
            FlatValue::Text(self.address.clone()),
            FlatValue::Text(self.normalized_address.clone()),
            FlatValue::Count(self.bedrooms as u64),
            FlatValue::Number(self.bathrooms),
            FlatValue::Count(self.year_built.max(0) as u64),
            FlatValue::Number(self.living_square_feet),
            FlatValue::Number(self.lot_square_feet),
            FlatValue::Number(self.lot_acres),
            FlatValue::Number(self.latitude),
            FlatValue::Number(self.longitude),
            FlatValue::Flag(self.enrichment_matched),
            FlatValue::Number(self.estimated_arv_low),
            FlatValue::Number(self.estimated_arv_high),
            FlatValue::Number(self.average_price_per_square_foot),
            FlatValue::Count(self.number_of_comps as u64),
        ]
    }
}

fn comp_values(comp: &CompMetrics) -> Vec<FlatValue> {
    vec![
        FlatValue::Text(comp.address.clone()),
        FlatValue::Count(comp.bedrooms as u64),
        FlatValue::Number(comp.bathrooms),
        FlatValue::Count(comp.year_built.max(0) as u64),
        FlatValue::Number(comp.living_square_feet),
        FlatValue::Number(comp.lot_square_feet),
        FlatValue::Number(comp.last_sale_amount),
        comp.last_sale_date
            .map(|d| FlatValue::Text(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(FlatValue::Empty),
        FlatValue::Number(comp.ppsf),
        FlatValue::Number(comp.distance_miles),
    ]
}

fn comp_columns(n: usize) -> Vec<String> {
    COMP_COLUMN_SUFFIXES
        .iter()
        .map(|suffix| format!("comp_{}_{}", n, suffix))
        .collect()
}

/// Render results as one table whose header covers the widest comp block
///
/// Rows with fewer comps are padded with empty cells.
pub fn flat_table(results: &[ValuationResult]) -> FlatTable {
    let max_comps = results.iter().map(|r| r.comps.len()).max().unwrap_or(0);

    let mut columns: Vec<String> = SUBJECT_COLUMNS.iter().map(|c| c.to_string()).collect();
    for n in 1..=max_comps {
        columns.extend(comp_columns(n));
    }

    let rows = results
        .iter()
        .map(|result| {
            let mut row: Vec<FlatValue> = result.flatten().into_iter().map(|(_, v)| v).collect();
            row.resize(columns.len(), FlatValue::Empty);
            row
        })
        .collect();

    FlatTable { columns, rows }
}
