use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Physical attributes shared by subjects and comps.
///
/// Every attribute is optional: `None` means "unknown", which is distinct
/// from a known zero (a studio has zero bedrooms).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyAttributes {
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<f64>,
    #[serde(rename = "yearBuilt", default)]
    pub year_built: Option<i32>,
    #[serde(rename = "livingSquareFeet", default)]
    pub living_square_feet: Option<f64>,
    #[serde(rename = "lotSquareFeet", default)]
    pub lot_square_feet: Option<f64>,
    #[serde(rename = "lotAcres", default)]
    pub lot_acres: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// A property being valued, together with its retrieved comps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProperty {
    pub address: String,
    #[serde(flatten)]
    pub attributes: PropertyAttributes,
    #[serde(default)]
    pub comps: Vec<ComparableSale>,
    /// Set once the subject has been merged with an enrichment record
    #[serde(default)]
    pub enriched: bool,
}

impl SubjectProperty {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            attributes: PropertyAttributes::default(),
            comps: Vec::new(),
            enriched: false,
        }
    }

    pub fn with_attributes(mut self, attributes: PropertyAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_comps(mut self, comps: Vec<ComparableSale>) -> Self {
        self.comps = comps;
        self
    }
}

/// A sold property used as a pricing reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparableSale {
    #[serde(default)]
    pub address: String,
    #[serde(flatten)]
    pub attributes: PropertyAttributes,
    #[serde(rename = "lastSaleAmount", default)]
    pub last_sale_amount: Option<f64>,
    #[serde(rename = "lastSaleDate", default)]
    pub last_sale_date: Option<NaiveDate>,
}

impl ComparableSale {
    /// Sale price divided by living area
    ///
    /// `None` when the sale amount is unknown or the living area is unknown
    /// or not positive. A known zero sale stays a zero PPSF.
    #[inline]
    pub fn price_per_square_foot(&self) -> Option<f64> {
        match (self.last_sale_amount, self.attributes.living_square_feet) {
            (Some(amount), Some(sqft)) if sqft > 0.0 => Some(amount / sqft),
            _ => None,
        }
    }
}

/// Tunable parameters for the trimmed top-slice estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorParams {
    /// Share of the highest PPSF values discarded as outliers
    pub outlier_fraction: f64,
    /// Share of the remaining values (from the top) that are averaged
    pub top_fraction: f64,
    /// Half-width of the ARV band relative to the point estimate
    pub band_fraction: f64,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            outlier_fraction: 0.15,
            top_fraction: 0.30,
            band_fraction: 0.10,
        }
    }
}

/// Output of the PPSF estimator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PpsfEstimate {
    pub low: f64,
    pub high: f64,
    #[serde(rename = "avgPpsf")]
    pub avg_ppsf: f64,
    #[serde(rename = "pointEstimate")]
    pub point_estimate: f64,
    /// Number of PPSF values actually averaged; 0 flags a degenerate estimate
    #[serde(rename = "compsUsed")]
    pub comps_used: usize,
    /// Number of comps with a positive living area
    #[serde(rename = "compsEligible")]
    pub comps_eligible: usize,
}

/// Flattened per-comp block of a valuation result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompMetrics {
    pub address: String,
    pub bedrooms: u32,
    pub bathrooms: f64,
    #[serde(rename = "yearBuilt")]
    pub year_built: i32,
    #[serde(rename = "livingSquareFeet")]
    pub living_square_feet: f64,
    #[serde(rename = "lotSquareFeet")]
    pub lot_square_feet: f64,
    #[serde(rename = "lastSaleAmount")]
    pub last_sale_amount: f64,
    #[serde(rename = "lastSaleDate")]
    pub last_sale_date: Option<NaiveDate>,
    pub ppsf: f64,
    /// 0 means the distance is unknown, not that the comp is co-located
    #[serde(rename = "distanceMiles")]
    pub distance_miles: f64,
}

/// One output record per valued subject
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub address: String,
    #[serde(rename = "normalizedAddress")]
    pub normalized_address: String,
    pub bedrooms: u32,
    pub bathrooms: f64,
    #[serde(rename = "yearBuilt")]
    pub year_built: i32,
    #[serde(rename = "livingSquareFeet")]
    pub living_square_feet: f64,
    #[serde(rename = "lotSquareFeet")]
    pub lot_square_feet: f64,
    #[serde(rename = "lotAcres")]
    pub lot_acres: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "enrichmentMatched")]
    pub enrichment_matched: bool,
    #[serde(rename = "estimatedArvLow")]
    pub estimated_arv_low: f64,
    #[serde(rename = "estimatedArvHigh")]
    pub estimated_arv_high: f64,
    #[serde(rename = "averagePricePerSquareFoot")]
    pub average_price_per_square_foot: f64,
    #[serde(rename = "numberOfComps")]
    pub number_of_comps: usize,
    pub comps: Vec<CompMetrics>,
}

/// A single cell of a flattened result row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlatValue {
    Text(String),
    Number(f64),
    Count(u64),
    Flag(bool),
    Empty,
}

/// Column-ordered table of flattened results, ready for a CSV/sheet writer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<FlatValue>>,
}
