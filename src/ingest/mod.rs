//! Parsing boundary between raw feed records and the typed valuation core.
//!
//! Feeds arrive as arbitrarily nested JSON. Records are flattened into
//! dotted keys, canonical fields are resolved from a fixed alias table and
//! every value is coerced into its typed form. Past this module, "unknown"
//! is always `None` and never a string sentinel.

pub mod coerce;
pub mod flatten;

pub use coerce::{Coerced, CoercionWarning, coerce_count, coerce_date, coerce_number, coerce_text, coerce_year};
pub use flatten::{flatten, FlatRecord};

use serde_json::Value;
use thiserror::Error;

use crate::models::{ComparableSale, CompsFeedEntry, PropertyAttributes, SubjectProperty};

/// Errors that make a feed entry unusable
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IngestError {
    #[error("Subject record has no address")]
    MissingAddress,

    #[error("Subject record is not a JSON object")]
    NotAnObject,
}

const ADDRESS_KEYS: &[&str] = &[
    "address",
    "address.address",
    "address.label",
    "propertyInfo.address.label",
    "data.propertyInfo.address.label",
];
const BEDROOM_KEYS: &[&str] = &["bedrooms", "propertyInfo.bedrooms", "data.propertyInfo.bedrooms"];
const BATHROOM_KEYS: &[&str] = &["bathrooms", "propertyInfo.bathrooms", "data.propertyInfo.bathrooms"];
const YEAR_BUILT_KEYS: &[&str] = &["yearBuilt", "propertyInfo.yearBuilt", "data.propertyInfo.yearBuilt"];
const LIVING_SQFT_KEYS: &[&str] = &[
    "livingSquareFeet",
    "squareFeet",
    "propertyInfo.livingSquareFeet",
    "data.propertyInfo.livingSquareFeet",
];
const LOT_SQFT_KEYS: &[&str] = &["lotSquareFeet", "lotInfo.lotSquareFeet", "data.lotInfo.lotSquareFeet"];
const LOT_ACRES_KEYS: &[&str] = &["lotAcres", "lotInfo.lotAcres", "data.lotInfo.lotAcres"];
const LATITUDE_KEYS: &[&str] = &["latitude", "propertyInfo.latitude", "data.propertyInfo.latitude"];
const LONGITUDE_KEYS: &[&str] = &["longitude", "propertyInfo.longitude", "data.propertyInfo.longitude"];
const SALE_AMOUNT_KEYS: &[&str] = &["lastSaleAmount", "lastSale.saleAmount", "saleInfo.lastSaleAmount"];
const SALE_DATE_KEYS: &[&str] = &["lastSaleDate", "lastSale.saleDate", "saleInfo.lastSaleDate"];

/// A subject parsed from the comps feed, with the warnings raised on the way
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedSubject {
    pub subject: SubjectProperty,
    pub warnings: Vec<CoercionWarning>,
}

/// First non-null value among `keys`
#[inline]
fn lookup<'a>(flat: &'a FlatRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| flat.get(*key))
        .find(|value| !value.is_null())
}

/// Resolve the address label of a flattened record
pub fn resolve_address(flat: &FlatRecord) -> Option<String> {
    ADDRESS_KEYS
        .iter()
        .find_map(|key| coerce_text(flat.get(*key)))
}

/// Map the physical attributes of a flattened record
pub fn map_attributes(flat: &FlatRecord, warnings: &mut Vec<CoercionWarning>) -> PropertyAttributes {
    PropertyAttributes {
        bedrooms: coerce_count(lookup(flat, BEDROOM_KEYS)).record("bedrooms", warnings),
        bathrooms: coerce_number(lookup(flat, BATHROOM_KEYS)).record("bathrooms", warnings),
        year_built: coerce_year(lookup(flat, YEAR_BUILT_KEYS)).record("yearBuilt", warnings),
        living_square_feet: coerce_number(lookup(flat, LIVING_SQFT_KEYS))
            .record("livingSquareFeet", warnings),
        lot_square_feet: coerce_number(lookup(flat, LOT_SQFT_KEYS)).record("lotSquareFeet", warnings),
        lot_acres: coerce_number(lookup(flat, LOT_ACRES_KEYS)).record("lotAcres", warnings),
        latitude: coerce_number(lookup(flat, LATITUDE_KEYS)).record("latitude", warnings),
        longitude: coerce_number(lookup(flat, LONGITUDE_KEYS)).record("longitude", warnings),
    }
}

/// Map one raw comp record
pub fn map_comp(record: &Value, warnings: &mut Vec<CoercionWarning>) -> ComparableSale {
    let flat = flatten(record);
    ComparableSale {
        address: resolve_address(&flat).unwrap_or_default(),
        attributes: map_attributes(&flat, warnings),
        last_sale_amount: coerce_number(lookup(&flat, SALE_AMOUNT_KEYS)).record("lastSaleAmount", warnings),
        last_sale_date: coerce_date(lookup(&flat, SALE_DATE_KEYS)).record("lastSaleDate", warnings),
    }
}

/// Parse a comps-feed entry into a typed subject with its comps
pub fn ingest_entry(entry: &CompsFeedEntry) -> Result<IngestedSubject, IngestError> {
    if !entry.input.is_object() {
        return Err(IngestError::NotAnObject);
    }

    let flat = flatten(&entry.input);
    let address = resolve_address(&flat).ok_or(IngestError::MissingAddress)?;

    let mut warnings = Vec::new();
    let attributes = map_attributes(&flat, &mut warnings);
    let comps = entry
        .comps
        .iter()
        .map(|comp| map_comp(comp, &mut warnings))
        .collect();

    Ok(IngestedSubject {
        subject: SubjectProperty::new(address)
            .with_attributes(attributes)
            .with_comps(comps),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ingest_comps_feed_entry() {
        let entry = CompsFeedEntry {
            input: json!({
                "address": "100 Coral Way, Miami, FL 33145",
                "bedrooms": 3,
                "bathrooms": "2",
                "squareFeet": 1600,
                "latitude": 25.75,
                "longitude": -80.21
            }),
            comps: vec![
                json!({
                    "address": { "address": "110 Coral Way" },
                    "bedrooms": 3,
                    "squareFeet": "1,500",
                    "lastSaleAmount": "450000",
                    "lastSaleDate": "2024-02-01",
                    "latitude": 25.751,
                    "longitude": -80.211
                }),
                json!({ "squareFeet": null, "lastSaleAmount": 1 }),
            ],
        };

        let ingested = ingest_entry(&entry).expect("entry ingests");
        let subject = ingested.subject;

        assert_eq!(subject.address, "100 Coral Way, Miami, FL 33145");
        assert_eq!(subject.attributes.bathrooms, Some(2.0));
        assert_eq!(subject.attributes.living_square_feet, Some(1600.0));
        assert_eq!(subject.comps.len(), 2);
        assert_eq!(subject.comps[0].address, "110 Coral Way");
        assert_eq!(subject.comps[0].attributes.living_square_feet, Some(1500.0));
        assert_eq!(subject.comps[0].last_sale_amount, Some(450_000.0));
        assert!(subject.comps[0].last_sale_date.is_some());
        assert_eq!(subject.comps[1].address, "");
        assert_eq!(subject.comps[1].attributes.living_square_feet, None);
        assert!(ingested.warnings.is_empty());
    }

    #[test]
    fn test_missing_address() {
        let entry = CompsFeedEntry {
            input: json!({ "bedrooms": 2 }),
            comps: vec![],
        };
        assert_eq!(ingest_entry(&entry), Err(IngestError::MissingAddress));

        let scalar = CompsFeedEntry {
            input: json!("1 Main St"),
            comps: vec![],
        };
        assert_eq!(ingest_entry(&scalar), Err(IngestError::NotAnObject));
    }

    #[test]
    fn test_unparseable_field_becomes_unknown_with_warning() {
        let entry = CompsFeedEntry {
            input: json!({ "address": "7 Pine Dr", "livingSquareFeet": "big" }),
            comps: vec![],
        };

        let ingested = ingest_entry(&entry).expect("entry ingests");
        assert_eq!(ingested.subject.attributes.living_square_feet, None);
        assert_eq!(ingested.warnings.len(), 1);
        assert_eq!(ingested.warnings[0].field, "livingSquareFeet");
    }

    #[test]
    fn test_alias_precedence() {
        let flat = flatten(&json!({
            "livingSquareFeet": null,
            "squareFeet": 1200
        }));
        let mut warnings = Vec::new();
        let attributes = map_attributes(&flat, &mut warnings);
        assert_eq!(attributes.living_square_feet, Some(1200.0));
    }
}
