use std::collections::{HashMap, HashSet};

use crate::core::address::normalize_address;
use crate::ingest::{self, CoercionWarning};
use crate::models::{PropertyAttributes, SubjectProperty};

/// Read-only lookup from normalized address to property-detail fields
///
/// Built once per batch and shared immutably across subject tasks.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentIndex {
    entries: HashMap<String, PropertyAttributes>,
    warnings: Vec<CoercionWarning>,
}

impl EnrichmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from raw property-detail records
    ///
    /// Records are flattened into dotted keys and mapped to canonical
    /// fields. The first record per normalized address wins; records
    /// without an address are skipped.
    pub fn from_records(records: &[serde_json::Value]) -> Self {
        let mut index = Self::new();

        for (position, record) in records.iter().enumerate() {
            let flat = ingest::flatten(record);
            let Some(address) = ingest::resolve_address(&flat) else {
                tracing::warn!("Enrichment record {} has no address label, skipping", position);
                continue;
            };

            let mut warnings = Vec::new();
            let details = ingest::map_attributes(&flat, &mut warnings);
            index.warnings.extend(warnings);
            index.insert(&address, details);
        }

        tracing::info!(
            "Enrichment index built: {} entries from {} records",
            index.len(),
            records.len()
        );

        index
    }

    /// Insert a record under the normalized form of `address`
    ///
    /// Returns false (and keeps the existing entry) on a duplicate key.
    pub fn insert(&mut self, address: &str, details: PropertyAttributes) -> bool {
        let key = normalize_address(address);
        if self.entries.contains_key(&key) {
            tracing::debug!("Duplicate enrichment entry for '{}', keeping first", key);
            return false;
        }
        self.entries.insert(key, details);
        true
    }

    pub fn get(&self, normalized_address: &str) -> Option<&PropertyAttributes> {
        self.entries.get(normalized_address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Coercion warnings raised while building the index
    pub fn warnings(&self) -> &[CoercionWarning] {
        &self.warnings
    }

    /// Keys never looked up successfully during a run
    pub fn unused_keys<'a>(&'a self, matched: &HashSet<String>) -> Vec<&'a str> {
        let mut unused: Vec<&str> = self
            .entries
            .keys()
            .filter(|key| !matched.contains(*key))
            .map(String::as_str)
            .collect();
        unused.sort_unstable();
        unused
    }
}

/// Result of merging a subject with the enrichment index
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichOutcome {
    pub subject: SubjectProperty,
    pub normalized_address: String,
    pub matched: bool,
    /// Canonical names of the fields filled from the index
    pub fields_filled: Vec<&'static str>,
}

/// Fill absent subject fields from the enrichment record at the subject's
/// normalized address
///
/// Present values are never overwritten, including zeros. The input is not
/// mutated, so the call is safe to retry. A subject that was already
/// enriched passes through unchanged.
pub fn enrich_subject(subject: &SubjectProperty, index: &EnrichmentIndex) -> EnrichOutcome {
    let normalized_address = normalize_address(&subject.address);
    let mut enriched = subject.clone();

    if subject.enriched {
        tracing::debug!("Subject '{}' already enriched, skipping", subject.address);
        return EnrichOutcome {
            subject: enriched,
            matched: index.get(&normalized_address).is_some(),
            normalized_address,
            fields_filled: Vec::new(),
        };
    }

    let Some(details) = index.get(&normalized_address) else {
        tracing::debug!("No enrichment entry for '{}'", normalized_address);
        return EnrichOutcome {
            subject: enriched,
            normalized_address,
            matched: false,
            fields_filled: Vec::new(),
        };
    };

    let target = &mut enriched.attributes;
    let mut fields_filled = Vec::new();

    fill(&mut target.bedrooms, details.bedrooms, "bedrooms", &mut fields_filled);
    fill(&mut target.bathrooms, details.bathrooms, "bathrooms", &mut fields_filled);
    fill(
        &mut target.living_square_feet,
        details.living_square_feet,
        "livingSquareFeet",
        &mut fields_filled,
    );
    fill(&mut target.year_built, details.year_built, "yearBuilt", &mut fields_filled);
    fill(
        &mut target.lot_square_feet,
        details.lot_square_feet,
        "lotSquareFeet",
        &mut fields_filled,
    );
    fill(&mut target.lot_acres, details.lot_acres, "lotAcres", &mut fields_filled);

    enriched.enriched = true;

    tracing::debug!(
        "Enriched '{}' with {} fields: {:?}",
        normalized_address,
        fields_filled.len(),
        fields_filled
    );

    EnrichOutcome {
        subject: enriched,
        normalized_address,
        matched: true,
        fields_filled,
    }
}

#[inline]
fn fill<T: Copy>(
    slot: &mut Option<T>,
    candidate: Option<T>,
    name: &'static str,
    filled: &mut Vec<&'static str>,
) {
    if slot.is_none() {
        if let Some(value) = candidate {
            *slot = Some(value);
            filled.push(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details() -> PropertyAttributes {
        PropertyAttributes {
            bedrooms: Some(3),
            bathrooms: Some(2.0),
            year_built: Some(1978),
            living_square_feet: Some(1450.0),
            lot_square_feet: Some(7500.0),
            lot_acres: Some(0.17),
            latitude: Some(1.0),
            longitude: Some(1.0),
        }
    }

    #[test]
    fn test_fills_absent_fields() {
        let mut index = EnrichmentIndex::new();
        index.insert("123 Main Street, Miami, Florida", details());

        let subject = SubjectProperty::new("123 main st, miami, fl");
        let outcome = enrich_subject(&subject, &index);

        assert!(outcome.matched);
        assert!(outcome.subject.enriched);
        assert_eq!(outcome.subject.attributes.bedrooms, Some(3));
        assert_eq!(outcome.subject.attributes.living_square_feet, Some(1450.0));
        assert_eq!(outcome.fields_filled.len(), 6);
        // coordinates are not part of the enrichment field set
        assert_eq!(outcome.subject.attributes.latitude, None);
        // input untouched
        assert!(!subject.enriched);
        assert_eq!(subject.attributes.bedrooms, None);
    }

    #[test]
    fn test_present_zero_is_kept() {
        let mut index = EnrichmentIndex::new();
        index.insert("9 Bay Rd", details());

        let subject = SubjectProperty::new("9 Bay Rd").with_attributes(PropertyAttributes {
            bedrooms: Some(0),
            ..Default::default()
        });
        let outcome = enrich_subject(&subject, &index);

        assert_eq!(outcome.subject.attributes.bedrooms, Some(0));
        assert!(!outcome.fields_filled.contains(&"bedrooms"));
        assert!(outcome.fields_filled.contains(&"bathrooms"));
    }

    #[test]
    fn test_unmatched_passes_through() {
        let index = EnrichmentIndex::new();
        let subject = SubjectProperty::new("1 Nowhere Ln");
        let outcome = enrich_subject(&subject, &index);

        assert!(!outcome.matched);
        assert_eq!(outcome.normalized_address, "1 nowhere lane");
        assert_eq!(outcome.subject, subject);
    }

    #[test]
    fn test_enriches_only_once() {
        let mut index = EnrichmentIndex::new();
        index.insert("5 Elm Ct", details());

        let mut subject = SubjectProperty::new("5 Elm Ct");
        subject.enriched = true;
        let outcome = enrich_subject(&subject, &index);

        assert!(outcome.fields_filled.is_empty());
        assert_eq!(outcome.subject.attributes.bedrooms, None);
    }

    #[test]
    fn test_index_from_dotted_records() {
        let records = vec![
            json!({
                "data": {
                    "propertyInfo": {
                        "address": { "label": "10 Palm Ave, Tampa, FL 33602" },
                        "bedrooms": "4",
                        "bathrooms": 2.5,
                        "livingSquareFeet": "2,100",
                        "yearBuilt": 1999
                    },
                    "lotInfo": { "lotSquareFeet": 8000, "lotAcres": "unknown" }
                }
            }),
            json!({ "data": { "propertyInfo": { "bedrooms": 2 } } }),
            json!({
                "data": {
                    "propertyInfo": {
                        "address": { "label": "10 palm avenue, tampa, florida 33602" },
                        "bedrooms": 9
                    }
                }
            }),
        ];

        let index = EnrichmentIndex::from_records(&records);
        assert_eq!(index.len(), 1);

        let entry = index
            .get("10 palm avenue, tampa, florida 33602")
            .expect("entry present");
        assert_eq!(entry.bedrooms, Some(4));
        assert_eq!(entry.living_square_feet, Some(2100.0));
        assert_eq!(entry.lot_acres, None);
        assert!(index.warnings().is_empty());
    }

    #[test]
    fn test_unused_keys() {
        let mut index = EnrichmentIndex::new();
        index.insert("1 A St", details());
        index.insert("2 B St", details());

        let matched: HashSet<String> = ["1 a street".to_string()].into_iter().collect();
        assert_eq!(index.unused_keys(&matched), vec!["2 b street"]);
    }
}
