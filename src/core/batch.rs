use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

use crate::core::{
    builder::build_valuation,
    distance::is_unknown_pair,
    enrich::{enrich_subject, EnrichmentIndex},
    ppsf::estimate_arv,
};
use crate::ingest::{self, IngestError};
use crate::models::{CompsFeedEntry, EstimatorParams, SubjectProperty, ValuationResult};

/// Errors that remove a single subject from a batch
#[derive(Debug, Error)]
pub enum ValuationError {
    #[error("Subject has no address")]
    MissingAddress,

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Valuation timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("Valuation task panicked: {0}")]
    Panicked(String),

    #[error("Valuation task was cancelled")]
    Cancelled,
}

/// Batch execution options
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub params: EstimatorParams,
    /// Maximum number of subjects valued concurrently
    pub max_concurrency: usize,
    /// Per-subject time limit; `None` disables it
    pub subject_timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            params: EstimatorParams::default(),
            max_concurrency: 4,
            subject_timeout: None,
        }
    }
}

/// A subject dropped from the output
#[derive(Debug, Clone, Serialize)]
pub struct SubjectFailure {
    pub address: String,
    pub reason: String,
}

/// Counters reported at the end of a batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "subjectsTotal")]
    pub subjects_total: usize,
    #[serde(rename = "subjectsProcessed")]
    pub subjects_processed: usize,
    #[serde(rename = "enrichmentUnmatched")]
    pub enrichment_unmatched: usize,
    #[serde(rename = "unmatchedAddresses")]
    pub unmatched_addresses: Vec<String>,
    #[serde(rename = "subjectsFailed")]
    pub subjects_failed: usize,
    pub failures: Vec<SubjectFailure>,
    #[serde(rename = "coercionWarnings")]
    pub coercion_warnings: usize,
    /// Results whose estimate averaged zero comps
    #[serde(rename = "lowConfidence")]
    pub low_confidence: usize,
    #[serde(rename = "unusedEnrichmentEntries")]
    pub unused_enrichment_entries: usize,
}

/// Results of a batch, in input order, plus its summary
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<ValuationResult>,
    pub summary: BatchSummary,
}

/// Valuation of one subject before it is folded into the batch report
#[derive(Debug, Clone)]
pub struct SubjectValuation {
    pub result: ValuationResult,
    pub normalized_address: String,
    pub matched: bool,
}

/// Run the full pipeline for one subject
///
/// Enrichment, per-comp distance, PPSF estimate and record assembly.
pub fn valuate_subject(
    subject: &SubjectProperty,
    index: &EnrichmentIndex,
    params: &EstimatorParams,
) -> Result<SubjectValuation, ValuationError> {
    if subject.address.trim().is_empty() {
        return Err(ValuationError::MissingAddress);
    }
    warn_on_unusable_location(subject);

    let outcome = enrich_subject(subject, index);
    let estimate = estimate_arv(
        &outcome.subject.comps,
        outcome.subject.attributes.living_square_feet,
        params,
    );

    if estimate.comps_used == 0 {
        tracing::debug!(
            "No usable comps for '{}' ({} retrieved, {} with square footage)",
            subject.address,
            subject.comps.len(),
            estimate.comps_eligible
        );
    }

    let result = build_valuation(
        &outcome.subject,
        &outcome.normalized_address,
        outcome.matched,
        &estimate,
    );

    Ok(SubjectValuation {
        result,
        normalized_address: outcome.normalized_address,
        matched: outcome.matched,
    })
}

/// Out-of-range subject coordinates only blank the comp distances
fn warn_on_unusable_location(subject: &SubjectProperty) {
    if let (Some(lat), Some(lon)) = (subject.attributes.latitude, subject.attributes.longitude) {
        if is_unknown_pair(lat, lon) && !(lat == 0.0 && lon == 0.0) {
            tracing::warn!(
                "Subject '{}' has unusable coordinates ({}, {}); comp distances reported as 0",
                subject.address,
                lat,
                lon
            );
        }
    }
}

type TaskOutcome = (usize, Result<SubjectValuation, ValuationError>);

/// Per-subject pipeline run on the blocking pool
type ValuateFn =
    fn(&SubjectProperty, &EnrichmentIndex, &EstimatorParams) -> Result<SubjectValuation, ValuationError>;

/// Orchestrates valuation across many subjects with bounded parallelism
///
/// Each subject runs on the blocking pool behind a semaphore. A failing
/// subject is logged with its address and omitted; it never aborts the
/// batch.
#[derive(Debug, Clone, Default)]
pub struct BatchProcessor {
    options: BatchOptions,
}

impl BatchProcessor {
    pub fn new(options: BatchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    /// Value already-typed subjects
    pub async fn process_all(
        &self,
        subjects: Vec<SubjectProperty>,
        index: Arc<EnrichmentIndex>,
    ) -> BatchReport {
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut summary = BatchSummary {
            run_id,
            subjects_total: subjects.len(),
            coercion_warnings: index.warnings().len(),
            ..Default::default()
        };
        let results = self.run(subjects, &index, &mut summary, valuate_subject).await;
        finish(results, summary)
    }

    /// Ingest raw comps-feed entries, then value them
    ///
    /// Entries that fail ingestion count as failed subjects.
    pub async fn process_feed(
        &self,
        entries: &[CompsFeedEntry],
        index: Arc<EnrichmentIndex>,
    ) -> BatchReport {
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut summary = BatchSummary {
            run_id,
            subjects_total: entries.len(),
            coercion_warnings: index.warnings().len(),
            ..Default::default()
        };

        let mut subjects = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            match ingest::ingest_entry(entry) {
                Ok(ingested) => {
                    summary.coercion_warnings += ingested.warnings.len();
                    subjects.push(ingested.subject);
                }
                Err(e) => {
                    let address = format!("<entry {}>", position);
                    tracing::warn!("Skipping feed entry {}: {}", position, e);
                    record_failure(&mut summary, address, &ValuationError::from(e));
                }
            }
        }

        let results = self.run(subjects, &index, &mut summary, valuate_subject).await;
        finish(results, summary)
    }

    async fn run(
        &self,
        subjects: Vec<SubjectProperty>,
        index: &Arc<EnrichmentIndex>,
        summary: &mut BatchSummary,
        work_fn: ValuateFn,
    ) -> Vec<ValuationResult> {
        tracing::info!(
            "Batch {}: valuing {} subjects (concurrency {})",
            summary.run_id,
            subjects.len(),
            self.options.max_concurrency.max(1)
        );

        let count = subjects.len();
        let addresses: Vec<String> = subjects.iter().map(|s| s.address.clone()).collect();
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();

        for (position, subject) in subjects.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let index = Arc::clone(index);
            let params = self.options.params;
            let limit = self.options.subject_timeout;

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let work = tokio::task::spawn_blocking(move || work_fn(&subject, &index, &params));

                let outcome = match limit {
                    Some(limit) => match tokio::time::timeout(limit, work).await {
                        Ok(joined) => flatten_join(joined),
                        Err(_) => Err(ValuationError::Timeout {
                            millis: limit.as_millis() as u64,
                        }),
                    },
                    None => flatten_join(work.await),
                };

                (position, outcome)
            });
        }

        let mut slots: Vec<Option<SubjectValuation>> = vec![None; count];
        let mut settled = vec![false; count];
        let mut lost_tasks = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, outcome)) => {
                    settled[position] = true;
                    match outcome {
                        Ok(valuation) => slots[position] = Some(valuation),
                        Err(e) => {
                            tracing::warn!("Valuation failed for '{}': {}", addresses[position], e);
                            record_failure(summary, addresses[position].clone(), &e);
                        }
                    }
                }
                Err(e) => lost_tasks.push(join_failure(e)),
            }
        }

        // A task that died outside the pipeline never reported its position;
        // every unsettled subject is one of them.
        let unsettled = settled.iter().enumerate().filter(|(_, done)| !**done).map(|(i, _)| i);
        for (position, error) in unsettled.zip(lost_tasks) {
            tracing::error!("Subject task for '{}' failed outside the pipeline: {}", addresses[position], error);
            record_failure(summary, addresses[position].clone(), &error);
        }

        let mut matched_keys = HashSet::new();
        let mut results = Vec::with_capacity(count);
        for valuation in slots.into_iter().flatten() {
            if valuation.matched {
                matched_keys.insert(valuation.normalized_address);
            } else {
                summary.enrichment_unmatched += 1;
                summary.unmatched_addresses.push(valuation.result.address.clone());
            }
            results.push(valuation.result);
        }

        let unused = index.unused_keys(&matched_keys);
        summary.unused_enrichment_entries = unused.len();
        if !unused.is_empty() {
            tracing::info!("{} enrichment entries were not matched to any subject", unused.len());
            tracing::debug!("Unused enrichment entries: {:?}", unused);
        }
        for address in &summary.unmatched_addresses {
            tracing::warn!("No enrichment match for '{}'", address);
        }

        results
    }
}

fn finish(results: Vec<ValuationResult>, mut summary: BatchSummary) -> BatchReport {
    summary.subjects_processed = results.len();
    summary.low_confidence = results.iter().filter(|r| r.number_of_comps == 0).count();

    tracing::info!(
        "Batch {} complete: {} processed, {} unmatched, {} failed, {} coercion warnings",
        summary.run_id,
        summary.subjects_processed,
        summary.enrichment_unmatched,
        summary.subjects_failed,
        summary.coercion_warnings
    );

    BatchReport { results, summary }
}

fn record_failure(summary: &mut BatchSummary, address: String, error: &ValuationError) {
    summary.subjects_failed += 1;
    summary.failures.push(SubjectFailure {
        address,
        reason: error.to_string(),
    });
}

fn flatten_join<T>(
    joined: Result<Result<T, ValuationError>, JoinError>,
) -> Result<T, ValuationError> {
    joined.unwrap_or_else(|e| Err(join_failure(e)))
}

fn join_failure(e: JoinError) -> ValuationError {
    if e.is_panic() {
        ValuationError::Panicked(panic_message(e.into_panic()))
    } else {
        ValuationError::Cancelled
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Value a batch of subjects against an enrichment index
pub async fn valuate(
    subjects: Vec<SubjectProperty>,
    index: Arc<EnrichmentIndex>,
    options: BatchOptions,
) -> BatchReport {
    BatchProcessor::new(options).process_all(subjects, index).await
}
