use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{flat_table, BatchProcessor, EnrichmentIndex};
use crate::models::{ErrorResponse, HealthResponse, ResultFormat, ValuationRequest, ValuationResponse};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub processor: BatchProcessor,
    pub max_subjects: usize,
}

/// Configure all valuation-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/valuations", web::post().to(create_valuations));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Valuation endpoint
///
/// POST /api/v1/valuations
///
/// Request body:
/// ```json
/// {
///   "subjects": [{ "input": { "address": "string", ... }, "comps": [{ ... }] }],
///   "enrichment": [{ "data": { "propertyInfo": { ... } } }],
///   "format": "nested|flat"
/// }
/// ```
async fn create_valuations(
    state: web::Data<AppState>,
    req: web::Json<ValuationRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for valuation request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Validation failed".to_string(),
            message: errors.to_string(),
            status_code: 400,
        });
    }

    if req.subjects.len() > state.max_subjects {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "Too many subjects".to_string(),
            message: format!(
                "A request may contain at most {} subjects, got {}",
                state.max_subjects,
                req.subjects.len()
            ),
            status_code: 400,
        });
    }

    let request = req.into_inner();

    tracing::info!(
        "Valuing {} subjects with {} enrichment records",
        request.subjects.len(),
        request.enrichment.len()
    );

    let index = Arc::new(EnrichmentIndex::from_records(&request.enrichment));
    let report = state.processor.process_feed(&request.subjects, index).await;

    let (results, table) = match request.format {
        ResultFormat::Nested => (Some(report.results), None),
        ResultFormat::Flat => (None, Some(flat_table(&report.results))),
    };

    HttpResponse::Ok().json(ValuationResponse {
        run_id: report.summary.run_id.clone(),
        results,
        table,
        summary: report.summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BatchOptions;
    use actix_web::{test, App};
    use serde_json::json;

    fn state(max_subjects: usize) -> AppState {
        AppState {
            processor: BatchProcessor::new(BatchOptions::default()),
            max_subjects,
        }
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(10)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
    }

    #[actix_web::test]
    async fn test_rejects_empty_subjects() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(10)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/valuations")
            .set_json(json!({ "subjects": [] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_rejects_oversized_batch() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(1)))
                .configure(configure),
        )
        .await;

        let subject = json!({ "input": { "address": "1 Main St" }, "comps": [] });
        let req = test::TestRequest::post()
            .uri("/valuations")
            .set_json(json!({ "subjects": [subject.clone(), subject] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_flat_format() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(10)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/valuations")
            .set_json(json!({
                "subjects": [{
                    "input": { "address": "1 Main St", "squareFeet": 1000 },
                    "comps": [{ "address": "3 Main St", "squareFeet": 1000, "lastSaleAmount": 200000 }]
                }],
                "format": "flat"
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert!(body.get("results").is_none());
        assert_eq!(body["table"]["columns"][0], "address");
        assert_eq!(body["table"]["rows"][0][0], "1 Main St");
        assert_eq!(body["summary"]["subjectsProcessed"], 1);
    }
}
