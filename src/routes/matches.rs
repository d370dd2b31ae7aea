use actix_web::{http::header, web, HttpRequest, HttpResponse, Responder};
use chrono::{NaiveDate, Utc};
use validator::Validate;

use crate::core::BatchError;
use crate::models::{
    ErrorResponse, HealthResponse, RunMatchesRequest, RunSummaryResponse, TodayMatchesQuery,
    TodayMatchesResponse,
};
use crate::routes::AppState;
use crate::services::{EngagementStore, ProfileStore, RunLockError};

/// Configure all match-related routes
pub fn configure<S>(cfg: &mut web::ServiceConfig)
where
    S: ProfileStore + EngagementStore + 'static,
{
    cfg.route("/health", web::get().to(health_check::<S>))
        .route("/matches/today", web::get().to(today_matches::<S>))
        .route("/matches/run", web::post().to(run_matches::<S>));
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// No body at all: no Content-Length (or zero) and not chunked
fn body_is_empty(req: &HttpRequest) -> bool {
    let headers = req.headers();
    if headers.contains_key(header::TRANSFER_ENCODING) {
        return false;
    }
    match headers.get(header::CONTENT_LENGTH) {
        None => true,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            == Some(0),
    }
}

/// Health check endpoint
async fn health_check<S: ProfileStore>(state: web::Data<AppState<S>>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Today's matches for a renter
///
/// GET /api/v1/matches/today?renterId={renterId}[&date=YYYY-MM-DD]
async fn today_matches<S: ProfileStore>(
    state: web::Data<AppState<S>>,
    query: web::Query<TodayMatchesQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Validation failed", errors, 400));
    }

    let date = query.date.unwrap_or_else(today);

    match state.store.matched_listings(query.renter_id, date).await {
        Ok(matches) => {
            tracing::debug!(
                "Returning {} matches for renter {} on {}",
                matches.len(),
                query.renter_id,
                date
            );
            HttpResponse::Ok().json(TodayMatchesResponse { date, matches })
        }
        Err(e) => {
            tracing::error!("Failed to fetch matches for {}: {}", query.renter_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Failed to fetch matches", e, 500))
        }
    }
}

/// Scheduler trigger for the daily match batch
///
/// POST /api/v1/matches/run
///
/// Request body (optional; an empty body runs for today):
/// ```json
/// { "date": "2024-08-01" }
/// ```
async fn run_matches<S: ProfileStore>(
    state: web::Data<AppState<S>>,
    http_req: HttpRequest,
    req: Result<web::Json<RunMatchesRequest>, actix_web::Error>,
) -> impl Responder {
    let date = match req {
        Ok(req) => req.date.unwrap_or_else(today),
        Err(_) if body_is_empty(&http_req) => today(),
        Err(e) => {
            tracing::info!("Rejected batch trigger payload: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse::new("invalid_json", e, 400));
        }
    };

    let guard = match &state.run_lock {
        Some(lock) => match lock.try_acquire(date).await {
            Ok(guard) => Some(guard),
            Err(RunLockError::AlreadyHeld(_)) => {
                return HttpResponse::Conflict().json(ErrorResponse::new(
                    "Run in progress",
                    format!("A batch run for {} is already in progress", date),
                    409,
                ));
            }
            Err(e) => {
                tracing::error!("Failed to acquire run lock for {}: {}", date, e);
                return HttpResponse::ServiceUnavailable()
                    .json(ErrorResponse::new("Run lock unavailable", e, 503));
            }
        },
        None => None,
    };

    let result = state.job.run(state.store.as_ref(), date).await;

    if let (Some(lock), Some(guard)) = (&state.run_lock, guard) {
        if let Err(e) = lock.release(guard).await {
            tracing::warn!("Failed to release run lock for {}: {}", date, e);
        }
    }

    match result {
        Ok(summary) => HttpResponse::Ok().json(RunSummaryResponse {
            date: summary.run_date,
            renters: summary.renters,
            matches_written: summary.matches_written,
            superseded: summary.superseded,
        }),
        Err(e) => {
            let completed = e.renters_completed();
            tracing::error!("Batch run for {} failed after {} renters: {}", date, completed, e);
            let error = match e {
                BatchError::Load(_) => "Failed to load profiles",
                BatchError::Store { .. } => "Batch run incomplete",
                BatchError::Worker(_) => "Scoring failed",
            };
            HttpResponse::InternalServerError().json(ErrorResponse::new(error, e, 500))
        }
    }
}
