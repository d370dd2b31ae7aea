use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::models::{ErrorResponse, LandlordPreferencesRequest, RenterPreferencesRequest, UserId};
use crate::routes::AppState;
use crate::services::{EngagementStore, ProfileStore};

/// Configure preference-update routes
pub fn configure<S>(cfg: &mut web::ServiceConfig)
where
    S: ProfileStore + EngagementStore + 'static,
{
    cfg.route("/preferences/renter/{id}", web::put().to(update_renter::<S>))
        .route("/preferences/landlord/{id}", web::put().to(update_landlord::<S>));
}

/// Replace a renter's preferences (one profile per renter)
///
/// PUT /api/v1/preferences/renter/{id}
async fn update_renter<S: ProfileStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<UserId>,
    req: web::Json<RenterPreferencesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Validation failed", errors, 400));
    }

    let renter_id = path.into_inner();
    if req.budget_max > 0 && req.budget_min > req.budget_max {
        return HttpResponse::BadRequest().json(ErrorResponse::new(
            "Validation failed",
            "budgetMin must not exceed budgetMax",
            400,
        ));
    }

    let profile = req.into_inner().into_profile(renter_id);
    match state.store.upsert_renter_profile(&profile).await {
        Ok(()) => {
            tracing::info!("Updated preferences for renter {}", renter_id);
            HttpResponse::Ok().json(profile)
        }
        Err(e) => {
            tracing::error!("Failed to store preferences for renter {}: {}", renter_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Failed to store preferences", e, 500))
        }
    }
}

/// Replace a landlord's tenant policies
///
/// PUT /api/v1/preferences/landlord/{id}
async fn update_landlord<S: ProfileStore>(
    state: web::Data<AppState<S>>,
    path: web::Path<UserId>,
    req: web::Json<LandlordPreferencesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return HttpResponse::BadRequest().json(ErrorResponse::new("Validation failed", errors, 400));
    }

    let landlord_id = path.into_inner();
    let profile = req.into_inner().into_profile(landlord_id);
    match state.store.upsert_landlord_profile(&profile).await {
        Ok(()) => {
            tracing::info!("Updated policies for landlord {}", landlord_id);
            HttpResponse::Ok().json(profile)
        }
        Err(e) => {
            tracing::error!("Failed to store policies for landlord {}: {}", landlord_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new("Failed to store preferences", e, 500))
        }
    }
}
