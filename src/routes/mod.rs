// Route exports
pub mod engagement;
pub mod matches;
pub mod preferences;

use actix_web::web;
use std::sync::Arc;

use crate::core::{DailyMatchJob, EngagementTracker};
use crate::services::{EngagementStore, ProfileStore, RunLock};

/// Application state shared across all handlers
pub struct AppState<S> {
    pub store: Arc<S>,
    pub job: DailyMatchJob,
    pub engagement: EngagementTracker<S>,
    pub run_lock: Option<RunLock>,
}

impl<S: EngagementStore> AppState<S> {
    pub fn new(
        store: Arc<S>,
        job: DailyMatchJob,
        engagement: crate::core::EngagementThresholds,
        run_lock: Option<RunLock>,
    ) -> Self {
        Self {
            engagement: EngagementTracker::new(Arc::clone(&store), engagement),
            store,
            job,
            run_lock,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            job: self.job.clone(),
            engagement: self.engagement.clone(),
            run_lock: self.run_lock.clone(),
        }
    }
}

pub fn configure_routes<S>(cfg: &mut web::ServiceConfig)
where
    S: ProfileStore + EngagementStore + 'static,
{
    cfg.service(
        web::scope("/api/v1")
            .configure(matches::configure::<S>)
            .configure(preferences::configure::<S>)
            .configure(engagement::configure::<S>),
    );
}
