use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::domain::MatchedListing;

/// Response for the "today's matches" query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayMatchesResponse {
    pub date: NaiveDate,
    pub matches: Vec<MatchedListing>,
}

/// Summary of a completed batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummaryResponse {
    pub date: NaiveDate,
    pub renters: usize,
    pub matches_written: usize,
    pub superseded: u64,
}

/// Outcome of a message-send event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecordedResponse {
    pub counted: bool,
    pub count: Option<u32>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl ToString, status_code: u16) -> Self {
        Self {
            error: error.into(),
            message: message.to_string(),
            status_code,
        }
    }
}
