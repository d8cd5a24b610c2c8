//! Internal response DTOs

use serde::Serialize;
use uuid::Uuid;

use crate::models::DeadLetterRecord;

/// Acknowledgement of a queued verdict
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackAccepted {
    pub submission_id: Uuid,
    pub status: &'static str,
}

/// Dead letters of one bucket
#[derive(Debug, Serialize)]
pub struct DeadLettersResponse {
    pub day: Option<String>,
    pub total: usize,
    pub records: Vec<DeadLetterRecord>,
}
