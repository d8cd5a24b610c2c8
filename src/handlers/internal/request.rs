//! Internal request DTOs

use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::JudgeResult,
};

/// Verdict callback sent by the execution service
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeCallbackRequest {
    pub submission_id: Option<Uuid>,
    pub result: Option<JudgeResult>,
}

impl JudgeCallbackRequest {
    pub fn into_parts(self) -> AppResult<(Uuid, JudgeResult)> {
        let submission_id = self
            .submission_id
            .ok_or_else(|| AppError::Validation("submissionId is required".to_string()))?;
        let result = self
            .result
            .ok_or_else(|| AppError::Validation("result is required".to_string()))?;
        Ok((submission_id, result))
    }
}

/// Dead-letter listing query
#[derive(Debug, Deserialize)]
pub struct DeadLetterQuery {
    /// `YYYY-MM-DD`, today when absent
    pub day: Option<String>,
}
