use axum::extract::State;
use axum::http::StatusCode;
use axum::{Form, Json};
use serde::Serialize;

use crate::validate::{self, AddUsageForm};

use super::{AppState, SessionUser};

#[derive(Debug, Serialize)]
pub struct AddOutcome {
    pub success: bool,
    pub message: String,
}

/// Record one reading. Validation failures carry the specific reason;
/// a store failure returns a generic message and keeps the detail in the log.
pub async fn add_usage(
    State(state): State<AppState>,
    user: SessionUser,
    Form(form): Form<AddUsageForm>,
) -> (StatusCode, Json<AddOutcome>) {
    metrics::counter!("usage_ingest_requests_total").increment(1);

    let record = match validate::validate_submission(user.0, &form) {
        Ok(record) => record,
        Err(e) => {
            metrics::counter!("usage_ingest_rejected_total").increment(1);
            return (
                StatusCode::BAD_REQUEST,
                Json(AddOutcome {
                    success: false,
                    message: e.to_string(),
                }),
            );
        }
    };

    match state.queries.insert_record(&record).await {
        Ok(id) => {
            tracing::info!(
                id,
                user_id = user.0,
                usage_type = %record.usage_type,
                "usage reading recorded"
            );
            (
                StatusCode::OK,
                Json(AddOutcome {
                    success: true,
                    message: "reading recorded".to_string(),
                }),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = user.0, "failed to insert usage record");
            metrics::counter!("usage_ingest_failed_total").increment(1);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AddOutcome {
                    success: false,
                    message: "unable to save the reading, please try again".to_string(),
                }),
            )
        }
    }
}
