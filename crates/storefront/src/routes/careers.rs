//! Job applications from the careers page.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use dukaan_core::{Email, JobApplication};

use crate::db::JobApplicationRepository;
use crate::db::careers::NewJobApplication;
use crate::error::{AppError, Result};
use crate::state::AppState;

const MAX_FIELD_LEN: usize = 200;
/// Longest accepted cover letter.
pub const MAX_COVER_LETTER_LEN: usize = 5000;

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationRequest {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub position: String,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
}

fn required(value: &str, field: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(AppError::BadRequest(format!(
            "{field} must be at most {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(value.to_string())
}

impl ApplicationRequest {
    /// Trim and validate into an insertable application.
    ///
    /// # Errors
    ///
    /// `BadRequest` naming the first invalid field.
    pub fn validate(self) -> Result<NewJobApplication> {
        let full_name = required(&self.full_name, "full_name")?;
        let email = Email::parse(&self.email)
            .map_err(|e| AppError::BadRequest(format!("email: {e}")))?;
        let phone = required(&self.phone, "phone")?;
        let position = required(&self.position, "position")?;

        let cover_letter = self
            .cover_letter
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if cover_letter
            .as_ref()
            .is_some_and(|c| c.chars().count() > MAX_COVER_LETTER_LEN)
        {
            return Err(AppError::BadRequest(format!(
                "cover_letter must be at most {MAX_COVER_LETTER_LEN} characters"
            )));
        }

        let resume_url = self
            .resume_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        if let Some(raw) = &resume_url {
            let parsed = Url::parse(raw)
                .map_err(|_| AppError::BadRequest("resume_url must be a valid URL".to_string()))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::BadRequest(
                    "resume_url must use http or https".to_string(),
                ));
            }
        }

        Ok(NewJobApplication {
            full_name,
            email,
            phone,
            position,
            cover_letter,
            resume_url,
        })
    }
}

/// `POST /api/careers/applications`
#[instrument(skip_all, fields(position = %req.position))]
pub async fn apply(
    State(state): State<AppState>,
    Json(req): Json<ApplicationRequest>,
) -> Result<(StatusCode, Json<JobApplication>)> {
    let application = req.validate()?;
    let stored = JobApplicationRepository::new(state.pool())
        .create(&application)
        .await?;

    tracing::info!(application_id = %stored.id, "Job application received");
    Ok((StatusCode::CREATED, Json(stored)))
}
