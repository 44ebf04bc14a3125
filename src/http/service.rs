//! Contact form and health handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::error::ApiError;
use super::AppState;
use crate::ratelimit::Clock;

const MAX_NAME_CHARS: usize = 100;
const MAX_EMAIL_CHARS: usize = 254;
const MAX_SUBJECT_CHARS: usize = 200;
const MAX_MESSAGE_CHARS: usize = 5000;

/// A contact form submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

impl ContactRequest {
    /// Check required fields, email shape and field lengths.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::BadRequest("name is required".to_string()));
        }
        if self.message.trim().is_empty() {
            return Err(ApiError::BadRequest("message is required".to_string()));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(ApiError::BadRequest("a valid email is required".to_string()));
        }

        check_length("name", &self.name, MAX_NAME_CHARS)?;
        check_length("email", &self.email, MAX_EMAIL_CHARS)?;
        if let Some(subject) = &self.subject {
            check_length("subject", subject, MAX_SUBJECT_CHARS)?;
        }
        check_length("message", &self.message, MAX_MESSAGE_CHARS)
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Body returned for an accepted submission.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}

/// Accept a contact form submission.
///
/// Admission control runs before this handler; delivery to the mail
/// provider happens downstream of the log line.
#[instrument(skip_all)]
pub async fn contact_handler(
    Json(form): Json<ContactRequest>,
) -> Result<Json<ContactResponse>, ApiError> {
    form.validate()?;

    info!(
        name = %form.name.trim(),
        email = %form.email.trim(),
        subject = %form.subject.as_deref().unwrap_or(""),
        message_chars = form.message.chars().count(),
        "Contact form submitted"
    );

    Ok(Json(ContactResponse {
        success: true,
        message: "Thanks for reaching out! We'll get back to you soon.".to_string(),
    }))
}

/// Liveness probe.
pub async fn health_handler<C: Clock + 'static>(State(state): State<AppState<C>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "trackedIdentifiers": state.limiter.tracked_identifiers(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, message: &str) -> ContactRequest {
        ContactRequest {
            name: name.to_string(),
            email: email.to_string(),
            subject: None,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_valid_submission() {
        assert!(form("Ana", "ana@example.com", "Love the new shop").validate().is_ok());
    }

    #[test]
    fn test_blank_fields_rejected() {
        assert!(form("  ", "ana@example.com", "hi").validate().is_err());
        assert!(form("Ana", "ana@example.com", "\n").validate().is_err());
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@b"));
        assert!(is_valid_email("fan.club@golf.example"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana@"));
        assert!(!is_valid_email("ana @example.com"));
    }

    #[test]
    fn test_length_caps() {
        let long_message = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(form("Ana", "ana@example.com", &long_message).validate().is_err());

        let exact = "é".repeat(MAX_NAME_CHARS);
        assert!(form(&exact, "ana@example.com", "hi").validate().is_ok());

        let mut with_subject = form("Ana", "ana@example.com", "hi");
        with_subject.subject = Some("s".repeat(MAX_SUBJECT_CHARS + 1));
        assert!(with_subject.validate().is_err());
    }

    #[tokio::test]
    async fn test_contact_handler_accepts_valid_form() {
        let response = contact_handler(Json(form("Ana", "ana@example.com", "Hello")))
            .await
            .unwrap();

        assert!(response.0.success);
    }

    #[tokio::test]
    async fn test_contact_handler_rejects_invalid_form() {
        let result = contact_handler(Json(form("Ana", "not-an-email", "Hello"))).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
