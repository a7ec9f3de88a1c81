//! Public lead capture from ficha share links.
//!
//! Visitors opening a shared ficha submit their contact data to unlock the
//! full sheet; the submission lands here. Contact data is validated before
//! storage, and a short-TTL cache keeps double submits from creating
//! duplicate leads.

use crate::db_storage::PortfolioStorage;
use crate::errors::AppError;
use crate::ficha::resolve_share_token;
use crate::handlers::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Public lead submission payload.
#[derive(Debug, Deserialize)]
pub struct LeadSubmission {
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone.
    pub phone: String,
    /// Self-declared role.
    pub role: Option<String>,
    /// Company.
    pub company: Option<String>,
}

/// Response payload for a lead submission.
#[derive(Debug, Serialize)]
pub struct LeadCaptureResponse {
    /// Whether the submission was accepted.
    pub success: bool,
    /// Message describing the result.
    pub message: String,
    /// Created lead id; absent for deduplicated resubmissions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<Uuid>,
}

/// Validate email address
///
/// Checks for:
/// - Basic email format (contains @ and .)
/// - Fake/placeholder patterns (repeated digits like 9999, 1111)
/// - Minimum length requirements
/// - Valid domain structure
pub fn is_valid_email(email: &str) -> bool {
    // Basic checks
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    // Detect fake patterns (repeated digits)
    let fake_patterns = [
        "999999",    // Common fake: 1199999999333@gmail.com
        "111111",    // Common fake: 1111111111@
        "000000",    // Common fake: 000000@
        "123456789", // Sequential fake
    ];

    for pattern in &fake_patterns {
        if email.contains(pattern) {
            tracing::warn!(
                "❌ Invalid email detected (fake pattern '{}'): {}",
                pattern,
                email
            );
            return false;
        }
    }

    // RFC 5322 simplified email regex
    // Matches: local@domain.tld
    let email_regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    if !email_regex.is_match(email) {
        tracing::warn!("❌ Invalid email format: {}", email);
        return false;
    }

    true
}

/// Validate and normalize Brazilian phone number
///
/// Uses phonenumber library (port of Google's libphonenumber) to:
/// - Parse phone number with Brazilian region (BR)
/// - Validate if it's a valid Brazilian number
/// - Return normalized E.164 format (+5511987654321)
///
/// Returns: (is_valid, normalized_phone_or_error_msg)
pub fn validate_br_phone(raw: &str) -> (bool, String) {
    // Skip empty or very short strings
    if raw.trim().is_empty() || raw.len() < 8 {
        return (false, "Phone too short".to_string());
    }

    // Parse with Brazilian country code
    match phonenumber::parse(Some(CountryId::BR), raw) {
        Ok(number) => {
            // Check if valid
            if phonenumber::is_valid(&number) {
                // Format to E.164 (+5511987654321)
                let formatted = number.format().mode(Mode::E164).to_string();
                tracing::debug!("✓ Valid BR phone: {} → {}", raw, formatted);
                (true, formatted)
            } else {
                tracing::warn!("❌ Invalid BR phone number: {}", raw);
                (false, "Invalid Brazilian phone number".to_string())
            }
        }
        Err(e) => {
            tracing::warn!("❌ Failed to parse BR phone '{}': {:?}", raw, e);
            (false, format!("Parse error: {:?}", e))
        }
    }
}

/// POST /public/ficha/:token/leads
///
/// Capture a lead from a public ficha. The share token gates access; the
/// submission is validated, deduplicated per property+email within a short
/// window, and stored with no author (self-captured).
pub async fn capture_lead(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(submission): Json<LeadSubmission>,
) -> Result<(StatusCode, Json<LeadCaptureResponse>), AppError> {
    let property = resolve_share_token(&state, &token).await?;

    let name = submission.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if !is_valid_email(&submission.email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    let (phone_valid, normalized_phone) = validate_br_phone(&submission.phone);
    if !phone_valid {
        return Err(AppError::BadRequest("Invalid phone number".to_string()));
    }

    // Double submits within the dedup window are acknowledged, not duplicated
    let dedup_key = format!("{}:{}", property.id, submission.email.to_lowercase());
    if state.lead_dedup_cache.get(&dedup_key).await.is_some() {
        tracing::info!(
            "Duplicate lead submission for property {} skipped",
            property.id
        );
        return Ok((
            StatusCode::OK,
            Json(LeadCaptureResponse {
                success: true,
                message: "Lead already registered".to_string(),
                lead_id: None,
            }),
        ));
    }
    state.lead_dedup_cache.insert(dedup_key, 1).await;

    let storage = PortfolioStorage::new(state.db.clone());
    let lead_id = storage
        .insert_lead(
            Some(property.id),
            name,
            submission.email.trim(),
            &normalized_phone,
            submission.role.as_deref(),
            submission.company.as_deref(),
            None,
            None,
        )
        .await?;

    if let Err(e) = storage
        .insert_log(
            None,
            None,
            None,
            "CAPTURA DE LEAD",
            &format!("Lead '{}' capturado para o imóvel '{}'", name, property.name),
        )
        .await
    {
        tracing::error!("Failed to log lead capture: {}", e);
    }

    tracing::info!(
        "Lead {} captured for property {} via public ficha",
        lead_id,
        property.id
    );

    Ok((
        StatusCode::CREATED,
        Json(LeadCaptureResponse {
            success: true,
            message: "Lead registered".to_string(),
            lead_id: Some(lead_id),
        }),
    ))
}
