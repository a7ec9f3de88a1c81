//! Public ficha share links.
//!
//! A share link is a deterministic token derived from the property id and a
//! server secret, so links survive restarts without a token table. The
//! token-to-property cache only short-circuits the scan; a cache miss falls
//! back to recomputing tokens over the record set.

use crate::db_storage::PortfolioStorage;
use crate::errors::{AppError, ResultExt};
use crate::handlers::{audit, authorize, AppState};
use crate::models::{Property, PropertyStatus};
use crate::policy::Action;
use crate::portfolio::{aggregate, AggregateTotals};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Deterministic share token for a property: SHA-256 over the server secret
/// and the property id, hex encoded.
pub fn share_token(secret: &str, property_id: &Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(property_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// Response payload when a share link is minted.
#[derive(Debug, Serialize)]
pub struct ShareLinkResponse {
    /// Full public URL of the ficha.
    pub url: String,
    /// The bare token, for clients that build their own URL.
    pub token: String,
}

/// POST /api/v1/properties/:id/share
///
/// Mint the public ficha link for a property. Only allowed while the
/// property has ficha generation enabled.
pub async fn create_share_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<ShareLinkResponse>), AppError> {
    let actor = authorize(&headers, Action::ShareFicha)?;

    let storage = PortfolioStorage::new(state.db.clone());
    let property = storage
        .fetch_property(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Property {} not found", id)))?;

    if !property.fiche_available {
        return Err(AppError::BadRequest(
            "Ficha generation is disabled for this property".to_string(),
        ));
    }

    let token = share_token(&state.config.share_link_secret, &property.id);
    state
        .share_token_cache
        .insert(token.clone(), property.id)
        .await;

    let url = public_ficha_url(&state.config.public_base_url, &token)?;
    storage.mark_ficha_generated(property.id).await?;

    audit(
        &state,
        &actor,
        "GERAÇÃO DE FICHA",
        format!("Ficha pública gerada para o imóvel '{}'", property.name),
    )
    .await;

    tracing::info!("Share link minted for property {}", property.id);
    Ok((
        StatusCode::CREATED,
        Json(ShareLinkResponse { url, token }),
    ))
}

fn public_ficha_url(base: &str, token: &str) -> Result<String, AppError> {
    let mut base = base.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let url = Url::parse(&base)
        .and_then(|b| b.join(&format!("public/ficha/{}", token)))
        .map_err(|e| AppError::InternalError(format!("Invalid public base URL: {}", e)))?;
    Ok(url.to_string())
}

/// Resolve a share token back to its property.
///
/// Cache hit first; otherwise recompute tokens over the record set. Tokens
/// for properties with ficha generation disabled resolve to not-found, so
/// revoking a ficha revokes its links.
pub async fn resolve_share_token(state: &AppState, token: &str) -> Result<Property, AppError> {
    let storage = PortfolioStorage::new(state.db.clone());

    if let Some(id) = state.share_token_cache.get(token).await {
        if let Some(property) = storage.fetch_property(id).await? {
            return ficha_visible(property);
        }
    }

    let records = storage.list_properties().await?;
    for property in records {
        if share_token(&state.config.share_link_secret, &property.id) == token {
            state
                .share_token_cache
                .insert(token.to_string(), property.id)
                .await;
            return ficha_visible(property);
        }
    }

    Err(AppError::NotFound("Unknown ficha link".to_string()))
}

fn ficha_visible(property: Property) -> Result<Property, AppError> {
    if property.fiche_available {
        Ok(property)
    } else {
        Err(AppError::NotFound(
            "Ficha is not available for this property".to_string(),
        ))
    }
}

/// Client-facing property sheet: location and figures only, no owner or
/// tenant information.
#[derive(Debug, Serialize)]
pub struct FichaView {
    pub property_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub property_type: Option<String>,
    pub status: PropertyStatus,
    pub is_complex: bool,
    pub address: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub image_url: Option<String>,
    /// Number of units behind a complex; zero for single properties.
    pub unit_count: usize,
    /// Aggregated figures for complexes, the record's own otherwise.
    pub totals: AggregateTotals,
}

/// GET /public/ficha/:token
pub async fn public_ficha(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<FichaView>, AppError> {
    let property = resolve_share_token(&state, &token).await?;

    let storage = PortfolioStorage::new(state.db.clone());
    let records = storage
        .list_properties()
        .await
        .context("Failed to load inventory for the public ficha")?;
    let view = aggregate(&property, &records);

    tracing::info!(
        "Public ficha served for property {} ({} units)",
        property.id,
        view.unit_count
    );

    Ok(Json(FichaView {
        property_id: property.id,
        name: property.name,
        description: property.description,
        property_type: property.property_type,
        status: property.status,
        is_complex: property.is_complex,
        address: property.address,
        number: property.number,
        neighborhood: property.neighborhood,
        city: property.city,
        state: property.state,
        zip_code: property.zip_code,
        image_url: property.image_url,
        unit_count: view.unit_count,
        totals: view.totals,
    }))
}
