use crate::config::Config;
use crate::db_storage::PortfolioStorage;
use crate::errors::{AppError, ResultExt};
use crate::models::{
    Lead, LeadUpdate, ListingQueryParams, MutationResponse, Negotiation, NegotiationPayload,
    NegotiationStage, Property, PropertyPayload, PropertyStatus, StageUpdate, SystemLog,
};
use crate::policy::{can_perform, Action, Role};
use crate::portfolio::{
    aggregate, resolve_units, unify, AggregateView, CategoryFilter, FichaFilter, ListingFilters,
};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use moka::future::Cache;
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Cache mapping share-link tokens to property ids, so public ficha
    /// requests skip the token scan.
    pub share_token_cache: Cache<String, Uuid>,
    /// Short-TTL dedup cache for public lead submissions
    /// (key: property id + normalized email).
    pub lead_dedup_cache: Cache<String, i64>,
}

// ============ Request identity ============

/// Who is calling, as forwarded by the fronting auth layer.
#[derive(Debug, Clone)]
pub struct Actor {
    pub role: Role,
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub email: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub fn actor_from_headers(headers: &HeaderMap) -> Actor {
    Actor {
        role: Role::from_header(header_str(headers, "x-user-role")),
        id: header_str(headers, "x-user-id").and_then(|v| Uuid::parse_str(v).ok()),
        name: header_str(headers, "x-user-name").map(str::to_string),
        email: header_str(headers, "x-user-email").map(str::to_string),
    }
}

/// Resolve the caller and check the capability table in one step.
pub fn authorize(headers: &HeaderMap, action: Action) -> Result<Actor, AppError> {
    let actor = actor_from_headers(headers);
    if !can_perform(actor.role, action) {
        return Err(AppError::Forbidden(format!(
            "Role '{}' may not perform {:?}",
            actor.role, action
        )));
    }
    Ok(actor)
}

/// Write an audit-trail entry. Audit failures are logged and swallowed;
/// they never fail the request that triggered them.
pub async fn audit(state: &AppState, actor: &Actor, action: &str, details: String) {
    let storage = PortfolioStorage::new(state.db.clone());
    if let Err(e) = storage
        .insert_log(
            actor.id,
            actor.name.as_deref(),
            actor.email.as_deref(),
            action,
            &details,
        )
        .await
    {
        tracing::error!("Failed to write audit log '{}': {}", action, e);
    }
}

// ============ Health ============

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "fichapro-api",
            "version": "0.1.0"
        })),
    )
}

// ============ Properties ============

fn listing_filters(params: &ListingQueryParams) -> ListingFilters {
    let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

    ListingFilters {
        search: non_empty(&params.search),
        city: non_empty(&params.city),
        state: non_empty(&params.state),
        status: params
            .status
            .as_deref()
            .and_then(PropertyStatus::from_label),
        ficha: match params.ficha.as_deref() {
            Some("available") => Some(FichaFilter::Available),
            Some("unavailable") => Some(FichaFilter::Unavailable),
            _ => None,
        },
        category: match params.category.as_deref() {
            Some("complex") => Some(CategoryFilter::Complex),
            Some("single") => Some(CategoryFilter::Single),
            _ => None,
        },
    }
}

/// GET /api/v1/properties
///
/// The unified listing: one representative per complex, child units hidden,
/// caller filters applied.
pub async fn list_properties(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListingQueryParams>,
) -> Result<Json<Vec<Property>>, AppError> {
    tracing::info!("GET /properties - params: {:?}", params);

    let storage = PortfolioStorage::new(state.db.clone());
    let records = storage.list_properties().await?;
    let filters = listing_filters(&params);

    let listing: Vec<Property> = unify(&records, &filters).into_iter().cloned().collect();

    tracing::info!(
        "Listing unified: {} of {} records shown",
        listing.len(),
        records.len()
    );
    Ok(Json(listing))
}

/// Detail view of one property: the record itself, its resolved unit group,
/// and the aggregate figures the detail page renders.
#[derive(Debug, Serialize)]
pub struct PropertyDetailResponse {
    /// The canonical record.
    pub property: Property,
    /// Resolved member units (empty for non-complex records).
    pub units: Vec<Property>,
    /// Roll-up figures; equals the record's own figures when not complex.
    pub aggregate: AggregateView,
}

/// GET /api/v1/properties/:id
pub async fn get_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PropertyDetailResponse>, AppError> {
    tracing::info!("GET /properties/{}", id);

    let storage = PortfolioStorage::new(state.db.clone());
    let records = storage
        .list_properties()
        .await
        .context("Failed to load inventory for the detail view")?;

    let property = records
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Property {} not found", id)))?;

    let units: Vec<Property> = if property.is_complex {
        resolve_units(&property, &records)
            .0
            .into_iter()
            .cloned()
            .collect()
    } else {
        Vec::new()
    };
    let view = aggregate(&property, &records);

    Ok(Json(PropertyDetailResponse {
        property,
        units,
        aggregate: view,
    }))
}

/// POST /api/v1/properties
pub async fn create_property(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<PropertyPayload>,
) -> Result<(StatusCode, Json<MutationResponse>), AppError> {
    let actor = authorize(&headers, Action::CreateProperty)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Property name is required".to_string()));
    }

    let storage = PortfolioStorage::new(state.db.clone());
    let id = storage.insert_property(&payload).await?;

    audit(
        &state,
        &actor,
        "CRIAÇÃO DE IMÓVEL",
        format!("Imóvel '{}' cadastrado ({})", payload.name, id),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::ok("Property created", Some(id))),
    ))
}

/// PUT /api/v1/properties/:id
pub async fn update_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<PropertyPayload>,
) -> Result<Json<MutationResponse>, AppError> {
    let actor = authorize(&headers, Action::EditProperty)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Property name is required".to_string()));
    }

    let storage = PortfolioStorage::new(state.db.clone());
    storage.update_property(id, &payload).await?;

    audit(
        &state,
        &actor,
        "ATUALIZAÇÃO DE IMÓVEL",
        format!("Imóvel '{}' atualizado ({})", payload.name, id),
    )
    .await;

    Ok(Json(MutationResponse::ok("Property updated", Some(id))))
}

/// DELETE /api/v1/properties/:id
pub async fn delete_property(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<MutationResponse>, AppError> {
    let actor = authorize(&headers, Action::DeleteProperty)?;

    let storage = PortfolioStorage::new(state.db.clone());
    storage.delete_property(id).await?;

    audit(
        &state,
        &actor,
        "EXCLUSÃO DE IMÓVEL",
        format!("Imóvel {} excluído", id),
    )
    .await;

    Ok(Json(MutationResponse::ok("Property deleted", None)))
}

// ============ Leads (staff) ============

/// GET /api/v1/leads
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Lead>>, AppError> {
    authorize(&headers, Action::ViewLeads)?;

    let storage = PortfolioStorage::new(state.db.clone());
    let leads = storage.list_leads().await?;
    Ok(Json(leads))
}

/// PUT /api/v1/leads/:id
pub async fn update_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(update): Json<LeadUpdate>,
) -> Result<Json<MutationResponse>, AppError> {
    let actor = authorize(&headers, Action::ManageLeads)?;

    let storage = PortfolioStorage::new(state.db.clone());
    storage.update_lead(id, &update).await?;

    audit(
        &state,
        &actor,
        "ATUALIZAÇÃO DE LEAD",
        format!("Lead {} qualificado", id),
    )
    .await;

    Ok(Json(MutationResponse::ok("Lead updated", Some(id))))
}

/// DELETE /api/v1/leads/:id
pub async fn delete_lead(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<MutationResponse>, AppError> {
    let actor = authorize(&headers, Action::DeleteLead)?;

    let storage = PortfolioStorage::new(state.db.clone());
    storage.delete_lead(id).await?;

    audit(
        &state,
        &actor,
        "EXCLUSÃO DE LEAD",
        format!("Lead {} excluído", id),
    )
    .await;

    Ok(Json(MutationResponse::ok("Lead deleted", None)))
}

// ============ Negotiations ============

/// GET /api/v1/negotiations
pub async fn list_negotiations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Negotiation>>, AppError> {
    authorize(&headers, Action::ManageNegotiations)?;

    let storage = PortfolioStorage::new(state.db.clone());
    let negotiations = storage.list_negotiations().await?;
    Ok(Json(negotiations))
}

/// POST /api/v1/negotiations
pub async fn create_negotiation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<NegotiationPayload>,
) -> Result<(StatusCode, Json<MutationResponse>), AppError> {
    let actor = authorize(&headers, Action::ManageNegotiations)?;

    if payload.title.trim().is_empty() || payload.client_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Negotiation title and client name are required".to_string(),
        ));
    }

    let storage = PortfolioStorage::new(state.db.clone());
    let id = storage.insert_negotiation(&payload).await?;

    audit(
        &state,
        &actor,
        "CRIAÇÃO DE NEGOCIAÇÃO",
        format!("Negociação '{}' criada ({})", payload.title, id),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::ok("Negotiation created", Some(id))),
    ))
}

/// PUT /api/v1/negotiations/:id/stage
///
/// Kanban stage move. The stage label is validated before touching storage
/// so a bad drag payload never corrupts the pipeline.
pub async fn update_negotiation_stage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(update): Json<StageUpdate>,
) -> Result<Json<MutationResponse>, AppError> {
    let actor = authorize(&headers, Action::ManageNegotiations)?;

    let stage = NegotiationStage::from_label(&update.stage).ok_or_else(|| {
        AppError::BadRequest(format!("Unknown negotiation stage '{}'", update.stage))
    })?;

    let storage = PortfolioStorage::new(state.db.clone());
    storage.update_negotiation_stage(id, stage).await?;

    audit(
        &state,
        &actor,
        "MOVIMENTAÇÃO DE NEGOCIAÇÃO",
        format!("Negociação {} movida para '{}'", id, stage),
    )
    .await;

    Ok(Json(MutationResponse::ok("Stage updated", Some(id))))
}

// ============ Audit trail ============

/// GET /api/v1/logs
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<SystemLog>>, AppError> {
    authorize(&headers, Action::ViewLogs)?;

    let storage = PortfolioStorage::new(state.db.clone());
    let logs = storage.list_logs().await?;
    Ok(Json(logs))
}
