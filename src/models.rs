use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

// ============ Enumerations ============

/// Lifecycle status of a property, stored with its Portuguese display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PropertyStatus {
    /// Available for lease or sale.
    #[default]
    #[serde(rename = "DISPONÍVEL")]
    Disponivel,
    /// Currently leased.
    #[serde(rename = "LOCADO")]
    Locado,
    /// In use by the owner.
    #[serde(rename = "EM USO")]
    EmUso,
    /// Reserved for a negotiation in progress.
    #[serde(rename = "RESERVADO")]
    Reservado,
    /// Listed for sale.
    #[serde(rename = "À VENDA")]
    AVenda,
}

impl PropertyStatus {
    /// Display label, identical to the stored column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Disponivel => "DISPONÍVEL",
            PropertyStatus::Locado => "LOCADO",
            PropertyStatus::EmUso => "EM USO",
            PropertyStatus::Reservado => "RESERVADO",
            PropertyStatus::AVenda => "À VENDA",
        }
    }

    /// Parse a display label; `None` for anything unrecognized.
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim() {
            "DISPONÍVEL" | "DISPONIVEL" => Some(PropertyStatus::Disponivel),
            "LOCADO" => Some(PropertyStatus::Locado),
            "EM USO" => Some(PropertyStatus::EmUso),
            "RESERVADO" => Some(PropertyStatus::Reservado),
            "À VENDA" | "A VENDA" => Some(PropertyStatus::AVenda),
            _ => None,
        }
    }

    /// Parse a stored column value, defaulting to DISPONÍVEL for unknown rows.
    pub fn from_column(raw: &str) -> Self {
        Self::from_label(raw).unwrap_or_else(|| {
            tracing::warn!("Unknown property status '{}', defaulting to DISPONÍVEL", raw);
            PropertyStatus::Disponivel
        })
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage of a sales negotiation in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NegotiationStage {
    /// Fresh opportunity, not yet contacted.
    #[default]
    #[serde(rename = "Oportunidade")]
    Oportunidade,
    /// First contact attempts in progress.
    #[serde(rename = "Contactando")]
    Contactando,
    /// Client engaged and responding.
    #[serde(rename = "Engajado")]
    Engajado,
    /// Terms under negotiation.
    #[serde(rename = "Negociando")]
    Negociando,
    /// Deal closed and won.
    #[serde(rename = "Negócio Fechado")]
    NegocioFechado,
    /// Deal lost.
    #[serde(rename = "Perdido")]
    Perdido,
}

impl NegotiationStage {
    /// Display label, identical to the stored column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationStage::Oportunidade => "Oportunidade",
            NegotiationStage::Contactando => "Contactando",
            NegotiationStage::Engajado => "Engajado",
            NegotiationStage::Negociando => "Negociando",
            NegotiationStage::NegocioFechado => "Negócio Fechado",
            NegotiationStage::Perdido => "Perdido",
        }
    }

    /// Parse a display label; `None` for anything unrecognized.
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Oportunidade" => Some(NegotiationStage::Oportunidade),
            "Contactando" => Some(NegotiationStage::Contactando),
            "Engajado" => Some(NegotiationStage::Engajado),
            "Negociando" => Some(NegotiationStage::Negociando),
            "Negócio Fechado" | "Negocio Fechado" => Some(NegotiationStage::NegocioFechado),
            "Perdido" => Some(NegotiationStage::Perdido),
            _ => None,
        }
    }
}

impl fmt::Display for NegotiationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Numeric fields ============

/// A financial or physical figure as it actually arrives from storage and
/// from form payloads: a real number, a locale-formatted string
/// ("R$ 1.234,56"), or nothing at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum NumericValue {
    /// A genuine number.
    Number(f64),
    /// Free text, possibly currency-formatted, possibly garbage.
    Text(String),
    /// Absent value.
    #[default]
    Empty,
}

impl NumericValue {
    /// Coerce to `f64`. Currency symbols, whitespace and thousands separators
    /// are stripped, the first decimal comma becomes a decimal point, and
    /// anything unparseable contributes zero. Never fails, never returns
    /// NaN or infinity.
    pub fn as_number(&self) -> f64 {
        let parsed = match self {
            NumericValue::Number(n) => *n,
            NumericValue::Empty => 0.0,
            NumericValue::Text(raw) => {
                let cleaned: String = raw
                    .chars()
                    .filter(|c| !matches!(*c, 'R' | '$' | '.') && !c.is_whitespace())
                    .collect();
                let cleaned = cleaned.replacen(',', ".", 1);
                cleaned.parse::<f64>().unwrap_or(0.0)
            }
        };
        if parsed.is_finite() {
            parsed
        } else {
            0.0
        }
    }

    /// True when there is no usable content at all.
    pub fn is_empty(&self) -> bool {
        match self {
            NumericValue::Empty => true,
            NumericValue::Text(s) => s.trim().is_empty(),
            NumericValue::Number(_) => false,
        }
    }

    /// Render for storage; `None` when empty so the column stays NULL.
    pub fn to_column(&self) -> Option<String> {
        match self {
            NumericValue::Number(n) => Some(n.to_string()),
            NumericValue::Text(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// Rebuild from a nullable text column.
    pub fn from_column(value: Option<String>) -> Self {
        match value {
            Some(s) if !s.trim().is_empty() => NumericValue::Text(s),
            _ => NumericValue::Empty,
        }
    }
}

// ============ Inventory ============

/// One row of real-estate inventory.
///
/// Financial and physical figures keep their raw representation
/// ([`NumericValue`]); the portfolio engine coerces them at aggregation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Property {
    /// Unique identifier.
    pub id: Uuid,
    /// Lifecycle status.
    pub status: PropertyStatus,
    /// Owner name.
    pub owner: Option<String>,
    /// True when the record is part of a multi-unit complex.
    pub is_complex: bool,
    /// Display name; the fuzzy-grouping key for complexes.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Property type label (Casa, Loja, Galpão, ...).
    pub property_type: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Street number.
    pub number: Option<String>,
    /// Address complement.
    pub complement: Option<String>,
    /// Neighborhood.
    pub neighborhood: Option<String>,
    /// City.
    pub city: Option<String>,
    /// State.
    pub state: Option<String>,
    /// Region label.
    pub region: Option<String>,
    /// Postal code (CEP).
    pub zip_code: Option<String>,
    /// Internal registration identifier, searched as free text.
    pub registration: Option<String>,
    /// Current tenant name.
    pub tenant: Option<String>,
    /// Tenant business category.
    pub tenant_category: Option<String>,
    /// Year of purchase.
    pub purchase_year: Option<i32>,
    /// Registry enrollment; comma-joined when representing several units.
    pub matricula: Option<String>,
    /// Registry sequential number; comma-joined when representing several units.
    pub sequencial: Option<String>,
    /// Cover image URL.
    pub image_url: Option<String>,
    /// Canonical parent record, when unit linkage is explicit.
    pub parent_id: Option<Uuid>,
    /// Whether a client-facing ficha may be generated.
    pub fiche_available: bool,
    /// Whether a ficha has already been generated.
    pub has_ficha: bool,
    /// Built area (m²).
    pub built_area: NumericValue,
    /// Land area (m²).
    pub land_area: NumericValue,
    /// Main frontage quota (m).
    pub main_quota: NumericValue,
    /// Lateral quota (m).
    pub lateral_quota: NumericValue,
    /// Number of floors.
    pub floors: NumericValue,
    /// Minimum rent.
    pub min_rent: NumericValue,
    /// Variable rent component.
    pub variable_rent: NumericValue,
    /// Purchase value.
    pub purchase_value: NumericValue,
    /// Market value.
    pub market_value: NumericValue,
    /// Market rent.
    pub market_rent: NumericValue,
    /// Annual IPTU tax.
    pub iptu_value: NumericValue,
    /// Annual SPU tax.
    pub spu_value: NumericValue,
    /// Other taxes.
    pub other_taxes: NumericValue,
    /// Stored rent dividend yield (%), used as-is for non-complex records.
    pub rent_dy: NumericValue,
    /// Stored rent per m², used as-is for non-complex records.
    pub rent_sqm: NumericValue,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
}

/// Create/update payload for a property, as submitted by the back-office
/// form. Numeric fields accept numbers or formatted strings.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyPayload {
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: PropertyStatus,
    /// Owner name.
    pub owner: Option<String>,
    /// Complex flag.
    #[serde(default)]
    pub is_complex: bool,
    /// Free-text description.
    pub description: Option<String>,
    /// Property type label.
    pub property_type: Option<String>,
    pub address: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub zip_code: Option<String>,
    pub registration: Option<String>,
    pub tenant: Option<String>,
    pub tenant_category: Option<String>,
    pub purchase_year: Option<i32>,
    pub matricula: Option<String>,
    pub sequencial: Option<String>,
    pub image_url: Option<String>,
    /// Canonical parent record for explicitly linked units.
    pub parent_id: Option<Uuid>,
    /// Whether a client-facing ficha may be generated.
    #[serde(default = "default_true")]
    pub fiche_available: bool,
    #[serde(default)]
    pub has_ficha: bool,
    #[serde(default)]
    pub built_area: NumericValue,
    #[serde(default)]
    pub land_area: NumericValue,
    #[serde(default)]
    pub main_quota: NumericValue,
    #[serde(default)]
    pub lateral_quota: NumericValue,
    #[serde(default)]
    pub floors: NumericValue,
    #[serde(default)]
    pub min_rent: NumericValue,
    #[serde(default)]
    pub variable_rent: NumericValue,
    #[serde(default)]
    pub purchase_value: NumericValue,
    #[serde(default)]
    pub market_value: NumericValue,
    #[serde(default)]
    pub market_rent: NumericValue,
    #[serde(default)]
    pub iptu_value: NumericValue,
    #[serde(default)]
    pub spu_value: NumericValue,
    #[serde(default)]
    pub other_taxes: NumericValue,
    #[serde(default)]
    pub rent_dy: NumericValue,
    #[serde(default)]
    pub rent_sqm: NumericValue,
}

fn default_true() -> bool {
    true
}

// ============ Leads ============

/// A lead captured from a public ficha link or entered by staff.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lead {
    /// Unique identifier.
    pub id: Uuid,
    /// Property the lead is interested in.
    pub property_id: Option<Uuid>,
    /// Contact name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone, normalized to E.164 when valid.
    pub phone: String,
    /// Qualification level assigned by staff.
    pub level: Option<String>,
    /// Free-form staff marking.
    pub marking: Option<String>,
    /// Staff member who registered the lead, when not self-captured.
    pub author_id: Option<Uuid>,
    /// Display name of the registering staff member.
    pub author_name: Option<String>,
    /// Lead's self-declared role.
    pub role: Option<String>,
    /// Lead's company.
    pub company: Option<String>,
    /// Capture timestamp.
    pub created_at: DateTime<Utc>,
}

/// Staff update payload for a lead (qualification fields only).
#[derive(Debug, Deserialize)]
pub struct LeadUpdate {
    pub level: Option<String>,
    pub marking: Option<String>,
}

// ============ Negotiations ============

/// A card in the sales-negotiation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Negotiation {
    /// Unique identifier.
    pub id: Uuid,
    /// Card title.
    pub title: String,
    /// Client display name.
    pub client_name: String,
    /// Negotiated value, when known.
    pub value: Option<f64>,
    /// Win probability (0-100).
    pub probability: i32,
    /// Current pipeline stage.
    pub stage: NegotiationStage,
    /// Linked property, when the negotiation targets one.
    pub property_id: Option<Uuid>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Create payload for a negotiation card.
#[derive(Debug, Deserialize)]
pub struct NegotiationPayload {
    pub title: String,
    pub client_name: String,
    pub value: Option<f64>,
    #[serde(default)]
    pub probability: i32,
    #[serde(default)]
    pub stage: NegotiationStage,
    pub property_id: Option<Uuid>,
}

/// Stage-move payload for the kanban board.
#[derive(Debug, Deserialize)]
pub struct StageUpdate {
    /// Target stage label.
    pub stage: String,
}

// ============ Audit log ============

/// One audit-trail entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SystemLog {
    /// Unique identifier.
    pub id: Uuid,
    /// Acting user id, when known.
    pub user_id: Option<Uuid>,
    /// Acting user display name.
    pub user_name: Option<String>,
    /// Acting user email.
    pub user_email: Option<String>,
    /// Action label (e.g. "CRIAÇÃO DE IMÓVEL").
    pub action: String,
    /// Human-readable details.
    pub details: Option<String>,
    /// Timestamp.
    pub created_at: DateTime<Utc>,
}

// ============ Query Parameters ============

/// Query parameters for the property listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQueryParams {
    /// Free-text search over name/address/city/registration.
    pub search: Option<String>,
    /// Exact city match.
    pub city: Option<String>,
    /// Exact state match.
    pub state: Option<String>,
    /// Exact status label match.
    pub status: Option<String>,
    /// Ficha availability: "available" or "unavailable".
    pub ficha: Option<String>,
    /// Category: "all", "complex" or "single".
    pub category: Option<String>,
}

// ============ Generic Responses ============

/// Response payload for mutating operations.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Message describing the result.
    pub message: String,
    /// Identifier of the affected entity, when one was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
}

impl MutationResponse {
    pub fn ok(message: impl Into<String>, id: Option<Uuid>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id,
        }
    }
}
