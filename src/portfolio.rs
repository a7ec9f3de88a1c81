//! Complex-property unification and financial aggregation.
//!
//! Listings carry duplicate rows for multi-unit complexes ("Complexo
//! Agamenon - Loja 1", "Complexo Agamenon - Loja 2", ...). This module
//! collapses them to one canonical record per complex for list views
//! (`unify`), resolves the full unit group behind a canonical record
//! (`resolve_units`), and rolls financial/physical figures up across the
//! group for detail views (`aggregate`). Everything here is a pure function
//! of the in-memory record set; it is recomputed per request.

use crate::models::{NumericValue, Property, PropertyStatus};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

// ============ Group identity ============

/// Normalize a property name for grouping: trim, lowercase, NFD-decompose
/// and strip combining marks, so "Complexo Agamenón" and "complexo agamenon"
/// compare equal.
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Extract the complex identifier from a name, e.g.
/// "Complexo Agamenon - Loja 2" -> "complexo agamenon".
///
/// Returns `None` when the name carries no "complexo <word>" pattern.
pub fn complex_key(name: &str) -> Option<String> {
    let normalized = normalize_name(name);
    let pattern = Regex::new(r"complexo\s+\w+").unwrap();
    pattern.find(&normalized).map(|m| m.as_str().to_string())
}

/// Grouping key for list de-duplication: the complex identifier when one is
/// present, the full normalized name otherwise.
///
/// Empty names are ungroupable and yield `None`; two blank-named records are
/// never collapsed into each other.
pub fn group_key(name: &str) -> Option<String> {
    let normalized = normalize_name(name);
    if normalized.is_empty() {
        return None;
    }
    let pattern = Regex::new(r"complexo\s+\w+").unwrap();
    Some(
        pattern
            .find(&normalized)
            .map(|m| m.as_str().to_string())
            .unwrap_or(normalized),
    )
}

// ============ Listing filters ============

/// Ficha-availability filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FichaFilter {
    Available,
    Unavailable,
}

/// Complex-vs-single category filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    Complex,
    Single,
}

/// Caller-supplied listing predicates. Empty criteria always match; all
/// populated criteria must hold (logical AND).
#[derive(Debug, Clone, Default)]
pub struct ListingFilters {
    /// Free-text search across name, address, city and registration.
    pub search: Option<String>,
    /// Exact city match.
    pub city: Option<String>,
    /// Exact state match.
    pub state: Option<String>,
    /// Exact status match.
    pub status: Option<PropertyStatus>,
    /// Ficha availability.
    pub ficha: Option<FichaFilter>,
    /// Complex-vs-single category.
    pub category: Option<CategoryFilter>,
}

impl ListingFilters {
    fn matches(&self, p: &Property) -> bool {
        if let Some(ref term) = self.search {
            let term = term.to_lowercase();
            let hit = |field: &Option<String>| {
                field
                    .as_deref()
                    .map(|v| v.to_lowercase().contains(&term))
                    .unwrap_or(false)
            };
            let matches_search = p.name.to_lowercase().contains(&term)
                || hit(&p.address)
                || hit(&p.city)
                || hit(&p.registration);
            if !matches_search {
                return false;
            }
        }

        if let Some(ref city) = self.city {
            if p.city.as_deref() != Some(city.as_str()) {
                return false;
            }
        }
        if let Some(ref state) = self.state {
            if p.state.as_deref() != Some(state.as_str()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if p.status != status {
                return false;
            }
        }
        if let Some(ficha) = self.ficha {
            let wanted = matches!(ficha, FichaFilter::Available);
            if p.fiche_available != wanted {
                return false;
            }
        }
        if let Some(category) = self.category {
            let wanted = matches!(category, CategoryFilter::Complex);
            if p.is_complex != wanted {
                return false;
            }
        }

        true
    }
}

// ============ List de-duplication ============

/// Produce the display-ready listing: each complex appears once (first
/// occurrence in input order wins), explicitly linked child units are
/// hidden, and the caller's filters are applied.
///
/// A complex record claims its group key before the parent/filter checks
/// run, so a first representative hidden by a filter still suppresses later
/// duplicates. Input order is therefore part of the contract; the record
/// source orders by name ascending.
pub fn unify<'a>(records: &'a [Property], filters: &ListingFilters) -> Vec<&'a Property> {
    let mut seen_groups: HashSet<String> = HashSet::new();

    records
        .iter()
        .filter(|p| {
            if p.is_complex {
                if let Some(key) = group_key(&p.name) {
                    if !seen_groups.insert(key) {
                        return false;
                    }
                }
            }
            if p.parent_id.is_some() {
                return false;
            }
            filters.matches(p)
        })
        .collect()
}

// ============ Unit-group resolution ============

/// How the unit group behind a canonical record was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupResolution {
    /// Members linked through `parent_id`.
    ExplicitLink,
    /// Members grouped by a shared "complexo <word>" name pattern.
    PatternMatch,
    /// Members grouped by identical normalized full name.
    ExactNameMatch,
}

/// Resolve the unit group for a canonical complex record.
///
/// Strategies run in order and the first non-empty result wins: explicit
/// `parent_id` linkage, shared complex-name pattern, identical normalized
/// name. Name-based results include the canonical record itself. The result
/// may be empty for a standalone record that is flagged complex.
pub fn resolve_units<'a>(
    canonical: &Property,
    all: &'a [Property],
) -> (Vec<&'a Property>, GroupResolution) {
    let linked: Vec<&Property> = all
        .iter()
        .filter(|p| p.parent_id == Some(canonical.id))
        .collect();
    if !linked.is_empty() {
        return (linked, GroupResolution::ExplicitLink);
    }

    if let Some(key) = complex_key(&canonical.name) {
        let members: Vec<&Property> = all
            .iter()
            .filter(|p| p.is_complex && complex_key(&p.name).as_deref() == Some(key.as_str()))
            .collect();
        if !members.is_empty() {
            tracing::info!(
                complex = %key,
                members = members.len(),
                "unit group resolved by name pattern; records lack parent_id linkage"
            );
            return (members, GroupResolution::PatternMatch);
        }
    }

    let canonical_name = normalize_name(&canonical.name);
    let members: Vec<&Property> = all
        .iter()
        .filter(|p| p.is_complex && normalize_name(&p.name) == canonical_name)
        .collect();
    if !members.is_empty() {
        tracing::info!(
            name = %canonical_name,
            members = members.len(),
            "unit group resolved by exact normalized name; records lack parent_id linkage"
        );
    }
    (members, GroupResolution::ExactNameMatch)
}

// ============ Aggregation ============

/// Roll-up figures across a unit group, plus the ratios derived from the
/// summed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateTotals {
    pub market_value: f64,
    pub built_area: f64,
    pub land_area: f64,
    pub market_rent: f64,
    pub min_rent: f64,
    pub variable_rent: f64,
    pub purchase_value: f64,
    pub main_quota: f64,
    pub lateral_quota: f64,
    pub floors: f64,
    pub iptu_value: f64,
    pub spu_value: f64,
    pub other_taxes: f64,
    /// Comma-joined registry enrollments of all members, in member order.
    pub matricula: String,
    /// Comma-joined registry sequentials of all members, in member order.
    pub sequencial: String,
    /// Annualized rent over market value, in percent. Zero when the summed
    /// market value is zero.
    pub rent_dy: f64,
    /// Monthly rent per built m². Zero when the summed built area is zero.
    pub rent_sqm: f64,
}

/// Aggregate view consumed by the detail endpoint and the public ficha.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateView {
    /// Summed and derived figures.
    pub totals: AggregateTotals,
    /// Number of resolved member units (zero for standalone records).
    pub unit_count: usize,
    /// Resolution strategy, absent for non-complex records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<GroupResolution>,
}

fn sum(units: &[&Property], field: fn(&Property) -> &NumericValue) -> f64 {
    units.iter().map(|u| field(u).as_number()).sum()
}

fn joined(units: &[&Property], field: fn(&Property) -> &Option<String>) -> String {
    units
        .iter()
        .filter_map(|u| field(u).as_deref())
        .filter(|v| !v.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Sum every financial/physical figure across the group and derive the
/// rent ratios from the summed values. Malformed figures contribute zero;
/// zero denominators yield zero ratios, never NaN or infinity.
pub fn aggregate_units(units: &[&Property]) -> AggregateTotals {
    let market_value = sum(units, |u| &u.market_value);
    let built_area = sum(units, |u| &u.built_area);
    let market_rent = sum(units, |u| &u.market_rent);

    let rent_dy = if market_value > 0.0 {
        (market_rent * 12.0 / market_value) * 100.0
    } else {
        0.0
    };
    let rent_sqm = if built_area > 0.0 {
        market_rent / built_area
    } else {
        0.0
    };

    AggregateTotals {
        market_value,
        built_area,
        land_area: sum(units, |u| &u.land_area),
        market_rent,
        min_rent: sum(units, |u| &u.min_rent),
        variable_rent: sum(units, |u| &u.variable_rent),
        purchase_value: sum(units, |u| &u.purchase_value),
        main_quota: sum(units, |u| &u.main_quota),
        lateral_quota: sum(units, |u| &u.lateral_quota),
        floors: sum(units, |u| &u.floors),
        iptu_value: sum(units, |u| &u.iptu_value),
        spu_value: sum(units, |u| &u.spu_value),
        other_taxes: sum(units, |u| &u.other_taxes),
        matricula: joined(units, |u| &u.matricula),
        sequencial: joined(units, |u| &u.sequencial),
        rent_dy,
        rent_sqm,
    }
}

/// A non-complex record surfaces its own figures unchanged, including its
/// stored rent ratios.
fn own_totals(p: &Property) -> AggregateTotals {
    AggregateTotals {
        market_value: p.market_value.as_number(),
        built_area: p.built_area.as_number(),
        land_area: p.land_area.as_number(),
        market_rent: p.market_rent.as_number(),
        min_rent: p.min_rent.as_number(),
        variable_rent: p.variable_rent.as_number(),
        purchase_value: p.purchase_value.as_number(),
        main_quota: p.main_quota.as_number(),
        lateral_quota: p.lateral_quota.as_number(),
        floors: p.floors.as_number(),
        iptu_value: p.iptu_value.as_number(),
        spu_value: p.spu_value.as_number(),
        other_taxes: p.other_taxes.as_number(),
        matricula: p.matricula.clone().unwrap_or_default(),
        sequencial: p.sequencial.clone().unwrap_or_default(),
        rent_dy: p.rent_dy.as_number(),
        rent_sqm: p.rent_sqm.as_number(),
    }
}

/// Build the aggregate view for a record.
///
/// Complex records aggregate across their resolved unit group; when no
/// group resolves, the record stands alone and the totals equal its own
/// figures. Non-complex records never aggregate.
pub fn aggregate(property: &Property, all: &[Property]) -> AggregateView {
    if !property.is_complex {
        return AggregateView {
            totals: own_totals(property),
            unit_count: 0,
            resolution: None,
        };
    }

    let (units, resolution) = resolve_units(property, all);
    let unit_count = units.len();
    let totals = if units.is_empty() {
        aggregate_units(&[property])
    } else {
        aggregate_units(&units)
    };

    AggregateView {
        totals,
        unit_count,
        resolution: Some(resolution),
    }
}
