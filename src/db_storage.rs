use crate::errors::AppError;
use crate::models::{
    Lead, LeadUpdate, Negotiation, NegotiationPayload, NegotiationStage, NumericValue, Property,
    PropertyPayload, PropertyStatus, SystemLog,
};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use uuid::Uuid;

/// Database storage service for the portfolio back office.
///
/// All queries are runtime-checked. The financial/physical property columns
/// are nullable text and round-trip verbatim; parsing them is the engine's
/// job, not the storage layer's.
pub struct PortfolioStorage {
    pool: PgPool,
}

impl PortfolioStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ============ Properties ============

    /// Fetch the full inventory, ordered by name ascending.
    ///
    /// The ordering is load-bearing: the listing de-duplication keeps the
    /// first representative of each complex group in scan order.
    pub async fn list_properties(&self) -> Result<Vec<Property>, AppError> {
        let rows = sqlx::query("SELECT * FROM properties ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(property_from_row).collect())
    }

    pub async fn fetch_property(&self, id: Uuid) -> Result<Option<Property>, AppError> {
        let row = sqlx::query("SELECT * FROM properties WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(property_from_row))
    }

    pub async fn insert_property(&self, payload: &PropertyPayload) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        let query = sqlx::query(
            r#"
            INSERT INTO properties (
                id, name, status, owner, is_complex, description, property_type,
                address, number, complement, neighborhood, city, state, region,
                zip_code, registration, tenant, tenant_category, purchase_year,
                matricula, sequencial, image_url, parent_id, fiche_available,
                has_ficha, built_area, land_area, main_quota, lateral_quota,
                floors, min_rent, variable_rent, purchase_value, market_value,
                market_rent, iptu_value, spu_value, other_taxes, rent_dy, rent_sqm,
                created_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28,
                $29, $30, $31, $32, $33, $34, $35, $36, $37, $38, $39, $40, now()
            )
            "#,
        )
        .bind(id);

        bind_property_payload(query, payload)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Inserted property {} ({})", payload.name, id);
        Ok(id)
    }

    pub async fn update_property(
        &self,
        id: Uuid,
        payload: &PropertyPayload,
    ) -> Result<(), AppError> {
        let query = sqlx::query(
            r#"
            UPDATE properties SET
                name = $2, status = $3, owner = $4, is_complex = $5,
                description = $6, property_type = $7, address = $8, number = $9,
                complement = $10, neighborhood = $11, city = $12, state = $13,
                region = $14, zip_code = $15, registration = $16, tenant = $17,
                tenant_category = $18, purchase_year = $19, matricula = $20,
                sequencial = $21, image_url = $22, parent_id = $23,
                fiche_available = $24, has_ficha = $25, built_area = $26,
                land_area = $27, main_quota = $28, lateral_quota = $29,
                floors = $30, min_rent = $31, variable_rent = $32,
                purchase_value = $33, market_value = $34, market_rent = $35,
                iptu_value = $36, spu_value = $37, other_taxes = $38,
                rent_dy = $39, rent_sqm = $40
            WHERE id = $1
            "#,
        )
        .bind(id);

        let result = bind_property_payload(query, payload)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Property {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete_property(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Property {} not found", id)));
        }
        Ok(())
    }

    /// Record that a ficha has been generated for the property.
    pub async fn mark_ficha_generated(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE properties SET has_ficha = true WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ============ Leads ============

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_lead(
        &self,
        property_id: Option<Uuid>,
        name: &str,
        email: &str,
        phone: &str,
        role: Option<&str>,
        company: Option<&str>,
        author_id: Option<Uuid>,
        author_name: Option<&str>,
    ) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO leads (id, property_id, name, email, phone, role, company,
                               author_id, author_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now())
            "#,
        )
        .bind(id)
        .bind(property_id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(role)
        .bind(company)
        .bind(author_id)
        .bind(author_name)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn list_leads(&self) -> Result<Vec<Lead>, AppError> {
        let leads =
            sqlx::query_as::<_, Lead>("SELECT * FROM leads ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(leads)
    }

    /// Update the staff qualification fields of a lead; untouched fields keep
    /// their current value.
    pub async fn update_lead(&self, id: Uuid, update: &LeadUpdate) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE leads
            SET level = COALESCE($2, level), marking = COALESCE($3, marking)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.level.as_deref())
        .bind(update.marking.as_deref())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Lead {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete_lead(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Lead {} not found", id)));
        }
        Ok(())
    }

    // ============ Negotiations ============

    pub async fn list_negotiations(&self) -> Result<Vec<Negotiation>, AppError> {
        let rows = sqlx::query("SELECT * FROM negotiations ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(negotiation_from_row).collect())
    }

    pub async fn insert_negotiation(
        &self,
        payload: &NegotiationPayload,
    ) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO negotiations (id, title, client_name, value, probability,
                                      stage, property_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now())
            "#,
        )
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.client_name)
        .bind(payload.value)
        .bind(payload.probability)
        .bind(payload.stage.as_str())
        .bind(payload.property_id)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    /// Move a negotiation card to another pipeline stage.
    pub async fn update_negotiation_stage(
        &self,
        id: Uuid,
        stage: NegotiationStage,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE negotiations SET stage = $2 WHERE id = $1")
            .bind(id)
            .bind(stage.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Negotiation {} not found", id)));
        }
        Ok(())
    }

    // ============ Audit log ============

    pub async fn insert_log(
        &self,
        user_id: Option<Uuid>,
        user_name: Option<&str>,
        user_email: Option<&str>,
        action: &str,
        details: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO system_logs (id, user_id, user_name, user_email, action,
                                     details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, now())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(user_name)
        .bind(user_email)
        .bind(action)
        .bind(details)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_logs(&self) -> Result<Vec<SystemLog>, AppError> {
        let logs = sqlx::query_as::<_, SystemLog>(
            "SELECT * FROM system_logs ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}

/// Bind every payload field in column order ($2..$40); the caller binds $1.
fn bind_property_payload<'q>(
    query: Query<'q, Postgres, PgArguments>,
    p: &'q PropertyPayload,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&p.name)
        .bind(p.status.as_str())
        .bind(p.owner.as_deref())
        .bind(p.is_complex)
        .bind(p.description.as_deref())
        .bind(p.property_type.as_deref())
        .bind(p.address.as_deref())
        .bind(p.number.as_deref())
        .bind(p.complement.as_deref())
        .bind(p.neighborhood.as_deref())
        .bind(p.city.as_deref())
        .bind(p.state.as_deref())
        .bind(p.region.as_deref())
        .bind(p.zip_code.as_deref())
        .bind(p.registration.as_deref())
        .bind(p.tenant.as_deref())
        .bind(p.tenant_category.as_deref())
        .bind(p.purchase_year)
        .bind(p.matricula.as_deref())
        .bind(p.sequencial.as_deref())
        .bind(p.image_url.as_deref())
        .bind(p.parent_id)
        .bind(p.fiche_available)
        .bind(p.has_ficha)
        .bind(p.built_area.to_column())
        .bind(p.land_area.to_column())
        .bind(p.main_quota.to_column())
        .bind(p.lateral_quota.to_column())
        .bind(p.floors.to_column())
        .bind(p.min_rent.to_column())
        .bind(p.variable_rent.to_column())
        .bind(p.purchase_value.to_column())
        .bind(p.market_value.to_column())
        .bind(p.market_rent.to_column())
        .bind(p.iptu_value.to_column())
        .bind(p.spu_value.to_column())
        .bind(p.other_taxes.to_column())
        .bind(p.rent_dy.to_column())
        .bind(p.rent_sqm.to_column())
}

/// Rebuild a [`Property`] from a row. Missing or null columns fall back to
/// the field default rather than failing the whole fetch.
fn property_from_row(row: &PgRow) -> Property {
    let text = |name: &str| -> Option<String> { row.try_get(name).ok().flatten() };
    let numeric = |name: &str| NumericValue::from_column(row.try_get(name).ok().flatten());

    Property {
        id: row.try_get("id").unwrap_or_default(),
        status: text("status")
            .map(|s| PropertyStatus::from_column(&s))
            .unwrap_or_default(),
        owner: text("owner"),
        is_complex: row.try_get("is_complex").unwrap_or(false),
        name: text("name").unwrap_or_default(),
        description: text("description"),
        property_type: text("property_type"),
        address: text("address"),
        number: text("number"),
        complement: text("complement"),
        neighborhood: text("neighborhood"),
        city: text("city"),
        state: text("state"),
        region: text("region"),
        zip_code: text("zip_code"),
        registration: text("registration"),
        tenant: text("tenant"),
        tenant_category: text("tenant_category"),
        purchase_year: row.try_get("purchase_year").ok().flatten(),
        matricula: text("matricula"),
        sequencial: text("sequencial"),
        image_url: text("image_url"),
        parent_id: row.try_get("parent_id").ok().flatten(),
        fiche_available: row.try_get("fiche_available").unwrap_or(true),
        has_ficha: row.try_get("has_ficha").unwrap_or(false),
        built_area: numeric("built_area"),
        land_area: numeric("land_area"),
        main_quota: numeric("main_quota"),
        lateral_quota: numeric("lateral_quota"),
        floors: numeric("floors"),
        min_rent: numeric("min_rent"),
        variable_rent: numeric("variable_rent"),
        purchase_value: numeric("purchase_value"),
        market_value: numeric("market_value"),
        market_rent: numeric("market_rent"),
        iptu_value: numeric("iptu_value"),
        spu_value: numeric("spu_value"),
        other_taxes: numeric("other_taxes"),
        rent_dy: numeric("rent_dy"),
        rent_sqm: numeric("rent_sqm"),
        created_at: row.try_get("created_at").ok().flatten(),
    }
}

fn negotiation_from_row(row: &PgRow) -> Negotiation {
    let stage: String = row
        .try_get::<Option<String>, _>("stage")
        .ok()
        .flatten()
        .unwrap_or_default();

    Negotiation {
        id: row.try_get("id").unwrap_or_default(),
        title: row
            .try_get::<Option<String>, _>("title")
            .ok()
            .flatten()
            .unwrap_or_default(),
        client_name: row
            .try_get::<Option<String>, _>("client_name")
            .ok()
            .flatten()
            .unwrap_or_default(),
        value: row.try_get("value").ok().flatten(),
        probability: row.try_get("probability").unwrap_or(0),
        stage: NegotiationStage::from_label(&stage).unwrap_or_default(),
        property_id: row.try_get("property_id").ok().flatten(),
        created_at: row.try_get("created_at").unwrap_or_else(|_| chrono::Utc::now()),
    }
}
