use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Base URL the public ficha links are minted under.
    pub public_base_url: String,
    /// Secret mixed into share-link tokens.
    pub share_link_secret: String,
    /// TTL for the public lead-submission dedup window, in seconds.
    pub lead_dedup_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .map_err(|_| anyhow::anyhow!("PUBLIC_BASE_URL environment variable required"))
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("PUBLIC_BASE_URL cannot be empty");
                    }
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("PUBLIC_BASE_URL must start with http:// or https://");
                    }
                    Ok(url)
                })?,
            share_link_secret: std::env::var("SHARE_LINK_SECRET")
                .map_err(|_| anyhow::anyhow!("SHARE_LINK_SECRET environment variable required"))
                .and_then(|secret| {
                    if secret.trim().is_empty() {
                        anyhow::bail!("SHARE_LINK_SECRET cannot be empty");
                    }
                    Ok(secret)
                })?,
            lead_dedup_ttl_secs: std::env::var("LEAD_DEDUP_TTL_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("LEAD_DEDUP_TTL_SECS must be a valid number"))?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Public base URL: {}", config.public_base_url);
        tracing::debug!("Lead dedup TTL: {}s", config.lead_dedup_ttl_secs);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
