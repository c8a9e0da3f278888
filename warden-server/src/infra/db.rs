use anyhow::{Context, Result, anyhow};
use url::Url;

/// Reject URLs that are not PostgreSQL or that do not name a database.
pub fn validate_database_url(raw: &str) -> Result<()> {
    let url = Url::parse(raw).context("invalid PostgreSQL URL")?;
    if !matches!(url.scheme(), "postgres" | "postgresql") {
        return Err(anyhow!(
            "database URL scheme must be postgres or postgresql, got `{}`",
            url.scheme()
        ));
    }

    let name = url.path().trim_start_matches('/');
    if name.is_empty() {
        return Err(anyhow!("database URL must include database name"));
    }
    Ok(())
}
