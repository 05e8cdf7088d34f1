use url::Url;

use crate::error::{Result, StoreError};

/// Source of an effective PostgreSQL connection URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseUrlSource {
    /// URL came directly from `DATABASE_URL`.
    Config,
    /// URL was derived from environment fallbacks such as `PGDATABASE` /
    /// `DATABASE_NAME` when no explicit URL was provided.
    Env,
}

/// Resolve the effective PostgreSQL connection URL and the source used.
///
/// `DATABASE_URL` wins when set and non-empty, after a scheme sanity check.
/// Otherwise `PGDATABASE` and then `DATABASE_NAME` are consulted, yielding a
/// simple `postgresql:///<db>` URL when set.
pub fn resolve_database_url_with_source()
-> Result<Option<(String, DatabaseUrlSource)>> {
    resolve_from(|name| std::env::var(name).ok())
}

/// Resolve the effective PostgreSQL connection URL, ignoring the source.
pub fn resolve_database_url() -> Result<Option<String>> {
    Ok(resolve_database_url_with_source()?.map(|(url, _)| url))
}

fn resolve_from(
    var: impl Fn(&str) -> Option<String>,
) -> Result<Option<(String, DatabaseUrlSource)>> {
    if let Some(raw) = var("DATABASE_URL")
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
    {
        let parsed = Url::parse(&raw).map_err(|source| {
            StoreError::Configuration(format!(
                "invalid DATABASE_URL: {source}"
            ))
        })?;
        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(StoreError::Configuration(format!(
                "unsupported DATABASE_URL scheme: {}",
                parsed.scheme()
            )));
        }
        return Ok(Some((raw, DatabaseUrlSource::Config)));
    }

    let database = var("PGDATABASE")
        .or_else(|| var("DATABASE_NAME"))
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty());

    Ok(database
        .map(|db| (format!("postgresql:///{db}"), DatabaseUrlSource::Env)))
}
