//! Server configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use access::{AccessPolicy, TokenFormat};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT `{0}`")]
    InvalidPort(String),
    #[error("invalid AUTH_TOKEN_FORMAT: {0}")]
    InvalidTokenFormat(String),
    #[error("{0} must name at least one route")]
    EmptyRouteList(&'static str),
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub cookie_secure: bool,
    pub token_format: TokenFormat,
    pub policy: AccessPolicy,
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `COOKIE_SECURE`: `true`/`false` (and `1`/`yes`/`on` variants), default false
    /// - `AUTH_TOKEN_FORMAT`: `compact` (default) or `jwt`
    /// - `GUARD_PROTECTED_ROUTES`: comma-separated protected prefixes
    /// - `GUARD_PUBLIC_ROUTES`: comma-separated public routes
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an unparseable port or token format, or a
    /// route override that lists no routes.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let cookie_secure = lookup("COOKIE_SECURE").as_deref().and_then(parse_bool).unwrap_or(false);

        let token_format = match lookup("AUTH_TOKEN_FORMAT") {
            Some(raw) => raw.parse::<TokenFormat>().map_err(ConfigError::InvalidTokenFormat)?,
            None => TokenFormat::default(),
        };

        let defaults = AccessPolicy::default();
        let protected = route_list(lookup("GUARD_PROTECTED_ROUTES"), "GUARD_PROTECTED_ROUTES")?
            .unwrap_or_else(|| defaults.protected_routes().to_vec());
        let public = route_list(lookup("GUARD_PUBLIC_ROUTES"), "GUARD_PUBLIC_ROUTES")?
            .unwrap_or_else(|| defaults.public_routes().to_vec());

        Ok(Self { port, cookie_secure, token_format, policy: AccessPolicy::new(protected, public) })
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn route_list(raw: Option<String>, var: &'static str) -> Result<Option<Vec<String>>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let routes: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_owned)
        .collect();
    if routes.is_empty() {
        return Err(ConfigError::EmptyRouteList(var));
    }
    Ok(Some(routes))
}
