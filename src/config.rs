use crate::domain::models::DemoConnector;
use crate::error::{AppError, AppResult};
use std::collections::{HashMap, HashSet};
use std::env;
use uuid::Uuid;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3014)
    pub port: u16,
    /// Auth service URL for permission lookups; static grants are used when unset
    pub auth_service_url: Option<String>,
    /// Key sent as X-Internal-Api-Key to the auth service
    pub internal_api_key: Option<String>,
    /// JWT secret for token validation (optional - when not validating locally)
    pub jwt_secret: Option<String>,
    /// JSON catalog replacing the built-in connector types
    pub catalog_path: Option<String>,
    /// Connectors declared in configuration instead of storage
    pub demo_connectors: Vec<DemoConnector>,
    /// Per-user app grants for the static authorizer
    pub static_permissions: HashMap<Uuid, HashSet<String>>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let demo_connectors = match lookup("DEMO_CONNECTORS") {
            Some(raw) => parse_demo_connectors(&raw)?,
            None => Vec::new(),
        };
        let static_permissions = match lookup("STATIC_PERMISSIONS") {
            Some(raw) => parse_static_permissions(&raw)?,
            None => HashMap::new(),
        };

        Ok(Self {
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(3014),
            auth_service_url: lookup("AUTH_SERVICE_URL").filter(|u| !u.is_empty()),
            internal_api_key: lookup("INTERNAL_API_KEY"),
            jwt_secret: lookup("JWT_SECRET"),
            catalog_path: lookup("CONNECTOR_CATALOG_PATH").filter(|p| !p.is_empty()),
            demo_connectors,
            static_permissions,
        })
    }
}

/// Parse `[{"id": "...", "dialect": "...", ...}, ...]`, rejecting duplicate ids.
fn parse_demo_connectors(raw: &str) -> AppResult<Vec<DemoConnector>> {
    let connectors: Vec<DemoConnector> = serde_json::from_str(raw)
        .map_err(|e| AppError::Validation(format!("Invalid DEMO_CONNECTORS: {}", e)))?;

    let mut seen = HashSet::new();
    for connector in &connectors {
        if !seen.insert(connector.id.as_str()) {
            return Err(AppError::Validation(format!(
                "Invalid DEMO_CONNECTORS: duplicate id {}",
                connector.id
            )));
        }
    }
    Ok(connectors)
}

/// Parse `{"<user uuid>": ["app", ...], ...}`.
fn parse_static_permissions(raw: &str) -> AppResult<HashMap<Uuid, HashSet<String>>> {
    serde_json::from_str(raw)
        .map_err(|e| AppError::Validation(format!("Invalid STATIC_PERMISSIONS: {}", e)))
}
