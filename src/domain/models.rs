use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const MAX_NAME_LEN: usize = 255;
const MAX_DIALECT_LEN: usize = 32;

/// Identifier of a resolved connector.
///
/// Persisted connectors carry the id assigned by the store, demo connectors
/// the key they were declared under in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectorId {
    Persisted(i64),
    Demo(String),
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorId::Persisted(id) => write!(f, "{}", id),
            ConnectorId::Demo(id) => write!(f, "{}", id),
        }
    }
}

impl ConnectorId {
    /// Interpret a path segment: integers name stored connectors, anything else a demo key.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(id) => ConnectorId::Persisted(id),
            Err(_) => ConnectorId::Demo(raw.to_string()),
        }
    }
}

impl From<&str> for ConnectorId {
    fn from(id: &str) -> Self {
        ConnectorId::Demo(id.to_string())
    }
}

/// One entry of a connector settings template, e.g. `{"name": "url", "value": "mysql://..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorSetting {
    pub name: String,
    pub value: serde_json::Value,
}

/// A connector instance stored for an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connector {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub dialect: String,
    /// Serialized JSON configuration blob.
    pub settings: String,
    pub last_modified: DateTime<Utc>,
    pub organization_id: Uuid,
}

impl Connector {
    /// Parse the settings blob.
    pub fn parsed_settings(&self) -> AppResult<serde_json::Value> {
        serde_json::from_str(&self.settings).map_err(|e| {
            AppError::Internal(format!("Connector {} has malformed settings: {}", self.id, e))
        })
    }
}

/// Fields required to create a connector.
#[derive(Debug, Clone, Deserialize)]
pub struct NewConnector {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub dialect: String,
    #[serde(default = "default_settings")]
    pub settings: String,
}

fn default_settings() -> String {
    "{}".to_string()
}

impl NewConnector {
    pub fn new(name: impl Into<String>, dialect: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            dialect: dialect.into(),
            settings: default_settings(),
        }
    }

    pub fn with_settings(mut self, settings: impl Into<String>) -> Self {
        self.settings = settings.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check field lengths and that the settings blob is JSON.
    pub fn validate(&self) -> AppResult<()> {
        validate_name(&self.name)?;
        validate_dialect(&self.dialect)?;
        validate_settings(&self.settings)
    }
}

/// Partial update of a connector; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectorUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub dialect: Option<String>,
    pub settings: Option<String>,
}

impl ConnectorUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(dialect) = &self.dialect {
            validate_dialect(dialect)?;
        }
        if let Some(settings) = &self.settings {
            validate_settings(settings)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.dialect.is_none() && self.settings.is_none()
    }
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Connector name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Connector name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}

fn validate_dialect(dialect: &str) -> AppResult<()> {
    if dialect.trim().is_empty() {
        return Err(AppError::Validation("Connector dialect must not be empty".to_string()));
    }
    if dialect.chars().count() > MAX_DIALECT_LEN {
        return Err(AppError::Validation(format!(
            "Connector dialect must be at most {} characters",
            MAX_DIALECT_LEN
        )));
    }
    Ok(())
}

fn validate_settings(settings: &str) -> AppResult<()> {
    serde_json::from_str::<serde_json::Value>(settings)
        .map(|_| ())
        .map_err(|e| AppError::Validation(format!("Connector settings must be valid JSON: {}", e)))
}

/// A connector declared in the process configuration rather than stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConnector {
    pub id: String,
    #[serde(default)]
    pub nice_name: Option<String>,
    pub dialect: String,
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// A connector merged from storage or configuration, before catalog lookup.
#[derive(Debug, Clone)]
pub struct ConnectorCandidate {
    pub id: ConnectorId,
    pub name: String,
    pub nice_name: String,
    pub dialect: String,
    pub interface: Option<String>,
    pub settings: serde_json::Value,
    pub is_demo: bool,
}

impl ConnectorCandidate {
    pub fn from_record(record: &Connector) -> AppResult<Self> {
        Ok(Self {
            id: ConnectorId::Persisted(record.id),
            name: record.name.clone(),
            nice_name: record.name.clone(),
            dialect: record.dialect.clone(),
            interface: None,
            settings: record.parsed_settings()?,
            is_demo: false,
        })
    }

    pub fn from_demo(demo: &DemoConnector) -> Self {
        Self {
            id: ConnectorId::Demo(demo.id.clone()),
            name: demo.id.clone(),
            nice_name: demo
                .nice_name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| demo.id.clone()),
            dialect: demo.dialect.clone(),
            interface: demo.interface.clone(),
            settings: demo.settings.clone(),
            is_demo: true,
        }
    }
}

/// A connector enriched with metadata from its catalog type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstalledConnector {
    pub id: ConnectorId,
    pub name: String,
    pub nice_name: String,
    pub dialect: String,
    pub interface: Option<String>,
    pub settings: serde_json::Value,
    pub is_demo: bool,
    pub category: String,
    pub description: String,
    pub dialect_properties: serde_json::Value,
}

/// A candidate left out of a listing because no catalog type matched it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedConnector {
    pub id: ConnectorId,
    pub dialect: String,
    pub interface: Option<String>,
    pub reason: String,
}
