use crate::domain::models::{Connector, ConnectorUpdate, NewConnector};
use crate::error::{AppError, AppResult};
use crate::storage::ConnectorStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::RwLock;
use uuid::Uuid;

struct Tables {
    next_id: i64,
    connectors: BTreeMap<i64, Connector>,
}

/// In-memory connector store for development and tests.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                next_id: 1,
                connectors: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Tables {
    fn name_taken(&self, organization_id: Uuid, name: &str, except: Option<i64>) -> bool {
        self.connectors.values().any(|c| {
            c.organization_id == organization_id && c.name == name && Some(c.id) != except
        })
    }
}

fn duplicate_name(name: &str) -> AppError {
    AppError::Conflict(format!("A connector named {} already exists", name))
}

#[async_trait]
impl ConnectorStore for InMemoryStore {
    async fn list_connectors(&self, organization_id: Uuid) -> AppResult<Vec<Connector>> {
        let tables = self.tables.read()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        Ok(tables.connectors.values()
            .filter(|c| c.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn get_connector(&self, organization_id: Uuid, id: i64) -> AppResult<Option<Connector>> {
        let tables = self.tables.read()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        Ok(tables.connectors.get(&id)
            .filter(|c| c.organization_id == organization_id)
            .cloned())
    }

    async fn create_connector(&self, organization_id: Uuid, connector: NewConnector) -> AppResult<Connector> {
        let mut tables = self.tables.write()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        if tables.name_taken(organization_id, &connector.name, None) {
            return Err(duplicate_name(&connector.name));
        }

        let id = tables.next_id;
        tables.next_id += 1;
        let record = Connector {
            id,
            name: connector.name,
            description: connector.description,
            dialect: connector.dialect,
            settings: connector.settings,
            last_modified: Utc::now(),
            organization_id,
        };
        tables.connectors.insert(id, record.clone());
        Ok(record)
    }

    async fn update_connector(
        &self,
        organization_id: Uuid,
        id: i64,
        update: ConnectorUpdate,
    ) -> AppResult<Option<Connector>> {
        let mut tables = self.tables.write()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        let owned = tables.connectors.get(&id)
            .is_some_and(|c| c.organization_id == organization_id);
        if !owned {
            return Ok(None);
        }
        if let Some(name) = &update.name {
            if tables.name_taken(organization_id, name, Some(id)) {
                return Err(duplicate_name(name));
            }
        }

        let Some(connector) = tables.connectors.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            connector.name = name;
        }
        if let Some(description) = update.description {
            connector.description = description;
        }
        if let Some(dialect) = update.dialect {
            connector.dialect = dialect;
        }
        if let Some(settings) = update.settings {
            connector.settings = settings;
        }
        connector.last_modified = Utc::now();
        Ok(Some(connector.clone()))
    }

    async fn delete_connector(&self, organization_id: Uuid, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.write()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        let owned = tables.connectors.get(&id)
            .is_some_and(|c| c.organization_id == organization_id);
        Ok(owned && tables.connectors.remove(&id).is_some())
    }

    async fn delete_organization(&self, organization_id: Uuid) -> AppResult<usize> {
        let mut tables = self.tables.write()
            .map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        let before = tables.connectors.len();
        tables.connectors.retain(|_, c| c.organization_id != organization_id);
        Ok(before - tables.connectors.len())
    }
}
