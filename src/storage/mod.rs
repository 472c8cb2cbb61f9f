pub mod memory;

use crate::domain::models::{Connector, ConnectorUpdate, NewConnector};
use crate::error::AppResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence of connector records, always scoped to an organization.
///
/// Implementations enforce that connector names are unique per organization
/// and bump `last_modified` on every mutation.
#[async_trait]
pub trait ConnectorStore: Send + Sync {
    /// All connectors of the organization, ordered by id.
    async fn list_connectors(&self, organization_id: Uuid) -> AppResult<Vec<Connector>>;
    async fn get_connector(&self, organization_id: Uuid, id: i64) -> AppResult<Option<Connector>>;
    async fn create_connector(&self, organization_id: Uuid, connector: NewConnector) -> AppResult<Connector>;
    /// Returns `None` when no connector with this id belongs to the organization.
    async fn update_connector(
        &self,
        organization_id: Uuid,
        id: i64,
        update: ConnectorUpdate,
    ) -> AppResult<Option<Connector>>;
    async fn delete_connector(&self, organization_id: Uuid, id: i64) -> AppResult<bool>;
    /// Drop every connector owned by the organization; returns how many were removed.
    async fn delete_organization(&self, organization_id: Uuid) -> AppResult<usize>;
}
