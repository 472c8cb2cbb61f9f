use crate::clients::Authorizer;
use crate::domain::catalog::ConnectorCatalog;
use crate::domain::models::{
    ConnectorCandidate, ConnectorId, DemoConnector, InstalledConnector, SkippedConnector,
};
use crate::error::{AppError, AppResult};
use crate::storage::ConnectorStore;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Optional restrictions on a listing; all set fields must hold.
#[derive(Debug, Clone, Default)]
pub struct ConnectorFilter {
    pub category: Option<String>,
    pub categories: Option<HashSet<String>>,
    pub dialect: Option<String>,
    pub interface: Option<String>,
    /// Only connectors this user is permitted to use.
    pub user: Option<Uuid>,
}

impl ConnectorFilter {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }

    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    pub fn user(mut self, user_id: Uuid) -> Self {
        self.user = Some(user_id);
        self
    }

    fn matches(&self, connector: &InstalledConnector, permitted: Option<&HashSet<String>>) -> bool {
        if let Some(category) = &self.category {
            if &connector.category != category {
                return false;
            }
        }
        if let Some(categories) = &self.categories {
            if !categories.contains(&connector.category) {
                return false;
            }
        }
        if let Some(dialect) = &self.dialect {
            if &connector.dialect != dialect {
                return false;
            }
        }
        if let Some(interface) = &self.interface {
            if connector.interface.as_ref() != Some(interface) {
                return false;
            }
        }
        if let Some(permitted) = permitted {
            if !permitted.contains(&connector.name) {
                return false;
            }
        }
        true
    }
}

/// Result of a listing: the usable connectors and those that were left out.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedConnectors {
    pub connectors: Vec<InstalledConnector>,
    pub skipped: Vec<SkippedConnector>,
}

/// Merges stored and demo connectors and attaches catalog metadata to them.
pub struct ConnectorResolver {
    catalog: Arc<ConnectorCatalog>,
    store: Arc<dyn ConnectorStore>,
    demo_connectors: Arc<Vec<DemoConnector>>,
    authorizer: Arc<dyn Authorizer>,
}

impl ConnectorResolver {
    pub fn new(
        catalog: Arc<ConnectorCatalog>,
        store: Arc<dyn ConnectorStore>,
        demo_connectors: Arc<Vec<DemoConnector>>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            catalog,
            store,
            demo_connectors,
            authorizer,
        }
    }

    /// List the installed connectors of an organization.
    ///
    /// Stored connectors come first (by id), then demo connectors in configuration
    /// order. Connectors whose dialect and interface match no catalog type are
    /// reported in `skipped` instead of failing the listing.
    pub async fn list_installed(
        &self,
        organization_id: Uuid,
        filter: &ConnectorFilter,
    ) -> AppResult<ResolvedConnectors> {
        let records = self.store.list_connectors(organization_id).await?;

        let mut candidates = Vec::with_capacity(records.len() + self.demo_connectors.len());
        for record in &records {
            candidates.push(ConnectorCandidate::from_record(record)?);
        }
        candidates.extend(self.demo_connectors.iter().map(ConnectorCandidate::from_demo));

        let mut resolved = ResolvedConnectors::default();
        for candidate in candidates {
            match self.enrich(candidate) {
                Ok(connector) => resolved.connectors.push(connector),
                Err(skipped) => resolved.skipped.push(skipped),
            }
        }

        let permitted = match filter.user {
            Some(user_id) => Some(self.authorizer.permitted_app_names(user_id).await?),
            None => None,
        };
        resolved
            .connectors
            .retain(|connector| filter.matches(connector, permitted.as_ref()));

        debug!(
            "Resolved {} connectors for organization {} ({} skipped)",
            resolved.connectors.len(),
            organization_id,
            resolved.skipped.len()
        );
        Ok(resolved)
    }

    /// Fetch one installed connector by id.
    pub async fn get_by_id(&self, organization_id: Uuid, id: &ConnectorId) -> AppResult<InstalledConnector> {
        let resolved = self.list_installed(organization_id, &ConnectorFilter::default()).await?;
        resolved
            .connectors
            .into_iter()
            .find(|connector| &connector.id == id)
            .ok_or_else(|| AppError::NotFound(format!("No connector with the id {} found.", id)))
    }

    fn enrich(&self, candidate: ConnectorCandidate) -> Result<InstalledConnector, SkippedConnector> {
        let Some(connector_type) = self
            .catalog
            .select_type(&candidate.dialect, candidate.interface.as_deref())
        else {
            warn!(
                "Skipping connector {} as connector dialect {} or interface {} are not installed",
                candidate.id,
                candidate.dialect,
                candidate.interface.as_deref().unwrap_or("none")
            );
            return Err(SkippedConnector {
                reason: format!(
                    "connector dialect {} or interface {} are not installed",
                    candidate.dialect,
                    candidate.interface.as_deref().unwrap_or("none")
                ),
                id: candidate.id,
                dialect: candidate.dialect,
                interface: candidate.interface,
            });
        };

        Ok(InstalledConnector {
            id: candidate.id,
            name: candidate.name,
            nice_name: candidate.nice_name,
            dialect: candidate.dialect,
            interface: candidate.interface,
            settings: candidate.settings,
            is_demo: candidate.is_demo,
            category: connector_type.category.clone(),
            description: connector_type.description.clone(),
            dialect_properties: connector_type.properties.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::StaticAuthorizer;
    use crate::domain::catalog::{CategoryDefinition, ConnectorType};
    use crate::domain::models::NewConnector;
    use crate::storage::memory::InMemoryStore;
    use serde_json::json;

    fn connector_type(name: &str, dialect: &str, interface: Option<&str>, category: &str) -> ConnectorType {
        ConnectorType {
            name: name.to_string(),
            dialect: dialect.to_string(),
            interface: interface.map(String::from),
            category: category.to_string(),
            description: format!("{} description", name),
            settings: Vec::new(),
            properties: json!({ "type_name": name }),
        }
    }

    fn category(category_type: &str) -> CategoryDefinition {
        CategoryDefinition {
            category_type: category_type.to_string(),
            name: category_type.to_string(),
            description: String::new(),
        }
    }

    fn catalog() -> Arc<ConnectorCatalog> {
        Arc::new(ConnectorCatalog::new(
            vec![category("editor"), category("browsers")],
            vec![
                connector_type("Hive", "hive", Some("hiveserver2"), "editor"),
                connector_type("MySQL", "mysql", Some("sqlalchemy"), "editor"),
                connector_type("MySQL Alt", "mysql", Some("jdbc"), "editor"),
                connector_type("HDFS", "hdfs", Some("rest"), "browsers"),
            ],
        ))
    }

    fn demo(id: &str, dialect: &str, interface: Option<&str>) -> DemoConnector {
        DemoConnector {
            id: id.to_string(),
            nice_name: None,
            dialect: dialect.to_string(),
            interface: interface.map(String::from),
            settings: json!([{ "name": "url", "value": "demo://" }]),
        }
    }

    struct Fixture {
        resolver: ConnectorResolver,
        store: Arc<InMemoryStore>,
        org: Uuid,
    }

    fn fixture(demos: Vec<DemoConnector>, authorizer: StaticAuthorizer) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let resolver = ConnectorResolver::new(
            catalog(),
            store.clone(),
            Arc::new(demos),
            Arc::new(authorizer),
        );
        Fixture {
            resolver,
            store,
            org: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_persisted_then_demo_order() {
        let f = fixture(vec![demo("hive-demo", "hive", None)], StaticAuthorizer::default());
        let a = f.store.create_connector(f.org, NewConnector::new("warehouse", "mysql")).await.unwrap();
        let b = f.store.create_connector(f.org, NewConnector::new("files", "hdfs")).await.unwrap();

        let resolved = f.resolver.list_installed(f.org, &ConnectorFilter::default()).await.unwrap();
        let ids: Vec<ConnectorId> = resolved.connectors.iter().map(|c| c.id.clone()).collect();
        assert_eq!(
            ids,
            vec![ConnectorId::Persisted(a.id), ConnectorId::Persisted(b.id), ConnectorId::from("hive-demo")]
        );
        assert!(resolved.skipped.is_empty());
        assert!(resolved.connectors[2].is_demo);
        assert_eq!(resolved.connectors[1].category, "browsers");
    }

    #[tokio::test]
    async fn test_last_scanned_dialect_match_is_used() {
        let f = fixture(Vec::new(), StaticAuthorizer::default());
        f.store.create_connector(f.org, NewConnector::new("warehouse", "mysql")).await.unwrap();

        let resolved = f.resolver.list_installed(f.org, &ConnectorFilter::default()).await.unwrap();
        assert_eq!(resolved.connectors[0].description, "MySQL Alt description");
        assert_eq!(resolved.connectors[0].dialect_properties, json!({ "type_name": "MySQL Alt" }));
    }

    #[tokio::test]
    async fn test_interface_only_match_enriches() {
        let f = fixture(vec![demo("webhdfs-demo", "webhdfs", Some("rest"))], StaticAuthorizer::default());

        let resolved = f.resolver.list_installed(f.org, &ConnectorFilter::default()).await.unwrap();
        assert_eq!(resolved.connectors.len(), 1);
        assert_eq!(resolved.connectors[0].category, "browsers");
        assert_eq!(resolved.connectors[0].description, "HDFS description");
        assert_eq!(resolved.connectors[0].dialect, "webhdfs");
    }

    #[tokio::test]
    async fn test_unmatched_connectors_are_skipped() {
        let f = fixture(vec![demo("odbc-demo", "oracle", Some("odbc"))], StaticAuthorizer::default());
        let stored = f.store.create_connector(f.org, NewConnector::new("legacy", "db2")).await.unwrap();
        f.store.create_connector(f.org, NewConnector::new("warehouse", "mysql")).await.unwrap();

        let resolved = f.resolver.list_installed(f.org, &ConnectorFilter::default()).await.unwrap();
        assert_eq!(resolved.connectors.len(), 1);
        assert_eq!(resolved.connectors[0].name, "warehouse");

        assert_eq!(resolved.skipped.len(), 2);
        assert_eq!(resolved.skipped[0].id, ConnectorId::Persisted(stored.id));
        assert_eq!(resolved.skipped[0].dialect, "db2");
        assert_eq!(resolved.skipped[1].interface.as_deref(), Some("odbc"));
    }

    #[tokio::test]
    async fn test_filters_are_conjunctive() {
        let f = fixture(vec![demo("hive-demo", "hive", None)], StaticAuthorizer::default());
        f.store.create_connector(f.org, NewConnector::new("warehouse", "mysql")).await.unwrap();
        f.store.create_connector(f.org, NewConnector::new("files", "hdfs")).await.unwrap();

        let mysql = f.resolver
            .list_installed(f.org, &ConnectorFilter::default().dialect("mysql"))
            .await
            .unwrap();
        assert_eq!(mysql.connectors.len(), 1);
        assert!(mysql.connectors.iter().all(|c| c.dialect == "mysql"));

        let both = f.resolver
            .list_installed(f.org, &ConnectorFilter::default().dialect("mysql").category("editor"))
            .await
            .unwrap();
        assert_eq!(both.connectors, mysql.connectors);

        let none = f.resolver
            .list_installed(f.org, &ConnectorFilter::default().dialect("mysql").category("browsers"))
            .await
            .unwrap();
        assert!(none.connectors.is_empty());
    }

    #[tokio::test]
    async fn test_categories_filter() {
        let f = fixture(vec![demo("hive-demo", "hive", None)], StaticAuthorizer::default());
        f.store.create_connector(f.org, NewConnector::new("files", "hdfs")).await.unwrap();

        let resolved = f.resolver
            .list_installed(f.org, &ConnectorFilter::default().categories(["browsers", "catalogs"]))
            .await
            .unwrap();
        let names: Vec<&str> = resolved.connectors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["files"]);
    }

    #[tokio::test]
    async fn test_interface_filter() {
        let f = fixture(
            vec![demo("hive-demo", "hive", Some("hiveserver2")), demo("hdfs-demo", "hdfs", None)],
            StaticAuthorizer::default(),
        );
        f.store.create_connector(f.org, NewConnector::new("warehouse", "hive")).await.unwrap();

        let resolved = f.resolver
            .list_installed(f.org, &ConnectorFilter::default().interface("hiveserver2"))
            .await
            .unwrap();
        let names: Vec<&str> = resolved.connectors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["hive-demo"]);
    }

    #[tokio::test]
    async fn test_user_filter_uses_permitted_app_names() {
        let user = Uuid::new_v4();
        let f = fixture(
            vec![demo("hive-demo", "hive", None)],
            StaticAuthorizer::default().grant(user, "warehouse"),
        );
        f.store.create_connector(f.org, NewConnector::new("warehouse", "mysql")).await.unwrap();
        f.store.create_connector(f.org, NewConnector::new("files", "hdfs")).await.unwrap();

        let resolved = f.resolver
            .list_installed(f.org, &ConnectorFilter::default().user(user))
            .await
            .unwrap();
        let names: Vec<&str> = resolved.connectors.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["warehouse"]);

        let stranger = f.resolver
            .list_installed(f.org, &ConnectorFilter::default().user(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(stranger.connectors.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let f = fixture(vec![demo("hive-demo", "hive", None)], StaticAuthorizer::default());
        let stored = f.store.create_connector(f.org, NewConnector::new("warehouse", "mysql")).await.unwrap();

        let found = f.resolver.get_by_id(f.org, &ConnectorId::Persisted(stored.id)).await.unwrap();
        assert_eq!(found.name, "warehouse");

        let demo = f.resolver.get_by_id(f.org, &ConnectorId::from("hive-demo")).await.unwrap();
        assert_eq!(demo.nice_name, "hive-demo");

        let missing = f.resolver.get_by_id(f.org, &ConnectorId::Persisted(999)).await;
        match missing {
            Err(AppError::NotFound(message)) => assert!(message.contains("999")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_ignores_skipped_connectors() {
        let f = fixture(Vec::new(), StaticAuthorizer::default());
        let stored = f.store.create_connector(f.org, NewConnector::new("legacy", "db2")).await.unwrap();

        let result = f.resolver.get_by_id(f.org, &ConnectorId::Persisted(stored.id)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_organizations_are_isolated() {
        let f = fixture(Vec::new(), StaticAuthorizer::default());
        f.store.create_connector(f.org, NewConnector::new("warehouse", "mysql")).await.unwrap();

        let other = f.resolver.list_installed(Uuid::new_v4(), &ConnectorFilter::default()).await.unwrap();
        assert!(other.connectors.is_empty());
    }

    #[tokio::test]
    async fn test_worked_example() {
        let catalog = Arc::new(ConnectorCatalog::new(
            vec![category("editor")],
            vec![
                connector_type("Hive", "hive", None, "editor"),
                connector_type("MySQL", "mysql", Some("sqlalchemy"), "editor"),
            ],
        ));
        let store = Arc::new(InMemoryStore::new());
        let org = Uuid::new_v4();
        let stored = store
            .create_connector(org, NewConnector::new("mysql-1", "mysql").with_settings("{}"))
            .await
            .unwrap();
        let resolver = ConnectorResolver::new(
            catalog,
            store,
            Arc::new(Vec::new()),
            Arc::new(StaticAuthorizer::default()),
        );

        let resolved = resolver.list_installed(org, &ConnectorFilter::default()).await.unwrap();
        assert_eq!(resolved.connectors.len(), 1);
        let connector = &resolved.connectors[0];
        assert_eq!(connector.id, ConnectorId::Persisted(stored.id));
        assert_eq!(connector.category, "editor");
        assert_eq!(connector.dialect_properties, json!({ "type_name": "MySQL" }));
        assert_eq!(connector.settings, json!({}));
    }
}
