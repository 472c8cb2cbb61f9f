use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::response::{created_response, success_response};
use crate::domain::models::{Connector, ConnectorId, ConnectorUpdate, NewConnector};
use crate::domain::resolver::ConnectorFilter;
use crate::error::{AppError, AppResult};
use crate::middleware::{extract_identity, Identity};

/// Query string of GET /api/connectors
#[derive(Debug, Default, Deserialize)]
pub struct ListConnectorsQuery {
    pub category: Option<String>,
    /// Comma separated list of categories
    pub categories: Option<String>,
    pub dialect: Option<String>,
    pub interface: Option<String>,
    /// Only return connectors the caller is permitted to use
    #[serde(default)]
    pub for_user: bool,
}

impl ListConnectorsQuery {
    fn into_filter(self, identity: &Identity) -> ConnectorFilter {
        ConnectorFilter {
            category: self.category,
            categories: self.categories.map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(String::from)
                    .collect()
            }),
            dialect: self.dialect,
            interface: self.interface,
            user: self.for_user.then_some(identity.user_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConnectorRecordResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub dialect: String,
    pub settings: serde_json::Value,
    pub last_modified: String,
}

impl ConnectorRecordResponse {
    fn from_record(record: Connector) -> AppResult<Self> {
        Ok(Self {
            settings: record.parsed_settings()?,
            last_modified: record.last_modified.to_rfc3339(),
            id: record.id,
            name: record.name,
            description: record.description,
            dialect: record.dialect,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

fn identity(req: &HttpRequest, app_state: &crate::AppState) -> AppResult<Identity> {
    extract_identity(req, app_state.config.jwt_secret.as_deref())
}

/// Only stored connectors can be changed; demo connectors live in configuration.
fn persisted_id(raw: &str) -> AppResult<i64> {
    match ConnectorId::parse(raw) {
        ConnectorId::Persisted(id) => Ok(id),
        _ => Err(AppError::BadRequest(format!(
            "Connector {} is declared in configuration and cannot be modified",
            raw
        ))),
    }
}

fn warn_if_not_installed(app_state: &crate::AppState, dialect: &str) {
    if app_state.catalog.select_type(dialect, None).is_none() {
        warn!("Connector dialect {} is not installed; the connector will not be listed", dialect);
    }
}

/// List connector types grouped by category.
/// GET /api/connectors/types
pub async fn list_types(app_state: web::Data<crate::AppState>) -> HttpResponse {
    success_response(app_state.catalog.list_by_category())
}

/// Get the catalog entry of a dialect.
/// GET /api/connectors/types/{dialect}
pub async fn get_type(
    app_state: web::Data<crate::AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let dialect = path.into_inner();
    let connector_type = app_state.catalog.get_type(&dialect)
        .ok_or_else(|| AppError::NotFound(format!("No connector type with the dialect {} found.", dialect)))?;
    Ok(success_response(connector_type))
}

/// List installed connectors of the caller's organization.
/// GET /api/connectors
pub async fn list_connectors(
    req: HttpRequest,
    app_state: web::Data<crate::AppState>,
    query: web::Query<ListConnectorsQuery>,
) -> AppResult<HttpResponse> {
    let identity = identity(&req, &app_state)?;
    let filter = query.into_inner().into_filter(&identity);

    let resolved = app_state.resolver
        .list_installed(identity.organization_id, &filter)
        .await?;

    Ok(success_response(resolved))
}

/// Get one installed connector.
/// GET /api/connectors/{id}
pub async fn get_connector(
    req: HttpRequest,
    app_state: web::Data<crate::AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let identity = identity(&req, &app_state)?;
    let id = ConnectorId::parse(&path.into_inner());

    let connector = app_state.resolver.get_by_id(identity.organization_id, &id).await?;
    Ok(success_response(connector))
}

/// Create a connector.
/// POST /api/connectors
pub async fn create_connector(
    req: HttpRequest,
    app_state: web::Data<crate::AppState>,
    body: web::Json<NewConnector>,
) -> AppResult<HttpResponse> {
    let identity = identity(&req, &app_state)?;
    identity.require_admin()?;

    let new_connector = body.into_inner();
    new_connector.validate()?;
    warn_if_not_installed(&app_state, &new_connector.dialect);

    let record = app_state.store
        .create_connector(identity.organization_id, new_connector)
        .await?;

    info!(
        "Created connector {} ({}) in organization {}",
        record.id, record.dialect, identity.organization_id
    );

    Ok(created_response(ConnectorRecordResponse::from_record(record)?))
}

/// Update a connector.
/// PUT /api/connectors/{id}
pub async fn update_connector(
    req: HttpRequest,
    app_state: web::Data<crate::AppState>,
    path: web::Path<String>,
    body: web::Json<ConnectorUpdate>,
) -> AppResult<HttpResponse> {
    let identity = identity(&req, &app_state)?;
    identity.require_admin()?;
    let id = persisted_id(&path.into_inner())?;

    let update = body.into_inner();
    if update.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }
    update.validate()?;
    if let Some(dialect) = &update.dialect {
        warn_if_not_installed(&app_state, dialect);
    }

    let record = app_state.store
        .update_connector(identity.organization_id, id, update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No connector with the id {} found.", id)))?;

    info!("Updated connector {} in organization {}", id, identity.organization_id);

    Ok(success_response(ConnectorRecordResponse::from_record(record)?))
}

/// Delete a connector.
/// DELETE /api/connectors/{id}
pub async fn delete_connector(
    req: HttpRequest,
    app_state: web::Data<crate::AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let identity = identity(&req, &app_state)?;
    identity.require_admin()?;
    let id = persisted_id(&path.into_inner())?;

    if !app_state.store.delete_connector(identity.organization_id, id).await? {
        return Err(AppError::NotFound(format!("No connector with the id {} found.", id)));
    }

    info!("Deleted connector {} in organization {}", id, identity.organization_id);

    Ok(HttpResponse::Ok().json(DeleteResponse {
        success: true,
        message: format!("Connector {} deleted successfully", id),
    }))
}
