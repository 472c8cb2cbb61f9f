use crate::clients::Authorizer;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Client for communicating with the auth service.
pub struct AuthClient {
    client: Client,
    base_url: String,
    internal_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PermissionsResponse {
    apps: Vec<String>,
}

impl AuthClient {
    /// Create with internal API key for S2S authentication.
    pub fn with_api_key(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            internal_api_key: api_key,
        }
    }

    fn permissions_url(&self, user_id: Uuid) -> String {
        format!(
            "{}/api/auth/internal/permissions/{}",
            self.base_url.trim_end_matches('/'),
            user_id
        )
    }
}

#[async_trait]
impl Authorizer for AuthClient {
    /// Calls: GET {AUTH_SERVICE_URL}/api/auth/internal/permissions/{user_id}
    async fn permitted_app_names(&self, user_id: Uuid) -> AppResult<HashSet<String>> {
        let url = self.permissions_url(user_id);

        debug!("Fetching permissions from: {}", url);

        let mut request = self.client.get(&url);

        // Add internal API key if configured
        if let Some(ref api_key) = self.internal_api_key {
            request = request.header("X-Internal-Api-Key", api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Auth service request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Auth service returned {}: {}",
                status, body
            )));
        }

        let permissions: PermissionsResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse auth response: {}", e)))?;

        Ok(permissions.apps.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions_url() {
        let client = AuthClient::with_api_key("http://localhost:3010/".to_string(), None);
        let user = Uuid::nil();
        assert_eq!(
            client.permissions_url(user),
            "http://localhost:3010/api/auth/internal/permissions/00000000-0000-0000-0000-000000000000"
        );
    }
}
