pub mod auth;

pub use auth::AuthClient;

use crate::error::AppResult;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Source of the app names a user is allowed to use.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn permitted_app_names(&self, user_id: Uuid) -> AppResult<HashSet<String>>;
}

/// Grants read from configuration, used when no auth service is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizer {
    grants: HashMap<Uuid, HashSet<String>>,
}

impl StaticAuthorizer {
    pub fn new(grants: HashMap<Uuid, HashSet<String>>) -> Self {
        Self { grants }
    }

    #[cfg(test)]
    pub fn grant(mut self, user_id: Uuid, app: impl Into<String>) -> Self {
        self.grants.entry(user_id).or_default().insert(app.into());
        self
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn permitted_app_names(&self, user_id: Uuid) -> AppResult<HashSet<String>> {
        Ok(self.grants.get(&user_id).cloned().unwrap_or_default())
    }
}
