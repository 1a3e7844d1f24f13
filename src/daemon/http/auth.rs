//! HTTP API Authentication Middleware
//!
//! Resolves the caller identity from an API key. The middleware never
//! rejects; requests without a recognized key reach the handlers without an
//! identity and are turned away by the access gate.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::access::UserIdentity;
use crate::config::AuthConfig;

/// Header selecting the tenant the caller acts in
pub const TENANT_HEADER: &str = "securitytenant";

/// Shared state for authentication
#[derive(Clone, Default)]
pub struct AuthState {
    /// API key to identity
    users: Arc<HashMap<String, UserIdentity>>,
}

impl AuthState {
    pub fn new(users: HashMap<String, UserIdentity>) -> Self {
        Self {
            users: Arc::new(users),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config
                .users
                .iter()
                .map(|u| (u.api_key.clone(), u.identity()))
                .collect(),
        )
    }

    /// Look up the identity an API key authenticates as
    pub fn identify(&self, key: &str) -> Option<&UserIdentity> {
        self.users.get(key)
    }

    /// Resolve the caller from request headers.
    ///
    /// Supports `Authorization: Bearer <key>` or just `<key>`.
    pub fn resolve(&self, headers: &HeaderMap) -> Option<UserIdentity> {
        let key = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|h| h.strip_prefix("Bearer ").unwrap_or(h).trim())?;

        let mut user = self.identify(key)?.clone();
        if let Some(tenant) = headers.get(TENANT_HEADER).and_then(|h| h.to_str().ok()) {
            user.requested_tenant = Some(tenant.trim().to_string());
        }
        Some(user)
    }
}

/// Identity middleware
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match auth.resolve(request.headers()) {
        Some(user) => {
            debug!("Request authenticated as {}", user.name);
            request.extensions_mut().insert(user);
        }
        None => debug!("Request carries no recognized API key"),
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn auth() -> AuthState {
        let mut users = HashMap::new();
        users.insert(
            "secret123".to_string(),
            UserIdentity::new("admin").with_roles(vec!["all_access".into()]),
        );
        AuthState::new(users)
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn test_no_keys_configured() {
        let auth = AuthState::default();
        assert!(auth.resolve(&headers(&[("authorization", "anything")])).is_none());
    }

    #[test]
    fn test_bearer_and_bare_keys() {
        let auth = auth();
        let user = auth.resolve(&headers(&[("authorization", "Bearer secret123")])).unwrap();
        assert_eq!(user.name, "admin");
        assert_eq!(user.requested_tenant, None);
        assert!(auth.resolve(&headers(&[("authorization", "secret123")])).is_some());
        assert!(auth.resolve(&headers(&[("authorization", "wrong")])).is_none());
        assert!(auth.resolve(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_tenant_header() {
        let auth = auth();
        let user = auth
            .resolve(&headers(&[
                ("authorization", "secret123"),
                ("securitytenant", "global"),
            ]))
            .unwrap();
        assert_eq!(user.requested_tenant.as_deref(), Some("global"));
    }
}
