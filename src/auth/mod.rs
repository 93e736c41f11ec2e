/*!
 * # Authentication and Authorization Module
 *
 * Bearer JWT authentication for the storefront API:
 *
 * - [`AuthService`] issues HS256 tokens and resolves them back to a stored user.
 * - [`auth_middleware`] attaches an [`AuthUser`] to authenticated requests.
 * - [`admin_middleware`] restricts a router to administrators.
 *
 * The user row is re-read on every request so that revoking admin rights or
 * deleting an account takes effect immediately.
 */

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entities::user::{self, Model as UserModel};
use crate::errors::ServiceError;

pub mod password;

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub jti: String, // JWT ID
    pub iat: i64,    // Issued at time
    pub exp: i64,    // Expiration time
    pub iss: String, // Issuer
    pub aud: String, // Audience
}

/// Authenticated caller, resolved from the token's user on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<&UserModel> for AuthUser {
    fn from(user: &UserModel) -> Self {
        Self {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_issuer: String,
        jwt_audience: String,
        token_ttl: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_issuer,
            jwt_audience,
            token_ttl,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration),
        )
    }
}

/// Authentication service that handles token issuance and validation
#[derive(Debug, Clone)]
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DatabaseConnection>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self { config, db }
    }

    /// Issues a signed access token for `user`.
    pub fn issue_token(&self, user: &UserModel) -> Result<String, AuthError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.config.token_ttl)
            .map_err(|_| AuthError::TokenCreation("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => {
                debug!(error = %e, "rejected bearer token");
                AuthError::InvalidToken
            }
        })
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let user = user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, "Failed to load token user");
                AuthError::DatabaseError(e.to_string())
            })?
            .ok_or(AuthError::UserNotFound)?;

        Ok(AuthUser::from(&user))
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not authorized, no token provided")]
    MissingToken,

    #[error("Not authorized, token failed")]
    InvalidToken,

    #[error("Not authorized, token expired")]
    TokenExpired,

    #[error("Not authorized, user not found")]
    UserNotFound,

    #[error("Not authorized to access this route (Admin only)")]
    InsufficientPermissions,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::TokenExpired
            | AuthError::UserNotFound => ServiceError::Unauthorized(err.to_string()),
            AuthError::InsufficientPermissions => ServiceError::Forbidden(err.to_string()),
            AuthError::TokenCreation(msg) | AuthError::DatabaseError(msg) => {
                ServiceError::InternalError(msg)
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ServiceError::from(self).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingToken)
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware that extracts and validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let Some(auth_service) = request.extensions().get::<Arc<AuthService>>().cloned() else {
        error!("AuthService extension missing from router");
        return ServiceError::InternalError("Authentication service not available".into())
            .into_response();
    };

    let Some(token) = bearer_token(request.headers()) else {
        return AuthError::MissingToken.into_response();
    };

    match auth_service.authenticate(token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Rejects authenticated non-admins with 403.
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingToken)?;

    if !user.is_admin {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_admin(self) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // `route_layer` leaves the method fallback alone, so an unsupported
    // method on a guarded path is still a 405 after routers are merged.
    fn with_auth(self) -> Self {
        self.route_layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_admin(self) -> Self {
        self.route_layer(axum::middleware::from_fn(admin_middleware))
            .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn service() -> AuthService {
        AuthService::new(
            AuthConfig::new(
                "k3J9-qpX2_vLm8RtZw4Yb7NcHf1DsGe6Ua0".into(),
                "storefront-api".into(),
                "storefront-clients".into(),
                Duration::from_secs(3600),
            ),
            Arc::new(DatabaseConnection::Disconnected),
        )
    }

    fn user() -> UserModel {
        UserModel {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password_hash: String::new(),
            is_admin: false,
            addresses: Default::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_round_trips() {
        let service = service();
        let user = user();
        let token = service.issue_token(&user).unwrap();
        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.iss, "storefront-api");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let mut other = service();
        other.config.jwt_secret = "a-completely-different-secret-value-42".into();
        let token = other.issue_token(&user()).unwrap();
        assert!(matches!(
            service().validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let service = service();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            iss: "storefront-api".into(),
            aud: "storefront-clients".into(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(service.config.jwt_secret.as_bytes()),
        )
        .unwrap();
        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  tok "));
        assert_eq!(bearer_token(&headers), Some("tok"));
    }

    #[test]
    fn auth_errors_map_to_http_categories() {
        assert_eq!(
            ServiceError::from(AuthError::MissingToken).status_code(),
            axum::http::StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::from(AuthError::InsufficientPermissions).status_code(),
            axum::http::StatusCode::FORBIDDEN
        );
    }
}
