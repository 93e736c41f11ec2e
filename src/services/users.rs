use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::entities::order::ShippingAddress;
use crate::entities::user::{self, SavedAddresses};
use crate::errors::ServiceError;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SaveAddressRequest {
    #[validate]
    pub address: ShippingAddress,
}

/// Returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub addresses: Vec<ShippingAddress>,
}

impl From<user::Model> for UserProfile {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            addresses: user.addresses.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAddressesResponse {
    pub message: String,
    pub addresses: Vec<ShippingAddress>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account registration, login and address book.
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
    config: Arc<AppConfig>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>, auth: Arc<AuthService>, config: Arc<AppConfig>) -> Self {
        Self { db, auth, config }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    fn authenticated(&self, user: user::Model) -> Result<AuthenticatedUser, ServiceError> {
        let token = self.auth.issue_token(&user)?;
        Ok(AuthenticatedUser {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            token,
        })
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthenticatedUser, ServiceError> {
        request.validate()?;
        let email = normalize_email(&request.email);

        if self.find_by_email(&email).await?.is_some() {
            return Err(ServiceError::AlreadyExists("User already exists".to_string()));
        }

        let password_hash = hash_password(request.password).await?;
        let now = Utc::now();
        let is_admin = self.config.is_admin_email(&email);

        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name.trim().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            is_admin: Set(is_admin),
            addresses: Set(SavedAddresses::default()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => {
                ServiceError::AlreadyExists("User already exists".to_string())
            }
            _ => ServiceError::DatabaseError(e),
        })?;

        info!(user_id = %user.id, is_admin, "user registered");
        self.authenticated(user)
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthenticatedUser, ServiceError> {
        let email = normalize_email(&request.email);
        let Some(user) = self.find_by_email(&email).await? else {
            warn!("login for unknown email");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(request.password, user.password_hash.clone()).await? {
            warn!(user_id = %user.id, "login with wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        self.authenticated(user)
    }

    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, ServiceError> {
        self.find_by_id(user_id).await.map(UserProfile::from)
    }

    /// Appends `request.address` to the caller's address book.
    #[instrument(skip(self, request))]
    pub async fn save_address(
        &self,
        user_id: Uuid,
        request: SaveAddressRequest,
    ) -> Result<SavedAddressesResponse, ServiceError> {
        request.validate()?;
        let user = self.find_by_id(user_id).await?;

        let mut addresses = user.addresses.clone();
        addresses.0.push(request.address);

        let mut active: user::ActiveModel = user.into();
        active.addresses = Set(addresses);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;

        Ok(SavedAddressesResponse {
            message: "Address saved".to_string(),
            addresses: updated.addresses.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Asha@Example.COM "), "asha@example.com");
    }

    #[test]
    fn register_request_rejects_short_password() {
        let request = RegisterRequest {
            name: "Asha".into(),
            email: "asha@example.com".into(),
            password: "123".into(),
        };
        let err = ServiceError::from(request.validate().unwrap_err());
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn register_request_rejects_bad_email() {
        let request = RegisterRequest {
            name: "Asha".into(),
            email: "not-an-email".into(),
            password: "secret123".into(),
        };
        assert!(request.validate().is_err());
    }
}
