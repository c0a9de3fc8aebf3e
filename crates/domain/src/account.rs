//! Storefront accounts.

use common::UserId;
use store::{NewUser, UserRecord, UserRepository};

use crate::error::{DomainError, ValidationError, optional_text, require_text};

/// Command to register a user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CreateUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: None,
            address: None,
        }
    }

    fn validate(self) -> Result<NewUser, ValidationError> {
        let email = require_text("email", &self.email)?;
        if !email.contains('@') {
            return Err(ValidationError::Malformed {
                field: "email",
                reason: "must contain '@'",
            });
        }
        Ok(NewUser {
            name: require_text("name", &self.name)?,
            email,
            phone: optional_text(self.phone.as_deref()),
            address: optional_text(self.address.as_deref()),
        })
    }
}

/// Service for registering and looking up users.
#[derive(Clone)]
pub struct UserService<S: UserRepository> {
    store: S,
}

impl<S: UserRepository> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a user. Emails are unique.
    #[tracing::instrument(skip(self), fields(email = %cmd.email))]
    pub async fn create_user(&self, cmd: CreateUser) -> Result<UserRecord, DomainError> {
        let user = self.store.insert_user(cmd.validate()?).await?;
        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, user_id: UserId) -> Result<UserRecord, DomainError> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }
}
