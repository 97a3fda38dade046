//! User accounts.
//!
//! A [`User`] holds the account fields every driver has. The repository
//! trait covers the lookups account forms need; stores implement it next to
//! their driver and car repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taxi_core::TaxiResult;

/// An account with a username and password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The primary key, `None` until saved.
    pub id: Option<i64>,
    /// Unique login name, at most 150 characters.
    pub username: String,
    /// The encoded password hash (or an unusable marker).
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    /// Inactive accounts cannot log in.
    pub is_active: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Creates an active, unsaved user with an unusable password.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            password: crate::hashers::make_unusable_password(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            is_staff: false,
            is_active: true,
            is_superuser: false,
            date_joined: Utc::now(),
        }
    }

    /// Hashes and stores a new password.
    pub async fn set_password(&mut self, raw_password: &str) -> TaxiResult<()> {
        self.password = crate::hashers::make_password(raw_password).await?;
        Ok(())
    }

    /// Checks a raw password against the stored hash.
    pub async fn check_password(&self, raw_password: &str) -> TaxiResult<bool> {
        crate::hashers::check_password(raw_password, &self.password).await
    }

    /// Returns `true` if this user has a usable password.
    pub fn has_usable_password(&self) -> bool {
        crate::hashers::is_password_usable(&self.password)
    }

    /// Returns first and last name separated by a space, trimmed.
    pub fn get_full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// The label used for this account in choice lists.
    pub fn display_name(&self) -> String {
        let full = self.get_full_name();
        if full.is_empty() {
            self.username.clone()
        } else {
            format!("{} ({full})", self.username)
        }
    }
}

/// Account lookups used by the account forms.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns `true` if an account with exactly this username exists.
    async fn username_exists(&self, username: &str) -> TaxiResult<bool>;

    /// Returns every account, ordered by primary key.
    async fn list_users(&self) -> TaxiResult<Vec<User>>;
}
