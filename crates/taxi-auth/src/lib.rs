//! # taxi-auth
//!
//! Accounts for taxi-rs:
//!
//! - **Password hashing** with Argon2id (`hashers`)
//! - **Password validators** for length, common passwords, numeric-only
//!   passwords, and similarity to the account's own details (`hashers`)
//! - **User accounts** and the [`UserRepository`] lookups the forms need (`user`)
//! - **The user creation form** that driver registration builds on (`forms`)
//!
//! All CPU-bound hashing runs on `tokio::task::spawn_blocking`.

// - result_large_err: TaxiError is the crate-wide error type
#![allow(clippy::result_large_err)]

pub mod forms;
pub mod hashers;
pub mod user;

pub use forms::UserCreationForm;
pub use hashers::{
    check_password, is_password_usable, make_password, make_unusable_password, validate_password,
    PasswordHasher,
};
pub use user::{User, UserRepository};
