//! The user creation form.
//!
//! [`UserCreationForm`] asks for a username and a password typed twice. It
//! is the base that driver registration extends with more fields and
//! cleaners, so it exposes its [`BaseForm`] for composition.
//!
//! Validation steps, in order:
//!
//! 1. `username` must not be taken ([`UsernameUniqueCleaner`])
//! 2. `password2` must equal `password1` ([`PasswordMatchCleaner`])
//! 3. any field cleaners added by an extending form
//! 4. the password must pass [`validate_password`] ([`PasswordStrengthCleaner`]);
//!    failures are reported on `password2`

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use taxi_core::{TaxiError, TaxiResult, ValidationError};
use taxi_db::value::Value;
use taxi_forms::fields::{FormFieldDef, FormFieldType};
use taxi_forms::form::{BaseForm, FieldCleaner, Form, FormCleaner};
use taxi_forms::querydict::QueryDict;
use taxi_forms::validation::require_valid;
use taxi_forms::validators::{RegexValidator, Validator};
use taxi_forms::widgets::WidgetType;

use crate::hashers::validate_password;
use crate::user::{User, UserRepository};

const USERNAME_PATTERN: &str = r"^[\w.@+-]+\z";

static USERNAME_REGEX: LazyLock<RegexValidator> = LazyLock::new(|| {
    RegexValidator::new(USERNAME_PATTERN)
        .expect("valid regex")
        .with_message(
            "Enter a valid username. This value may contain only letters, numbers, \
             and @/./+/-/_ characters.",
            "invalid",
        )
});

/// Allows letters, digits, and `@ . + - _` only.
#[derive(Debug, Clone, Copy)]
pub struct UsernameValidator;

impl Validator for UsernameValidator {
    fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        USERNAME_REGEX.validate(value)
    }

    fn name(&self) -> &str {
        "UsernameValidator"
    }
}

/// Rejects usernames that already belong to an account.
pub struct UsernameUniqueCleaner {
    users: Arc<dyn UserRepository>,
}

impl UsernameUniqueCleaner {
    /// Creates a cleaner backed by the given repository.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl FieldCleaner for UsernameUniqueCleaner {
    fn field_name(&self) -> &str {
        "username"
    }

    async fn clean(&self, value: Value, _: &HashMap<String, Value>) -> TaxiResult<Value> {
        let username = value.as_str().unwrap_or_default();
        if self.users.username_exists(username).await? {
            return Err(TaxiError::ValidationError(ValidationError::new(
                "A user with that username already exists.",
                "unique",
            )));
        }
        Ok(value)
    }
}

/// Rejects a confirmation that differs from `password1`.
#[derive(Debug, Clone, Copy)]
pub struct PasswordMatchCleaner;

#[async_trait]
impl FieldCleaner for PasswordMatchCleaner {
    fn field_name(&self) -> &str {
        "password2"
    }

    async fn clean(&self, value: Value, cleaned_data: &HashMap<String, Value>) -> TaxiResult<Value> {
        match cleaned_data.get("password1") {
            Some(password1) if *password1 != value => Err(TaxiError::ValidationError(
                ValidationError::new("The two password fields didn't match.", "password_mismatch"),
            )),
            _ => Ok(value),
        }
    }
}

/// Runs the password validators against the confirmed password.
#[derive(Debug, Clone, Copy)]
pub struct PasswordStrengthCleaner {
    min_length: usize,
}

impl PasswordStrengthCleaner {
    /// Fields whose values the password must not resemble.
    const ATTRIBUTES: [&'static str; 4] = ["username", "first_name", "last_name", "email"];

    /// Creates a cleaner requiring at least `min_length` characters.
    pub const fn new(min_length: usize) -> Self {
        Self { min_length }
    }
}

#[async_trait]
impl FormCleaner for PasswordStrengthCleaner {
    async fn clean(&self, cleaned_data: &HashMap<String, Value>) -> Result<(), ValidationError> {
        // a mismatch already removed password2
        let Some(password) = cleaned_data.get("password2").and_then(Value::as_str) else {
            return Ok(());
        };
        let attributes: Vec<&str> = Self::ATTRIBUTES
            .iter()
            .filter_map(|name| cleaned_data.get(*name).and_then(Value::as_str))
            .collect();

        validate_password(password, self.min_length, &attributes).map_err(|messages| {
            let errors = messages
                .into_iter()
                .map(|m| ValidationError::new(m, "password_invalid"))
                .collect();
            ValidationError::with_field_errors(HashMap::from([("password2".to_string(), errors)]))
        })
    }
}

/// Registration form with username and password confirmation.
pub struct UserCreationForm {
    inner: BaseForm,
}

impl UserCreationForm {
    /// Creates a new user creation form.
    ///
    /// `min_password_length` usually comes from
    /// [`Settings::password_min_length`](taxi_core::Settings).
    pub fn new(users: Arc<dyn UserRepository>, min_password_length: usize) -> Self {
        let password = |name: &str, label: &str| {
            FormFieldDef::new(
                name,
                FormFieldType::Char {
                    min_length: None,
                    max_length: None,
                    strip: false,
                },
            )
            .label(label)
            .widget(WidgetType::PasswordInput)
        };

        let inner = BaseForm::new(vec![
            FormFieldDef::new("username", FormFieldType::char(Some(150)))
                .label("Username")
                .help_text("Required. 150 characters or fewer. Letters, digits and @/./+/-/_ only.")
                .validator(Box::new(UsernameValidator)),
            password("password1", "Password"),
            password("password2", "Password confirmation")
                .help_text("Enter the same password as before, for verification."),
        ])
        .with_field_cleaner(UsernameUniqueCleaner::new(users))
        .with_field_cleaner(PasswordMatchCleaner)
        .with_form_cleaner(PasswordStrengthCleaner::new(min_password_length));

        Self { inner }
    }

    /// Returns the underlying form.
    pub const fn base(&self) -> &BaseForm {
        &self.inner
    }

    /// Returns the underlying form for extension with fields and cleaners.
    pub fn base_mut(&mut self) -> &mut BaseForm {
        &mut self.inner
    }

    /// Returns the username from cleaned data.
    pub fn get_username(&self) -> Option<&str> {
        self.inner.cleaned_data().get("username").and_then(Value::as_str)
    }

    /// Returns the confirmed password from cleaned data.
    pub fn get_password(&self) -> Option<&str> {
        self.inner.cleaned_data().get("password1").and_then(Value::as_str)
    }

    /// Builds an unsaved account from the cleaned data, hashing the password.
    ///
    /// `first_name`, `last_name`, and `email` are copied when an extending
    /// form declares them.
    pub async fn build_user(&mut self) -> TaxiResult<User> {
        require_valid(self).await?;

        let text = |name: &str| {
            self.inner
                .cleaned_data()
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let mut user = User::new(text("username"));
        user.first_name = text("first_name");
        user.last_name = text("last_name");
        user.email = text("email");
        user.set_password(&text("password1")).await?;
        Ok(user)
    }
}

#[async_trait]
impl Form for UserCreationForm {
    fn fields(&self) -> &[FormFieldDef] {
        self.inner.fields()
    }

    fn initial(&self) -> &HashMap<String, Value> {
        self.inner.initial()
    }

    fn bind(&mut self, data: &QueryDict) {
        self.inner.bind(data);
    }

    fn is_bound(&self) -> bool {
        self.inner.is_bound()
    }

    fn is_validated(&self) -> bool {
        self.inner.is_validated()
    }

    async fn is_valid(&mut self) -> bool {
        self.inner.is_valid().await
    }

    fn errors(&self) -> &HashMap<String, Vec<String>> {
        self.inner.errors()
    }

    fn cleaned_data(&self) -> &HashMap<String, Value> {
        self.inner.cleaned_data()
    }

    fn add_error(&mut self, field: &str, message: String) {
        self.inner.add_error(field, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct Users(RwLock<Vec<User>>);

    #[async_trait]
    impl UserRepository for Users {
        async fn username_exists(&self, username: &str) -> TaxiResult<bool> {
            Ok(self.0.read().await.iter().any(|u| u.username == username))
        }

        async fn list_users(&self) -> TaxiResult<Vec<User>> {
            Ok(self.0.read().await.clone())
        }
    }

    fn form_with(existing: &[&str]) -> UserCreationForm {
        let users = Users(RwLock::new(existing.iter().map(|u| User::new(*u)).collect()));
        UserCreationForm::new(Arc::new(users), 8)
    }

    #[test]
    fn test_username_characters() {
        for ok in ["jdoe", "j.doe+taxi@fleet", "rené_1", "a-b"] {
            assert!(UsernameValidator.validate(&Value::from(ok)).is_ok(), "{ok}");
        }
        for bad in ["j doe", "jdoe!", "", "jdoe\n"] {
            assert!(UsernameValidator.validate(&Value::from(bad)).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_fields() {
        let form = form_with(&[]);
        let names: Vec<&str> = form.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["username", "password1", "password2"]);
        assert_eq!(form.fields()[1].widget, WidgetType::PasswordInput);
    }

    #[tokio::test]
    async fn test_valid_submission() {
        let mut form = form_with(&[]);
        form.bind(&QueryDict::parse(
            "username=+jdoe+&password1=Cobalt-Fern-71&password2=Cobalt-Fern-71",
        ));
        assert!(form.is_valid().await);
        assert_eq!(form.get_username(), Some("jdoe"));
        assert_eq!(form.get_password(), Some("Cobalt-Fern-71"));
    }

    #[tokio::test]
    async fn test_password_mismatch_on_password2() {
        let mut form = form_with(&[]);
        form.bind(&QueryDict::parse(
            "username=jdoe&password1=Cobalt-Fern-71&password2=Cobalt-Fern-72",
        ));
        assert!(!form.is_valid().await);
        assert_eq!(
            form.errors()["password2"],
            vec!["The two password fields didn't match.".to_string()]
        );
        assert_eq!(form.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_weak_password_errors_on_password2() {
        let mut form = form_with(&[]);
        form.bind(&QueryDict::parse("username=jdoe&password1=1234&password2=1234"));
        assert!(!form.is_valid().await);
        let errors = &form.errors()["password2"];
        assert!(errors.contains(&"This password is entirely numeric.".to_string()));
        assert!(errors.contains(&"This password is too common.".to_string()));
        assert!(!form.errors().contains_key("password1"));
    }

    #[tokio::test]
    async fn test_password_similar_to_username() {
        let mut form = form_with(&[]);
        form.bind(&QueryDict::parse(
            "username=kowalski&password1=Kowalski-77&password2=Kowalski-77",
        ));
        assert!(!form.is_valid().await);
        assert_eq!(
            form.errors()["password2"],
            vec!["The password is too similar to your personal information.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_username_taken_and_invalid() {
        let mut form = form_with(&["jdoe"]);
        form.bind(&QueryDict::parse(
            "username=jdoe&password1=Cobalt-Fern-71&password2=Cobalt-Fern-71",
        ));
        assert!(!form.is_valid().await);
        assert_eq!(
            form.errors()["username"],
            vec!["A user with that username already exists.".to_string()]
        );

        form.bind(&QueryDict::parse(
            "username=j%20doe%21&password1=Cobalt-Fern-71&password2=Cobalt-Fern-71",
        ));
        assert!(!form.is_valid().await);
        assert!(form.errors()["username"][0].starts_with("Enter a valid username."));
    }

    #[tokio::test]
    async fn test_password_is_not_stripped() {
        let mut form = form_with(&[]);
        form.bind(&QueryDict::parse(
            "username=jdoe&password1=Cobalt-Fern-71+&password2=Cobalt-Fern-71",
        ));
        assert!(!form.is_valid().await);
        assert!(form.errors().contains_key("password2"));
    }

    #[tokio::test]
    async fn test_build_user_hashes_password() {
        let mut form = form_with(&[]);
        form.bind(&QueryDict::parse(
            "username=jdoe&password1=Cobalt-Fern-71&password2=Cobalt-Fern-71",
        ));
        let user = form.build_user().await.unwrap();
        assert_eq!(user.username, "jdoe");
        assert_eq!(user.id, None);
        assert_ne!(user.password, "Cobalt-Fern-71");
        assert!(user.check_password("Cobalt-Fern-71").await.unwrap());
    }

    #[tokio::test]
    async fn test_build_user_rejects_invalid() {
        let mut form = form_with(&[]);
        assert!(matches!(
            form.build_user().await,
            Err(TaxiError::ValidationError(_))
        ));
    }
}
