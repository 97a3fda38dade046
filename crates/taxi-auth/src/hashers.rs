//! Password hashing and password validation.
//!
//! Hashing uses Argon2id. The work is CPU-bound, so [`make_password`] and
//! [`check_password`] run it on `tokio::task::spawn_blocking`.
//!
//! # Validators
//!
//! - [`MinimumLengthValidator`] - Enforces a minimum password length
//! - [`CommonPasswordValidator`] - Rejects common passwords
//! - [`NumericPasswordValidator`] - Rejects all-numeric passwords
//! - [`UserAttributeSimilarityValidator`] - Rejects passwords close to the
//!   account's username or name

use async_trait::async_trait;
use taxi_core::{TaxiError, TaxiResult};

/// Marker prefix for unusable passwords (accounts that cannot log in).
pub const UNUSABLE_PASSWORD_PREFIX: &str = "!";

/// Trait for password hashing backends.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// Returns the algorithm identifier.
    fn algorithm(&self) -> &str;

    /// Hashes a password and returns the encoded hash string.
    async fn hash(&self, password: &str) -> TaxiResult<String>;

    /// Verifies a password against an encoded hash.
    async fn verify(&self, password: &str, hash: &str) -> TaxiResult<bool>;

    /// Returns `true` if the hash should be re-hashed with current parameters.
    fn must_update(&self, hash: &str) -> bool;
}

/// Argon2id password hasher with the crate's default parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    fn algorithm(&self) -> &'static str {
        "argon2"
    }

    async fn hash(&self, password: &str) -> TaxiResult<String> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || {
            use argon2::password_hash::{rand_core::OsRng, PasswordHasher as _, SaltString};
            use argon2::Argon2;

            let salt = SaltString::generate(&mut OsRng);
            let hash = Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| TaxiError::InternalError(format!("Argon2 hash error: {e}")))?;
            Ok(hash.to_string())
        })
        .await
        .map_err(|e| TaxiError::InternalError(format!("Task join error: {e}")))?
    }

    async fn verify(&self, password: &str, hash: &str) -> TaxiResult<bool> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || {
            use argon2::password_hash::{PasswordHash, PasswordVerifier};
            use argon2::Argon2;

            let parsed = PasswordHash::new(&hash)
                .map_err(|e| TaxiError::InternalError(format!("Invalid hash: {e}")))?;
            Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok())
        })
        .await
        .map_err(|e| TaxiError::InternalError(format!("Task join error: {e}")))?
    }

    fn must_update(&self, hash: &str) -> bool {
        !hash.starts_with("$argon2id$")
    }
}

/// Hashes a password with Argon2id.
pub async fn make_password(password: &str) -> TaxiResult<String> {
    Argon2Hasher.hash(password).await
}

/// Checks a password against an encoded hash.
///
/// Unusable hashes never match. A hash in an unknown format is an error.
pub async fn check_password(password: &str, hash: &str) -> TaxiResult<bool> {
    if !is_password_usable(hash) {
        return Ok(false);
    }
    if !hash.starts_with("$argon2") {
        return Err(TaxiError::InternalError(format!(
            "Unknown password hashing algorithm for hash: {}",
            hash.chars().take(20).collect::<String>()
        )));
    }
    Argon2Hasher.verify(password, hash).await
}

/// Returns `true` if the encoded hash represents a usable password.
pub fn is_password_usable(hash: &str) -> bool {
    !hash.is_empty() && !hash.starts_with(UNUSABLE_PASSWORD_PREFIX)
}

/// Returns a random value that [`is_password_usable`] rejects.
pub fn make_unusable_password() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;

    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect();
    format!("{UNUSABLE_PASSWORD_PREFIX}{random}")
}

// ── Password Validators ──────────────────────────────────────────────

/// Checks one requirement on a new password.
pub trait PasswordValidator: Send + Sync {
    /// Validates a password, returning an error message if it fails.
    fn validate(&self, password: &str) -> Result<(), String>;

    /// Returns a description of this validator's requirement.
    fn get_help_text(&self) -> String;
}

/// Validates that a password has at least `min_length` characters.
#[derive(Debug, Clone)]
pub struct MinimumLengthValidator {
    /// The minimum allowed password length, in characters.
    pub min_length: usize,
}

impl Default for MinimumLengthValidator {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PasswordValidator for MinimumLengthValidator {
    fn validate(&self, password: &str) -> Result<(), String> {
        if password.chars().count() < self.min_length {
            Err(format!(
                "This password is too short. It must contain at least {} characters.",
                self.min_length
            ))
        } else {
            Ok(())
        }
    }

    fn get_help_text(&self) -> String {
        format!(
            "Your password must contain at least {} characters.",
            self.min_length
        )
    }
}

/// Validates that a password is not in a list of common passwords.
///
/// The comparison ignores case.
#[derive(Debug, Clone)]
pub struct CommonPasswordValidator {
    /// The lowercase passwords to reject.
    pub common_passwords: Vec<String>,
}

impl Default for CommonPasswordValidator {
    fn default() -> Self {
        Self {
            common_passwords: [
                "password", "password1", "123456", "12345678", "1234", "qwerty", "12345",
                "dragon", "baseball", "football", "letmein", "monkey", "abc123", "mustang",
                "michael", "shadow", "master", "jennifer", "111111", "2000", "jordan",
                "superman", "harley", "1234567", "hunter", "trustno1", "ranger", "buster",
                "thomas", "tigger", "robert", "soccer", "batman", "test", "pass", "hockey",
                "george", "charlie", "andrew", "michelle", "love", "sunshine", "jessica",
                "pepper", "daniel", "access", "123456789", "654321", "joshua", "maggie",
                "starwars", "silver", "william", "dallas", "yankees", "123123", "ashley",
                "666666", "hello", "amanda", "orange", "freedom", "computer", "thunder",
                "nicole", "ginger", "heather", "hammer", "summer", "corvette", "taylor",
                "austin", "1111", "merlin", "matthew", "121212", "golfer", "cheese",
                "princess", "martin", "chelsea", "patrick", "richard", "diamond", "yellow",
                "bigdog", "secret", "asdfgh", "sparky", "cowboy", "iloveyou", "admin",
                "welcome", "qwertyuiop", "passw0rd", "taxidriver",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl PasswordValidator for CommonPasswordValidator {
    fn validate(&self, password: &str) -> Result<(), String> {
        let lower = password.to_lowercase();
        if self.common_passwords.iter().any(|p| *p == lower) {
            Err("This password is too common.".to_string())
        } else {
            Ok(())
        }
    }

    fn get_help_text(&self) -> String {
        "Your password can't be a commonly used password.".to_string()
    }
}

/// Validates that a password is not entirely numeric.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumericPasswordValidator;

impl PasswordValidator for NumericPasswordValidator {
    fn validate(&self, password: &str) -> Result<(), String> {
        if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
            Err("This password is entirely numeric.".to_string())
        } else {
            Ok(())
        }
    }

    fn get_help_text(&self) -> String {
        "Your password can't be entirely numeric.".to_string()
    }
}

/// Validates that a password is not too similar to the account's details.
#[derive(Debug, Clone)]
pub struct UserAttributeSimilarityValidator {
    /// The similarity ratio (0.0 to 1.0) at which a password is rejected.
    pub max_similarity: f64,
}

impl Default for UserAttributeSimilarityValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl UserAttributeSimilarityValidator {
    /// Attributes shorter than this only count when the similarity ratio is high.
    const MIN_CONTAINED_LEN: usize = 3;

    /// Creates a validator with the default threshold of 0.7.
    pub const fn new() -> Self {
        Self {
            max_similarity: 0.7,
        }
    }

    /// Validates a password against the given attribute values.
    ///
    /// Empty attributes are ignored.
    pub fn validate_with_attributes(
        &self,
        password: &str,
        attribute_values: &[&str],
    ) -> Result<(), String> {
        let password = password.to_lowercase();
        for attr in attribute_values.iter().filter(|a| !a.is_empty()) {
            let attr = attr.to_lowercase();
            let contained = attr.chars().count() >= Self::MIN_CONTAINED_LEN
                && (password.contains(&attr) || attr.contains(&password));
            if contained || compute_similarity(&password, &attr) >= self.max_similarity {
                return Err(
                    "The password is too similar to your personal information.".to_string()
                );
            }
        }
        Ok(())
    }
}

impl PasswordValidator for UserAttributeSimilarityValidator {
    fn validate(&self, _password: &str) -> Result<(), String> {
        // needs the attributes, see validate_with_attributes
        Ok(())
    }

    fn get_help_text(&self) -> String {
        "Your password can't be too similar to your other personal information.".to_string()
    }
}

/// Similarity ratio between two strings, from 0.0 to 1.0.
///
/// Twice the longest common subsequence over the combined length.
fn compute_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
        curr.fill(0);
    }

    #[allow(clippy::cast_precision_loss)]
    let similarity = (2.0 * prev[b.len()] as f64) / (a.len() + b.len()) as f64;
    similarity
}

/// Validates a new password against every validator.
///
/// `attributes` are the account's own details (username, names) for the
/// similarity check. All failures are reported.
pub fn validate_password(
    password: &str,
    min_length: usize,
    attributes: &[&str],
) -> Result<(), Vec<String>> {
    let validators: Vec<Box<dyn PasswordValidator>> = vec![
        Box::new(MinimumLengthValidator { min_length }),
        Box::new(CommonPasswordValidator::default()),
        Box::new(NumericPasswordValidator),
    ];

    let mut errors: Vec<String> = validators
        .iter()
        .filter_map(|v| v.validate(password).err())
        .collect();
    if let Err(e) =
        UserAttributeSimilarityValidator::new().validate_with_attributes(password, attributes)
    {
        errors.insert(0, e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
