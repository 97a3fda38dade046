//! Submitted form data.
//!
//! [`QueryDict`] holds URL-encoded form data with any number of values per
//! key. Multi-select fields read every value; everything else reads the last.

use std::collections::HashMap;

use taxi_core::{TaxiError, TaxiResult};

/// An immutable-by-default dictionary of submitted form data.
///
/// Parsed data is read-only. Build submissions with
/// [`new_mutable`](QueryDict::new_mutable) and [`append`](QueryDict::append).
///
/// # Examples
///
/// ```
/// use taxi_forms::QueryDict;
///
/// let qd = QueryDict::parse("drivers=1&drivers=3&model=Model+S");
/// assert_eq!(qd.get("model"), Some("Model S"));
/// assert_eq!(qd.get_list("drivers"), Some(&vec!["1".to_string(), "3".to_string()]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct QueryDict {
    data: HashMap<String, Vec<String>>,
    mutable: bool,
}

impl QueryDict {
    /// Creates a new, empty, immutable `QueryDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty, mutable `QueryDict`.
    pub fn new_mutable() -> Self {
        Self {
            data: HashMap::new(),
            mutable: true,
        }
    }

    /// Parses a URL-encoded string (`"key1=val1&key2=val2"`) into an immutable `QueryDict`.
    pub fn parse(query_string: &str) -> Self {
        let mut data: HashMap<String, Vec<String>> = HashMap::new();

        for pair in query_string.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            data.entry(percent_decode(key))
                .or_default()
                .push(percent_decode(value));
        }

        Self {
            data,
            mutable: false,
        }
    }

    /// Returns the last value for the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Returns all values for the given key.
    pub fn get_list(&self, key: &str) -> Option<&Vec<String>> {
        self.data.get(key)
    }

    /// Appends a value to the list for the given key.
    ///
    /// # Errors
    ///
    /// Returns [`TaxiError::SuspiciousOperation`] if this `QueryDict` is immutable.
    pub fn append(&mut self, key: &str, value: &str) -> TaxiResult<()> {
        self.check_mutable()?;
        self.data
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
        Ok(())
    }

    /// Returns `true` if this `QueryDict` is mutable.
    pub const fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the `QueryDict` contains no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if the specified key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    fn check_mutable(&self) -> TaxiResult<()> {
        if self.mutable {
            Ok(())
        } else {
            Err(TaxiError::SuspiciousOperation(
                "This QueryDict instance is immutable".to_string(),
            ))
        }
    }
}

/// Decodes a form-encoded component (`+` is a space).
fn percent_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}
