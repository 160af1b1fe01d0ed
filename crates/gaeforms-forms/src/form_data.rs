//! Submitted form data.
//!
//! [`FormData`] is a multi-valued map from input names to the strings the
//! browser sent. Select-multiple inputs repeat their name once per selected
//! option, so every name maps to a list.

use gaeforms_core::utils::MultiValueDict;

/// Submitted form data.
///
/// # Examples
///
/// ```
/// use gaeforms_forms::form_data::FormData;
///
/// let data = FormData::parse("name=Jane+Doe&tags=a&tags=b&city=S%C3%A3o+Paulo");
/// assert_eq!(data.get("name"), Some("Jane Doe"));
/// assert_eq!(data.get_list("tags"), ["a", "b"]);
/// assert_eq!(data.get("city"), Some("São Paulo"));
/// assert!(data.get_list("missing").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormData {
    data: MultiValueDict<String, String>,
}

impl FormData {
    /// Creates empty form data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` body.
    pub fn parse(body: &str) -> Self {
        let mut data = MultiValueDict::new();
        for pair in body.split('&') {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            data.append(percent_decode(key), percent_decode(value));
        }
        Self { data }
    }

    /// Builds form data from `(name, value)` pairs. Repeated names keep all
    /// their values in order.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut data = MultiValueDict::new();
        for (k, v) in pairs {
            data.append(k.into(), v.into());
        }
        Self { data }
    }

    /// Returns the first value submitted under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.data.get(&name.to_string()).map(String::as_str)
    }

    /// Returns every value submitted under `name`, or an empty slice.
    pub fn get_list(&self, name: &str) -> &[String] {
        self.data
            .get_list(&name.to_string())
            .map_or(&[][..], Vec::as_slice)
    }

    /// Appends a value.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.data.append(name.into(), value.into());
    }

    /// Replaces all values of `name` with one value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.data.set(name.into(), value.into());
    }

    /// Returns `true` if anything was submitted under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.data.contains_key(&name.to_string())
    }

    /// Returns the submitted names in order of first appearance.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Returns the number of distinct names.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing was submitted.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn percent_decode(input: &str) -> String {
    // `+` is a space in form encoding.
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}
