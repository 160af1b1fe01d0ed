//! Entity keys.
//!
//! A [`Key`] is a path of `(kind, id)` pairs from the root ancestor down to
//! the entity, plus an optional namespace. Forms use [`Key::urlsafe`] as the
//! option value of key selects, so the encoding must round-trip through
//! [`Key::from_urlsafe`].

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use gaeforms_core::{GaeError, GaeResult};
use serde::{Deserialize, Serialize};

/// The id part of a key path element: a numeric id or a string name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyId {
    /// A numeric id. Zero marks an incomplete key.
    Int(i64),
    /// A string name.
    Name(String),
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Name(n) => write!(f, "'{n}'"),
        }
    }
}

impl From<i64> for KeyId {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for KeyId {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for KeyId {
    fn from(v: &str) -> Self {
        Self::Name(v.to_string())
    }
}

impl From<String> for KeyId {
    fn from(v: String) -> Self {
        Self::Name(v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
struct PathElement {
    kind: String,
    id: KeyId,
}

/// A datastore key.
///
/// # Examples
///
/// ```
/// use gaeforms_datastore::key::{Key, KeyId};
///
/// let parent = Key::new("Author", "jane");
/// let key = Key::new("Book", 42).with_parent(&parent);
/// assert_eq!(key.kind(), "Book");
/// assert_eq!(key.id(), &KeyId::Int(42));
/// assert_eq!(key.parent(), Some(parent));
///
/// let encoded = key.urlsafe();
/// assert_eq!(Key::from_urlsafe(&encoded).unwrap(), key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
    path: Vec<PathElement>,
}

impl Key {
    /// Creates a root key for the given kind and id.
    pub fn new(kind: impl Into<String>, id: impl Into<KeyId>) -> Self {
        Self {
            namespace: None,
            path: vec![PathElement {
                kind: kind.into(),
                id: id.into(),
            }],
        }
    }

    /// Places this key under `parent`, keeping the parent's namespace.
    #[must_use]
    pub fn with_parent(mut self, parent: &Self) -> Self {
        let mut path = parent.path.clone();
        path.append(&mut self.path);
        self.path = path;
        self.namespace.clone_from(&parent.namespace);
        self
    }

    /// Sets the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Returns the kind of the entity this key points to.
    pub fn kind(&self) -> &str {
        self.last().map_or("", |e| e.kind.as_str())
    }

    /// Returns the id (or name) of the entity this key points to.
    pub fn id(&self) -> &KeyId {
        const INCOMPLETE: KeyId = KeyId::Int(0);
        self.last().map_or(&INCOMPLETE, |e| &e.id)
    }

    /// Returns the namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the parent key, or `None` for a root key.
    pub fn parent(&self) -> Option<Self> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Self {
            namespace: self.namespace.clone(),
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }

    /// Returns `true` when the key has a name or a non-zero numeric id.
    pub fn is_complete(&self) -> bool {
        !matches!(self.id(), KeyId::Int(0))
    }

    /// Returns a copy of this key with its final id replaced.
    #[must_use]
    pub fn with_id(&self, id: impl Into<KeyId>) -> Self {
        let mut key = self.clone();
        if let Some(last) = key.path.last_mut() {
            last.id = id.into();
        }
        key
    }

    /// Encodes the key as a URL-safe string.
    ///
    /// The encoding carries the full ancestor path and namespace so that it
    /// identifies the entity unambiguously.
    pub fn urlsafe(&self) -> String {
        // Serializing a struct of strings and integers cannot fail.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Decodes a key produced by [`Key::urlsafe`].
    pub fn from_urlsafe(encoded: &str) -> GaeResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|e| GaeError::InvalidKey(format!("{encoded:?}: {e}")))?;
        let key: Self = serde_json::from_slice(&bytes)
            .map_err(|e| GaeError::InvalidKey(format!("{encoded:?}: {e}")))?;
        if key.path.is_empty() {
            return Err(GaeError::InvalidKey(format!("{encoded:?}: empty path")));
        }
        Ok(key)
    }

    fn last(&self) -> Option<&PathElement> {
        self.path.last()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key(")?;
        for (i, element) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}', {}", element.kind, element.id)?;
        }
        write!(f, ")")
    }
}
