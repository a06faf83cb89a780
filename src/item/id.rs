use crate::item::InputError;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Validated item identifier
///
/// IDs are used verbatim as storage keys (for the filesystem backend, as file
/// names), so anything that could escape the artifact directory is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Validates and wraps a raw ID string
    ///
    /// # Errors
    ///
    /// * `InputError::EmptyId` - The ID is empty
    /// * `InputError::UnsafeId` - The ID contains path separators, control
    ///   characters, URL delimiters (`?`, `#`, `%`), `..`, or surrounding
    ///   whitespace
    pub fn new(raw: impl Into<String>) -> Result<Self, InputError> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(InputError::EmptyId);
        }

        if raw.trim() != raw
            || raw == "."
            || raw.contains("..")
            || raw
                .chars()
                .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control())
        {
            return Err(InputError::UnsafeId(raw));
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for ItemId {
    type Error = InputError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validates a sequence of raw IDs, dropping repeats
///
/// The first occurrence of each ID keeps its position. Any invalid ID fails
/// the whole sequence.
pub fn dedup_ids<I, S>(raw: I) -> Result<Vec<ItemId>, InputError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut ids = Vec::new();

    for value in raw {
        let id = ItemId::new(value)?;
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }

    Ok(ids)
}
