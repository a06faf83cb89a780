use crate::item::{InputError, ItemId};
use std::fmt;
use url::Url;

/// Substitution point for the item ID
pub const PLACEHOLDER: &str = "{id}";

/// URL template with exactly one `{id}` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Parses a template string
    ///
    /// The placeholder count is checked here, and a probe substitution makes
    /// sure the result is an absolute http(s) URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_harvest::item::{ItemId, UrlTemplate};
    ///
    /// let template = UrlTemplate::new("https://example.com/items/{id}").unwrap();
    /// let id = ItemId::new("item-123").unwrap();
    /// assert_eq!(template.resolve(&id).unwrap().as_str(), "https://example.com/items/item-123");
    /// ```
    pub fn new(template: impl Into<String>) -> Result<Self, InputError> {
        let template = template.into();

        match template.matches(PLACEHOLDER).count() {
            0 => return Err(InputError::MissingPlaceholder(template)),
            1 => {}
            count => return Err(InputError::MultiplePlaceholders { template, count }),
        }

        let parsed = Self(template);
        parsed.substitute("probe")?;
        Ok(parsed)
    }

    /// Builds the fetch URL for an item
    pub fn resolve(&self, id: &ItemId) -> Result<Url, InputError> {
        self.substitute(id.as_str())
    }

    fn substitute(&self, value: &str) -> Result<Url, InputError> {
        let raw = self.0.replace(PLACEHOLDER, value);
        let url = Url::parse(&raw).map_err(|e| InputError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(InputError::InvalidUrl {
                url: raw,
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(url)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
