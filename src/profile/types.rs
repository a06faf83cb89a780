use crate::profile::ProfileError;
use regex::Regex;
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Site profile document as written by the analysis step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDocument {
    /// Site the profile was derived from
    #[serde(default)]
    pub domain: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<String>,

    pub content: ContentSpec,

    #[serde(default)]
    pub boilerplate: BoilerplateSpec,

    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,

    #[serde(default, alias = "scopeMode")]
    pub scope_mode: ScopeMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Content recognition rules
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSpec {
    /// Selector for the primary content container
    #[serde(default, alias = "mainSelector")]
    pub main_selector: String,

    /// Literal text fragments that only appear on loaded content pages
    #[serde(default, alias = "presentIndicators")]
    pub present_indicators: Vec<String>,

    /// Regular expressions matching removed/unavailable messages
    #[serde(default, alias = "removedIndicators")]
    pub removed_indicators: Vec<String>,
}

/// Regions to strip before extraction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoilerplateSpec {
    #[serde(default, alias = "excludeSelectors")]
    pub exclude_selectors: Vec<String>,
}

/// Extraction descriptor for one field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub selector: String,

    #[serde(rename = "type", default)]
    pub kind: FieldKind,

    /// Attribute name, only meaningful for `FieldKind::Attribute`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Attribute,
    Html,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeMode {
    #[default]
    Full,
    Selective,
}

/// A loaded site profile with its removal patterns compiled
///
/// Construct with [`SiteProfile::from_document`] or
/// [`SiteProfile::from_json`]; both reject patterns that would make
/// classification meaningless.
#[derive(Debug, Clone)]
pub struct SiteProfile {
    document: ProfileDocument,
    removed_patterns: Vec<Regex>,
}

impl SiteProfile {
    /// Validates a document and compiles its removal patterns
    ///
    /// Empty indicators are rejected: an empty literal occurs in every page
    /// and an empty pattern matches every page.
    pub fn from_document(document: ProfileDocument) -> Result<Self, ProfileError> {
        if document
            .content
            .present_indicators
            .iter()
            .any(|s| s.is_empty())
        {
            return Err(ProfileError::Validation(
                "present_indicators cannot contain empty strings".to_string(),
            ));
        }

        let mut removed_patterns = Vec::with_capacity(document.content.removed_indicators.len());
        for pattern in &document.content.removed_indicators {
            if pattern.is_empty() {
                return Err(ProfileError::Validation(
                    "removed_indicators cannot contain empty patterns".to_string(),
                ));
            }

            let regex = Regex::new(pattern).map_err(|source| ProfileError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            removed_patterns.push(regex);
        }

        Ok(Self {
            document,
            removed_patterns,
        })
    }

    /// Parses and validates a profile from JSON text
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let document: ProfileDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn document(&self) -> &ProfileDocument {
        &self.document
    }

    pub fn domain(&self) -> &str {
        &self.document.domain
    }

    pub fn main_selector(&self) -> &str {
        &self.document.content.main_selector
    }

    pub fn present_indicators(&self) -> &[String] {
        &self.document.content.present_indicators
    }

    /// Compiled removal patterns, in profile order
    pub fn removed_patterns(&self) -> &[Regex] {
        &self.removed_patterns
    }

    pub fn exclude_selectors(&self) -> &[String] {
        &self.document.boilerplate.exclude_selectors
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldSpec> {
        &self.document.fields
    }

    pub fn scope_mode(&self) -> ScopeMode {
        self.document.scope_mode
    }

    /// Lists selectors that do not parse as CSS
    ///
    /// Selectors are not evaluated here, so these are reported rather than
    /// rejected; downstream extraction is the one that will trip over them.
    pub fn selector_warnings(&self) -> Vec<String> {
        let main = std::iter::once(("content.main_selector".to_string(), self.main_selector()));
        let excluded = self
            .exclude_selectors()
            .iter()
            .map(|s| ("boilerplate.exclude_selectors".to_string(), s.as_str()));
        let fields = self
            .fields()
            .iter()
            .map(|(name, field)| (format!("fields.{}", name), field.selector.as_str()));

        main.chain(excluded)
            .chain(fields)
            .filter(|(_, selector)| !selector.trim().is_empty())
            .filter_map(|(location, selector)| {
                Selector::parse(selector)
                    .err()
                    .map(|e| format!("{}: '{}' is not a valid selector ({:?})", location, selector, e))
            })
            .collect()
    }
}
