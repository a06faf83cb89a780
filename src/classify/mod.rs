//! Page classification
//!
//! Decides what a rendered page means for its item, using the site profile's
//! indicators. Checks run in a fixed order:
//!
//! 1. Removal patterns (first match wins)
//! 2. Present indicators (any literal occurrence)
//! 3. Otherwise inconclusive

use crate::profile::SiteProfile;

/// Outcome of classifying one rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The page shows the item's content
    Success,

    /// The page says the item is gone
    Removed {
        /// The removal pattern that matched
        pattern: String,
    },

    /// The page loaded but matched neither signal
    Inconclusive,
}

/// Classifies rendered HTML against an optional site profile
///
/// Without a profile any page with non-whitespace content is a success and
/// an empty page is inconclusive.
///
/// # Examples
///
/// ```
/// use page_harvest::classify::{classify, Classification};
/// use page_harvest::profile::SiteProfile;
///
/// let profile = SiteProfile::from_json(r#"{
///     "content": {
///         "present_indicators": ["Add to cart"],
///         "removed_indicators": ["404 Not Found"]
///     }
/// }"#).unwrap();
///
/// let html = "<h1>404 Not Found</h1><footer>Add to cart</footer>";
/// assert_eq!(
///     classify(html, Some(&profile)),
///     Classification::Removed { pattern: "404 Not Found".to_string() }
/// );
/// ```
pub fn classify(html: &str, profile: Option<&SiteProfile>) -> Classification {
    let Some(profile) = profile else {
        return if html.trim().is_empty() {
            Classification::Inconclusive
        } else {
            Classification::Success
        };
    };

    if let Some(regex) = profile
        .removed_patterns()
        .iter()
        .find(|regex| regex.is_match(html))
    {
        return Classification::Removed {
            pattern: regex.as_str().to_string(),
        };
    }

    if profile
        .present_indicators()
        .iter()
        .any(|indicator| html.contains(indicator.as_str()))
    {
        return Classification::Success;
    }

    Classification::Inconclusive
}
