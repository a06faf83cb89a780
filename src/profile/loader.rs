use crate::profile::{ProfileError, SiteProfile};
use std::path::Path;

/// Location the analysis step writes its profile to by default
pub const DEFAULT_PROFILE_PATH: &str = "site-profile.json";

/// Loads a site profile if the file exists
///
/// # Arguments
///
/// * `path` - Path to the profile JSON document
///
/// # Returns
///
/// * `Ok(Some(SiteProfile))` - The profile was loaded and validated
/// * `Ok(None)` - No file at `path`; fetches run without structural guidance
/// * `Err(ProfileError)` - The file exists but could not be read or is invalid
pub fn load_site_profile(path: &Path) -> Result<Option<SiteProfile>, ProfileError> {
    if !path.exists() {
        tracing::info!(
            "No site profile at {}, classifying without structural guidance",
            path.display()
        );
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let profile = SiteProfile::from_json(&content)?;

    for warning in profile.selector_warnings() {
        tracing::warn!("Site profile {}: {}", path.display(), warning);
    }

    tracing::info!(
        "Loaded site profile for '{}' ({} present indicators, {} removal patterns)",
        profile.domain(),
        profile.present_indicators().len(),
        profile.removed_patterns().len()
    );

    Ok(Some(profile))
}
