use serde::Deserialize;

/// Main configuration structure for Page-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetch: FetchConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Batch fetch tuning
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Fetch URL with one `{id}` placeholder
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// Number of fetch workers
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Pause each worker takes after every attempt (milliseconds)
    #[serde(rename = "inter-request-delay", default = "default_inter_request_delay")]
    pub inter_request_delay: u64,

    /// Additional attempts allowed after a retryable failure
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// First retry backoff (milliseconds), doubled for each further retry
    #[serde(rename = "backoff-base", default = "default_backoff_base")]
    pub backoff_base: u64,

    /// Upper bound for the retry backoff (milliseconds)
    #[serde(rename = "backoff-cap", default = "default_backoff_cap")]
    pub backoff_cap: u64,

    /// Time allowed for a single render (milliseconds)
    #[serde(rename = "render-timeout", default = "default_render_timeout")]
    pub render_timeout: u64,

    /// Time in-flight attempts get to finish after cancellation (milliseconds)
    #[serde(rename = "cancel-grace", default = "default_cancel_grace")]
    pub cancel_grace: u64,
}

/// Available page renderers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Plain HTTP GET, no script execution
    #[default]
    Http,
    /// Headless Chromium (requires the `chrome` feature)
    Chrome,
}

/// Page renderer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    #[serde(default)]
    pub kind: RendererKind,

    /// User agent override
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    /// Run the browser without a window (chrome only)
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Extra wait after navigation for scripts to settle (milliseconds, chrome only)
    #[serde(rename = "settle-time", default = "default_settle_time")]
    pub settle_time: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::default(),
            user_agent: None,
            headless: default_headless(),
            settle_time: default_settle_time(),
        }
    }
}

/// Available artifact store backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactBackend {
    /// One `<id>.html` file per item
    #[default]
    Filesystem,
    /// Single SQLite database
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub backend: ArtifactBackend,

    /// Directory for the filesystem backend
    #[serde(rename = "artifact-dir", default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Database file for the sqlite backend
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            backend: ArtifactBackend::default(),
            artifact_dir: default_artifact_dir(),
            database_path: default_database_path(),
        }
    }
}

/// Site profile location
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileConfig {
    /// Path to the profile JSON; a missing file means no profile
    #[serde(default = "default_profile_path")]
    pub path: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            path: default_profile_path(),
        }
    }
}

fn default_concurrency() -> u32 {
    1
}

fn default_inter_request_delay() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base() -> u64 {
    1000
}

fn default_backoff_cap() -> u64 {
    30_000
}

fn default_render_timeout() -> u64 {
    30_000
}

fn default_cancel_grace() -> u64 {
    5000
}

fn default_headless() -> bool {
    true
}

fn default_settle_time() -> u64 {
    1000
}

fn default_artifact_dir() -> String {
    "output".to_string()
}

fn default_database_path() -> String {
    "output/artifacts.db".to_string()
}

fn default_profile_path() -> String {
    crate::profile::DEFAULT_PROFILE_PATH.to_string()
}
