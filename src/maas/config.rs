pub const DEFAULT_API_VERSION: u32 = 1;

fn default_api_version() -> u32 {
    DEFAULT_API_VERSION
}

#[derive(Clone, serde::Deserialize)]
pub struct Config {
    /// Base URL of the API, e.g. `http://maas.local/MAAS/api/1.0`.
    pub api_url: url::Url,
    /// `key:token:secret`, or `@/path/to/file` holding it.
    pub api_key: String,
    #[serde(default = "default_api_version")]
    pub api_version: u32,
    /// Per-request timeout in seconds. Unset uses the transport default.
    pub timeout: Option<u64>,
}
