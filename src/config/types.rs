use serde::Deserialize;
use url::Url;

/// One entry of the environment file, as written on disk.
///
/// Both the short (`api_url`, `api_key`) and the long (`endpoint_url`,
/// `credential`) field names are accepted.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EnvironmentEntry {
    pub env: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "endpoint_url")]
    pub api_url: Option<String>,
    #[serde(default, alias = "credential")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// A resolved environment ready for dispatch.
#[derive(Clone, PartialEq, Eq)]
pub struct Environment {
    pub env: String,
    pub name: Option<String>,
    pub endpoint_url: Url,
    pub credential: String,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("endpoint_url", &self.endpoint_url.as_str())
            .field("credential", &"****")
            .finish()
    }
}

/// `[[environments]]` tables in a TOML file.
#[derive(Debug, Default, Deserialize)]
pub(super) struct TomlEnvironments {
    #[serde(default)]
    pub(super) environments: Vec<EnvironmentEntry>,
}
