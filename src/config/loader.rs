use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;
use url::Url;

use super::types::{Environment, EnvironmentEntry, TomlEnvironments};
use crate::error::{AppError, AppResult, ConfigError};

/// All environments declared in one file.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentSet {
    entries: Vec<EnvironmentEntry>,
}

/// Loads the environment file at `path`. The format is chosen by extension:
/// `.jsonl` (one entry per line), `.json` (array of entries) or `.toml`
/// (`[[environments]]` tables).
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed.
pub fn load_environments(path: &Path) -> AppResult<EnvironmentSet> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    let entries = match path.extension().and_then(|ext| ext.to_str()) {
        Some("jsonl") => parse_json_lines(path, &content)?,
        Some("json") => serde_json::from_str(&content).map_err(|err| {
            AppError::config(ConfigError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            })
        })?,
        Some("toml") => {
            let parsed: TomlEnvironments = toml::from_str(&content).map_err(|err| {
                AppError::config(ConfigError::ParseToml {
                    path: path.to_path_buf(),
                    source: err,
                })
            })?;
            parsed.environments
        }
        Some(ext) => {
            return Err(AppError::config(ConfigError::UnsupportedExtension {
                ext: ext.to_owned(),
            }));
        }
        None => return Err(AppError::config(ConfigError::MissingExtension)),
    };
    Ok(EnvironmentSet { entries })
}

fn parse_json_lines(path: &Path, content: &str) -> AppResult<Vec<EnvironmentEntry>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|err| {
                AppError::config(ConfigError::ParseJsonLine {
                    path: path.to_path_buf(),
                    line: idx.saturating_add(1),
                    source: err,
                })
            })
        })
        .collect()
}

impl EnvironmentSet {
    #[must_use]
    pub fn from_entries(entries: Vec<EnvironmentEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[EnvironmentEntry] {
        &self.entries
    }

    /// Resolves `env` to an endpoint and credential. `credential_override`
    /// replaces the credential stored in the file.
    ///
    /// # Errors
    ///
    /// Fails when any name in the file is duplicated, when `env` is absent
    /// or disabled, when its URL or credential is missing, or when the URL
    /// does not parse.
    pub fn lookup(&self, env: &str, credential_override: Option<&str>) -> AppResult<Environment> {
        self.ensure_unique()?;
        let entry = self
            .entries
            .iter()
            .find(|entry| entry.env == env)
            .ok_or_else(|| {
                AppError::config(ConfigError::UnknownEnvironment {
                    env: env.to_owned(),
                    available: self.available_names(),
                })
            })?;
        if entry.enabled == Some(false) {
            return Err(AppError::config(ConfigError::EnvironmentDisabled {
                env: env.to_owned(),
            }));
        }
        let raw_url = entry
            .api_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| missing_field(env, "api_url"))?;
        let credential = credential_override
            .or(entry.api_key.as_deref())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| missing_field(env, "api_key"))?;
        let endpoint_url = Url::parse(raw_url.trim()).map_err(|err| {
            AppError::config(ConfigError::InvalidEndpoint {
                env: env.to_owned(),
                url: raw_url.to_owned(),
                source: err,
            })
        })?;

        info!(
            "Using environment '{}'{} -> {}",
            entry.env,
            entry
                .name
                .as_deref()
                .map(|name| format!(" ({})", name))
                .unwrap_or_default(),
            endpoint_url
        );
        Ok(Environment {
            env: entry.env.clone(),
            name: entry.name.clone(),
            endpoint_url,
            credential: credential.to_owned(),
        })
    }

    /// Human-readable listing, one environment per line.
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| {
                let mut line = entry.env.clone();
                if let Some(name) = entry.name.as_deref() {
                    line.push_str(" (");
                    line.push_str(name);
                    line.push(')');
                }
                if let Some(url) = entry.api_url.as_deref() {
                    line.push_str(" -> ");
                    line.push_str(url);
                }
                if entry.enabled == Some(false) {
                    line.push_str(" [disabled]");
                }
                line
            })
            .collect()
    }

    fn ensure_unique(&self) -> AppResult<()> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in &self.entries {
            let count = counts.entry(entry.env.as_str()).or_insert(0);
            *count = count.saturating_add(1);
        }
        let conflicts: Vec<&str> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(env, _)| env)
            .collect();
        if conflicts.is_empty() {
            return Ok(());
        }
        Err(AppError::config(ConfigError::DuplicateEnvironment {
            conflicts: conflicts.join(", "),
        }))
    }

    fn available_names(&self) -> String {
        if self.entries.is_empty() {
            return "(none)".to_owned();
        }
        self.entries
            .iter()
            .map(|entry| entry.env.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn missing_field(env: &str, field: &'static str) -> AppError {
    AppError::config(ConfigError::MissingField {
        env: env.to_owned(),
        field,
    })
}
