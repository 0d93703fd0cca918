use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use shared::{domain::ActionId, protocol::ACTIONS_COLLECTION};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CONFIG_FILE: &str = "greensteps.toml";

/// Where the actions collection lives and how its paths are spelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    base_url: Url,
    collection: Vec<String>,
    trailing_slash: bool,
    timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    base_url: Option<String>,
    collection: Option<String>,
    trailing_slash: Option<bool>,
    timeout_secs: Option<u64>,
}

impl ClientSettings {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            collection: split_segments(ACTIONS_COLLECTION),
            trailing_slash: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn with_trailing_slash(mut self, trailing_slash: bool) -> Self {
        self.trailing_slash = trailing_slash;
        self
    }

    pub fn with_collection(mut self, collection: &str) -> Result<Self> {
        let segments = split_segments(collection);
        if segments.is_empty() {
            bail!("collection path must not be empty");
        }
        self.collection = segments;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `greensteps.toml` (or the file named by `GREENSTEPS_CONFIG`) and then applies
    /// `GREENSTEPS_*` environment overrides.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var("GREENSTEPS_CONFIG").ok().map(PathBuf::from);
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
        let raw = if explicit.is_some() || path.exists() {
            Some(
                fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
            )
        } else {
            None
        };
        Self::from_sources(raw.as_deref(), |key| std::env::var(key).ok())
    }

    pub(crate) fn from_sources(
        file: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file_cfg: FileSettings = match file {
            Some(raw) => toml::from_str(raw).context("failed to parse client settings file")?,
            None => FileSettings::default(),
        };

        let base_url = env("GREENSTEPS_API_URL")
            .or(file_cfg.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut settings = Self::new(&base_url)?;

        if let Some(collection) = env("GREENSTEPS_COLLECTION").or(file_cfg.collection) {
            settings = settings.with_collection(&collection)?;
        }

        let trailing_slash = match env("GREENSTEPS_TRAILING_SLASH") {
            Some(raw) => Some(parse_flag(&raw).context("invalid GREENSTEPS_TRAILING_SLASH")?),
            None => file_cfg.trailing_slash,
        };
        if let Some(trailing_slash) = trailing_slash {
            settings = settings.with_trailing_slash(trailing_slash);
        }

        let timeout_secs = match env("GREENSTEPS_TIMEOUT_SECS") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("invalid GREENSTEPS_TIMEOUT_SECS '{raw}'"))?,
            ),
            None => file_cfg.timeout_secs,
        };
        if let Some(secs) = timeout_secs {
            if secs == 0 {
                bail!("request timeout must be at least one second");
            }
            settings = settings.with_timeout(Duration::from_secs(secs));
        }

        Ok(settings)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn trailing_slash(&self) -> bool {
        self.trailing_slash
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn collection_url(&self) -> Result<Url, url::ParseError> {
        self.endpoint(None)
    }

    pub fn item_url(&self, action_id: ActionId) -> Result<Url, url::ParseError> {
        self.endpoint(Some(action_id))
    }

    fn endpoint(&self, action_id: Option<ActionId>) -> Result<Url, url::ParseError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
            path.pop_if_empty();
            path.extend(self.collection.iter());
            if let Some(action_id) = action_id {
                path.push(&action_id.to_string());
            }
            if self.trailing_slash {
                path.push("");
            }
        }
        Ok(url)
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid api base url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        bail!("api base url must be an absolute http(s) url, got '{raw}'");
    }
    Ok(url)
}

fn split_segments(raw: &str) -> Vec<String> {
    raw.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean flag, got '{other}'"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
