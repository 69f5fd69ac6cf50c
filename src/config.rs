use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::devices::{DeviceRegistry, MOBILE};
use crate::error::{Error, Result};

/// Options that drive classification and format resolution.
///
/// Built once during setup (see [`ConfigBuilder`]) and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    fallback_chains: IndexMap<String, Vec<String>>,
    skip_xhr_requests: bool,
    skip_user_agents: Vec<String>,
    default_fallback: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        let mut fallback_chains = IndexMap::new();
        fallback_chains.insert(MOBILE.to_string(), vec![MOBILE.to_string()]);
        Self {
            fallback_chains,
            skip_xhr_requests: true,
            skip_user_agents: Vec::new(),
            default_fallback: None,
        }
    }
}

impl Configuration {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Fallback chains in declared order; keys double as device names.
    pub fn fallback_chains(&self) -> &IndexMap<String, Vec<String>> {
        &self.fallback_chains
    }

    pub fn skip_xhr_requests(&self) -> bool {
        self.skip_xhr_requests
    }

    pub fn skip_user_agents(&self) -> &[String] {
        &self.skip_user_agents
    }

    pub fn default_fallback(&self) -> Option<&str> {
        self.default_fallback.as_deref()
    }

    /// Parse a YAML document and register its `devices` into `registry`.
    pub fn from_yaml_str(yaml: &str, registry: &mut DeviceRegistry) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;
        Ok(file.into_builder().build(registry))
    }

    pub fn from_path(path: impl AsRef<Path>, registry: &mut DeviceRegistry) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading configuration");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content, registry)
    }

    /// Check that every chain key and skipped user agent names a registered
    /// device. Classification would otherwise fail on the first request that
    /// reaches the missing entry.
    pub fn validate(&self, registry: &DeviceRegistry) -> Result<()> {
        self.fallback_chains
            .keys()
            .chain(self.skip_user_agents.iter())
            .find(|name| !registry.contains(name))
            .map_or(Ok(()), |name| Err(Error::UnknownDevice(name.clone())))
    }
}

/// Setup-time entry point for [`Configuration`].
///
/// Unset options keep their defaults. Devices given here are forwarded to
/// [`DeviceRegistry::register`] by [`ConfigBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    fallback_chains: Option<IndexMap<String, Vec<String>>>,
    skip_xhr_requests: Option<bool>,
    skip_user_agents: Vec<String>,
    devices: IndexMap<String, String>,
    default_fallback: Option<String>,
}

impl ConfigBuilder {
    /// Replace the fallback chains. Declaration order is kept.
    pub fn fallback_chains<I, K, C, F>(mut self, chains: I) -> Self
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.fallback_chains = Some(
            chains
                .into_iter()
                .map(|(k, c)| (k.into(), c.into_iter().map(Into::into).collect()))
                .collect(),
        );
        self
    }

    pub fn skip_xhr_requests(mut self, skip: bool) -> Self {
        self.skip_xhr_requests = Some(skip);
        self
    }

    pub fn skip_user_agents<I, S>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_user_agents = devices.into_iter().map(Into::into).collect();
        self
    }

    pub fn devices<I, K, P>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<String>,
    {
        self.devices
            .extend(devices.into_iter().map(|(k, p)| (k.into(), p.into())));
        self
    }

    /// Format appended after any format that has no explicit chain.
    pub fn default_fallback(mut self, format: impl Into<String>) -> Self {
        self.default_fallback = Some(format.into());
        self
    }

    pub fn build(self, registry: &mut DeviceRegistry) -> Configuration {
        registry.register(self.devices);
        let defaults = Configuration::default();
        let config = Configuration {
            fallback_chains: self.fallback_chains.unwrap_or(defaults.fallback_chains),
            skip_xhr_requests: self.skip_xhr_requests.unwrap_or(defaults.skip_xhr_requests),
            skip_user_agents: self.skip_user_agents,
            default_fallback: self.default_fallback,
        };
        tracing::debug!(
            chains = config.fallback_chains.len(),
            skip_xhr_requests = config.skip_xhr_requests,
            skip_user_agents = ?config.skip_user_agents,
            default_fallback = ?config.default_fallback,
            "configuration built"
        );
        config
    }
}

// ---------------------------------------------------------------------------
// YAML file format
// ---------------------------------------------------------------------------

/// Raw deserialization target for a configuration file.
/// Maps use IndexMap so declared order survives (first-match-wins).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    fallback_chains: Option<IndexMap<String, Vec<String>>>,
    #[serde(default)]
    skip_xhr_requests: Option<bool>,
    #[serde(default)]
    skip_user_agents: Vec<String>,
    #[serde(default)]
    devices: IndexMap<String, String>,
    #[serde(default, alias = "fall_back")]
    default_fallback: Option<String>,
}

impl ConfigFile {
    fn into_builder(self) -> ConfigBuilder {
        ConfigBuilder {
            fallback_chains: self.fallback_chains,
            skip_xhr_requests: self.skip_xhr_requests,
            skip_user_agents: self.skip_user_agents,
            devices: self.devices,
            default_fallback: self.default_fallback,
        }
    }
}
