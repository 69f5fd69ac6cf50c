use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::mobile_agents::MOBILE_USER_AGENTS;
use crate::pattern::DevicePattern;

/// Name of the built-in broad device used to decide whether a request is
/// mobile at all.
pub const MOBILE: &str = "mobile";

/// Built-in regex devices, registered in this order before the `mobile`
/// keyword device.
const SEED_DEVICES: &[(&str, &str)] = &[
    ("iphone", "(?i)iphone"),
    ("ipad", "(?i)ipad"),
    ("ios", "(?i)iphone|ipad|ipod"),
    ("android", "(?i)android"),
    ("android_phone", "(?i)android.*mobile"),
    ("android_tablet", "(?i)android(?!.*mobile)"),
    ("blackberry", "(?i)blackberry"),
    ("windows_phone", "(?i)windows phone"),
];

/// Mapping from device name to the pattern its user agents match.
///
/// Names are unique; registering an existing name replaces its pattern
/// (last write wins). Entries are never removed. The registry is built and
/// mutated during setup, then shared read-only between requests.
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    devices: IndexMap<String, DevicePattern>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    /// Registry holding the built-in devices.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(SEED_DEVICES.iter().copied());
        registry.register([(MOBILE, DevicePattern::keywords(MOBILE_USER_AGENTS))]);
        registry
    }

    /// Registry without any devices.
    pub fn empty() -> Self {
        Self {
            devices: IndexMap::new(),
        }
    }

    /// Merge `entries` into the registry. Patterns are not validated here.
    pub fn register<I, K, P>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<DevicePattern>,
    {
        for (name, pattern) in entries {
            let name = name.into();
            let pattern = pattern.into();
            tracing::trace!(device = %name, pattern = pattern.as_str(), "registering device");
            self.devices.insert(name, pattern);
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&DevicePattern> {
        self.devices
            .get(name)
            .ok_or_else(|| Error::UnknownDevice(name.to_string()))
    }

    /// Whether `text` matches the pattern registered under `name`.
    pub fn matches(&self, name: &str, text: &str) -> Result<bool> {
        let pattern = self.lookup(name)?;
        let matched = pattern.is_match(text).inspect_err(|e| {
            tracing::warn!(device = %name, error = %e, "device pattern failed to match");
        })?;
        tracing::trace!(device = %name, matched, "matched user agent");
        Ok(matched)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.devices.contains_key(name)
    }

    /// Device names in first-registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
