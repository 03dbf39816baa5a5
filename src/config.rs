use std::collections::BTreeMap;

/// A configuration value.
///
/// A small closed tagged union rather than an arbitrary trait object,
/// since the set of config/wire-level value shapes is fixed and small
/// enough that explicit variants read better than dynamic dispatch.
#[derive(Clone, PartialEq, Debug)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl From<bool> for ConfigValue {
    #[inline]
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    #[inline]
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<f64> for ConfigValue {
    #[inline]
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<String> for ConfigValue {
    #[inline]
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<&str> for ConfigValue {
    #[inline]
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_owned())
    }
}

/// Converts a [`ConfigValue`] to a concrete Rust type.
///
/// Used by `config_value::<T>(key)` to give callers a typed read instead of
/// a raw [`ConfigValue`] match. A failed conversion is reported by the
/// caller as `invalid_configuration_value`, distinct from a missing key.
pub trait FromConfigValue: Sized {
    /// A human-readable name for this type, used in error messages.
    const TYPE_NAME: &'static str;

    fn from_config_value(value: &ConfigValue) -> Option<Self>;
}

impl FromConfigValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromConfigValue for i64 {
    const TYPE_NAME: &'static str = "i64";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromConfigValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::Float(value) => Some(*value),
            _ => None,
        }
    }
}

impl FromConfigValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::String(value) => Some(value.clone()),
            _ => None,
        }
    }
}

/// Declarative metadata for one configuration key: its default value and a
/// human-readable description.
#[derive(Clone, Debug)]
pub struct ConfigKeyDescriptor {
    pub default: ConfigValue,
    pub description: String,
}

impl ConfigKeyDescriptor {
    pub fn new(default: impl Into<ConfigValue>, description: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            description: description.into(),
        }
    }
}

/// A name-keyed table of configuration key descriptors.
///
/// Used identically to [`crate::port::PortTable`] for the config-key
/// catalog; `BTreeMap` gives deterministic iteration order for
/// `available_config()`.
#[derive(Default, Debug)]
pub struct ConfigTable {
    keys: BTreeMap<String, ConfigKeyDescriptor>,
}

impl ConfigTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or overwrite) a configuration key.
    pub fn declare(&mut self, name: impl Into<String>, descriptor: ConfigKeyDescriptor) {
        self.keys.insert(name.into(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&ConfigKeyDescriptor> {
        self.keys.get(name)
    }

    /// All declared entries, cloned, keyed by name in sorted order.
    pub fn entries(&self) -> impl Iterator<Item = (String, ConfigKeyDescriptor)> + '_ {
        self.keys.iter().map(|(name, descriptor)| (name.clone(), descriptor.clone()))
    }
}

/// The external configuration object a process is constructed with:
/// `has_value` for presence, `get_value` for a typed (here, tagged-union)
/// read. The core queries this trait; it never mutates it.
pub trait ProcessConfig: Send + Sync {
    fn has_value(&self, key: &str) -> bool;

    fn get_value(&self, key: &str) -> Option<ConfigValue>;
}

/// A `ProcessConfig` backed by a `BTreeMap`.
///
/// `BTreeMap` rather than a hash map, for deterministic iteration order on
/// a property-like table whose contents may end up in logs or debug
/// output.
#[derive(Default, Clone, Debug)]
pub struct MapConfig {
    values: BTreeMap<String, ConfigValue>,
}

impl MapConfig {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of a single key/value pair.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ProcessConfig for MapConfig {
    fn has_value(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn get_value(&self, key: &str) -> Option<ConfigValue> {
        self.values.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_config_reports_presence_and_value() {
        let config = MapConfig::new().with_value("rate", 48_000i64);

        assert!(config.has_value("rate"));
        assert!(!config.has_value("missing"));
        assert_eq!(config.get_value("rate"), Some(ConfigValue::Int(48_000)));
        assert_eq!(config.get_value("missing"), None);
    }

    #[test]
    fn from_config_value_rejects_wrong_variant() {
        let value = ConfigValue::String("x".into());
        assert_eq!(i64::from_config_value(&value), None);
        assert_eq!(String::from_config_value(&value), Some("x".to_owned()));
    }
}
