//! Tag accessors.
//!
//! A field's tags are the `key = "value"` pairs written in its
//! `#[configurator(...)]` attribute. Providers look up their own key here;
//! the configurator uses [`Tags::contains`] to decide which providers are
//! eligible for a field at all.

use std::fmt;

pub const DEFAULT_TAG: &str = "default";
pub const ENV_TAG: &str = "env";
pub const FLAG_TAG: &str = "flag";
pub const FILE_JSON_TAG: &str = "file_json";
pub const FILE_YAML_TAG: &str = "file_yaml";
pub const FILE_TOML_TAG: &str = "file_toml";
pub const VALIDATE_TAG: &str = "validate";

/// The tag set of one field, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tags(&'static [(&'static str, &'static str)]);

impl Tags {
    pub const EMPTY: Tags = Tags(&[]);

    pub const fn new(pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self(pairs)
    }

    /// Value of `key`, if the key is present. A present key may carry an
    /// empty value.
    pub fn get(&self, key: &str) -> Option<&'static str> {
        self.0.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
    }

    /// Whether `key` is physically present, regardless of its value.
    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| *k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|(k, _)| *k)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn default_value(&self) -> Option<&'static str> {
        self.get(DEFAULT_TAG)
    }

    pub fn env(&self) -> Option<&'static str> {
        self.get(ENV_TAG)
    }

    pub fn flag(&self) -> Option<&'static str> {
        self.get(FLAG_TAG)
    }

    pub fn validate(&self) -> Option<&'static str> {
        self.get(VALIDATE_TAG)
    }
}

/// Renders the full tag text, e.g. `env:"AGE_ENV" default:"-1"`.
impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}:{value:?}")?;
        }
        Ok(())
    }
}
