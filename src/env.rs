use std::collections::HashMap;

use crate::coerce::{Location, set_field};
use crate::error::ProviderError;
use crate::provider::Provider;
use crate::tags::ENV_TAG;
use crate::types::FieldDescriptor;
use crate::walk::Schema;

pub const ENV_PROVIDER_NAME: &str = "EnvProvider";

/// Reads the environment variable named by a field's `env` tag.
///
/// The tag value is upper-cased before lookup, so `env = "db_url"` reads
/// `DB_URL`. Unset and empty variables both count as "no value".
#[derive(Debug, Clone, Default)]
pub struct EnvProvider {
    vars: Option<HashMap<String, String>>,
}

impl EnvProvider {
    /// Read the live process environment.
    pub fn new() -> Self {
        Self { vars: None }
    }

    /// Read from a fixed set of variables instead of the process
    /// environment (pass `std::env::vars()` or synthetic data).
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: Some(vars.into_iter().collect()),
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        match &self.vars {
            Some(vars) => vars.get(key).cloned(),
            None => std::env::var(key).ok(),
        }
    }
}

impl Provider for EnvProvider {
    fn name(&self) -> &str {
        ENV_PROVIDER_NAME
    }

    fn tag(&self) -> &str {
        ENV_TAG
    }

    fn init(&mut self, _schema: &Schema) -> Result<(), ProviderError> {
        Ok(())
    }

    fn provide(&self, field: &FieldDescriptor, location: Location<'_>) -> Result<(), ProviderError> {
        let key = field.tags().env().unwrap_or_default();
        if key.is_empty() {
            return Err(ProviderError::KeyEmpty);
        }
        let value = self
            .lookup(&key.to_uppercase())
            .filter(|value| !value.is_empty())
            .ok_or(ProviderError::EmptyValue)?;
        set_field(field, location, &value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::coerce::Field;
    use crate::tags::Tags;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn provide<T: Field>(
        provider: &EnvProvider,
        tags: &'static [(&'static str, &'static str)],
        target: &mut T,
    ) -> Result<(), ProviderError> {
        let field = FieldDescriptor::new("field", Tags::new(tags));
        provider.provide(&field, target.location())
    }

    #[test]
    fn reads_variable() {
        let provider = EnvProvider::from_vars(vars(&[("AGE_ENV", "45")]));
        let mut age = 0i16;
        provide(&provider, &[("env", "AGE_ENV")], &mut age).unwrap();
        assert_eq!(age, 45);
    }

    #[test]
    fn key_is_uppercased() {
        let provider = EnvProvider::from_vars(vars(&[("DB_URL", "postgres://db")]));
        let mut url = String::new();
        provide(&provider, &[("env", "db_url")], &mut url).unwrap();
        assert_eq!(url, "postgres://db");
    }

    #[test]
    fn empty_key_is_an_error() {
        let provider = EnvProvider::from_vars(Vec::new());
        let mut url = String::new();
        assert!(matches!(
            provide(&provider, &[("env", "")], &mut url),
            Err(ProviderError::KeyEmpty)
        ));
    }

    #[test]
    fn unset_variable_is_empty_value() {
        let provider = EnvProvider::from_vars(Vec::new());
        let mut url = String::new();
        assert!(matches!(
            provide(&provider, &[("env", "MISSING")], &mut url),
            Err(ProviderError::EmptyValue)
        ));
    }

    #[test]
    fn empty_variable_is_empty_value() {
        let provider = EnvProvider::from_vars(vars(&[("BLANK", "")]));
        let mut url = String::from("kept");
        assert!(matches!(
            provide(&provider, &[("env", "BLANK")], &mut url),
            Err(ProviderError::EmptyValue)
        ));
        assert_eq!(url, "kept");
    }

    #[test]
    fn slice_from_variable() {
        let provider = EnvProvider::from_vars(vars(&[("HOSTS", "a.local; b.local")]));
        let mut hosts: Vec<String> = Vec::new();
        provide(&provider, &[("env", "HOSTS")], &mut hosts).unwrap();
        assert_eq!(hosts, vec!["a.local", "b.local"]);
    }

    #[test]
    fn live_environment_lookup() {
        // PATH is set in any environment the test suite runs in.
        let provider = EnvProvider::new();
        let mut path = String::new();
        provide(&provider, &[("env", "path")], &mut path).unwrap();
        assert!(!path.is_empty());
    }
}
