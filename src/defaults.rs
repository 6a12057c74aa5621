use crate::coerce::{Location, set_field};
use crate::error::ProviderError;
use crate::provider::Provider;
use crate::tags::DEFAULT_TAG;
use crate::types::FieldDescriptor;
use crate::walk::Schema;

pub const DEFAULT_PROVIDER_NAME: &str = "DefaultProvider";

/// Supplies the literal text of a field's `default` tag.
///
/// Usually the last link of a chain, so that flags, env vars and files
/// override it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProvider;

impl DefaultProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Provider for DefaultProvider {
    fn name(&self) -> &str {
        DEFAULT_PROVIDER_NAME
    }

    fn tag(&self) -> &str {
        DEFAULT_TAG
    }

    fn init(&mut self, _schema: &Schema) -> Result<(), ProviderError> {
        Ok(())
    }

    fn provide(&self, field: &FieldDescriptor, location: Location<'_>) -> Result<(), ProviderError> {
        let text = field.tags().default_value().unwrap_or_default();
        if text.is_empty() {
            return Err(ProviderError::EmptyValue);
        }
        set_field(field, location, text)?;
        Ok(())
    }
}
