//! The provider contract.
//!
//! A provider is one source of field values (command line, environment,
//! file, `default` tag). Each provider owns a tag key; the configurator only
//! offers it fields that physically carry that key.

use crate::coerce::Location;
use crate::error::ProviderError;
use crate::types::FieldDescriptor;
use crate::walk::Schema;

pub trait Provider {
    /// Unique among the providers of one configurator.
    fn name(&self) -> &str;

    /// Tag key this provider reads. Unique among the providers of one
    /// configurator.
    fn tag(&self) -> &str;

    /// One-time preparation with the full set of leaf fields, before any
    /// value is requested.
    fn init(&mut self, schema: &Schema) -> Result<(), ProviderError>;

    /// Produce a value for `field` and write it into `location`.
    fn provide(&self, field: &FieldDescriptor, location: Location<'_>) -> Result<(), ProviderError>;
}

impl<P: Provider + ?Sized> Provider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn tag(&self) -> &str {
        (**self).tag()
    }

    fn init(&mut self, schema: &Schema) -> Result<(), ProviderError> {
        (**self).init(schema)
    }

    fn provide(&self, field: &FieldDescriptor, location: Location<'_>) -> Result<(), ProviderError> {
        (**self).provide(field, location)
    }
}
