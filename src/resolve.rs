//! The provider chain: per-field dispatch over an ordered provider list.
//!
//! For each leaf field the [`Resolver`] tries, in order, every provider whose
//! tag key is present on the field. The first success wins and later
//! providers are not consulted. If every eligible provider fails (or none is
//! eligible), the field is reported as not set and the failure policy decides
//! whether population stops.

use crate::coerce::Location;
use crate::error::{ConfigError, ProviderError};
use crate::options::Options;
use crate::provider::Provider;
use crate::types::FieldDescriptor;
use crate::walk::{Configurable, Visitor};

pub(crate) struct Resolver<'a> {
    providers: &'a [Box<dyn Provider>],
    options: &'a Options,
    path: Vec<&'static str>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(providers: &'a [Box<dyn Provider>], options: &'a Options) -> Self {
        Self {
            providers,
            options,
            path: Vec::new(),
        }
    }

    fn resolve_leaf(&self, field: &FieldDescriptor, mut location: Location<'_>) -> Result<(), ConfigError> {
        let path = self.path.join(".");
        self.options
            .log(format_args!("configurator: current path: [{path}]"));

        let tags = field.tags();
        let mut last_error: Option<ProviderError> = None;
        for provider in self.providers.iter().filter(|p| tags.contains(p.tag())) {
            match provider.provide(field, location.reborrow()) {
                Ok(()) => {
                    self.options
                        .log(format_args!("configurator: [{path}] set by {}", provider.name()));
                    return Ok(());
                }
                Err(err) => {
                    self.options
                        .log(format_args!("configurator: {}: {err}", provider.name()));
                    last_error = Some(err);
                }
            }
        }

        let err = ConfigError::FieldNotSet {
            path,
            tags: tags.to_string(),
            source: last_error,
        };
        self.options.log(format_args!("{err}"));
        self.options.on_fail(err)
    }
}

impl Visitor for Resolver<'_> {
    type Error = ConfigError;

    fn visit_leaf(&mut self, field: &FieldDescriptor, location: Location<'_>) -> Result<(), ConfigError> {
        self.path.push(field.name());
        let result = self.resolve_leaf(field, location);
        self.path.pop();
        result
    }

    fn visit_struct<C: Configurable + ?Sized>(
        &mut self,
        field: &FieldDescriptor,
        target: &mut C,
    ) -> Result<(), ConfigError> {
        self.path.push(field.name());
        let result = target.visit_fields(self);
        self.path.pop();
        result
    }
}
