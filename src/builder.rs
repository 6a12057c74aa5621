use std::collections::HashSet;
use std::marker::PhantomData;

use crate::error::ConfigError;
use crate::options::{FailurePolicy, Options};
use crate::provider::Provider;
use crate::resolve::Resolver;
use crate::walk::{Configurable, Schema};

/// A target struct bound to an initialized provider chain.
///
/// Created by [`Configurator::builder`] or [`Configurator::new`]. Every
/// provider has already run its `init` against the target's field set;
/// [`init_values`](Self::init_values) performs the population pass.
pub struct Configurator<C> {
    target: C,
    providers: Vec<Box<dyn Provider>>,
    options: Options,
}

impl<C: Configurable> Configurator<C> {
    pub fn builder() -> ConfiguratorBuilder<C> {
        ConfiguratorBuilder::new()
    }

    /// Shorthand for a builder with `providers` and default options.
    pub fn new(providers: Vec<Box<dyn Provider>>) -> Result<Self, ConfigError>
    where
        C: Default,
    {
        Self::builder().providers(providers).build()
    }

    /// The target as it stands, before or between population passes.
    pub fn target(&self) -> &C {
        &self.target
    }

    /// Provider names in chain order.
    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(|p| p.name())
    }

    /// Walk the target and fill every leaf field through the provider chain.
    pub fn init_values(self) -> Result<C, ConfigError> {
        let Self {
            mut target,
            providers,
            options,
        } = self;
        let mut resolver = Resolver::new(&providers, &options);
        target.visit_fields(&mut resolver)?;
        Ok(target)
    }
}

/// Builder for a [`Configurator`].
///
/// Providers are consulted in the order they are added: first added, first
/// asked.
pub struct ConfiguratorBuilder<C> {
    providers: Vec<Box<dyn Provider>>,
    options: Options,
    _phantom: PhantomData<C>,
}

impl<C: Configurable> ConfiguratorBuilder<C> {
    fn new() -> Self {
        Self {
            providers: Vec::new(),
            options: Options::default(),
            _phantom: PhantomData,
        }
    }

    /// Append a provider to the chain.
    pub fn provider<P: Provider + 'static>(mut self, provider: P) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Append several boxed providers, keeping their order.
    pub fn providers<I>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Provider>>,
    {
        self.providers.extend(providers);
        self
    }

    /// Route diagnostics to `logger` instead of `tracing`.
    pub fn logger<F: Fn(&str) + 'static>(mut self, logger: F) -> Self {
        self.options.logger = Some(Box::new(logger));
        self
    }

    /// Enable or disable diagnostics (default: enabled).
    pub fn logging(mut self, enabled: bool) -> Self {
        self.options.logging = enabled;
        self
    }

    /// Report unset fields to `callback` and keep going, instead of
    /// aborting on the first one.
    pub fn on_fail<F: Fn(&ConfigError) + 'static>(mut self, callback: F) -> Self {
        self.options.failure = FailurePolicy::Callback(Box::new(callback));
        self
    }

    /// Build around `C::default()`.
    pub fn build(self) -> Result<Configurator<C>, ConfigError>
    where
        C: Default,
    {
        self.build_with(C::default())
    }

    /// Build around an existing target. Fields no provider sets keep their
    /// current value under the callback policy.
    pub fn build_with(mut self, mut target: C) -> Result<Configurator<C>, ConfigError> {
        if self.providers.is_empty() {
            return Err(ConfigError::NoProviders);
        }
        check_unique(&self.providers)?;

        let schema = Schema::collect(&mut target);
        for provider in &mut self.providers {
            provider
                .init(&schema)
                .map_err(|source| ConfigError::ProviderInit {
                    name: provider.name().to_string(),
                    source,
                })?;
            self.options
                .log(format_args!("configurator: initialized {}", provider.name()));
        }

        Ok(Configurator {
            target,
            providers: self.providers,
            options: self.options,
        })
    }
}

fn check_unique(providers: &[Box<dyn Provider>]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    let mut tags = HashSet::new();
    for provider in providers {
        if !names.insert(provider.name()) {
            return Err(ConfigError::ProviderNameCollision(provider.name().to_string()));
        }
        if !tags.insert(provider.tag()) {
            return Err(ConfigError::ProviderTagCollision(provider.tag().to_string()));
        }
    }
    Ok(())
}
