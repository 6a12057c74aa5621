//! Fill a tagged configuration struct from command-line flags, environment
//! variables, files and defaults through an ordered provider chain.
//!
//! ```ignore
//! #[derive(Configurable, Default)]
//! struct AppConfig {
//!     #[configurator(flag = "name", env = "APP_NAME", default = "anonymous")]
//!     pub name: String,
//!     #[configurator(env = "APP_TIMEOUT", default = "30s")]
//!     pub timeout: std::time::Duration,
//! }
//!
//! let config: AppConfig = Configurator::builder()
//!     .provider(FlagProvider::new())
//!     .provider(EnvProvider::new())
//!     .provider(DefaultProvider::new())
//!     .build()?
//!     .init_values()?;
//! ```
//!
//! Each field says where its value may come from. Each provider owns one tag
//! key and is asked only about fields carrying that key. For every field the
//! providers are tried in the order they were added, and the first one that
//! produces a value wins.
//!
//! # Design: struct as source of truth
//!
//! `#[derive(Configurable)]` turns the struct into a static field walker:
//!
//! - **`#[configurator(key = "value", ...)]`** attaches tags. Keys are open
//!   ended: the built-in providers read `flag`, `env`, `file_json`,
//!   `file_yaml`, `file_toml`, `default` and `validate`, and a custom
//!   [`Provider`] may read any other.
//! - **`#[configurator(nested)]`** walks a nested struct (or an
//!   `Option`/`Option<Box<_>>` of one, allocated with its default first)
//!   instead of filling it directly.
//! - **`#[configurator(skip)]`** and private fields are left alone.
//!
//! # Value coercion
//!
//! Providers produce text; the [`coerce`] module turns it into the field's
//! type:
//!
//! - Scalars (`String`, `bool`, every integer and float width) are parsed
//!   leniently: unparseable text stores the zero value.
//! - [`Duration`](std::time::Duration) fields accept text such as `"1h30m"`.
//! - `Option<T>` fields are allocated from strictly parsed text.
//! - `Vec<T>` fields take `;`-separated items, trimmed, empties dropped.
//! - A type implementing [`FieldSetter`] parses its own text.
//!
//! # Failure policy
//!
//! When no provider can set a field, population stops with
//! [`ConfigError::FieldNotSet`]. Install
//! [`on_fail`](ConfiguratorBuilder::on_fail) to report such fields and keep
//! going instead.
//!
//! # Diagnostics
//!
//! Every resolution step is logged through [`tracing`] at debug level.
//! [`logger`](ConfiguratorBuilder::logger) redirects the lines to a custom
//! function, and [`logging(false)`](ConfiguratorBuilder::logging) silences
//! them.
//!
//! # Errors
//!
//! [`ConfigError`] covers configurator-level failures (no providers,
//! collisions, init errors, unset fields). Individual providers report
//! [`ProviderError`], which wraps [`CoercionError`] and [`ValidationError`].
//! See the [`error`] module for the full set.

extern crate self as configurator;

pub mod coerce;
pub mod duration;
pub mod error;
pub mod tags;
pub mod types;

mod builder;
#[cfg(feature = "clap")]
mod cli;
mod defaults;
mod env;
mod file;
mod options;
mod provider;
mod resolve;
mod validate;
mod walk;

#[cfg(test)]
mod fixtures;

pub use builder::{Configurator, ConfiguratorBuilder};
#[cfg(feature = "clap")]
pub use cli::{FLAG_PROVIDER_NAME, FlagProvider, FlagSpec};
pub use coerce::{Field, FieldSetter, FieldValue, Location, set_field};
pub use defaults::{DEFAULT_PROVIDER_NAME, DefaultProvider};
pub use env::{ENV_PROVIDER_NAME, EnvProvider};
pub use error::{BoxError, CoercionError, ConfigError, ProviderError, ValidationError};
pub use file::{FileFormat, FileProvider};
pub use options::FailurePolicy;
pub use provider::Provider;
pub use tags::Tags;
pub use types::{FieldDescriptor, Kind};
pub use validate::{ValidationProvider, validate_value};
pub use walk::{Configurable, Schema, SchemaField, Visitor};
