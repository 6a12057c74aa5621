use std::path::PathBuf;
use thiserror::Error;

use crate::types::Kind;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure to turn text into a field value.
#[derive(Debug, Error)]
pub enum CoercionError {
    #[error("unsupported type: {0}")]
    UnsupportedType(Kind),

    #[error("unsupported type of slice item: {0}")]
    UnsupportedSliceElementType(Kind),

    #[error("got empty slice")]
    EmptySlice,

    #[error("cannot set type [{type_name}] at index [{index}]: {source}")]
    SliceElement {
        type_name: &'static str,
        index: usize,
        source: Box<CoercionError>,
    },

    #[error("cannot parse {text:?} as {kind}: {reason}")]
    InvalidValue {
        kind: Kind,
        text: String,
        reason: String,
    },

    #[error("custom setter failed: {0}")]
    Custom(#[source] BoxError),
}

impl CoercionError {
    pub(crate) fn invalid(kind: Kind, text: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidValue {
            kind,
            text: text.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// A `validate` rule rejected the value a provider produced.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("value '{value}' failed rule '{rule}'")]
    Failed { rule: String, value: String },

    #[error("unknown validation rule '{0}'")]
    UnknownRule(String),

    #[error("validation rule '{0}' needs a parameter")]
    MissingParam(String),

    #[error("invalid parameter '{param}' for rule '{rule}'")]
    InvalidParam { rule: String, param: String },

    #[error("rule '{rule}' cannot compare a {value} value")]
    NotComparable { rule: String, value: &'static str },
}

/// Failure of a single provider, either while initializing or while
/// producing one field's value.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("empty value")]
    EmptyValue,

    #[error("key is empty")]
    KeyEmpty,

    #[error("tag is not set")]
    NoTag,

    #[error("value not found at path [{0}]")]
    NotFound(String),

    #[error("value at path [{0}] is not a scalar or a list of scalars")]
    NotScalar(String),

    #[error("tag is not unique: {0}")]
    TagNotUnique(String),

    #[error("wrong flag definition [{0}]")]
    WrongFlagDefinition(String),

    #[error("cannot parse flags: {0}")]
    FlagParse(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("file must have {expected} extension: {path}")]
    WrongExtension {
        path: PathBuf,
        expected: &'static str,
    },

    #[error("provider error: {0}")]
    ByProvider(#[source] Box<ProviderError>),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

/// Errors surfaced by [`Configurator`](crate::Configurator) itself.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("providers not found")]
    NoProviders,

    #[error("provider name [{0}] is not unique")]
    ProviderNameCollision(String),

    #[error("provider tag [{0}] is not unique")]
    ProviderTagCollision(String),

    #[error("cannot init [{name}] provider: {source}")]
    ProviderInit { name: String, source: ProviderError },

    #[error("configurator: field [{path}] with tags [{tags}] cannot be set")]
    FieldNotSet {
        path: String,
        tags: String,
        #[source]
        source: Option<ProviderError>,
    },
}
