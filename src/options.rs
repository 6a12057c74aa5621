//! Configurator options: diagnostics output and the failure policy.

use std::fmt;

use tracing::debug;

use crate::error::ConfigError;

pub type LoggerFn = Box<dyn Fn(&str)>;
pub type OnFailFn = Box<dyn Fn(&ConfigError)>;

/// What happens when no provider can set a field.
#[derive(Default)]
pub enum FailurePolicy {
    /// Stop population and return [`ConfigError::FieldNotSet`].
    #[default]
    Abort,
    /// Report the error to the callback and move on to the next field.
    Callback(OnFailFn),
}

impl fmt::Debug for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Abort => f.write_str("Abort"),
            FailurePolicy::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Diagnostic sink. Lines go to `tracing` at debug level unless a custom
/// logger is installed.
pub struct Options {
    pub(crate) logging: bool,
    pub(crate) logger: Option<LoggerFn>,
    pub(crate) failure: FailurePolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            logging: true,
            logger: None,
            failure: FailurePolicy::default(),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("logging", &self.logging)
            .field("custom_logger", &self.logger.is_some())
            .field("failure", &self.failure)
            .finish()
    }
}

impl Options {
    pub(crate) fn log(&self, args: fmt::Arguments<'_>) {
        if !self.logging {
            return;
        }
        match &self.logger {
            Some(logger) => logger(&args.to_string()),
            None => debug!("{args}"),
        }
    }

    /// Apply the failure policy. `Ok` means population continues.
    pub(crate) fn on_fail(&self, err: ConfigError) -> Result<(), ConfigError> {
        match &self.failure {
            FailurePolicy::Abort => Err(err),
            FailurePolicy::Callback(callback) => {
                callback(&err);
                Ok(())
            }
        }
    }
}
