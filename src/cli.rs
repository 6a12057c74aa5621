//! Command-line flag provider, built on [clap](https://docs.rs/clap).
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//!
//! A field's `flag` tag declares one flag as up to three `|`-separated
//! segments, `key|default|usage`:
//!
//! ```ignore
//! #[configurator(flag = "name")]                          // key only
//! #[configurator(flag = "name|anonymous")]                // with a default
//! #[configurator(flag = "name|anonymous|user to greet")]  // with help text
//! ```
//!
//! At init time every declared flag is registered on a clap [`Command`] and
//! the arguments are parsed once. Flags are accepted as `--key value`,
//! `--key=value`, or the single-dash `-key=value` form.

use std::collections::{HashMap, HashSet};

use clap::{Arg, ArgAction, Command};

use crate::coerce::{Location, set_field};
use crate::error::ProviderError;
use crate::provider::Provider;
use crate::tags::FLAG_TAG;
use crate::types::FieldDescriptor;
use crate::walk::Schema;

pub const FLAG_PROVIDER_NAME: &str = "FlagProvider";
pub const FLAG_SEPARATOR: char = '|';

// Contains the separator, so no flag key can collide with it.
const POSITIONAL_ID: &str = "|positional|";

/// One parsed `flag` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec<'a> {
    pub key: &'a str,
    pub default: &'a str,
    pub usage: &'a str,
}

impl<'a> FlagSpec<'a> {
    /// Split `key|default|usage`. Key and default are trimmed; usage is kept
    /// verbatim. A key may not start with `-` or contain `=`.
    pub fn parse(tag: &'a str) -> Result<Self, ProviderError> {
        if tag.is_empty() {
            return Err(ProviderError::NoTag);
        }
        let segments: Vec<&str> = tag.split(FLAG_SEPARATOR).collect();
        let (key, default, usage) = match segments.as_slice() {
            [key] => (key.trim(), "", ""),
            [key, default] => (key.trim(), default.trim(), ""),
            [key, default, usage] => (key.trim(), default.trim(), *usage),
            _ => return Err(ProviderError::WrongFlagDefinition(tag.to_string())),
        };
        if key.is_empty() || key.starts_with('-') || key.contains('=') {
            return Err(ProviderError::WrongFlagDefinition(tag.to_string()));
        }
        Ok(Self { key, default, usage })
    }
}

/// Supplies values from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct FlagProvider {
    args: Option<Vec<String>>,
    values: HashMap<String, String>,
}

impl FlagProvider {
    /// Parse the process arguments (`std::env::args()`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `args` instead of the process arguments. The first item is the
    /// program name, as with `std::env::args()`.
    pub fn with_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: Some(args.into_iter().map(Into::into).collect()),
            values: HashMap::new(),
        }
    }

    fn command(schema: &Schema) -> Result<(Command, Vec<&'static str>), ProviderError> {
        let mut command = Command::new(FLAG_PROVIDER_NAME)
            .no_binary_name(false)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .arg(
                Arg::new(POSITIONAL_ID)
                    .num_args(1..)
                    .action(ArgAction::Append)
                    .hide(true),
            );
        let mut keys = Vec::new();
        let mut seen = HashSet::new();

        for field in schema.with_tag(FLAG_TAG) {
            let tag = field.descriptor().tags().flag().unwrap_or_default();
            let spec = FlagSpec::parse(tag)?;
            if !seen.insert(spec.key) {
                return Err(ProviderError::TagNotUnique(spec.key.to_string()));
            }

            let mut arg = Arg::new(spec.key)
                .long(spec.key)
                .value_name("VALUE")
                .num_args(1)
                .action(ArgAction::Set);
            if !spec.default.is_empty() {
                arg = arg.default_value(spec.default);
            }
            if !spec.usage.is_empty() {
                arg = arg.help(spec.usage);
            }
            command = command.arg(arg);
            keys.push(spec.key);
        }
        Ok((command, keys))
    }
}

/// Rewrite `-key` / `-key=value` into the `--key` form for registered keys.
/// Everything after a bare `--` is left alone.
fn normalize_args(args: Vec<String>, keys: &[&str]) -> Vec<String> {
    let mut past_separator = false;
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 || past_separator {
                return arg;
            }
            if arg == "--" {
                past_separator = true;
                return arg;
            }
            match arg.strip_prefix('-') {
                Some(body) if !body.starts_with('-') => {
                    let name = body.split('=').next().unwrap_or_default();
                    if keys.contains(&name) {
                        format!("-{arg}")
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

impl Provider for FlagProvider {
    fn name(&self) -> &str {
        FLAG_PROVIDER_NAME
    }

    fn tag(&self) -> &str {
        FLAG_TAG
    }

    fn init(&mut self, schema: &Schema) -> Result<(), ProviderError> {
        let (command, keys) = Self::command(schema)?;
        let args = self
            .args
            .clone()
            .unwrap_or_else(|| std::env::args().collect());
        let args = normalize_args(args, &keys);

        let matches = command
            .try_get_matches_from(args)
            .map_err(|err| ProviderError::FlagParse(err.to_string()))?;

        self.values = keys
            .iter()
            .filter_map(|key| {
                matches
                    .get_one::<String>(key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect();
        Ok(())
    }

    fn provide(&self, field: &FieldDescriptor, location: Location<'_>) -> Result<(), ProviderError> {
        let tag = field.tags().flag().unwrap_or_default();
        let spec = FlagSpec::parse(tag)?;
        let value = self
            .values
            .get(spec.key)
            .filter(|value| !value.is_empty())
            .ok_or(ProviderError::EmptyValue)?;
        set_field(field, location, value)?;
        Ok(())
    }
}
