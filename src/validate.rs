//! Validation decorator.
//!
//! [`ValidationProvider`] wraps another provider. After the inner provider
//! writes a value, the field's `validate` tag is checked against it. Rules
//! are comma-separated, applied left to right:
//!
//! | Rule         | Passes when                                              |
//! |--------------|----------------------------------------------------------|
//! | `required`   | the value is not its kind's zero value                   |
//! | `omitempty`  | always; remaining rules are skipped for a zero value     |
//! | `min=N`      | measure >= N                                             |
//! | `max=N`      | measure <= N                                             |
//! | `len=N`      | measure == N                                             |
//! | `gt=N` `gte=N` `lt=N` `lte=N` | measure compared to N                   |
//! | `eq=V` `ne=V`| numbers by value, anything else by its rendered text     |
//! | `oneof=A B C`| the rendered value is one of the space-separated options |
//!
//! The measure of a string is its character count; of a list, its length;
//! of a number, its value; of a duration, its nanoseconds (and `N` may then
//! be written as duration text, e.g. `max=1h`).
//!
//! A value that fails its rules is not kept: the field gets back whatever it
//! held before the inner provider ran.

use std::cmp::Ordering;

use crate::coerce::{FieldValue, Location};
use crate::duration;
use crate::error::{ProviderError, ValidationError};
use crate::provider::Provider;
use crate::types::FieldDescriptor;
use crate::walk::Schema;

/// Runs `validate` rules on whatever the inner provider produced.
///
/// Reports the inner provider's tag, so it occupies the inner provider's
/// slot in the chain.
#[derive(Debug, Clone)]
pub struct ValidationProvider<P> {
    inner: P,
    name: String,
}

impl<P: Provider> ValidationProvider<P> {
    pub fn new(inner: P) -> Self {
        let name = format!("ValidationProvider({})", inner.name());
        Self { inner, name }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: Provider> Provider for ValidationProvider<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn tag(&self) -> &str {
        self.inner.tag()
    }

    fn init(&mut self, schema: &Schema) -> Result<(), ProviderError> {
        self.inner.init(schema)
    }

    fn provide(&self, field: &FieldDescriptor, mut location: Location<'_>) -> Result<(), ProviderError> {
        let previous = location.take();
        let result = self
            .inner
            .provide(field, location.reborrow())
            .map_err(|err| ProviderError::ByProvider(Box::new(err)))
            .and_then(|()| {
                let rules = field.tags().validate().unwrap_or_default();
                Ok(validate_value(&location.value(), rules)?)
            });
        if result.is_err() {
            location.restore(previous);
        }
        result
    }
}

/// Check `value` against a comma-separated rule list.
pub fn validate_value(value: &FieldValue, rules: &str) -> Result<(), ValidationError> {
    for rule in rules.split(',').map(str::trim).filter(|r| !r.is_empty()) {
        let (name, param) = match rule.split_once('=') {
            Some((name, param)) => (name, Some(param)),
            None => (rule, None),
        };
        let failed = || ValidationError::Failed {
            rule: rule.to_string(),
            value: value.to_string(),
        };

        match name {
            "required" => {
                if value.is_zero() {
                    return Err(failed());
                }
            }
            "omitempty" => {
                if value.is_zero() {
                    return Ok(());
                }
            }
            "oneof" => {
                let options = require_param(rule, param)?;
                let text = value.to_string();
                if !options.split_whitespace().any(|option| option == text) {
                    return Err(failed());
                }
            }
            "eq" | "ne" => {
                let expected = require_param(rule, param)?;
                let equal = match value {
                    FieldValue::Int(_) | FieldValue::Float(_) | FieldValue::Duration(_) => {
                        compare(value, rule, expected)? == Ordering::Equal
                    }
                    _ => value.to_string() == expected,
                };
                if equal != (name == "eq") {
                    return Err(failed());
                }
            }
            "min" | "max" | "len" | "gt" | "gte" | "lt" | "lte" => {
                let param = require_param(rule, param)?;
                let ordering = compare(value, rule, param)?;
                let ok = match name {
                    "min" | "gte" => ordering != Ordering::Less,
                    "max" | "lte" => ordering != Ordering::Greater,
                    "len" => ordering == Ordering::Equal,
                    "gt" => ordering == Ordering::Greater,
                    _ => ordering == Ordering::Less,
                };
                if !ok {
                    return Err(failed());
                }
            }
            _ => return Err(ValidationError::UnknownRule(name.to_string())),
        }
    }
    Ok(())
}

fn require_param<'a>(rule: &str, param: Option<&'a str>) -> Result<&'a str, ValidationError> {
    param
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ValidationError::MissingParam(rule.to_string()))
}

/// Compare the value's measure with the rule parameter.
fn compare(value: &FieldValue, rule: &str, param: &str) -> Result<Ordering, ValidationError> {
    let invalid_param = || ValidationError::InvalidParam {
        rule: rule.to_string(),
        param: param.to_string(),
    };
    let (measure, bound) = match value {
        FieldValue::Duration(d) => {
            let bound = duration::parse(param)
                .map(|b| b.as_nanos() as f64)
                .or_else(|_| param.parse::<f64>())
                .map_err(|_| invalid_param())?;
            (d.as_nanos() as f64, bound)
        }
        other => {
            let measure = match other {
                FieldValue::Str(s) => s.chars().count() as f64,
                FieldValue::List(items) => items.len() as f64,
                FieldValue::Int(i) => *i as f64,
                FieldValue::Float(f) => *f,
                _ => {
                    return Err(ValidationError::NotComparable {
                        rule: rule.to_string(),
                        value: other.kind_name(),
                    });
                }
            };
            let bound = param.parse::<f64>().map_err(|_| invalid_param())?;
            (measure, bound)
        }
    };
    measure.partial_cmp(&bound).ok_or_else(invalid_param)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::coerce::Field;
    use crate::defaults::DefaultProvider;
    use crate::env::EnvProvider;
    use crate::tags::Tags;

    fn provide<P: Provider, T: Field>(
        provider: &ValidationProvider<P>,
        tags: &'static [(&'static str, &'static str)],
        target: &mut T,
    ) -> Result<(), ProviderError> {
        let field = FieldDescriptor::new("field", Tags::new(tags));
        provider.provide(&field, target.location())
    }

    // --- Decorator tests ---

    #[test]
    fn passes_valid_value_through() {
        let provider = ValidationProvider::new(DefaultProvider::new());
        let mut name = String::new();
        provide(
            &provider,
            &[("validate", "required"), ("default", "validation_test")],
            &mut name,
        )
        .unwrap();
        assert_eq!(name, "validation_test");
    }

    #[test]
    fn inner_failure_is_wrapped() {
        let provider = ValidationProvider::new(EnvProvider::from_vars(Vec::new()));
        let mut name = String::new();
        match provide(&provider, &[("validate", "required"), ("env", "TEST_ENV")], &mut name) {
            Err(ProviderError::ByProvider(inner)) => {
                assert!(matches!(*inner, ProviderError::EmptyValue));
            }
            other => panic!("Expected ByProvider, got {other:?}"),
        }
    }

    #[test]
    fn missing_default_fails_required() {
        let provider = ValidationProvider::new(DefaultProvider::new());
        let mut name = String::new();
        assert!(provide(&provider, &[("validate", "required")], &mut name).is_err());
    }

    #[test]
    fn rule_violation_is_reported() {
        let provider = ValidationProvider::new(DefaultProvider::new());
        let mut port = 0u16;
        match provide(&provider, &[("validate", "max=1024"), ("default", "8080")], &mut port) {
            Err(ProviderError::Validation(ValidationError::Failed { rule, value })) => {
                assert_eq!(rule, "max=1024");
                assert_eq!(value, "8080");
            }
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn rejected_value_is_not_kept() {
        let provider = ValidationProvider::new(DefaultProvider::new());
        let mut workers = 4u8;
        assert!(provide(&provider, &[("validate", "max=16"), ("default", "64")], &mut workers).is_err());
        assert_eq!(workers, 4);

        let mut hosts = vec!["keep".to_string()];
        assert!(provide(&provider, &[("validate", "len=1"), ("default", "a;b")], &mut hosts).is_err());
        assert_eq!(hosts, vec!["keep"]);
    }

    #[test]
    fn inner_failure_keeps_previous_value() {
        let provider = ValidationProvider::new(EnvProvider::from_vars(Vec::new()));
        let mut ratio = Some(0.5f64);
        assert!(provide(&provider, &[("env", "RATIO")], &mut ratio).is_err());
        assert_eq!(ratio, Some(0.5));
    }

    #[test]
    fn name_and_tag_come_from_inner() {
        let provider = ValidationProvider::new(DefaultProvider::new());
        assert_eq!(provider.name(), "ValidationProvider(DefaultProvider)");
        assert_eq!(provider.tag(), "default");
    }

    // --- Rule tests ---

    #[test]
    fn required_rejects_zero_values() {
        assert!(validate_value(&FieldValue::Str(String::new()), "required").is_err());
        assert!(validate_value(&FieldValue::Int(0), "required").is_err());
        assert!(validate_value(&FieldValue::Nil, "required").is_err());
        assert!(validate_value(&FieldValue::Int(3), "required").is_ok());
    }

    #[test]
    fn omitempty_skips_remaining_rules() {
        assert!(validate_value(&FieldValue::Str(String::new()), "omitempty,min=3").is_ok());
        assert!(validate_value(&FieldValue::Str("ab".into()), "omitempty,min=3").is_err());
    }

    #[test]
    fn string_length_bounds() {
        let value = FieldValue::Str("héllo".into());
        assert!(validate_value(&value, "min=5,max=5,len=5").is_ok());
        assert!(validate_value(&value, "gt=5").is_err());
    }

    #[test]
    fn numeric_bounds() {
        let value = FieldValue::Float(2.5);
        assert!(validate_value(&value, "gt=2,lt=3").is_ok());
        assert!(validate_value(&value, "gte=3").is_err());
    }

    #[test]
    fn list_length() {
        let value = FieldValue::List(vec![FieldValue::Int(1), FieldValue::Int(2)]);
        assert!(validate_value(&value, "len=2").is_ok());
        assert!(validate_value(&value, "min=3").is_err());
    }

    #[test]
    fn duration_bounds_accept_duration_text() {
        let value = FieldValue::Duration(Duration::from_secs(90));
        assert!(validate_value(&value, "min=1m,max=2m").is_ok());
        assert!(validate_value(&value, "max=1m").is_err());
    }

    #[test]
    fn duration_text_rules_use_parseable_form() {
        let value = FieldValue::Duration(Duration::from_secs(90));
        assert_eq!(value.to_string(), "1m30s");
        assert!(validate_value(&value, "oneof=30s 1m30s").is_ok());
        assert!(validate_value(&value, "oneof=90s").is_err());
    }

    #[test]
    fn oneof_and_equality() {
        let value = FieldValue::Str("debug".into());
        assert!(validate_value(&value, "oneof=info debug warn").is_ok());
        assert!(validate_value(&value, "oneof=info warn").is_err());
        assert!(validate_value(&value, "eq=debug,ne=info").is_ok());
        assert!(validate_value(&FieldValue::Int(5), "eq=5").is_ok());
        assert!(validate_value(&FieldValue::Float(5.0), "eq=5.0,ne=4").is_ok());
    }

    #[test]
    fn rule_errors() {
        assert!(matches!(
            validate_value(&FieldValue::Int(1), "between=1"),
            Err(ValidationError::UnknownRule(rule)) if rule == "between"
        ));
        assert!(matches!(
            validate_value(&FieldValue::Int(1), "min"),
            Err(ValidationError::MissingParam(_))
        ));
        assert!(matches!(
            validate_value(&FieldValue::Int(1), "min=abc"),
            Err(ValidationError::InvalidParam { .. })
        ));
        assert!(matches!(
            validate_value(&FieldValue::Bool(true), "min=1"),
            Err(ValidationError::NotComparable { .. })
        ));
    }

    #[test]
    fn empty_rule_list_passes() {
        assert!(validate_value(&FieldValue::Opaque, "").is_ok());
    }
}
