use std::fmt;

use crate::tags::Tags;

/// Destination kinds the coercion engine can classify.
///
/// The set is closed: every [`Location`](crate::Location) reports one of
/// these, and errors name the offending kind with its lowercase name
/// (`int8`, `chan`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Bool,
    /// Platform-width signed integer (`isize`).
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    /// Platform-width unsigned integer (`usize`).
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    /// Integer-backed elapsed time, parsed from text like `"1h30m"`.
    Duration,
    Pointer,
    Slice,
    /// A type that supplies its own parsing through [`FieldSetter`](crate::FieldSetter).
    Custom,
    Map,
    Chan,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Uint => "uint",
            Kind::Uint8 => "uint8",
            Kind::Uint16 => "uint16",
            Kind::Uint32 => "uint32",
            Kind::Uint64 => "uint64",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::Duration => "duration",
            Kind::Pointer => "ptr",
            Kind::Slice => "slice",
            Kind::Custom => "custom",
            Kind::Map => "map",
            Kind::Chan => "chan",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of one struct field: its name and its tag set.
///
/// Built by `#[derive(Configurable)]` from `'static` data, so it is cheap to
/// copy and lives only for one traversal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: &'static str,
    tags: Tags,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, tags: Tags) -> Self {
        Self { name, tags }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tags(&self) -> Tags {
        self.tags
    }

    /// Shorthand for `self.tags().get(key)`.
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_lowercase() {
        assert_eq!(Kind::Int8.to_string(), "int8");
        assert_eq!(Kind::Chan.to_string(), "chan");
        assert_eq!(Kind::Pointer.to_string(), "ptr");
    }

    #[test]
    fn descriptor_exposes_tags() {
        let field = FieldDescriptor::new("age", Tags::new(&[("env", "AGE_ENV")]));
        assert_eq!(field.name(), "age");
        assert_eq!(field.tag("env"), Some("AGE_ENV"));
        assert_eq!(field.tag("default"), None);
    }
}
