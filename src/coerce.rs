//! Value coercion: writing provider text into typed field storage.
//!
//! Every leaf field hands the engine a [`Location`], a typed mutable view of
//! its storage. Dispatch follows a fixed order:
//!
//! 1. [`Location::Custom`]: the type parses the text itself ([`FieldSetter`]).
//! 2. [`Location::Pointer`]: an `Option<T>` is allocated with a strictly
//!    parsed value ([`Pointee`]).
//! 3. [`Location::Slice`]: a `Vec<T>` is rebuilt from `;`-separated text
//!    ([`Element`]).
//! 4. Plain scalars are parsed *leniently*: bad text writes the zero value and
//!    the call still succeeds.
//!
//! Channels and maps have no textual form and always report
//! [`CoercionError::UnsupportedType`].

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::mem;
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use tracing::warn;

use crate::duration;
use crate::error::{BoxError, CoercionError};
use crate::types::{FieldDescriptor, Kind};

pub const SLICE_SEPARATOR: char = ';';

/// Typed mutable view of one leaf field's storage.
pub enum Location<'a> {
    String(&'a mut String),
    Bool(&'a mut bool),
    Int(&'a mut isize),
    Int8(&'a mut i8),
    Int16(&'a mut i16),
    Int32(&'a mut i32),
    Int64(&'a mut i64),
    Uint(&'a mut usize),
    Uint8(&'a mut u8),
    Uint16(&'a mut u16),
    Uint32(&'a mut u32),
    Uint64(&'a mut u64),
    Float32(&'a mut f32),
    Float64(&'a mut f64),
    Duration(&'a mut Duration),
    Pointer(&'a mut dyn PointerSlot),
    Slice(&'a mut dyn SliceSlot),
    Custom(&'a mut dyn FieldSetter),
    /// Storage with no textual form (channels, maps).
    Unsupported(Kind),
}

impl Location<'_> {
    pub fn kind(&self) -> Kind {
        match self {
            Location::String(_) => Kind::String,
            Location::Bool(_) => Kind::Bool,
            Location::Int(_) => Kind::Int,
            Location::Int8(_) => Kind::Int8,
            Location::Int16(_) => Kind::Int16,
            Location::Int32(_) => Kind::Int32,
            Location::Int64(_) => Kind::Int64,
            Location::Uint(_) => Kind::Uint,
            Location::Uint8(_) => Kind::Uint8,
            Location::Uint16(_) => Kind::Uint16,
            Location::Uint32(_) => Kind::Uint32,
            Location::Uint64(_) => Kind::Uint64,
            Location::Float32(_) => Kind::Float32,
            Location::Float64(_) => Kind::Float64,
            Location::Duration(_) => Kind::Duration,
            Location::Pointer(_) => Kind::Pointer,
            Location::Slice(_) => Kind::Slice,
            Location::Custom(_) => Kind::Custom,
            Location::Unsupported(kind) => *kind,
        }
    }

    /// Borrow the same storage again for a shorter lifetime, so that the
    /// provider chain can offer one location to several providers in turn.
    pub fn reborrow(&mut self) -> Location<'_> {
        match self {
            Location::String(v) => Location::String(v),
            Location::Bool(v) => Location::Bool(v),
            Location::Int(v) => Location::Int(v),
            Location::Int8(v) => Location::Int8(v),
            Location::Int16(v) => Location::Int16(v),
            Location::Int32(v) => Location::Int32(v),
            Location::Int64(v) => Location::Int64(v),
            Location::Uint(v) => Location::Uint(v),
            Location::Uint8(v) => Location::Uint8(v),
            Location::Uint16(v) => Location::Uint16(v),
            Location::Uint32(v) => Location::Uint32(v),
            Location::Uint64(v) => Location::Uint64(v),
            Location::Float32(v) => Location::Float32(v),
            Location::Float64(v) => Location::Float64(v),
            Location::Duration(v) => Location::Duration(v),
            Location::Pointer(slot) => Location::Pointer(&mut **slot),
            Location::Slice(slot) => Location::Slice(&mut **slot),
            Location::Custom(setter) => Location::Custom(&mut **setter),
            Location::Unsupported(kind) => Location::Unsupported(*kind),
        }
    }

    /// Move the stored value out, leaving the zero value behind. Custom
    /// setter fields have no zero value and are left in place.
    pub fn take(&mut self) -> Taken {
        fn boxed<T: Default + 'static>(v: &mut T) -> Option<Box<dyn Any>> {
            Some(Box::new(mem::take(v)))
        }
        let saved = match self {
            Location::String(v) => boxed(&mut **v),
            Location::Bool(v) => boxed(&mut **v),
            Location::Int(v) => boxed(&mut **v),
            Location::Int8(v) => boxed(&mut **v),
            Location::Int16(v) => boxed(&mut **v),
            Location::Int32(v) => boxed(&mut **v),
            Location::Int64(v) => boxed(&mut **v),
            Location::Uint(v) => boxed(&mut **v),
            Location::Uint8(v) => boxed(&mut **v),
            Location::Uint16(v) => boxed(&mut **v),
            Location::Uint32(v) => boxed(&mut **v),
            Location::Uint64(v) => boxed(&mut **v),
            Location::Float32(v) => boxed(&mut **v),
            Location::Float64(v) => boxed(&mut **v),
            Location::Duration(v) => boxed(&mut **v),
            Location::Pointer(slot) => Some(slot.take_any()),
            Location::Slice(slot) => Some(slot.take_any()),
            Location::Custom(_) | Location::Unsupported(_) => None,
        };
        Taken(saved)
    }

    /// Put back a value moved out by [`Location::take`].
    pub fn restore(&mut self, taken: Taken) {
        fn put<T: 'static>(v: &mut T, saved: Box<dyn Any>) {
            if let Ok(saved) = saved.downcast::<T>() {
                *v = *saved;
            }
        }
        let Some(saved) = taken.0 else {
            return;
        };
        match self {
            Location::String(v) => put(&mut **v, saved),
            Location::Bool(v) => put(&mut **v, saved),
            Location::Int(v) => put(&mut **v, saved),
            Location::Int8(v) => put(&mut **v, saved),
            Location::Int16(v) => put(&mut **v, saved),
            Location::Int32(v) => put(&mut **v, saved),
            Location::Int64(v) => put(&mut **v, saved),
            Location::Uint(v) => put(&mut **v, saved),
            Location::Uint8(v) => put(&mut **v, saved),
            Location::Uint16(v) => put(&mut **v, saved),
            Location::Uint32(v) => put(&mut **v, saved),
            Location::Uint64(v) => put(&mut **v, saved),
            Location::Float32(v) => put(&mut **v, saved),
            Location::Float64(v) => put(&mut **v, saved),
            Location::Duration(v) => put(&mut **v, saved),
            Location::Pointer(slot) => slot.restore_any(saved),
            Location::Slice(slot) => slot.restore_any(saved),
            Location::Custom(_) | Location::Unsupported(_) => {}
        }
    }

    /// Snapshot of the value currently stored.
    pub fn value(&self) -> FieldValue {
        match self {
            Location::String(v) => v.to_value(),
            Location::Bool(v) => v.to_value(),
            Location::Int(v) => v.to_value(),
            Location::Int8(v) => v.to_value(),
            Location::Int16(v) => v.to_value(),
            Location::Int32(v) => v.to_value(),
            Location::Int64(v) => v.to_value(),
            Location::Uint(v) => v.to_value(),
            Location::Uint8(v) => v.to_value(),
            Location::Uint16(v) => v.to_value(),
            Location::Uint32(v) => v.to_value(),
            Location::Uint64(v) => v.to_value(),
            Location::Float32(v) => v.to_value(),
            Location::Float64(v) => v.to_value(),
            Location::Duration(v) => v.to_value(),
            Location::Pointer(slot) => slot.value(),
            Location::Slice(slot) => slot.value(),
            Location::Custom(setter) => setter.field_value(),
            Location::Unsupported(_) => FieldValue::Opaque,
        }
    }
}

impl fmt::Debug for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Location")
            .field("kind", &self.kind())
            .field("value", &self.value())
            .finish()
    }
}

/// A field value moved out by [`Location::take`].
#[derive(Debug)]
pub struct Taken(Option<Box<dyn Any>>);

/// Owned snapshot of a field value, used by validation rules.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
    Int(i128),
    Float(f64),
    Duration(Duration),
    /// An unset `Option`.
    Nil,
    List(Vec<FieldValue>),
    /// A value the engine cannot inspect.
    Opaque,
}

impl FieldValue {
    /// Whether this is the zero value of its kind.
    pub fn is_zero(&self) -> bool {
        match self {
            FieldValue::Str(s) => s.is_empty(),
            FieldValue::Bool(b) => !b,
            FieldValue::Int(i) => *i == 0,
            FieldValue::Float(f) => *f == 0.0,
            FieldValue::Duration(d) => d.is_zero(),
            FieldValue::Nil => true,
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Opaque => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Str(_) => "string",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Duration(_) => "duration",
            FieldValue::Nil => "nil",
            FieldValue::List(_) => "list",
            FieldValue::Opaque => "opaque",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => f.write_str(s),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Duration(d) => f.write_str(&duration::format(*d)),
            FieldValue::Nil => f.write_str("<nil>"),
            FieldValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{SLICE_SEPARATOR}")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            FieldValue::Opaque => f.write_str("<opaque>"),
        }
    }
}

/// Custom parsing hook. A field type implementing this takes full control
/// of how text becomes its value, ahead of every built-in rule.
pub trait FieldSetter {
    fn set_field(&mut self, field: &FieldDescriptor, text: &str) -> Result<(), BoxError>;

    /// Snapshot for validation rules. Opaque unless overridden.
    fn field_value(&self) -> FieldValue {
        FieldValue::Opaque
    }
}

/// Types with a typed [`Location`]. Implemented for the built-in scalars,
/// `Option<T>`, `Vec<T>`, and (as unsupported) channels and maps.
///
/// A [`FieldSetter`] type opts in with a one-line impl returning
/// `Location::Custom(self)`.
pub trait Field {
    fn location(&mut self) -> Location<'_>;
}

/// A scalar parsed directly from text.
pub trait Scalar: Sized + Default {
    const KIND: Kind;

    /// Strict parse; errors carry the kind and the offending text.
    fn parse(text: &str) -> Result<Self, CoercionError>;

    fn to_value(&self) -> FieldValue;
}

/// A type that an `Option<T>` field can allocate from text.
pub trait Pointee: Sized {
    const KIND: Kind;

    /// `Ok(None)` leaves the pointer unset.
    fn allocate(text: &str) -> Result<Option<Self>, CoercionError>;

    fn pointee_value(&self) -> FieldValue;
}

/// A type that can appear as an item of a `Vec<T>` field.
pub trait Element: Sized {
    const KIND: Kind;

    fn element(text: &str, index: usize) -> Result<Self, CoercionError>;

    fn element_value(&self) -> FieldValue;
}

/// Object-safe face of an `Option<T>` field.
pub trait PointerSlot {
    fn pointee_kind(&self) -> Kind;
    fn assign(&mut self, text: &str) -> Result<(), CoercionError>;
    fn value(&self) -> FieldValue;
    /// Move the value out as `Box<Option<T>>`, leaving `None`.
    fn take_any(&mut self) -> Box<dyn Any>;
    fn restore_any(&mut self, saved: Box<dyn Any>);
}

/// Object-safe face of a `Vec<T>` field.
pub trait SliceSlot {
    fn element_kind(&self) -> Kind;
    fn assign(&mut self, text: &str) -> Result<(), CoercionError>;
    fn value(&self) -> FieldValue;
    /// Move the items out as `Box<Vec<T>>`, leaving an empty vector.
    fn take_any(&mut self) -> Box<dyn Any>;
    fn restore_any(&mut self, saved: Box<dyn Any>);
}

macro_rules! integer_scalars {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Scalar for $ty {
            const KIND: Kind = Kind::$kind;

            fn parse(text: &str) -> Result<Self, CoercionError> {
                text.parse::<$ty>()
                    .map_err(|err| CoercionError::invalid(Kind::$kind, text, err))
            }

            fn to_value(&self) -> FieldValue {
                FieldValue::Int(*self as i128)
            }
        }
    )*};
}

integer_scalars!(
    isize => Int,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    usize => Uint,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
);

macro_rules! float_scalars {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Scalar for $ty {
            const KIND: Kind = Kind::$kind;

            fn parse(text: &str) -> Result<Self, CoercionError> {
                text.parse::<$ty>()
                    .map_err(|err| CoercionError::invalid(Kind::$kind, text, err))
            }

            fn to_value(&self) -> FieldValue {
                FieldValue::Float(*self as f64)
            }
        }
    )*};
}

float_scalars!(f32 => Float32, f64 => Float64);

impl Scalar for String {
    const KIND: Kind = Kind::String;

    fn parse(text: &str) -> Result<Self, CoercionError> {
        Ok(text.to_owned())
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Str(self.clone())
    }
}

impl Scalar for bool {
    const KIND: Kind = Kind::Bool;

    fn parse(text: &str) -> Result<Self, CoercionError> {
        parse_bool(text)
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Bool(*self)
    }
}

impl Scalar for Duration {
    const KIND: Kind = Kind::Duration;

    fn parse(text: &str) -> Result<Self, CoercionError> {
        duration::parse(text)
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Duration(*self)
    }
}

macro_rules! scalar_fields {
    ($($ty:ty => $variant:ident),* $(,)?) => {$(
        impl Field for $ty {
            fn location(&mut self) -> Location<'_> {
                Location::$variant(self)
            }
        }

        impl Element for $ty {
            const KIND: Kind = <$ty as Scalar>::KIND;

            fn element(text: &str, _index: usize) -> Result<Self, CoercionError> {
                Ok(parse_lenient(text))
            }

            fn element_value(&self) -> FieldValue {
                self.to_value()
            }
        }
    )*};
}

scalar_fields!(
    String => String,
    bool => Bool,
    isize => Int,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    usize => Uint,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
    Duration => Duration,
);

macro_rules! strict_pointees {
    ($($ty:ty),* $(,)?) => {$(
        impl Pointee for $ty {
            const KIND: Kind = <$ty as Scalar>::KIND;

            fn allocate(text: &str) -> Result<Option<Self>, CoercionError> {
                <$ty as Scalar>::parse(text).map(Some)
            }

            fn pointee_value(&self) -> FieldValue {
                self.to_value()
            }
        }
    )*};
}

strict_pointees!(bool, isize, i8, i16, i32, i64, usize, u8, u16, u32, u64, f32, f64, Duration);

impl Pointee for String {
    const KIND: Kind = Kind::String;

    fn allocate(text: &str) -> Result<Option<Self>, CoercionError> {
        Ok((!text.is_empty()).then(|| text.to_owned()))
    }

    fn pointee_value(&self) -> FieldValue {
        self.to_value()
    }
}

macro_rules! unsupported_types {
    ($([$($generics:tt)*] $ty:ty => $kind:ident),* $(,)?) => {$(
        impl<$($generics)*> Field for $ty {
            fn location(&mut self) -> Location<'_> {
                Location::Unsupported(Kind::$kind)
            }
        }

        impl<$($generics)*> Pointee for $ty {
            const KIND: Kind = Kind::$kind;

            fn allocate(_text: &str) -> Result<Option<Self>, CoercionError> {
                Err(CoercionError::UnsupportedType(Kind::$kind))
            }

            fn pointee_value(&self) -> FieldValue {
                FieldValue::Opaque
            }
        }

        impl<$($generics)*> Element for $ty {
            const KIND: Kind = Kind::$kind;

            fn element(_text: &str, _index: usize) -> Result<Self, CoercionError> {
                Err(CoercionError::UnsupportedSliceElementType(Kind::$kind))
            }

            fn element_value(&self) -> FieldValue {
                FieldValue::Opaque
            }
        }
    )*};
}

unsupported_types!(
    [T] Sender<T> => Chan,
    [T] Receiver<T> => Chan,
    [K, V, S] HashMap<K, V, S> => Map,
    [K, V] BTreeMap<K, V> => Map,
);

impl<T: Pointee + 'static> Field for Option<T> {
    fn location(&mut self) -> Location<'_> {
        Location::Pointer(self)
    }
}

impl<T: Pointee + 'static> PointerSlot for Option<T> {
    fn pointee_kind(&self) -> Kind {
        T::KIND
    }

    fn assign(&mut self, text: &str) -> Result<(), CoercionError> {
        if let Some(value) = T::allocate(text)? {
            *self = Some(value);
        }
        Ok(())
    }

    fn value(&self) -> FieldValue {
        match self {
            Some(value) => value.pointee_value(),
            None => FieldValue::Nil,
        }
    }

    fn take_any(&mut self) -> Box<dyn Any> {
        Box::new(self.take())
    }

    fn restore_any(&mut self, saved: Box<dyn Any>) {
        if let Ok(saved) = saved.downcast::<Option<T>>() {
            *self = *saved;
        }
    }
}

/// Slice items that are pointers parse strictly; one bad item fails the
/// whole slice.
impl<T: Pointee + 'static> Element for Option<T> {
    const KIND: Kind = Kind::Pointer;

    fn element(text: &str, index: usize) -> Result<Self, CoercionError> {
        T::allocate(text).map_err(|err| CoercionError::SliceElement {
            type_name: std::any::type_name::<Option<T>>(),
            index,
            source: Box::new(err),
        })
    }

    fn element_value(&self) -> FieldValue {
        PointerSlot::value(self)
    }
}

impl<T: Element + 'static> Field for Vec<T> {
    fn location(&mut self) -> Location<'_> {
        Location::Slice(self)
    }
}

impl<T: Element + 'static> SliceSlot for Vec<T> {
    fn element_kind(&self) -> Kind {
        T::KIND
    }

    fn assign(&mut self, text: &str) -> Result<(), CoercionError> {
        let items = split_slice(text);
        if items.is_empty() {
            return Err(CoercionError::EmptySlice);
        }
        let values = items
            .iter()
            .enumerate()
            .map(|(index, item)| T::element(item, index))
            .collect::<Result<Vec<_>, _>>()?;
        *self = values;
        Ok(())
    }

    fn value(&self) -> FieldValue {
        FieldValue::List(self.iter().map(Element::element_value).collect())
    }

    fn take_any(&mut self) -> Box<dyn Any> {
        Box::new(mem::take(self))
    }

    fn restore_any(&mut self, saved: Box<dyn Any>) {
        if let Ok(saved) = saved.downcast::<Vec<T>>() {
            *self = *saved;
        }
    }
}

/// Write `text` into `location`, dispatching as described in the module docs.
pub fn set_field(
    field: &FieldDescriptor,
    location: Location<'_>,
    text: &str,
) -> Result<(), CoercionError> {
    match location {
        Location::Custom(setter) => setter.set_field(field, text).map_err(CoercionError::Custom),
        Location::Pointer(slot) => assign_pointer(slot, text),
        Location::Slice(slot) => assign_slice(slot, text),
        scalar => assign_scalar(scalar, text),
    }
}

/// Strict assignment through an `Option<T>`; see [`Pointee`].
pub fn assign_pointer(slot: &mut dyn PointerSlot, text: &str) -> Result<(), CoercionError> {
    slot.assign(text)
}

/// Rebuild a `Vec<T>` from `;`-separated text; see [`Element`].
pub fn assign_slice(slot: &mut dyn SliceSlot, text: &str) -> Result<(), CoercionError> {
    slot.assign(text)
}

/// Lenient scalar assignment. Unparseable text stores the zero value.
pub fn assign_scalar(location: Location<'_>, text: &str) -> Result<(), CoercionError> {
    match location {
        Location::String(v) => *v = parse_lenient(text),
        Location::Bool(v) => *v = parse_lenient(text),
        Location::Int(v) => *v = parse_lenient(text),
        Location::Int8(v) => *v = parse_lenient(text),
        Location::Int16(v) => *v = parse_lenient(text),
        Location::Int32(v) => *v = parse_lenient(text),
        Location::Int64(v) => *v = parse_lenient(text),
        Location::Uint(v) => *v = parse_lenient(text),
        Location::Uint8(v) => *v = parse_lenient(text),
        Location::Uint16(v) => *v = parse_lenient(text),
        Location::Uint32(v) => *v = parse_lenient(text),
        Location::Uint64(v) => *v = parse_lenient(text),
        Location::Float32(v) => *v = parse_lenient(text),
        Location::Float64(v) => *v = parse_lenient(text),
        Location::Duration(v) => *v = parse_lenient(text),
        other => return Err(CoercionError::UnsupportedType(other.kind())),
    }
    Ok(())
}

fn parse_lenient<T: Scalar>(text: &str) -> T {
    T::parse(text).unwrap_or_else(|err| {
        warn!(%err, "storing zero value");
        T::default()
    })
}

/// Split slice text on `;`, trimming items and dropping empty ones.
pub fn split_slice(text: &str) -> Vec<&str> {
    text.split(SLICE_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(text: &str) -> Result<bool, CoercionError> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(CoercionError::invalid(Kind::Bool, text, "not a boolean")),
    }
}
