//! Dynamic property values exchanged between handlers and mapped types.
//!
//! Handlers produce and consume [`Value`]s. A mapped type converts between
//! its own fields and a [`PropertyValues`] bag through [`FromValue`] and
//! [`ToValue`].

use chrono::NaiveDateTime;
use contour_types::{Guid, Language};

use crate::declaration::Mapped;
use crate::error::{MapperError, MapperResult};
use crate::fields::Image;
use crate::lazy::{Lazy, RelatedValue};

/// A property value in transit between a record and a mapped instance.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// No value: an absent field, a root item's parent, an unset image.
    #[default]
    Empty,
    Text(String),
    Integer(i64),
    Boolean(bool),
    Guid(Guid),
    Language(Language),
    Version(i32),
    DateTime(NaiveDateTime),
    Image(Image),
    /// A single related object, loaded or pending.
    Related(RelatedValue),
    /// An ordered list of related objects.
    RelatedList(Vec<RelatedValue>),
}

impl Value {
    /// Short name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::Guid(_) => "guid",
            Self::Language(_) => "language",
            Self::Version(_) => "version",
            Self::DateTime(_) => "date-time",
            Self::Image(_) => "image",
            Self::Related(_) => "related object",
            Self::RelatedList(_) => "related list",
        }
    }

    /// Returns `true` for [`Value::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Conversion from a [`Value`] into a Rust field type.
///
/// Returns `None` when the value has the wrong shape. [`Value::Empty`] always
/// converts to the type's zero value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

/// Conversion from a Rust field into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Empty => Some(String::new()),
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Empty => Some(0),
            Value::Integer(n) => Some(n),
            Value::Version(v) => Some(i64::from(v)),
            _ => None,
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Empty => Some(0),
            Value::Integer(n) => i32::try_from(n).ok(),
            Value::Version(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Empty => Some(false),
            Value::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl FromValue for Guid {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Empty => Some(Guid::nil()),
            Value::Guid(id) => Some(id),
            _ => None,
        }
    }
}

impl FromValue for Language {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Empty => Some(Language::default()),
            Value::Language(lang) => Some(lang),
            _ => None,
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Empty => Some(NaiveDateTime::default()),
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }
}

impl FromValue for Option<Image> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Empty => Some(None),
            Value::Image(image) => Some(Some(image)),
            _ => None,
        }
    }
}

impl<T: Mapped> FromValue for Option<Lazy<T>> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Empty => Some(None),
            Value::Related(related) => Lazy::from_related(related).map(Some),
            _ => None,
        }
    }
}

impl<T: Mapped> FromValue for Vec<Lazy<T>> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Empty => Some(Vec::new()),
            Value::RelatedList(list) => list.into_iter().map(Lazy::from_related).collect(),
            _ => None,
        }
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Text(self.to_string())
    }
}

impl ToValue for i64 {
    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }
}

impl ToValue for i32 {
    fn to_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }
}

impl ToValue for Guid {
    fn to_value(&self) -> Value {
        Value::Guid(*self)
    }
}

impl ToValue for Language {
    fn to_value(&self) -> Value {
        Value::Language(self.clone())
    }
}

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl ToValue for Option<Image> {
    fn to_value(&self) -> Value {
        match self {
            Some(image) => Value::Image(image.clone()),
            None => Value::Empty,
        }
    }
}

impl<T: Mapped> ToValue for Option<Lazy<T>> {
    fn to_value(&self) -> Value {
        match self {
            Some(lazy) => Value::Related(lazy.to_related()),
            None => Value::Empty,
        }
    }
}

impl<T: Mapped> ToValue for Vec<Lazy<T>> {
    fn to_value(&self) -> Value {
        Value::RelatedList(self.iter().map(Lazy::to_related).collect())
    }
}

/// Ordered bag of named property values.
///
/// Handlers fill it while reading a record; [`Mapped::from_values`] drains it
/// into a typed instance. The reverse direction uses [`Mapped::to_values`].
#[derive(Clone, Debug, Default)]
pub struct PropertyValues {
    entries: Vec<(String, Value)>,
}

impl PropertyValues {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Borrow a value by property name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Remove and return a value by property name.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Remove a value and convert it to `T`.
    ///
    /// A missing property converts from [`Value::Empty`].
    pub fn take<T: FromValue>(&mut self, name: &str) -> MapperResult<T> {
        let value = self.remove(name).unwrap_or_default();
        let found = value.kind_name();
        T::from_value(value).ok_or_else(|| MapperError::TypeMismatch {
            property: name.to_string(),
            expected: std::any::type_name::<T>(),
            found,
        })
    }

    /// Convert `value` and store it under `name`.
    pub fn put<T: ToValue + ?Sized>(&mut self, name: &str, value: &T) {
        self.insert(name, value.to_value());
    }

    /// Property names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Number of values held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no values are held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
