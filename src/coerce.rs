//! Coercing deserializer over merged config values.
//!
//! INI files and environment variables only ever produce strings, and a
//! repeated INI key produces an array. This deserializer lets the target type
//! decide what the text means:
//!
//! - integers accept decimal, `0x` hex and leading-`0` octal, with an
//!   optional `-`; out of range values are errors
//! - booleans accept `true/false`, `1/0`, `yes/no`, `on/off`, any case
//! - string targets accept any scalar and stringify it
//! - a single scalar satisfies a sequence target
//! - a one element array satisfies a scalar target; more is `too many values`
//! - unit enum variants are read from strings

use std::fmt;

use serde::de::{
    self, DeserializeOwned, DeserializeSeed, EnumAccess, IntoDeserializer, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};
use toml::{Table, Value};

use crate::error::InifigError;

/// A coercion failure at a dotted key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub key: String,
    pub reason: String,
}

impl Error {
    /// Attributes an error raised by a visitor to the key being read.
    fn within(mut self, path: &str) -> Self {
        if self.key.is_empty() {
            self.key = path.to_string();
        }
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            f.write_str(&self.reason)
        } else {
            write!(f, "{}: {}", self.key, self.reason)
        }
    }
}

impl std::error::Error for Error {}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error {
            key: String::new(),
            reason: msg.to_string(),
        }
    }
}

impl From<Error> for InifigError {
    fn from(e: Error) -> Self {
        InifigError::InvalidValue {
            key: if e.key.is_empty() {
                "<root>".to_string()
            } else {
                e.key
            },
            reason: e.reason,
        }
    }
}

/// Deserializes `T` from a merged table, coercing values as needed.
pub fn from_table<T: DeserializeOwned>(table: Table) -> Result<T, Error> {
    T::deserialize(Coerce::new(Value::Table(table)))
}

/// A [`serde::Deserializer`] over one `toml::Value`.
pub struct Coerce {
    value: Value,
    path: String,
}

impl Coerce {
    pub fn new(value: Value) -> Self {
        Self::at(value, String::new())
    }

    fn at(value: Value, path: String) -> Self {
        Self { value, path }
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error {
            key: self.path.clone(),
            reason: reason.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        self.invalid(format!("expected {expected}, found {}", describe(&self.value)))
    }

    /// Unwraps a one element array for a scalar target.
    fn single(self) -> Result<Coerce, Error> {
        match self.value {
            Value::Array(mut items) if items.len() == 1 => {
                let item = items.remove(0);
                Ok(Coerce::at(item, self.path))
            }
            Value::Array(ref items) if items.is_empty() => Err(self.invalid("no value")),
            Value::Array(_) => Err(self.invalid("too many values")),
            _ => Ok(self),
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "a string",
        Value::Integer(_) => "an integer",
        Value::Float(_) => "a float",
        Value::Boolean(_) => "a boolean",
        Value::Datetime(_) => "a datetime",
        Value::Array(_) => "a list",
        Value::Table(_) => "a table",
    }
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn parse_uint(s: &str) -> Result<u64, String> {
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x") {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err(format!("invalid number '{s}'"));
    }
    u64::from_str_radix(digits, radix).map_err(|e| format!("invalid number '{s}': {e}"))
}

pub fn parse_int(s: &str) -> Result<i64, String> {
    let (negative, magnitude) = match s.strip_prefix('-') {
        Some(rest) => (true, parse_uint(rest)?),
        None => (false, parse_uint(s)?),
    };
    let signed = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };
    i64::try_from(signed).map_err(|_| format!("'{s}' overflows a 64-bit integer"))
}

macro_rules! deserialize_signed {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
            match self.value {
                Value::Integer(i) => visitor.visit_i64(i),
                Value::String(ref s) => {
                    let i = parse_int(s).map_err(|reason| self.invalid(reason))?;
                    visitor.visit_i64(i)
                }
                Value::Array(_) => self.single()?.$method(visitor),
                _ => Err(self.unexpected("an integer")),
            }
        }
    )*};
}

// Unsigned targets: values above i64::MAX only arrive as text.
macro_rules! deserialize_unsigned {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
            match self.value {
                Value::Integer(i) => visitor.visit_i64(i),
                Value::String(ref s) if s.starts_with('-') => {
                    let i = parse_int(s).map_err(|reason| self.invalid(reason))?;
                    visitor.visit_i64(i)
                }
                Value::String(ref s) => {
                    let u = parse_uint(s).map_err(|reason| self.invalid(reason))?;
                    visitor.visit_u64(u)
                }
                Value::Array(_) => self.single()?.$method(visitor),
                _ => Err(self.unexpected("an integer")),
            }
        }
    )*};
}

macro_rules! deserialize_float {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
            match self.value {
                Value::Float(f) => visitor.visit_f64(f),
                Value::Integer(i) => visitor.visit_f64(i as f64),
                Value::String(ref s) => {
                    let f = s
                        .parse::<f64>()
                        .map_err(|e| self.invalid(format!("invalid number '{s}': {e}")))?;
                    visitor.visit_f64(f)
                }
                Value::Array(_) => self.single()?.$method(visitor),
                _ => Err(self.unexpected("a number")),
            }
        }
    )*};
}

impl<'de> de::Deserializer<'de> for Coerce {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        let path = self.path;
        match self.value {
            Value::String(s) => visitor.visit_string(s),
            Value::Integer(i) => visitor.visit_i64(i),
            Value::Float(f) => visitor.visit_f64(f),
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::Datetime(dt) => visitor.visit_string(dt.to_string()),
            Value::Array(items) => visitor.visit_seq(ArrayAccess::new(items, path)),
            Value::Table(table) => visitor.visit_map(TableAccess::new(table, path)),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::Integer(0) => visitor.visit_bool(false),
            Value::Integer(1) => visitor.visit_bool(true),
            Value::String(ref s) => match parse_bool(s) {
                Some(b) => visitor.visit_bool(b),
                None => Err(self.invalid(format!("invalid boolean '{s}'"))),
            },
            Value::Array(_) => self.single()?.deserialize_bool(visitor),
            _ => Err(self.unexpected("a boolean")),
        }
    }

    deserialize_signed!(deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64);
    deserialize_unsigned!(deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64);
    deserialize_float!(deserialize_f32 deserialize_f64);

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::String(s) => visitor.visit_string(s),
            Value::Integer(i) => visitor.visit_string(i.to_string()),
            Value::Float(f) => visitor.visit_string(f.to_string()),
            Value::Boolean(b) => visitor.visit_string(b.to_string()),
            Value::Datetime(dt) => visitor.visit_string(dt.to_string()),
            Value::Array(_) => self.single()?.deserialize_string(visitor),
            Value::Table(_) => Err(self.unexpected("a string")),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_any(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_any(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Array(items) => visitor.visit_seq(ArrayAccess::new(items, self.path)),
            Value::Table(_) => Err(self.unexpected("a list")),
            scalar => visitor.visit_seq(ArrayAccess::new(vec![scalar], self.path)),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        match self.value {
            Value::Table(table) => visitor.visit_map(TableAccess::new(table, self.path)),
            _ => Err(self.unexpected("a table")),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        match self.value {
            Value::String(s) => visitor.visit_enum(s.into_deserializer()),
            Value::Table(table) if table.len() == 1 => {
                let Some((variant, value)) = table.into_iter().next() else {
                    return Err(Error {
                        key: self.path,
                        reason: "expected a single variant".into(),
                    });
                };
                let path = join(&self.path, &variant);
                visitor.visit_enum(Variant {
                    variant,
                    value,
                    path,
                })
            }
            Value::Array(_) => self.single()?.deserialize_enum(name, variants, visitor),
            _ => Err(self.unexpected("a variant name")),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Error> {
        visitor.visit_unit()
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

struct ArrayAccess {
    items: std::vec::IntoIter<Value>,
    path: String,
}

impl ArrayAccess {
    fn new(items: Vec<Value>, path: String) -> Self {
        Self {
            items: items.into_iter(),
            path,
        }
    }
}

impl<'de> SeqAccess<'de> for ArrayAccess {
    type Error = Error;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Error> {
        match self.items.next() {
            Some(item) => seed
                .deserialize(Coerce::at(item, self.path.clone()))
                .map(Some)
                .map_err(|e| e.within(&self.path)),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct TableAccess {
    entries: toml::map::IntoIter,
    pending: Option<(String, Value)>,
    path: String,
}

impl TableAccess {
    fn new(table: Table, path: String) -> Self {
        Self {
            entries: table.into_iter(),
            pending: None,
            path,
        }
    }
}

impl<'de> MapAccess<'de> for TableAccess {
    type Error = Error;

    fn next_key_seed<K: DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>, Error> {
        let Some((key, value)) = self.entries.next() else {
            return Ok(None);
        };
        let path = join(&self.path, &key);
        self.pending = Some((path, value));
        seed.deserialize(key.into_deserializer()).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, Error> {
        let Some((path, value)) = self.pending.take() else {
            return Err(de::Error::custom("value requested before key"));
        };
        seed.deserialize(Coerce::at(value, path.clone()))
            .map_err(|e| e.within(&path))
    }
}

struct Variant {
    variant: String,
    value: Value,
    path: String,
}

impl<'de> EnumAccess<'de> for Variant {
    type Error = Error;
    type Variant = Coerce;

    fn variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<(T::Value, Coerce), Error> {
        let tag = seed.deserialize(IntoDeserializer::<Error>::into_deserializer(self.variant))?;
        Ok((tag, Coerce::at(self.value, self.path)))
    }
}

impl<'de> VariantAccess<'de> for Coerce {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        Ok(())
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, Error> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        de::Deserializer::deserialize_map(self, visitor)
    }
}
