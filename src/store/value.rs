use std::fmt;
use std::io::{Read, Write};

use serde_json::json;

use super::codec;
use super::options::DecodeLimits;
use crate::types::{Result, RleError};

/// Values a store can hold when a column mixes kinds.
///
/// Records are ordered field lists: two records with the same fields in a
/// different order are different values. Floats compare by bit pattern, so
/// equality is total and stable across encode/decode.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// 64-bit float.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Plain record of named fields.
    Record(Vec<(String, Value)>),
    /// Ordered list of values.
    List(Vec<Value>),
}

/// Discriminant of a [`Value`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// See [`Value::Null`].
    Null,
    /// See [`Value::Bool`].
    Bool,
    /// See [`Value::Int`].
    Int,
    /// See [`Value::UInt`].
    UInt,
    /// See [`Value::Float`].
    Float,
    /// See [`Value::String`].
    String,
    /// See [`Value::Bytes`].
    Bytes,
    /// See [`Value::Record`].
    Record,
    /// See [`Value::List`].
    List,
}

impl ValueKind {
    /// Lowercase name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::Record => "record",
            ValueKind::List => "list",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Record(_) => ValueKind::Record,
            Value::List(_) => ValueKind::List,
        }
    }

    /// Builds a record from `(name, value)` pairs, keeping their order.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Record(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Converts the value into JSON for export.
    ///
    /// Bytes become an array of numbers and non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => json!(b),
            Value::Int(i) => json!(i),
            Value::UInt(u) => json!(u),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => json!(s),
            Value::Bytes(b) => json!(b),
            Value::Record(fields) => {
                let mut map = serde_json::Map::with_capacity(fields.len());
                for (name, value) in fields {
                    map.insert(name.clone(), value.to_json());
                }
                serde_json::Value::Object(map)
            }
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => {
                f.write_str("0x")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Value::Record(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i64 => Int,
    u64 => UInt,
    f64 => Float,
    String => String,
    Vec<u8> => Bytes,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A type that can be stored in an [`super::RleStore`].
///
/// Implementations write a self-describing tagged encoding so a stream can
/// be decoded without knowing the writer's type.
pub trait StoredValue: Clone + PartialEq + Send + Sync + 'static {
    /// Whether two values belong to the same run.
    fn identical(&self, other: &Self) -> bool {
        self == other
    }

    /// Writes the tagged encoding of `self`.
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<()>;

    /// Reads one tagged value.
    fn decode<R: Read + ?Sized>(r: &mut R, limits: &DecodeLimits) -> Result<Self>;
}

impl StoredValue for Value {
    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        codec::write_value(w, self)
    }

    fn decode<R: Read + ?Sized>(r: &mut R, limits: &DecodeLimits) -> Result<Self> {
        codec::read_value(r, limits)
    }
}

fn mismatch(expected: ValueKind, found: &Value) -> RleError {
    RleError::TypeMismatch {
        expected: expected.name(),
        found: found.kind().name(),
    }
}

macro_rules! impl_stored_scalar {
    ($ty:ty, $kind:ident, |$w:ident, $v:ident| $write:expr) => {
        impl StoredValue for $ty {
            fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
                let ($w, $v) = (w, self);
                $write
            }

            fn decode<R: Read + ?Sized>(r: &mut R, limits: &DecodeLimits) -> Result<Self> {
                match codec::read_value(r, limits)? {
                    Value::$kind(v) => Ok(v),
                    other => Err(mismatch(ValueKind::$kind, &other)),
                }
            }
        }
    };
}

impl_stored_scalar!(bool, Bool, |w, v| codec::write_bool(w, *v));
impl_stored_scalar!(i64, Int, |w, v| codec::write_int(w, *v));
impl_stored_scalar!(u64, UInt, |w, v| codec::write_uint(w, *v));
impl_stored_scalar!(String, String, |w, v| codec::write_string(w, v));
impl_stored_scalar!(Vec<u8>, Bytes, |w, v| codec::write_bytes(w, v));

impl StoredValue for f64 {
    fn identical(&self, other: &Self) -> bool {
        self.to_bits() == other.to_bits()
    }

    fn encode<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        codec::write_float(w, *self)
    }

    fn decode<R: Read + ?Sized>(r: &mut R, limits: &DecodeLimits) -> Result<Self> {
        match codec::read_value(r, limits)? {
            Value::Float(v) => Ok(v),
            other => Err(mismatch(ValueKind::Float, &other)),
        }
    }
}
