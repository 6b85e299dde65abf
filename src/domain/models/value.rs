//! Dynamic Value Model
//!
//! Engine-native scalar values used both as positional statement
//! parameters and as decoded column values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// A single SQL scalar value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    /// BOOLEAN
    Bool(bool),
    /// SMALLINT
    Int16(i16),
    /// INTEGER
    Int32(i32),
    /// BIGINT
    Int64(i64),
    /// REAL
    Float32(f32),
    /// DOUBLE PRECISION
    Float64(f64),
    /// NUMERIC / DECIMAL
    Decimal(Decimal),
    /// TEXT, VARCHAR, CHAR, NAME and enum labels
    Text(String),
    /// BYTEA
    Bytes(Vec<u8>),
    /// DATE
    Date(NaiveDate),
    /// TIME
    Time(NaiveTime),
    /// TIMESTAMP
    Timestamp(NaiveDateTime),
    /// TIMESTAMPTZ
    TimestampTz(DateTime<Utc>),
    /// UUID
    Uuid(Uuid),
    /// JSON / JSONB
    Json(serde_json::Value),
    /// A column whose engine type has no dynamic representation here
    Unsupported(String),
}

impl Value {
    /// Check if value is NULL
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Engine type name of this value, as used in diagnostics
    #[must_use]
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOLEAN",
            Self::Int16(_) => "SMALLINT",
            Self::Int32(_) => "INTEGER",
            Self::Int64(_) => "BIGINT",
            Self::Float32(_) => "REAL",
            Self::Float64(_) => "DOUBLE PRECISION",
            Self::Decimal(_) => "NUMERIC",
            Self::Text(_) => "TEXT",
            Self::Bytes(_) => "BYTEA",
            Self::Date(_) => "DATE",
            Self::Time(_) => "TIME",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::TimestampTz(_) => "TIMESTAMPTZ",
            Self::Uuid(_) => "UUID",
            Self::Json(_) => "JSONB",
            Self::Unsupported(_) => "UNSUPPORTED",
        }
    }

    /// Try to convert to bool
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to convert to i64, widening smaller integers
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int16(n) => Some(i64::from(*n)),
            Self::Int32(n) => Some(i64::from(*n)),
            Self::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to convert to f64
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float32(n) => Some(f64::from(*n)),
            Self::Float64(n) => Some(*n),
            Self::Int16(n) => Some(f64::from(*n)),
            Self::Int32(n) => Some(f64::from(*n)),
            Self::Int64(n) => Some(*n as f64),
            Self::Decimal(d) => rust_decimal::prelude::ToPrimitive::to_f64(d),
            _ => None,
        }
    }

    /// Try to convert to an exact decimal; integers are widened
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            Self::Int16(n) => Some(Decimal::from(*n)),
            Self::Int32(n) => Some(Decimal::from(*n)),
            Self::Int64(n) => Some(Decimal::from(*n)),
            _ => None,
        }
    }

    /// Borrow as text
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to convert to a calendar date
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Timestamp(ts) => Some(ts.date()),
            Self::TimestampTz(ts) => Some(ts.date_naive()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int16(n) => write!(f, "{n}"),
            Self::Int32(n) => write!(f, "{n}"),
            Self::Int64(n) => write!(f, "{n}"),
            Self::Float32(n) => write!(f, "{n}"),
            Self::Float64(n) => write!(f, "{n}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Text(s) => f.write_str(s),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Date(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::Timestamp(ts) => write!(f, "{ts}"),
            Self::TimestampTz(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Json(j) => write!(f, "{j}"),
            Self::Unsupported(type_name) => write!(f, "<{type_name}>"),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    Decimal => Decimal,
    String => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampTz,
    Uuid => Uuid,
    serde_json::Value => Json,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Conversion from a dynamic value into a concrete Rust type.
///
/// Used by [`Row::try_get`](super::row::Row::try_get) to implement typed
/// record decoding.
pub trait FromValue: Sized {
    /// Convert, returning `None` when the value has an incompatible type
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64()
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|n| i32::try_from(n).ok())
    }
}

impl FromValue for i16 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i64().and_then(|n| i16::try_from(n).ok())
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float32(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for Decimal {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_decimal()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(ToString::to_string)
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_date()
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Timestamp(ts) => Some(*ts),
            Value::TimestampTz(ts) => Some(ts.naive_utc()),
            _ => None,
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Uuid(u) => Some(*u),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Option<Self> {
        if value.is_null() {
            Some(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}
