//! # Tagged bus values.
//!
//! [`BusValue`] carries a value together with its wire shape, so argument
//! coercion and property decoding are exhaustive matches instead of dynamic
//! downcasts. Conversions to native types go through `TryFrom` and fail with
//! [`BusError::Conversion`]; the reverse direction is infallible via `From`.

use std::collections::HashMap;

use crate::error::BusError;

/// A value as it travels over the bus, tagged with its shape.
#[derive(Clone, Debug, PartialEq)]
pub enum BusValue {
    /// Boolean (`b`).
    Bool(bool),
    /// Byte (`y`).
    U8(u8),
    /// Signed 32-bit integer (`i`).
    I32(i32),
    /// Unsigned 32-bit integer (`u`).
    U32(u32),
    /// Signed 64-bit integer (`x`).
    I64(i64),
    /// Unsigned 64-bit integer (`t`).
    U64(u64),
    /// Double (`d`).
    F64(f64),
    /// String (`s`).
    Str(String),
    /// Object path (`o`).
    ObjectPath(String),
    /// String list (`as`).
    StrList(Vec<String>),
    /// Heterogeneous list (`av` and friends).
    List(Vec<BusValue>),
    /// String-keyed variant map (`a{sv}`).
    Dict(HashMap<String, BusValue>),
}

impl BusValue {
    /// Short tag name for logs and conversion errors.
    pub fn tag(&self) -> &'static str {
        match self {
            BusValue::Bool(_) => "bool",
            BusValue::U8(_) => "u8",
            BusValue::I32(_) => "i32",
            BusValue::U32(_) => "u32",
            BusValue::I64(_) => "i64",
            BusValue::U64(_) => "u64",
            BusValue::F64(_) => "f64",
            BusValue::Str(_) => "string",
            BusValue::ObjectPath(_) => "object_path",
            BusValue::StrList(_) => "string_list",
            BusValue::List(_) => "list",
            BusValue::Dict(_) => "dict",
        }
    }

    /// The default value for a signature, used when coercion of a caller
    /// argument fails and the call degrades to best effort.
    pub fn signature_default(signature: &str) -> BusValue {
        match signature {
            "b" => BusValue::Bool(false),
            "y" => BusValue::U8(0),
            "u" => BusValue::U32(0),
            "i" => BusValue::I32(0),
            "t" => BusValue::U64(0),
            "x" => BusValue::I64(0),
            "d" => BusValue::F64(0.0),
            "s" | "o" => BusValue::Str(String::new()),
            "as" => BusValue::StrList(Vec::new()),
            "a{sv}" => BusValue::Dict(HashMap::new()),
            _ => BusValue::List(Vec::new()),
        }
    }

    /// Coerces the value to the declared signature shape.
    ///
    /// Only the primitive shapes that appear in introspected method
    /// signatures are coerced (`u`, `i`, `a{sv}`, `as`); everything else is
    /// passed through unchanged. Lossless numeric conversions are accepted,
    /// anything lossy fails with [`BusError::Conversion`].
    pub fn coerce(self, signature: &str) -> Result<BusValue, BusError> {
        match signature {
            "u" => u32::try_from(self).map(BusValue::U32),
            "i" => i32::try_from(self).map(BusValue::I32),
            "as" => Vec::<String>::try_from(self).map(BusValue::StrList),
            "a{sv}" => HashMap::<String, BusValue>::try_from(self).map(BusValue::Dict),
            _ => Ok(self),
        }
    }

    fn conversion_error(&self, target: &'static str) -> BusError {
        BusError::Conversion {
            value: format!("{self:?}"),
            target,
        }
    }
}

impl From<bool> for BusValue {
    fn from(v: bool) -> Self {
        BusValue::Bool(v)
    }
}

impl From<u8> for BusValue {
    fn from(v: u8) -> Self {
        BusValue::U8(v)
    }
}

impl From<u32> for BusValue {
    fn from(v: u32) -> Self {
        BusValue::U32(v)
    }
}

impl From<i32> for BusValue {
    fn from(v: i32) -> Self {
        BusValue::I32(v)
    }
}

impl From<u64> for BusValue {
    fn from(v: u64) -> Self {
        BusValue::U64(v)
    }
}

impl From<i64> for BusValue {
    fn from(v: i64) -> Self {
        BusValue::I64(v)
    }
}

impl From<f64> for BusValue {
    fn from(v: f64) -> Self {
        BusValue::F64(v)
    }
}

impl From<String> for BusValue {
    fn from(v: String) -> Self {
        BusValue::Str(v)
    }
}

impl From<&str> for BusValue {
    fn from(v: &str) -> Self {
        BusValue::Str(v.to_owned())
    }
}

impl From<Vec<String>> for BusValue {
    fn from(v: Vec<String>) -> Self {
        BusValue::StrList(v)
    }
}

impl From<HashMap<String, BusValue>> for BusValue {
    fn from(v: HashMap<String, BusValue>) -> Self {
        BusValue::Dict(v)
    }
}

impl TryFrom<BusValue> for bool {
    type Error = BusError;

    fn try_from(value: BusValue) -> Result<Self, Self::Error> {
        match value {
            BusValue::Bool(v) => Ok(v),
            other => Err(other.conversion_error("bool")),
        }
    }
}

impl TryFrom<BusValue> for u8 {
    type Error = BusError;

    fn try_from(value: BusValue) -> Result<Self, Self::Error> {
        match value {
            BusValue::U8(v) => Ok(v),
            other => Err(other.conversion_error("u8")),
        }
    }
}

impl TryFrom<BusValue> for u32 {
    type Error = BusError;

    fn try_from(value: BusValue) -> Result<Self, Self::Error> {
        match value {
            BusValue::U32(v) => Ok(v),
            BusValue::U8(v) => Ok(u32::from(v)),
            BusValue::I32(v) if v >= 0 => Ok(v as u32),
            BusValue::U64(v) => {
                u32::try_from(v).map_err(|_| BusValue::U64(v).conversion_error("u32"))
            }
            BusValue::I64(v) => {
                u32::try_from(v).map_err(|_| BusValue::I64(v).conversion_error("u32"))
            }
            other => Err(other.conversion_error("u32")),
        }
    }
}

impl TryFrom<BusValue> for i32 {
    type Error = BusError;

    fn try_from(value: BusValue) -> Result<Self, Self::Error> {
        match value {
            BusValue::I32(v) => Ok(v),
            BusValue::U8(v) => Ok(i32::from(v)),
            BusValue::U32(v) => {
                i32::try_from(v).map_err(|_| BusValue::U32(v).conversion_error("i32"))
            }
            BusValue::I64(v) => {
                i32::try_from(v).map_err(|_| BusValue::I64(v).conversion_error("i32"))
            }
            other => Err(other.conversion_error("i32")),
        }
    }
}

impl TryFrom<BusValue> for u64 {
    type Error = BusError;

    fn try_from(value: BusValue) -> Result<Self, Self::Error> {
        match value {
            BusValue::U64(v) => Ok(v),
            BusValue::U32(v) => Ok(u64::from(v)),
            BusValue::U8(v) => Ok(u64::from(v)),
            BusValue::I64(v) if v >= 0 => Ok(v as u64),
            other => Err(other.conversion_error("u64")),
        }
    }
}

impl TryFrom<BusValue> for i64 {
    type Error = BusError;

    fn try_from(value: BusValue) -> Result<Self, Self::Error> {
        match value {
            BusValue::I64(v) => Ok(v),
            BusValue::I32(v) => Ok(i64::from(v)),
            BusValue::U32(v) => Ok(i64::from(v)),
            BusValue::U8(v) => Ok(i64::from(v)),
            BusValue::U64(v) => {
                i64::try_from(v).map_err(|_| BusValue::U64(v).conversion_error("i64"))
            }
            other => Err(other.conversion_error("i64")),
        }
    }
}

impl TryFrom<BusValue> for f64 {
    type Error = BusError;

    fn try_from(value: BusValue) -> Result<Self, Self::Error> {
        match value {
            BusValue::F64(v) => Ok(v),
            BusValue::U32(v) => Ok(f64::from(v)),
            BusValue::I32(v) => Ok(f64::from(v)),
            other => Err(other.conversion_error("f64")),
        }
    }
}

impl TryFrom<BusValue> for String {
    type Error = BusError;

    fn try_from(value: BusValue) -> Result<Self, Self::Error> {
        match value {
            BusValue::Str(v) | BusValue::ObjectPath(v) => Ok(v),
            other => Err(other.conversion_error("string")),
        }
    }
}

impl TryFrom<BusValue> for Vec<String> {
    type Error = BusError;

    fn try_from(value: BusValue) -> Result<Self, Self::Error> {
        match value {
            BusValue::StrList(v) => Ok(v),
            BusValue::List(items) => items
                .into_iter()
                .map(String::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| BusError::Conversion {
                    value: "heterogeneous list".to_owned(),
                    target: "string_list",
                }),
            other => Err(other.conversion_error("string_list")),
        }
    }
}

impl TryFrom<BusValue> for HashMap<String, BusValue> {
    type Error = BusError;

    fn try_from(value: BusValue) -> Result<Self, Self::Error> {
        match value {
            BusValue::Dict(v) => Ok(v),
            other => Err(other.conversion_error("dict")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lossless_numeric_conversions() {
        assert_eq!(u32::try_from(BusValue::U8(7)).unwrap(), 7);
        assert_eq!(u32::try_from(BusValue::I32(42)).unwrap(), 42);
        assert_eq!(i64::try_from(BusValue::U32(9)).unwrap(), 9);
        assert_eq!(f64::try_from(BusValue::I32(-3)).unwrap(), -3.0);
    }

    #[test]
    fn lossy_conversions_fail() {
        assert!(u32::try_from(BusValue::I32(-1)).is_err());
        assert!(u32::try_from(BusValue::U64(u64::MAX)).is_err());
        assert!(i32::try_from(BusValue::U32(u32::MAX)).is_err());
        assert!(bool::try_from(BusValue::Str("yes".into())).is_err());
    }

    #[test]
    fn coerce_matches_signature_shapes() {
        assert_eq!(BusValue::U8(3).coerce("u").unwrap(), BusValue::U32(3));
        assert_eq!(BusValue::I64(5).coerce("i").unwrap(), BusValue::I32(5));
        assert_eq!(
            BusValue::List(vec![BusValue::Str("a".into())])
                .coerce("as")
                .unwrap(),
            BusValue::StrList(vec!["a".into()])
        );
        // Unknown signatures pass through untouched.
        assert_eq!(
            BusValue::Str("x".into()).coerce("(ss)").unwrap(),
            BusValue::Str("x".into())
        );
    }

    #[test]
    fn signature_defaults() {
        assert_eq!(BusValue::signature_default("u"), BusValue::U32(0));
        assert_eq!(BusValue::signature_default("as"), BusValue::StrList(vec![]));
        assert_eq!(
            BusValue::signature_default("a{sv}"),
            BusValue::Dict(HashMap::new())
        );
    }
}
