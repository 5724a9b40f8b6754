//! Base codecs: strings, unsigned integers, closed enumerations, and
//! serde-described structures.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Codec, Context, DecodeError};

// ── Str ───────────────────────────────────────────────────────────────────────

/// Any JSON string.
#[derive(Debug, Clone, Copy, Default)]
pub struct Str;

impl Codec for Str {
    type Output = String;

    fn name(&self) -> String {
        "string".to_owned()
    }

    fn validate(&self, input: &Value, context: &Context) -> Result<String, DecodeError> {
        match input {
            Value::String(s) => Ok(s.clone()),
            other => Err(DecodeError::failure(other.clone(), context.clone())),
        }
    }

    fn encode(&self, value: &String) -> Value {
        Value::String(value.clone())
    }

    fn is(&self, input: &Value) -> bool {
        input.is_string()
    }
}

// ── UInt ──────────────────────────────────────────────────────────────────────

/// A non-negative integer, given either as a JSON number or as a decimal
/// string (query parameters only ever arrive as strings).
#[derive(Debug, Clone, Copy, Default)]
pub struct UInt;

impl Codec for UInt {
    type Output = u64;

    fn name(&self) -> String {
        "UInt".to_owned()
    }

    fn validate(&self, input: &Value, context: &Context) -> Result<u64, DecodeError> {
        let parsed = match input {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| DecodeError::failure(input.clone(), context.clone()))
    }

    fn encode(&self, value: &u64) -> Value {
        Value::from(*value)
    }

    fn is(&self, input: &Value) -> bool {
        input.is_u64()
    }
}

// ── Enumerations ──────────────────────────────────────────────────────────────

/// A closed set of string-tagged variants.
///
/// Implementations are plain `match` expressions in both directions, so the
/// compiler checks that every variant has a wire form:
///
/// ```rust
/// use sluice::codec::Enumeration;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Color { Red, Green }
///
/// impl Enumeration for Color {
///     const NAME: &'static str = "Color";
///
///     fn from_wire(s: &str) -> Option<Self> {
///         match s {
///             "red" => Some(Self::Red),
///             "green" => Some(Self::Green),
///             _ => None,
///         }
///     }
///
///     fn as_wire(self) -> &'static str {
///         match self {
///             Self::Red => "red",
///             Self::Green => "green",
///         }
///     }
/// }
/// ```
pub trait Enumeration: Copy + Send + Sync + 'static {
    const NAME: &'static str;

    fn from_wire(s: &str) -> Option<Self>;

    fn as_wire(self) -> &'static str;
}

/// Codec for any [`Enumeration`].
pub struct EnumCodec<E>(PhantomData<fn() -> E>);

impl<E> EnumCodec<E> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> Default for EnumCodec<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EnumCodec<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EnumCodec<E> {}

impl<E: Enumeration> Codec for EnumCodec<E> {
    type Output = E;

    fn name(&self) -> String {
        E::NAME.to_owned()
    }

    fn validate(&self, input: &Value, context: &Context) -> Result<E, DecodeError> {
        input.as_str()
            .and_then(E::from_wire)
            .ok_or_else(|| DecodeError::failure(input.clone(), context.clone()))
    }

    fn encode(&self, value: &E) -> Value {
        Value::String(value.as_wire().to_owned())
    }

    fn is(&self, input: &Value) -> bool {
        input.as_str().and_then(E::from_wire).is_some()
    }
}

// ── JsonCodec ─────────────────────────────────────────────────────────────────

/// Codec for a structure described with serde.
///
/// Used for request bodies, where the shape is a struct rather than a single
/// scalar. A serde error yields exactly one [`ValidationError`](super::ValidationError)
/// carrying serde's message.
pub struct JsonCodec<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub const fn new(name: &'static str) -> Self {
        Self { name, _marker: PhantomData }
    }
}

impl<T> Clone for JsonCodec<T> {
    fn clone(&self) -> Self {
        Self::new(self.name)
    }
}

impl<T> Codec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Output = T;

    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn validate(&self, input: &Value, context: &Context) -> Result<T, DecodeError> {
        serde_json::from_value(input.clone()).map_err(|e| {
            DecodeError::with_message(input.clone(), context.clone(), e.to_string())
        })
    }

    fn encode(&self, value: &T) -> Value {
        serde_json::to_value(value).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Size { Small, Large }

    impl Enumeration for Size {
        const NAME: &'static str = "Size";

        fn from_wire(s: &str) -> Option<Self> {
            match s {
                "small" => Some(Self::Small),
                "large" => Some(Self::Large),
                _ => None,
            }
        }

        fn as_wire(self) -> &'static str {
            match self {
                Self::Small => "small",
                Self::Large => "large",
            }
        }
    }

    #[test]
    fn str_rejects_non_strings() {
        assert_eq!(Str.decode(&json!("hello")).unwrap(), "hello");
        let err = Str.decode(&json!(5)).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.errors()[0].value, json!(5));
    }

    #[test]
    fn uint_accepts_numbers_and_numeric_strings() {
        assert_eq!(UInt.decode(&json!(7)).unwrap(), 7);
        assert_eq!(UInt.decode(&json!("12")).unwrap(), 12);
        assert!(UInt.decode(&json!(-1)).is_err());
        assert!(UInt.decode(&json!("1.5")).is_err());
        assert!(UInt.is(&json!(3)));
        assert!(!UInt.is(&json!("3")));
    }

    #[test]
    fn enum_codec_round_trips_every_variant() {
        let codec = EnumCodec::<Size>::new();
        for size in [Size::Small, Size::Large] {
            let wire = codec.encode(&size);
            assert!(codec.is(&wire));
            assert_eq!(codec.decode(&wire).unwrap(), size);
        }
        assert!(!codec.is(&json!("medium")));
        assert!(codec.decode(&json!("medium")).is_err());
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Page {
        page: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        filter: Option<String>,
    }

    #[test]
    fn json_codec_round_trips_and_reports_serde_errors() {
        let codec = JsonCodec::<Page>::new("Page");
        let value = Page { page: 2, filter: Some("x".into()) };
        assert_eq!(codec.decode(&codec.encode(&value)).unwrap(), value);
        assert!(codec.is(&json!({ "page": 1 })));

        let err = codec.decode(&json!({ "page": "two" })).unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err.errors()[0].message.is_some());
    }
}
