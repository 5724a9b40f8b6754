//! Declarative codecs.
//!
//! A [`Codec`] turns an untyped wire value ([`serde_json::Value`]) into a typed
//! value, or explains precisely why it could not. Every failure is carried by
//! [`DecodeError`]: a non-empty list of [`ValidationError`]s, each pointing at
//! the offending fragment through a context path.
//!
//! ```rust
//! use serde_json::json;
//! use sluice::codec::{Codec, Str, comma_separated};
//!
//! let tags = comma_separated(Str);
//! assert_eq!(tags.decode(&json!("a, b,,c")).unwrap(), vec!["a", "b", "c"]);
//! assert_eq!(tags.decode(&json!(null)).unwrap(), Vec::<String>::new());
//! assert!(tags.decode(&json!(42)).is_err());
//! ```
//!
//! Codecs are built once at startup and shared across requests; they hold no
//! per-request state, hence the `Send + Sync` bound.

mod list;
mod primitives;

use std::fmt;

use serde_json::Value;

pub use list::{CommaSeparated, comma_separated};
pub use primitives::{EnumCodec, Enumeration, JsonCodec, Str, UInt};

// ── Codec ─────────────────────────────────────────────────────────────────────

/// A paired decoder/encoder for one shape of value.
///
/// Laws every implementation upholds:
///
/// - `decode` terminates and never panics; failure goes through `Err`.
/// - `is(v)` implies `decode(v)` succeeds, and re-encoding that value decodes
///   to it again: `decode(&encode(&decode(v)?)) == decode(v)`.
///
/// The encoding need not be `v` itself: a list accepted as an array encodes
/// as a comma-separated string.
pub trait Codec: Send + Sync {
    /// The typed value this codec produces.
    type Output;

    /// Human-readable name, used in error messages (e.g. `"ProductCategory"`).
    fn name(&self) -> String;

    /// Decodes `input`, reporting failures relative to `context`.
    ///
    /// Combinators call this to thread the path of nested values; callers
    /// with a bare value want [`Codec::decode`].
    fn validate(&self, input: &Value, context: &Context) -> Result<Self::Output, DecodeError>;

    /// Converts a typed value back into its wire form.
    fn encode(&self, value: &Self::Output) -> Value;

    /// Decodes `input` from the root context.
    fn decode(&self, input: &Value) -> Result<Self::Output, DecodeError> {
        self.validate(input, &Context::root("", self.name()))
    }

    /// Is `input` a valid value that survives an encode/decode round trip?
    ///
    /// The default accepts exactly the canonical wire forms.
    fn is(&self, input: &Value) -> bool {
        self.decode(input)
            .map(|value| self.encode(&value) == *input)
            .unwrap_or(false)
    }
}

impl<C: Codec + ?Sized> Codec for &C {
    type Output = C::Output;

    fn name(&self) -> String {
        (**self).name()
    }

    fn validate(&self, input: &Value, context: &Context) -> Result<Self::Output, DecodeError> {
        (**self).validate(input, context)
    }

    fn encode(&self, value: &Self::Output) -> Value {
        (**self).encode(value)
    }

    fn is(&self, input: &Value) -> bool {
        (**self).is(input)
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

/// One step of a context path: the key that was followed and the codec that
/// was applied there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub key: String,
    pub codec: String,
}

/// Path from the root value to the value currently being decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context(Vec<ContextEntry>);

impl Context {
    /// A single-entry context. `key` is usually the field name, or empty for
    /// an anonymous root.
    pub fn root(key: impl Into<String>, codec: impl Into<String>) -> Self {
        Self(vec![ContextEntry { key: key.into(), codec: codec.into() }])
    }

    /// A new context one level deeper.
    pub fn push(&self, key: impl Into<String>, codec: impl Into<String>) -> Self {
        let mut entries = self.0.clone();
        entries.push(ContextEntry { key: key.into(), codec: codec.into() });
        Self(entries)
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.0
    }

    /// Dotted path of the non-empty keys, e.g. `categories.2`.
    pub fn path(&self) -> String {
        let keys: Vec<&str> = self.0.iter()
            .map(|e| e.key.as_str())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() { "root".to_owned() } else { keys.join(".") }
    }

    /// Name of the innermost codec.
    pub fn codec(&self) -> &str {
        self.0.last().map_or("", |e| e.codec.as_str())
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// A single decoding failure.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub value: Value,
    pub context: Context,
    pub message: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{message} at {}", self.context.path()),
            None => write!(
                f,
                "value {} at {} is not a valid [{}]",
                self.value,
                self.context.path(),
                self.context.codec(),
            ),
        }
    }
}

/// One or more [`ValidationError`]s, in the order they were found.
///
/// Never empty: every constructor takes at least one error.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError(Vec<ValidationError>);

impl DecodeError {
    pub fn new(error: ValidationError) -> Self {
        Self(vec![error])
    }

    /// `value` is not acceptable at `context`.
    pub fn failure(value: Value, context: Context) -> Self {
        Self::new(ValidationError { value, context, message: None })
    }

    /// Like [`DecodeError::failure`] with an explanatory message.
    pub fn with_message(value: Value, context: Context, message: impl Into<String>) -> Self {
        Self::new(ValidationError { value, context, message: Some(message.into()) })
    }

    /// Appends every error of `other` after the errors of `self`.
    pub fn merge(mut self, other: DecodeError) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with [`DecodeError::len`].
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeError {}

impl<'a> IntoIterator for &'a DecodeError {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_path_skips_anonymous_root() {
        let ctx = Context::root("", "List").push("2", "Item");
        assert_eq!(ctx.path(), "2");
        assert_eq!(ctx.codec(), "Item");
        assert_eq!(Context::root("", "X").path(), "root");
    }

    #[test]
    fn merge_keeps_order() {
        let a = DecodeError::failure(json!("a"), Context::root("q", "T"));
        let b = DecodeError::failure(json!("b"), Context::root("q", "T"));
        let merged = a.merge(b);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.errors()[0].value, json!("a"));
        assert_eq!(merged.errors()[1].value, json!("b"));
    }

    #[test]
    fn display_names_value_path_and_codec() {
        let err = DecodeError::failure(
            json!("nope"),
            Context::root("param", "List").push("1", "ProductCategory"),
        );
        assert_eq!(
            err.to_string(),
            r#"value "nope" at param.1 is not a valid [ProductCategory]"#
        );
    }
}
