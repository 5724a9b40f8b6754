//! Comma-separated list combinator.

use serde_json::Value;

use super::{Codec, Context, DecodeError};

/// Codec for "comma-separated list of X", built from any codec for X.
///
/// - A string is split on `,`, each token trimmed, empty tokens dropped, and
///   every token decoded with the element codec.
/// - `null` and `""` decode to the empty list.
/// - An array is decoded element by element.
///
/// Every bad token is reported, not only the first.
pub struct CommaSeparated<C> {
    inner: C,
}

/// Shorthand for [`CommaSeparated::new`].
pub fn comma_separated<C: Codec>(inner: C) -> CommaSeparated<C> {
    CommaSeparated::new(inner)
}

impl<C: Codec> CommaSeparated<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    fn decode_all(
        &self,
        items: impl Iterator<Item = Value>,
        context: &Context,
    ) -> Result<Vec<C::Output>, DecodeError> {
        let name = self.inner.name();
        let mut values = Vec::new();
        let mut failed: Option<DecodeError> = None;

        for (index, item) in items.enumerate() {
            let at = context.push(index.to_string(), name.clone());
            match self.inner.validate(&item, &at) {
                Ok(value) => values.push(value),
                Err(e) => {
                    failed = Some(match failed {
                        Some(acc) => acc.merge(e),
                        None => e,
                    });
                }
            }
        }

        match failed {
            Some(e) => Err(e),
            None => Ok(values),
        }
    }
}

impl<C: Codec> Codec for CommaSeparated<C> {
    type Output = Vec<C::Output>;

    fn name(&self) -> String {
        format!("CommaSeparatedListOf<{}>", self.inner.name())
    }

    fn validate(&self, input: &Value, context: &Context) -> Result<Self::Output, DecodeError> {
        match input {
            Value::Null => Ok(Vec::new()),
            Value::String(s) => {
                let tokens = s.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| Value::String(t.to_owned()));
                self.decode_all(tokens, context)
            }
            Value::Array(items) => self.decode_all(items.iter().cloned(), context),
            other => Err(DecodeError::failure(other.clone(), context.clone())),
        }
    }

    fn encode(&self, values: &Self::Output) -> Value {
        let tokens: Vec<String> = values.iter()
            .map(|v| match self.inner.encode(v) {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();
        Value::String(tokens.join(","))
    }

    /// An array of valid elements whose tokens survive the comma encoding:
    /// non-empty, already trimmed, and free of `,`.
    fn is(&self, input: &Value) -> bool {
        input.as_array().is_some_and(|items| {
            items.iter().all(|item| self.inner.is(item) && survives_joining(item))
        })
    }
}

fn survives_joining(item: &Value) -> bool {
    let token = match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    !token.is_empty() && token.trim() == token && !token.contains(',')
}
