//! Optional query parameter middleware.

use serde_json::Value;

use crate::codec::{Codec, Context};
use crate::rejection::{Rejection, Scope, ValidationFailure};
use crate::request::Request;

use super::{BoxFuture, Middleware};

/// Extracts the query parameter `name` and decodes it with a codec.
///
/// | Request | Result |
/// |---|---|
/// | parameter missing | `Ok(None)`, codec not consulted |
/// | parameter decodes | `Ok(Some(value))` |
/// | parameter does not decode | `Err(Rejection::Validation)` with every error |
///
/// A missing parameter means "no filter requested", which downstream code must
/// be able to tell apart from a filter that was given but is empty.
pub struct OptionalQueryParam<C> {
    name: String,
    codec: C,
}

impl<C: Codec> OptionalQueryParam<C> {
    pub fn new(name: impl Into<String>, codec: C) -> Self {
        Self { name: name.into(), codec }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The synchronous core of [`Middleware::run`].
    pub fn extract(&self, req: &Request) -> Result<Option<C::Output>, Rejection> {
        let Some(raw) = req.query(&self.name) else {
            return Ok(None);
        };

        let codec = self.codec.name();
        let context = Context::root(self.name.clone(), codec.clone());
        match self.codec.validate(&Value::String(raw.to_owned()), &context) {
            Ok(value) => Ok(Some(value)),
            Err(errors) => {
                Err(ValidationFailure::new(Scope::Query(self.name.clone()), codec, errors).into())
            }
        }
    }
}

impl<C> Middleware for OptionalQueryParam<C>
where
    C: Codec,
    C::Output: Send,
{
    type Output = Option<C::Output>;

    fn run<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, Result<Self::Output, Rejection>> {
        Box::pin(std::future::ready(self.extract(req)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{EnumCodec, Str, UInt, comma_separated};
    use crate::category::ProductCategory;

    #[tokio::test]
    async fn missing_parameter_is_absent_for_every_codec() {
        let req = Request::builder().query("other", "x").build();

        assert_eq!(OptionalQueryParam::new("param", Str).run(&req).await.unwrap(), None);
        assert_eq!(OptionalQueryParam::new("param", UInt).run(&req).await.unwrap(), None);
        let list = OptionalQueryParam::new("param", comma_separated(EnumCodec::<ProductCategory>::new()));
        assert_eq!(list.run(&req).await.unwrap(), None);
    }

    #[tokio::test]
    async fn present_and_valid_parameter_is_extracted() {
        let req = Request::builder().query("param", "hello").build();
        let value = OptionalQueryParam::new("param", Str).run(&req).await.unwrap();
        assert_eq!(value.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn present_but_invalid_parameter_is_a_validation_failure() {
        let req = Request::builder().query("page", "ten").build();
        let err = OptionalQueryParam::new("page", UInt).run(&req).await.unwrap_err();

        let failure = match err {
            Rejection::Validation(failure) => failure,
            other => panic!("expected a validation failure, got {other:?}"),
        };
        assert_eq!(failure.scope(), &Scope::Query("page".into()));
        assert_eq!(failure.codec(), "UInt");
        assert_eq!(failure.errors().errors()[0].context.path(), "page");
    }

    #[tokio::test]
    async fn empty_list_parameter_is_present_and_empty() {
        let req = Request::builder().query("param", "").build();
        let list = OptionalQueryParam::new("param", comma_separated(EnumCodec::<ProductCategory>::new()));
        assert_eq!(list.run(&req).await.unwrap(), Some(vec![]));
    }
}
