//! Required JSON body middleware.

use serde_json::Value;

use crate::codec::{Codec, Context, DecodeError};
use crate::rejection::{Rejection, Scope, ValidationFailure};
use crate::request::Request;

use super::{BoxFuture, Middleware};

/// Parses the request body as JSON and decodes it with a codec.
///
/// An empty body, a body that is not JSON, and a body the codec refuses are
/// all validation failures scoped to the body.
pub struct RequiredBody<C> {
    codec: C,
}

impl<C: Codec> RequiredBody<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn extract(&self, req: &Request) -> Result<C::Output, Rejection> {
        let codec = self.codec.name();
        let context = Context::root("", codec.clone());
        let reject = |errors: DecodeError| -> Rejection {
            ValidationFailure::new(Scope::Body, codec.clone(), errors).into()
        };

        if req.body().iter().all(u8::is_ascii_whitespace) {
            return Err(reject(DecodeError::with_message(
                Value::Null,
                context,
                "missing request body",
            )));
        }

        let input: Value = serde_json::from_slice(req.body()).map_err(|e| {
            reject(DecodeError::with_message(
                Value::Null,
                context.clone(),
                format!("request body is not valid JSON: {e}"),
            ))
        })?;

        self.codec.validate(&input, &context).map_err(reject)
    }
}

impl<C> Middleware for RequiredBody<C>
where
    C: Codec,
    C::Output: Send,
{
    type Output = C::Output;

    fn run<'a>(&'a self, req: &'a Request) -> BoxFuture<'a, Result<Self::Output, Rejection>> {
        Box::pin(std::future::ready(self.extract(req)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Search {
        merchant_name: Option<String>,
        page: u32,
    }

    fn middleware() -> RequiredBody<JsonCodec<Search>> {
        RequiredBody::new(JsonCodec::new("Search"))
    }

    fn failure_of(rejection: Rejection) -> ValidationFailure {
        match rejection {
            Rejection::Validation(failure) => failure,
            other => panic!("expected a validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn valid_body_is_decoded() {
        let req = Request::builder().json(&json!({ "merchantName": "acme", "page": 1 })).build();
        let search = middleware().run(&req).await.unwrap();
        assert_eq!(search, Search { merchant_name: Some("acme".into()), page: 1 });
    }

    #[tokio::test]
    async fn missing_body_is_rejected() {
        let err = middleware().run(&Request::builder().build()).await.unwrap_err();
        let failure = failure_of(err);
        assert_eq!(failure.scope(), &Scope::Body);
        assert!(failure.detail().contains("missing request body"));
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let req = Request::builder().body("{not json").build();
        let failure = failure_of(middleware().run(&req).await.unwrap_err());
        assert!(failure.detail().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn body_of_the_wrong_shape_is_rejected() {
        let req = Request::builder().json(&json!({ "page": "first" })).build();
        let failure = failure_of(middleware().run(&req).await.unwrap_err());
        assert_eq!(failure.codec(), "Search");
        assert_eq!(failure.errors().len(), 1);
    }
}
