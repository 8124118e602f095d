//! Request body extractor that reports type mismatches as field errors.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use serde_path_to_error::Segment;

use hostmap_domain::validation::{ValidationErrors, Violation};

use crate::error::ApiError;

/// JSON body deserialized into `T`.
///
/// Unlike [`Json`], a value of the wrong JSON type (`"port": "80"`) is
/// rejected with the same `400` field-error body as a failed validation,
/// located at the offending field (`hosts.0.address`).
#[derive(Debug)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<serde_json::Value>::from_request(req, state).await?;

        serde_path_to_error::deserialize(value)
            .map(Self)
            .map_err(|err| {
                let path = field_path(err.path());
                let violation = Violation::InvalidType(err.into_inner().to_string());
                ValidationErrors::single(path, violation).into()
            })
    }
}

/// Dotted path of the failing field, `body` when the document itself is wrong.
fn field_path(path: &serde_path_to_error::Path) -> String {
    let segments: Vec<String> = path
        .iter()
        .filter_map(|segment| match segment {
            Segment::Seq { index } => Some(index.to_string()),
            Segment::Map { key } => Some(key.clone()),
            Segment::Enum { variant } => Some(variant.clone()),
            Segment::Unknown => None,
        })
        .collect();

    if segments.is_empty() {
        "body".to_string()
    } else {
        segments.join(".")
    }
}
