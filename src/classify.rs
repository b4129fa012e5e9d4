//! Classification of transport results into found / not found / failed.
//!
//! Every read-style operation goes through [`Classification`], so callers can
//! branch on "object absent" without inspecting error values themselves.

use crate::error::TransportError;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::delete_object::DeleteObjectError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Error;
use aws_sdk_s3::operation::put_object::PutObjectError;
use std::error::Error as StdError;
use std::fmt::Debug;

/// Outcome of a request that addresses a single object.
#[derive(Debug)]
pub enum Classification<T> {
    /// The request succeeded.
    Found(T),
    /// The store reported that the object does not exist.
    NotFound,
    /// Any other failure; the original cause is preserved.
    Error(TransportError),
}

impl<T> Classification<T> {
    /// Converts into `Ok(Some(_))`, `Ok(None)` for not found, or `Err`.
    pub fn into_option(self) -> Result<Option<T>, TransportError> {
        match self {
            Self::Found(value) => Ok(Some(value)),
            Self::NotFound => Ok(None),
            Self::Error(err) => Err(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Classification<U> {
        match self {
            Self::Found(value) => Classification::Found(f(value)),
            Self::NotFound => Classification::NotFound,
            Self::Error(err) => Classification::Error(err),
        }
    }
}

impl<T> From<Result<T, TransportError>> for Classification<T> {
    fn from(result: Result<T, TransportError>) -> Self {
        match result {
            Ok(value) => Self::Found(value),
            Err(err) => Self::Error(err),
        }
    }
}

/// Implemented by service error types that can report a missing object.
pub trait NotFoundCondition {
    /// Returns `true` if this service error means the object does not exist.
    fn signals_not_found(&self) -> bool;
}

impl NotFoundCondition for GetObjectError {
    fn signals_not_found(&self) -> bool {
        self.is_no_such_key()
    }
}

impl NotFoundCondition for HeadObjectError {
    fn signals_not_found(&self) -> bool {
        self.is_not_found()
    }
}

// DeleteObject has no modeled not-found variant; some S3-compatible stores
// still answer a missing key with NoSuchKey.
impl NotFoundCondition for DeleteObjectError {
    fn signals_not_found(&self) -> bool {
        matches!(self.code(), Some("NoSuchKey") | Some("NotFound"))
    }
}

impl NotFoundCondition for PutObjectError {
    fn signals_not_found(&self) -> bool {
        false
    }
}

// A missing bucket is a real failure, never an empty listing.
impl NotFoundCondition for ListObjectsV2Error {
    fn signals_not_found(&self) -> bool {
        false
    }
}

/// Classifies the result of an SDK call.
pub fn classify<T, E, R>(
    operation: &'static str,
    bucket: &str,
    key: &str,
    result: Result<T, SdkError<E, R>>,
) -> Classification<T>
where
    E: NotFoundCondition + ProvideErrorMetadata + StdError + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    match result {
        Ok(value) => Classification::Found(value),
        Err(err) if err.as_service_error().is_some_and(E::signals_not_found) => {
            Classification::NotFound
        }
        Err(err) => Classification::Error(transport_error(operation, bucket, key, err)),
    }
}

/// Wraps an SDK error, keeping its service code and full context message.
pub(crate) fn transport_error<E, R>(
    operation: &'static str,
    bucket: &str,
    key: &str,
    err: SdkError<E, R>,
) -> TransportError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    let code = err
        .as_service_error()
        .and_then(|e| e.code())
        .map(str::to_owned);
    let message = DisplayErrorContext(&err).to_string();
    TransportError::new(operation, bucket, key, err)
        .with_code(code.as_deref())
        .with_message(message)
}
