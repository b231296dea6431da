use crate::hash::Oid;
use thiserror::Error;

pub type SiltResult<T> = Result<T, SiltGenericError>;
pub type SiltGenericError = anyhow::Error;

// most errors just flow through anyhow, but a few kinds are worth a typed
// representation so callers (and our own tests) can match on them
#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq))]
pub enum SiltError {
    #[error("object with hash `{0}` not found")]
    ObjectNotFound(Oid),
    #[error("malformed hunk header `{0}`")]
    MalformedHunkHeader(String),
    /// a user callback asked for the traversal to stop
    #[error("diff traversal aborted by callback")]
    Aborted,
}

pub trait SiltErrorExt {
    fn is_not_found_err(&self) -> bool;
    fn is_aborted(&self) -> bool;
}

impl SiltErrorExt for SiltGenericError {
    fn is_not_found_err(&self) -> bool {
        matches!(self.downcast_ref::<SiltError>(), Some(SiltError::ObjectNotFound(..)))
    }

    fn is_aborted(&self) -> bool {
        matches!(self.downcast_ref::<SiltError>(), Some(SiltError::Aborted))
    }
}

pub trait SiltResultExt {
    fn is_not_found_err(&self) -> bool;
    fn is_aborted(&self) -> bool;
}

impl<T> SiltResultExt for SiltResult<T> {
    fn is_not_found_err(&self) -> bool {
        match self {
            Ok(..) => false,
            Err(err) => err.is_not_found_err(),
        }
    }

    fn is_aborted(&self) -> bool {
        match self {
            Ok(..) => false,
            Err(err) => err.is_aborted(),
        }
    }
}
