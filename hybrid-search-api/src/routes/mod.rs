pub(crate) mod error;
pub(crate) mod health;
pub(crate) mod search;

pub(crate) use error::ApiError;
