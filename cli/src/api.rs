pub(crate) mod client;
pub(crate) mod cos;
pub(crate) mod error;
pub(crate) mod scf;
pub(crate) mod sign;

pub(crate) use error::ApiError;
