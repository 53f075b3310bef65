use thiserror::Error;

/// Failure reported by one of the remote services
#[derive(Error, Debug)]
pub(crate) enum ApiError {
    /// The service processed the request and rejected it
    #[error("{message} ({code})")]
    Remote {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    /// Function exists and the deployment was not forced
    #[error("function \"{0}\" already exists, use --forced to update it")]
    AlreadyExists(String),

    #[error("network request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not parse the response: {0}")]
    Decode(String),

    #[error("failed to read the package: {0}")]
    Package(#[from] std::io::Error),

    #[error("failed to sign the request")]
    Signing(#[from] hmac::digest::InvalidLength),
}

impl ApiError {
    pub(crate) fn remote(code: &str, message: &str, request_id: Option<&str>) -> Self {
        ApiError::Remote {
            code: code.to_string(),
            message: message.to_string(),
            request_id: request_id.map(|id| id.to_string()),
        }
    }

    /// Request id to report to support, if the service returned one
    pub(crate) fn request_id(&self) -> Option<&str> {
        match self {
            ApiError::Remote { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Service error code, e.g. "ResourceNotFound.Function"
    pub(crate) fn code(&self) -> Option<&str> {
        match self {
            ApiError::Remote { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The code denotes a missing resource
    pub(crate) fn is_not_found(&self) -> bool {
        self.code()
            .is_some_and(|code| code.starts_with("ResourceNotFound") || code == "NoSuchBucket")
    }

    /// The code denotes a resource that already exists
    pub(crate) fn is_in_use(&self) -> bool {
        self.code().is_some_and(|code| code.starts_with("ResourceInUse"))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::Decode(error.to_string())
    }
}
