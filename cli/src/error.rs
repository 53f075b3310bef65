use crate::api::ApiError;

/// Broad category of a failure, used to pick the exit path and the hint shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad command line arguments (e.g. unknown region)
    Args,

    /// Missing or invalid user configuration
    Config,

    /// Template file is missing or does not pass validation
    Template,

    /// Function code directory could not be found or read
    Context,

    /// The package could not be uploaded
    Upload,

    /// Namespace could not be created
    Namespace,

    /// The cloud API rejected a function deployment or another call
    CloudApi,

    /// One or more triggers failed to deploy
    Trigger,

    /// Log retrieval failed
    Logs,

    /// Anything not covered above
    Internal,
}

/// Display global error message in unified format
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    details: Option<String>,
    request_id: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: &str, details: Option<&str>) -> Self {
        Error {
            kind,
            message: message.to_string(),
            details: details.map(|d| d.to_string()),
            request_id: None,
        }
    }

    /// Attach the remote request id, shown to the user for support correlation
    pub fn with_request_id(mut self, request_id: Option<&str>) -> Self {
        self.request_id = request_id.map(|id| id.to_string());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}

/// Display the message and details, as sort of a hint
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(request_id) = &self.request_id {
            write!(f, "\n{}", console::style(format!("RequestId: {request_id}")).red())?;
        }

        if let Some(details) = &self.details {
            write!(f, "\n\n{}", console::style(details).dim())?;
        }

        Ok(())
    }
}

/// Implement std::error::Error trait for Error
impl std::error::Error for Error {}

/// Fatal remote failure with the request id attached
pub(crate) fn api_error(kind: ErrorKind, message: &str, error: &ApiError) -> Error {
    log::error!("{message}: {error:?}");

    Error::new(kind, message, Some(&error.to_string())).with_request_id(error.request_id())
}

/// Automatically convert all eyre error reports
impl From<eyre::ErrReport> for Error {
    fn from(error: eyre::ErrReport) -> Self {
        log::error!("{error:?}");

        error
            .downcast::<Error>()
            .unwrap_or_else(|err| Error::new(ErrorKind::Internal, &err.to_string(), None))
    }
}
