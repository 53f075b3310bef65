use serde::{Deserialize, Serialize};

/// Only invocations with a non-zero return code
pub(crate) const ERRORS_ONLY: &str = "not0";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Request {
    pub(crate) function_name: String,
    pub(crate) namespace: String,

    /// "YYYY-MM-DD HH:MM:SS"
    pub(crate) start_time: String,
    pub(crate) end_time: String,

    /// "asc" or "desc"
    pub(crate) order: String,
    pub(crate) order_by: String,
    pub(crate) offset: u64,
    pub(crate) limit: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) filter: Option<Filter>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Filter {
    pub(crate) ret_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct Response {
    #[serde(default)]
    pub(crate) data: Vec<LogRecord>,
}

/// A single function invocation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct LogRecord {
    /// "YYYY-MM-DD HH:MM:SS", sorts chronologically as a string
    pub(crate) start_time: String,

    #[serde(default)]
    pub(crate) ret_code: i64,

    #[serde(default)]
    pub(crate) log: String,

    #[serde(default)]
    pub(crate) request_id: String,
}
