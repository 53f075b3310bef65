use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct CreateRequest {
    pub(crate) function_name: String,
    pub(crate) namespace: String,
    pub(crate) trigger_name: String,

    #[serde(rename = "Type")]
    pub(crate) kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) trigger_desc: Option<String>,

    /// "OPEN" or "CLOSE"
    pub(crate) enable: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DeleteRequest {
    pub(crate) function_name: String,
    pub(crate) namespace: String,
    pub(crate) trigger_name: String,

    #[serde(rename = "Type")]
    pub(crate) kind: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) trigger_desc: Option<String>,
}
