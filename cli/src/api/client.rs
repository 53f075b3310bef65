use super::error::ApiError;
use super::sign::{tc3_authorization, JSON_CONTENT_TYPE};
use crate::credentials::Credentials;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// JSON client for the cloud API of a single service
///
/// Every call is a signed POST with the action name in a header,
/// the reply is always wrapped into `{"Response": {...}}`.
#[derive(Clone)]
pub(crate) struct Client {
    credentials: Credentials,
    region: String,
    service: &'static str,
    version: &'static str,
    host: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RemoteError {
    code: String,
    message: String,
}

impl Client {
    pub(crate) fn new(
        credentials: Credentials,
        region: &str,
        service: &'static str,
        version: &'static str,
    ) -> Self {
        Client {
            credentials,
            region: region.to_string(),
            service,
            version,
            host: format!("{service}.tencentcloudapi.com"),
            client: reqwest::Client::new(),
        }
    }

    pub(crate) fn region(&self) -> &str {
        &self.region
    }

    /// Incapsulate a typical API call
    pub(crate) async fn request<B, R>(&self, action: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let payload = serde_json::to_string(body)?;
        let timestamp = Utc::now().timestamp();

        let authorization = tc3_authorization(
            &self.credentials,
            self.service,
            &self.host,
            &payload,
            timestamp,
        )?;

        log::debug!("Calling {action} with {payload}");

        let mut request = self
            .client
            .post(format!("https://{}/", self.host))
            .header("Authorization", authorization)
            .header("Content-Type", JSON_CONTENT_TYPE)
            .header("Host", &self.host)
            .header("X-TC-Action", action)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("X-TC-Version", self.version)
            .header("X-TC-Region", &self.region);

        if let Some(token) = &self.credentials.token {
            request = request.header("X-TC-Token", token);
        }

        let result = request
            .body(payload)
            .send()
            .await
            .inspect_err(|err| log::error!("{err:?}"))?;

        let status = result.status();
        let text = result.text().await?;
        log::debug!("Got status from {action}: {status}");
        log::debug!("Got response from {action}: {text}");

        parse_response(&text)
    }
}

/// Unwrap the response envelope, turning an `Error` member into `ApiError::Remote`
fn parse_response<R: DeserializeOwned>(text: &str) -> Result<R, ApiError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let request_id = envelope
        .response
        .get("RequestId")
        .and_then(|id| id.as_str())
        .map(|id| id.to_string());

    if let Some(error) = envelope.response.get("Error") {
        let error: RemoteError = serde_json::from_value(error.clone())?;
        return Err(ApiError::remote(
            &error.code,
            &error.message,
            request_id.as_deref(),
        ));
    }

    Ok(serde_json::from_value(envelope.response)?)
}
