use super::error::ApiError;
use super::sign::cos_authorization;
use crate::credentials::Credentials;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use reqwest::{Method, StatusCode};

/// Signatures are valid for this many seconds
const SIGNATURE_TTL: i64 = 3600;

/// Object keys keep their slashes
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Object storage used as an alternative upload path for packages
///
/// Bucket names may be passed with or without the "-{appid}" suffix.
#[async_trait]
pub(crate) trait ObjectStorage: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ApiError>;

    async fn create_bucket(&self, bucket: &str) -> Result<(), ApiError>;

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), ApiError>;
}

pub(crate) struct CosClient {
    credentials: Credentials,
    appid: String,
    region: String,
    client: reqwest::Client,
}

impl CosClient {
    pub(crate) fn new(credentials: Credentials, appid: &str, region: &str) -> Self {
        CosClient {
            credentials,
            appid: appid.to_string(),
            region: region.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Full bucket name, as used in the host
    fn qualified(&self, bucket: &str) -> String {
        let suffix = format!("-{}", self.appid);

        if self.appid.is_empty() || bucket.ends_with(&suffix) {
            bucket.to_string()
        } else {
            format!("{bucket}{suffix}")
        }
    }

    fn host(&self, bucket: &str) -> String {
        format!("{}.cos.{}.myqcloud.com", self.qualified(bucket), self.region)
    }

    async fn send(
        &self,
        method: Method,
        bucket: &str,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<reqwest::Response, ApiError> {
        let host = self.host(bucket);

        let authorization = cos_authorization(
            &self.credentials,
            method.as_str(),
            path,
            &host,
            Utc::now().timestamp(),
            SIGNATURE_TTL,
        )?;

        let url = format!(
            "https://{host}{}",
            utf8_percent_encode(path, KEY_ENCODE_SET)
        );

        log::debug!("{method} {url}");

        let mut request = self
            .client
            .request(method, url)
            .header("Host", &host)
            .header("Authorization", authorization);

        if let Some(token) = &self.credentials.token {
            request = request.header("x-cos-security-token", token);
        }

        if let Some(body) = body {
            request = request.body(body);
        }

        Ok(request
            .send()
            .await
            .inspect_err(|err| log::error!("{err:?}"))?)
    }
}

#[async_trait]
impl ObjectStorage for CosClient {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ApiError> {
        let response = self.send(Method::HEAD, bucket, "/", None).await?;
        let status = response.status();
        log::debug!("Got status from HEAD bucket {bucket}: {status}");

        match status {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(ApiError::remote(
                status.as_str(),
                "Failed to check the bucket",
                header_request_id(&response).as_deref(),
            )),
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), ApiError> {
        let response = self.send(Method::PUT, bucket, "/", None).await?;
        check(response).await
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), ApiError> {
        let path = format!("/{}", key.trim_start_matches('/'));
        let response = self.send(Method::PUT, bucket, &path, Some(body)).await?;
        check(response).await
    }
}

fn header_request_id(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get("x-cos-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Turn a non-success response into an error
async fn check(response: reqwest::Response) -> Result<(), ApiError> {
    let status = response.status();

    if status.is_success() {
        return Ok(());
    }

    let request_id = header_request_id(&response);
    let text = response.text().await?;
    log::debug!("Got error response ({status}): {text}");

    let mut error = parse_error(status, &text);

    if let ApiError::Remote { request_id: id, .. } = &mut error {
        if id.is_none() {
            *id = request_id;
        }
    }

    Err(error)
}

/// Extract code, message and request id from an XML error document
pub(crate) fn parse_error(status: StatusCode, text: &str) -> ApiError {
    let field = |name: &str| {
        Regex::new(&format!("<{name}>(.*?)</{name}>"))
            .ok()
            .and_then(|re| re.captures(text))
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().to_string())
    };

    ApiError::remote(
        &field("Code").unwrap_or_else(|| status.as_str().to_string()),
        &field("Message").unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        }),
        field("RequestId").as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xml_error_is_parsed() {
        let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
    <Code>BucketAlreadyExists</Code>
    <Message>The requested bucket name is not available.</Message>
    <RequestId>NWE3ZjQ2</RequestId>
</Error>"#;

        let error = parse_error(StatusCode::CONFLICT, text);
        assert_eq!(error.code(), Some("BucketAlreadyExists"));
        assert_eq!(error.request_id(), Some("NWE3ZjQ2"));
        assert!(error.to_string().contains("not available"));
    }

    #[test]
    fn empty_body_falls_back_to_status() {
        let error = parse_error(StatusCode::FORBIDDEN, "");
        assert_eq!(error.code(), Some("403"));
        assert_eq!(error.request_id(), None);
    }

    #[test]
    fn appid_suffix_is_added_once() {
        let client = CosClient::new(
            Credentials::new("id", "key", None),
            "1250000000",
            "ap-guangzhou",
        );

        assert_eq!(
            client.host("code"),
            "code-1250000000.cos.ap-guangzhou.myqcloud.com"
        );
        assert_eq!(client.qualified("code-1250000000"), "code-1250000000");
    }
}
