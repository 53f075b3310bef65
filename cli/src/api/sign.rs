use crate::credentials::Credentials;
use chrono::{DateTime, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::{Digest, Sha1};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

const TC3_ALGORITHM: &str = "TC3-HMAC-SHA256";

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// RFC 3986 unreserved characters stay as is
const COS_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn hmac_sha256(key: &[u8], data: &str) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac_sha1(key: &[u8], data: &str) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = HmacSha1::new_from_slice(key)?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Authorization header for the cloud API (TC3-HMAC-SHA256)
///
/// Only `content-type` and `host` are signed, the payload is always a JSON POST body.
pub(crate) fn tc3_authorization(
    credentials: &Credentials,
    service: &str,
    host: &str,
    payload: &str,
    timestamp: i64,
) -> Result<String, InvalidLength> {
    let date = DateTime::<Utc>::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .format("%Y-%m-%d")
        .to_string();

    let canonical_request = format!(
        "POST\n/\n\ncontent-type:{JSON_CONTENT_TYPE}\nhost:{host}\n\ncontent-type;host\n{}",
        sha256::digest(payload)
    );

    let scope = format!("{date}/{service}/tc3_request");

    let string_to_sign = format!(
        "{TC3_ALGORITHM}\n{timestamp}\n{scope}\n{}",
        sha256::digest(canonical_request.as_str())
    );

    let secret_date = hmac_sha256(format!("TC3{}", credentials.secret_key).as_bytes(), &date)?;
    let secret_service = hmac_sha256(&secret_date, service)?;
    let secret_signing = hmac_sha256(&secret_service, "tc3_request")?;
    let signature = hex::encode(hmac_sha256(&secret_signing, &string_to_sign)?);

    Ok(format!(
        "{TC3_ALGORITHM} Credential={}/{scope}, SignedHeaders=content-type;host, Signature={signature}",
        credentials.secret_id
    ))
}

/// Authorization header for the object storage XML API (q-sign-algorithm=sha1)
///
/// Signs the method, the object path and the host header, valid for `ttl` seconds from `start`.
pub(crate) fn cos_authorization(
    credentials: &Credentials,
    method: &str,
    path: &str,
    host: &str,
    start: i64,
    ttl: i64,
) -> Result<String, InvalidLength> {
    let key_time = format!("{start};{}", start + ttl);
    let sign_key = hex::encode(hmac_sha1(credentials.secret_key.as_bytes(), &key_time)?);

    let http_string = format!(
        "{}\n{path}\n\nhost={}\n",
        method.to_lowercase(),
        utf8_percent_encode(host, COS_ENCODE_SET)
    );

    let string_to_sign = format!(
        "sha1\n{key_time}\n{}\n",
        hex::encode(Sha1::digest(http_string.as_bytes()))
    );

    let signature = hex::encode(hmac_sha1(sign_key.as_bytes(), &string_to_sign)?);

    Ok(format!(
        "q-sign-algorithm=sha1&q-ak={}&q-sign-time={key_time}&q-key-time={key_time}\
         &q-header-list=host&q-url-param-list=&q-signature={signature}",
        credentials.secret_id
    ))
}
