use crate::errors::SourceError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::time::Duration;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// SHA-256 of the empty request body.
const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// Access key pair for an S3-compatible store.
#[derive(Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

/// Minimal client for downloading objects from an S3-compatible store
/// (MinIO, AWS S3) using path-style addressing.
///
/// Requests are signed with AWS Signature Version 4 when credentials are
/// present; otherwise they are sent anonymously.
#[derive(Clone)]
pub struct ObjectStoreClient {
    client: reqwest::Client,
    endpoint: Url,
    region: String,
    credentials: Option<Credentials>,
}

impl ObjectStoreClient {
    /// Creates a new `ObjectStoreClient`.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Base URL of the store, e.g. `http://minio:9000`.
    /// * `region` - Region used in the signing scope.
    /// * `credentials` - Optional access key pair.
    /// * `timeout` - Whole-request timeout applied by the HTTP client.
    pub fn new(
        endpoint: &str,
        region: impl Into<String>,
        credentials: Option<Credentials>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| SourceError::Endpoint(format!("{}: {}", endpoint, e)))?;
        if endpoint.host_str().is_none() {
            return Err(SourceError::Endpoint(format!("{} has no host", endpoint)));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            region: region.into(),
            credentials,
        })
    }

    /// Downloads `bucket/key` and returns the raw body.
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, SourceError> {
        let canonical_path = format!("/{}/{}", uri_encode(bucket, true), uri_encode(key, false));
        let url = self
            .endpoint
            .join(&canonical_path)
            .map_err(|e| SourceError::Endpoint(e.to_string()))?;
        let host = host_header(&url);

        tracing::info!("Downloading object {}/{} from {}", bucket, key, host);

        let mut request = self.client.get(url);
        if let Some(ref credentials) = self.credentials {
            for (name, value) in sign_get_request(
                credentials,
                &self.region,
                &host,
                &canonical_path,
                Utc::now(),
            ) {
                request = request.header(name, value);
            }
        } else {
            tracing::debug!("No object store credentials configured, sending anonymous request");
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!("Object store returned {}: {}", status, error_text);
            return Err(SourceError::Status {
                status: status.as_u16(),
                object: format!("{}/{}", bucket, key),
            });
        }

        let body = response.bytes().await?;
        tracing::debug!("Downloaded {} bytes from {}/{}", body.len(), bucket, key);
        Ok(body.to_vec())
    }
}

/// Host header value as the HTTP client will send it (port only when non-default).
fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Builds the SigV4 headers for a body-less GET of `canonical_path`.
pub fn sign_get_request(
    credentials: &Credentials,
    region: &str,
    host: &str,
    canonical_path: &str,
    now: DateTime<Utc>,
) -> Vec<(&'static str, String)> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let scope = format!("{}/{}/s3/aws4_request", date_stamp, region);

    let canonical_request = format!(
        "GET\n{}\n\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
        canonical_path, host, EMPTY_PAYLOAD_SHA256, amz_date, SIGNED_HEADERS, EMPTY_PAYLOAD_SHA256
    );
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        amz_date,
        scope,
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let key = signing_key(&credentials.secret_key, &date_stamp, region, "s3");
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    let authorization = format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        credentials.access_key, scope, SIGNED_HEADERS, signature
    );

    vec![
        ("x-amz-date", amz_date),
        ("x-amz-content-sha256", EMPTY_PAYLOAD_SHA256.to_string()),
        ("authorization", authorization),
    ]
}

/// Derives the SigV4 signing key for one day/region/service scope.
pub fn signing_key(secret_key: &str, date_stamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
/// `/` is kept as-is in object keys and encoded in bucket names.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            b'/' if !encode_slash => encoded.push('/'),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
