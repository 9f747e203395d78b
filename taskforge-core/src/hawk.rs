//! Hawk-scheme request signing and bewit URL tokens.
//!
//! Requests carry a MAC over a canonical string built from timestamp,
//! nonce, method, resource, host, port and an optional payload hash. A
//! bewit is the same MAC reshaped into a single self-contained query
//! parameter granting time-limited GET access.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::trace;
use url::Url;

use crate::credentials::{hmac_sha256, Credentials};
use crate::error::{Error, Result};

/// Default signed-URL lifetime.
pub const DEFAULT_BEWIT_TTL_SECS: i64 = 15 * 60;

/// Decoded form of a bewit query value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BewitParts {
    pub client_id: String,
    pub expiry: i64,
    pub mac: String,
    pub ext: String,
}

fn host_and_port(url: &Url) -> Result<(String, u16)> {
    let host = url
        .host_str()
        .ok_or_else(|| Error::failure(format!("url '{}' has no host", url)))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| Error::failure(format!("url '{}' has no usable port", url)))?;
    Ok((host.to_lowercase(), port))
}

fn resource(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_owned(),
    }
}

#[allow(clippy::too_many_arguments)]
fn normalized_string(
    kind: &str,
    ts: i64,
    nonce: &str,
    method: &str,
    resource: &str,
    host: &str,
    port: u16,
    hash: &str,
    ext: &str,
) -> String {
    format!(
        "hawk.1.{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
        kind,
        ts,
        nonce,
        method.to_uppercase(),
        resource,
        host,
        port,
        hash,
        ext
    )
}

fn mac_base64(access_token: &str, normalized: &str) -> Result<String> {
    Ok(STANDARD.encode(hmac_sha256(access_token.as_bytes(), normalized.as_bytes())?))
}

/// Hash of a request payload, bound into the request MAC.
pub fn payload_hash(content_type: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("hawk.1.payload\n{}\n{}\n", content_type, body));
    STANDARD.encode(hasher.finalize())
}

/// The `ext` blob: base64 JSON carrying the temporary-credential
/// certificate and/or an authorizedScopes restriction. `None` when neither
/// applies (plain permanent credentials).
pub fn request_ext(
    credentials: &Credentials,
    authorized_scopes: Option<&[String]>,
) -> Result<Option<String>> {
    let mut ext = serde_json::Map::new();
    if let Some(cert) = &credentials.certificate {
        ext.insert("certificate".to_owned(), serde_json::to_value(cert)
            .map_err(|e| Error::auth(format!("unserializable certificate: {}", e)))?);
    }
    if let Some(scopes) = authorized_scopes {
        ext.insert("authorizedScopes".to_owned(), json!(scopes));
    }
    if ext.is_empty() {
        return Ok(None);
    }
    let blob = serde_json::Value::Object(ext).to_string();
    Ok(Some(STANDARD.encode(blob)))
}

fn header_at(
    credentials: &Credentials,
    method: &str,
    url: &Url,
    payload: Option<&str>,
    ext: Option<&str>,
    ts: i64,
    nonce: &str,
) -> Result<String> {
    let (host, port) = host_and_port(url)?;
    let hash = payload.map(|body| payload_hash("application/json", body));

    let normalized = normalized_string(
        "header",
        ts,
        nonce,
        method,
        &resource(url),
        &host,
        port,
        hash.as_deref().unwrap_or(""),
        ext.unwrap_or(""),
    );
    let mac = mac_base64(&credentials.access_token, &normalized)?;

    let mut header = format!(
        "Hawk id=\"{}\", ts=\"{}\", nonce=\"{}\"",
        credentials.client_id, ts, nonce
    );
    if let Some(hash) = hash {
        header.push_str(&format!(", hash=\"{}\"", hash));
    }
    if let Some(ext) = ext {
        header.push_str(&format!(", ext=\"{}\"", ext));
    }
    header.push_str(&format!(", mac=\"{}\"", mac));
    Ok(header)
}

/// Build the `Authorization` header value for one request.
///
/// `payload` is the serialized JSON body, when the request has one.
pub fn sign_request(
    credentials: &Credentials,
    method: &str,
    url: &Url,
    payload: Option<&str>,
    ext: Option<&str>,
) -> Result<String> {
    let nonce: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    trace!(client_id = %credentials.client_id, method, %url, "signing request");
    header_at(
        credentials,
        method,
        url,
        payload,
        ext,
        Utc::now().timestamp(),
        &nonce,
    )
}

/// Compute the bewit query value for a GET of `url`, valid for `ttl_secs`
/// from now.
pub fn bewit(
    credentials: &Credentials,
    url: &Url,
    ttl_secs: i64,
    ext: Option<&str>,
) -> Result<String> {
    let (host, port) = host_and_port(url)?;
    let expiry = Utc::now().timestamp() + ttl_secs;
    let ext = ext.unwrap_or("");

    let normalized = normalized_string(
        "bewit",
        expiry,
        "",
        "GET",
        &resource(url),
        &host,
        port,
        "",
        ext,
    );
    let mac = mac_base64(&credentials.access_token, &normalized)?;

    let raw = format!("{}\\{}\\{}\\{}", credentials.client_id, expiry, mac, ext);
    Ok(URL_SAFE_NO_PAD.encode(raw))
}

/// Decode a bewit back into its parts. The services do this server-side;
/// here it mostly supports tests and diagnostics.
pub fn decode_bewit(bewit: &str) -> Result<BewitParts> {
    let raw = URL_SAFE_NO_PAD
        .decode(bewit)
        .map_err(|e| Error::failure(format!("undecodable bewit: {}", e)))?;
    let raw = String::from_utf8(raw)
        .map_err(|_| Error::failure("bewit payload is not valid utf-8"))?;
    let mut parts = raw.splitn(4, '\\');
    let (Some(client_id), Some(expiry), Some(mac), Some(ext)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::failure("bewit does not have four parts"));
    };
    let expiry = expiry
        .parse()
        .map_err(|_| Error::failure("bewit expiry is not a timestamp"))?;
    Ok(BewitParts {
        client_id: client_id.to_owned(),
        expiry,
        mac: mac.to_owned(),
        ext: ext.to_owned(),
    })
}
