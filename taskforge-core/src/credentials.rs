//! Credentials: permanent and temporary.
//!
//! Temporary credentials are derived deterministically from a permanent
//! access token, a validity window and a scope set. The certificate is
//! self-verifying: its signature is a MAC over the certificate fields keyed
//! by the issuing token, so the services need no issuance record.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Certificate attached to temporary credentials. Times are milliseconds
/// since the epoch, matching the wire form the services expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub version: u32,
    pub scopes: Vec<String>,
    pub start: i64,
    pub expiry: i64,
    pub seed: String,
    pub signature: String,
    /// Issuing clientId, present only for named credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub client_id: String,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
}

impl Credentials {
    /// Permanent credentials: clientId and accessToken only.
    pub fn permanent(client_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Credentials {
            client_id: client_id.into(),
            access_token: access_token.into(),
            certificate: None,
        }
    }

    /// Whether these credentials can sign anything at all. Empty
    /// credentials mean the client makes unauthenticated calls.
    pub fn is_usable(&self) -> bool {
        !self.client_id.is_empty() && !self.access_token.is_empty()
    }

    /// Check well-formedness. clientId and accessToken must survive a
    /// single-byte text encoding; certificates must have a coherent window
    /// and well-formed scopes.
    pub fn validate(&self) -> Result<()> {
        if !self.client_id.is_ascii() {
            return Err(Error::auth("clientId is not representable as ascii"));
        }
        if !self.access_token.is_ascii() {
            return Err(Error::auth("accessToken is not representable as ascii"));
        }
        if let Some(cert) = &self.certificate {
            if cert.version != 1 {
                return Err(Error::auth(format!(
                    "unsupported certificate version {}",
                    cert.version
                )));
            }
            if cert.expiry <= cert.start {
                return Err(Error::auth("certificate expiry must come after start"));
            }
            for scope in &cert.scopes {
                check_scope(scope)?;
            }
        }
        Ok(())
    }
}

impl Certificate {
    /// The canonical lines the certificate signature is computed over.
    fn signing_lines(&self, client_id: &str) -> Vec<String> {
        let mut lines = vec![format!("version:{}", self.version)];
        if let Some(issuer) = &self.issuer {
            lines.push(format!("clientId:{}", client_id));
            lines.push(format!("issuer:{}", issuer));
        }
        lines.push(format!("seed:{}", self.seed));
        lines.push(format!("start:{}", self.start));
        lines.push(format!("expiry:{}", self.expiry));
        lines.push("scopes:".to_owned());
        lines.extend(self.scopes.iter().cloned());
        lines
    }

    /// Recompute the signature with the issuing token and compare.
    pub fn verify(&self, client_id: &str, issuing_token: &str) -> Result<bool> {
        let payload = self.signing_lines(client_id).join("\n");
        let mac = hmac_sha256(issuing_token.as_bytes(), payload.as_bytes())?;
        Ok(STANDARD.encode(mac) == self.signature)
    }
}

pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::auth(format!("invalid MAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn check_scope(scope: &str) -> Result<()> {
    if !scope.is_ascii() || scope.chars().any(char::is_control) {
        return Err(Error::auth(format!("malformed scope '{}'", scope)));
    }
    Ok(())
}

/// A 22-character URL-safe identifier, the service-family convention for
/// opaque ids and certificate seeds.
pub fn slug_id() -> String {
    URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
}

/// Mint scoped, time-limited credentials from a permanent access token.
///
/// With `name`, the resulting credentials act as `name` and the certificate
/// records the delegating clientId as issuer; the signature then also
/// covers the clientId/issuer pair.
pub fn create_temporary_credentials(
    client_id: &str,
    access_token: &str,
    start: DateTime<Utc>,
    expiry: DateTime<Utc>,
    scopes: &[String],
    name: Option<&str>,
) -> Result<Credentials> {
    if expiry <= start {
        return Err(Error::auth("expiry must come after start"));
    }
    if !client_id.is_ascii() {
        return Err(Error::auth("clientId is not representable as ascii"));
    }
    if !access_token.is_ascii() {
        return Err(Error::auth("accessToken is not representable as ascii"));
    }
    if let Some(name) = name {
        if !name.is_ascii() {
            return Err(Error::auth("credential name is not representable as ascii"));
        }
    }
    for scope in scopes {
        check_scope(scope)?;
    }

    let mut cert = Certificate {
        version: 1,
        scopes: scopes.to_vec(),
        start: start.timestamp_millis(),
        expiry: expiry.timestamp_millis(),
        seed: format!("{}{}", slug_id(), slug_id()),
        signature: String::new(),
        issuer: name.map(|_| client_id.to_owned()),
    };

    let new_client_id = name.unwrap_or(client_id).to_owned();
    let payload = cert.signing_lines(&new_client_id).join("\n");
    cert.signature = STANDARD.encode(hmac_sha256(access_token.as_bytes(), payload.as_bytes())?);

    let derived = hmac_sha256(access_token.as_bytes(), cert.seed.as_bytes())?;
    let new_access_token = URL_SAFE_NO_PAD.encode(derived);

    debug!(
        client_id = %new_client_id,
        scopes = scopes.len(),
        start = cert.start,
        expiry = cert.expiry,
        "minted temporary credentials"
    );

    Ok(Credentials {
        client_id: new_client_id,
        access_token: new_access_token,
        certificate: Some(cert),
    })
}
