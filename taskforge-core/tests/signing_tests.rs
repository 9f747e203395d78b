// Signature-engine behavior exercised through the public API only.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use taskforge_core::hawk::{self, DEFAULT_BEWIT_TTL_SECS};
use taskforge_core::{create_temporary_credentials, Credentials, Error};
use url::Url;

fn window() -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
    let now = Utc::now();
    (now - Duration::hours(10), now + Duration::hours(10))
}

#[test]
fn temporary_credentials_verify_against_issuing_token() {
    let (start, expiry) = window();
    let creds = create_temporary_credentials(
        "tester",
        "no-secret",
        start,
        expiry,
        &["test:xyz".to_owned()],
        None,
    )
    .unwrap();

    let cert = creds.certificate.as_ref().unwrap();
    assert!(cert.verify(&creds.client_id, "no-secret").unwrap());
    assert!(!cert.verify(&creds.client_id, "other-secret").unwrap());

    // Two derivations share nothing but the issuing identity.
    let other = create_temporary_credentials(
        "tester",
        "no-secret",
        start,
        expiry,
        &["test:xyz".to_owned()],
        None,
    )
    .unwrap();
    assert_ne!(creds.access_token, other.access_token);
    assert_eq!(creds.client_id, other.client_id);
}

#[test]
fn named_credentials_take_the_name_as_client_id() {
    let (start, expiry) = window();
    let creds = create_temporary_credentials(
        "tester",
        "no-secret",
        start,
        expiry,
        &["test:xyz:*".to_owned()],
        Some("credName"),
    )
    .unwrap();
    assert_eq!(creds.client_id, "credName");
    assert_eq!(
        creds.certificate.as_ref().unwrap().issuer.as_deref(),
        Some("tester")
    );
}

#[test]
fn invalid_window_is_an_auth_failure() {
    let (start, expiry) = window();
    let err = create_temporary_credentials(
        "tester",
        "no-secret",
        expiry,
        start,
        &["test:xyz".to_owned()],
        None,
    )
    .unwrap_err();
    assert!(matches!(err, Error::Auth(_)));

    // expiry == start is just as bad
    let err =
        create_temporary_credentials("tester", "no-secret", start, start, &[], None).unwrap_err();
    assert!(matches!(err, Error::Auth(_)));
}

#[test]
fn bewit_expiry_tracks_the_requested_ttl() {
    let creds = Credentials::permanent("tester", "no-secret");
    let url = Url::parse("https://fake.taskforge.net/v1/two_args_no_input/arg0/arg1").unwrap();

    let before = Utc::now().timestamp();
    let bewit = hawk::bewit(&creds, &url, DEFAULT_BEWIT_TTL_SECS, None).unwrap();
    let after = Utc::now().timestamp();

    let parts = hawk::decode_bewit(&bewit).unwrap();
    assert_eq!(parts.client_id, "tester");
    assert!(parts.expiry >= before + DEFAULT_BEWIT_TTL_SECS);
    assert!(parts.expiry <= after + DEFAULT_BEWIT_TTL_SECS);
}

#[test]
fn ext_blob_carries_certificate_and_scope_restriction() {
    let (start, expiry) = window();
    let creds = create_temporary_credentials(
        "tester",
        "no-secret",
        start,
        expiry,
        &["test:*".to_owned()],
        None,
    )
    .unwrap();

    let scopes = vec!["test:authenticate-get".to_owned()];
    let ext = hawk::request_ext(&creds, Some(&scopes)).unwrap().unwrap();
    let decoded: serde_json::Value =
        serde_json::from_slice(&STANDARD.decode(ext).unwrap()).unwrap();

    assert_eq!(decoded["authorizedScopes"][0], "test:authenticate-get");
    assert_eq!(decoded["certificate"]["version"], 1);
    assert_eq!(decoded["certificate"]["scopes"][0], "test:*");
}

#[test]
fn signed_header_shape() {
    let creds = Credentials::permanent("tester", "no-secret");
    let url = Url::parse("https://fake.taskforge.net/v1/ping").unwrap();
    let header = hawk::sign_request(&creds, "get", &url, None, None).unwrap();

    assert!(header.starts_with("Hawk id=\"tester\", ts=\""));
    assert!(header.contains("nonce=\""));
    assert!(header.ends_with('"'));
    assert!(header.contains("mac=\""));
}
