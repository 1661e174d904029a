//! Unit tests for RSA public key derivation.

#![allow(clippy::expect_used)]

use knife_server::application::ports::PublicKeyDeriver;
use knife_server::infra::keys::RsaPublicKeyDeriver;

use crate::helpers::read_fixture;

#[test]
fn test_public_key_from_pkcs1_matches_openssl() {
    let public = RsaPublicKeyDeriver
        .public_key_pem(&read_fixture("client-pkcs1.pem"))
        .expect("pkcs1 parses");

    assert_eq!(public.trim(), read_fixture("client-public.pem").trim());
}

#[test]
fn test_public_key_from_pkcs8_matches_openssl() {
    let public = RsaPublicKeyDeriver
        .public_key_pem(&read_fixture("client-pkcs8.pem"))
        .expect("pkcs8 parses");

    assert_eq!(public.trim(), read_fixture("client-public.pem").trim());
}

#[test]
fn test_public_key_is_not_accepted_as_private() {
    assert!(
        RsaPublicKeyDeriver
            .public_key_pem(&read_fixture("client-public.pem"))
            .is_err()
    );
}
