//! Throwaway credentials for unit tests

use super::SigningIdentity;
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::x509::{X509, X509NameBuilder};

pub fn self_signed(common_name: &str) -> (PKey<Private>, X509) {
    let key = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();
    let cert = certificate_for(&key, common_name, MessageDigest::sha256());
    (key, cert)
}

/// Self-signed certificate for any key type; Ed25519 keys need `MessageDigest::null()`
pub fn certificate_for(key: &PKey<Private>, common_name: &str, digest: MessageDigest) -> X509 {
    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    let name = name.build();

    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(30).unwrap())
        .unwrap();
    builder.sign(key, digest).unwrap();
    builder.build()
}

pub fn test_identity(common_name: &str) -> SigningIdentity {
    let (key, cert) = self_signed(common_name);
    SigningIdentity::new(key, vec![cert]).unwrap()
}

pub fn test_pkcs12(common_name: &str, secret: &str) -> Vec<u8> {
    let (key, cert) = self_signed(common_name);
    Pkcs12::builder()
        .name(common_name)
        .pkey(&key)
        .cert(&cert)
        .build2(secret)
        .unwrap()
        .to_der()
        .unwrap()
}
