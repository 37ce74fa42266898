//! HTTP request signing for the cloud APIs.
//!
//! Implements the `version="1"` signature scheme with `rsa-sha256`: the
//! signing string is built from `date`, `(request-target)` and `host`, plus
//! `content-length`, `content-type` and `x-content-sha256` for requests that
//! carry a body.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use reqwest::{Method, Url};
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use sha2::{Digest, Sha256};

use crate::error::{BootstrapError, Result};

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Headers to attach to a request; `host` and `content-length` are set by the
/// HTTP client itself and only take part in the signature.
pub type SignedHeaders = Vec<(&'static str, String)>;

pub struct RequestSigner {
    key_id: String,
    key: SigningKey<Sha256>,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Parse a PKCS#8 or PKCS#1 PEM private key.
    pub fn from_pem(key_id: impl Into<String>, pem: &str) -> Result<Self> {
        let key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| BootstrapError::Session(format!("failed to parse private key: {e}")))?;
        Ok(Self {
            key_id: key_id.into(),
            key: SigningKey::<Sha256>::new(key),
        })
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Sign a request with the current time.
    pub fn sign(&self, method: &Method, url: &Url, body: Option<&[u8]>) -> SignedHeaders {
        self.sign_at(method, url, body, Utc::now())
    }

    pub fn sign_at(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
        now: DateTime<Utc>,
    ) -> SignedHeaders {
        let date = http_date(now);
        let mut headers: SignedHeaders = vec![("date", date.clone())];
        let mut signed = vec![
            ("date", date),
            ("(request-target)", request_target(method, url)),
            ("host", host(url)),
        ];

        if let Some(body) = body {
            let digest = STANDARD.encode(Sha256::digest(body));
            signed.push(("content-length", body.len().to_string()));
            signed.push(("content-type", CONTENT_TYPE_JSON.to_string()));
            signed.push(("x-content-sha256", digest.clone()));
            headers.push(("content-type", CONTENT_TYPE_JSON.to_string()));
            headers.push(("x-content-sha256", digest));
        }

        let signing_string = signing_string(&signed);
        let signature = STANDARD.encode(self.key.sign(signing_string.as_bytes()).to_bytes());
        let names: Vec<&str> = signed.iter().map(|(name, _)| *name).collect();

        headers.push((
            "authorization",
            format!(
                "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
                self.key_id,
                names.join(" "),
                signature
            ),
        ));
        headers
    }
}

/// RFC 7231 date as sent in the `date` header.
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn request_target(method: &Method, url: &Url) -> String {
    let mut target = format!("{} {}", method.as_str().to_lowercase(), url.path());
    if let Some(query) = url.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn host(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

fn signing_string(signed: &[(&str, String)]) -> String {
    signed
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rsa::pkcs1v15::{Signature, VerifyingKey};
    use rsa::pkcs8::{EncodePrivateKey, LineEnding};
    use rsa::signature::Verifier;

    fn key() -> RsaPrivateKey {
        RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap()
    }

    fn header<'a>(headers: &'a SignedHeaders, name: &str) -> &'a str {
        headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    fn signature_param<'a>(authorization: &'a str, param: &str) -> &'a str {
        let start = authorization.find(&format!("{param}=\"")).unwrap() + param.len() + 2;
        let rest = &authorization[start..];
        &rest[..rest.find('"').unwrap()]
    }

    #[test]
    fn formats_http_date() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(http_date(now), "Tue, 05 Mar 2024 07:08:09 GMT");
    }

    #[test]
    fn get_signature_verifies() {
        let private = key();
        let pem = private.to_pkcs8_pem(LineEnding::LF).unwrap();
        let signer = RequestSigner::from_pem("t/u/fp", &pem).unwrap();

        let url = Url::parse("https://iaas.us-1.oraclecloud.com/20160918/vcns?compartmentId=c1")
            .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let headers = signer.sign_at(&Method::GET, &url, None, now);

        let authorization = header(&headers, "authorization");
        assert!(authorization.starts_with("Signature version=\"1\",keyId=\"t/u/fp\""));
        assert_eq!(
            signature_param(authorization, "headers"),
            "date (request-target) host"
        );

        let expected = "date: Mon, 01 Jan 2024 00:00:00 GMT\n\
                        (request-target): get /20160918/vcns?compartmentId=c1\n\
                        host: iaas.us-1.oraclecloud.com";
        let raw = STANDARD
            .decode(signature_param(authorization, "signature"))
            .unwrap();
        let verifying = VerifyingKey::<Sha256>::new(private.to_public_key());
        verifying
            .verify(expected.as_bytes(), &Signature::try_from(raw.as_slice()).unwrap())
            .unwrap();
    }

    #[test]
    fn body_headers_are_signed() {
        let pem = key().to_pkcs8_pem(LineEnding::LF).unwrap();
        let signer = RequestSigner::from_pem("t/u/fp", &pem).unwrap();
        let url = Url::parse("http://127.0.0.1:8080/20160918/subnets").unwrap();

        let headers = signer.sign(&Method::POST, &url, Some(b"{}"));
        let authorization = header(&headers, "authorization");
        assert_eq!(
            signature_param(authorization, "headers"),
            "date (request-target) host content-length content-type x-content-sha256"
        );
        assert_eq!(header(&headers, "content-type"), CONTENT_TYPE_JSON);
        assert_eq!(
            header(&headers, "x-content-sha256"),
            STANDARD.encode(Sha256::digest(b"{}"))
        );
    }

    #[test]
    fn host_keeps_explicit_port() {
        let url = Url::parse("http://127.0.0.1:8080/x").unwrap();
        assert_eq!(host(&url), "127.0.0.1:8080");
        let url = Url::parse("https://iad.ocir.io/x").unwrap();
        assert_eq!(host(&url), "iad.ocir.io");
    }

    #[test]
    fn rejects_garbage_pem() {
        assert!(RequestSigner::from_pem("id", "k").is_err());
    }
}
