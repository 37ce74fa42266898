//! Credential/session builder.
//!
//! Turns the raw key material of a [`ProvisioningRequest`] into the identity a
//! client signs requests with. Building a session never touches the network;
//! the PEM is only parsed once a signing client asks for it.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::config::ProvisioningRequest;
use crate::error::{BootstrapError, Result};
use crate::signer::RequestSigner;

/// Authenticated identity for one invocation.
#[derive(Clone)]
pub struct Session {
    key_id: String,
    region: String,
    private_key_pem: String,
}

impl Session {
    /// Validate the request and decode its private key.
    pub fn new(request: &ProvisioningRequest) -> Result<Self> {
        request.validate()?;

        // `base64` output wraps at 76 columns; line breaks are not key material
        let encoded: String = request
            .private_key
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let decoded = STANDARD
            .decode(encoded)
            .map_err(|e| BootstrapError::Config(format!("private key is not valid base64: {e}")))?;
        let private_key_pem = String::from_utf8(decoded).map_err(|_| {
            BootstrapError::Config("private key is not valid UTF-8 text".to_string())
        })?;

        Ok(Self {
            key_id: format!(
                "{}/{}/{}",
                request.tenant_id, request.user_id, request.fingerprint
            ),
            region: request.region.clone(),
            private_key_pem,
        })
    }

    /// Key id in `<tenancy>/<user>/<fingerprint>` form.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Build a request signer from the decoded key.
    pub fn signer(&self) -> Result<RequestSigner> {
        RequestSigner::from_pem(self.key_id.clone(), &self.private_key_pem)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("key_id", &self.key_id)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
