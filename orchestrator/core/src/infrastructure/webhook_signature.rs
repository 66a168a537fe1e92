// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

// Webhook payload authentication. GitHub signs each delivery body with
// HMAC-SHA256 over the shared webhook secret and sends the digest as
// `X-Hub-Signature-256: sha256=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::domain::config::Secret;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
const SIGNATURE_PREFIX: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing webhook signature")]
    Missing,

    #[error("malformed webhook signature")]
    Malformed,

    #[error("webhook signature mismatch")]
    Mismatch,
}

/// Checks delivery signatures; accepts everything when no secret is configured.
#[derive(Debug, Clone, Default)]
pub struct WebhookVerifier {
    secret: Option<Secret>,
}

impl WebhookVerifier {
    pub fn new(secret: Option<Secret>) -> Self {
        Self { secret }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), SignatureError> {
        let Some(secret) = &self.secret else {
            return Ok(());
        };

        let signature = signature.ok_or(SignatureError::Missing)?;
        let digest = signature
            .trim()
            .strip_prefix(SIGNATURE_PREFIX)
            .ok_or(SignatureError::Malformed)?;
        let expected = hex::decode(digest).map_err(|_| SignatureError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(secret.expose().as_bytes())
            .map_err(|_| SignatureError::Malformed)?;
        mac.update(body);
        mac.verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }
}

#[cfg(test)]
pub(crate) fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}
