// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

// GitHub App authentication: RS256 JWTs signed with the app's private key.
// A token is valid for nine minutes and backdated one minute to absorb
// clock drift between this host and GitHub.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::domain::config::Secret;
use crate::domain::status::StatusError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

pub struct AppJwtSigner {
    app_id: u64,
    key: EncodingKey,
}

impl AppJwtSigner {
    pub fn new(app_id: u64, private_key: &Secret) -> Result<Self, StatusError> {
        let key = EncodingKey::from_rsa_pem(private_key.expose().as_bytes())
            .map_err(|e| StatusError::Auth(format!("invalid app private key: {e}")))?;
        Ok(Self { app_id, key })
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    pub fn claims_at(&self, now: DateTime<Utc>) -> AppClaims {
        AppClaims {
            iat: (now - Duration::seconds(60)).timestamp(),
            exp: (now + Duration::minutes(9)).timestamp(),
            iss: self.app_id.to_string(),
        }
    }

    pub fn sign(&self) -> Result<String, StatusError> {
        encode(
            &Header::new(Algorithm::RS256),
            &self.claims_at(Utc::now()),
            &self.key,
        )
        .map_err(|e| StatusError::Auth(format!("failed to sign app token: {e}")))
    }
}
