use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cacahuete_core::ApiError;
use sha2::{Digest, Sha256};

use crate::AppState;

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Shared secret expected in `Authorization: Bearer <secret>`.
///
/// Only the digest is kept, and candidates are compared digest to digest.
#[derive(Clone)]
pub struct SharedSecret {
    digest: String,
}

impl SharedSecret {
    pub fn new(secret: &str) -> Self {
        Self {
            digest: hash_token(secret),
        }
    }

    pub fn accepts(&self, candidate: &str) -> bool {
        hash_token(candidate) == self.digest
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// Middleware for the recipe routes. Passes everything through when no
/// secret is configured.
pub async fn require_secret(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(secret) = state.secret.as_ref() else {
        return next.run(request).await;
    };

    let verdict = match request.headers().get(header::AUTHORIZATION) {
        None => Err("missing Authorization header"),
        Some(value) => match value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
            None => Err("invalid Authorization header format"),
            Some(token) if secret.accepts(token) => Ok(()),
            Some(_) => Err("invalid token"),
        },
    };

    match verdict {
        Ok(()) => next.run(request).await,
        Err(reason) => {
            tracing::warn!(path = %request.uri().path(), reason, "Rejected unauthenticated request");
            ApiError::unauthorized(reason).into_response()
        }
    }
}
