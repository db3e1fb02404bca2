//! CSRF protection for state-changing routes
//!
//! Each session carries a random `csrf` field. Forms echo it back in a
//! `token` field (or query parameter); [`CsrfGuard`] rejects requests whose
//! token is missing or does not match with `403 Forbidden`.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use salvo_core::prelude::*;
use sha2::Sha256;

use crate::depot_ext::SessionDepotExt;
use crate::lazy::SessionAccess;

type HmacSha256 = Hmac<Sha256>;

/// Form field or query parameter carrying the token
pub const TOKEN_FIELD: &str = "token";

const DIGEST_KEY: &[u8] = b"expenses-session csrf";

/// Compare two tokens in constant time.
///
/// Both sides are reduced to HMAC-SHA256 digests first, so the comparison
/// time depends on neither the contents nor the lengths of the tokens.
pub fn tokens_match(provided: &str, expected: &str) -> bool {
    let Ok(mut provided_mac) = HmacSha256::new_from_slice(DIGEST_KEY) else {
        return false;
    };
    provided_mac.update(provided.as_bytes());
    let provided_digest = provided_mac.finalize().into_bytes();

    let Ok(mut expected_mac) = HmacSha256::new_from_slice(DIGEST_KEY) else {
        return false;
    };
    expected_mac.update(expected.as_bytes());
    expected_mac.verify_slice(&provided_digest).is_ok()
}

/// Middleware rejecting requests without the session's CSRF token.
///
/// Hoop it on the routes that change state, after `SessionHandler`.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsrfGuard;

impl CsrfGuard {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Handler for CsrfGuard {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        let provided = match req.form::<String>(TOKEN_FIELD).await {
            Some(token) => Some(token),
            None => req.query::<String>(TOKEN_FIELD),
        };

        let Some(session) = depot.session_mut() else {
            tracing::error!("CsrfGuard used without SessionHandler");
            res.render(StatusError::internal_server_error());
            ctrl.skip_rest();
            return;
        };

        let expected = match session.csrf_token().await {
            Ok(expected) => expected,
            Err(e) => {
                tracing::error!("Failed to load session: {}", e);
                res.render(StatusError::internal_server_error());
                ctrl.skip_rest();
                return;
            }
        };

        let valid = match (provided, expected) {
            (Some(provided), Some(expected)) if !provided.is_empty() => {
                tokens_match(&provided, &expected)
            }
            _ => false,
        };

        if !valid {
            tracing::debug!("rejected request with missing or invalid CSRF token");
            res.render(StatusError::forbidden());
            ctrl.skip_rest();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("somecsrf", "somecsrf"));
        assert!(!tokens_match("fake", "somecsrf"));
        assert!(!tokens_match("", "somecsrf"));
        assert!(!tokens_match("somecsrf-and-more", "somecsrf"));
    }
}
