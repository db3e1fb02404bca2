//! Random URL-safe tokens for session ids and CSRF values

use base64::{engine::general_purpose::URL_SAFE, Engine};
use rand::RngCore;

use crate::error::SessionError;

/// Length of session ids and CSRF tokens.
pub const TOKEN_LENGTH: i64 = 64;

/// Generate a random URL-safe base64 string of exactly `length` characters.
///
/// Every 3 random bytes encode to 4 characters, so `length` must be a
/// non-negative multiple of 4. Bytes come from `rand::rng()`, which is a
/// CSPRNG reseeded from the operating system.
pub fn random_string(length: i64) -> Result<String, SessionError> {
    if length < 0 {
        return Err(SessionError::InvalidArgument(
            "Negative lengths are not allowed".to_string(),
        ));
    }
    if length % 4 != 0 {
        return Err(SessionError::InvalidArgument(
            "The length must be a multiple of 4".to_string(),
        ));
    }

    let n_bytes = usize::try_from(length * 3 / 4)
        .map_err(|e| SessionError::InvalidArgument(e.to_string()))?;
    let mut bytes = vec![0u8; n_bytes];
    rand::rng().fill_bytes(&mut bytes);
    Ok(URL_SAFE.encode(bytes))
}

/// Whether `token` only uses characters `random_string` can produce.
pub(crate) fn is_url_safe(token: &str) -> bool {
    token
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_exact_lengths() {
        for n in [0, 4, 8, 40, 64] {
            let s = random_string(n).unwrap();
            assert_eq!(s.len() as i64, n);
            assert!(is_url_safe(&s), "not url-safe: {}", s);
        }
    }

    #[test]
    fn test_zero_is_empty() {
        assert_eq!(random_string(0).unwrap(), "");
    }

    #[test]
    fn test_negative_length() {
        for n in [-2, -1] {
            match random_string(n) {
                Err(SessionError::InvalidArgument(msg)) => {
                    assert!(msg.contains("Negative lengths are not allowed"))
                }
                other => panic!("expected InvalidArgument, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_not_multiple_of_four() {
        for n in [1, 3, 39] {
            match random_string(n) {
                Err(SessionError::InvalidArgument(msg)) => {
                    assert!(msg.contains("The length must be a multiple of 4"))
                }
                other => panic!("expected InvalidArgument, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_no_collisions() {
        let tokens: HashSet<String> = (0..100)
            .map(|_| random_string(TOKEN_LENGTH).unwrap())
            .collect();
        assert_eq!(tokens.len(), 100);
    }
}
