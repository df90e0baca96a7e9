use rand::RngCore;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

/// How long an issued reset token stays valid.
pub const RESET_TOKEN_TTL: Duration = Duration::minutes(10);

/// One-time password-reset token.
///
/// `plain` goes out only in the reset email; `hashed` and `expires_at` are
/// what the user record persists.
#[derive(Debug)]
pub struct ResetToken {
    pub plain: String,
    pub hashed: String,
    pub expires_at: OffsetDateTime,
}

impl ResetToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let plain = hex::encode(bytes);
        let hashed = Self::hash(&plain);
        Self {
            plain,
            hashed,
            expires_at: OffsetDateTime::now_utc() + RESET_TOKEN_TTL,
        }
    }

    /// Deterministic lookup key for an incoming plaintext token.
    pub fn hash(plain: &str) -> String {
        hex::encode(Sha256::digest(plain.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_matches_rehash_of_plain() {
        let token = ResetToken::generate();
        assert_eq!(token.hashed, ResetToken::hash(&token.plain));
        assert_ne!(token.hashed, token.plain);
    }

    #[test]
    fn tokens_are_unique() {
        let a = ResetToken::generate();
        let b = ResetToken::generate();
        assert_ne!(a.plain, b.plain);
        assert_ne!(a.hashed, b.hashed);
    }

    #[test]
    fn expiry_is_ten_minutes_out() {
        let token = ResetToken::generate();
        let delta = token.expires_at - OffsetDateTime::now_utc();
        assert!(delta > Duration::minutes(9));
        assert!(delta <= Duration::minutes(10));
    }

    #[test]
    fn plain_token_is_64_hex_chars() {
        let token = ResetToken::generate();
        assert_eq!(token.plain.len(), 64);
        assert!(token.plain.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
