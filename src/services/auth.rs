use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Password hashing failed: {}", e))?;

    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// [`hash_password`] on the blocking pool, for use from request handlers.
pub async fn hash_password_async(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("Password hashing task failed")?
}

/// [`verify_password`] on the blocking pool. A failed task counts as a mismatch.
pub async fn verify_password_async(password: String, hash: String) -> bool {
    match tokio::task::spawn_blocking(move || verify_password(&password, &hash)).await {
        Ok(matches) => matches,
        Err(e) => {
            log::error!("❌ Password verification task failed: {}", e);
            false
        }
    }
}

/// Random bearer token handed to the client. Only its digest is stored.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Keyed digest of a bearer token, as stored in the sessions table.
pub fn token_digest(secret: &str, token: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow!("Invalid session secret: {}", e))?;
    mac.update(token.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("Paneer@123").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Paneer@123", &hash));
        assert!(!verify_password("paneer@123", &hash));
    }

    #[tokio::test]
    async fn test_async_password_helpers() {
        let hash = hash_password_async("Rajma#7".to_string()).await.unwrap();

        assert!(verify_password_async("Rajma#7".to_string(), hash.clone()).await);
        assert!(!verify_password_async("rajma#7".to_string(), hash).await);
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_tokens_are_unique_hex() {
        let a = generate_token();
        let b = generate_token();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_digest_depends_on_secret_and_token() {
        let digest = token_digest("secret-a", "token").unwrap();

        assert_eq!(digest, token_digest("secret-a", "token").unwrap());
        assert_ne!(digest, token_digest("secret-b", "token").unwrap());
        assert_ne!(digest, token_digest("secret-a", "token2").unwrap());
        assert_eq!(digest.len(), 64);
    }
}
