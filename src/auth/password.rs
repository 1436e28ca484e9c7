use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Argon2id with default parameters and a fresh random salt per call.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow::anyhow!(e.to_string())
        })?;
    Ok(hash.to_string())
}

/// Ok(false) is a mismatch; Err means the stored hash itself is unusable.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "stored password hash is not a valid PHC string");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_accepts_the_original_password() {
        let hash = hash_password("Mapmark2024pass").expect("hashing should succeed");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Mapmark2024pass", &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_a_different_password() {
        let hash = hash_password("Riverside77walk").expect("hashing should succeed");
        assert!(!verify_password("Riverside77Walk", &hash).expect("verify should not error"));
    }

    #[test]
    fn salting_makes_hashes_unique() {
        let a = hash_password("Lakeview9trail").expect("hashing should succeed");
        let b = hash_password("Lakeview9trail").expect("hashing should succeed");
        assert_ne!(a, b);
        assert!(verify_password("Lakeview9trail", &b).expect("verify should succeed"));
    }

    #[test]
    fn verify_errors_on_garbage_hash() {
        assert!(verify_password("anything", "plainly-not-a-phc-string").is_err());
    }
}
