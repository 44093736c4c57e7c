use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};

/// Hashes a password (or a one-time code) into a PHC string.
pub fn hash_secret(plain: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default().hash_password(plain.as_bytes(), &salt)?.to_string())
}

/// Returns false for a mismatch and for a stored hash that cannot be parsed.
pub fn verify_secret(plain: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("unparsable stored hash: {}", e);
            false
        }
    }
}

/// Six-digit verification code in 100000..=999999.
pub fn six_digit_code() -> u32 {
    OsRng.next_u32() % 900_000 + 100_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_secret("Abcdef1!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_secret("Abcdef1!", &hash));
        assert!(!verify_secret("Abcdef1?", &hash));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify_secret("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_code_range() {
        for _ in 0..1000 {
            let code = six_digit_code();
            assert!((100_000..=999_999).contains(&code));
        }
    }
}
