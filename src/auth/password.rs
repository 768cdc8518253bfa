use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Exact, case-sensitive check. A stored value that is not a PHC hash never matches.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hashed) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_exact_password() {
        let hashed = hash_password("pw1").unwrap();
        assert_ne!(hashed, "pw1");
        assert!(verify_password("pw1", &hashed));
        assert!(!verify_password("PW1", &hashed));
        assert!(!verify_password("pw2", &hashed));
    }

    #[test]
    fn plaintext_stored_value_never_matches() {
        assert!(!verify_password("pw1", "pw1"));
    }
}
