//! Password hashing and verification using Argon2id.
//!
//! Hashing uses OWASP-recommended parameters (memory: 19 MiB,
//! iterations: 2, parallelism: 1) with a random salt per hash. An
//! optional pepper (server-side secret) is prepended to the password.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::AuthError;

/// A well-formed Argon2id PHC string with the same cost parameters as
/// [`hash_password`]. Sign-in verifies against it when the email is
/// unknown, so that path costs as much as a wrong password.
const DUMMY_HASH: &str = concat!(
    "$argon2id$v=19$m=19456,t=2,p=1",
    "$b3JnYXV0aC11bmtub3duIQ",
    "$MM8remY4sB73VzihdMCxLHHPcNBYhi4BpEFsPPYDKSo",
);

fn hasher() -> Result<Argon2<'static>, AuthError> {
    // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;
    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

fn peppered<'a>(password: &'a str, pepper: Option<&str>, buf: &'a mut String) -> &'a [u8] {
    match pepper {
        Some(p) => {
            *buf = format!("{p}{password}");
            buf.as_bytes()
        }
        None => password.as_bytes(),
    }
}

/// Hash a password into an Argon2id PHC string.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, AuthError> {
    let argon2 = hasher()?;

    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input, &salt)
        .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// Verify a plaintext password against an Argon2id PHC-format hash.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::MalformedHash)` if the stored hash cannot be parsed.
/// The pepper must match the one used during hashing.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let parsed_hash =
        argon2::PasswordHash::new(hash).map_err(|e| AuthError::MalformedHash(e.to_string()))?;

    let mut buf = String::new();
    let input = peppered(password, pepper, &mut buf);

    // Parameters come from the PHC string; the comparison is constant-time.
    match Argon2::default().verify_password(input, &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::MalformedHash(e.to_string())),
    }
}

/// Run a full verification that cannot succeed. Used where no stored
/// hash exists so the caller's timing matches a real mismatch.
pub fn verify_dummy(password: &str, pepper: Option<&str>) {
    let _ = verify_password(password, DUMMY_HASH, pepper);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_password_matches() {
        let hash = hash_password("hunter2", None).unwrap();
        assert!(verify_password("hunter2", &hash, None).unwrap());
    }

    #[test]
    fn wrong_password_does_not_match() {
        let hash = hash_password("hunter2", None).unwrap();
        assert!(!verify_password("wrong", &hash, None).unwrap());
    }

    #[test]
    fn hash_is_argon2id_and_salted() {
        let a = hash_password("same", None).unwrap();
        let b = hash_password("same", None).unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert!(!a.contains("same"));
        assert_ne!(a, b);
    }

    #[test]
    fn pepper_is_applied() {
        let hash = hash_password("hunter2", Some("pepper!")).unwrap();
        assert!(verify_password("hunter2", &hash, Some("pepper!")).unwrap());
        // Without pepper should fail.
        assert!(!verify_password("hunter2", &hash, None).unwrap());
    }

    #[test]
    fn dummy_hash_parses_and_never_matches() {
        assert!(!verify_password("", DUMMY_HASH, None).unwrap());
        assert!(!verify_password("hunter2", DUMMY_HASH, Some("pepper!")).unwrap());
    }

    #[test]
    fn dummy_hash_costs_the_same_as_a_real_one() {
        let real = hash_password("hunter2", None).unwrap();
        let real = argon2::PasswordHash::new(&real).unwrap();
        let dummy = argon2::PasswordHash::new(DUMMY_HASH).unwrap();

        assert_eq!(dummy.algorithm, real.algorithm);
        assert_eq!(dummy.version, real.version);
        assert_eq!(dummy.params.to_string(), real.params.to_string());
        assert_eq!(dummy.hash.map(|h| h.len()), real.hash.map(|h| h.len()));
    }

    #[test]
    fn malformed_hash_returns_error() {
        let result = verify_password("pw", "not-a-hash", None);
        assert!(matches!(result, Err(AuthError::MalformedHash(_))));
    }
}
