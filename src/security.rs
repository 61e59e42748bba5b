use argon2::{
  password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier,
    SaltString
  },
  Argon2
};
use color_eyre::Result;
use eyre::eyre;

// Password hashing for the admin accounts. Argon2 with its
// default parameters, salted per hash. The plaintext never
// goes anywhere near the database, callers hash it the moment
// they receive it.

pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| eyre!("Password hashing failed - {}", e))
}

// A malformed stored hash counts as a failed check, there's
// nothing useful to do with the parse error at a login prompt.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
  match PasswordHash::new(stored_hash) {
    Ok(parsed) => Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok(),
    Err(_) => false
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_then_verify_roundtrip() {
    let hash = hash_password("correct horse battery staple").unwrap();
    assert!(verify_password("correct horse battery staple", &hash));
  }

  #[test]
  fn wrong_password_is_rejected() {
    let hash = hash_password("segredo").unwrap();
    assert!(!verify_password("errado", &hash));
  }

  #[test]
  fn hashes_are_salted() {
    let first = hash_password("segredo").unwrap();
    let second = hash_password("segredo").unwrap();
    assert_ne!(first, second);
  }

  #[test]
  fn garbage_stored_hash_never_verifies() {
    assert!(!verify_password("segredo", "not-a-phc-string"));
  }
}
