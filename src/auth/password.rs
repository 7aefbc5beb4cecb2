use std::sync::OnceLock;

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::Rng;

use crate::errors::{Error, Result};

/// Salted one-way hashing of user passwords with argon2id.
///
/// Hashes are stored as PHC strings, which embed the salt and the cost parameters, so
/// verification keeps working after the parameters are changed.
pub struct PasswordHashing {
    argon2: Argon2<'static>,
    /// Hash compared against when the user doesn't exist, lazily computed
    dummy_hash: OnceLock<String>,
}

impl PasswordHashing {
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| Error::PasswordHash(e.to_string()))?;
        Ok(PasswordHashing {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            dummy_hash: OnceLock::new(),
        })
    }

    /// Hash a plaintext password with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt_bytes: [u8; 16] = rand::thread_rng().gen();
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| Error::PasswordHash(e.to_string()))?;

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::PasswordHash(e.to_string()))
    }

    /// Check a candidate password against a stored hash
    ///
    /// Returns Ok(false) on mismatch, errors only if the stored hash can't be used.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| Error::PasswordHash(e.to_string()))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::PasswordHash(e.to_string())),
        }
    }

    /// Burn the same amount of work as a real verification, used when the user is unknown
    pub fn verify_dummy(&self, password: &str) -> Result<()> {
        let hash = match self.dummy_hash.get() {
            Some(hash) => hash,
            None => {
                let hash = self.hash("not a real password")?;
                self.dummy_hash.get_or_init(|| hash)
            }
        };
        self.verify(password, hash).map(|_| ())
    }
}
