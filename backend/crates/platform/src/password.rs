//! Password Hashing and Verification
//!
//! Password handling for the user directory:
//! - Argon2id hashing (memory-hard, recommended by OWASP)
//! - Zeroization of clear text and pepper material
//! - Constant-time comparison (inside `argon2`)
//! - Configurable length policy for newly set passwords
//!
//! ## Security Features
//! - Fresh random salt per hash: two hashes of one password differ, both verify
//! - PHC string format, so parameters travel with every stored hash
//! - Pepper support for an additional application-wide secret
//! - Debug output of every secret-bearing type is redacted

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

// ============================================================================
// Constants
// ============================================================================

/// Default minimum password length for newly set passwords
pub const MIN_PASSWORD_LENGTH: usize = 1;

/// Default maximum password length (bounds the work handed to Argon2)
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password is too short
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    /// Password is too long
    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    /// Password contains invalid characters (control characters)
    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed (or the hasher could not be configured)
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Stored hash is not a valid PHC string
    #[error("Invalid password hash format")]
    InvalidHashFormat,

    /// Verification could not run to completion
    #[error("Password verification failed: {0}")]
    VerificationFailed(String),
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// Input is NFKC-normalized on construction so that canonically
/// equivalent inputs hash and verify identically.
///
/// ## Security
/// - Implements `Zeroize` and `ZeroizeOnDrop`
/// - Does not implement `Clone` to prevent accidental copies
/// - Debug output is redacted
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    /// Number of Unicode code points (not bytes)
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn chars(&self) -> impl Iterator<Item = char> + '_ {
        self.0.chars()
    }
}

impl From<String> for ClearTextPassword {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for ClearTextPassword {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Password Policy
// ============================================================================

/// Length and character rules applied when a password is *set*
///
/// Verification never consults the policy: a candidate that could not
/// have been stored simply fails to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            max_length: MAX_PASSWORD_LENGTH,
        }
    }
}

impl PasswordPolicy {
    pub fn check(&self, password: &ClearTextPassword) -> Result<(), PasswordPolicyError> {
        let char_count = password.char_count();

        if char_count < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min: self.min_length,
                actual: char_count,
            });
        }

        if char_count > self.max_length {
            return Err(PasswordPolicyError::TooLong {
                max: self.max_length,
                actual: char_count,
            });
        }

        // Tab and newline are tolerated, other control characters are not
        if password
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordPolicyError::InvalidCharacter);
        }

        Ok(())
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
///
/// The PHC string carries algorithm, version, parameters, salt and hash,
/// so a stored value verifies even after the hasher's defaults change.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from a PHC string (e.g. from persisted state)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    /// Wrap a string without validating it; verification reports
    /// `InvalidHashFormat` if it is not a PHC string.
    pub fn from_phc_string_unchecked(s: impl Into<String>) -> Self {
        Self { hash: s.into() }
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Hasher
// ============================================================================

/// Hashing backend behind the credential engine
///
/// `verify` returns `Ok(false)` on a plain mismatch; `Err` means the
/// stored hash could not be checked at all.
pub trait CredentialHasher: fmt::Debug + Send + Sync {
    fn hash(&self, password: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError>;

    fn verify(
        &self,
        password: &ClearTextPassword,
        stored: &HashedPassword,
    ) -> Result<bool, PasswordHashError>;
}

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingParams {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    /// Lanes
    pub parallelism: u32,
}

impl Default for HashingParams {
    /// OWASP recommended Argon2id parameters: m=19456 (19 MiB), t=2, p=1
    fn default() -> Self {
        Self {
            memory_cost: Params::DEFAULT_M_COST,
            time_cost: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashingParams {
    fn to_params(self) -> Result<Params, PasswordHashError> {
        Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))
    }
}

/// Argon2id hasher with an optional pepper
///
/// The pepper is appended to the password bytes before hashing and
/// verifying; it must be the same for both.
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    params: HashingParams,
    pepper: Option<Zeroizing<Vec<u8>>>,
}

impl Argon2Hasher {
    pub fn new(params: HashingParams, pepper: Option<Vec<u8>>) -> Result<Self, PasswordHashError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_params()?);
        Ok(Self {
            argon2,
            params,
            pepper: pepper.map(Zeroizing::new),
        })
    }

    pub fn params(&self) -> HashingParams {
        self.params
    }

    /// Hash a password with a fresh random salt (128 bits)
    pub fn hash(&self, password: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError> {
        let password_bytes = self.peppered(password);
        let salt = SaltString::generate(OsRng);

        let hash = self
            .argon2
            .hash_password(&password_bytes, &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }

    /// Verify a password against a stored hash
    ///
    /// A plain mismatch is `Ok(false)`; `Err` means verification could not
    /// run (malformed stored hash, unsupported parameters).
    pub fn verify(
        &self,
        password: &ClearTextPassword,
        stored: &HashedPassword,
    ) -> Result<bool, PasswordHashError> {
        let parsed_hash =
            PasswordHash::new(&stored.hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        let password_bytes = self.peppered(password);

        match self.argon2.verify_password(&password_bytes, &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordHashError::VerificationFailed(e.to_string())),
        }
    }

    fn peppered(&self, password: &ClearTextPassword) -> Zeroizing<Vec<u8>> {
        let mut combined = Zeroizing::new(password.as_bytes().to_vec());
        if let Some(pepper) = &self.pepper {
            combined.extend_from_slice(pepper);
        }
        combined
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &ClearTextPassword) -> Result<HashedPassword, PasswordHashError> {
        Argon2Hasher::hash(self, password)
    }

    fn verify(
        &self,
        password: &ClearTextPassword,
        stored: &HashedPassword,
    ) -> Result<bool, PasswordHashError> {
        Argon2Hasher::verify(self, password, stored)
    }
}

impl fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argon2Hasher")
            .field("params", &self.params)
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn light_hasher(pepper: Option<&[u8]>) -> Argon2Hasher {
        let params = HashingParams {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        };
        Argon2Hasher::new(params, pepper.map(<[u8]>::to_vec)).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = light_hasher(None);
        let password = ClearTextPassword::new("TestPassword123!");
        let hashed = hasher.hash(&password).unwrap();

        assert!(hasher.verify(&password, &hashed).unwrap());

        let wrong_password = ClearTextPassword::new("WrongPassword123!");
        assert!(!hasher.verify(&wrong_password, &hashed).unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = light_hasher(None);
        let password = ClearTextPassword::new("secret1");
        let first = hasher.hash(&password).unwrap();
        let second = hasher.hash(&password).unwrap();

        assert_ne!(first.as_phc_string(), second.as_phc_string());
        assert!(hasher.verify(&password, &first).unwrap());
        assert!(hasher.verify(&password, &second).unwrap());
    }

    #[test]
    fn test_hash_is_argon2id_phc() {
        let hasher = light_hasher(None);
        let hashed = hasher.hash(&ClearTextPassword::new("secret1")).unwrap();
        assert!(hashed.as_phc_string().starts_with("$argon2id$"));
    }

    #[test]
    fn test_hash_with_pepper() {
        let pepper = b"my_secret_pepper";
        let peppered = light_hasher(Some(pepper));
        let plain = light_hasher(None);
        let wrong = light_hasher(Some(b"wrong_pepper"));

        let password = ClearTextPassword::new("TestPassword123!");
        let hashed = peppered.hash(&password).unwrap();

        assert!(peppered.verify(&password, &hashed).unwrap());
        assert!(!plain.verify(&password, &hashed).unwrap());
        assert!(!wrong.verify(&password, &hashed).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let hasher = light_hasher(None);
        let corrupt = HashedPassword::from_phc_string_unchecked("not_a_valid_hash");
        let result = hasher.verify(&ClearTextPassword::new("anything"), &corrupt);
        assert!(matches!(result, Err(PasswordHashError::InvalidHashFormat)));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let hasher = light_hasher(None);
        let password = ClearTextPassword::new("TestPassword123!");
        let hashed = hasher.hash(&password).unwrap();

        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(hasher.verify(&password, &restored).unwrap());
    }

    #[test]
    fn test_hasher_as_trait_object() {
        let hasher: Box<dyn CredentialHasher> = Box::new(light_hasher(None));
        let password = ClearTextPassword::new("secret1");
        let hashed = hasher.hash(&password).unwrap();
        assert!(hasher.verify(&password, &hashed).unwrap());
    }

    #[test]
    fn test_invalid_phc_string() {
        assert!(HashedPassword::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_nfkc_equivalent_inputs_verify() {
        let hasher = light_hasher(None);
        // U+FF21 FULLWIDTH LATIN CAPITAL LETTER A normalizes to "A"
        let hashed = hasher.hash(&ClearTextPassword::new("\u{FF21}bc")).unwrap();
        assert!(hasher.verify(&ClearTextPassword::new("Abc"), &hashed).unwrap());
    }

    #[test]
    fn test_invalid_params() {
        let params = HashingParams {
            memory_cost: 1,
            time_cost: 1,
            parallelism: 1,
        };
        assert!(matches!(
            Argon2Hasher::new(params, None),
            Err(PasswordHashError::HashingFailed(_))
        ));
    }

    #[test]
    fn test_policy() {
        let policy = PasswordPolicy::default();
        assert!(policy.check(&ClearTextPassword::new("x")).is_ok());
        assert!(matches!(
            policy.check(&ClearTextPassword::new("")),
            Err(PasswordPolicyError::TooShort { min: 1, actual: 0 })
        ));

        let long_password = "a".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(matches!(
            policy.check(&ClearTextPassword::new(long_password)),
            Err(PasswordPolicyError::TooLong { .. })
        ));

        assert!(matches!(
            policy.check(&ClearTextPassword::new("bad\u{0007}bell")),
            Err(PasswordPolicyError::InvalidCharacter)
        ));
    }

    #[test]
    fn test_policy_counts_code_points() {
        let policy = PasswordPolicy {
            min_length: 5,
            max_length: 5,
        };
        assert!(policy.check(&ClearTextPassword::new("パスワード")).is_ok());
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::new("secret");
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret"));

        let hasher = light_hasher(Some(b"pepper"));
        let hashed = hasher.hash(&password).unwrap();
        assert!(!format!("{:?}", hashed).contains("argon2"));
        assert!(format!("{:?}", hasher).contains("REDACTED"));
    }
}
