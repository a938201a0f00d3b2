// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and password strength validation.

use crate::error::AppError;
use crate::settings::PasswordPolicySettings;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use std::num::NonZeroU32;

const ALGORITHM: &str = "pbkdf2_sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = digest::SHA256_OUTPUT_LEN;

/// Default PBKDF2 work factor.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Maximum similarity between a password and a user attribute.
const MAX_SIMILARITY: f64 = 0.7;

/// PBKDF2-HMAC-SHA256 password hasher.
///
/// Encoded form: `pbkdf2_sha256$<iterations>$<salt b64>$<hash b64>`.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN),
            rng: SystemRandom::new(),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate salt")))?;

        let mut hash = [0u8; HASH_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            &salt,
            password.as_bytes(),
            &mut hash,
        );

        Ok(format!(
            "{}${}${}${}",
            ALGORITHM,
            self.iterations,
            BASE64.encode(salt),
            BASE64.encode(hash)
        ))
    }

    /// Check a password against an encoded hash. Malformed hashes never match.
    pub fn verify(&self, password: &str, encoded: &str) -> bool {
        let mut parts = encoded.splitn(4, '$');
        let (Some(algorithm), Some(iterations), Some(salt), Some(hash)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };

        if algorithm != ALGORITHM {
            return false;
        }
        let Some(iterations) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
            return false;
        };
        let (Ok(salt), Ok(hash)) = (BASE64.decode(salt), BASE64.decode(hash)) else {
            return false;
        };

        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            &salt,
            password.as_bytes(),
            &hash,
        )
        .is_ok()
    }

    /// Derive a key at this hasher's cost and throw it away.
    ///
    /// Login attempts for accounts that do not exist run this in place of
    /// [`PasswordHasher::verify`] so both paths take the same time.
    pub fn verify_dummy(&self, password: &str) {
        let mut hash = [0u8; HASH_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            &[0u8; SALT_LEN],
            password.as_bytes(),
            &mut hash,
        );
        std::hint::black_box(&hash);
    }
}

/// User attributes a password must not resemble.
#[derive(Debug, Default)]
pub struct UserAttributes<'a> {
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Password strength rules.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    settings: PasswordPolicySettings,
}

impl PasswordPolicy {
    pub fn new(settings: PasswordPolicySettings) -> Self {
        Self { settings }
    }

    /// Validate a password, collecting every failed rule.
    pub fn validate(&self, password: &str, user: &UserAttributes<'_>) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.settings.user_attribute_similarity {
            let attributes = [
                ("email address", user.email),
                ("first name", user.first_name),
                ("last name", user.last_name),
            ];
            if let Some((label, _)) = attributes
                .iter()
                .find(|(_, value)| too_similar(password, value))
            {
                errors.push(format!("The password is too similar to the {}.", label));
            }
        }

        if password.chars().count() < self.settings.min_length {
            errors.push(format!(
                "This password is too short. It must contain at least {} characters.",
                self.settings.min_length
            ));
        }

        if self.settings.common_passwords
            && COMMON_PASSWORDS.contains(&password.trim().to_lowercase().as_str())
        {
            errors.push("This password is too common.".to_string());
        }

        if self.settings.numeric && !password.is_empty() && password.chars().all(|c| c.is_ascii_digit())
        {
            errors.push("This password is entirely numeric.".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Compare the password against the whole attribute and each of its word
/// parts (an email splits on `@` and `.`).
fn too_similar(password: &str, attribute: &str) -> bool {
    let attribute = attribute.trim().to_lowercase();
    if attribute.is_empty() {
        return false;
    }
    let password = password.to_lowercase();

    std::iter::once(attribute.as_str())
        .chain(attribute.split(|c: char| !c.is_alphanumeric() && c != '_'))
        .filter(|part| !part.is_empty())
        .any(|part| quick_ratio(&password, part) >= MAX_SIMILARITY)
}

/// Upper bound on sequence similarity: twice the size of the character
/// multiset intersection over the total length.
fn quick_ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }

    let mut available: std::collections::HashMap<char, usize> = std::collections::HashMap::new();
    for c in b.chars() {
        *available.entry(c).or_default() += 1;
    }
    let matches = a
        .chars()
        .filter(|c| match available.get_mut(c) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        })
        .count();

    2.0 * matches as f64 / total as f64
}

/// Frequently used passwords, lowercase.
const COMMON_PASSWORDS: &[&str] = &[
    "123456", "password", "12345678", "qwerty", "123456789", "12345", "1234", "111111",
    "1234567", "dragon", "123123", "baseball", "abc123", "football", "monkey", "letmein",
    "696969", "shadow", "master", "666666", "qwertyuiop", "123321", "mustang", "1234567890",
    "michael", "654321", "superman", "1qaz2wsx", "7777777", "121212", "000000", "qazwsx",
    "123qwe", "killer", "trustno1", "jordan", "jennifer", "zxcvbnm", "asdfgh", "hunter",
    "buster", "soccer", "harley", "batman", "andrew", "tigger", "sunshine", "iloveyou",
    "2000", "charlie", "robert", "thomas", "hockey", "ranger", "daniel", "starwars",
    "klaster", "112233", "george", "computer", "michelle", "jessica", "pepper", "1111",
    "zxcvbn", "555555", "11111111", "131313", "freedom", "777777", "pass", "maggie",
    "159753", "aaaaaa", "ginger", "princess", "joshua", "cheese", "amanda", "summer",
    "love", "ashley", "nicole", "chelsea", "biteme", "matthew", "access", "yankees",
    "987654321", "dallas", "austin", "thunder", "taylor", "matrix", "password1",
    "password123", "welcome", "welcome1", "admin", "admin123", "login", "passw0rd",
    "qwerty123", "1q2w3e4r", "changeme", "secret", "letmein1", "iloveyou1",
];
