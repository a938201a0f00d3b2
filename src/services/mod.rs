// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod passwords;
pub mod tokens;

pub use passwords::{PasswordHasher, PasswordPolicy, UserAttributes};
pub use tokens::{Claims, TokenError, TokenPair, TokenService, TokenSubject, TokenType};
