// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod page;
pub mod user;

pub use page::{Page, PageQuery};
pub use user::{NewUser, User, UserStatusUpdate};
