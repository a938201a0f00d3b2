// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Page-number pagination.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

const LAST_PAGE: &str = "last";

fn invalid_page() -> AppError {
    AppError::NotFound("Invalid page.".to_string())
}

/// Number of pages needed for `count` items. An empty collection has one.
fn page_count(count: u64, page_size: u32) -> u64 {
    count.div_ceil(page_size.max(1) as u64).max(1)
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// 1-indexed page number, or `last`
    pub page: Option<String>,
}

impl PageQuery {
    /// Validated page number and row offset for a collection of `count`
    /// items. Anything but a page number in range (or `last`) is a 404.
    pub fn resolve(&self, count: u64, page_size: u32) -> Result<(u32, i64)> {
        let last_page = page_count(count, page_size);
        let page = match self.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(LAST_PAGE) => u32::try_from(last_page).map_err(|_| invalid_page())?,
            Some(raw) => raw.parse::<u32>().map_err(|_| invalid_page())?,
        };
        if page < 1 || page as u64 > last_page {
            return Err(invalid_page());
        }

        let offset = (page as i64 - 1)
            .checked_mul(page_size as i64)
            .ok_or_else(invalid_page)?;
        Ok((page, offset))
    }
}

/// One page of results with links to its neighbours.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Build a page. Pages past the end are rejected, except page 1 of an
    /// empty collection.
    pub fn new(results: Vec<T>, count: u64, page: u32, page_size: u32, path: &str) -> Result<Self> {
        let last_page = page_count(count, page_size);
        if page as u64 > last_page {
            return Err(invalid_page());
        }

        let next = (page as u64) < last_page;
        let next = next.then(|| format!("{}?page={}", path, page + 1));
        let previous = match page {
            1 => None,
            2 => Some(path.to_string()),
            n => Some(format!("{}?page={}", path, n - 1)),
        };

        Ok(Self {
            count,
            next,
            previous,
            results,
        })
    }
}
