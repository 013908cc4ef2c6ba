//! Pagination normalization and the response envelope.

use serde::Serialize;

use crate::config::SearchConfig;
use crate::models::AcademyRecord;

/// Normalized pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub page: u64,
    /// Page size, already clamped to the configured maximum.
    pub limit: u64,
}

impl Page {
    /// Resolve raw page/limit values: non-numeric or non-positive input
    /// silently normalizes, and the limit is capped regardless of request.
    pub fn resolve(page: Option<f64>, limit: Option<f64>, config: &SearchConfig) -> Self {
        let page = match page {
            Some(p) if p.is_finite() && p >= 1.0 => p.floor() as u64,
            _ => 1,
        };
        let limit = match limit {
            Some(l) if l.is_finite() && l >= 1.0 => l.floor() as u64,
            _ => config.default_limit,
        };
        Self {
            page,
            limit: limit.clamp(1, config.max_limit),
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

/// The response envelope, identical for every executor path.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub results: Vec<AcademyRecord>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl SearchPage {
    /// Assemble from an already-paginated slice plus an independent total.
    pub fn assemble(results: Vec<AcademyRecord>, page: &Page, total: u64) -> Self {
        Self {
            results,
            page: page.page,
            limit: page.limit,
            total,
            total_pages: total_pages(total, page.limit),
        }
    }

    /// Slice one page out of a fully materialized, already ordered sequence.
    pub fn slice(all: Vec<AcademyRecord>, page: &Page) -> Self {
        let total = all.len() as u64;
        let results = all
            .into_iter()
            .skip(page.skip() as usize)
            .take(page.limit as usize)
            .collect();
        Self::assemble(results, page, total)
    }
}

pub fn total_pages(total: u64, limit: u64) -> u64 {
    std::cmp::max(1, total.div_ceil(limit))
}
