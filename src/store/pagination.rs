//! # Page Metadata
//!
//! Derived per list call from the matching-row count and the caller's
//! pagination parameters. Nothing here is stored.

use serde::Serialize;

/// Pagination metadata returned alongside a page of records.
///
/// When no rows match, every field is zero and none are serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: u64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: u64,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl PageMetadata {
    /// Computes metadata for `total_records` matching rows.
    ///
    /// `last_page = ceil(total_records / page_size)`.
    pub fn calculate(total_records: u64, page: u32, page_size: u32) -> Self {
        if total_records == 0 || page_size == 0 {
            return Self::default();
        }

        let page_size = u64::from(page_size);
        Self {
            current_page: u64::from(page),
            page_size,
            first_page: 1,
            last_page: total_records.div_ceil(page_size),
            total_records,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
