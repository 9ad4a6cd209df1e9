//! # List Filters
//!
//! Pagination and sort parameters for listing coins. Sorting is restricted to
//! a fixed safelist: raw sort strings are parsed into [`SortKey`] during
//! validation, so the store only ever sees a column it can name itself.

use std::fmt;

use crate::coin::Validator;

/// Sort values accepted from clients. A leading `-` means descending.
pub const SORT_SAFELIST: &[&str] = &[
    "id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime",
];

/// Largest accepted page number.
pub const MAX_PAGE: i64 = 10_000_000;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Title,
    Year,
    Runtime,
}

impl SortColumn {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Title => "title",
            SortColumn::Year => "year",
            SortColumn::Runtime => "runtime",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// A safelisted sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl SortKey {
    /// Parses a safelisted sort value, or returns `None`.
    pub fn parse(value: &str) -> Option<Self> {
        if !SORT_SAFELIST.contains(&value) {
            return None;
        }

        let (direction, name) = match value.strip_prefix('-') {
            Some(name) => (SortDirection::Descending, name),
            None => (SortDirection::Ascending, value),
        };

        let column = match name {
            "id" => SortColumn::Id,
            "title" => SortColumn::Title,
            "year" => SortColumn::Year,
            "runtime" => SortColumn::Runtime,
            _ => return None,
        };

        Some(Self { column, direction })
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self {
            column: SortColumn::Id,
            direction: SortDirection::Ascending,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.direction == SortDirection::Descending {
            f.write_str("-")?;
        }
        f.write_str(self.column.as_sql())
    }
}

/// Validated pagination and sort parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filters {
    pub page: u32,
    pub page_size: u32,
    pub sort: SortKey,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            sort: SortKey::default(),
        }
    }
}

impl Filters {
    pub fn limit(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }
}

/// Checks raw pagination input, recording failures in `v`.
///
/// Returns the typed filters only when every check passed.
pub fn validate_filters(v: &mut Validator, page: i64, page_size: i64, sort: &str) -> Option<Filters> {
    v.check(page > 0, "page", "must be greater than zero");
    v.check(page <= MAX_PAGE, "page", "must be a maximum of 10 million");
    v.check(page_size > 0, "page_size", "must be greater than zero");
    v.check(page_size <= MAX_PAGE_SIZE, "page_size", "must be a maximum of 100");

    let sort = SortKey::parse(sort);
    v.check(sort.is_some(), "sort", "invalid sort value");

    if !v.valid() {
        return None;
    }

    Some(Filters {
        page: u32::try_from(page).ok()?,
        page_size: u32::try_from(page_size).ok()?,
        sort: sort?,
    })
}
