use serde::Serialize;

use super::error::QueryError;

pub const DEFAULT_LIMIT: i64 = 20;
pub const DEFAULT_MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub skip: i64,
    pub take: i64,
    pub page: i64,
    pub limit: i64,
}

/// Resolve page/limit into skip/take.
///
/// A missing or non-positive page means page 1. A missing limit means
/// `DEFAULT_LIMIT`; a larger one is capped at `max_limit`. A non-positive
/// limit is rejected rather than passed to the data client.
pub fn parse_pagination(page: Option<i64>, limit: Option<i64>, max_limit: i64) -> Result<Pagination, QueryError> {
    let page = page.filter(|p| *p > 0).unwrap_or(1);

    let requested = limit.unwrap_or(DEFAULT_LIMIT);
    if requested <= 0 {
        return Err(QueryError::InvalidLimit(format!(
            "limit must be a positive integer, got {}",
            requested
        )));
    }

    let limit = if requested > max_limit {
        tracing::warn!("Limit {} exceeds max {}, capping to max", requested, max_limit);
        max_limit
    } else {
        requested
    };

    let skip = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| QueryError::InvalidPage(format!("page {} is out of range", page)))?;

    Ok(Pagination { skip, take: limit, page, limit })
}
