pub mod error;
pub mod order;
pub mod pagination;
pub mod params;
pub mod projection;
pub mod where_clause;

pub use error::QueryError;
pub use order::{build_order_by_clause, OrderBy};
pub use pagination::{parse_pagination, Pagination, DEFAULT_LIMIT, DEFAULT_MAX_LIMIT};
pub use params::FindManyParams;
pub use projection::{build_include_clause, build_select_clause, merge_projection, IncludeClause, SelectClause};
pub use where_clause::{build_where_clause, is_absent, Condition, WhereClause};
