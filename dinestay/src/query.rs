//! Query builder for resource list endpoints.
//!
//! A [`ResourceQuery`] is built from the raw query-string parameters of a list request in three
//! composable stages, mirroring how the list endpoint consumes them:
//!
//! 1. [`ResourceQuery::search`] - case-insensitive substring match of `keyword` against `name`
//! 2. [`ResourceQuery::filter`] - every other non-reserved parameter becomes an attribute filter;
//!    bracketed keys (`ratings[gte]=4`) select a comparison operator
//! 3. [`ResourceQuery::paginate`] - 1-based `page` over a fixed page size
//!
//! The resulting query is storage-agnostic: the Postgres store renders it with
//! [`ResourceQuery::push_where`]/[`ResourceQuery::push_window`], the in-memory store evaluates it
//! with [`ResourceQuery::matches`].
//!
//! ```ignore
//! let query = ResourceQuery::all().search(&params).filter(&params)?;
//! let filtered = store.count(kind, &query).await?;
//! let page = store.list(kind, &query.paginate(&params, 8)?).await?;
//! ```

use crate::db::models::resources::ResourceDBResponse;
use sqlx::{Postgres, QueryBuilder};
use std::collections::HashMap;
use thiserror::Error;

/// Raw query-string parameters.
pub type QueryParams = HashMap<String, String>;

/// Parameters that control searching and paging rather than filtering.
pub const RESERVED_PARAMS: [&str; 3] = ["keyword", "page", "limit"];

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("Unknown filter field: {0}")]
    UnknownField(String),

    #[error("Unknown comparison operator '{op}' for field {field}")]
    UnknownOperator { field: String, op: String },

    #[error("Comparison operators are only supported on numeric fields, got {0}")]
    TextComparison(String),

    #[error("Invalid numeric value '{value}' for field {field}")]
    InvalidNumber { field: String, value: String },

    #[error("Invalid page number: {0}")]
    InvalidPage(String),
}

/// Resource attributes that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Name,
    Description,
    Address,
    Category,
    PhoneNo,
    Ratings,
    NumOfReviews,
}

impl FilterField {
    /// Parse the field from its JSON (query-string) name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(FilterField::Name),
            "description" => Some(FilterField::Description),
            "address" => Some(FilterField::Address),
            "category" => Some(FilterField::Category),
            "phoneNo" => Some(FilterField::PhoneNo),
            "ratings" => Some(FilterField::Ratings),
            "numOfReviews" => Some(FilterField::NumOfReviews),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            FilterField::Name => "name",
            FilterField::Description => "description",
            FilterField::Address => "address",
            FilterField::Category => "category",
            FilterField::PhoneNo => "phone_no",
            FilterField::Ratings => "ratings",
            FilterField::NumOfReviews => "num_of_reviews",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, FilterField::PhoneNo | FilterField::Ratings | FilterField::NumOfReviews)
    }

    fn text_of(self, resource: &ResourceDBResponse) -> Option<&str> {
        match self {
            FilterField::Name => Some(&resource.name),
            FilterField::Description => Some(&resource.description),
            FilterField::Address => Some(&resource.address),
            FilterField::Category => Some(&resource.category),
            _ => None,
        }
    }

    fn number_of(self, resource: &ResourceDBResponse) -> Option<f64> {
        match self {
            FilterField::PhoneNo => Some(resource.phone_no as f64),
            FilterField::Ratings => Some(resource.ratings),
            FilterField::NumOfReviews => Some(resource.num_of_reviews as f64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "gt" => Some(Comparison::Gt),
            "gte" => Some(Comparison::Gte),
            "lt" => Some(Comparison::Lt),
            "lte" => Some(Comparison::Lte),
            _ => None,
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }

    fn holds(self, left: f64, right: f64) -> bool {
        match self {
            Comparison::Eq => left == right,
            Comparison::Gt => left > right,
            Comparison::Gte => left >= right,
            Comparison::Lt => left < right,
            Comparison::Lte => left <= right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: FilterField,
    pub op: Comparison,
    pub value: FilterValue,
}

impl FieldFilter {
    /// Parse one `key=value` pair, where `key` is `field` or `field[op]`.
    pub fn parse(key: &str, value: &str) -> Result<Self, QueryError> {
        let (name, op) = match key.split_once('[') {
            Some((name, rest)) => {
                let op_name = rest.strip_suffix(']').unwrap_or(rest);
                let op = Comparison::parse(op_name).ok_or_else(|| QueryError::UnknownOperator {
                    field: name.to_string(),
                    op: op_name.to_string(),
                })?;
                (name, op)
            }
            None => (key, Comparison::Eq),
        };

        let field = FilterField::parse(name).ok_or_else(|| QueryError::UnknownField(name.to_string()))?;

        let value = if field.is_numeric() {
            let number = value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| QueryError::InvalidNumber {
                    field: name.to_string(),
                    value: value.to_string(),
                })?;
            FilterValue::Number(number)
        } else if op != Comparison::Eq {
            return Err(QueryError::TextComparison(name.to_string()));
        } else {
            FilterValue::Text(value.to_string())
        };

        Ok(Self { field, op, value })
    }

    fn matches(&self, resource: &ResourceDBResponse) -> bool {
        match &self.value {
            FilterValue::Text(expected) => self.field.text_of(resource) == Some(expected.as_str()),
            FilterValue::Number(expected) => self
                .field
                .number_of(resource)
                .is_some_and(|actual| self.op.holds(actual, *expected)),
        }
    }
}

/// Skip/limit window for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: i64,
    pub limit: i64,
}

impl Window {
    /// Window for a 1-based page number. Pages past the end of the range clamp to an empty window.
    pub fn for_page(page: i64, per_page: i64) -> Self {
        let page = page.max(1);
        Self {
            skip: (page - 1).saturating_mul(per_page),
            limit: per_page,
        }
    }
}

/// A search + filter + pagination request over one resource collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceQuery {
    keyword: Option<String>,
    filters: Vec<FieldFilter>,
    window: Option<Window>,
}

impl ResourceQuery {
    /// Every document, in default order.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to documents whose name contains `keyword` (case-insensitive).
    pub fn search(mut self, params: &QueryParams) -> Self {
        self.keyword = params
            .get("keyword")
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        self
    }

    /// Apply an attribute filter for every non-reserved parameter.
    pub fn filter(mut self, params: &QueryParams) -> Result<Self, QueryError> {
        let mut keys: Vec<&String> = params.keys().filter(|k| !RESERVED_PARAMS.contains(&k.as_str())).collect();
        // Stable rendering regardless of map order
        keys.sort();

        for key in keys {
            self.filters.push(FieldFilter::parse(key, &params[key])?);
        }
        Ok(self)
    }

    /// Restrict to the window selected by `page` (default 1).
    pub fn paginate(mut self, params: &QueryParams, per_page: i64) -> Result<Self, QueryError> {
        let page = match params.get("page").map(|p| p.trim()) {
            None | Some("") => 1,
            Some(raw) => raw.parse::<i64>().map_err(|_| QueryError::InvalidPage(raw.to_string()))?,
        };
        self.window = Some(Window::for_page(page, per_page));
        Ok(self)
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }

    /// Whether a document passes the search and filter stages (the window is not considered).
    pub fn matches(&self, resource: &ResourceDBResponse) -> bool {
        if let Some(keyword) = &self.keyword {
            if !resource.name.to_lowercase().contains(&keyword.to_lowercase()) {
                return false;
            }
        }
        self.filters.iter().all(|f| f.matches(resource))
    }

    /// Append the search and filter stages as a `WHERE` clause.
    pub fn push_where(&self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(" WHERE 1=1");

        if let Some(keyword) = &self.keyword {
            query.push(" AND LOWER(name) LIKE ");
            query.push_bind(format!("%{}%", escape_like(&keyword.to_lowercase())));
        }

        for filter in &self.filters {
            query.push(format!(" AND {} {} ", filter.field.column(), filter.op.sql()));
            match &filter.value {
                FilterValue::Text(text) => query.push_bind(text.clone()),
                FilterValue::Number(number) => query.push_bind(*number),
            };
        }
    }

    /// Append `LIMIT`/`OFFSET` when the query is paginated.
    pub fn push_window(&self, query: &mut QueryBuilder<'_, Postgres>) {
        if let Some(window) = self.window {
            query.push(" LIMIT ");
            query.push_bind(window.limit);
            query.push(" OFFSET ");
            query.push_bind(window.skip);
        }
    }
}

/// Escape LIKE metacharacters so the keyword is matched literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
