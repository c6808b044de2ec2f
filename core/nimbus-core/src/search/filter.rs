//! Ordering and paging for list queries

use crate::db::ScalarValue;
use crate::search::field::Field;
use std::fmt;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// ORDER BY / LIMIT / OFFSET of a list query over entity `E`.
pub struct Filter<E> {
    order: Vec<(&'static str, Direction)>,
    offset: Option<u64>,
    limit: Option<u64>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Filter<E> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            offset: None,
            limit: None,
            _entity: PhantomData,
        }
    }

    /// Append an ordering key; earlier keys take precedence.
    pub fn order_by(mut self, field: Field<E>, direction: Direction) -> Self {
        self.order.push((field.column(), direction));
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 1-based page of `page_size` rows.
    pub fn page(self, page: u64, page_size: u64) -> Self {
        self.with_offset(page.saturating_sub(1) * page_size)
            .with_limit(page_size)
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Clause text appended after WHERE, plus its parameters.
    pub(crate) fn render(&self) -> (String, Vec<ScalarValue>) {
        let mut sql = String::new();
        let mut params = Vec::new();

        if !self.order.is_empty() {
            let keys: Vec<String> = self
                .order
                .iter()
                .map(|(column, direction)| format!("{column} {}", direction.keyword()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }

        // SQLite needs LIMIT before OFFSET; -1 means unbounded
        if self.limit.is_some() || self.offset.is_some() {
            sql.push_str(" LIMIT ?");
            params.push(ScalarValue::Int64(self.limit.map_or(-1, clamp)));
            if let Some(offset) = self.offset {
                sql.push_str(" OFFSET ?");
                params.push(ScalarValue::Int64(clamp(offset)));
            }
        }

        (sql, params)
    }
}

fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl<E> Default for Filter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Filter<E> {
    fn clone(&self) -> Self {
        Self {
            order: self.order.clone(),
            offset: self.offset,
            limit: self.limit,
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Filter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("order", &self.order)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .finish()
    }
}
