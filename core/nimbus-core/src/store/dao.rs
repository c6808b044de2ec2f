//! Generic data access over one entity table
//!
//! 모든 조회/변경은 트랜잭션 안에서 실행됩니다. 단일 호출은 내부에서
//! 트랜잭션을 열고, 여러 문장을 묶어야 하는 호출자는 `*_in` 변형에
//! 자신의 [`Transaction`]을 넘깁니다.

use crate::db::{Database, IntoParam, ScalarValue, Transaction, now_millis};
use crate::error::{NimbusError, NimbusResult};
use crate::search::{Field, Filter, SearchBuilder, SearchCriteria};
use crate::store::Entity;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// Statement text derived once from the entity's column list.
struct Statements {
    select: String,
    select_by_id: String,
    select_by_rowid: String,
    count: String,
    insert: String,
    update: String,
    remove: Option<String>,
}

impl Statements {
    fn new<E: Entity>(key_index: usize) -> Self {
        let columns = E::COLUMNS.join(", ");
        let select = format!("SELECT {columns} FROM {}", E::TABLE);
        let data_columns: Vec<&str> = E::COLUMNS
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != key_index)
            .map(|(_, column)| *column)
            .collect();
        let placeholders = vec!["?"; data_columns.len()].join(", ");
        let assignments: Vec<String> = data_columns.iter().map(|c| format!("{c} = ?")).collect();

        Self {
            select_by_id: format!("{select} WHERE {} = ?", E::KEY_COLUMN),
            select_by_rowid: format!("{select} WHERE rowid = ?"),
            count: format!("SELECT COUNT(*) FROM {}", E::TABLE),
            insert: format!(
                "INSERT INTO {} ({}) VALUES ({placeholders})",
                E::TABLE,
                data_columns.join(", ")
            ),
            update: format!(
                "UPDATE {} SET {} WHERE {} = ?",
                E::TABLE,
                assignments.join(", "),
                E::KEY_COLUMN
            ),
            remove: E::REMOVED_COLUMN.map(|removed| {
                format!(
                    "UPDATE {} SET {removed} = ? WHERE {} = ? AND {removed} IS NULL",
                    E::TABLE,
                    E::KEY_COLUMN
                )
            }),
            select,
        }
    }
}

/// CRUD and template-driven queries for entity `E`.
///
/// Reads exclude soft-removed rows unless the method name says
/// `including_removed`.
pub struct GenericDao<E> {
    db: Arc<Database>,
    statements: Statements,
    key_index: usize,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> GenericDao<E> {
    pub fn new(db: Arc<Database>) -> Self {
        let key_index = E::COLUMNS
            .iter()
            .position(|column| *column == E::KEY_COLUMN)
            .unwrap_or(0);
        Self {
            db,
            statements: Statements::new::<E>(key_index),
            key_index,
            _entity: PhantomData,
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn create_search_builder(&self) -> SearchBuilder<E> {
        SearchBuilder::new()
    }

    // ---- reads ----

    pub fn list_by(
        &self,
        criteria: &SearchCriteria<E>,
        filter: Option<&Filter<E>>,
    ) -> NimbusResult<Vec<E>> {
        self.db.transaction(|tx| self.list_by_in(tx, criteria, filter))
    }

    pub fn list_by_in(
        &self,
        tx: &Transaction<'_>,
        criteria: &SearchCriteria<E>,
        filter: Option<&Filter<E>>,
    ) -> NimbusResult<Vec<E>> {
        self.select_in(tx, Some(criteria), filter, false)
    }

    pub fn list_including_removed_by(
        &self,
        criteria: &SearchCriteria<E>,
        filter: Option<&Filter<E>>,
    ) -> NimbusResult<Vec<E>> {
        self.db
            .transaction(|tx| self.list_including_removed_by_in(tx, criteria, filter))
    }

    pub fn list_including_removed_by_in(
        &self,
        tx: &Transaction<'_>,
        criteria: &SearchCriteria<E>,
        filter: Option<&Filter<E>>,
    ) -> NimbusResult<Vec<E>> {
        self.select_in(tx, Some(criteria), filter, true)
    }

    /// Every active row.
    pub fn list_all(&self, filter: Option<&Filter<E>>) -> NimbusResult<Vec<E>> {
        self.db.transaction(|tx| self.select_in(tx, None, filter, false))
    }

    /// First active row matching `criteria` under `filter`'s ordering.
    pub fn find_one_by(
        &self,
        criteria: &SearchCriteria<E>,
        filter: Option<&Filter<E>>,
    ) -> NimbusResult<Option<E>> {
        self.db.transaction(|tx| self.find_one_by_in(tx, criteria, filter))
    }

    pub fn find_one_by_in(
        &self,
        tx: &Transaction<'_>,
        criteria: &SearchCriteria<E>,
        filter: Option<&Filter<E>>,
    ) -> NimbusResult<Option<E>> {
        let first = first_only(filter);
        Ok(self
            .select_in(tx, Some(criteria), Some(&first), false)?
            .into_iter()
            .next())
    }

    pub fn find_one_including_removed_by(
        &self,
        criteria: &SearchCriteria<E>,
        filter: Option<&Filter<E>>,
    ) -> NimbusResult<Option<E>> {
        self.db
            .transaction(|tx| self.find_one_including_removed_by_in(tx, criteria, filter))
    }

    pub fn find_one_including_removed_by_in(
        &self,
        tx: &Transaction<'_>,
        criteria: &SearchCriteria<E>,
        filter: Option<&Filter<E>>,
    ) -> NimbusResult<Option<E>> {
        let first = first_only(filter);
        Ok(self
            .select_in(tx, Some(criteria), Some(&first), true)?
            .into_iter()
            .next())
    }

    pub fn find_by_id(&self, id: E::Key) -> NimbusResult<Option<E>> {
        self.db.transaction(|tx| self.find_by_id_in(tx, id))
    }

    pub fn find_by_id_in(&self, tx: &Transaction<'_>, id: E::Key) -> NimbusResult<Option<E>> {
        Ok(self
            .find_by_id_including_removed_in(tx, id)?
            .filter(|entity| !self.is_removed(entity)))
    }

    pub fn find_by_id_including_removed(&self, id: E::Key) -> NimbusResult<Option<E>> {
        self.db
            .transaction(|tx| self.find_by_id_including_removed_in(tx, id))
    }

    pub fn find_by_id_including_removed_in(
        &self,
        tx: &Transaction<'_>,
        id: E::Key,
    ) -> NimbusResult<Option<E>> {
        tx.query_optional(&self.statements.select_by_id, &[id.into_scalar()], E::from_row)
    }

    /// Number of active rows matching `criteria`.
    pub fn count_by(&self, criteria: &SearchCriteria<E>) -> NimbusResult<u64> {
        self.check_template(criteria)?;
        let (clause, params) = where_clause(Some(criteria), false, E::REMOVED_COLUMN);
        let sql = format!("{}{clause}", self.statements.count);
        self.db.transaction(|tx| {
            let count: i64 = tx
                .query_optional(&sql, &params, |row| row.get(0))?
                .unwrap_or(0);
            Ok(u64::try_from(count).unwrap_or(0))
        })
    }

    // ---- writes ----

    /// Insert `entity` and return it as stored, with its assigned key.
    pub fn persist(&self, entity: &E) -> NimbusResult<E> {
        self.db.transaction(|tx| self.persist_in(tx, entity))
    }

    pub fn persist_in(&self, tx: &Transaction<'_>, entity: &E) -> NimbusResult<E> {
        let values = self.data_values(entity);
        tx.execute(&self.statements.insert, &values)?;
        let rowid = tx.last_insert_rowid();
        let stored = tx
            .query_optional(
                &self.statements.select_by_rowid,
                &[ScalarValue::Int64(rowid)],
                E::from_row,
            )?
            .ok_or_else(|| {
                NimbusError::operation_failure("persist", format!("{} row {rowid} vanished", E::TABLE))
            })?;
        info!(table = E::TABLE, id = ?stored.key(), "entity persisted");
        Ok(stored)
    }

    /// Write every non-key column of `entity`. Returns whether a row matched.
    pub fn update(&self, entity: &E) -> NimbusResult<bool> {
        self.db.transaction(|tx| self.update_in(tx, entity))
    }

    pub fn update_in(&self, tx: &Transaction<'_>, entity: &E) -> NimbusResult<bool> {
        let mut values = self.data_values(entity);
        values.push(entity.key().into_scalar());
        let changed = tx.execute(&self.statements.update, &values)?;
        debug!(table = E::TABLE, id = ?entity.key(), changed, "entity updated");
        Ok(changed > 0)
    }

    /// Soft-remove: set the removed marker to now.
    ///
    /// Returns `false` when no active row has this key.
    pub fn remove(&self, id: E::Key) -> NimbusResult<bool> {
        self.db.transaction(|tx| self.remove_in(tx, id))
    }

    pub fn remove_in(&self, tx: &Transaction<'_>, id: E::Key) -> NimbusResult<bool> {
        let sql = self
            .statements
            .remove
            .as_deref()
            .ok_or_else(|| NimbusError::InvalidOperation {
                message: format!("{} has no removed marker", E::TABLE),
                context: "remove".to_string(),
            })?;
        let changed = tx.execute(sql, &[ScalarValue::Int64(now_millis()), id.clone().into_scalar()])?;
        info!(table = E::TABLE, id = ?id, removed = changed > 0, "entity removed");
        Ok(changed > 0)
    }

    /// Assign `assignments` on every row matching `criteria`, removed rows
    /// included. Criteria that render no predicate are rejected.
    pub fn update_by(
        &self,
        criteria: &SearchCriteria<E>,
        assignments: &[(Field<E>, ScalarValue)],
    ) -> NimbusResult<usize> {
        self.db
            .transaction(|tx| self.update_by_in(tx, criteria, assignments))
    }

    pub fn update_by_in(
        &self,
        tx: &Transaction<'_>,
        criteria: &SearchCriteria<E>,
        assignments: &[(Field<E>, ScalarValue)],
    ) -> NimbusResult<usize> {
        self.check_template(criteria)?;
        if assignments.is_empty() {
            return Err(NimbusError::InvalidOperation {
                message: "bulk update without assignments".to_string(),
                context: E::TABLE.to_string(),
            });
        }
        let predicate = criteria.predicate().ok_or_else(|| NimbusError::InvalidOperation {
            message: "bulk update without a bound predicate".to_string(),
            context: E::TABLE.to_string(),
        })?;

        let set: Vec<String> = assignments
            .iter()
            .map(|(field, _)| format!("{} = ?", field.column()))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            E::TABLE,
            set.join(", "),
            predicate.sql
        );
        let mut params: Vec<ScalarValue> =
            assignments.iter().map(|(_, value)| value.clone()).collect();
        params.extend(predicate.params);

        let changed = tx.execute(&sql, &params)?;
        debug!(table = E::TABLE, changed, "bulk update");
        Ok(changed)
    }

    // ---- helpers ----

    fn select_in(
        &self,
        tx: &Transaction<'_>,
        criteria: Option<&SearchCriteria<E>>,
        filter: Option<&Filter<E>>,
        include_removed: bool,
    ) -> NimbusResult<Vec<E>> {
        if let Some(criteria) = criteria {
            self.check_template(criteria)?;
        }
        let (clause, mut params) = where_clause(criteria, include_removed, E::REMOVED_COLUMN);
        let mut sql = format!("{}{clause}", self.statements.select);
        if let Some(filter) = filter {
            let (tail, tail_params) = filter.render();
            sql.push_str(&tail);
            params.extend(tail_params);
        }
        let rows = tx.query(&sql, &params, E::from_row)?;
        debug!(table = E::TABLE, rows = rows.len(), include_removed, "select");
        Ok(rows)
    }

    fn check_template(&self, criteria: &SearchCriteria<E>) -> NimbusResult<()> {
        if criteria.table() != E::TABLE {
            return Err(NimbusError::TemplateMismatch {
                expected: E::TABLE.to_string(),
                actual: criteria.table().to_string(),
            });
        }
        Ok(())
    }

    fn data_values(&self, entity: &E) -> Vec<ScalarValue> {
        entity
            .values()
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| *idx != self.key_index)
            .map(|(_, value)| value)
            .collect()
    }

    fn is_removed(&self, entity: &E) -> bool {
        let Some(removed) = E::REMOVED_COLUMN else {
            return false;
        };
        E::COLUMNS
            .iter()
            .position(|column| *column == removed)
            .and_then(|idx| entity.values().into_iter().nth(idx))
            .is_some_and(|value| !value.is_null())
    }
}

fn first_only<E>(filter: Option<&Filter<E>>) -> Filter<E> {
    filter.cloned().unwrap_or_default().with_limit(1)
}

fn where_clause<E: Entity>(
    criteria: Option<&SearchCriteria<E>>,
    include_removed: bool,
    removed_column: Option<&str>,
) -> (String, Vec<ScalarValue>) {
    let predicate = criteria.and_then(SearchCriteria::predicate);
    let active = if include_removed {
        None
    } else {
        removed_column.map(|column| format!("{column} IS NULL"))
    };
    match (predicate, active) {
        (Some(p), Some(active)) => (format!(" WHERE ({}) AND {active}", p.sql), p.params),
        (Some(p), None) => (format!(" WHERE {}", p.sql), p.params),
        (None, Some(active)) => (format!(" WHERE {active}"), Vec::new()),
        (None, None) => (String::new(), Vec::new()),
    }
}
