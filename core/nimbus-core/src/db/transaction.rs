//! Scoped transaction handle
//!
//! `Transaction`은 커넥션 락을 보유한 채로 `BEGIN IMMEDIATE`를 실행합니다.
//! 명시적으로 `commit()` 하지 않으면 drop 시점에 롤백되므로,
//! 에러/조기 반환 등 모든 종료 경로에서 부분 반영이 관찰되지 않습니다.

use crate::db::value::ScalarValue;
use crate::error::NimbusResult;
use parking_lot::MutexGuard;
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter};
use tracing::{debug, trace, warn};

/// Active transaction over the shared connection.
///
/// Holds the connection lock for its whole lifetime; statements from other
/// threads wait until this handle commits or is dropped.
pub struct Transaction<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(conn: MutexGuard<'a, Connection>) -> NimbusResult<Self> {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        trace!("transaction started");
        Ok(Self {
            conn,
            finished: false,
        })
    }

    /// SELECT: 모든 행을 `map`으로 변환
    pub fn query<T, F>(&self, sql: &str, params: &[ScalarValue], map: F) -> NimbusResult<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        trace!(sql, params = ?params, "query");
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), map)?;
        Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
    }

    /// SELECT: 첫 번째 행만 반환 (없으면 None)
    pub fn query_optional<T, F>(
        &self,
        sql: &str,
        params: &[ScalarValue],
        map: F,
    ) -> NimbusResult<Option<T>>
    where
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        trace!(sql, params = ?params, "query_optional");
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.query_row(params_from_iter(params.iter()), map).optional()?)
    }

    /// INSERT/UPDATE: 영향받은 행 수
    pub fn execute(&self, sql: &str, params: &[ScalarValue]) -> NimbusResult<usize> {
        trace!(sql, params = ?params, "execute");
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.execute(params_from_iter(params.iter()))?)
    }

    pub fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// 커밋: 모든 문장을 원자적으로 반영
    pub fn commit(mut self) -> NimbusResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        trace!("transaction committed");
        Ok(())
    }

    /// 롤백: 모든 문장을 폐기
    pub fn rollback(mut self) -> NimbusResult<()> {
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")?;
        debug!("transaction rolled back");
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.conn.execute_batch("ROLLBACK") {
            Ok(()) => debug!("transaction rolled back on drop"),
            Err(err) => warn!(error = %err, "rollback on drop failed"),
        }
    }
}
