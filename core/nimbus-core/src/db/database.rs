//! Database handle: the single connection every DAO shares

use crate::config::DatabaseConfig;
use crate::db::schema;
use crate::db::transaction::Transaction;
use crate::error::NimbusResult;
use parking_lot::Mutex;
use rusqlite::Connection;
use std::time::Duration;
use tracing::{info, instrument};

/// Nimbus 관리 데이터베이스
///
/// 하나의 SQLite 커넥션을 `Mutex`로 감싸 여러 요청 스레드가 공유합니다.
/// 모든 문장은 [`Transaction`] 안에서 실행됩니다.
///
/// # 예제
///
/// ```rust
/// use nimbus_core::db::Database;
///
/// # fn main() -> nimbus_core::NimbusResult<()> {
/// let db = Database::open_in_memory()?;
/// let clusters: i64 = db.transaction(|tx| {
///     let rows = tx.query("SELECT COUNT(*) FROM clusters", &[], |row| row.get(0))?;
///     Ok(rows[0])
/// })?;
/// assert_eq!(clusters, 0);
/// # Ok(())
/// # }
/// ```
pub struct Database {
    conn: Mutex<Connection>,
    config: DatabaseConfig,
}

impl Database {
    /// 설정에 따라 데이터베이스를 열고 스키마를 설치합니다.
    #[instrument(skip(config), fields(path = ?config.path))]
    pub fn open(config: DatabaseConfig) -> NimbusResult<Self> {
        config.validate()?;
        let conn = match &config.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        if config.path.is_some() {
            let mode: String = conn.pragma_update_and_check(
                None,
                "journal_mode",
                config.journal_mode.pragma_value(),
                |row| row.get(0),
            )?;
            info!(journal_mode = %mode, "journal mode applied");
        }
        schema::install(&conn)?;
        info!("database opened");

        Ok(Self {
            conn: Mutex::new(conn),
            config,
        })
    }

    pub fn open_in_memory() -> NimbusResult<Self> {
        Self::open(DatabaseConfig::in_memory())
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// 트랜잭션 시작
    ///
    /// 반환된 핸들은 `commit()` 전까지 커넥션 락을 보유하며,
    /// 커밋 없이 drop되면 롤백됩니다.
    pub fn begin(&self) -> NimbusResult<Transaction<'_>> {
        Transaction::begin(self.conn.lock())
    }

    /// `f`를 하나의 트랜잭션 안에서 실행
    ///
    /// `Ok`이면 커밋, `Err`이면 롤백 후 에러를 그대로 반환합니다.
    /// `f` 안에서 다시 `begin()`/`transaction()`을 호출하면 교착되므로,
    /// 합성 연산은 전달받은 핸들을 사용해야 합니다.
    pub fn transaction<T, F>(&self, f: F) -> NimbusResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> NimbusResult<T>,
    {
        let tx = self.begin()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}
