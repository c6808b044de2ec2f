//! # Nimbus Core: control-plane persistence and command dispatch
//!
//! Nimbus 클라우드 관리 서버의 핵심 계층입니다. 엔티티 저장소, 선언형
//! 검색 템플릿, 스냅샷 계보(lineage) 관리, 그리고 API 명령 바인딩/디스패치를
//! 제공합니다.
//!
//! ## 빠른 시작
//!
//! ```rust
//! use std::sync::Arc;
//! use nimbus_core::dao::SnapshotDao;
//! use nimbus_core::db::Database;
//! use nimbus_core::model::{Snapshot, SnapshotType};
//!
//! # fn main() -> nimbus_core::NimbusResult<()> {
//! let db = Arc::new(Database::open_in_memory()?);
//! let snapshots = SnapshotDao::new(Arc::clone(&db))?;
//!
//! let root = snapshots.extend_chain(&Snapshot::new(7, "daily-1", SnapshotType::Daily))?;
//! let next = snapshots.extend_chain(
//!     &Snapshot::new(7, "daily-2", SnapshotType::Daily).with_parent(root.id),
//! )?;
//!
//! let chain = snapshots.chain(7)?;
//! assert_eq!(chain.len(), 2);
//! assert_eq!(snapshots.find_next_snapshot(root.id)?.map(|s| s.id), Some(next.id));
//! # Ok(())
//! # }
//! ```
//!
//! ## 요청 처리 흐름
//!
//! ```text
//! RawParams → bind(schema) → Command → Dispatcher → BackendOperation
//!           → DAO (SearchCriteria → SQL) → Response → to_wire()
//! ```
//!
//! ## 모듈 구조
//!
//! - [`search`]: 검색 템플릿 빌더, 바인딩, 필터
//! - [`store`]: `Entity` 트레이트와 `GenericDao`
//! - [`db`]: SQLite 커넥션, 트랜잭션, 파라미터 값
//! - [`model`] / [`dao`]: Host, Cluster, Snapshot 엔티티와 DAO
//! - [`api`]: 파라미터 스키마, 바인더, 명령, 디스패처, 응답
//! - [`manager`]: 명령을 처리하는 백엔드 연산

// derive-generated code refers to `::nimbus_core::...`
extern crate self as nimbus_core;

pub mod api;
pub mod config;
pub mod dao;
pub mod db;
pub mod error;
pub mod manager;
pub mod model;
pub mod search;
pub mod store;

// Logging utilities
pub mod logging;

// Re-export commonly used types
pub use config::DatabaseConfig;
pub use db::Database;
pub use error::{ErrorCategory, NimbusError, NimbusResult};

// Re-export derive macros
pub use nimbus_derive::Entity;
