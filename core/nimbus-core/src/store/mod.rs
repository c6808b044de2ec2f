//! Entity mapping and generic DAO

pub mod dao;
pub mod entity;

pub use dao::GenericDao;
pub use entity::Entity;
