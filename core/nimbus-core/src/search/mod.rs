//! Declarative search templates
//!
//! - [`SearchBuilder`] declares named predicate nodes once per DAO
//! - [`SearchTemplate`] is the frozen, shareable result of `done()`
//! - [`SearchCriteria`] binds values per request and renders the predicate
//! - [`Filter`] carries ordering and paging

pub mod builder;
pub mod criteria;
pub mod field;
pub mod filter;
pub mod op;

pub use builder::{SearchBuilder, SearchTemplate};
pub use criteria::{Predicate, SearchCriteria};
pub use field::Field;
pub use filter::{Direction, Filter};
pub use op::{Arity, Connective, Op, contains_pattern};
