//! Search template construction
//!
//! 템플릿은 DAO 초기화 시 한 번 빌드되고 이후 불변입니다.
//! `done()` 이후 빌더에 대한 모든 호출은 `TemplateClosed`로 실패합니다.

use crate::error::{NimbusError, NimbusResult};
use crate::search::criteria::SearchCriteria;
use crate::search::field::Field;
use crate::search::op::{Connective, Op};
use crate::store::Entity;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// One declared node of a template, in declaration order.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Condition {
        name: String,
        column: &'static str,
        op: Op,
        connective: Connective,
    },
    Group {
        connective: Connective,
        children: Vec<Node>,
    },
}

/// Frozen template shared by every criteria created from it.
#[derive(Debug)]
pub(crate) struct TemplateInner {
    pub(crate) table: &'static str,
    pub(crate) nodes: Vec<Node>,
    pub(crate) operators: HashMap<String, Op>,
}

/// Declares named predicate nodes for entity `E`.
///
/// ```rust
/// use nimbus_core::model::Snapshot;
/// use nimbus_core::search::{Op, SearchBuilder};
///
/// # fn main() -> nimbus_core::NimbusResult<()> {
/// let mut builder = SearchBuilder::<Snapshot>::new();
/// builder
///     .and("volumeId", Snapshot::VOLUME_ID, Op::Eq)?
///     .and("version", Snapshot::VERSION, Op::Eq)?;
/// let template = builder.done()?;
///
/// let mut criteria = template.create();
/// criteria.set_parameters("volumeId", 7i64)?;
/// let predicate = criteria.predicate().unwrap();
/// assert_eq!(predicate.sql, "volume_id = ?");
/// # Ok(())
/// # }
/// ```
pub struct SearchBuilder<E> {
    nodes: Vec<Node>,
    open_groups: Vec<(Connective, Vec<Node>)>,
    operators: HashMap<String, Op>,
    closed: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SearchBuilder<E> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            open_groups: Vec::new(),
            operators: HashMap::new(),
            closed: false,
            _entity: PhantomData,
        }
    }

    /// Declare a node joined to the preceding ones with AND.
    pub fn and(&mut self, name: &str, field: Field<E>, op: Op) -> NimbusResult<&mut Self> {
        self.condition(Connective::And, name, field, op)
    }

    /// Declare a node joined to the preceding ones with OR.
    pub fn or(&mut self, name: &str, field: Field<E>, op: Op) -> NimbusResult<&mut Self> {
        self.condition(Connective::Or, name, field, op)
    }

    /// Open a parenthesized group joined with AND.
    pub fn and_group(&mut self) -> NimbusResult<&mut Self> {
        self.open(Connective::And)
    }

    /// Open a parenthesized group joined with OR.
    pub fn or_group(&mut self) -> NimbusResult<&mut Self> {
        self.open(Connective::Or)
    }

    pub fn end_group(&mut self) -> NimbusResult<&mut Self> {
        self.ensure_open()?;
        let (connective, children) = self
            .open_groups
            .pop()
            .ok_or_else(|| NimbusError::UnbalancedGroup(E::TABLE.to_string()))?;
        self.current().push(Node::Group {
            connective,
            children,
        });
        Ok(self)
    }

    /// Freeze the declared nodes into a template and close the builder.
    pub fn done(&mut self) -> NimbusResult<SearchTemplate<E>> {
        self.ensure_open()?;
        if !self.open_groups.is_empty() {
            return Err(NimbusError::UnbalancedGroup(E::TABLE.to_string()));
        }
        self.closed = true;

        let inner = TemplateInner {
            table: E::TABLE,
            nodes: std::mem::take(&mut self.nodes),
            operators: std::mem::take(&mut self.operators),
        };
        debug!(table = E::TABLE, parameters = inner.operators.len(), "search template built");
        Ok(SearchTemplate {
            inner: Arc::new(inner),
            _entity: PhantomData,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn condition(
        &mut self,
        connective: Connective,
        name: &str,
        field: Field<E>,
        op: Op,
    ) -> NimbusResult<&mut Self> {
        self.ensure_open()?;
        if self.operators.contains_key(name) {
            return Err(NimbusError::DuplicateName(name.to_string()));
        }
        self.operators.insert(name.to_string(), op);
        self.current().push(Node::Condition {
            name: name.to_string(),
            column: field.column(),
            op,
            connective,
        });
        Ok(self)
    }

    fn open(&mut self, connective: Connective) -> NimbusResult<&mut Self> {
        self.ensure_open()?;
        self.open_groups.push((connective, Vec::new()));
        Ok(self)
    }

    fn current(&mut self) -> &mut Vec<Node> {
        match self.open_groups.last_mut() {
            Some((_, children)) => children,
            None => &mut self.nodes,
        }
    }

    fn ensure_open(&self) -> NimbusResult<()> {
        if self.closed {
            return Err(NimbusError::TemplateClosed(E::TABLE.to_string()));
        }
        Ok(())
    }
}

impl<E: Entity> Default for SearchBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable, shareable predicate shape.
///
/// Cloning is cheap; every clone refers to the same frozen nodes.
pub struct SearchTemplate<E> {
    inner: Arc<TemplateInner>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SearchTemplate<E> {
    /// Fresh, unbound criteria. Each call returns an independent instance.
    pub fn create(&self) -> SearchCriteria<E> {
        SearchCriteria::new(Arc::clone(&self.inner))
    }

    pub fn table(&self) -> &'static str {
        self.inner.table
    }

    /// Declared parameter names, sorted.
    pub fn parameter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.inner.operators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<E> Clone for SearchTemplate<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _entity: PhantomData,
        }
    }
}

impl<E> fmt::Debug for SearchTemplate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchTemplate")
            .field("table", &self.inner.table)
            .field("nodes", &self.inner.nodes)
            .finish()
    }
}
