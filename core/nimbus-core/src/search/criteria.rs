//! Bound search criteria
//!
//! A criteria is a per-request binding of values to a template's named
//! nodes. Nodes without a binding are left out of the rendered predicate.

use crate::db::{IntoParam, ScalarValue};
use crate::error::{NimbusError, NimbusResult};
use crate::search::builder::{Node, TemplateInner};
use crate::search::op::{Arity, Connective};
use crate::store::Entity;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum Binding {
    Single(ScalarValue),
    List(Vec<ScalarValue>),
}

/// Rendered WHERE-clause body with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub sql: String,
    pub params: Vec<ScalarValue>,
}

/// Mutable, single-owner binding of a [`SearchTemplate`](crate::search::SearchTemplate).
pub struct SearchCriteria<E> {
    template: Arc<TemplateInner>,
    bindings: HashMap<String, Binding>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SearchCriteria<E> {
    pub(crate) fn new(template: Arc<TemplateInner>) -> Self {
        Self {
            template,
            bindings: HashMap::new(),
            _entity: PhantomData,
        }
    }

    /// Bind a single value to `name`.
    ///
    /// On an `In`/`NotIn` node the value becomes a one-element list.
    /// Binding the same name again replaces the earlier value.
    pub fn set_parameters<V: IntoParam>(&mut self, name: &str, value: V) -> NimbusResult<&mut Self> {
        let binding = match self.arity_of(name)? {
            Arity::None => return Err(no_value_expected(name)),
            Arity::Single => Binding::Single(value.into_scalar()),
            Arity::List => Binding::List(vec![value.into_scalar()]),
        };
        self.bindings.insert(name.to_string(), binding);
        Ok(self)
    }

    /// Bind a list of values to an `In`/`NotIn` node.
    pub fn set_parameter_list<I, V>(&mut self, name: &str, values: I) -> NimbusResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: IntoParam,
    {
        match self.arity_of(name)? {
            Arity::List => {}
            Arity::None => return Err(no_value_expected(name)),
            Arity::Single => {
                return Err(NimbusError::InvalidBinding {
                    name: name.to_string(),
                    reason: "operator takes a single value, not a list".to_string(),
                });
            }
        }
        let values = values.into_iter().map(IntoParam::into_scalar).collect();
        self.bindings.insert(name.to_string(), Binding::List(values));
        Ok(self)
    }

    /// Remove a binding so the node is omitted again.
    pub fn clear_parameter(&mut self, name: &str) -> NimbusResult<&mut Self> {
        self.arity_of(name)?;
        self.bindings.remove(name);
        Ok(self)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn table(&self) -> &'static str {
        self.template.table
    }

    /// Render the predicate, or `None` when no node survives.
    pub fn predicate(&self) -> Option<Predicate> {
        let mut params = Vec::new();
        render(&self.template.nodes, &self.bindings, &mut params).map(|rendered| Predicate {
            sql: rendered.sql,
            params,
        })
    }

    fn arity_of(&self, name: &str) -> NimbusResult<Arity> {
        self.template
            .operators
            .get(name)
            .map(|op| op.arity())
            .ok_or_else(|| NimbusError::UnknownParameter(name.to_string()))
    }
}

fn no_value_expected(name: &str) -> NimbusError {
    NimbusError::InvalidBinding {
        name: name.to_string(),
        reason: "null-check operators take no value".to_string(),
    }
}

struct Rendered {
    sql: String,
    /// connective of the last join when more than one term was combined
    joined_by: Option<Connective>,
}

/// Left-to-right combination of the surviving nodes.
///
/// A run of one connective stays flat; switching connective wraps what
/// came before, so `A AND B OR C` renders as `(A AND B) OR C`.
fn render(
    nodes: &[Node],
    bindings: &HashMap<String, Binding>,
    params: &mut Vec<ScalarValue>,
) -> Option<Rendered> {
    let mut acc: Option<Rendered> = None;

    for node in nodes {
        let (connective, piece) = match node {
            Node::Condition {
                name,
                column,
                op,
                connective,
            } => {
                let sql = match (op.arity(), bindings.get(name)) {
                    (Arity::None, _) => op.render(column, 0),
                    (_, None) => continue,
                    (_, Some(Binding::Single(value))) => {
                        params.push(value.clone());
                        op.render(column, 1)
                    }
                    (_, Some(Binding::List(values))) => {
                        params.extend(values.iter().cloned());
                        op.render(column, values.len())
                    }
                };
                (*connective, sql)
            }
            Node::Group {
                connective,
                children,
            } => match render(children, bindings, params) {
                Some(inner) if inner.joined_by.is_some() => (*connective, format!("({})", inner.sql)),
                Some(inner) => (*connective, inner.sql),
                None => continue,
            },
        };

        acc = Some(match acc {
            // the first surviving node drops its connective
            None => Rendered {
                sql: piece,
                joined_by: None,
            },
            Some(prev) => {
                let left = match prev.joined_by {
                    Some(previous) if previous != connective => format!("({})", prev.sql),
                    _ => prev.sql,
                };
                Rendered {
                    sql: format!("{left} {} {piece}", connective.keyword()),
                    joined_by: Some(connective),
                }
            }
        });
    }

    acc
}

impl<E> fmt::Debug for SearchCriteria<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchCriteria")
            .field("table", &self.template.table)
            .field("bindings", &self.bindings)
            .finish()
    }
}
