//! Field selectors

use crate::error::{NimbusError, NimbusResult};
use crate::store::Entity;
use std::fmt;
use std::marker::PhantomData;

/// A column of entity `E`.
///
/// `#[derive(Entity)]` generates one constant per struct field
/// (`Snapshot::VOLUME_ID`); [`Field::named`] resolves one at runtime.
pub struct Field<E> {
    column: &'static str,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Field<E> {
    pub const fn new(column: &'static str) -> Self {
        Self {
            column,
            _entity: PhantomData,
        }
    }

    pub fn column(&self) -> &'static str {
        self.column
    }
}

impl<E: Entity> Field<E> {
    /// Resolve a column by name. Accepts the column name (`volume_id`) or
    /// its camelCase wire spelling (`volumeId`).
    pub fn named(name: &str) -> NimbusResult<Self> {
        let snake = to_snake_case(name);
        E::COLUMNS
            .iter()
            .find(|column| **column == name || **column == snake)
            .map(|column| Field::new(column))
            .ok_or_else(|| NimbusError::UnknownField {
                table: E::TABLE.to_string(),
                field: name.to_string(),
            })
    }
}

fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

impl<E> Clone for Field<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Field<E> {}

impl<E> PartialEq for Field<E> {
    fn eq(&self, other: &Self) -> bool {
        self.column == other.column
    }
}

impl<E> Eq for Field<E> {}

impl<E> fmt::Debug for Field<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.column).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Snapshot;

    #[test]
    fn test_named_exact_and_camel_case() {
        assert_eq!(Field::<Snapshot>::named("volume_id").unwrap(), Snapshot::VOLUME_ID);
        assert_eq!(Field::<Snapshot>::named("volumeId").unwrap(), Snapshot::VOLUME_ID);
        assert_eq!(
            Field::<Snapshot>::named("prevSnapshotId").unwrap().column(),
            "prev_snapshot_id"
        );
    }

    #[test]
    fn test_named_unknown() {
        let err = Field::<Snapshot>::named("diskOffering").unwrap_err();
        assert!(matches!(err, NimbusError::UnknownField { .. }));
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("backupSnapshotId"), "backup_snapshot_id");
        assert_eq!(to_snake_case("id"), "id");
    }
}
