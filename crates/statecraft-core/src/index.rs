//! Component index over an entity collection
//!
//! The collection is a record mapping entity ids to entity records. A
//! "component" is any key present on an entity record. The index answers
//! "which entities have component X" without scanning the collection, and
//! is kept current from transaction diffs:
//!
//! - an entry at or above the collection path rebuilds the whole index
//! - an entry at `collection.<id>` or `collection.<id>.<key>` recomputes
//!   only entity `<id>`
//! - deeper entries cannot change which keys exist and are skipped

use crate::diff::Diff;
use crate::identity::{entity_id, EntityId};
use crate::{path, Value};
use std::collections::{BTreeSet, HashMap};

/// What [`ComponentIndex::apply_diff`] had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexUpdate {
    /// No entry touched the collection
    Unchanged,
    /// Only the listed number of entities were recomputed
    Incremental { entities: usize },
    /// The collection itself was replaced, so everything was rescanned
    Rebuilt,
}

#[derive(Debug, Clone)]
pub struct ComponentIndex {
    collection: String,
    depth: usize,
    by_component: HashMap<String, BTreeSet<EntityId>>,
    by_entity: HashMap<EntityId, BTreeSet<String>>,
}

impl ComponentIndex {
    /// Index the collection at `collection` in `state`
    pub fn build(collection: impl Into<String>, state: &Value) -> Self {
        let collection = collection.into();
        let depth = path::segments(&collection).len();
        let mut index = Self {
            collection,
            depth,
            by_component: HashMap::new(),
            by_entity: HashMap::new(),
        };
        index.rebuild(state);
        index
    }

    /// Path of the indexed collection
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Rescan the whole collection
    pub fn rebuild(&mut self, state: &Value) {
        self.by_component.clear();
        self.by_entity.clear();
        if let Some(Value::Map(entities)) = path::resolve(state, &self.collection) {
            for (raw, record) in entities {
                self.insert_entity(entity_id(raw.as_str()), record);
            }
        }
    }

    /// Entities currently holding `component`
    pub fn entities_with(&self, component: &str) -> Option<&BTreeSet<EntityId>> {
        self.by_component.get(component)
    }

    /// Components currently held by `entity`
    pub fn components_of(&self, entity: &EntityId) -> Option<&BTreeSet<String>> {
        self.by_entity.get(entity)
    }

    /// Number of indexed entities
    pub fn entity_count(&self) -> usize {
        self.by_entity.len()
    }

    /// Bring the index in line with `state` after `diff` was applied
    pub fn apply_diff(&mut self, diff: &Diff, state: &Value) -> IndexUpdate {
        let collection_path = self.collection.clone();
        let collection = path::segments(&collection_path);
        let mut touched: BTreeSet<String> = BTreeSet::new();

        for entry in diff {
            let segs = entry.segments();
            if segs.len() <= self.depth {
                if collection.starts_with(&segs) {
                    self.rebuild(state);
                    return IndexUpdate::Rebuilt;
                }
                continue;
            }
            if segs[..self.depth] == collection[..] && segs.len() <= self.depth + 2 {
                touched.insert(segs[self.depth].to_string());
            }
        }

        if touched.is_empty() {
            return IndexUpdate::Unchanged;
        }

        let entities = touched.len();
        for raw in touched {
            let at = path::join(&self.collection, &raw);
            let id = entity_id(raw);
            self.remove_entity(&id);
            if let Some(record) = path::resolve(state, &at) {
                self.insert_entity(id, record);
            }
        }
        IndexUpdate::Incremental { entities }
    }

    fn insert_entity(&mut self, id: EntityId, record: &Value) {
        let components: BTreeSet<String> = record
            .as_map()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        for component in &components {
            self.by_component
                .entry(component.clone())
                .or_default()
                .insert(id.clone());
        }
        self.by_entity.insert(id, components);
    }

    fn remove_entity(&mut self, id: &EntityId) {
        let Some(components) = self.by_entity.remove(id) else {
            return;
        };
        for component in components {
            if let Some(set) = self.by_component.get_mut(&component) {
                set.remove(id);
                if set.is_empty() {
                    self.by_component.remove(&component);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::compute_diff;
    use crate::path::MissingPathPolicy;

    fn world() -> Value {
        Value::map([(
            "entities",
            Value::map([
                (
                    "e1",
                    Value::map([("hp", Value::from(8)), ("stunned", Value::from(true))]),
                ),
                (
                    "e2",
                    Value::map([("hp", Value::from(30)), ("stunned", Value::from(true))]),
                ),
                ("e3", Value::map([("hp", Value::from(1))])),
            ]),
        )])
    }

    fn ids(set: Option<&BTreeSet<EntityId>>) -> Vec<&str> {
        set.map(|s| s.iter().map(EntityId::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_build() {
        let index = ComponentIndex::build("entities", &world());
        assert_eq!(index.entity_count(), 3);
        assert_eq!(ids(index.entities_with("hp")), vec!["e1", "e2", "e3"]);
        assert_eq!(ids(index.entities_with("stunned")), vec!["e1", "e2"]);
        assert!(index.entities_with("flying").is_none());
    }

    #[test]
    fn test_key_removal_is_incremental() {
        let before = world();
        let mut index = ComponentIndex::build("entities", &before);

        let mut after = before.clone();
        path::remove_at(&mut after, "entities.e1.stunned").unwrap();
        let diff = compute_diff(&before, &after);

        assert_eq!(
            index.apply_diff(&diff, &after),
            IndexUpdate::Incremental { entities: 1 }
        );
        assert_eq!(ids(index.entities_with("stunned")), vec!["e2"]);
        assert_eq!(ids(index.entities_with("hp")), vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn test_entity_added_and_removed() {
        let before = world();
        let mut index = ComponentIndex::build("entities", &before);

        let mut after = before.clone();
        path::remove_at(&mut after, "entities.e3").unwrap();
        path::set_at(
            &mut after,
            "entities.e4",
            Value::map([("flying", true)]),
            MissingPathPolicy::Fail,
        )
        .unwrap();
        let diff = compute_diff(&before, &after);

        assert_eq!(
            index.apply_diff(&diff, &after),
            IndexUpdate::Incremental { entities: 2 }
        );
        assert_eq!(ids(index.entities_with("hp")), vec!["e1", "e2"]);
        assert_eq!(ids(index.entities_with("flying")), vec!["e4"]);
        assert!(index.components_of(&entity_id("e3")).is_none());
    }

    #[test]
    fn test_deep_and_unrelated_changes() {
        let before = Value::map([
            ("turn", Value::from(1)),
            (
                "entities",
                Value::map([("e1", Value::map([("pos", Value::map([("x", 0)]))]))]),
            ),
        ]);
        let mut index = ComponentIndex::build("entities", &before);

        let mut after = before.clone();
        path::set_at(&mut after, "turn", Value::from(2), MissingPathPolicy::Fail).unwrap();
        path::set_at(&mut after, "entities.e1.pos.x", Value::from(4), MissingPathPolicy::Fail)
            .unwrap();
        let diff = compute_diff(&before, &after);

        assert_eq!(index.apply_diff(&diff, &after), IndexUpdate::Unchanged);
    }

    #[test]
    fn test_collection_replaced_rebuilds() {
        let before = world();
        let mut index = ComponentIndex::build("entities", &before);
        let after = Value::map([("entities", Value::list([1, 2]))]);
        let diff = compute_diff(&before, &after);

        assert_eq!(index.apply_diff(&diff, &after), IndexUpdate::Rebuilt);
        assert_eq!(index.entity_count(), 0);
    }
}
