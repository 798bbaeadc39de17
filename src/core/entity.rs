//! Game entity system with simple integer IDs

use crate::{LoreError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Simple integer ID for game entities
///
/// The type parameter only tags what kind of entity the id points at, so a
/// `CardId` can never be passed where a `PlayerId` is expected. IDs are
/// allocated from one counter per game and are stable for the whole match.
pub struct EntityId<T> {
    id: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> EntityId<T> {
    pub const fn new(id: u32) -> Self {
        EntityId {
            id,
            _marker: PhantomData,
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.id
    }
}

// Manual impls: derives would put bounds on T.
impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> PartialOrd for EntityId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for EntityId<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for EntityId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Serialize for EntityId<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.id)
    }
}

impl<'de, T> Deserialize<'de> for EntityId<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        u32::deserialize(deserializer).map(EntityId::new)
    }
}

/// Base trait for all game entities
pub trait GameEntity<T> {
    fn id(&self) -> EntityId<T>;
    fn name(&self) -> &str;
}

/// Central storage for all game entities
///
/// Provides fast lookup by EntityId. Uses FxHashMap for fast hashing of integer keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct EntityStore<T> {
    entities: FxHashMap<EntityId<T>, T>,
}

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        EntityStore {
            entities: FxHashMap::default(),
        }
    }

    /// Insert an entity with a specific ID
    pub fn insert(&mut self, id: EntityId<T>, entity: T) {
        self.entities.insert(id, entity);
    }

    /// Get an entity by ID
    pub fn get(&self, id: EntityId<T>) -> Result<&T> {
        self.entities
            .get(&id)
            .ok_or(LoreError::EntityNotFound(id.as_u32()))
    }

    /// Get a mutable reference to an entity
    pub fn get_mut(&mut self, id: EntityId<T>) -> Result<&mut T> {
        self.entities
            .get_mut(&id)
            .ok_or(LoreError::EntityNotFound(id.as_u32()))
    }

    /// Check if an entity exists
    pub fn contains(&self, id: EntityId<T>) -> bool {
        self.entities.contains_key(&id)
    }

    /// Iterate over all entities (unordered)
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId<T>, &T)> {
        self.entities.iter()
    }

    /// Sorted ids, for deterministic iteration
    pub fn ids(&self) -> Vec<EntityId<T>> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestEntity {
        name: String,
    }

    #[test]
    fn test_entity_store() {
        let mut store: EntityStore<TestEntity> = EntityStore::new();
        let id1 = EntityId::new(0);
        let id2 = EntityId::new(1);

        store.insert(id1, TestEntity { name: "Test1".to_string() });
        store.insert(id2, TestEntity { name: "Test2".to_string() });

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(id1).unwrap().name, "Test1");
        assert_eq!(store.get(id2).unwrap().name, "Test2");
        assert!(store.get(EntityId::new(999)).is_err());
        assert_eq!(store.ids(), vec![id1, id2]);
    }

    #[test]
    fn test_store_json_roundtrip() {
        let mut store: EntityStore<TestEntity> = EntityStore::new();
        store.insert(EntityId::new(7), TestEntity { name: "Seven".to_string() });

        let json = serde_json::to_string(&store).unwrap();
        let back: EntityStore<TestEntity> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(EntityId::new(7)).unwrap().name, "Seven");
    }
}
