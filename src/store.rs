use async_trait::async_trait;
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(Ulid),
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "talk not found: {id}"),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Record store for the talk collection.
///
/// The overlap guard only consumes [`TalkStore::find_by_room`]; the write
/// methods exist for the request pipeline.
#[async_trait]
pub trait TalkStore: Send + Sync {
    /// All talks whose room equals `room`. Unbounded, no time filtering.
    async fn find_by_room(&self, room: &str) -> Result<Vec<Talk>, StoreError>;

    async fn get(&self, id: Ulid) -> Result<Option<Talk>, StoreError>;

    /// Persist a new talk under a freshly assigned id.
    async fn insert(&self, fields: TalkInput) -> Result<Talk, StoreError>;

    async fn replace(&self, id: Ulid, fields: TalkInput) -> Result<Talk, StoreError>;

    async fn remove(&self, id: Ulid) -> Result<Talk, StoreError>;
}

pub struct InMemoryStore {
    talks: DashMap<Ulid, Talk>,
    /// Room → talk ids in that room, in the order they entered it.
    rooms: DashMap<String, Vec<Ulid>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            talks: DashMap::new(),
            rooms: DashMap::new(),
        }
    }

    pub fn talk_count(&self) -> usize {
        self.talks.len()
    }

    // ── Room index ───────────────────────────────────────────

    fn index_room(&self, room: &str, id: Ulid) {
        self.rooms.entry(room.to_string()).or_default().push(id);
    }

    fn unindex_room(&self, room: &str, id: &Ulid) {
        let now_empty = match self.rooms.get_mut(room) {
            Some(mut ids) => {
                ids.retain(|t| t != id);
                ids.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.rooms.remove_if(room, |_, ids| ids.is_empty());
        }
    }

    fn room_ids(&self, room: &str) -> Vec<Ulid> {
        self.rooms
            .get(room)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TalkStore for InMemoryStore {
    /// Results come back in the order talks entered the room. The index can
    /// briefly lag a concurrent `replace`, so each talk's own room is
    /// rechecked.
    async fn find_by_room(&self, room: &str) -> Result<Vec<Talk>, StoreError> {
        let ids = self.room_ids(room);
        Ok(ids
            .iter()
            .filter_map(|id| self.talks.get(id).map(|e| e.value().clone()))
            .filter(|t| t.fields.room == room)
            .collect())
    }

    async fn get(&self, id: Ulid) -> Result<Option<Talk>, StoreError> {
        Ok(self.talks.get(&id).map(|e| e.value().clone()))
    }

    async fn insert(&self, fields: TalkInput) -> Result<Talk, StoreError> {
        let talk = Talk::new(Ulid::new(), fields);
        self.talks.insert(talk.id, talk.clone());
        self.index_room(&talk.fields.room, talk.id);
        Ok(talk)
    }

    async fn replace(&self, id: Ulid, fields: TalkInput) -> Result<Talk, StoreError> {
        let talk = Talk::new(id, fields);
        let previous = match self.talks.get_mut(&id) {
            Some(mut entry) => std::mem::replace(entry.value_mut(), talk.clone()),
            None => return Err(StoreError::NotFound(id)),
        };
        if previous.fields.room != talk.fields.room {
            self.unindex_room(&previous.fields.room, &id);
            self.index_room(&talk.fields.room, id);
        }
        Ok(talk)
    }

    async fn remove(&self, id: Ulid) -> Result<Talk, StoreError> {
        let (_, talk) = self.talks.remove(&id).ok_or(StoreError::NotFound(id))?;
        self.unindex_room(&talk.fields.room, &id);
        Ok(talk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn talk_in(name: &str, room: &str) -> TalkInput {
        TalkInput {
            name: name.to_string(),
            start: "2025-09-26 16:00:00.000Z".to_string(),
            duration_minutes: 60.0,
            room: room.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn find_by_room_filters_on_room() {
        let store = InMemoryStore::new();
        let a = store.insert(talk_in("a", "r1")).await.unwrap();
        store.insert(talk_in("b", "r2")).await.unwrap();
        let c = store.insert(talk_in("c", "r1")).await.unwrap();

        let found = store.find_by_room("r1").await.unwrap();
        let ids: Vec<Ulid> = found.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a.id));
        assert!(ids.contains(&c.id));

        assert!(store.find_by_room("nowhere").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_by_room_keeps_insertion_order() {
        let store = InMemoryStore::new();
        for i in 0..5 {
            store.insert(talk_in(&format!("t{i}"), "r1")).await.unwrap();
        }
        let found = store.find_by_room("r1").await.unwrap();
        let names: Vec<&str> = found.iter().map(|t| t.fields.name.as_str()).collect();
        assert_eq!(names, ["t0", "t1", "t2", "t3", "t4"]);
    }

    #[tokio::test]
    async fn replace_moves_room_index() {
        let store = InMemoryStore::new();
        let talk = store.insert(talk_in("a", "r1")).await.unwrap();

        let updated = store.replace(talk.id, talk_in("a", "r2")).await.unwrap();
        assert_eq!(updated.id, talk.id);
        assert!(store.find_by_room("r1").await.unwrap().is_empty());
        assert_eq!(store.find_by_room("r2").await.unwrap(), vec![updated]);
    }

    #[tokio::test]
    async fn stale_room_index_does_not_leak_moved_talk() {
        let store = InMemoryStore::new();
        let talk = store.insert(talk_in("a", "r1")).await.unwrap();
        store.replace(talk.id, talk_in("a", "r2")).await.unwrap();

        // Leave r1's index pointing at the moved talk, as an interleaved
        // replace can.
        store.index_room("r1", talk.id);

        assert!(store.find_by_room("r1").await.unwrap().is_empty());
        let in_r2 = store.find_by_room("r2").await.unwrap();
        assert_eq!(in_r2.len(), 1);
        assert_eq!(in_r2[0].id, talk.id);
    }

    #[tokio::test]
    async fn replace_unknown_is_not_found() {
        let store = InMemoryStore::new();
        let id = Ulid::new();
        let result = store.replace(id, talk_in("a", "r1")).await;
        assert_eq!(result, Err(StoreError::NotFound(id)));
    }

    #[tokio::test]
    async fn remove_unindexes() {
        let store = InMemoryStore::new();
        let talk = store.insert(talk_in("a", "r1")).await.unwrap();
        let removed = store.remove(talk.id).await.unwrap();
        assert_eq!(removed, talk);
        assert_eq!(store.talk_count(), 0);
        assert!(store.find_by_room("r1").await.unwrap().is_empty());
        assert!(store.get(talk.id).await.unwrap().is_none());
        assert!(matches!(
            store.remove(talk.id).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
