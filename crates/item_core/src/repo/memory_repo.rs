//! In-process item repository.
//!
//! # Responsibility
//! - Provide an `ItemRepository` without a database, for tests and embedding.
//!
//! # Invariants
//! - `codes` mirrors the `code` of every stored item.
//! - Same contract as the SQLite repository, including `CodeConflict` on a
//!   second insert of an already-stored code.
//! - Single-threaded: interior mutability uses `RefCell`.

use crate::model::item::{Item, ItemId};
use crate::repo::item_repo::{ItemRepository, RepoError, RepoResult};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    items: BTreeMap<ItemId, Item>,
    codes: HashSet<String>,
}

/// Map-backed item repository.
#[derive(Debug, Default)]
pub struct InMemoryItemRepository {
    state: RefCell<MemoryState>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.state.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemRepository for InMemoryItemRepository {
    fn exists_by_code(&self, code: &str) -> RepoResult<bool> {
        Ok(self.state.borrow().codes.contains(code))
    }

    fn save(&self, item: &Item) -> RepoResult<Item> {
        item.validate()?;
        let mut state = self.state.borrow_mut();

        match item.id {
            None => {
                if state.codes.contains(&item.code) {
                    return Err(RepoError::CodeConflict(item.code.clone()));
                }
                let id = Uuid::new_v4();
                let persisted = Item {
                    id: Some(id),
                    ..item.clone()
                };
                state.codes.insert(persisted.code.clone());
                state.items.insert(id, persisted.clone());
                Ok(persisted)
            }
            Some(id) => {
                let previous_code = match state.items.get(&id) {
                    Some(existing) => existing.code.clone(),
                    None => return Err(RepoError::NotFound(id)),
                };
                if previous_code != item.code {
                    if state.codes.contains(&item.code) {
                        return Err(RepoError::CodeConflict(item.code.clone()));
                    }
                    state.codes.remove(&previous_code);
                    state.codes.insert(item.code.clone());
                }
                state.items.insert(id, item.clone());
                Ok(item.clone())
            }
        }
    }

    fn find_by_id(&self, id: ItemId) -> RepoResult<Option<Item>> {
        Ok(self.state.borrow().items.get(&id).cloned())
    }

    fn find_all(&self) -> RepoResult<Vec<Item>> {
        let mut items: Vec<Item> = self.state.borrow().items.values().cloned().collect();
        items.sort_by(|left, right| {
            left.create_date
                .cmp(&right.create_date)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(items)
    }

    fn delete_by_id(&self, id: ItemId) -> RepoResult<()> {
        let mut state = self.state.borrow_mut();
        if let Some(removed) = state.items.remove(&id) {
            state.codes.remove(&removed.code);
        }
        Ok(())
    }
}
