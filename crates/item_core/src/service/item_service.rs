//! Item use-case service.
//!
//! # Responsibility
//! - Enforce code uniqueness on create and existence on update.
//! - Own `create_date`/`update_date` stamping; callers never supply them.
//! - Delegate every other operation to the repository unchanged.
//!
//! # Invariants
//! - A rejected create or update performs no repository write.
//! - `code`, `create_date` and `id` are never changed by `update`.
//! - Repository errors are carried unchanged in `ItemServiceError::Repo`.
//!
//! # Known gap
//! Two concurrent creates with the same code can both pass
//! `exists_by_code`; the repository's own uniqueness constraint rejects the
//! second write with `RepoError::CodeConflict`.

#![warn(missing_docs)]

use crate::model::item::{now_epoch_ms, Item, ItemId};
use crate::repo::item_repo::{ItemRepository, RepoError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for item use-cases.
#[derive(Debug)]
pub enum ItemServiceError {
    /// Create rejected because the code is already stored.
    DuplicateCode(String),
    /// Update target does not exist.
    NotFound(ItemId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ItemServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateCode(code) => write!(f, "item with code already exists: {code}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ItemServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ItemServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Request model for creating an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateItemRequest {
    /// Human-readable label stored in `name`.
    pub name: String,
    /// Business code; must not be stored yet.
    pub code: String,
    /// Free text stored in `description`.
    pub description: String,
}

impl CreateItemRequest {
    /// Builds a create request from its three caller-supplied fields.
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            description: description.into(),
        }
    }
}

/// Request model for updating mutable item fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateItemRequest {
    /// Replacement for `name`.
    pub name: String,
    /// Replacement for `description`.
    pub description: String,
}

impl UpdateItemRequest {
    /// Builds an update request; `code` is not part of it.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Item service facade over repository implementations.
pub struct ItemService<R: ItemRepository> {
    repo: R,
}

impl<R: ItemRepository> ItemService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one item with a code not yet stored.
    ///
    /// # Contract
    /// - Calls `exists_by_code` exactly once.
    /// - Calls `save` exactly once on success and never on rejection.
    /// - Returns the repository's persisted representation.
    ///
    /// # Errors
    /// - `DuplicateCode` when the code is already stored.
    /// - `Repo` for any repository failure.
    pub fn create(&self, request: &CreateItemRequest) -> Result<Item, ItemServiceError> {
        let started_at = Instant::now();

        if self.repo.exists_by_code(&request.code)? {
            warn!(
                "event=item_create module=service status=rejected error_code=duplicate_code duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return Err(ItemServiceError::DuplicateCode(request.code.clone()));
        }

        let item = Item::new(
            request.name.as_str(),
            request.code.as_str(),
            request.description.as_str(),
            now_epoch_ms(),
        );

        match self.repo.save(&item) {
            Ok(saved) => {
                info!(
                    "event=item_create module=service status=ok item_id={} duration_ms={}",
                    display_id(saved.id),
                    started_at.elapsed().as_millis()
                );
                Ok(saved)
            }
            Err(err) => {
                error!(
                    "event=item_create module=service status=error error_code=save_failed duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Overwrites `name`/`description` of an existing item and stamps
    /// `update_date`.
    ///
    /// `update_date` never precedes `create_date`, even if the wall clock
    /// moved backwards since creation.
    ///
    /// # Errors
    /// - `NotFound` when no item has `id`; no write happens.
    /// - `Repo` for any repository failure.
    pub fn update(
        &self,
        id: ItemId,
        request: &UpdateItemRequest,
    ) -> Result<Item, ItemServiceError> {
        let started_at = Instant::now();

        let Some(mut item) = self.repo.find_by_id(id)? else {
            warn!(
                "event=item_update module=service status=rejected error_code=not_found item_id={id}"
            );
            return Err(ItemServiceError::NotFound(id));
        };

        let first_update = !item.is_updated();
        item.name = request.name.clone();
        item.description = request.description.clone();
        item.update_date = Some(now_epoch_ms().max(item.create_date));

        match self.repo.save(&item) {
            Ok(saved) => {
                info!(
                    "event=item_update module=service status=ok item_id={id} first_update={first_update} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(saved)
            }
            Err(err) => {
                error!(
                    "event=item_update module=service status=error error_code=save_failed item_id={id} duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Gets one item by id. Absence is not an error.
    pub fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, ItemServiceError> {
        Ok(self.repo.find_by_id(id)?)
    }

    /// Lists every stored item in repository order.
    pub fn find_all(&self) -> Result<Vec<Item>, ItemServiceError> {
        Ok(self.repo.find_all()?)
    }

    /// Deletes one item. Missing ids are not reported.
    pub fn delete_by_id(&self, id: ItemId) -> Result<(), ItemServiceError> {
        self.repo.delete_by_id(id)?;
        info!("event=item_delete module=service status=ok item_id={id}");
        Ok(())
    }
}

fn display_id(id: Option<ItemId>) -> String {
    id.map_or_else(|| "none".to_string(), |id| id.to_string())
}
