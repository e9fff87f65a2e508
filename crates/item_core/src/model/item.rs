//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical `Item` record managed by the core.
//! - Provide validation shared by repository write and read paths.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused for another item.
//! - `code` is set at construction and never mutated by core use-cases.
//! - `update_date` is `None` until the first update and never earlier than
//!   `create_date` when set.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Storage-assigned identifier of an item.
pub type ItemId = Uuid;

/// Validation errors for item invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    /// `name` is empty or whitespace only.
    BlankName,
    /// `code` is empty or whitespace only.
    BlankCode,
    /// Assigned id is the nil UUID.
    NilId,
    /// `update_date` precedes `create_date`.
    UpdateBeforeCreate { create_date: i64, update_date: i64 },
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "item name must not be blank"),
            Self::BlankCode => write!(f, "item code must not be blank"),
            Self::NilId => write!(f, "item id must not be nil"),
            Self::UpdateBeforeCreate {
                create_date,
                update_date,
            } => write!(
                f,
                "update_date ({update_date}) must be >= create_date ({create_date})"
            ),
        }
    }
}

impl Error for ItemValidationError {}

/// Canonical item record.
///
/// Deserialization runs [`Item::validate`], so a decoded item always holds
/// the same invariants as one read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ItemRecord")]
pub struct Item {
    /// `None` until the repository assigns an id on first save.
    pub id: Option<ItemId>,
    /// Human-readable label.
    pub name: String,
    /// Business-unique code, distinct from `id`.
    pub code: String,
    /// Free text. Empty string when the caller has nothing to say.
    pub description: String,
    /// Unix epoch milliseconds, set once at creation.
    pub create_date: i64,
    /// Unix epoch milliseconds of the latest update.
    pub update_date: Option<i64>,
}

#[derive(Deserialize)]
struct ItemRecord {
    id: Option<ItemId>,
    name: String,
    code: String,
    description: String,
    create_date: i64,
    update_date: Option<i64>,
}

impl TryFrom<ItemRecord> for Item {
    type Error = ItemValidationError;

    fn try_from(value: ItemRecord) -> Result<Self, Self::Error> {
        let item = Self {
            id: value.id,
            name: value.name,
            code: value.code,
            description: value.description,
            create_date: value.create_date,
            update_date: value.update_date,
        };
        item.validate()?;
        Ok(item)
    }
}

impl Item {
    /// Creates a not-yet-persisted item.
    ///
    /// # Invariants
    /// - `id` starts as `None`; storage assigns it on save.
    /// - `update_date` starts as `None`.
    /// - This constructor does not validate; repositories do on write.
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        description: impl Into<String>,
        create_date: i64,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            code: code.into(),
            description: description.into(),
            create_date,
            update_date: None,
        }
    }

    /// Returns whether at least one update has been applied.
    pub fn is_updated(&self) -> bool {
        self.update_date.is_some()
    }

    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.is_some_and(|id| id.is_nil()) {
            return Err(ItemValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::BlankName);
        }
        if self.code.trim().is_empty() {
            return Err(ItemValidationError::BlankCode);
        }
        if let Some(update_date) = self.update_date {
            if update_date < self.create_date {
                return Err(ItemValidationError::UpdateBeforeCreate {
                    create_date: self.create_date,
                    update_date,
                });
            }
        }
        Ok(())
    }
}

/// Returns the current wall-clock time in Unix epoch milliseconds.
///
/// Clocks set before the epoch yield `0` instead of failing.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
        })
}
