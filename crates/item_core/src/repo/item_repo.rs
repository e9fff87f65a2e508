//! Item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Define the storage port (`ItemRepository`) consumed by `ItemService`.
//! - Provide stable CRUD over the canonical `items` table.
//!
//! # Invariants
//! - Write paths must call `Item::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - `save` on an item without id inserts and assigns a fresh id; `save` on an
//!   item with id updates the existing row.
//! - `delete_by_id` on a missing id is a no-op.

use crate::db::migrations::latest_version;
use crate::db::{schema_version, DbError};
use crate::model::item::{Item, ItemId, ItemValidationError};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    name,
    code,
    description,
    create_date,
    update_date
FROM items";

const ITEM_COLUMNS: [&str; 6] = [
    "id",
    "name",
    "code",
    "description",
    "create_date",
    "update_date",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for item persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Item failed record-level validation.
    Validation(ItemValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// `save` targeted an id that is not stored.
    NotFound(ItemId),
    /// Storage-level uniqueness constraint on `code` rejected the write.
    CodeConflict(String),
    /// Persisted data cannot be converted to a valid item.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::CodeConflict(code) => write!(f, "item code already stored: `{code}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "item repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "item repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "item repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::CodeConflict(_) => None,
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage port for item persistence.
///
/// Implementations own id assignment, durability and the storage-level
/// uniqueness of `code`.
pub trait ItemRepository {
    /// Returns whether some stored item has exactly this code.
    fn exists_by_code(&self, code: &str) -> RepoResult<bool>;
    /// Inserts (`id == None`) or updates (`id == Some`) and returns the
    /// persisted representation.
    fn save(&self, item: &Item) -> RepoResult<Item>;
    /// Loads one item by id.
    fn find_by_id(&self, id: ItemId) -> RepoResult<Option<Item>>;
    /// Returns every stored item.
    fn find_all(&self) -> RepoResult<Vec<Item>>;
    /// Removes one item. Missing ids are ignored.
    fn delete_by_id(&self, id: ItemId) -> RepoResult<()>;
}

impl<R: ItemRepository + ?Sized> ItemRepository for &R {
    fn exists_by_code(&self, code: &str) -> RepoResult<bool> {
        (**self).exists_by_code(code)
    }

    fn save(&self, item: &Item) -> RepoResult<Item> {
        (**self).save(item)
    }

    fn find_by_id(&self, id: ItemId) -> RepoResult<Option<Item>> {
        (**self).find_by_id(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Item>> {
        (**self).find_all()
    }

    fn delete_by_id(&self, id: ItemId) -> RepoResult<()> {
        (**self).delete_by_id(id)
    }
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_item_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn insert(&self, item: &Item) -> RepoResult<Item> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO items (
                    id,
                    name,
                    code,
                    description,
                    create_date,
                    update_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    id.to_string(),
                    item.name.as_str(),
                    item.code.as_str(),
                    item.description.as_str(),
                    item.create_date,
                    item.update_date,
                ],
            )
            .map_err(|err| map_code_conflict(err, &item.code))?;

        Ok(Item {
            id: Some(id),
            ..item.clone()
        })
    }

    fn update(&self, id: ItemId, item: &Item) -> RepoResult<Item> {
        let changed = self
            .conn
            .execute(
                "UPDATE items
                 SET
                    name = ?1,
                    code = ?2,
                    description = ?3,
                    create_date = ?4,
                    update_date = ?5
                 WHERE id = ?6;",
                params![
                    item.name.as_str(),
                    item.code.as_str(),
                    item.description.as_str(),
                    item.create_date,
                    item.update_date,
                    id.to_string(),
                ],
            )
            .map_err(|err| map_code_conflict(err, &item.code))?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(item.clone())
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn exists_by_code(&self, code: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM items WHERE code = ?1);",
            [code],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn save(&self, item: &Item) -> RepoResult<Item> {
        item.validate()?;

        match item.id {
            None => self.insert(item),
            Some(id) => self.update(id, item),
        }
    }

    fn find_by_id(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let item = self
            .conn
            .query_row(
                &format!("{ITEM_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_item_row(row)),
            )
            .optional()?;

        item.transpose()
    }

    fn find_all(&self) -> RepoResult<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} ORDER BY create_date ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }

        Ok(items)
    }

    fn delete_by_id(&self, id: ItemId) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM items WHERE id = ?1;", [id.to_string()])?;
        Ok(())
    }
}

fn map_code_conflict(err: rusqlite::Error, code: &str) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation
            && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        {
            return RepoError::CodeConflict(code.to_string());
        }
    }
    err.into()
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in items.id"))
    })?;

    let item = Item {
        id: Some(id),
        name: row.get("name")?,
        code: row.get("code")?,
        description: row.get("description")?,
        create_date: row.get("create_date")?,
        update_date: row.get("update_date")?,
    };
    item.validate()?;
    Ok(item)
}

fn ensure_item_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "items")? {
        return Err(RepoError::MissingRequiredTable("items"));
    }

    for column in ITEM_COLUMNS {
        if !table_has_column(conn, "items", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "items",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
