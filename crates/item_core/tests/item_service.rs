use item_core::{
    now_epoch_ms, CreateItemRequest, InMemoryItemRepository, Item, ItemId, ItemRepository,
    ItemService, ItemServiceError, RepoError, RepoResult, UpdateItemRequest,
};
use std::cell::{Cell, RefCell};
use std::error::Error;
use uuid::Uuid;

/// Repository double that records calls and can force `exists_by_code`.
#[derive(Default)]
struct CountingRepository {
    inner: InMemoryItemRepository,
    exists_override: Option<bool>,
    exists_calls: RefCell<Vec<String>>,
    saved: RefCell<Vec<Item>>,
    find_calls: Cell<usize>,
    delete_calls: Cell<usize>,
}

impl CountingRepository {
    fn reporting_code_exists(exists: bool) -> Self {
        Self {
            exists_override: Some(exists),
            ..Self::default()
        }
    }

    fn save_calls(&self) -> usize {
        self.saved.borrow().len()
    }

    fn last_saved(&self) -> Item {
        self.saved.borrow().last().cloned().expect("save should have been called")
    }
}

impl ItemRepository for CountingRepository {
    fn exists_by_code(&self, code: &str) -> RepoResult<bool> {
        self.exists_calls.borrow_mut().push(code.to_string());
        match self.exists_override {
            Some(exists) => Ok(exists),
            None => self.inner.exists_by_code(code),
        }
    }

    fn save(&self, item: &Item) -> RepoResult<Item> {
        self.saved.borrow_mut().push(item.clone());
        self.inner.save(item)
    }

    fn find_by_id(&self, id: ItemId) -> RepoResult<Option<Item>> {
        self.find_calls.set(self.find_calls.get() + 1);
        self.inner.find_by_id(id)
    }

    fn find_all(&self) -> RepoResult<Vec<Item>> {
        self.inner.find_all()
    }

    fn delete_by_id(&self, id: ItemId) -> RepoResult<()> {
        self.delete_calls.set(self.delete_calls.get() + 1);
        self.inner.delete_by_id(id)
    }
}

/// Repository whose every call fails, to check error pass-through.
struct BrokenRepository;

impl ItemRepository for BrokenRepository {
    fn exists_by_code(&self, _code: &str) -> RepoResult<bool> {
        Err(RepoError::InvalidData("store offline".to_string()))
    }

    fn save(&self, _item: &Item) -> RepoResult<Item> {
        Err(RepoError::InvalidData("store offline".to_string()))
    }

    fn find_by_id(&self, _id: ItemId) -> RepoResult<Option<Item>> {
        Err(RepoError::InvalidData("store offline".to_string()))
    }

    fn find_all(&self) -> RepoResult<Vec<Item>> {
        Err(RepoError::InvalidData("store offline".to_string()))
    }

    fn delete_by_id(&self, _id: ItemId) -> RepoResult<()> {
        Err(RepoError::InvalidData("store offline".to_string()))
    }
}

#[test]
fn create_with_unique_code_saves_once_and_returns_persisted_item() {
    let repo = CountingRepository::reporting_code_exists(false);
    let service = ItemService::new(&repo);
    let before = now_epoch_ms();

    let result = service
        .create(&CreateItemRequest::new("BMW", "bmw-1", "German car"))
        .unwrap();

    let after = now_epoch_ms();
    assert_eq!(*repo.exists_calls.borrow(), vec!["bmw-1".to_string()]);
    assert_eq!(repo.save_calls(), 1);

    let saved = repo.last_saved();
    assert_eq!(saved.id, None);
    assert_eq!(saved.name, "BMW");
    assert_eq!(saved.code, "bmw-1");
    assert_eq!(saved.description, "German car");
    assert!(saved.create_date >= before && saved.create_date <= after);
    assert_eq!(saved.update_date, None);

    assert!(result.id.is_some());
    assert_eq!(Item { id: None, ..result }, saved);
}

#[test]
fn create_with_existing_code_fails_without_save() {
    let repo = CountingRepository::reporting_code_exists(true);
    let service = ItemService::new(&repo);

    let err = service
        .create(&CreateItemRequest::new("Tesla", "tesla-1", "Electric car"))
        .unwrap_err();

    assert!(matches!(err, ItemServiceError::DuplicateCode(ref code) if code == "tesla-1"));
    assert_eq!(err.to_string(), "item with code already exists: tesla-1");
    assert_eq!(repo.exists_calls.borrow().len(), 1);
    assert_eq!(repo.save_calls(), 0);
}

#[test]
fn second_create_with_same_code_is_rejected_by_stored_state() {
    let repo = CountingRepository::default();
    let service = ItemService::new(&repo);

    service
        .create(&CreateItemRequest::new("BMW", "bmw-1", "German car"))
        .unwrap();
    let err = service
        .create(&CreateItemRequest::new("BMW again", "bmw-1", "copy"))
        .unwrap_err();

    assert!(matches!(err, ItemServiceError::DuplicateCode(_)));
    assert_eq!(repo.save_calls(), 1);
    assert_eq!(service.find_all().unwrap().len(), 1);
}

#[test]
fn create_race_past_the_check_is_closed_by_storage() {
    let repo = CountingRepository::reporting_code_exists(false);
    let service = ItemService::new(&repo);

    service
        .create(&CreateItemRequest::new("Kia", "kia-1", "Korean"))
        .unwrap();
    let err = service
        .create(&CreateItemRequest::new("Kia", "kia-1", "Korean"))
        .unwrap_err();

    assert!(matches!(
        err,
        ItemServiceError::Repo(RepoError::CodeConflict(ref code)) if code == "kia-1"
    ));
    assert!(err.source().is_some());
}

#[test]
fn update_overwrites_mutable_fields_and_keeps_identity() {
    let repo = CountingRepository::default();
    let service = ItemService::new(&repo);
    let created = service
        .create(&CreateItemRequest::new("Audi", "audi-1", "Luxury car"))
        .unwrap();
    let id = created.id.unwrap();
    assert!(!created.is_updated());

    let updated = service
        .update(id, &UpdateItemRequest::new("Audi A4", "Compact executive"))
        .unwrap();
    assert!(updated.is_updated());

    assert_eq!(repo.save_calls(), 2);
    assert_eq!(updated.id, Some(id));
    assert_eq!(updated.name, "Audi A4");
    assert_eq!(updated.description, "Compact executive");
    assert_eq!(updated.code, "audi-1");
    assert_eq!(updated.create_date, created.create_date);
    let update_date = updated.update_date.expect("update_date should be set");
    assert!(update_date >= created.create_date);

    let stored = service.find_by_id(id).unwrap().unwrap();
    assert_eq!(stored, updated);
}

#[test]
fn update_overwrites_previous_update_date() {
    let repo = InMemoryItemRepository::new();
    let mut item = Item::new("Ford", "ford-1", "USA car", 1_000);
    item.update_date = Some(2_000);
    let stored = repo.save(&item).unwrap();
    let service = ItemService::new(&repo);

    let updated = service
        .update(stored.id.unwrap(), &UpdateItemRequest::new("Ford", "USA car"))
        .unwrap();

    assert!(updated.update_date.unwrap() > 2_000);
    assert_eq!(updated.create_date, 1_000);
}

#[test]
fn update_never_stamps_before_create_date() {
    let repo = InMemoryItemRepository::new();
    let future_create = now_epoch_ms() + 60_000;
    let stored = repo
        .save(&Item::new("Mazda", "mazda-1", "Zoom zoom", future_create))
        .unwrap();
    let service = ItemService::new(&repo);

    let updated = service
        .update(stored.id.unwrap(), &UpdateItemRequest::new("Mazda", "Zoom"))
        .unwrap();

    assert_eq!(updated.update_date, Some(future_create));
}

#[test]
fn update_missing_item_fails_without_save() {
    let repo = CountingRepository::default();
    let service = ItemService::new(&repo);
    let missing = Uuid::new_v4();

    let err = service
        .update(missing, &UpdateItemRequest::new("Honda", "Japan car"))
        .unwrap_err();

    assert!(matches!(err, ItemServiceError::NotFound(id) if id == missing));
    assert_eq!(err.to_string(), format!("item not found: {missing}"));
    assert_eq!(repo.find_calls.get(), 1);
    assert_eq!(repo.save_calls(), 0);
}

#[test]
fn find_by_id_returns_none_for_unknown_id() {
    let repo = InMemoryItemRepository::new();
    let service = ItemService::new(&repo);

    assert_eq!(service.find_by_id(Uuid::new_v4()).unwrap(), None);
}

#[test]
fn delete_then_find_returns_none_and_missing_delete_is_ok() {
    let repo = CountingRepository::default();
    let service = ItemService::new(&repo);
    let created = service
        .create(&CreateItemRequest::new("Skoda", "skoda-1", "Czech"))
        .unwrap();
    let id = created.id.unwrap();

    service.delete_by_id(id).unwrap();
    service.delete_by_id(id).unwrap();

    assert_eq!(repo.delete_calls.get(), 2);
    assert_eq!(service.find_by_id(id).unwrap(), None);
    assert!(service.find_all().unwrap().is_empty());
}

#[test]
fn find_all_returns_every_stored_item() {
    let repo = InMemoryItemRepository::new();
    let service = ItemService::new(&repo);
    for (name, code) in [("VW", "vw-1"), ("Renault", "renault-1")] {
        service
            .create(&CreateItemRequest::new(name, code, ""))
            .unwrap();
    }

    let mut codes: Vec<String> = service
        .find_all()
        .unwrap()
        .into_iter()
        .map(|item| item.code)
        .collect();
    codes.sort();

    assert_eq!(codes, vec!["renault-1".to_string(), "vw-1".to_string()]);
}

#[test]
fn repository_errors_propagate_unchanged() {
    let service = ItemService::new(BrokenRepository);

    let create_err = service
        .create(&CreateItemRequest::new("Any", "any-1", ""))
        .unwrap_err();
    assert!(matches!(
        create_err,
        ItemServiceError::Repo(RepoError::InvalidData(_))
    ));

    let update_err = service
        .update(Uuid::new_v4(), &UpdateItemRequest::new("Any", ""))
        .unwrap_err();
    assert!(matches!(
        update_err,
        ItemServiceError::Repo(RepoError::InvalidData(_))
    ));

    assert!(service.find_all().is_err());
    assert!(service.find_by_id(Uuid::new_v4()).is_err());
    assert!(service.delete_by_id(Uuid::new_v4()).is_err());
}
