//! End-to-end flows through the Model: refresh, create/update with
//! refresh-after-write, modal state, and racing refreshes.

use async_trait::async_trait;
use catalog_signals::service::{Call, MemoryBackend};
use catalog_signals::{
    BackendInfo, BackendService, ImageId, ImageUpload, Item, ItemDraft, ItemForm, ItemId, Model, Response,
    Selection, ServiceError, ServiceResult, Signal, Unsubscribe, UploadedImage,
};
use futures::channel::oneshot;
use futures::executor::{block_on, LocalPool};
use futures::task::LocalSpawnExt;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

fn memory_model(items: Vec<Item>) -> (Model, Rc<MemoryBackend>) {
    let backend = Rc::new(MemoryBackend::with_items(items));
    (Model::new(backend.clone()), backend)
}

fn record<T: Clone + 'static>(signal: &Signal<T>) -> (Rc<RefCell<Vec<T>>>, Unsubscribe) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let handle = signal.subscribe(move |v: &T| sink.borrow_mut().push(v.clone()));
    (seen, handle)
}

// =============================================================================
// LIST REFRESH
// =============================================================================

#[test]
fn list_refresh_replaces_items() {
    let (model, _) = memory_model(vec![Item::new("1", "A")]);
    model.items().set(Vec::new());

    let response = block_on(model.refresh_items()).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(model.items().get(), vec![Item::new("1", "A")]);
}

#[test]
fn failed_refresh_keeps_last_good_list() {
    let (model, backend) = memory_model(vec![Item::new("1", "A")]);
    block_on(model.refresh_items()).unwrap();
    let (seen, _handle) = record(model.items());

    backend.fail_next(ServiceError::timed_out());
    let err = block_on(model.refresh_items()).unwrap_err();

    assert_eq!(err.status(), 0);
    assert_eq!(model.items().get(), vec![Item::new("1", "A")]);
    assert_eq!(seen.borrow().len(), 1);
}

// =============================================================================
// CREATE / UPDATE
// =============================================================================

#[test]
fn failed_create_leaves_items_unchanged() {
    let (model, backend) = memory_model(Vec::new());
    model.items().set(vec![Item::new("1", "A")]);
    backend.fail_next(ServiceError::http(422, "bad title"));

    let err = block_on(model.create_item(&ItemDraft::titled("bad"))).unwrap_err();

    assert_eq!(err.status(), 422);
    assert_eq!(err.message(), "bad title");
    assert_eq!(model.items().get(), vec![Item::new("1", "A")]);
    assert_eq!(backend.call_count(Call::ListItems), 0);
}

#[test]
fn successful_update_is_visible_after_refresh() {
    let (model, backend) = memory_model(vec![Item::new("1", "A"), Item::new("2", "B")]);
    block_on(model.refresh_items()).unwrap();
    let (seen, _handle) = record(model.items());

    block_on(model.update_item(&ItemId::from("2"), &ItemDraft::titled("B2"))).unwrap();

    let titles: Vec<_> = model.items().get().into_iter().map(|i| i.title).collect();
    assert_eq!(titles, vec!["A", "B2"]);
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(backend.calls(), vec![Call::ListItems, Call::UpdateItem, Call::ListItems]);
}

// =============================================================================
// MODAL
// =============================================================================

#[test]
fn modal_lifecycle_notifies_in_order() {
    let (model, _) = memory_model(Vec::new());
    let (seen, _handle) = record(model.selected_item());

    let item = Item::new("1", "A");
    model.select_item(item.clone());
    model.close_modal();

    assert_eq!(*seen.borrow(), vec![None, Some(Selection::Item(item)), None]);
}

#[test]
fn edit_flow_uploads_and_saves() {
    let item = Item::new("1", "Lamp");
    let (model, backend) = memory_model(vec![item.clone()]);
    block_on(model.refresh_items()).unwrap();
    model.select_item(item.clone());

    let form = ItemForm::edit(&model, &item);
    let uploaded = block_on(form.upload(&ImageUpload::new("lamp.jpg", vec![0xff, 0xd8]))).unwrap();
    form.tags.set("light, brass".into());

    block_on(form.submit()).unwrap();

    assert!(!model.is_modal_open());
    let items = model.items().get();
    let saved = &items[0];
    assert_eq!(saved.images, vec![uploaded.data.id]);
    assert_eq!(saved.tags, vec!["light", "brass"]);
    assert_eq!(backend.items()[0], *saved);
}

// =============================================================================
// RACING REFRESHES
// =============================================================================

/// A backend whose list responses are released by the test, one gate per call.
#[derive(Default)]
struct GatedBackend {
    gates: RefCell<VecDeque<oneshot::Receiver<Vec<Item>>>>,
}

impl GatedBackend {
    fn gate(&self) -> oneshot::Sender<Vec<Item>> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push_back(rx);
        tx
    }
}

#[async_trait(?Send)]
impl BackendService for GatedBackend {
    async fn list_items(&self) -> ServiceResult<Vec<Item>> {
        let gate = self.gates.borrow_mut().pop_front();
        match gate {
            Some(gate) => gate
                .await
                .map(Response::ok)
                .map_err(|_| ServiceError::transport("gate dropped")),
            None => Err(ServiceError::transport("no gate")),
        }
    }

    async fn get_item(&self, _id: &ItemId) -> ServiceResult<Item> {
        Err(ServiceError::http(404, "key not found"))
    }

    async fn create_item(&self, draft: &ItemDraft) -> ServiceResult<Item> {
        Ok(Response::new(Item::new("new", draft.title.clone()), 201))
    }

    async fn update_item(&self, id: &ItemId, patch: &ItemDraft) -> ServiceResult<Item> {
        Ok(Response::ok(Item::new(id.clone(), patch.title.clone())))
    }

    async fn delete_image(&self, _id: &ImageId) -> ServiceResult<()> {
        Ok(Response::new((), 204))
    }

    async fn upload_image(&self, _file: &ImageUpload) -> ServiceResult<UploadedImage> {
        Err(ServiceError::transport("uploads disabled"))
    }

    async fn get_version(&self) -> ServiceResult<BackendInfo> {
        Err(ServiceError::http(404, "HTTP error 404"))
    }
}

#[test]
fn last_refresh_to_complete_wins() {
    let backend = Rc::new(GatedBackend::default());
    let first = backend.gate();
    let second = backend.gate();
    let model = Model::new(backend);
    let (seen, _handle) = record(model.items());

    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let finished = Rc::new(RefCell::new(Vec::new()));
    for title in ["X", "Y"] {
        let model = model.clone();
        let finished = finished.clone();
        spawner
            .spawn_local(async move {
                let result = model.create_item(&ItemDraft::titled(title)).await;
                finished.borrow_mut().push(result.is_ok());
            })
            .unwrap();
    }

    pool.run_until_stalled();
    assert!(finished.borrow().is_empty());

    second.send(vec![Item::new("b", "newer request")]).unwrap();
    pool.run_until_stalled();
    assert_eq!(model.items().get(), vec![Item::new("b", "newer request")]);

    first.send(vec![Item::new("a", "older request")]).unwrap();
    pool.run_until_stalled();
    assert_eq!(model.items().get(), vec![Item::new("a", "older request")]);

    assert_eq!(*finished.borrow(), vec![true, true]);
    // Initial replay plus one notification per completed refresh.
    assert_eq!(seen.borrow().len(), 3);
}

#[test]
fn in_flight_update_survives_modal_close() {
    let backend = Rc::new(GatedBackend::default());
    let gate = backend.gate();
    let model = Model::new(backend);
    model.select_item(Item::new("1", "A"));

    let mut pool = LocalPool::new();
    let result = Rc::new(RefCell::new(None));
    {
        let model = model.clone();
        let result = result.clone();
        pool.spawner()
            .spawn_local(async move {
                let r = model.update_item(&ItemId::from("1"), &ItemDraft::titled("A2")).await;
                *result.borrow_mut() = Some(r);
            })
            .unwrap();
    }
    pool.run_until_stalled();

    model.close_modal();
    gate.send(vec![Item::new("1", "A2")]).unwrap();
    pool.run_until_stalled();

    let r = result.borrow_mut().take().unwrap();
    assert_eq!(r.unwrap().data.title, "A2");
    assert_eq!(model.items().get(), vec![Item::new("1", "A2")]);
}
