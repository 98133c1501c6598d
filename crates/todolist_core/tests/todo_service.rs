use todolist_core::{ListStore, ServiceError, TodoPatch, TodoService, TodoValidationError};
use uuid::Uuid;

fn service() -> TodoService {
    TodoService::new(ListStore::open_in_memory().unwrap())
}

#[tokio::test]
async fn create_trims_title_before_reaching_store() {
    let service = service();
    let id = service.create("  Buy milk \n").await.unwrap();
    assert_eq!(service.snapshot().get(id).unwrap().title, "Buy milk");
}

#[tokio::test]
async fn blank_titles_are_rejected_without_touching_store() {
    let service = service();
    let before = service.snapshot().version;

    let err = service.create("   ").await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InvalidTitle(TodoValidationError::BlankTitle)
    ));

    let id = service.create("real").await.unwrap();
    let err = service.rename(id, "\t").await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTitle(_)));
    let err = service
        .update(id, TodoPatch::title(" "))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTitle(_)));

    let snapshot = service.snapshot();
    assert_eq!(snapshot.version, before + 1);
    assert_eq!(snapshot.get(id).unwrap().title, "real");
}

#[tokio::test]
async fn update_normalizes_title_and_keeps_completed_patch() {
    let service = service();
    let id = service.create("draft").await.unwrap();

    service
        .update(
            id,
            TodoPatch {
                title: Some("  edited ".to_string()),
                completed: Some(true),
            },
        )
        .await
        .unwrap();

    let todo = service.snapshot().get(id).cloned().unwrap();
    assert_eq!(todo.title, "edited");
    assert!(todo.completed);
}

#[tokio::test]
async fn not_found_is_reported_with_id() {
    let service = service();
    let missing = Uuid::new_v4();

    let err = service.toggle(missing).await.unwrap_err();
    assert!(matches!(err, ServiceError::TodoNotFound(id) if id == missing));
    assert!(err.to_string().contains(&missing.to_string()));

    assert!(!service.delete(missing).await.unwrap());
}

#[tokio::test]
async fn reorder_visible_assigns_dense_zero_based_ordinals() {
    let service = service();
    let a = service.create("A").await.unwrap();
    let b = service.create("B").await.unwrap();
    let c = service.create("C").await.unwrap();

    service.reorder_visible(&[b, c, a]).await.unwrap();

    let snapshot = service.snapshot();
    assert_eq!(snapshot.ids(), vec![b, c, a]);
    let orders: Vec<i64> = snapshot.todos.iter().map(|todo| todo.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}
