//! Focus restoration after appends.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use formic::{array::AppendOptions, controller::FormController};

use crate::helpers::*;

/// Registers a focusable field and returns its invocation counter.
fn focusable(
    controller: &Arc<formic::controller::InMemoryController>,
    name: &str,
) -> Arc<AtomicUsize> {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    controller.register_focusable(name, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    hits
}

#[tokio::test]
async fn test_append_focuses_first_field_of_new_row() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    let name_hits = focusable(&controller, "items.0.name");

    items.append(row("a"), AppendOptions::default()).await.unwrap();

    assert_eq!(name_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_append_focuses_requested_field() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    let name_hits = focusable(&controller, "items.0.name");
    let qty_hits = focusable(&controller, "items.0.qty");

    items
        .append(row("a"), AppendOptions::focus_field("qty"))
        .await
        .unwrap();

    assert_eq!(qty_hits.load(Ordering::SeqCst), 1);
    assert_eq!(name_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_suppressed_focus_leaves_fields_alone() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    let name_hits = focusable(&controller, "items.0.name");

    items
        .append(row("a"), AppendOptions::without_focus())
        .await
        .unwrap();

    assert_eq!(name_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_focus_targets_the_appended_row() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    let row0_hits = focusable(&controller, "items.0.name");
    let row1_hits = focusable(&controller, "items.1.name");

    items.append(row("a"), AppendOptions::without_focus()).await.unwrap();
    items.append(row("b"), AppendOptions::default()).await.unwrap();

    assert_eq!(row0_hits.load(Ordering::SeqCst), 0);
    assert_eq!(row1_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_first_prefix_match_wins() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    let aaa_hits = focusable(&controller, "items.0.aaa");
    let bbb_hits = focusable(&controller, "items.0.bbb");

    items.append(row("a"), AppendOptions::default()).await.unwrap();

    assert_eq!(aaa_hits.load(Ordering::SeqCst), 1);
    assert_eq!(bbb_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_registration_order_beats_name_order() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    // The row's layout registers qty before name.
    let qty_hits = focusable(&controller, "items.0.qty");
    let name_hits = focusable(&controller, "items.0.name");

    items.append(row("a"), AppendOptions::default()).await.unwrap();

    assert_eq!(qty_hits.load(Ordering::SeqCst), 1);
    assert_eq!(name_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_fields_without_focus_capability_are_skipped() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    controller.register_field(formic::controller::FieldDefinition::new("items.0.aaa"));
    let bbb_hits = focusable(&controller, "items.0.bbb");

    items.append(row("a"), AppendOptions::default()).await.unwrap();

    assert_eq!(bbb_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_pending_focus_clears_even_without_a_match() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;

    // Nothing is registered yet, so the target is consumed unmatched.
    items.append(row("a"), AppendOptions::default()).await.unwrap();

    // A later external re-sync must not focus the now-registered field.
    let name_hits = focusable(&controller, "items.0.name");
    let mut rx = controller.subscribe_array_changes();
    controller.write_array(&path("items"), vec![row("a"), row("b")]);
    let event = rx.try_recv().unwrap();
    items.handle_event(&event).await;

    assert_eq!(name_hits.load(Ordering::SeqCst), 0);
}
