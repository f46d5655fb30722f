//! Append/remove semantics and the identity invariants.

use formic::{
    array::{AppendOptions, ArrayMutation, RemoveSelector},
    controller::FormController,
    tree,
};
use serde_json::{Value, json};

use crate::helpers::*;

#[tokio::test]
async fn test_append_to_empty_array() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    assert!(items.is_empty());

    items
        .append(row("x"), AppendOptions::default())
        .await
        .unwrap();

    let entries = items.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data, json!({"name": "x"}));
    assert_eq!(items.ids().len(), 1);
    assert!(!items.action_pending());

    // Local and authoritative state agree before the call returned.
    assert_eq!(
        controller.values_snapshot(),
        json!({"items": [{"name": "x"}]})
    );
}

#[tokio::test]
async fn test_remove_middle_row_keeps_outer_identifiers() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    items
        .append(json!([row("a"), row("b"), row("c")]), AppendOptions::default())
        .await
        .unwrap();

    let ids = items.ids().to_vec();
    items.remove(1).await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items.ids(), &[ids[0].clone(), ids[2].clone()]);
    assert_eq!(
        controller.array_values(&path("items")),
        vec![row("a"), row("c")]
    );
}

#[tokio::test]
async fn test_remove_all_leaves_empty_list_not_absent_path() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    items
        .append(json!([row("a"), row("b")]), AppendOptions::default())
        .await
        .unwrap();

    items.remove_all().await.unwrap();

    assert!(items.is_empty());
    // The path still exists and holds an empty array.
    let snapshot = controller.values_snapshot();
    assert_eq!(tree::get(&snapshot, &path("items")), Some(&json!([])));
}

#[tokio::test]
async fn test_append_monotonicity() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    items
        .append(json!([row("a"), row("b")]), AppendOptions::default())
        .await
        .unwrap();

    let before = items.entries();
    items
        .append(json!([row("c"), row("d")]), AppendOptions::default())
        .await
        .unwrap();

    let after = items.entries();
    assert_eq!(after.len(), 4);
    // First rows unchanged, positionally and by identity.
    assert_eq!(&after[..2], &before[..]);
    // New rows in order, each with a fresh unique identifier.
    assert_eq!(after[2].data, row("c"));
    assert_eq!(after[3].data, row("d"));
    let mut ids: Vec<_> = after.iter().map(|entry| entry.id.clone()).collect();
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn test_length_invariant_through_mutation_sequence() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;

    items
        .append(json!([row("a"), row("b"), row("c")]), AppendOptions::default())
        .await
        .unwrap();
    assert_eq!(items.ids().len(), items.entries().len());

    items.remove(vec![0, 2]).await.unwrap();
    assert_eq!(items.ids().len(), items.entries().len());

    items.append(row("d"), AppendOptions::default()).await.unwrap();
    assert_eq!(items.ids().len(), items.entries().len());

    items.remove_all().await.unwrap();
    assert_eq!(items.ids().len(), 0);
    assert_eq!(items.entries().len(), 0);
}

#[tokio::test]
async fn test_identity_stability_across_operations() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    items
        .append(json!([row("a"), row("b"), row("c")]), AppendOptions::default())
        .await
        .unwrap();

    let id_of_b = items.entries()[1].id.clone();
    let id_of_c = items.entries()[2].id.clone();

    items.remove(0).await.unwrap();
    items.append(row("d"), AppendOptions::default()).await.unwrap();

    let entries = items.entries();
    assert_eq!(entries[0].id, id_of_b);
    assert_eq!(entries[1].id, id_of_c);
    assert_ne!(entries[2].id, id_of_b);
    assert_ne!(entries[2].id, id_of_c);
}

#[tokio::test]
async fn test_append_at_position() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    items
        .append(json!([row("a"), row("c")]), AppendOptions::default())
        .await
        .unwrap();
    let id_of_c = items.entries()[1].id.clone();

    items.append(row("b"), AppendOptions::at(1)).await.unwrap();

    let entries = items.entries();
    assert_eq!(
        entries.iter().map(|entry| entry.data.clone()).collect::<Vec<_>>(),
        vec![row("a"), row("b"), row("c")]
    );
    // The displaced row carried its identifier along.
    assert_eq!(entries[2].id, id_of_c);
}

#[tokio::test]
async fn test_remove_out_of_range_is_noop() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    items.append(row("a"), AppendOptions::default()).await.unwrap();

    let before = items.entries();
    items.remove(5).await.unwrap();
    assert_eq!(items.entries(), before);
}

#[tokio::test]
async fn test_mutations_are_tagged_for_dirty_tracking() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;

    items.append(row("a"), AppendOptions::default()).await.unwrap();
    assert_eq!(
        controller.last_mutation(&path("items")),
        Some(ArrayMutation::Append {
            values: vec![row("a")],
            index: None,
        })
    );

    items.remove(0).await.unwrap();
    assert_eq!(
        controller.last_mutation(&path("items")),
        Some(ArrayMutation::Remove {
            selector: RemoveSelector::Indices(vec![0]),
        })
    );
}

#[tokio::test]
async fn test_bind_assigns_identifiers_to_seeded_rows() {
    let controller = controller_with(json!({"items": [row("a"), row("b")]}));
    let items = bound(&controller, "items").await;

    assert_eq!(items.len(), 2);
    assert_eq!(items.ids().len(), 2);
    assert_ne!(items.ids()[0], items.ids()[1]);
}

#[tokio::test]
async fn test_epoch_advances_on_every_structural_change() {
    let controller = controller();
    let mut items = bound(&controller, "items").await;
    let after_bind = controller.epoch_of(&path("items"));
    assert!(after_bind > 0);

    items.append(row("a"), AppendOptions::default()).await.unwrap();
    assert_eq!(controller.epoch_of(&path("items")), after_bind + 1);
}

#[tokio::test]
async fn test_deregisters_on_drop() {
    let controller = controller();
    {
        let _items = bound(&controller, "items").await;
    }
    // The path registration is gone, so a fresh tagged write is rejected.
    let result = controller.set_array_values(
        &path("items"),
        Vec::<Value>::new(),
        &ArrayMutation::Remove {
            selector: RemoveSelector::All,
        },
    );
    assert!(result.unwrap_err().is_not_registered());
}
