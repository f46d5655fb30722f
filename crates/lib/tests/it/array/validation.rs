//! Validation dispatch strategies and their gating.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use formic::{
    FieldArray,
    array::{AppendOptions, ArrayOptions},
    controller::{FormController, InMemoryController},
    path::FieldPath,
    tree,
    validate::{FieldError, Resolver, SchemaOutcome, ValidationConfig, ValidationMode},
};
use serde_json::{Value, json};

use crate::helpers::*;

/// A resolver that reports `required` on the first row.
fn first_row_resolver() -> Arc<dyn Resolver> {
    Arc::new(FnResolver(|values: &Value, _: &[FieldPath]| {
        let mut errors = json!({});
        tree::set(
            &mut errors,
            &path("items.0"),
            FieldError::new("required", "name is required").into_value(),
        );
        SchemaOutcome {
            values: values.clone(),
            errors,
        }
    }))
}

/// A resolver that always resolves clean, counting its invocations.
fn counting_resolver(calls: Arc<AtomicUsize>) -> Arc<dyn Resolver> {
    Arc::new(FnResolver(move |values: &Value, _: &[FieldPath]| {
        calls.fetch_add(1, Ordering::SeqCst);
        SchemaOutcome::clean(values.clone())
    }))
}

#[tokio::test]
async fn test_resolver_error_lands_in_error_map() {
    let controller = Arc::new(
        InMemoryController::new()
            .with_resolver(first_row_resolver())
            .with_config(on_change_config()),
    );
    let mut items = bound(&controller, "items").await;

    items.append(row(""), AppendOptions::default()).await.unwrap();

    let errors = controller.errors_snapshot();
    assert_eq!(
        tree::get(&errors, &path("items.0")),
        Some(&FieldError::new("required", "name is required").into_value())
    );
    assert!(!items.action_pending());
    assert!(!controller.is_valid());
}

#[tokio::test]
async fn test_on_submit_mode_gates_validation_until_submitted() {
    let calls = Arc::new(AtomicUsize::new(0));
    // Default configuration validates on submit only.
    let controller =
        Arc::new(InMemoryController::new().with_resolver(counting_resolver(calls.clone())));
    let mut items = bound(&controller, "items").await;

    items.append(row("a"), AppendOptions::default()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    controller.mark_submitted();
    items.append(row("b"), AppendOptions::default()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_external_resync_does_not_validate() {
    let calls = Arc::new(AtomicUsize::new(0));
    let controller = Arc::new(
        InMemoryController::new()
            .with_resolver(counting_resolver(calls.clone()))
            .with_config(on_change_config()),
    );
    let mut items = bound(&controller, "items").await;

    let mut rx = controller.subscribe_array_changes();
    controller.write_array(&path("items"), vec![row("a")]);
    let event = rx.try_recv().unwrap();
    items.handle_event(&event).await;

    // The transient action flag was never set, so no validation fired.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_unchanged_resolver_outcome_is_discarded() {
    let controller = Arc::new(
        InMemoryController::new()
            .with_resolver(first_row_resolver())
            .with_config(on_change_config()),
    );
    let mut items = bound(&controller, "items").await;

    // Seed the error state with exactly what the resolver will report.
    let mut errors = json!({});
    tree::set(
        &mut errors,
        &path("items.0"),
        FieldError::new("required", "name is required").into_value(),
    );
    controller.set_errors(errors.clone());

    let mut rx = controller.subscribe_state();
    items.append(row(""), AppendOptions::default()).await.unwrap();

    // The arrival-time comparison found no difference, so the only state
    // broadcast is the validity recomputation at the end of the re-sync.
    let mut state_events = 0;
    while rx.try_recv().is_ok() {
        state_events += 1;
    }
    assert_eq!(state_events, 1);
    assert_eq!(controller.errors_snapshot(), errors);
}

#[tokio::test]
async fn test_resolver_clears_stale_error() {
    let resolver: Arc<dyn Resolver> = Arc::new(FnResolver(|values: &Value, _: &[FieldPath]| {
        SchemaOutcome::clean(values.clone())
    }));
    let controller = Arc::new(
        InMemoryController::new()
            .with_resolver(resolver)
            .with_config(on_change_config()),
    );
    let mut items = bound(&controller, "items").await;

    let mut errors = json!({});
    tree::set(
        &mut errors,
        &path("items"),
        FieldError::new("min", "too few rows").into_value(),
    );
    controller.set_errors(errors);
    controller.recompute_validity();
    assert!(!controller.is_valid());

    items.append(row("a"), AppendOptions::default()).await.unwrap();

    assert_eq!(
        tree::get(&controller.errors_snapshot(), &path("items")),
        None
    );
    assert!(controller.is_valid());
}

#[tokio::test]
async fn test_field_rule_merges_as_root_error() {
    let controller = Arc::new(InMemoryController::new().with_config(on_change_config()));
    let options = ArrayOptions::new().with_rule(|value: &Value| {
        let count = value.as_array().map(Vec::len).unwrap_or(0);
        (count < 2).then(|| FieldError::new("minLength", "need at least two rows"))
    });
    let mut items = FieldArray::bind(controller.clone(), "items", options).await;

    items.append(row("a"), AppendOptions::default()).await.unwrap();

    let errors = controller.errors_snapshot();
    assert_eq!(
        tree::get(&errors, &path("items.root")),
        Some(&FieldError::new("minLength", "need at least two rows").into_value())
    );
    assert!(!controller.is_valid());
}

#[tokio::test]
async fn test_field_rule_skipped_when_both_modes_are_on_submit() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let config = ValidationConfig {
        mode: ValidationMode::OnSubmit,
        revalidate_mode: ValidationMode::OnSubmit,
        ..Default::default()
    };
    let controller = Arc::new(InMemoryController::new().with_config(config));
    controller.mark_submitted();

    let options = ArrayOptions::new().with_rule(move |_: &Value| {
        counter.fetch_add(1, Ordering::SeqCst);
        Some(FieldError::new("always", "should not run"))
    });
    let mut items = FieldArray::bind(controller.clone(), "items", options).await;

    items.append(row("a"), AppendOptions::default()).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(controller.errors_snapshot().as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_field_definition_skips_validation() {
    // No resolver and no registered field: validation silently skips and
    // the mutation still completes.
    let controller = Arc::new(InMemoryController::new().with_config(on_change_config()));
    let mut items = bound(&controller, "items").await;

    items.append(row("a"), AppendOptions::default()).await.unwrap();

    assert_eq!(items.len(), 1);
    assert!(controller.is_valid());
}
