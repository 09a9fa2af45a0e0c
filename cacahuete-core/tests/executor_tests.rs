//! Request executor tests.
//!
//! Each test gives the executor its own subscriber with a [`SpanLedger`]
//! layer, so span and event counts are not polluted by parallel tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cacahuete_core::operations::{self, names};
use cacahuete_core::pipeline::{OperationContext, OperationError, RawRequest, RequestDescriptor};
use cacahuete_core::{ErrorKind, MemoryStore, Recipe, RecipeStore, RequestExecutor, StoreError};
use serde_json::json;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

#[derive(Debug, Default)]
struct Ledger {
    opened: Vec<&'static str>,
    closed: usize,
    failed: usize,
    warnings: usize,
    errors: usize,
}

/// Tracing layer that records what the executor emitted.
#[derive(Clone, Default)]
struct SpanLedger(Arc<Mutex<Ledger>>);

impl SpanLedger {
    fn snapshot<T>(&self, f: impl FnOnce(&Ledger) -> T) -> T {
        f(&self.0.lock().unwrap())
    }
}

struct StatusVisitor(bool);

impl Visit for StatusVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "otel.status_code" && value == "ERROR" {
            self.0 = true;
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
}

impl<S> Layer<S> for SpanLedger
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        self.0.lock().unwrap().opened.push(attrs.metadata().name());
    }

    fn on_record(&self, _id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        let mut visitor = StatusVisitor(false);
        values.record(&mut visitor);
        if visitor.0 {
            self.0.lock().unwrap().failed += 1;
        }
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        let mut ledger = self.0.lock().unwrap();
        if level == Level::WARN {
            ledger.warnings += 1;
        } else if level == Level::ERROR {
            ledger.errors += 1;
        }
    }

    fn on_close(&self, _id: Id, _ctx: Context<'_, S>) {
        self.0.lock().unwrap().closed += 1;
    }
}

fn executor_with(store: Arc<MemoryStore>) -> (RequestExecutor, SpanLedger) {
    let ledger = SpanLedger::default();
    let dispatch = Dispatch::new(tracing_subscriber::registry().with(ledger.clone()));
    (RequestExecutor::new(store, dispatch), ledger)
}

fn valid_recipe_json() -> serde_json::Value {
    json!({
        "name": "Pate tomates basilic",
        "author": "Arsène Fougerouse",
        "description": "Le lundi c'est spaghetti",
        "dish": "main",
        "servings": 4,
        "metadata": {"origin": "Italie"},
        "timers": [{"name": "cooking time", "quantity": 10, "units": "minutes"}],
        "steps": ["Faire bouillir l'eau", "Cuire les pates"],
        "ingredients": [{"id": "598b651ffd078b0011140a21", "quantity": 250, "units": "g"}]
    })
}

/// Save operation that counts how often it actually ran.
fn counting_save(
    raw: RawRequest,
    calls: &Arc<AtomicUsize>,
) -> RequestDescriptor<Recipe, impl cacahuete_core::pipeline::Operation<Recipe, Output = Recipe>> {
    let calls = Arc::clone(calls);
    RequestDescriptor::with_payload(
        names::SAVE,
        raw,
        move |ctx: OperationContext, recipe: Recipe| {
            calls.fetch_add(1, Ordering::SeqCst);
            operations::save(ctx, recipe)
        },
    )
}

#[tokio::test]
async fn test_nil_payload_is_rejected_before_any_span() {
    let store = Arc::new(MemoryStore::new());
    let (executor, ledger) = executor_with(store.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    let err = executor
        .execute(counting_save(RawRequest::new(), &calls))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(err.to_response().error, "payload is nil");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    ledger.snapshot(|l| {
        assert!(l.opened.is_empty());
        assert_eq!(l.warnings, 1);
        assert_eq!(l.errors, 0);
    });
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_malformed_body_is_an_invalid_request() {
    let (executor, ledger) = executor_with(Arc::new(MemoryStore::new()));
    let calls = Arc::new(AtomicUsize::new(0));

    let err = executor
        .execute(counting_save(RawRequest::from_body("{\"name\": "), &calls))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    ledger.snapshot(|l| {
        assert_eq!(l.opened, ["api.request"]);
        assert_eq!(l.closed, 1);
        assert_eq!(l.failed, 1);
        assert_eq!(l.warnings + l.errors, 1);
    });
}

#[tokio::test]
async fn test_zero_servings_is_unprocessable() {
    let (executor, ledger) = executor_with(Arc::new(MemoryStore::new()));
    let calls = Arc::new(AtomicUsize::new(0));
    let mut body = valid_recipe_json();
    body["servings"] = json!(0);

    let err = executor
        .execute(counting_save(RawRequest::from_body(body.to_string()), &calls))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnprocessablePayload);
    assert_eq!(err.details(), ["servings: must be at least 1"]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    ledger.snapshot(|l| {
        assert_eq!(l.opened, ["api.request"]);
        assert_eq!(l.closed, 1);
        assert_eq!(l.failed, 1);
        assert_eq!(l.warnings, 1);
        assert_eq!(l.errors, 0);
    });
}

#[tokio::test]
async fn test_nil_recipe_id_is_never_stored() {
    let store = Arc::new(MemoryStore::new());
    let (executor, _ledger) = executor_with(store.clone());
    let mut body = valid_recipe_json();
    body["id"] = json!("00000000-0000-0000-0000-000000000000");

    let err = executor
        .execute(operations::save_request(RawRequest::from_body(
            body.to_string(),
        )))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnprocessablePayload);
    assert_eq!(err.details(), ["id: must not be the nil UUID"]);

    let err = executor
        .execute(operations::upsert_by_id_request(
            RawRequest::from_body(valid_recipe_json().to_string())
                .with_param("id", "00000000-0000-0000-0000-000000000000"),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnprocessablePayload);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_unknown_dish_is_unprocessable_not_a_bind_error() {
    let (executor, _ledger) = executor_with(Arc::new(MemoryStore::new()));
    let calls = Arc::new(AtomicUsize::new(0));
    let mut body = valid_recipe_json();
    body["dish"] = json!("brunch");

    let err = executor
        .execute(counting_save(RawRequest::from_body(body.to_string()), &calls))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnprocessablePayload);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_successful_save_opens_and_closes_two_spans() {
    let store = Arc::new(MemoryStore::new());
    let (executor, ledger) = executor_with(store.clone());
    let calls = Arc::new(AtomicUsize::new(0));

    let saved = executor
        .execute(counting_save(
            RawRequest::from_body(valid_recipe_json().to_string()),
            &calls,
        ))
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(saved.id.is_some());
    assert_eq!(saved.servings, 4);
    assert_eq!(store.len().await, 1);
    ledger.snapshot(|l| {
        assert_eq!(l.opened, ["api.request", "api.operation"]);
        assert_eq!(l.closed, 2);
        assert_eq!(l.failed, 0);
        assert_eq!(l.warnings + l.errors, 0);
    });
}

#[tokio::test]
async fn test_operation_without_payload_skips_binding() {
    let store = Arc::new(MemoryStore::with_documents([Recipe {
        name: "Tarte tatin".to_string(),
        ..Default::default()
    }]));
    let (executor, ledger) = executor_with(store);

    let descriptor = operations::find_all_request();
    assert!(!descriptor.declares_payload());
    let recipes = executor.execute(descriptor).await.unwrap();

    assert_eq!(recipes.len(), 1);
    ledger.snapshot(|l| assert_eq!(l.opened.len(), 2));
}

#[tokio::test]
async fn test_operation_failure_is_logged_once_and_wrapped() {
    let (executor, ledger) = executor_with(Arc::new(MemoryStore::new()));
    let descriptor = RequestDescriptor::without_payload(
        names::FIND_ALL,
        |_ctx: OperationContext, _: ()| async {
            Err::<Arc<Vec<Recipe>>, OperationError>(OperationError::Store(StoreError::Query(
                "connection reset".to_string(),
            )))
        },
    );

    let err = executor.execute(descriptor).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InternalFailure);
    assert!(matches!(
        err.operation_error(),
        Some(OperationError::Store(StoreError::Query(_)))
    ));
    ledger.snapshot(|l| {
        assert_eq!(l.opened.len(), 2);
        assert_eq!(l.closed, 2);
        assert_eq!(l.failed, 2);
        assert_eq!(l.errors, 1);
        assert_eq!(l.warnings, 0);
    });
}

#[tokio::test]
async fn test_upsert_of_unknown_id_reports_no_match() {
    let (executor, _ledger) = executor_with(Arc::new(MemoryStore::new()));
    let id = uuid::Uuid::new_v4();
    let raw = RawRequest::from_body(valid_recipe_json().to_string()).with_param("id", id.to_string());

    let err = executor
        .execute(operations::upsert_by_id_request(raw))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InternalFailure);
    assert!(matches!(err.operation_error(), Some(OperationError::NoMatch(missing)) if *missing == id));
    assert_eq!(err.not_found_on_miss().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_title_lookup_through_the_pipeline() {
    let store = Arc::new(MemoryStore::new());
    let (executor, _ledger) = executor_with(store.clone());
    executor
        .execute(operations::save_request(RawRequest::from_body(
            valid_recipe_json().to_string(),
        )))
        .await
        .unwrap();

    let found = executor
        .execute(operations::find_by_title_request(RawRequest::from_params([(
            "title", "Pate",
        )])))
        .await
        .unwrap();
    assert_eq!(found.name, "Pate tomates basilic");

    let err = executor
        .execute(operations::find_by_title_request(RawRequest::from_params([(
            "title", "zzz",
        )])))
        .await
        .unwrap_err();
    assert_eq!(err.not_found_on_miss().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_result_is_independent_of_operation_buffer() {
    let (executor, _ledger) = executor_with(Arc::new(MemoryStore::new()));
    let buffer = Arc::new(Recipe {
        name: "Mousse au chocolat".to_string(),
        ..Default::default()
    });
    let held = Arc::clone(&buffer);
    let descriptor = RequestDescriptor::without_payload(
        names::FIND_BY_ID,
        move |_ctx: OperationContext, _: ()| async move { Ok::<_, OperationError>(held) },
    );

    let mut result = executor.execute(descriptor).await.unwrap();
    result.name.push_str(" maison");

    assert_eq!(result.name, "Mousse au chocolat maison");
    assert_eq!(buffer.name, "Mousse au chocolat");
}

#[tokio::test]
async fn test_store_is_shared_with_the_executor() {
    let store = Arc::new(MemoryStore::new());
    let (executor, _ledger) = executor_with(store.clone());
    assert_eq!(executor.store().backend_name(), store.backend_name());
}
