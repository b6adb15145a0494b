use bootlace::FeatureDef;
use bootlace::events::{UnitError, UnitLoaded, UnitLoading, UnitSkipped};
use bootlace::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::Receiver;

fn drain<T: Send + Sync + 'static>(rx: &mut Receiver<Arc<T>>) -> Vec<Arc<T>> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn environment_value_reaches_feature() {
    let app = App::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    app.register_environment("answer", Some(json!(42))).unwrap();
    let seen_in = seen.clone();
    app.register_feature(
        FeatureDef::new(
            "greet",
            sync_action(move |invocation| {
                seen_in.lock().unwrap().push(invocation.arg(0).clone());
                Ok(Value::Bool(true))
            }),
        )
        .depends(["answer"]),
    )
    .unwrap();

    app.load(None).await;

    assert_eq!(*seen.lock().unwrap(), vec![json!(42)]);
}

#[tokio::test]
async fn absent_environment_value_is_a_no_op() {
    let app = App::new();
    app.register_environment("ghost", None).unwrap();
    app.register_environment("null-ghost", Some(Value::Null)).unwrap();
    assert!(app.snapshot("ghost").is_none());
    assert!(app.snapshot("null-ghost").is_none());

    // The nullable form records even Null.
    app.register_environment_nullable("present", Value::Null).unwrap();
    assert!(app.snapshot("present").is_some());
}

#[tokio::test]
async fn element_feature_retries_after_page_growth() {
    let app = App::new();
    let page = Page::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let seen_in = seen.clone();
    app.register_feature(
        FeatureDef::new(
            "decorate",
            sync_action(move |invocation| {
                let element = invocation.element.as_ref().expect("element prepended");
                seen_in.lock().unwrap().push(element.token());
                Ok(Value::Bool(true))
            }),
        )
        .elements("item"),
    )
    .unwrap();

    app.load(Some(LoadContext::from(page.clone()))).await;
    assert!(seen.lock().unwrap().is_empty(), "no matching element, no invocation");

    let item = page.append_child(page.root(), "li");
    page.add_class(item, "item");
    app.retry_pending().await;

    assert_eq!(*seen.lock().unwrap(), vec![item.token()]);
}

#[tokio::test]
async fn late_registered_dependent_activates_lazy_data() {
    let app = App::new();
    let data_calls = Arc::new(AtomicUsize::new(0));

    let calls_in = data_calls.clone();
    app.register_data(DataDef::new(
        "settings",
        sync_action(move |_| {
            calls_in.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "volume": 11 }))
        }),
    ))
    .unwrap();

    app.load(None).await;
    assert_eq!(data_calls.load(Ordering::SeqCst), 0);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in = seen.clone();
    app.register_feature(
        FeatureDef::new(
            "mixer",
            sync_action(move |invocation| {
                seen_in.lock().unwrap().push(invocation.arg(0).clone());
                Ok(Value::Bool(true))
            }),
        )
        .depends(["settings"]),
    )
    .unwrap();
    app.settle().await;

    assert_eq!(data_calls.load(Ordering::SeqCst), 1);
    assert_eq!(*seen.lock().unwrap(), vec![json!({ "volume": 11 })]);
}

#[tokio::test]
async fn attribute_scan_seeds_environment_values() {
    let app = App::new();
    let page = Page::new();
    let panel = page.append_child(page.root(), "section");
    page.set_attribute(page.root(), "data-env-locale", "en");
    page.set_attribute(panel, "data-env-retries", "3");

    app.scan_environment_attributes_with(
        &page,
        page.root(),
        "data-env-",
        Some(&|raw| raw.parse::<i64>().map_or_else(|_| Value::String(raw.to_owned()), Value::from)),
    )
    .unwrap();

    assert_eq!(app.result_of("locale"), Some(json!("en")));
    assert_eq!(app.result_of("retries"), Some(json!(3)));
}

#[tokio::test]
async fn reload_only_reinvokes_changed_arguments() {
    let app = App::new();
    let greet_calls = Arc::new(AtomicUsize::new(0));
    let badge_calls = Arc::new(AtomicUsize::new(0));

    app.register_environment("locale", Some(json!("en"))).unwrap();
    app.register_environment("theme", Some(json!("dark"))).unwrap();

    let calls_in = greet_calls.clone();
    app.register_feature(
        FeatureDef::new(
            "greet",
            sync_action(move |_| {
                calls_in.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Bool(true))
            }),
        )
        .depends(["locale"]),
    )
    .unwrap();
    let calls_in = badge_calls.clone();
    app.register_feature(
        FeatureDef::new(
            "badge",
            sync_action(move |_| {
                calls_in.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Bool(true))
            }),
        )
        .depends(["theme"]),
    )
    .unwrap();

    app.load(None).await;
    app.register_environment_nullable("locale", json!("uk")).unwrap();
    app.settle().await;

    assert_eq!(greet_calls.load(Ordering::SeqCst), 2, "locale dependent re-invoked");
    assert_eq!(badge_calls.load(Ordering::SeqCst), 1, "theme dependent untouched");
}

#[tokio::test]
async fn reloading_flag_is_visible_on_loading_events() {
    let app = App::new();
    app.register_environment("locale", Some(json!("en"))).unwrap();
    app.register_feature(
        FeatureDef::new("greet", sync_action(|_| Ok(Value::Bool(true)))).depends(["locale"]),
    )
    .unwrap();

    let mut loading = app.events().subscribe::<UnitLoading>().unwrap();
    app.load(None).await;
    let initial = drain(&mut loading);
    assert!(initial.iter().all(|e| !e.reloading));

    app.register_environment_nullable("locale", json!("uk")).unwrap();
    app.settle().await;
    let reloads = drain(&mut loading);
    assert_eq!(reloads.len(), 1);
    assert!(reloads[0].reloading);
}

#[tokio::test]
async fn skip_events_mark_memoized_reloads() {
    let app = App::new();
    let calls = Arc::new(AtomicUsize::new(0));

    app.register_environment("locale", Some(json!("en"))).unwrap();
    let calls_in = calls.clone();
    app.register_feature(
        FeatureDef::new(
            "static-banner",
            sync_action(move |_| {
                calls_in.fetch_add(1, Ordering::SeqCst);
                Ok(Value::Bool(true))
            }),
        )
        .depends(["locale"])
        .serialize_args(|_| json!(null)),
    )
    .unwrap();

    let mut skips = app.events().subscribe::<UnitSkipped>().unwrap();
    app.load(None).await;
    app.register_environment_nullable("locale", json!("uk")).unwrap();
    app.settle().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(drain(&mut skips).len(), 1);
    assert!(app.is_loaded("static-banner"));
}

#[tokio::test]
async fn failing_unit_reports_and_spares_siblings() {
    let app = App::new();

    app.register_feature(FeatureDef::new(
        "broken",
        sync_action(|_| Err(ActionError::new("nope"))),
    ))
    .unwrap();
    app.register_feature(FeatureDef::new("fine", sync_action(|_| Ok(Value::Bool(true)))))
        .unwrap();

    let mut errors = app.events().subscribe::<UnitError>().unwrap();
    let mut loaded = app.events().subscribe::<UnitLoaded>().unwrap();
    app.load(None).await;

    let errors = drain(&mut errors);
    assert_eq!(errors.len(), 1);
    assert_eq!(&*errors[0].unit, "broken");

    let loaded = drain(&mut loaded);
    assert_eq!(loaded.iter().filter(|e| &*e.unit == "fine").count(), 1);
}

#[tokio::test]
async fn deferred_results_flow_between_apps_units() {
    let app = App::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    app.register_data(DataDef::new(
        "remote",
        async_action(|_| async {
            tokio::task::yield_now().await;
            Ok(json!("payload"))
        }),
    ))
    .unwrap();
    let seen_in = seen.clone();
    app.register_feature(
        FeatureDef::new(
            "consumer",
            sync_action(move |invocation| {
                seen_in.lock().unwrap().push(invocation.arg(0).clone());
                Ok(Value::Bool(true))
            }),
        )
        .depends(["remote"]),
    )
    .unwrap();

    app.load(None).await;

    assert_eq!(*seen.lock().unwrap(), vec![json!("payload")]);
}

#[tokio::test]
async fn independent_apps_share_nothing() {
    let first = App::new();
    let second = App::new();

    first.register_environment("answer", Some(json!(1))).unwrap();
    second.register_environment("answer", Some(json!(2))).unwrap();

    assert_eq!(first.result_of("answer"), Some(json!(1)));
    assert_eq!(second.result_of("answer"), Some(json!(2)));
}

#[tokio::test]
async fn shutdown_closes_event_channels() {
    let app = App::new();
    let mut rx = app.events().subscribe::<UnitLoaded>().unwrap();

    assert_eq!(app.shutdown(), 1);
    assert!(rx.recv_event().await.is_none());
}
