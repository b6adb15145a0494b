//! Drives a synthetic page through a full loader lifecycle: environment
//! scanning, lazy data activation, element fan-out, and a reload with
//! memoized skips.

use anyhow::Result;
use bootlace::events::{UnitLoaded, UnitSkipped};
use bootlace::prelude::*;
use bootlace::{ElementId, FeatureDef};
use bootlace_logger::{LevelFilter, Logger};
use serde_json::json;
use tracing::info;

fn main() -> Result<()> {
    let _log = Logger::builder().name(env!("CARGO_PKG_NAME")).level(LevelFilter::DEBUG).init()?;

    let runtime = bootlace_runtime::build_interactive_runtime()?;
    runtime.block_on(run())
}

fn build_page() -> (Page, ElementId) {
    let page = Page::new();
    page.set_attribute(page.root(), "data-env-locale", "en");
    page.set_attribute(page.root(), "data-env-user", "ada");

    let list = page.append_child(page.root(), "ul");
    for label in ["alpha", "beta", "gamma"] {
        let item = page.append_child(list, "li");
        page.add_class(item, "item");
        page.set_attribute(item, "data-label", label);
    }
    (page, list)
}

async fn run() -> Result<()> {
    let (page, _) = build_page();
    let app = App::new();

    app.scan_environment_attributes(&page, page.root())?;

    // Lazy translations provider, activated only because `greeting` needs it.
    app.register_data(
        DataDef::new(
            "translations",
            async_action(|invocation| {
                let locale = invocation.arg(0).clone();
                async move {
                    let greeting = if locale == json!("uk") { "Привіт" } else { "Hello" };
                    Ok(json!({ "greeting": greeting }))
                }
            }),
        )
        .depends(["locale"]),
    )?;

    app.register_feature(
        FeatureDef::new(
            "greeting",
            sync_action(|invocation| {
                let user = invocation.arg(1).as_str().unwrap_or("stranger").to_owned();
                let greeting = invocation.arg(0)["greeting"].as_str().unwrap_or("Hello");
                info!(%user, %greeting, "Greeting rendered");
                Ok(Value::Bool(true))
            }),
        )
        .depends(["translations", "user"]),
    )?;

    // Reload-set member whose effective arguments never change: the memo
    // cache skips its re-invocation on locale switches.
    app.register_feature(
        FeatureDef::new(
            "footer",
            sync_action(|_| {
                info!("Footer rendered");
                Ok(Value::Bool(true))
            }),
        )
        .depends(["locale"])
        .serialize_args(|_| Value::Null),
    )?;

    // Element fan-out: runs once per `.item` element on the page.
    app.register_feature(
        FeatureDef::new(
            "highlight",
            sync_action(|invocation| {
                let element = invocation.element.as_ref().expect("element-bound feature");
                let label = element.attribute("data-label").unwrap_or_default();
                info!(element = %element.token(), %label, "Item highlighted");
                Ok(Value::Bool(true))
            }),
        )
        .elements("item"),
    )?;

    let mut loaded = app.events().subscribe::<UnitLoaded>()?;
    let mut skipped = app.events().subscribe::<UnitSkipped>()?;

    app.load(Some(LoadContext::from(page.clone()))).await;

    while let Ok(event) = loaded.try_recv() {
        info!(unit = %event.unit, deferred = event.deferred, "Unit loaded");
    }

    // Switching the locale reloads its dependents; `highlight` ignores the
    // locale entirely and is untouched.
    info!("Switching locale to uk");
    app.register_environment_nullable("locale", json!("uk"))?;
    app.settle().await;

    while let Ok(event) = loaded.try_recv() {
        info!(unit = %event.unit, "Unit reloaded");
    }
    while let Ok(event) = skipped.try_recv() {
        info!(unit = %event.unit, "Unit skipped (arguments unchanged)");
    }

    let closed = app.shutdown();
    info!(channels = closed, "Showcase complete");
    Ok(())
}
