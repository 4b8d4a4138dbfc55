mod common;

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use common::{edit, fixed_clock, key_at, session, temp_base};
use formset_core::{
    form::{Field, FormKind},
    lookup::{
        cache::CACHE_KEY, CacheStatus, CatalogCache, CatalogSource, HttpCatalog, LookupService,
        LookupStrategy,
    },
    FormError,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct CatalogState {
    searches: Arc<AtomicUsize>,
}

fn items() -> Vec<Value> {
    vec![
        json!({"code": "ITM-001", "name": "Steel Bolt", "uom": "Pcs", "stock": "40.00", "unit_price": "25.00"}),
        json!({"code": "ITM-002", "name": "Copper Wire", "uom": "m", "stock": 120, "unit_price": 3.5}),
    ]
}

async fn search(
    State(state): State<CatalogState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.searches.fetch_add(1, Ordering::SeqCst);
    let query = params.get("query").map(|q| q.to_lowercase()).unwrap_or_default();
    let hits: Vec<Value> = items()
        .into_iter()
        .filter(|item| {
            query.is_empty()
                || item["code"].as_str().unwrap_or("").to_lowercase().contains(&query)
                || item["name"].as_str().unwrap_or("").to_lowercase().contains(&query)
        })
        .collect();
    Json(json!({ "items": hits }))
}

async fn by_code(Path(code): Path<String>) -> impl IntoResponse {
    match items().into_iter().find(|item| item["code"] == code.as_str()) {
        Some(item) => (StatusCode::OK, Json(item)).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "Item not found"}))).into_response(),
    }
}

async fn bom_details(
    Path(bom_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    if bom_id != "7" {
        return Json(json!({"success": false, "error": "BOM not found"}));
    }
    let planned: f64 = params
        .get("planned_quantity")
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1.0);
    Json(json!({
        "success": true,
        "product_id": 31,
        "components": [
            {"item_code": "ITM-001", "item_name": "Steel Bolt", "quantity": 4.0 * planned},
            {"item_code": "ITM-002", "item_name": "Copper Wire", "quantity": "2.5"}
        ]
    }))
}

async fn spawn_catalog_server() -> (String, CatalogState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let state = CatalogState::default();
    let app = Router::new()
        .route("/inventory/api/items/search/", get(search))
        .route("/inventory/api/items/by-code/:code/", get(by_code))
        .route("/production/api/bom/:bom_id/details/", get(bom_details))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

fn lookup_service(base_url: &str, strategy: LookupStrategy) -> LookupService {
    let catalog = HttpCatalog::new(base_url, "inventory").expect("catalog client");
    LookupService::with_clock(
        Arc::new(catalog),
        strategy,
        CatalogCache::in_dir(&temp_base(), CACHE_KEY, 30),
        fixed_clock(),
    )
}

#[tokio::test]
async fn one_character_queries_never_hit_the_server() {
    let (base_url, state) = spawn_catalog_server().await;
    let lookup = lookup_service(&base_url, LookupStrategy::Remote);

    assert!(lookup.search("b").await.items.is_empty());
    assert_eq!(state.searches.load(Ordering::SeqCst), 0);

    let outcome = lookup.search("bo").await;
    assert_eq!(state.searches.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.items[0].unit_price, "25.00");
}

#[tokio::test]
async fn cached_catalog_is_fetched_once_and_persisted() {
    let (base_url, state) = spawn_catalog_server().await;
    let base = temp_base();
    let catalog = HttpCatalog::new(&base_url, "inventory").unwrap();
    let lookup = LookupService::with_clock(
        Arc::new(catalog),
        LookupStrategy::CachedCatalog,
        CatalogCache::in_dir(&base, CACHE_KEY, 30),
        fixed_clock(),
    );

    let wire = lookup.search("WIRE").await;
    let bolt = lookup.search("bolt").await;
    assert_eq!(state.searches.load(Ordering::SeqCst), 1);
    assert_eq!(wire.items[0].stock, "120");
    assert_eq!(bolt.items[0].code, "ITM-001");
    assert_eq!(lookup.status().await, Some(CacheStatus::Fresh { age_minutes: 0 }));
    assert!(base.join("cache").join("inventory_items_cache.json").exists());

    assert_eq!(lookup.refresh().await, CacheStatus::Fresh { age_minutes: 0 });
    assert_eq!(state.searches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn by_code_maps_not_found_to_none() {
    let (base_url, _) = spawn_catalog_server().await;
    let catalog = HttpCatalog::new(&base_url, "inventory").unwrap();
    assert_eq!(catalog.by_code("ITM-404").await.unwrap(), None);
    let item = catalog.by_code("ITM-002").await.unwrap().unwrap();
    assert_eq!(item.unit_price, "3.5");
}

#[tokio::test]
async fn typed_item_codes_are_resolved_into_the_row() {
    let (base_url, _) = spawn_catalog_server().await;
    let lookup = lookup_service(&base_url, LookupStrategy::Remote);
    let mut session = session(FormKind::LineItems);
    let key = key_at(&session, 0);

    edit(&mut session, key, Field::ItemCode, "ITM-001");
    assert!(session.resolve_item_code(&lookup, key).await);
    let row = session.store().get(key).unwrap();
    assert_eq!(row.field(&Field::ItemName), "Steel Bolt");
    assert_eq!(row.field(&Field::Quantity), "1");
    assert_eq!(row.line_total(), 25.0);

    edit(&mut session, key, Field::ItemCode, "NOPE");
    assert!(session.resolve_item_code(&lookup, key).await);
    let row = session.store().get(key).unwrap();
    assert_eq!(row.field(&Field::ItemName), "");
    assert_eq!(row.field(&Field::Stock), "");
}

#[tokio::test]
async fn bom_components_replace_the_rows() {
    let (base_url, _) = spawn_catalog_server().await;
    let lookup = lookup_service(&base_url, LookupStrategy::Remote);
    let mut session = session(FormKind::BillOfMaterials);
    let key = key_at(&session, 0);
    edit(&mut session, key, Field::ItemCode, "OLD");

    let keys = session.load_bom(&lookup, "7", 2.0).await.unwrap();
    assert_eq!(keys.len(), 2);
    let rows: Vec<(&str, &str)> = session
        .store()
        .visible_rows()
        .map(|row| (row.field(&Field::ItemCode), row.field(&Field::Quantity)))
        .collect();
    assert_eq!(rows, vec![("ITM-001", "8.0"), ("ITM-002", "2.5")]);

    match session.load_bom(&lookup, "99", 1.0).await {
        Err(FormError::Lookup(message)) => assert_eq!(message, "BOM not found"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(session.store().visible_count(), 2);
}

#[tokio::test]
async fn unreachable_server_degrades_to_an_error_status() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let lookup = lookup_service(&format!("http://{addr}"), LookupStrategy::CachedCatalog);
    let outcome = lookup.search("bolt").await;
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.status, Some(CacheStatus::Unavailable));
    assert_eq!(outcome.status.unwrap().to_string(), "Error fetching data");
}

#[tokio::test]
async fn failed_item_lookup_releases_the_row() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let lookup = lookup_service(&format!("http://{addr}"), LookupStrategy::Remote);
    let mut session = session(FormKind::LineItems);
    let key = key_at(&session, 0);
    let ticket = session
        .on_field_edited(formset_core::view::ViewKind::Desktop, key, Field::ItemCode, "ITM-001")
        .unwrap()
        .unwrap();

    assert!(!session.resolve_item_code(&lookup, key).await);
    let row = session.store().get(key).unwrap();
    assert_eq!(row.field(&Field::ItemCode), "ITM-001");
    assert_eq!(row.field(&Field::ItemName), "");
    let late = formset_core::lookup::CatalogItem::new("ITM-001", "Steel Bolt");
    assert!(!session.complete_lookup(ticket, Some(&late)));
}
