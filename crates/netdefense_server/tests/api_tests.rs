//! HTTP API tests driving the router directly.

use std::collections::BTreeMap;
use std::sync::RwLock;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use netdefense_core::engine::GameEngine;
use netdefense_core::catalog::BuildingTypeId;
use netdefense_core::grid::{Tile, TilePos, TileStatus};
use netdefense_core::incidents::SecurityIncident;
use netdefense_core::player::{Inventory, PlayerProfile, PlayerState};
use netdefense_core::topology::ConnectionSet;
use netdefense_server::api::build_router;
use netdefense_server::session::{PlayerId, PLAYER_HEADER};
use netdefense_server::store::{StoreError, Versioned};
use netdefense_server::{GameService, MemoryStore, PlayerStore};
use serde::Serialize;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    build_router(GameService::new(
        GameEngine::default(),
        MemoryStore::new(),
        Some(42),
    ))
}

fn at(x: u32, y: u32) -> Value {
    json!({ "x": x, "y": y })
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    player: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(player) = player {
        builder = builder.header(PLAYER_HEADER, player);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call(app, Method::POST, uri, Some("alice"), Some(body)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    call(app, Method::GET, uri, Some("alice"), None).await
}

async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    call(app, Method::DELETE, uri, Some("alice"), None).await
}

async fn unlock(app: &Router, x: u32, y: u32) -> (StatusCode, Value) {
    post(app, "/api/tiles/unlock", json!({ "position": at(x, y) })).await
}

async fn place(app: &Router, id: u32, x: u32, y: u32) -> (StatusCode, Value) {
    let body = json!({ "buildingId": id, "position": at(x, y) });
    post(app, "/api/buildings", body).await
}

async fn connect(app: &Router, uri: &str, from: Value, to: Value) -> (StatusCode, Value) {
    post(app, uri, json!({ "from": from, "to": to })).await
}

/// Unlock and place devices for "alice".
async fn build(app: &Router, devices: &[(u32, u32, u32)]) {
    for &(x, y, id) in devices {
        let (status, _) = unlock(app, x, y).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = place(app, id, x, y).await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
}

#[tokio::test]
async fn health_needs_no_player() {
    let app = app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_player_is_unauthorized() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/map", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn new_player_map_has_castle() {
    let app = app();
    let (status, map) = get(&app, "/api/map").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(map.as_array().unwrap().len(), 20);
    assert_eq!(map[1][1]["type"], "castle");
    assert_eq!(map[1][1]["status"], "developed");
    assert_eq!(map[5][5]["type"], "land");
    assert_eq!(map[5][5]["status"], "locked");
}

#[tokio::test]
async fn catalog_lists_builtin_types() {
    let app = app();
    let (status, catalog) = get(&app, "/api/catalog").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = catalog
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap().to_string())
        .collect();
    assert!(names.contains(&"Switch".to_string()));
    assert_eq!(catalog[5]["firewallKind"], "HF");
}

#[tokio::test]
async fn place_on_locked_tile_is_rejected() {
    let app = app();
    let (status, body) = place(&app, 1, 5, 5).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "InvalidTransition");
    assert_eq!(
        body["reason"],
        "Cannot place a building on tile (5, 5): tile is locked"
    );
}

#[tokio::test]
async fn unlock_and_place_charges_currency() {
    let app = app();
    let (status, outcome) = unlock(&app, 5, 5).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["map"][5][5]["status"], "developed");
    assert!(outcome.get("triggeredEvent").is_some());

    let (status, placed) = place(&app, 1, 5, 5).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(placed["currency"], 500 - 20 - 50);
    assert_eq!(placed["map"][5][5]["buildingId"], 1);

    let (_, player) = get(&app, "/api/player").await;
    assert_eq!(player["currency"], 430);
    assert_eq!(player["developedCount"], 1);
}

#[tokio::test]
async fn unlock_castle_is_protected() {
    let app = app();
    let (status, body) = unlock(&app, 0, 0).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "ProtectedZone");
}

#[tokio::test]
async fn unknown_tile_is_not_found() {
    let app = app();
    let (status, body) = unlock(&app, 40, 0).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "TileNotFound");
}

#[tokio::test]
async fn connection_lifecycle() {
    let app = app();
    build(&app, &[(5, 5, 1), (6, 6, 3), (7, 7, 3)]).await;

    let (status, check) = connect(&app, "/api/connections/check", at(5, 5), at(6, 6)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["valid"], true);

    let (status, link) = connect(&app, "/api/connections", at(5, 5), at(6, 6)).await;
    assert_eq!(status, StatusCode::OK);
    let id = link["id"].as_u64().unwrap();

    let (status, body) = connect(&app, "/api/connections", at(5, 5), at(7, 7)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "CapacityExceeded");

    let (_, listed) = get(&app, "/api/connections?x=6&y=6").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (_, network) = get(&app, "/api/network").await;
    assert_eq!(network["hosts"][0]["connections"], 1);
    assert_eq!(network["switches"].as_array().unwrap().len(), 2);

    let uri = format!("/api/connections/{id}");
    let (status, deleted) = delete(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted"]["id"], id);

    let (status, body) = delete(&app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "ConnectionNotFound");
}

#[tokio::test]
async fn removing_building_cascades_over_http() {
    let app = app();
    build(&app, &[(5, 5, 1), (6, 6, 3)]).await;
    connect(&app, "/api/connections", at(5, 5), at(6, 6)).await;

    let body = json!({ "position": at(6, 6) });
    let (status, outcome) =
        call(&app, Method::DELETE, "/api/buildings", Some("alice"), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["removedConnections"].as_array().unwrap().len(), 1);

    let (_, listed) = get(&app, "/api/connections").await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn waf_is_singleton() {
    let app = app();
    let waf = |x, y| json!({ "firewallTypeId": 103, "position": at(x, y) });

    let (status, _) = post(&app, "/api/firewalls", waf(1, 1)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(&app, "/api/firewalls", waf(2, 0)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "DuplicateFirewall");
}

#[tokio::test]
async fn insufficient_funds_is_payment_required() {
    let app = app();
    let waf = json!({ "firewallTypeId": 103, "position": at(1, 1) });
    post(&app, "/api/firewalls", waf).await;
    build(&app, &[(5, 5, 4)]).await;
    unlock(&app, 7, 5).await;

    // 500 - 200 - (20 + 150) - 20
    let (_, player) = get(&app, "/api/player").await;
    assert_eq!(player["currency"], 110);

    let (status, body) = place(&app, 4, 7, 5).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"], "InsufficientFunds");
}

#[tokio::test]
async fn rewards_and_inventory() {
    let app = app();
    let grant = json!({ "type": "grantCurrency", "amount": 40 });
    let (status, player) = post(&app, "/api/rewards", grant).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(player["currency"], 540);

    let item = json!({ "type": "grantItem", "item": "patch", "count": 2 });
    post(&app, "/api/rewards", item).await;
    let answer = json!({ "type": "quizAnswered", "correct": true });
    let (_, player) = post(&app, "/api/rewards", answer).await;
    assert_eq!(player["defenseScore"], 1);
    assert_eq!(player["answeredCount"], 1);
    assert_eq!(player["inventory"]["patch"], 2);

    let spend = |count| json!({ "item": "patch", "count": count });
    let (status, inventory) = post(&app, "/api/inventory/consume", spend(2)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(inventory.as_object().unwrap().is_empty());

    let (status, body) = post(&app, "/api/inventory/consume", spend(1)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"], "InsufficientItems");
}

#[tokio::test]
async fn incidents_from_edge_unlocks_can_be_dismissed() {
    let app = app();
    let grant = json!({ "type": "grantCurrency", "amount": 1000 });
    post(&app, "/api/rewards", grant).await;
    for y in 5..20 {
        unlock(&app, 19, y).await;
    }

    let (status, incidents) = get(&app, "/api/incidents").await;
    assert_eq!(status, StatusCode::OK);
    let first = &incidents.as_array().unwrap()[0];
    assert_eq!(first["position"]["x"], 19);
    let id = first["id"].as_u64().unwrap();

    let uri = format!("/api/incidents/{id}");
    let (status, _) = delete(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = delete(&app, &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "IncidentNotFound");
}

#[tokio::test]
async fn players_are_isolated() {
    let app = app();
    unlock(&app, 5, 5).await;

    let (_, bob_map) = call(&app, Method::GET, "/api/map", Some("bob"), None).await;
    assert_eq!(bob_map[5][5]["status"], "locked");
}

// ============================================================================
// Stored documents written by another writer
// ============================================================================

/// Byte layout of a stored player document, written without any repair.
#[derive(Serialize)]
struct RawPlayer {
    profile: PlayerProfile,
    grid: RawGrid,
    connections: ConnectionSet,
    inventory: Inventory,
    incidents: Vec<SecurityIncident>,
}

#[derive(Serialize)]
struct RawGrid {
    size: u32,
    castle_extent: u32,
    tiles: BTreeMap<String, Tile>,
}

/// A store serving one fixed bincode document to every player.
struct RawStore {
    document: RwLock<Vec<u8>>,
}

impl PlayerStore for RawStore {
    fn load(&self, _player: &PlayerId) -> Result<Option<Versioned<PlayerState>>, StoreError> {
        let value = bincode::deserialize(&self.document.read().unwrap())?;
        Ok(Some(Versioned { revision: 1, value }))
    }

    fn save(
        &self,
        _player: &PlayerId,
        state: &PlayerState,
        _expected: u64,
    ) -> Result<u64, StoreError> {
        *self.document.write().unwrap() = bincode::serialize(state)?;
        Ok(2)
    }
}

#[tokio::test]
async fn corrupted_castle_is_repaired_when_served() {
    let engine = GameEngine::default();
    let pos = TilePos::new;

    let mut placed = Tile::locked(pos(5, 5));
    placed.status = TileStatus::Placed;
    placed.building_id = Some(BuildingTypeId(1));

    let tiles: BTreeMap<String, Tile> = [
        Tile::locked(pos(0, 0)),
        Tile::locked(pos(1, 1)),
        Tile::locked(pos(2, 2)),
        placed,
    ]
    .into_iter()
    .map(|tile| (format!("{}_{}", tile.x, tile.y), tile))
    .collect();

    let raw = RawPlayer {
        profile: engine.new_player().profile,
        grid: RawGrid {
            size: 20,
            castle_extent: 3,
            tiles,
        },
        connections: ConnectionSet::new(),
        inventory: Inventory::default(),
        incidents: Vec::new(),
    };
    let store = RawStore {
        document: RwLock::new(bincode::serialize(&raw).unwrap()),
    };
    let app = build_router(GameService::new(engine, store, Some(1)));

    let (status, map) = get(&app, "/api/map").await;
    assert_eq!(status, StatusCode::OK);
    for (x, y) in [(0usize, 0usize), (1, 1), (2, 2)] {
        assert_eq!(map[y][x]["type"], "castle", "tile ({x}, {y})");
        assert_eq!(map[y][x]["status"], "developed", "tile ({x}, {y})");
    }
    assert_eq!(map[5][5]["status"], "placed");
    assert_eq!(map[5][5]["buildingId"], 1);

    // The repaired castle is still protected.
    let (status, body) = unlock(&app, 1, 1).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "ProtectedZone");
}
