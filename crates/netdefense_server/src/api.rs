//! JSON API routes.
//!
//! Handlers are thin: extract the player, run one service call, and
//! serialize the result. All bodies are camelCase JSON.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use netdefense_core::catalog::{BuildingType, BuildingTypeId};
use netdefense_core::engine::{RemovalOutcome, UnlockOutcome};
use netdefense_core::grid::{MapView, TilePos};
use netdefense_core::incidents::SecurityIncident;
use netdefense_core::player::{Inventory, PlayerProfile, RewardEvent};
use netdefense_core::topology::{Connection, ConnectionId, ConnectionVerdict, NetworkSnapshot};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::service::GameService;
use crate::session::PlayerId;
use crate::store::PlayerStore;

type AppState<S> = State<Arc<GameService<S>>>;
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build the API router over a service.
pub fn build_router<S: PlayerStore>(service: GameService<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/catalog", get(catalog::<S>))
        .route("/api/player", get(player::<S>))
        .route("/api/map", get(map::<S>))
        .route(
            "/api/buildings",
            post(place_building::<S>).delete(remove_building::<S>),
        )
        .route("/api/firewalls", post(place_firewall::<S>))
        .route("/api/tiles/unlock", post(unlock_tile::<S>))
        .route(
            "/api/connections",
            get(list_connections::<S>).post(add_connection::<S>),
        )
        .route("/api/connections/check", post(check_connection::<S>))
        .route("/api/connections/{id}", delete(remove_connection::<S>))
        .route("/api/network", get(network::<S>))
        .route("/api/rewards", post(apply_reward::<S>))
        .route("/api/inventory/consume", post(consume_item::<S>))
        .route("/api/incidents", get(incidents::<S>))
        .route("/api/incidents/{id}", delete(dismiss_incident::<S>))
        .with_state(Arc::new(service))
}

// ============================================================================
// Bodies
// ============================================================================

/// Request naming a single tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRequest {
    /// Target tile.
    pub position: TilePos,
}

/// Request to place a building.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBuildingRequest {
    /// Building type to place.
    pub building_id: BuildingTypeId,
    /// Target tile.
    pub position: TilePos,
}

/// Request to attach a firewall.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceFirewallRequest {
    /// Firewall building type.
    pub firewall_type_id: BuildingTypeId,
    /// Target tile.
    pub position: TilePos,
}

/// Request naming two endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    /// First endpoint.
    pub from: TilePos,
    /// Second endpoint.
    pub to: TilePos,
}

/// Request to spend inventory items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumeRequest {
    /// Item identifier.
    pub item: String,
    /// Number to spend.
    pub count: u32,
}

/// Optional endpoint filter for listing connections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionFilter {
    /// Column of the endpoint.
    pub x: Option<u32>,
    /// Row of the endpoint.
    pub y: Option<u32>,
}

/// Player document as returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    /// Player counters.
    #[serde(flatten)]
    pub profile: PlayerProfile,
    /// Held items.
    pub inventory: Inventory,
    /// Open incidents.
    pub incidents: Vec<SecurityIncident>,
}

/// Map plus the balance after a change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapResponse {
    /// Map, `map[y][x]`.
    pub map: MapView,
    /// Currency after the change.
    pub currency: u32,
}

/// Result of a delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deleted<T> {
    /// Always true.
    pub ok: bool,
    /// The deleted record.
    pub deleted: T,
}

impl<T> Deleted<T> {
    fn new(deleted: T) -> Self {
        Self { ok: true, deleted }
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

async fn catalog<S: PlayerStore>(State(svc): AppState<S>) -> Json<Vec<BuildingType>> {
    Json(svc.engine().catalog().iter().cloned().collect())
}

async fn player<S: PlayerStore>(State(svc): AppState<S>, id: PlayerId) -> ApiResult<PlayerView> {
    let state = svc.read(&id)?;
    Ok(Json(PlayerView {
        profile: state.profile,
        inventory: state.inventory,
        incidents: state.incidents,
    }))
}

async fn map<S: PlayerStore>(State(svc): AppState<S>, id: PlayerId) -> ApiResult<MapView> {
    let state = svc.read(&id)?;
    Ok(Json(svc.engine().map_view(&state)))
}

async fn place_building<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
    Json(req): Json<PlaceBuildingRequest>,
) -> ApiResult<MapResponse> {
    let response = svc.update(&id, |turn, state| {
        let map = turn
            .engine
            .place_building(state, req.building_id, req.position)?;
        Ok(MapResponse {
            map,
            currency: state.profile.currency,
        })
    })?;
    Ok(Json(response))
}

async fn remove_building<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
    Json(req): Json<PositionRequest>,
) -> ApiResult<RemovalOutcome> {
    let outcome = svc.update(&id, |turn, state| {
        turn.engine.remove_building(state, req.position)
    })?;
    Ok(Json(outcome))
}

async fn place_firewall<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
    Json(req): Json<PlaceFirewallRequest>,
) -> ApiResult<MapResponse> {
    let response = svc.update(&id, |turn, state| {
        let map = turn
            .engine
            .place_firewall(state, req.firewall_type_id, req.position)?;
        Ok(MapResponse {
            map,
            currency: state.profile.currency,
        })
    })?;
    Ok(Json(response))
}

async fn unlock_tile<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
    Json(req): Json<PositionRequest>,
) -> ApiResult<UnlockOutcome> {
    let outcome = svc.update(&id, |turn, state| {
        turn.engine
            .unlock_tile(state, req.position, turn.rng, turn.now_ms)
    })?;
    Ok(Json(outcome))
}

async fn list_connections<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
    Query(filter): Query<ConnectionFilter>,
) -> ApiResult<Vec<Connection>> {
    let state = svc.read(&id)?;
    let connections = match (filter.x, filter.y) {
        (Some(x), Some(y)) => svc.engine().connections_of(&state, TilePos::new(x, y)),
        _ => state.connections.iter().copied().collect(),
    };
    Ok(Json(connections))
}

async fn add_connection<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
    Json(req): Json<ConnectionRequest>,
) -> ApiResult<Connection> {
    let connection = svc.update(&id, |turn, state| {
        turn.engine.add_connection(state, req.from, req.to)
    })?;
    Ok(Json(connection))
}

async fn check_connection<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
    Json(req): Json<ConnectionRequest>,
) -> ApiResult<ConnectionVerdict> {
    let state = svc.read(&id)?;
    Ok(Json(svc.engine().check_connection(&state, req.from, req.to)))
}

async fn remove_connection<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
    Path(connection): Path<u64>,
) -> ApiResult<Deleted<Connection>> {
    let removed = svc.update(&id, |turn, state| {
        turn.engine
            .remove_connection(state, ConnectionId(connection))
    })?;
    Ok(Json(Deleted::new(removed)))
}

async fn network<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
) -> ApiResult<NetworkSnapshot> {
    let state = svc.read(&id)?;
    Ok(Json(svc.engine().network_snapshot(&state)))
}

async fn apply_reward<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
    Json(event): Json<RewardEvent>,
) -> ApiResult<PlayerView> {
    let view = svc.update(&id, |turn, state| {
        turn.engine.apply_reward(state, &event);
        Ok(PlayerView {
            profile: state.profile,
            inventory: state.inventory.clone(),
            incidents: state.incidents.clone(),
        })
    })?;
    Ok(Json(view))
}

async fn consume_item<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
    Json(req): Json<ConsumeRequest>,
) -> ApiResult<Inventory> {
    let inventory = svc.update(&id, |turn, state| {
        turn.engine.consume_item(state, &req.item, req.count)?;
        Ok(state.inventory.clone())
    })?;
    Ok(Json(inventory))
}

async fn incidents<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
) -> ApiResult<Vec<SecurityIncident>> {
    Ok(Json(svc.read(&id)?.incidents))
}

async fn dismiss_incident<S: PlayerStore>(
    State(svc): AppState<S>,
    id: PlayerId,
    Path(incident): Path<u64>,
) -> ApiResult<Deleted<SecurityIncident>> {
    let dismissed = svc.update(&id, |turn, state| {
        turn.engine.dismiss_incident(state, incident)
    })?;
    Ok(Json(Deleted::new(dismissed)))
}
