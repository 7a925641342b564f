//! Pointer and wheel handlers, all in canvas pixels

use crate::draw::geometry::Point;
use crate::server::protocol::{error_codes, Response};
use crate::server::state::ServerState;
use serde::Deserialize;

#[derive(Deserialize)]
struct PointerParams {
    x: f64,
    y: f64,
    #[serde(default)]
    time_ms: f64,
}

fn pointer_params(params: Option<serde_json::Value>) -> Option<PointerParams> {
    params.and_then(|p| serde_json::from_value(p).ok())
}

fn invalid(id: Option<serde_json::Value>) -> Response {
    Response::error(id, error_codes::INVALID_PARAMS, "Invalid params: expected {x, y}".to_string())
}

fn interaction_result(state: &ServerState, id: Option<serde_json::Value>) -> Response {
    match serde_json::to_value(state.map.interaction()) {
        Ok(v) => Response::success(id, v),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

pub fn handle_pointer_down(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    let Some(p) = pointer_params(params) else { return invalid(id) };
    state.map.pointer_down(Point::new(p.x, p.y));
    interaction_result(state, id)
}

pub fn handle_pointer_move(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    let Some(p) = pointer_params(params) else { return invalid(id) };
    state.map.pointer_move(Point::new(p.x, p.y));
    interaction_result(state, id)
}

pub fn handle_pointer_up(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    let Some(p) = pointer_params(params) else { return invalid(id) };
    state.map.pointer_up(Point::new(p.x, p.y), p.time_ms);
    interaction_result(state, id)
}

pub fn handle_pointer_leave(state: &mut ServerState, id: Option<serde_json::Value>) -> Response {
    state.map.pointer_leave();
    interaction_result(state, id)
}

pub fn handle_wheel(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct WheelParams {
        x: f64,
        y: f64,
        delta_y: f64,
    }

    let params: WheelParams = match params.and_then(|p| serde_json::from_value(p).ok()) {
        Some(p) => p,
        None => {
            return Response::error(id, error_codes::INVALID_PARAMS,
                "Invalid params: expected {x, y, delta_y}".to_string());
        }
    };

    state.map.wheel(Point::new(params.x, params.y), params.delta_y);
    match serde_json::to_value(state.map.transform()) {
        Ok(t) => Response::success(id, t),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}
