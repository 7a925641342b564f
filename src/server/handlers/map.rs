//! Map handlers: Load, Resize, Frame, ResetView, SetTransform

use crate::dataset::RegionDatum;
use crate::render::{frame_to_bytes, RenderStatus};
use crate::server::protocol::{error_codes, Response};
use crate::server::state::ServerState;
use crate::view::ViewportTransform;
use serde::Deserialize;
use std::time::Instant;

/// Handle Load request - replaces the dataset and reads the boundary files it needs
pub fn handle_load(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct LoadParams {
        data: Vec<RegionDatum>,
        width: u32,
        height: u32,
    }

    let params: LoadParams = match params.and_then(|p| serde_json::from_value(p).ok()) {
        Some(p) => p,
        None => {
            return Response::error(id, error_codes::INVALID_PARAMS,
                "Invalid params: expected {data: [{code, value}], width, height}".to_string());
        }
    };

    let start = Instant::now();
    let requests = state.map.render(params.data, params.width, params.height);
    let applied = state.map.load_from_store(state.store.as_ref(), &requests);
    state.data_loaded = true;
    tracing::info!("[Server] Load: {} of {} boundary file(s) applied in {:.2?}",
        applied, requests.len(), start.elapsed());

    match serde_json::to_value(state.map.summary()) {
        Ok(summary) => Response::success(id, summary),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}

/// Handle Resize request
pub fn handle_resize(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct ResizeParams {
        width: u32,
        height: u32,
    }

    let params: ResizeParams = match params.and_then(|p| serde_json::from_value(p).ok()) {
        Some(p) => p,
        None => {
            return Response::error(id, error_codes::INVALID_PARAMS,
                "Invalid params: expected {width, height}".to_string());
        }
    };

    state.map.resize(params.width, params.height);
    Response::success(id, serde_json::json!({ "status": "ok" }))
}

/// Handle Frame request - advances animations and returns the packed draw
/// commands (base64) when anything changed since the previous frame
pub fn handle_frame(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct FrameParams {
        time_ms: f64,
    }

    let params: FrameParams = match params.and_then(|p| serde_json::from_value(p).ok()) {
        Some(p) => p,
        None => {
            return Response::error(id, error_codes::INVALID_PARAMS,
                "Invalid params: expected {time_ms}".to_string());
        }
    };

    let stats = state.map.frame(params.time_ms);
    if let RenderStatus::Failed(message) = state.map.status() {
        return Response::error(id, error_codes::RENDER_FAILED, message.clone());
    }

    let Some(stats) = stats else {
        return Response::success(id, serde_json::json!({ "drawn": false }));
    };

    let Some(backend) = state.map.backend() else {
        return Response::success(id, serde_json::json!({ "drawn": false }));
    };

    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    let bytes = frame_to_bytes(backend.last_frame());
    tracing::debug!("[Server] Frame: {} fill(s), {} culled, {} bytes", stats.filled, stats.culled, bytes.len());

    Response::success(id, serde_json::json!({
        "drawn": true,
        "stats": stats,
        "frame": BASE64.encode(&bytes),
    }))
}

/// Handle ResetView request - clears the selection and animates home
pub fn handle_reset_view(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize)]
    struct ResetParams {
        time_ms: f64,
    }

    let params: ResetParams = match params.and_then(|p| serde_json::from_value(p).ok()) {
        Some(p) => p,
        None => {
            return Response::error(id, error_codes::INVALID_PARAMS,
                "Invalid params: expected {time_ms}".to_string());
        }
    };

    state.map.reset_view(params.time_ms);
    Response::success(id, serde_json::json!({ "status": "ok" }))
}

/// Handle SetTransform request - jumps to a clamped transform
pub fn handle_set_transform(
    state: &mut ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    let transform: ViewportTransform = match params.and_then(|p| serde_json::from_value(p).ok()) {
        Some(t) => t,
        None => {
            return Response::error(id, error_codes::INVALID_PARAMS,
                "Invalid params: expected {translate_x, translate_y, scale}".to_string());
        }
    };

    state.map.set_transform(transform);
    match serde_json::to_value(state.map.transform()) {
        Ok(t) => Response::success(id, t),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}
