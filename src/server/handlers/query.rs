//! Query handlers: Legend, Status

use crate::draw::generation::LodTier;
use crate::server::protocol::{error_codes, Response};
use crate::server::state::ServerState;
use serde::Deserialize;

/// Handle Legend request - legend of the drawn tier, or of the requested one
pub fn handle_legend(
    state: &ServerState,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> Response {
    #[derive(Deserialize, Default)]
    struct LegendParams {
        #[serde(default)]
        tier: Option<String>,
    }

    if !state.is_data_loaded() {
        return Response::error(id, error_codes::NO_DATA_LOADED,
            "No data loaded. Call Load first.".to_string());
    }

    let params: LegendParams = params
        .and_then(|p| serde_json::from_value(p).ok())
        .unwrap_or_default();

    let lod = match params.tier.as_deref() {
        None => state.map.lod(),
        Some("fine") => LodTier::Fine,
        Some("coarse") => LodTier::Coarse,
        Some(other) => {
            return Response::error(id, error_codes::INVALID_PARAMS,
                format!("Unknown tier: {} (expected fine or coarse)", other));
        }
    };

    Response::success(id, serde_json::json!({
        "tier": lod,
        "entries": state.map.legend_for(lod),
    }))
}

/// Handle Status request - summary of load, view and interaction state
pub fn handle_status(state: &ServerState, id: Option<serde_json::Value>) -> Response {
    match serde_json::to_value(state.map.summary()) {
        Ok(summary) => Response::success(id, summary),
        Err(e) => Response::error(id, error_codes::INTERNAL_ERROR, e.to_string()),
    }
}
