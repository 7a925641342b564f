//! Request handlers organized by functionality

pub mod input;
pub mod map;
pub mod query;

pub use input::*;
pub use map::*;
pub use query::*;

use crate::server::protocol::{error_codes, Request, Response};
use crate::server::state::ServerState;

/// Route one request to its handler
pub fn dispatch(state: &mut ServerState, request: Request) -> Response {
    let Request { id, method, params } = request;
    match method.as_str() {
        "Load" => handle_load(state, id, params),
        "Resize" => handle_resize(state, id, params),
        "Frame" => handle_frame(state, id, params),
        "ResetView" => handle_reset_view(state, id, params),
        "SetTransform" => handle_set_transform(state, id, params),
        "PointerDown" => handle_pointer_down(state, id, params),
        "PointerMove" => handle_pointer_move(state, id, params),
        "PointerUp" => handle_pointer_up(state, id, params),
        "PointerLeave" => handle_pointer_leave(state, id),
        "Wheel" => handle_wheel(state, id, params),
        "Legend" => handle_legend(state, id, params),
        "Status" => handle_status(state, id),
        _ => Response::error(id, error_codes::METHOD_NOT_FOUND, format!("Method not found: {}", method)),
    }
}
