//! JSON-RPC server driving one choropleth map over stdin/stdout
//!
//! A webview host sends one request per line and receives one response per
//! line; map events follow as `mapEvent` notifications.
//!
//! # Module Structure
//! - `protocol` - JSON-RPC request/response types
//! - `state` - Server state management
//! - `handlers` - Request handlers organized by functionality

pub mod handlers;
pub mod protocol;
pub mod state;

pub use handlers::dispatch;
pub use protocol::{error_codes, ErrorResponse, Notification, Request, Response};
pub use state::ServerState;
