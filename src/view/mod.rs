//! View state: the viewport transform, pointer interaction and host events
//!
//! # Submodules
//! - `viewport` - transform, clamping and eased animations
//! - `interaction` - pointer/wheel handling, click vs drag, hover and selection
//! - `events` - typed events and subscriptions

mod viewport;
mod interaction;
mod events;

pub use viewport::{
    Animation,
    ViewState,
    ViewportController,
    ViewportTransform,
    ease_out_cubic,
};

pub use interaction::{
    Hit,
    HitTarget,
    InteractionController,
    InteractionState,
};

pub use events::{EventBus, MapEvent};
