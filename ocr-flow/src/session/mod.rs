//! Analysis session lifecycle and the single-writer session state.

mod controller;
mod state;

pub use controller::SessionController;
pub use state::{SessionSnapshot, SessionState, SessionStats, SessionStatus, SessionUpdate};
