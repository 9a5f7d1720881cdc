pub mod engine;
pub mod protocol;
pub mod scroll;
pub mod state;

// Re-export the engine entry points to make them easily accessible
// to the binary that wires the session together.
pub use engine::{EngineEvent, ReaderEngine};
pub use protocol::{ClientMessage, ServerMessage};
pub use state::AppState;
