//! Fixed-capacity digital line event engine.
//!
//! A bounded set of addressable lines is swept once per tick: sample →
//! debounce → pattern check → prioritized dispatch. All per-line state
//! lives in one [`slot::SlotTable`] owned by the [`engine::ScanEngine`];
//! nothing is heap-allocated after configuration and no sweep ever blocks
//! on a single line's fault.

pub mod debounce;
pub mod dispatch;
pub mod engine;
pub mod history;
pub mod measure;
pub mod pattern;
pub mod slot;

pub use debounce::{Edge, EdgeSelect};
pub use dispatch::{EventContext, EventKind, Handler, QueuedEvent};
pub use engine::{EngineStatus, ScanEngine, SlotStatus};
pub use pattern::Pattern;
pub use slot::{EngineError, LineMode, MAX_LINES, SlotTable};
