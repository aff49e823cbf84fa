//! The scheduling core: turns pattern snapshots into timed voices.
pub mod evaluator;
pub mod mute_solo;
pub mod playback;
pub mod scheduler;
pub mod transport;
pub mod trigger;

pub use playback::Sequencer;
pub use scheduler::{PassReport, Scheduler};
pub use transport::{ParamChange, PlayState, Transport, TransportParams};
pub use trigger::{TriggerAt, VoiceTrigger};
