// ABOUTME: Session reducer complex for the wayfarer client
// ABOUTME: Timeline, tool ledger, answer assembler, transcript, session state

pub mod answer;
pub mod ledger;
pub mod session;
pub mod timeline;
pub mod transcript;
pub mod types;

pub use answer::PendingAnswer;
pub use ledger::{LedgerUpdate, ToolLedger};
pub use session::{SessionEvent, SessionState};
pub use timeline::Timeline;
pub use transcript::Transcript;
pub use types::{
    ConnectivityPhase, ConnectivityStatus, Message, Role, Stage, StageKind, ToolCall, ToolStatus,
};
