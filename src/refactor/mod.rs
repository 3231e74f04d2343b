//! The restructuring core: reference discovery, relocation and push-down
//! conflict analysis over any [`ProgramModel`](crate::models::ProgramModel).

pub mod diagnostics;
pub mod hooks;
pub mod messages;
pub mod push_down;
pub mod query;
pub mod relocation;

pub use diagnostics::{
    notice_channel, Diagnostics, Notice, NoticeReceiver, NoticeSender, RecordingDiagnostics,
    TracingDiagnostics,
};
pub use hooks::{HookRegistry, MoveHook, PathContextHook};
pub use messages::MessageCatalog;
pub use push_down::{analyze_push_down_conflicts, PushDownConflicts};
pub use query::{find_references, PendingReference};
pub use relocation::{
    rebind_order, MoveJournal, MoveListener, MoveOutcome, MovePlan, MoveReport, MoveState,
    MovedElement, RelocationOptions, RelocationProcessor,
};
