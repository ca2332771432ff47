//! Core type definitions

mod event;
mod expansion;
mod outcome;
mod page;
mod validation;

pub use event::{Breakpoint, ConfirmRequest, NotificationKind, PageChange, TableEvent};
pub use expansion::{transition, Effect, ExpansionEvent, ExpansionState, RowId, Transition};
pub use outcome::{CreateOutcome, DeleteOutcome, LoadOutcome, SaveOutcome, ToggleOutcome};
pub use page::{DisplayFields, PageState, TableRow, TableSnapshot};
pub use validation::ValidationErrors;
