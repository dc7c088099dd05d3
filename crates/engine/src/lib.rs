//! # Opdeck Engine
//!
//! The execution engine ties the command registry to a host application's
//! native undo stack. One [`Executor`] per process drives every command
//! through the same lifecycle:
//!
//! 1. **Lookup**: resolve the identifier via the registry
//! 2. **Instantiate**: mint a fresh command instance
//! 3. **Resolve**: validate arguments outside the undo boundary; cooperative
//!    cancellation is still possible here and costs nothing
//! 4. **Execute**: run `do_it` inside a host undo chunk so the whole command
//!    is one atomic native undo step; failures are rolled back
//! 5. **Record**: undoable commands land on the internal undo stack and as
//!    one hook-tagged entry on the host's native queue
//!
//! Undo and redo always flow host → adapter → engine: the host pops its
//! native entry, then the installed [`HostUndoAdapter`] advances the internal
//! stack to match. The two stacks are logically one stack with two views and
//! never diverge in length or order.

pub mod adapter;
pub mod executor;
pub mod history;

pub use adapter::HostUndoAdapter;
pub use executor::Executor;
pub use history::{ExecutionHistory, ExecutionRecord, ExecutionStatus};
