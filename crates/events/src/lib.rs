// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod context;
mod event_log;
mod ledger_event;

pub use context::*;
pub use event_log::*;
pub use ledger_event::*;
