// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod deployment;
mod error;
mod fund;
mod phase;

pub use deployment::*;
pub use error::*;
pub use fund::*;
pub use phase::*;
