// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod clock;
pub mod formatters;
pub mod retry;
pub mod units;
pub mod utility_types;
pub use clock::*;
pub use formatters::*;
pub use retry::*;
pub use units::*;
pub use utility_types::*;
