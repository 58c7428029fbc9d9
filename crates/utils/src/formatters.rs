// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;

/// Formatter for byte payloads in `Debug` output. Long payloads are elided in the middle.
pub fn hexf(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", truncate(hex::encode(data)))
}

/// Short `0x1234abcd...89abcdef` form used when printing handles in logs.
pub fn short_hex(data: &[u8]) -> String {
    let s = hex::encode(data);
    if s.len() <= 16 {
        return format!("0x{s}");
    }
    format!("0x{}...{}", &s[..8], &s[s.len() - 8..])
}

fn truncate(s: String) -> String {
    let threshold = 100;
    let limit = 50;
    let cutoff = limit / 2;
    if s.len() <= threshold {
        format!("0x{}", s)
    } else {
        let start = &s[..cutoff];
        let end = &s[s.len() - (limit - cutoff)..];
        format!("<bytes({}):0x{}..{}>", s.len(), start, end)
    }
}
