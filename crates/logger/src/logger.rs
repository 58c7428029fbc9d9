// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use efund_events::{EventLog, LedgerEvent};
use tracing::info;

pub trait EventLogging {
    fn log(&self, logger_name: &str);
}

/// Logs every event written to an [`EventLog`].
pub struct SimpleLogger;

impl SimpleLogger {
    pub fn attach(name: &str, log: &EventLog) {
        let name = name.to_owned();
        info!(node = %name, "READY!");
        log.subscribe(move |event: &LedgerEvent| event.log(&name));
    }
}

impl EventLogging for LedgerEvent {
    fn log(&self, logger_name: &str) {
        match self {
            LedgerEvent::ContributionReceived(e) => info!(
                me = logger_name,
                evt = %self,
                contributor = %e.contributor,
                "Contribution received"
            ),
            LedgerEvent::FundClosed(e) => info!(
                me = logger_name,
                evt = %self,
                creator = %e.creator,
                "Fund closed"
            ),
            _ => info!(
                me = logger_name,
                evt = %self,
                emitter = %self.emitter(),
                "Event emitted"
            ),
        }
    }
}
