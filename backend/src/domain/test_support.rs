//! Fixtures shared by domain service tests.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use mockable::Clock;

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

/// Clock frozen at `utc_now`.
pub(crate) fn fixture_clock(utc_now: DateTime<Utc>) -> Arc<dyn Clock> {
    Arc::new(FixtureClock { utc_now })
}
