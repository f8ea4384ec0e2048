use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Hands out send timestamps that never go backwards on a connection, even
/// if the wall clock is stepped back between two sends.
#[derive(Default)]
pub struct ConnectionClock {
    last: DashMap<String, DateTime<Utc>>,
}

impl ConnectionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stamp(&self, connection_id: &str) -> DateTime<Utc> {
        self.stamp_at(connection_id, Utc::now())
    }

    pub fn stamp_at(&self, connection_id: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut last = self.last.entry(connection_id.to_string()).or_insert(now);
        if now > *last {
            *last = now;
        }
        *last
    }

    pub fn forget(&self, connection_id: &str) {
        self.last.remove(connection_id);
    }
}
