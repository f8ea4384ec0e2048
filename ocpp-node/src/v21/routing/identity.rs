use core::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::{rngs::SmallRng, RngCore, SeedableRng};

pub struct RequestIds {
    rng: Mutex<SmallRng>,
    event_tracking: AtomicU64,
}

impl RequestIds {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
            event_tracking: AtomicU64::new(1),
        }
    }

    /// Random v4 uuid. Candidates for which `is_pending` holds are discarded,
    /// so the returned id never collides with an outstanding request.
    pub fn next_request_id(&self, is_pending: impl Fn(&str) -> bool) -> String {
        loop {
            let id = self.uuid();
            if !is_pending(&id) {
                return id;
            }
            log::trace!("discarding colliding request id {}", id);
        }
    }

    pub fn next_event_tracking_id(&self) -> u64 {
        self.event_tracking.fetch_add(1, Ordering::Relaxed)
    }

    fn uuid(&self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.lock().fill_bytes(&mut bytes);
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        let mut s = String::with_capacity(36);
        for (i, b) in bytes.iter().enumerate() {
            if i == 4 || i == 6 || i == 8 || i == 10 {
                s.push('-');
            }
            let _ = write!(s, "{:02x}", b);
        }
        s
    }
}
