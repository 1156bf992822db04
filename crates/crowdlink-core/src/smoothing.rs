//! Per-device RSSI smoothing
//!
//! Each identity keeps the last `window` raw readings in arrival order. The
//! smoothed value is the arithmetic mean truncated toward zero.

use std::collections::{HashMap, VecDeque};

use crate::config::SmoothingConfig;
use crate::types::{DeviceIdentity, Rssi};

/// Mean of `samples` truncated toward zero, 0 for no samples
pub fn smoothed_rssi(samples: &[Rssi]) -> Rssi {
    mean_toward_zero(samples.iter().copied(), samples.len())
}

fn mean_toward_zero(samples: impl Iterator<Item = Rssi>, len: usize) -> Rssi {
    if len == 0 {
        return 0;
    }
    let sum: i64 = samples.map(i64::from).sum();
    // Integer division truncates toward zero; the mean stays within i16 range
    (sum / len as i64) as Rssi
}

// ----------------------------------------------------------------------------
// Signal History
// ----------------------------------------------------------------------------

/// Bounded FIFO of raw readings for one device
#[derive(Debug, Clone)]
pub struct SignalHistory {
    samples: VecDeque<Rssi>,
    capacity: usize,
}

impl SignalHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a reading, evicting the oldest once over capacity
    pub fn push(&mut self, rssi: Rssi) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(rssi);
    }

    pub fn smoothed(&self) -> Rssi {
        mean_toward_zero(self.samples.iter().copied(), self.samples.len())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = Rssi> + '_ {
        self.samples.iter().copied()
    }
}

// ----------------------------------------------------------------------------
// Smoother
// ----------------------------------------------------------------------------

/// Owns every device's signal history
#[derive(Debug, Clone, Default)]
pub struct SignalSmoother {
    config: SmoothingConfig,
    histories: HashMap<DeviceIdentity, SignalHistory>,
}

impl SignalSmoother {
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            histories: HashMap::new(),
        }
    }

    /// Record a reading for `identity` and return its smoothed RSSI
    pub fn observe(&mut self, identity: &DeviceIdentity, rssi: Rssi) -> Rssi {
        let window = self.config.window;
        let history = self
            .histories
            .entry(identity.clone())
            .or_insert_with(|| SignalHistory::new(window));
        history.push(rssi);
        history.smoothed()
    }

    /// Smoothed value for `identity`, 0 if never observed
    pub fn smoothed(&self, identity: &DeviceIdentity) -> Rssi {
        self.histories
            .get(identity)
            .map(SignalHistory::smoothed)
            .unwrap_or(0)
    }

    pub fn history(&self, identity: &DeviceIdentity) -> Option<&SignalHistory> {
        self.histories.get(identity)
    }

    pub fn forget(&mut self, identity: &DeviceIdentity) {
        self.histories.remove(identity);
    }

    pub fn clear(&mut self) {
        self.histories.clear();
    }

    pub fn tracked_devices(&self) -> usize {
        self.histories.len()
    }
}
