//! Virtual sensor — reports a settable level, or a scripted sequence.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use actiflow_app::ports::Sensor;
use actiflow_domain::error::DeviceError;

#[derive(Debug)]
struct SensorState {
    level: f64,
    script: VecDeque<f64>,
    available: bool,
    reads: u64,
}

/// A simulated sensor.
///
/// Each read returns the next scripted value if any is queued, otherwise
/// the current level. An unavailable sensor fails every read with
/// [`DeviceError::Disconnected`].
#[derive(Debug, Clone)]
pub struct VirtualSensor {
    state: Arc<Mutex<SensorState>>,
}

impl Default for VirtualSensor {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl VirtualSensor {
    #[must_use]
    pub fn new(level: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(SensorState {
                level,
                script: VecDeque::new(),
                available: true,
                reads: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SensorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn level(&self) -> f64 {
        self.lock().level
    }

    pub fn set_level(&self, level: f64) {
        self.lock().level = level;
    }

    /// Queue values returned by the next reads, ahead of the level.
    pub fn script(&self, values: impl IntoIterator<Item = f64>) {
        self.lock().script.extend(values);
    }

    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Number of reads attempted so far, failed ones included.
    #[must_use]
    pub fn reads(&self) -> u64 {
        self.lock().reads
    }
}

impl Sensor for VirtualSensor {
    fn read(&self) -> impl Future<Output = Result<f64, DeviceError>> + Send {
        let result = {
            let mut state = self.lock();
            state.reads += 1;
            if state.available {
                Ok(state.script.pop_front().unwrap_or(state.level))
            } else {
                Err(DeviceError::Disconnected)
            }
        };
        async move { result }
    }
}
