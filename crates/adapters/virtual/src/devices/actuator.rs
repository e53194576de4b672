//! Virtual actuator — remembers every value written to it.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use actiflow_app::ports::Actuator;
use actiflow_domain::error::DeviceError;

#[derive(Debug)]
struct ActuatorState {
    history: Vec<f64>,
    available: bool,
}

/// A simulated actuator that records writes.
#[derive(Debug, Clone)]
pub struct VirtualActuator {
    state: Arc<Mutex<ActuatorState>>,
}

impl Default for VirtualActuator {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(ActuatorState {
                history: Vec::new(),
                available: true,
            })),
        }
    }
}

impl VirtualActuator {
    fn lock(&self) -> MutexGuard<'_, ActuatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last value written, if any.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.lock().history.last().copied()
    }

    /// Every value written, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<f64> {
        self.lock().history.clone()
    }

    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }
}

impl Actuator for VirtualActuator {
    fn write(&self, value: f64) -> impl Future<Output = Result<(), DeviceError>> + Send {
        let result = {
            let mut state = self.lock();
            if state.available {
                state.history.push(value);
                Ok(())
            } else {
                Err(DeviceError::Disconnected)
            }
        };
        async move { result }
    }
}
