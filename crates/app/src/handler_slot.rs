//! Single-slot registration for the cancellation wait.
//!
//! An instance can await only one external instruction at a time. Arming a
//! new wait replaces whatever was registered before; the abandoned
//! registration is returned to the caller and its continuation never runs.

use actiflow_domain::graph::CancellationWait;
use actiflow_domain::id::RegistrationId;
use actiflow_domain::remote::EventKey;

/// One armed cancellation wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub id: RegistrationId,
    pub wait: CancellationWait,
}

#[derive(Debug, Default)]
pub struct HandlerSlot {
    current: Option<Registration>,
}

impl HandlerSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `wait`, returning the registration it replaced, if any.
    pub fn register(&mut self, wait: CancellationWait) -> Option<Registration> {
        self.current.replace(Registration {
            id: RegistrationId::new(),
            wait,
        })
    }

    /// Take the registration if it matches `key`, leaving the slot empty.
    ///
    /// A non-matching key leaves the slot untouched.
    pub fn take_matching(&mut self, key: &EventKey) -> Option<Registration> {
        if self.current.as_ref().is_some_and(|r| r.wait.event == *key) {
            self.current.take()
        } else {
            None
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&Registration> {
        self.current.as_ref()
    }

    pub fn clear(&mut self) -> Option<Registration> {
        self.current.take()
    }
}
