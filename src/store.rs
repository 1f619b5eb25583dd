//! Shared Status Store - the externally visible state of the beacon.
//!
//! A dumb value holder: setters assign, nothing propagates. Pushing
//! changes to the peer and the display is the engine's job.

use crate::config::{
    CALL_TOKEN_CALLING, CALL_TOKEN_NONE, CALL_TOKEN_YO, CONTENT_CAPACITY, STATUS_CAPACITY,
};
use heapless::String;

/// Current status line, also the value of the status characteristic.
pub type StatusText = String<STATUS_CAPACITY>;

/// Transient message shown under the status line.
pub type ContentText = String<CONTENT_CAPACITY>;

/// Whether a ring is active, and which flavor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CallSignal {
    #[default]
    None,
    Calling,
    Yo,
}

impl CallSignal {
    /// Literal value written to the call characteristic.
    pub fn token(self) -> &'static str {
        match self {
            CallSignal::None => CALL_TOKEN_NONE,
            CallSignal::Calling => CALL_TOKEN_CALLING,
            CallSignal::Yo => CALL_TOKEN_YO,
        }
    }

    pub fn is_ringing(self) -> bool {
        !matches!(self, CallSignal::None)
    }
}

/// Copy `text` into a fixed-capacity string, cutting on a char boundary.
pub fn fit<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[derive(Clone, Debug, Default)]
pub struct StatusStore {
    status: StatusText,
    content: ContentText,
    call: CallSignal,
    last_stable_status: StatusText,
    last_cancel_ms: Option<u64>,
}

impl StatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = fit(status);
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: &str) {
        self.content = fit(content);
    }

    pub fn call(&self) -> CallSignal {
        self.call
    }

    pub fn set_call(&mut self, call: CallSignal) {
        self.call = call;
    }

    /// Status that was showing when the current ring started.
    pub fn last_stable_status(&self) -> &str {
        &self.last_stable_status
    }

    pub fn set_last_stable_status(&mut self, status: &str) {
        self.last_stable_status = fit(status);
    }

    /// Uptime (ms) of the most recent cancel, if any.
    pub fn last_cancel_ms(&self) -> Option<u64> {
        self.last_cancel_ms
    }

    pub fn set_last_cancel_ms(&mut self, at: u64) {
        self.last_cancel_ms = Some(at);
    }
}
