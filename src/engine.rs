//! Synchronization Engine - reconciles status, call signal and content.
//!
//! The engine is the only thing that mutates the [`StatusStore`]. After
//! each change it pushes the new values to its observers:
//!
//! - [`Notifier`] - the BLE characteristics the peer reads and subscribes to
//! - [`Render`]   - the status / content / button regions of the display
//! - [`Chime`]    - audible feedback
//!
//! State is the pair (connection, call signal); status and content text
//! ride along as payload. Guard failures are silent no-ops.
//!
//! Time is passed in as uptime milliseconds so the logic stays free of
//! any particular clock.

use crate::command::{Button, Command, PeerWrite, Slot};
use crate::config::{
    AUTO_CANCEL_DELAY_MS, LABEL_CALL, LABEL_CANCEL, LABEL_YO, MSG_CALLING, MSG_CONNECTED,
    MSG_WAITING,
};
use crate::store::{fit, CallSignal, StatusStore, StatusText};

/// Display regions the engine redraws. Each call replaces its region.
pub trait Render {
    fn set_status(&mut self, status: &str);
    fn set_content(&mut self, content: &str);
    fn set_button_labels(&mut self, a: &str, b: &str, c: &str);
}

/// Wireless side of the observers.
pub trait Notifier {
    /// Status value changed; set it and notify subscribers.
    fn status_changed(&mut self, status: &str);
    /// Content value changed; set it (the characteristic has no notify).
    fn content_changed(&mut self, content: &str);
    /// Call signal changed; set the token and notify subscribers.
    fn call_changed(&mut self, call: CallSignal);
}

/// Audible feedback.
pub trait Chime {
    fn beep(&mut self);
}

/// Whether a peer is attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    #[default]
    WaitingForPeer,
    Connected,
}

/// Handle for one armed auto-cancel window.
///
/// Only the token from the latest content write can fire; older ones
/// are ignored when they come back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AutoCancel {
    generation: u32,
    armed_at_ms: u64,
    due_at_ms: u64,
}

impl AutoCancel {
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn armed_at_ms(&self) -> u64 {
        self.armed_at_ms
    }

    /// Uptime (ms) at which the window closes.
    pub fn due_at_ms(&self) -> u64 {
        self.due_at_ms
    }
}

pub struct Engine<R, N, C> {
    store: StatusStore,
    connection: ConnectionState,
    generation: u32,
    render: R,
    notifier: N,
    chime: C,
}

impl<R: Render, N: Notifier, C: Chime> Engine<R, N, C> {
    pub fn new(render: R, notifier: N, chime: C) -> Self {
        Self {
            store: StatusStore::new(),
            connection: ConnectionState::WaitingForPeer,
            generation: 0,
            render,
            notifier,
            chime,
        }
    }

    /// Boot: blank every region and publish the waiting state.
    pub fn start(&mut self) {
        self.render.set_content("");
        self.render.set_button_labels("", "", "");
        self.notifier.content_changed("");
        self.notifier.call_changed(CallSignal::None);
        self.set_status(MSG_WAITING);
    }

    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn render(&self) -> &R {
        &self.render
    }

    pub fn render_mut(&mut self) -> &mut R {
        &mut self.render
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn chime(&self) -> &C {
        &self.chime
    }

    /// Apply one command. Returns the auto-cancel window to arm, if the
    /// command opened one.
    pub fn handle(&mut self, command: Command, now_ms: u64) -> Option<AutoCancel> {
        match command {
            Command::Button(button) => {
                // Every press is acknowledged, even when the action is guarded off.
                self.chime.beep();
                match button {
                    Button::Cancel => self.cancel(now_ms),
                    Button::Call => self.call(),
                    Button::Yo => self.yo(),
                }
                None
            }
            Command::PeerWrote(write) => self.peer_wrote(write, now_ms),
            Command::PeerConnected => {
                self.peer_connected();
                None
            }
            Command::PeerDisconnected => {
                self.peer_disconnected();
                None
            }
            Command::AutoCancelElapsed(token) => {
                self.auto_cancel_elapsed(token, now_ms);
                None
            }
        }
    }

    pub fn yo(&mut self) {
        self.ring(CallSignal::Yo);
    }

    pub fn call(&mut self) {
        self.ring(CallSignal::Calling);
    }

    fn ring(&mut self, signal: CallSignal) {
        if self.connection != ConnectionState::Connected {
            return;
        }

        self.chime.beep();

        // Re-triggering while already ringing keeps the status from
        // before the first ring.
        if self.store.call() == CallSignal::None {
            let current: StatusText = fit(self.store.status());
            self.store.set_last_stable_status(&current);
        }

        self.set_call(signal);
        self.set_status(MSG_CALLING);
    }

    /// Stop the ring in progress. Fires only while the status shows the
    /// calling message.
    pub fn cancel(&mut self, now_ms: u64) {
        if self.store.status() != MSG_CALLING {
            return;
        }

        self.chime.beep();
        self.store.set_last_cancel_ms(now_ms);

        self.set_call(CallSignal::None);

        if !self.store.last_stable_status().is_empty() {
            let previous: StatusText = fit(self.store.last_stable_status());
            self.set_status(&previous);
        }

        self.set_content("");
    }

    /// Apply a decoded peer write. A value that lost bytes in decoding
    /// is written back so the characteristic matches the display.
    pub fn peer_wrote(&mut self, write: PeerWrite, now_ms: u64) -> Option<AutoCancel> {
        match write.slot {
            Slot::Status => {
                self.peer_wrote_status(&write.value);
                if !write.exact {
                    self.notifier.status_changed(self.store.status());
                }
                None
            }
            Slot::Content => {
                let token = self.peer_wrote_content(&write.value, now_ms);
                if !write.exact {
                    self.notifier.content_changed(self.store.content());
                }
                Some(token)
            }
        }
    }

    /// Direct operator override from the peer. The written value is
    /// already what the peer reads, so nothing is notified back.
    pub fn peer_wrote_status(&mut self, status: &str) {
        self.store.set_status(status);
        self.render.set_status(self.store.status());
    }

    /// Show the peer's message and open a fresh auto-cancel window.
    pub fn peer_wrote_content(&mut self, content: &str, now_ms: u64) -> AutoCancel {
        self.store.set_content(content);
        self.render.set_content(self.store.content());

        self.generation = self.generation.wrapping_add(1);
        AutoCancel {
            generation: self.generation,
            armed_at_ms: now_ms,
            due_at_ms: now_ms.saturating_add(AUTO_CANCEL_DELAY_MS),
        }
    }

    /// An auto-cancel window ran out. Cancels unless the token is stale,
    /// early, or a cancel already happened inside the window.
    ///
    /// Returns whether a cancel was attempted.
    pub fn auto_cancel_elapsed(&mut self, token: AutoCancel, now_ms: u64) -> bool {
        if token.generation != self.generation || now_ms < token.due_at_ms {
            return false;
        }

        if let Some(last) = self.store.last_cancel_ms() {
            if last >= token.armed_at_ms {
                return false;
            }
        }

        self.cancel(now_ms);
        true
    }

    pub fn peer_connected(&mut self) {
        self.connection = ConnectionState::Connected;
        self.chime.beep();
        self.set_status(MSG_CONNECTED);
        self.render
            .set_button_labels(LABEL_CANCEL, LABEL_CALL, LABEL_YO);
    }

    pub fn peer_disconnected(&mut self) {
        self.connection = ConnectionState::WaitingForPeer;
        self.set_status(MSG_WAITING);
        self.render.set_button_labels("", "", "");
    }

    fn set_status(&mut self, status: &str) {
        self.store.set_status(status);
        self.notifier.status_changed(self.store.status());
        self.render.set_status(self.store.status());
    }

    fn set_content(&mut self, content: &str) {
        self.store.set_content(content);
        self.notifier.content_changed(self.store.content());
        self.render.set_content(self.store.content());
    }

    fn set_call(&mut self, call: CallSignal) {
        self.store.set_call(call);
        self.notifier.call_changed(call);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::command::peer_write;
    use crate::config::CONTENT_CAPACITY;

    // ════════════════════════════════════════════════════════════════════════
    // Boot / connection lifecycle
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn boot_publishes_waiting_state() {
        let engine = booted();
        assert_eq!(engine.connection(), ConnectionState::WaitingForPeer);
        assert_eq!(engine.store().status(), MSG_WAITING);
        assert_eq!(engine.notifier().status, MSG_WAITING);
        assert_eq!(engine.notifier().call, CallSignal::None);
        assert_eq!(engine.render().status, MSG_WAITING);
        assert_eq!(engine.render().labels, ("".into(), "".into(), "".into()));
    }

    #[test]
    fn connect_shows_labels_and_beeps() {
        let engine = connected();
        assert_eq!(engine.connection(), ConnectionState::Connected);
        assert_eq!(engine.store().status(), MSG_CONNECTED);
        assert_eq!(engine.notifier().status, MSG_CONNECTED);
        assert_eq!(
            engine.render().labels,
            (LABEL_CANCEL.into(), LABEL_CALL.into(), LABEL_YO.into())
        );
        assert_eq!(engine.chime().beeps, 1);
    }

    #[test]
    fn disconnect_resets_regardless_of_call_signal() {
        for ring in [None, Some(Button::Call), Some(Button::Yo)] {
            let mut engine = connected();
            if let Some(button) = ring {
                engine.handle(Command::Button(button), 0);
            }
            engine.peer_disconnected();

            assert_eq!(engine.connection(), ConnectionState::WaitingForPeer);
            assert_eq!(engine.store().status(), MSG_WAITING);
            assert_eq!(engine.render().labels, ("".into(), "".into(), "".into()));
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Ringing
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn yo_captures_status_and_notifies() {
        let mut engine = connected();
        engine.peer_wrote_status("Free");
        engine.notifier_mut().log.take();

        engine.yo();

        assert_eq!(engine.store().call(), CallSignal::Yo);
        assert_eq!(engine.store().status(), MSG_CALLING);
        assert_eq!(engine.store().last_stable_status(), "Free");
        assert_eq!(
            engine.notifier_mut().log.take(),
            [
                Seen::NotifyCall(CallSignal::Yo),
                Seen::NotifyStatus(MSG_CALLING.into()),
            ]
        );
        assert_eq!(engine.render().status, MSG_CALLING);
    }

    #[test]
    fn ring_while_waiting_is_ignored() {
        let mut engine = booted();
        engine.notifier_mut().log.take();

        engine.call();
        engine.yo();

        assert_eq!(engine.store().call(), CallSignal::None);
        assert_eq!(engine.store().status(), MSG_WAITING);
        assert!(engine.notifier_mut().log.take().is_empty());
        assert_eq!(engine.chime().beeps, 0);
    }

    #[test]
    fn retrigger_keeps_first_stable_status() {
        let mut engine = connected();
        engine.peer_wrote_status("Busy");
        engine.call();
        engine.notifier_mut().log.take();
        engine.call();

        assert_eq!(engine.store().call(), CallSignal::Calling);
        assert_eq!(engine.store().last_stable_status(), "Busy");
        assert_eq!(
            engine.notifier_mut().log.take(),
            [
                Seen::NotifyCall(CallSignal::Calling),
                Seen::NotifyStatus(MSG_CALLING.into()),
            ]
        );
    }

    #[test]
    fn yo_while_calling_switches_flavor() {
        let mut engine = connected();
        engine.peer_wrote_status("Busy");
        engine.call();
        engine.yo();

        assert_eq!(engine.store().call(), CallSignal::Yo);
        assert_eq!(engine.store().last_stable_status(), "Busy");
        assert_eq!(engine.notifier().call, CallSignal::Yo);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Cancel
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn cancel_restores_status_and_clears_content() {
        let mut engine = connected();
        engine.peer_wrote_status("In a meeting");
        engine.yo();
        engine.peer_wrote_content("room 4", 10);

        engine.cancel(20);

        assert_eq!(engine.store().call(), CallSignal::None);
        assert_eq!(engine.store().status(), "In a meeting");
        assert_eq!(engine.store().content(), "");
        assert_eq!(engine.store().last_cancel_ms(), Some(20));
        assert_eq!(engine.notifier().call, CallSignal::None);
        assert_eq!(engine.notifier().status, "In a meeting");
        assert_eq!(engine.notifier().content, "");
        assert_eq!(engine.render().content, "");
    }

    #[test]
    fn cancel_while_idle_touches_nothing() {
        let mut engine = connected();
        engine.peer_wrote_status("Free");
        engine.peer_wrote_content("lunch?", 0);
        let beeps = engine.chime().beeps;
        engine.notifier_mut().log.take();

        engine.cancel(5);

        assert_eq!(engine.store().content(), "lunch?");
        assert_eq!(engine.store().status(), "Free");
        assert_eq!(engine.store().last_stable_status(), "");
        assert_eq!(engine.store().last_cancel_ms(), None);
        assert_eq!(engine.chime().beeps, beeps);
        assert!(engine.notifier_mut().log.take().is_empty());
    }

    #[test]
    fn cancel_without_stable_status_keeps_calling_text() {
        // Status was blank when the ring started (peer cleared it).
        let mut engine = connected();
        engine.peer_wrote_status("");
        engine.call();
        engine.cancel(1);

        assert_eq!(engine.store().call(), CallSignal::None);
        assert_eq!(engine.store().status(), MSG_CALLING);
    }

    #[test]
    fn cancel_guard_is_status_text_even_when_disconnected() {
        let mut engine = booted();
        engine.peer_wrote_status(MSG_CALLING);
        engine.cancel(3);

        assert_eq!(engine.store().last_cancel_ms(), Some(3));
        assert_eq!(engine.notifier().call, CallSignal::None);
    }

    #[test]
    fn stable_status_captured_fresh_after_cancel() {
        let mut engine = connected();
        engine.peer_wrote_status("A");
        engine.call();
        engine.cancel(1);

        engine.peer_wrote_status("B");
        engine.yo();
        assert_eq!(engine.store().last_stable_status(), "B");

        engine.cancel(2);
        assert_eq!(engine.store().status(), "B");
    }

    // ════════════════════════════════════════════════════════════════════════
    // Peer writes & auto-cancel
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn peer_status_write_renders_without_notifying() {
        let mut engine = connected();
        engine.notifier_mut().log.take();

        engine.handle(peer_write(Slot::Status, b"Out for lunch").into(), 0);

        assert_eq!(engine.store().status(), "Out for lunch");
        assert_eq!(engine.render().status, "Out for lunch");
        assert!(engine.notifier_mut().log.take().is_empty());
    }

    #[test]
    fn malformed_status_write_is_written_back() {
        let mut engine = connected();
        engine.notifier_mut().log.take();

        engine.handle(peer_write(Slot::Status, &[b'B', b'u', b's', b'y', 0xE4]).into(), 0);

        assert_eq!(engine.store().status(), "Busy");
        assert_eq!(engine.render().status, "Busy");
        assert_eq!(
            engine.notifier_mut().log.take(),
            [Seen::NotifyStatus("Busy".into())]
        );
    }

    #[test]
    fn oversized_content_write_is_written_back() {
        let mut engine = connected();
        engine.notifier_mut().log.take();
        let long = [b'x'; CONTENT_CAPACITY + 8];

        let token = engine.handle(peer_write(Slot::Content, &long).into(), 0);

        assert!(token.is_some());
        assert_eq!(engine.store().content().len(), CONTENT_CAPACITY);
        assert_eq!(engine.notifier().content, engine.store().content());
    }

    #[test]
    fn content_write_arms_window() {
        let mut engine = connected();
        let token = engine
            .handle(peer_write(Slot::Content, b"room 4").into(), 1_000)
            .expect("content write arms auto-cancel");

        assert_eq!(token.armed_at_ms(), 1_000);
        assert_eq!(token.due_at_ms(), 1_000 + AUTO_CANCEL_DELAY_MS);
        assert_eq!(engine.render().content, "room 4");
    }

    #[test]
    fn auto_cancel_clears_unanswered_ring() {
        let mut engine = connected();
        engine.peer_wrote_status("Free");
        engine.call();
        let token = engine.peer_wrote_content("room 4", 0);

        assert!(engine.auto_cancel_elapsed(token, AUTO_CANCEL_DELAY_MS));
        assert_eq!(engine.store().call(), CallSignal::None);
        assert_eq!(engine.store().content(), "");
        assert_eq!(engine.store().status(), "Free");
    }

    #[test]
    fn manual_cancel_suppresses_auto_cancel() {
        let mut engine = connected();
        engine.peer_wrote_status("Free");
        engine.call();
        let token = engine.peer_wrote_content("room 4", 0);
        engine.cancel(1_500);

        // Ring again so a second cancel would be visible.
        engine.peer_wrote_status("Busy");
        engine.yo();

        assert!(!engine.auto_cancel_elapsed(token, AUTO_CANCEL_DELAY_MS));
        assert_eq!(engine.store().call(), CallSignal::Yo);
        assert_eq!(engine.store().last_stable_status(), "Busy");
    }

    #[test]
    fn cancel_before_window_does_not_suppress() {
        let mut engine = connected();
        engine.peer_wrote_status("Free");
        engine.call();
        engine.cancel(100);
        engine.call();
        let token = engine.peer_wrote_content("hello", 200);

        assert!(engine.auto_cancel_elapsed(token, 200 + AUTO_CANCEL_DELAY_MS));
        assert_eq!(engine.store().call(), CallSignal::None);
    }

    #[test]
    fn stale_and_early_tokens_are_ignored() {
        let mut engine = connected();
        engine.call();
        let first = engine.peer_wrote_content("one", 0);
        let second = engine.peer_wrote_content("two", 1_000);

        assert!(!engine.auto_cancel_elapsed(first, 10_000));
        assert!(!engine.auto_cancel_elapsed(second, 1_000 + AUTO_CANCEL_DELAY_MS - 1));
        assert_eq!(engine.store().call(), CallSignal::Calling);

        assert!(engine.auto_cancel_elapsed(second, 1_000 + AUTO_CANCEL_DELAY_MS));
        assert_eq!(engine.store().call(), CallSignal::None);
    }

    #[test]
    fn auto_cancel_without_ring_leaves_content() {
        let mut engine = connected();
        let token = engine.peer_wrote_content("room 4", 0);

        // Guard inside cancel() rejects it; content stays up.
        assert!(engine.auto_cancel_elapsed(token, AUTO_CANCEL_DELAY_MS));
        assert_eq!(engine.store().content(), "room 4");
        assert_eq!(engine.render().content, "room 4");
        assert_eq!(engine.store().last_cancel_ms(), None);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Buttons
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn button_press_always_beeps() {
        let mut engine = booted();
        engine.handle(Command::Button(Button::Call), 0);
        assert_eq!(engine.chime().beeps, 1);
        assert_eq!(engine.store().call(), CallSignal::None);

        let mut engine = connected();
        engine.handle(Command::Button(Button::Yo), 0);
        // connect + press + ring
        assert_eq!(engine.chime().beeps, 3);
        assert_eq!(engine.store().call(), CallSignal::Yo);
    }

    #[test]
    fn buttons_map_to_actions() {
        let mut engine = connected();
        engine.handle(Command::Button(Button::Call), 0);
        assert_eq!(engine.store().call(), CallSignal::Calling);
        engine.handle(Command::Button(Button::Cancel), 1);
        assert_eq!(engine.store().call(), CallSignal::None);
        assert_eq!(engine.store().status(), MSG_CONNECTED);
    }
}
