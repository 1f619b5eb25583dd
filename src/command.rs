//! Typed commands delivered to the engine.
//!
//! Buttons and the BLE stack never touch the engine directly; they turn
//! their input into a [`Command`] and queue it. The peer-write adapter
//! lives here too: raw characteristic bytes in, a [`PeerWrite`] out,
//! parked in [`PendingWrites`] until the engine picks it up.

use crate::config::STATUS_CAPACITY;
use crate::engine::AutoCancel;
use crate::store::{fit, ContentText};

/// Physical buttons, left to right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// A
    Cancel,
    /// B
    Call,
    /// C
    Yo,
}

/// Writable characteristic slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Slot {
    Status,
    Content,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// A debounced button press.
    Button(Button),
    /// The peer wrote a characteristic.
    PeerWrote(PeerWrite),
    PeerConnected,
    PeerDisconnected,
    /// An armed auto-cancel window has run out.
    AutoCancelElapsed(AutoCancel),
}

/// One decoded characteristic write.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerWrite {
    pub slot: Slot,
    pub value: ContentText,
    /// The value is byte-for-byte what the peer wrote. When false the
    /// characteristic still holds the raw bytes and must be rewritten.
    pub exact: bool,
}

impl PeerWrite {
    pub fn new(slot: Slot, value: &str) -> Self {
        Self {
            slot,
            value: fit(value),
            exact: true,
        }
    }
}

impl From<PeerWrite> for Command {
    fn from(write: PeerWrite) -> Self {
        Command::PeerWrote(write)
    }
}

/// Decode a raw characteristic write.
///
/// Bytes are decoded as UTF-8; on a malformed sequence the valid prefix
/// is kept. The text is cut to the slot's capacity.
pub fn peer_write(slot: Slot, bytes: &[u8]) -> PeerWrite {
    let text = match core::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            // valid_up_to() is always a char boundary
            core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or("")
        }
    };

    let value: ContentText = match slot {
        Slot::Status => fit(fit::<STATUS_CAPACITY>(text).as_str()),
        Slot::Content => fit(text),
    };
    let exact = value.as_bytes() == bytes;

    PeerWrite { slot, value, exact }
}

/// Peer writes the engine has not applied yet, newest per slot.
///
/// The SoftDevice callback cannot wait for queue space, so writes are
/// parked here instead of going through the command queue. A newer write
/// to a slot replaces the parked one, which the engine would have
/// overwritten anyway; a write is never lost.
#[derive(Debug, Default)]
pub struct PendingWrites {
    status: Option<PeerWrite>,
    content: Option<PeerWrite>,
}

impl PendingWrites {
    pub const fn new() -> Self {
        Self {
            status: None,
            content: None,
        }
    }

    /// Park a write. Returns the older write it replaced, if any.
    pub fn park(&mut self, write: PeerWrite) -> Option<PeerWrite> {
        let slot = match write.slot {
            Slot::Status => &mut self.status,
            Slot::Content => &mut self.content,
        };
        slot.replace(write)
    }

    /// Next write to apply; status before content.
    pub fn take(&mut self) -> Option<PeerWrite> {
        self.status.take().or_else(|| self.content.take())
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.content.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONTENT_CAPACITY;

    fn value_of(write: PeerWrite) -> ContentText {
        write.value
    }

    #[test]
    fn plain_utf8_passes_through() {
        let write = peer_write(Slot::Content, "room 4".as_bytes());
        assert_eq!(write, PeerWrite::new(Slot::Content, "room 4"));
        assert!(write.exact);
    }

    #[test]
    fn multibyte_text_is_kept() {
        let cmd = peer_write(Slot::Status, "会議中".as_bytes());
        assert_eq!(value_of(cmd).as_str(), "会議中");
    }

    #[test]
    fn malformed_utf8_keeps_valid_prefix() {
        let bytes = [b'o', b'k', 0xE4, 0xBC];
        assert_eq!(value_of(peer_write(Slot::Content, &bytes)).as_str(), "ok");

        let garbage = [0xFF, 0xFE];
        assert_eq!(value_of(peer_write(Slot::Content, &garbage)).as_str(), "");
    }

    #[test]
    fn decoded_value_reports_whether_it_matches_the_bytes() {
        assert!(peer_write(Slot::Status, b"Free").exact);
        assert!(!peer_write(Slot::Status, &[b'o', b'k', 0xFF]).exact);
        assert!(!peer_write(Slot::Status, &[b'a'; STATUS_CAPACITY + 1]).exact);
        assert!(peer_write(Slot::Content, &[]).exact);
    }

    #[test]
    fn status_is_cut_to_status_capacity() {
        let long = [b'a'; CONTENT_CAPACITY];
        let value = value_of(peer_write(Slot::Status, &long));
        assert_eq!(value.len(), STATUS_CAPACITY);
    }

    #[test]
    fn content_is_cut_to_content_capacity() {
        let long = [b'a'; CONTENT_CAPACITY + 20];
        let value = value_of(peer_write(Slot::Content, &long));
        assert_eq!(value.len(), CONTENT_CAPACITY);
    }

    #[test]
    fn empty_write_clears() {
        assert_eq!(value_of(peer_write(Slot::Status, &[])).as_str(), "");
    }

    // ════════════════════════════════════════════════════════════════════════
    // Pending writes
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn newer_write_replaces_parked_one() {
        let mut pending = PendingWrites::new();
        assert!(pending.park(PeerWrite::new(Slot::Status, "Free")).is_none());
        let replaced = pending.park(PeerWrite::new(Slot::Status, "Busy"));

        assert_eq!(replaced, Some(PeerWrite::new(Slot::Status, "Free")));
        assert_eq!(pending.take(), Some(PeerWrite::new(Slot::Status, "Busy")));
        assert!(pending.take().is_none());
    }

    #[test]
    fn slots_are_parked_independently() {
        let mut pending = PendingWrites::new();
        pending.park(PeerWrite::new(Slot::Content, "room 4"));
        pending.park(PeerWrite::new(Slot::Status, "Busy"));
        assert!(!pending.is_empty());

        assert_eq!(pending.take(), Some(PeerWrite::new(Slot::Status, "Busy")));
        assert_eq!(pending.take(), Some(PeerWrite::new(Slot::Content, "room 4")));
        assert!(pending.take().is_none());
        assert!(pending.is_empty());
    }

    #[test]
    fn burst_of_writes_leaves_only_the_last() {
        let mut pending = PendingWrites::default();
        for i in 0..100 {
            pending.park(peer_write(Slot::Status, format!("status {i}").as_bytes()));
        }

        assert_eq!(value_of(pending.take().expect("parked")).as_str(), "status 99");
        assert!(pending.is_empty());
    }
}
