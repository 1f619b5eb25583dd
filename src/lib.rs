//! Host-testable library interface for room-beacon.
//!
//! Everything here is pure logic with no hardware behind it: the
//! status/call synchronization engine, the store it owns, the spin-lock
//! that guards it, the command adapter and the display layout maths.
//!
//! Usage: `cargo test --lib`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and links this library for its core logic; the SoftDevice, OLED and
//! GPIO glue only build with the `embedded` feature.

#![cfg_attr(not(test), no_std)]

pub mod command;
pub mod config;
pub mod engine;
pub mod layout;
pub mod lock;
pub mod store;

pub use command::{peer_write, Button, Command, PeerWrite, PendingWrites, Slot};
pub use engine::{AutoCancel, Chime, ConnectionState, Engine, Notifier, Render};
pub use lock::SpinLock;
pub use store::{CallSignal, StatusStore};

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests - invariants over arbitrary command sequences
// ═══════════════════════════════════════════════════════════════════════════
