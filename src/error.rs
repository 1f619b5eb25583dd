//! Unified error type for the room-beacon firmware.
//!
//! Only boot can fail: the GATT table, advertising and the display are
//! set up once and the device restarts if any of them doesn't come up.
//! Implements `defmt::Format` for efficient on-target logging.

use defmt::Format;

/// Top-level error type used across the application.
#[derive(Debug, Format)]
pub enum Error {
    // BLE
    /// The SoftDevice returned a BLE-level error.
    Ble(BleError),

    // UI / Display
    /// I²C transaction to the display failed.
    Display,
}

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, Format)]
pub enum BleError {
    /// The GATT service could not be registered.
    RegisterFailed,
    /// Connectable advertising could not start.
    AdvertiseFailed,
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}
