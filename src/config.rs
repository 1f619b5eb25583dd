//! Application-wide constants and compile-time configuration.
//!
//! Wire identifiers, fixed messages, timing parameters and text
//! capacities live here so they can be tuned in one place.

// BLE

/// Name advertised to peers.
pub const BLE_DEVICE_NAME: &str = "RoomStatusMonitor";

/// Primary GATT service.
pub const BLE_SERVICE_UUID: &str = "d3e6a1bb-2f35-4853-9f02-ba02b91044f1";

/// `BLE_SERVICE_UUID` as little-endian bytes, the order advertising
/// payloads carry it in.
pub const BLE_SERVICE_UUID_LE: [u8; 16] = [
    0xf1, 0x44, 0x10, 0xb9, 0x02, 0xba, 0x02, 0x9f, 0x53, 0x48, 0x35, 0x2f, 0xbb, 0xa1, 0xe6, 0xd3,
];

/// Status characteristic (read / write / notify).
pub const BLE_STATUS_UUID: &str = "e9229875-87d4-4b24-b703-361649ad9ad6";

/// Content characteristic (read / write).
pub const BLE_CONTENT_UUID: &str = "c310ce58-d663-4dcd-9e37-8a5431f6550d";

/// Call characteristic (read / notify).
pub const BLE_CALL_UUID: &str = "5a8e96e4-f950-4512-9a50-1008c6629d43";

/// Advertising interval (in 0.625 ms units). 160 = 100 ms.
pub const BLE_ADV_INTERVAL: u32 = 160;

// Call tokens written to the call characteristic

pub const CALL_TOKEN_NONE: &str = "none";
pub const CALL_TOKEN_CALLING: &str = "calling";
pub const CALL_TOKEN_YO: &str = "yo";

// Fixed status messages
//
// The OLED font is ASCII-only, so these stay ASCII.

/// Shown while advertising with no peer attached.
pub const MSG_WAITING: &str = "Waiting for Bluetooth";

/// Shown right after a peer attaches.
pub const MSG_CONNECTED: &str = "Bluetooth connected!";

/// Shown while a ring is in progress. `cancel` only fires while the
/// status equals this message.
pub const MSG_CALLING: &str = "Calling...";

/// Button bar labels while a peer is attached (A, B, C).
pub const LABEL_CANCEL: &str = "Cancel";
pub const LABEL_CALL: &str = "Call";
pub const LABEL_YO: &str = "Yo";

// Text capacities (bytes of UTF-8)

pub const STATUS_CAPACITY: usize = 64;
pub const CONTENT_CAPACITY: usize = 128;

// Timing

/// Quiet period after a content write before the ring auto-clears (ms).
pub const AUTO_CANCEL_DELAY_MS: u64 = 3_000;

/// Length of one feedback beep (ms).
pub const BEEP_MS: u64 = 100;

/// Display refresh period (ms).
pub const DISPLAY_REFRESH_MS: u64 = 100;

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_MS: u64 = 50;

/// Depth of the command queue feeding the engine task.
pub const COMMAND_QUEUE_DEPTH: usize = 8;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   Button A (cancel) → P0.11
//   Button B (call)   → P0.12
//   Button C (yo)     → P0.24
//   I²C SDA           → P0.26
//   I²C SCL           → P0.27
//   Buzzer            → P0.13
