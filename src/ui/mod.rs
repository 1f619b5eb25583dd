//! User interface subsystem - OLED display, physical buttons, buzzer.
//!
//! The engine draws into the display buffer through [`display::Screen`];
//! the refresh loop in `control` pushes it to the panel.
//!
//! ## Components
//!
//! - **Display**: SSD1306 128×64 OLED via I²C
//! - **Buttons**: 3 tactile switches with debouncing (CANCEL, CALL, YO)
//! - **Buzzer**: GPIO-driven piezo for feedback beeps

pub mod buttons;
pub mod buzzer;
pub mod display;
