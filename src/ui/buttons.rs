//! GPIO button input with async debouncing.
//!
//! Three physical buttons (active-low with internal pull-up):
//!   - A - cancel the ring in progress
//!   - B - call
//!   - C - yo
//!
//! Each button is handled by an async task that waits for a GPIO edge,
//! debounces it, and queues a `Command::Button` for the engine.

use crate::control::CommandSender;
use defmt::info;
use embassy_nrf::gpio::{AnyPin, Input, Pull};
use embassy_time::{Duration, Timer};
use room_beacon::config::BUTTON_DEBOUNCE_MS;
use room_beacon::{Button, Command};

/// Run a single button polling loop.
///
/// Waits for the pin to go low (pressed), debounces, sends the command,
/// then waits for release before repeating.
pub async fn button_task(pin: AnyPin, button: Button, commands: CommandSender) -> ! {
    let mut btn = Input::new(pin, Pull::Up);

    loop {
        // Wait for falling edge (button press, active-low).
        btn.wait_for_falling_edge().await;

        // Debounce: wait and re-check.
        Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;

        if btn.is_low() {
            info!("Button: {}", button);
            commands.send(Command::Button(button)).await;

            // Wait for release to avoid repeat triggers.
            btn.wait_for_rising_edge().await;
            Timer::after(Duration::from_millis(BUTTON_DEBOUNCE_MS)).await;
        }
    }
}
