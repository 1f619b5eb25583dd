//! Piezo buzzer for audible feedback.
//!
//! The engine only queues beeps; a dedicated task turns each one into a
//! short pulse so no caller ever waits on the buzzer.

use defmt::debug;
use embassy_nrf::gpio::{AnyPin, Level, Output, OutputDrive};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Receiver, Sender};
use embassy_time::{Duration, Timer};
use room_beacon::config::BEEP_MS;
use room_beacon::Chime;

/// Beeps queued beyond this are dropped.
pub const BEEP_QUEUE_DEPTH: usize = 4;

/// Gap between back-to-back beeps so they stay distinguishable.
const BEEP_GAP_MS: u64 = 50;

pub type BeepSender = Sender<'static, CriticalSectionRawMutex, (), BEEP_QUEUE_DEPTH>;
pub type BeepReceiver = Receiver<'static, CriticalSectionRawMutex, (), BEEP_QUEUE_DEPTH>;

/// [`Chime`] that queues a beep for [`buzzer_task`].
pub struct Buzzer {
    beeps: BeepSender,
}

impl Buzzer {
    pub fn new(beeps: BeepSender) -> Self {
        Self { beeps }
    }
}

impl Chime for Buzzer {
    fn beep(&mut self) {
        if self.beeps.try_send(()).is_err() {
            debug!("beep queue full");
        }
    }
}

pub async fn buzzer_task(pin: AnyPin, beeps: BeepReceiver) -> ! {
    let mut out = Output::new(pin, Level::Low, OutputDrive::Standard);

    loop {
        beeps.receive().await;
        out.set_high();
        Timer::after(Duration::from_millis(BEEP_MS)).await;
        out.set_low();
        Timer::after(Duration::from_millis(BEEP_GAP_MS)).await;
    }
}
