//! Control loops around the shared engine.
//!
//! - `engine_task` is the single consumer of the command queue; buttons,
//!   the BLE adapter and the auto-cancel timer all feed it. Peer writes
//!   bypass the queue through a parking slot per characteristic so a busy
//!   engine can never make the SoftDevice callback drop one.
//! - `auto_cancel_task` waits out the quiet period after a content write
//!   and restarts its wait whenever a newer write re-arms it.
//! - `refresh_task` pushes the display buffer to the panel.
//!
//! The engine sits behind a [`SpinLock`] because the BLE task also reaches
//! into it to attach the connection, and the refresh loop flushes the
//! screen it owns. No lock is ever held across an `.await`.

use defmt::{debug, info, warn};
use embassy_futures::select::{select, Either};
use embassy_nrf::peripherals::TWISPI0;
use embassy_nrf::twim::Twim;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Receiver, Sender};
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Ticker, Timer};
use room_beacon::config::{COMMAND_QUEUE_DEPTH, DISPLAY_REFRESH_MS};
use room_beacon::{AutoCancel, Command, Engine, PendingWrites, SpinLock};

use crate::ble::gatt::GattNotifier;
use crate::ui::buzzer::Buzzer;
use crate::ui::display::Screen;

pub type BeaconEngine = Engine<Screen<Twim<'static, TWISPI0>>, GattNotifier, Buzzer>;
pub type SharedEngine = SpinLock<BeaconEngine>;

pub type CommandSender = Sender<'static, CriticalSectionRawMutex, Command, COMMAND_QUEUE_DEPTH>;
pub type CommandReceiver =
    Receiver<'static, CriticalSectionRawMutex, Command, COMMAND_QUEUE_DEPTH>;

/// Latest auto-cancel window; a newer one replaces an unread older one.
pub type AutoCancelSignal = Signal<CriticalSectionRawMutex, AutoCancel>;

/// Peer writes parked by the BLE callback.
pub type SharedWrites = SpinLock<PendingWrites>;
/// Raised whenever a write is parked.
pub type WritesReady = Signal<CriticalSectionRawMutex, ()>;

pub async fn engine_task(
    engine: &'static SharedEngine,
    commands: CommandReceiver,
    writes: &'static SharedWrites,
    writes_ready: &'static WritesReady,
    auto_cancel: &'static AutoCancelSignal,
) -> ! {
    loop {
        let queued = match select(commands.receive(), writes_ready.wait()).await {
            Either::First(command) => Some(command),
            Either::Second(()) => None,
        };

        // Parked writes were made before anything still in the queue.
        while let Some(write) = writes.with(|w| w.take()) {
            apply(engine, Command::PeerWrote(write), auto_cancel);
        }
        if let Some(command) = queued {
            apply(engine, command, auto_cancel);
        }
    }
}

fn apply(engine: &SharedEngine, command: Command, auto_cancel: &AutoCancelSignal) {
    debug!("command: {}", command);

    let now = Instant::now().as_millis();
    let armed = {
        let mut engine = engine.lock();
        let armed = engine.handle(command, now);
        let store = engine.store();
        info!(
            "state: {} call={} status=\"{}\" content=\"{}\"",
            engine.connection(),
            store.call(),
            store.status(),
            store.content()
        );
        armed
    };

    if let Some(token) = armed {
        debug!("auto-cancel armed until {} ms", token.due_at_ms());
        auto_cancel.signal(token);
    }
}

pub async fn auto_cancel_task(armed: &'static AutoCancelSignal, commands: CommandSender) -> ! {
    let mut pending = armed.wait().await;

    loop {
        let due = Instant::from_millis(pending.due_at_ms());
        match select(Timer::at(due), armed.wait()).await {
            Either::First(()) => {
                commands.send(Command::AutoCancelElapsed(pending)).await;
                pending = armed.wait().await;
            }
            Either::Second(next) => {
                debug!("auto-cancel re-armed");
                pending = next;
            }
        }
    }
}

pub async fn refresh_task(engine: &'static SharedEngine) -> ! {
    let mut ticker = Ticker::every(Duration::from_millis(DISPLAY_REFRESH_MS));

    loop {
        if let Err(e) = engine.lock().render_mut().update() {
            warn!("display flush failed: {}", e);
        }
        ticker.next().await;
    }
}
