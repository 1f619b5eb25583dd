//! room-beacon firmware entry point (nRF52840 + SoftDevice S140).
//!
//! Task layout:
//!
//! - `softdevice_task` - runs the BLE stack
//! - `peripheral_task` - advertising + connection lifecycle, peer writes
//! - `button_task` ×3  - debounced buttons A/B/C
//! - `engine_task`     - applies queued commands and parked peer writes
//! - `auto_cancel_task`- quiet-period timer after content writes
//! - `refresh_task`    - pushes the display buffer every 100 ms
//! - `buzzer_task`     - feedback beeps

#![no_std]
#![no_main]

mod ble;
mod control;
mod error;
mod ui;

use defmt::{info, unwrap};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::gpio::{AnyPin, Pin};
use embassy_nrf::interrupt::Priority;
use embassy_nrf::{bind_interrupts, peripherals, twim};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use nrf_softdevice::Softdevice;
use panic_probe as _;
use room_beacon::config::COMMAND_QUEUE_DEPTH;
use room_beacon::{Button, Command, Engine, PendingWrites, SpinLock};
use static_cell::StaticCell;

use crate::ble::gatt::{GattNotifier, Server};
use crate::control::{AutoCancelSignal, SharedEngine, SharedWrites, WritesReady};
use crate::error::{BleError, Error};
use crate::ui::buzzer::{Buzzer, BEEP_QUEUE_DEPTH};
use crate::ui::display::Screen;

bind_interrupts!(struct Irqs {
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

static COMMANDS: Channel<CriticalSectionRawMutex, Command, COMMAND_QUEUE_DEPTH> = Channel::new();
static AUTO_CANCEL: AutoCancelSignal = AutoCancelSignal::new();
static WRITES: SharedWrites = SpinLock::new(PendingWrites::new());
static WRITES_READY: WritesReady = WritesReady::new();
static BEEPS: Channel<CriticalSectionRawMutex, (), BEEP_QUEUE_DEPTH> = Channel::new();

static SERVER: StaticCell<Server> = StaticCell::new();
static ENGINE: StaticCell<SharedEngine> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn peripheral_task(
    sd: &'static Softdevice,
    server: &'static Server,
    engine: &'static SharedEngine,
) -> ! {
    let e = ble::peripheral::run(
        sd,
        server,
        engine,
        COMMANDS.sender(),
        &WRITES,
        &WRITES_READY,
    )
    .await;
    fatal(e)
}

#[embassy_executor::task(pool_size = 3)]
async fn button_task(pin: AnyPin, button: Button) -> ! {
    ui::buttons::button_task(pin, button, COMMANDS.sender()).await
}

#[embassy_executor::task]
async fn buzzer_task(pin: AnyPin) -> ! {
    ui::buzzer::buzzer_task(pin, BEEPS.receiver()).await
}

#[embassy_executor::task]
async fn engine_task(engine: &'static SharedEngine) -> ! {
    control::engine_task(
        engine,
        COMMANDS.receiver(),
        &WRITES,
        &WRITES_READY,
        &AUTO_CANCEL,
    )
    .await
}

#[embassy_executor::task]
async fn auto_cancel_task() -> ! {
    control::auto_cancel_task(&AUTO_CANCEL, COMMANDS.sender()).await
}

#[embassy_executor::task]
async fn refresh_task(engine: &'static SharedEngine) -> ! {
    control::refresh_task(engine).await
}

/// Boot failures are not retried; panic-probe resets the device.
fn fatal(e: Error) -> ! {
    defmt::panic!("fatal: {}", e)
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("room-beacon starting");

    // SoftDevice reserves interrupt priorities 0, 1 and 4.
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(config);

    let sd = Softdevice::enable(&ble::softdevice_config());
    let server = match Server::new(sd) {
        Ok(server) => SERVER.init(server),
        Err(_) => fatal(BleError::RegisterFailed.into()),
    };
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));

    let i2c = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, twim::Config::default());
    let screen = match Screen::new(i2c) {
        Ok(screen) => screen,
        Err(e) => fatal(e),
    };

    let mut engine = Engine::new(
        screen,
        GattNotifier::new(server),
        Buzzer::new(BEEPS.sender()),
    );
    engine.start();
    let engine: &'static SharedEngine = ENGINE.init(SpinLock::new(engine));
    info!("gatt server started, advertising");

    unwrap!(spawner.spawn(buzzer_task(p.P0_13.degrade())));
    unwrap!(spawner.spawn(engine_task(engine)));
    unwrap!(spawner.spawn(auto_cancel_task()));
    unwrap!(spawner.spawn(refresh_task(engine)));
    unwrap!(spawner.spawn(button_task(p.P0_11.degrade(), Button::Cancel)));
    unwrap!(spawner.spawn(button_task(p.P0_12.degrade(), Button::Call)));
    unwrap!(spawner.spawn(button_task(p.P0_24.degrade(), Button::Yo)));
    unwrap!(spawner.spawn(peripheral_task(sd, server, engine)));
}
