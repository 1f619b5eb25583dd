//! Connection lifecycle: advertise, serve one peer, repeat.

use defmt::{debug, error, info};
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
};
use nrf_softdevice::ble::{gatt_server, peripheral, TxPower};
use nrf_softdevice::Softdevice;
use room_beacon::config::{BLE_ADV_INTERVAL, BLE_DEVICE_NAME, BLE_SERVICE_UUID_LE};
use room_beacon::Command;

use crate::ble::gatt::{event_write, Server};
use crate::control::{CommandSender, SharedEngine, SharedWrites, WritesReady};
use crate::error::{BleError, Error};

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_128(ServiceList::Complete, &[BLE_SERVICE_UUID_LE])
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .full_name(BLE_DEVICE_NAME)
    .build();

/// Serve peers forever. Only returns if advertising cannot start, which
/// is fatal.
pub async fn run(
    sd: &'static Softdevice,
    server: &'static Server,
    engine: &'static SharedEngine,
    commands: CommandSender,
    writes: &'static SharedWrites,
    writes_ready: &'static WritesReady,
) -> Error {
    // Maximum TX power, so the beacon is reachable across a room.
    let config = peripheral::Config {
        interval: BLE_ADV_INTERVAL,
        tx_power: TxPower::Plus8dBm,
        ..Default::default()
    };

    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };

        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                error!("advertising failed: {}", e);
                return BleError::AdvertiseFailed.into();
            }
        };

        info!("peer connected: {}", conn.peer_address());
        engine.lock().notifier_mut().attach(conn.clone());
        commands.send(Command::PeerConnected).await;

        gatt_server::run(&conn, server, |event| {
            let Some(write) = event_write(event) else {
                return;
            };
            // Never block the SoftDevice callback; park and wake the engine.
            if let Some(older) = writes.with(|w| w.park(write)) {
                debug!("unapplied {} write superseded", older.slot);
            }
            writes_ready.signal(());
        })
        .await;

        info!("peer disconnected, advertising again");
        engine.lock().notifier_mut().detach();
        commands.send(Command::PeerDisconnected).await;
    }
}
