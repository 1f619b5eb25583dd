//! GATT server for the beacon service, and the glue between its
//! characteristics and the engine.

use defmt::{info, warn};
use heapless::Vec;
use nrf_softdevice::ble::Connection;
use room_beacon::config::{CONTENT_CAPACITY, STATUS_CAPACITY};
use room_beacon::{peer_write, CallSignal, Notifier, PeerWrite, Slot};

/// Longest call token ("calling").
const CALL_CAPACITY: usize = 8;

#[nrf_softdevice::gatt_service(uuid = "d3e6a1bb-2f35-4853-9f02-ba02b91044f1")]
pub struct BeaconService {
    #[characteristic(uuid = "e9229875-87d4-4b24-b703-361649ad9ad6", read, write, notify)]
    pub status: Vec<u8, STATUS_CAPACITY>,

    #[characteristic(uuid = "c310ce58-d663-4dcd-9e37-8a5431f6550d", read, write)]
    pub content: Vec<u8, CONTENT_CAPACITY>,

    #[characteristic(uuid = "5a8e96e4-f950-4512-9a50-1008c6629d43", read, notify)]
    pub call: Vec<u8, CALL_CAPACITY>,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub beacon: BeaconService,
}

/// Peer write adapter: decode a GATT write event.
///
/// Runs inside the SoftDevice callback, so it only decodes; all policy
/// lives in the engine.
pub fn event_write(event: ServerEvent) -> Option<PeerWrite> {
    match event {
        ServerEvent::Beacon(BeaconServiceEvent::StatusWrite(bytes)) => {
            info!("peer wrote status ({} bytes)", bytes.len());
            Some(peer_write(Slot::Status, &bytes))
        }
        ServerEvent::Beacon(BeaconServiceEvent::ContentWrite(bytes)) => {
            info!("peer wrote content ({} bytes)", bytes.len());
            Some(peer_write(Slot::Content, &bytes))
        }
        ServerEvent::Beacon(BeaconServiceEvent::StatusCccdWrite { notifications }) => {
            info!("status notifications: {}", notifications);
            None
        }
        ServerEvent::Beacon(BeaconServiceEvent::CallCccdWrite { notifications }) => {
            info!("call notifications: {}", notifications);
            None
        }
    }
}

/// Characteristic values sized for `N` bytes. Engine text never
/// exceeds the matching capacity.
fn value<const N: usize>(text: &str) -> Vec<u8, N> {
    Vec::from_slice(text.as_bytes()).unwrap_or_default()
}

/// [`Notifier`] backed by the GATT server.
///
/// Values are always stored so reads see them; notifications go to the
/// attached connection, if any.
pub struct GattNotifier {
    server: &'static Server,
    conn: Option<Connection>,
}

impl GattNotifier {
    pub fn new(server: &'static Server) -> Self {
        Self { server, conn: None }
    }

    pub fn attach(&mut self, conn: Connection) {
        self.conn = Some(conn);
    }

    pub fn detach(&mut self) {
        self.conn = None;
    }
}

impl Notifier for GattNotifier {
    fn status_changed(&mut self, status: &str) {
        let v = value::<STATUS_CAPACITY>(status);
        if let Err(e) = self.server.beacon.status_set(&v) {
            warn!("status set failed: {}", e);
        }
        if let Some(conn) = &self.conn {
            // Fails when the peer hasn't subscribed; the value is still readable.
            if let Err(e) = self.server.beacon.status_notify(conn, &v) {
                warn!("status notify failed: {}", e);
            }
        }
    }

    fn content_changed(&mut self, content: &str) {
        let v = value::<CONTENT_CAPACITY>(content);
        if let Err(e) = self.server.beacon.content_set(&v) {
            warn!("content set failed: {}", e);
        }
    }

    fn call_changed(&mut self, call: CallSignal) {
        let v = value::<CALL_CAPACITY>(call.token());
        if let Err(e) = self.server.beacon.call_set(&v) {
            warn!("call set failed: {}", e);
        }
        if let Some(conn) = &self.conn {
            if let Err(e) = self.server.beacon.call_notify(conn, &v) {
                warn!("call notify failed: {}", e);
            }
        }
    }
}
