//! udp_tx.rs — UDP transmitter for per-tick boat telemetry
//!
//! Sends one JSON datagram per simulation epoch to:
//!   - Unicast: the hub address (always enabled)
//!   - Multicast: 239.255.0.2:5600 when `--multicast` is set
//!
//! Send errors are logged and dropped; the sim keeps running.

use std::net::UdpSocket;
use tracing::{debug, warn};

use sail_types::{Command, Telemetry};

pub const MULTICAST_ADDR: &str = "239.255.0.2:5600";

pub struct UdpTransmitter {
    socket: UdpSocket,
    unicast_addr: String,
    multicast_addr: Option<String>,
}

impl UdpTransmitter {
    pub fn new(unicast_addr: &str, multicast_addr: Option<&str>) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(false)?;
        Ok(Self {
            socket,
            unicast_addr: unicast_addr.to_string(),
            multicast_addr: multicast_addr.map(|s| s.to_string()),
        })
    }

    /// Send one epoch: what the boat sensed and what the player commanded.
    pub fn send_epoch(&self, epoch: u32, telemetry: &Telemetry, command: &Command) {
        let bytes = match encode(epoch, telemetry, command) {
            Ok(b) => b,
            Err(e) => { warn!("UDP: serialize failed: {e}"); return; }
        };

        if let Err(e) = self.socket.send_to(&bytes, &self.unicast_addr) {
            warn!("UDP: unicast send failed: {e}");
        } else {
            debug!("UDP → {} epoch={epoch} rudder={:.2}", self.unicast_addr, command.rudder());
        }

        if let Some(mc) = &self.multicast_addr {
            if let Err(e) = self.socket.send_to(&bytes, mc) {
                warn!("UDP: multicast send failed: {e}");
            }
        }
    }
}

fn encode(epoch: u32, telemetry: &Telemetry, command: &Command) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(&serde_json::json!({
        "epoch":     epoch,
        "telemetry": telemetry,
        "command":   command,
    }))
}
