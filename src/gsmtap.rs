//! GSMTAP/UDP output -- wraps reassembled IDA messages in a 16-byte GSMTAP
//! header and ships them to Wireshark's default GSMTAP listener (grounded
//! on `original_source/gsmtap.c`/`gsmtap.h`).

use std::net::UdpSocket;

use crate::errors::SinkError;
use crate::types::Direction;

pub const GSMTAP_VERSION: u8 = 2;
pub const GSMTAP_HDR_LEN_WORDS: u8 = 4;
pub const GSMTAP_TYPE_ABIS: u8 = 2;
pub const GSMTAP_SUB_BCCH: u8 = 1;
pub const GSMTAP_ARFCN_F_UPLINK: u16 = 0x4000;

pub const GSMTAP_DEFAULT_HOST: &str = "127.0.0.1";
pub const GSMTAP_DEFAULT_PORT: u16 = 4729;

/// Iridium L-band channelization, used to derive a pseudo-ARFCN from the
/// capture center frequency.
pub const IR_BASE_FREQ_HZ: f64 = 1_616_000_000.0;
pub const IR_CHANNEL_WIDTH_HZ: f64 = 41_666.667;

const MAX_PAYLOAD: usize = 240;

/// Build the 16-byte GSMTAP header plus payload (truncated to
/// [`MAX_PAYLOAD`] bytes) for one reassembled message.
pub fn build_gsmtap_packet(
    data: &[u8],
    frequency_hz: f64,
    direction: Direction,
    signal_dbm: i8,
) -> Vec<u8> {
    let fchan = ((frequency_hz - IR_BASE_FREQ_HZ) / IR_CHANNEL_WIDTH_HZ) as i64;
    let mut arfcn = (fchan & 0xffff) as u16;
    if direction == Direction::Uplink {
        arfcn |= GSMTAP_ARFCN_F_UPLINK;
    }

    let len = data.len().min(MAX_PAYLOAD);
    let mut pkt = Vec::with_capacity(16 + len);
    pkt.push(GSMTAP_VERSION);
    pkt.push(GSMTAP_HDR_LEN_WORDS);
    pkt.push(GSMTAP_TYPE_ABIS);
    pkt.push(0); // timeslot
    pkt.extend_from_slice(&arfcn.to_be_bytes());
    pkt.push(signal_dbm as u8);
    pkt.push(0); // snr_db
    pkt.extend_from_slice(&(frequency_hz as u32).to_be_bytes()); // frame_number
    pkt.push(GSMTAP_SUB_BCCH);
    pkt.push(0); // antenna_nr
    pkt.push(0); // sub_slot
    pkt.push(0); // reserved
    pkt.extend_from_slice(&data[..len]);
    pkt
}

/// An open GSMTAP UDP destination.
pub struct GsmtapSink {
    socket: UdpSocket,
}

impl GsmtapSink {
    pub fn connect(host: &str, port: u16) -> Result<Self, SinkError> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|e| SinkError::UdpSend {
            reason: e.to_string(),
        })?;
        socket
            .connect((host, port))
            .map_err(|e| SinkError::UdpSend {
                reason: e.to_string(),
            })?;
        Ok(Self { socket })
    }

    pub fn send(
        &self,
        data: &[u8],
        frequency_hz: f64,
        direction: Direction,
        signal_dbm: i8,
    ) -> Result<(), SinkError> {
        let pkt = build_gsmtap_packet(data, frequency_hz, direction, signal_dbm);
        self.socket
            .send(&pkt)
            .map(|_| ())
            .map_err(|e| SinkError::UdpSend {
                reason: e.to_string(),
            })
    }
}
