//! Single-client TCP transport: decodes the fixed-layout request, forwards
//! it to the control worker, and writes the two-phase receipt/completion
//! response.
//!
//! The wire layout is explicit little-endian field encode/decode rather than
//! a `#[repr(C)]` transmute -- transmuting an externally supplied byte buffer
//! into a Rust struct is unsound, and the teacher's own serial framing
//! follows the same explicit-field convention.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};

use crossbeam_channel::Sender;
use tracing::{info, warn};

use crate::command::RawRequest;
use crate::error::TransportError;

pub const REQUEST_WIRE_SIZE: usize = 4 * 4 + 5 * 8;
pub const RESPONSE_WIRE_SIZE: usize = 4 * 5 + 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum CommandStatus {
    Pending = 0,
    Executing = 1,
    Completed = 2,
    Error = 3,
}

#[derive(Debug, Clone)]
pub struct CommandFeedback {
    pub cmd: i32,
    pub axis: i32,
    pub seq: i32,
    pub status: CommandStatus,
    pub error_code: i32,
    pub message: String,
}

impl CommandFeedback {
    fn encode(&self) -> [u8; RESPONSE_WIRE_SIZE] {
        let mut buf = [0u8; RESPONSE_WIRE_SIZE];
        buf[0..4].copy_from_slice(&self.cmd.to_le_bytes());
        buf[4..8].copy_from_slice(&self.axis.to_le_bytes());
        buf[8..12].copy_from_slice(&self.seq.to_le_bytes());
        buf[12..16].copy_from_slice(&(self.status as i32).to_le_bytes());
        buf[16..20].copy_from_slice(&self.error_code.to_le_bytes());
        let msg = self.message.as_bytes();
        let len = msg.len().min(127);
        buf[20..20 + len].copy_from_slice(&msg[..len]);
        buf
    }
}

fn decode_request(buf: &[u8]) -> RawRequest {
    let cmd = i32::from_le_bytes(buf[0..4].try_into().unwrap());
    let axis = i32::from_le_bytes(buf[4..8].try_into().unwrap());
    let mut param = [0.0f64; 5];
    for (i, slot) in param.iter_mut().enumerate() {
        let offset = 16 + i * 8;
        *slot = f64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap());
    }
    RawRequest { cmd, axis, param }
}

/// Send the receipt (status `Pending`) immediately, then block on the
/// control worker's reply and send the completion response.
fn serve_one(
    stream: &mut TcpStream,
    seq: i32,
    req: RawRequest,
    tx: &Sender<(RawRequest, Sender<(bool, Option<String>)>)>,
) -> Result<bool, TransportError> {
    let receipt = CommandFeedback {
        cmd: req.cmd,
        axis: req.axis,
        seq,
        status: CommandStatus::Pending,
        error_code: 0,
        message: format!("Command {} received", req.cmd),
    };
    stream.write_all(&receipt.encode())?;

    let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
    let (close_connection, status_text) = if tx.send((req, reply_tx)).is_ok() {
        reply_rx.recv().unwrap_or((true, None))
    } else {
        (true, None)
    };

    let message = status_text.unwrap_or_else(|| format!("Command {} executed successfully", req.cmd));
    let completion = CommandFeedback {
        cmd: req.cmd,
        axis: req.axis,
        seq,
        status: CommandStatus::Completed,
        error_code: 0,
        message,
    };
    stream.write_all(&completion.encode())?;

    Ok(close_connection)
}

fn handle_client(mut stream: TcpStream, tx: Sender<(RawRequest, Sender<(bool, Option<String>)>)>) {
    let mut seq = 0;
    let mut buf = [0u8; REQUEST_WIRE_SIZE];

    loop {
        match stream.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                info!("client disconnected");
                break;
            }
            Err(e) => {
                warn!("read error: {e}");
                break;
            }
        }
        seq += 1;
        let req = decode_request(&buf);

        let close_connection = match serve_one(&mut stream, seq, req, &tx) {
            Ok(close) => close,
            Err(e) => {
                warn!("transport error: {e}");
                break;
            }
        };

        if req.cmd == 999 || close_connection {
            break;
        }
    }
}

/// Accept loop: one client at a time, each forwarding decoded requests on
/// `tx` and waiting for the control worker's reply before acknowledging.
pub fn run_server(port: u16, tx: Sender<(RawRequest, Sender<(bool, Option<String>)>)>) -> Result<(), TransportError> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    info!("transport listening on port {port}");

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                info!("client connected");
                handle_client(stream, tx.clone());
            }
            Err(e) => warn!("accept failed: {e}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trip_preserves_fields() {
        let mut buf = [0u8; REQUEST_WIRE_SIZE];
        buf[0..4].copy_from_slice(&5i32.to_le_bytes());
        buf[4..8].copy_from_slice(&1i32.to_le_bytes());
        buf[16..24].copy_from_slice(&2.5f64.to_le_bytes());

        let req = decode_request(&buf);
        assert_eq!(req.cmd, 5);
        assert_eq!(req.axis, 1);
        assert_eq!(req.param[0], 2.5);
    }

    #[test]
    fn feedback_encodes_fixed_layout() {
        let feedback = CommandFeedback {
            cmd: 1,
            axis: 1,
            seq: 3,
            status: CommandStatus::Completed,
            error_code: 0,
            message: "ok".to_string(),
        };
        let buf = feedback.encode();
        assert_eq!(buf.len(), RESPONSE_WIRE_SIZE);
        assert_eq!(i32::from_le_bytes(buf[0..4].try_into().unwrap()), 1);
        assert_eq!(i32::from_le_bytes(buf[12..16].try_into().unwrap()), CommandStatus::Completed as i32);
    }
}
