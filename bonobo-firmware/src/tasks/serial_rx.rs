//! Serial console receive task
//!
//! Frames bytes from the host into command lines.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use bonobo_protocol::LineBuffer;

use crate::channels::LINE_CHANNEL;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Serial RX task - accumulates bytes and forwards complete lines
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx) {
    info!("Serial RX task started");

    let mut lines = LineBuffer::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                let mut rest = &buf[..n];
                while !rest.is_empty() {
                    let (line, used) = lines.feed_bytes(rest);
                    rest = &rest[used..];
                    if let Some(line) = line {
                        if line.truncated {
                            warn!("Line exceeded {} bytes, truncated", line.bytes.len());
                        }
                        // Back-pressure: wait for the controller to take it
                        LINE_CHANNEL.send(line).await;
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}
