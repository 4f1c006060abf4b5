//! Command controller task
//!
//! Sole owner of the motion state. Takes one line at a time, executes it to
//! completion and sends the reply text, ready marker included, back to the
//! host.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;
use heapless::String;

use bonobo_core::command::{Controller, Executed, Outcome};
use bonobo_hal_rp2040::{EmbassyClock, GpioStepperBank};

use crate::channels::LINE_CHANNEL;

/// Reply buffer for one command line
const REPLY_LEN: usize = 256;

/// Reply buffer for the startup banner
const BANNER_LEN: usize = 1024;

/// Controller bound to the RP2040 stepper bank and clock
pub type FirmwareController = Controller<GpioStepperBank, EmbassyClock>;

/// Controller task - main command loop
///
/// Moves and dwells block this task until they complete; the receive task
/// stays parked on the channel in the meantime.
#[embassy_executor::task]
pub async fn controller_task(mut controller: FirmwareController, mut tx: BufferedUartTx) {
    info!("Controller task started");

    let mut banner: String<BANNER_LEN> = String::new();
    if controller.startup(&mut banner).is_err() {
        warn!("Startup banner truncated");
    }
    send(&mut tx, &banner).await;
    info!("Motors enabled, ready for commands");

    let mut reply: String<REPLY_LEN> = String::new();
    loop {
        let line = LINE_CHANNEL.receive().await;
        debug!("Line: {=[u8]:a}", line.as_bytes());

        reply.clear();
        match controller.process_line(&line, &mut reply) {
            Ok(executed) => log_executed(&executed),
            Err(_) => warn!("Reply exceeded {} bytes, truncated", REPLY_LEN),
        }
        send(&mut tx, &reply).await;
    }
}

/// Write reply text to the host
async fn send(tx: &mut BufferedUartTx, text: &str) {
    if let Err(e) = tx.write_all(text.as_bytes()).await {
        warn!("Failed to send reply: {:?}", e);
        return;
    }
    if let Err(e) = tx.flush().await {
        warn!("Failed to flush reply: {:?}", e);
    }
}

fn log_executed(executed: &Executed) {
    if executed.is_ignored() {
        trace!("No command on line");
        return;
    }

    match executed.g {
        Some(Outcome::Moved(report)) => {
            if report.is_complete() {
                debug!(
                    "Move done: {} steps in {} us",
                    report.total_emitted(),
                    report.elapsed_us
                );
            } else {
                warn!(
                    "Move window closed early: planned {:?}, emitted {:?}",
                    report.planned_steps, report.emitted_steps
                );
            }
        }
        Some(Outcome::Rejected(e)) => warn!("Move rejected: {}", e),
        Some(Outcome::HomingFailed(e)) => error!("Homing failed: {}", e),
        Some(Outcome::Homed(report)) => info!("Homed: {:?}", report.steps),
        Some(outcome) => debug!("G: {}", outcome),
        None => {}
    }

    if let Some(code) = executed.m {
        debug!("M: {}", code);
    }
}
