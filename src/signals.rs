//! # Shutdown Signals
//!
//! One process-wide "stop requested" flag. SIGTERM and SIGINT raise it,
//! SIGHUP is ignored so a closing terminal does not take the display down.
//! The frame loop checks the flag once per iteration and exits between
//! frames.

use core::sync::atomic::{AtomicBool, Ordering};

static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Ask the frame loop to exit after the current frame.
pub fn request_stop() {
    STOP_REQUESTED.store(true, Ordering::SeqCst);
}

pub fn stop_requested() -> bool {
    STOP_REQUESTED.load(Ordering::SeqCst)
}

#[cfg(unix)]
extern "C" fn on_terminate(_signal: libc::c_int) {
    // Only async-signal-safe work here: a single atomic store
    STOP_REQUESTED.store(true, Ordering::SeqCst);
}

/// Install the signal dispositions.
#[cfg(unix)]
pub fn install() -> std::io::Result<()> {
    let handler = on_terminate as extern "C" fn(libc::c_int) as libc::sighandler_t;
    let dispositions = [
        (libc::SIGTERM, handler),
        (libc::SIGINT, handler),
        (libc::SIGHUP, libc::SIG_IGN),
    ];

    for (signal, disposition) in dispositions {
        // SAFETY: the handler only touches an atomic, and SIG_IGN is always valid
        let previous = unsafe { libc::signal(signal, disposition) };
        if previous == libc::SIG_ERR {
            return Err(std::io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Signals are not wired up on this platform; only window events stop the
/// loop.
#[cfg(not(unix))]
pub fn install() -> std::io::Result<()> {
    Ok(())
}
