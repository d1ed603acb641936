//! Headless device driven by the caller.
//!
//! Stands in for a platform driver: whoever holds the [`ManualDeviceHandle`]
//! plays the role of the device thread and pulls blocks on its own schedule.
//! Used by tests and by hosts that own their own output (e.g. writing to a
//! file or an external mixer).

use chirp_core::{AudioError, NegotiatedFormat, Result, StreamRequest};
use parking_lot::Mutex;
use std::sync::Arc;

use super::{AudioCallback, AudioDevice};

#[derive(Debug, Default)]
struct Shared {
    callback: Option<AudioCallback>,
    running: bool,
}

/// A device whose callback is invoked through a [`ManualDeviceHandle`].
#[derive(Debug)]
pub struct ManualDevice {
    forced: Option<NegotiatedFormat>,
    shared: Arc<Mutex<Shared>>,
}

/// The "driver" side of a [`ManualDevice`]. Cheap to clone and `Send`.
///
/// The lock here models the platform scheduling the callback; the engine
/// only takes it in `open`/`resume`/`pause`/`close`, never per tick.
#[derive(Debug, Clone)]
pub struct ManualDeviceHandle {
    shared: Arc<Mutex<Shared>>,
}

impl ManualDevice {
    /// A device that grants whatever format is requested.
    pub fn new() -> (Self, ManualDeviceHandle) {
        Self::build(None)
    }

    /// A device that always negotiates `format`, ignoring the request.
    pub fn with_format(format: NegotiatedFormat) -> (Self, ManualDeviceHandle) {
        Self::build(Some(format))
    }

    fn build(forced: Option<NegotiatedFormat>) -> (Self, ManualDeviceHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let handle = ManualDeviceHandle {
            shared: Arc::clone(&shared),
        };
        (Self { forced, shared }, handle)
    }
}

impl AudioDevice for ManualDevice {
    fn negotiate(&mut self, request: &StreamRequest) -> Result<NegotiatedFormat> {
        Ok(self
            .forced
            .unwrap_or_else(|| NegotiatedFormat::from_request(request)))
    }

    fn open(&mut self, callback: AudioCallback) -> Result<()> {
        let mut shared = self.shared.lock();
        shared.callback = Some(callback);
        shared.running = false;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        let mut shared = self.shared.lock();
        if shared.callback.is_none() {
            return Err(AudioError::NotInitialized);
        }
        shared.running = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let mut shared = self.shared.lock();
        if shared.callback.is_none() {
            return Err(AudioError::NotInitialized);
        }
        shared.running = false;
        Ok(())
    }

    fn close(&mut self) {
        let mut shared = self.shared.lock();
        shared.running = false;
        shared.callback = None;
    }

    fn name(&self) -> String {
        "manual".to_string()
    }
}

impl ManualDeviceHandle {
    /// Run one callback into `dest`. Returns `false` (and writes silence)
    /// when the device is paused or closed.
    pub fn pull(&self, dest: &mut [f32]) -> bool {
        let mut shared = self.shared.lock();
        if !shared.running {
            dest.fill(0.0);
            return false;
        }
        match shared.callback.as_mut() {
            Some(callback) => {
                callback.render(dest);
                true
            }
            None => {
                dest.fill(0.0);
                false
            }
        }
    }

    /// Byte-oriented variant of [`ManualDeviceHandle::pull`].
    pub fn pull_bytes(&self, dest: &mut [u8]) -> bool {
        let mut guard = self.shared.lock();
        let shared = &mut *guard;
        match shared.callback.as_mut() {
            Some(callback) if shared.running => {
                callback.render_bytes(dest);
                true
            }
            _ => {
                dest.fill(0);
                false
            }
        }
    }

    /// Whether a callback is registered.
    pub fn is_open(&self) -> bool {
        self.shared.lock().callback.is_some()
    }

    /// Whether the device is resumed.
    pub fn is_running(&self) -> bool {
        self.shared.lock().running
    }
}
