//! Color upscaler contract and accelerator slot management.
//!
//! The neural super-resolution model is an external collaborator behind a
//! narrow call contract: premultiplied RGB in, RGB scaled by exactly the
//! requested factor out. This module holds that contract, the built-in CPU
//! fallback implementations, and the device pool that rate-limits the
//! color-upscale stage to the available accelerator slots.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex};

use image::RgbImage;
use image::imageops::FilterType;

use crate::config::UpscaleBackend;
use crate::error::PipelineError;
use crate::resample;

/// The external color-upscaler contract.
///
/// Implementations must return an image scaled by exactly `factor` in each
/// dimension; the pipeline fails the texture with `UpscaleDimensionMismatch`
/// otherwise. Color fidelity at fully transparent regions is not required,
/// since the final alpha is zero there.
pub trait ColorUpscaler: Send + Sync {
    /// Short backend name for logs and summaries.
    fn name(&self) -> &'static str;

    /// Upscale a premultiplied RGB image by an integer factor.
    fn upscale(&self, image: &RgbImage, factor: u32) -> Result<RgbImage, PipelineError>;
}

/// CPU fallback backend: per-channel Lanczos resampling.
///
/// Used when no accelerator-backed implementation is plugged in; slower and
/// without hallucinated detail, but dimensionally identical to the real
/// model's contract.
pub struct LanczosColorUpscaler;

impl ColorUpscaler for LanczosColorUpscaler {
    fn name(&self) -> &'static str {
        "lanczos"
    }

    fn upscale(&self, image: &RgbImage, factor: u32) -> Result<RgbImage, PipelineError> {
        Ok(resample::upscale_rgb(image, factor))
    }
}

/// Nearest-neighbor echo backend.
///
/// Preserves hard pixel edges exactly; mainly useful for pixel art and for
/// exercising the pipeline without any filtering in the color path.
pub struct NearestColorUpscaler;

impl ColorUpscaler for NearestColorUpscaler {
    fn name(&self) -> &'static str {
        "nearest"
    }

    fn upscale(&self, image: &RgbImage, factor: u32) -> Result<RgbImage, PipelineError> {
        let (width, height) = image.dimensions();
        Ok(image::imageops::resize(image, width * factor, height * factor, FilterType::Nearest))
    }
}

/// Instantiate the configured backend.
pub fn create_upscaler(backend: UpscaleBackend) -> Box<dyn ColorUpscaler> {
    match backend {
        UpscaleBackend::Lanczos => Box::new(LanczosColorUpscaler),
        UpscaleBackend::Nearest => Box::new(NearestColorUpscaler),
    }
}

/// A compute slot for the color-upscale stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// CPU-bound fallback slot.
    Cpu,
    /// Accelerator device by id.
    Accelerator(u32),
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Accelerator(id) => write!(f, "accelerator:{}", id),
        }
    }
}

/// Rate limiter for the color-upscale stage.
///
/// The stage is the one serialization point with an external resource
/// constraint (accelerator memory), so concurrent invocations are capped at
/// the number of configured devices and sharded round-robin across them.
/// With no devices configured the pool degrades to a single CPU slot.
pub struct DevicePool {
    slots: Mutex<VecDeque<Device>>,
    ready: Condvar,
}

impl DevicePool {
    /// Build a pool from configured accelerator device ids.
    pub fn new(devices: &[u32]) -> Self {
        let slots: VecDeque<Device> = if devices.is_empty() {
            VecDeque::from([Device::Cpu])
        } else {
            devices.iter().map(|&id| Device::Accelerator(id)).collect()
        };
        Self { slots: Mutex::new(slots), ready: Condvar::new() }
    }

    /// Block until a device slot is free and claim it.
    ///
    /// Slots are handed out front-of-queue and returned to the back, which
    /// rotates work round-robin across accelerators.
    pub fn acquire(&self) -> DeviceGuard<'_> {
        let mut slots = self.slots.lock().unwrap();
        loop {
            if let Some(device) = slots.pop_front() {
                return DeviceGuard { pool: self, device };
            }
            slots = self.ready.wait(slots).unwrap();
        }
    }

    fn release(&self, device: Device) {
        self.slots.lock().unwrap().push_back(device);
        self.ready.notify_one();
    }
}

/// RAII claim on a device slot; releases back to the pool on drop.
pub struct DeviceGuard<'a> {
    pool: &'a DevicePool,
    device: Device,
}

impl DeviceGuard<'_> {
    /// The claimed device.
    pub fn device(&self) -> Device {
        self.device
    }
}

impl Drop for DeviceGuard<'_> {
    fn drop(&mut self) {
        self.pool.release(self.device);
    }
}
