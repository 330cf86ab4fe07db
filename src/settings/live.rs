// Lock-free published copy of the settings for the per-draw path.
//
// One writer (the settings callback context), any number of readers. A
// reader racing a publish may observe a mix of old and new fields; each
// field is individually consistent.

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use super::{ColorSettings, SETTINGS};

#[derive(Debug)]
pub struct LiveSettings {
    values: Box<[AtomicI32]>,
    auto_detected: AtomicBool,
    /// `f32` bit pattern.
    baseline: AtomicU32,
}

impl LiveSettings {
    pub fn new(settings: &ColorSettings) -> Self {
        let live = Self {
            values: SETTINGS.iter().map(|_| AtomicI32::new(0)).collect(),
            auto_detected: AtomicBool::new(false),
            baseline: AtomicU32::new(0),
        };
        live.publish(settings);
        live
    }

    pub fn publish(&self, settings: &ColorSettings) {
        for (slot, desc) in self.values.iter().zip(SETTINGS) {
            slot.store(desc.read(settings), Ordering::Relaxed);
        }
        self.auto_detected
            .store(settings.peak_brightness_auto_detected, Ordering::Relaxed);
        self.baseline
            .store(settings.peak_brightness_baseline.to_bits(), Ordering::Release);
    }

    /// Rebuild a settings record from the published values. Does not allocate.
    pub fn snapshot(&self) -> ColorSettings {
        let mut settings = ColorSettings {
            peak_brightness_baseline: f32::from_bits(self.baseline.load(Ordering::Acquire)),
            peak_brightness_auto_detected: self.auto_detected.load(Ordering::Relaxed),
            ..ColorSettings::default()
        };
        for (slot, desc) in self.values.iter().zip(SETTINGS) {
            desc.write(&mut settings, slot.load(Ordering::Relaxed));
        }
        settings
    }
}
