//! Inert peripherals and an in-memory key/value store.

use crate::device::{Haptics, Screen, Storage};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct NullHaptics {
    pub intensity: u8,
}

impl Haptics for NullHaptics {
    fn set_intensity(&mut self, intensity: u8) {
        self.intensity = intensity;
    }
}

#[derive(Debug, Default)]
pub struct NullScreen;

impl Screen for NullScreen {
    fn clear(&mut self) {}

    fn draw_text(&mut self, _line: u8, _text: &str) {}
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}
