//! Peripherals used by game states. The pairing core never touches them.

pub trait Haptics {
    /// 0 turns the motor off.
    fn set_intensity(&mut self, intensity: u8);

    fn off(&mut self) {
        self.set_intensity(0);
    }
}

pub trait Screen {
    fn clear(&mut self);

    fn draw_text(&mut self, line: u8, text: &str);
}

/// Small key/value store.
pub trait Storage {
    fn read(&self, key: &str) -> Option<String>;

    fn write(&mut self, key: &str, value: &str);
}
