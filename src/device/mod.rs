//! Device capability surface consumed by the pairing core.
//!
//! A [`Device`] bundles the monotonic clock, the two serial jacks, the
//! shared radio and the peripherals. States receive `&mut D` where
//! `D: Device` as their context, so everything they touch is reachable
//! through this trait and nothing is global.
//!
//! Drivers (serial bytes, peer radio, HTTP, clock) are traits in
//! [`drivers`]; [`Pdn`] assembles a concrete device from boxed drivers,
//! which is how both firmware and the host simulator build one.

mod drivers;
mod jack;
mod pdn;
mod peripherals;
mod serial;
mod timer;
mod wireless;

pub use drivers::{Clock, HttpClient, PeerComms, PeerPacket, SerialDriver, TransportError};
pub use jack::{Jack, MacAddress, MacParseError};
pub use pdn::{Pdn, PdnDrivers};
pub use peripherals::{Haptics, Screen, Storage};
pub use serial::{
    encode_line, LineCallback, SerialManager, SerialMessage, HEARTBEAT_TAG, LINE_END, LINE_START,
    MAC_ANNOUNCEMENT_TAG, MAX_LINE_LEN,
};
pub use timer::{Mailbox, Timer};
pub use wireless::{
    HttpMethod, HttpRequest, PacketHandler, PacketType, WirelessError, WirelessManager,
    WirelessMode, PEER_CHANNEL,
};

/// Everything a state may touch while mounted.
pub trait Device {
    /// Monotonic milliseconds since boot. Protocol timers poll this.
    fn now_ms(&self) -> u64;

    fn serial_manager(&mut self) -> &mut SerialManager;

    fn wireless_manager(&mut self) -> &mut WirelessManager;

    fn haptics(&mut self) -> &mut dyn Haptics;

    fn display(&mut self) -> &mut dyn Screen;

    fn storage(&mut self) -> &mut dyn Storage;

    /// Drain pending serial bytes and radio packets into their callbacks.
    fn pump(&mut self) {
        self.serial_manager().pump();
        self.wireless_manager().pump();
    }
}
