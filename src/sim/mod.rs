//! Host-side simulated drivers.
//!
//! Everything here is constructed explicitly and passed to exactly the
//! devices that share it: a [`PeerBus`] stands in for the air between
//! radios, a [`SerialCable`] joins one device's OUTPUT jack to another's
//! INPUT jack, and a [`ManualClock`] is advanced by the test. Nothing is
//! global, so independent tests never see each other's traffic.
//!
//! ```rust
//! use quickdraw_core::device::{Device, MacAddress};
//! use quickdraw_core::sim::{ManualClock, PeerBus, SerialCable, SimPdn};
//!
//! let bus = PeerBus::new();
//! let clock = ManualClock::new();
//! let mut a = SimPdn::new(MacAddress([0xA; 6]), &bus, &clock);
//! let b = SimPdn::new(MacAddress([0xB; 6]), &bus, &clock);
//! let _cable = SerialCable::plug(&a.output_jack, &b.input_jack);
//!
//! clock.advance(10);
//! assert_eq!(a.device.now_ms(), 10);
//! ```

mod clock;
mod http;
mod peripherals;
mod radio;
mod serial;

pub use clock::ManualClock;
pub use http::SimHttpClient;
pub use peripherals::{MemoryStorage, NullHaptics, NullScreen};
pub use radio::{PeerBus, SentPacket, SimPeerComms};
pub use serial::{SerialCable, SimJack};

use crate::device::{MacAddress, Pdn, PdnDrivers};

/// A [`Pdn`] on simulated drivers, with handles to poke at them.
pub struct SimPdn {
    pub device: Pdn,
    pub mac: MacAddress,
    pub output_jack: SimJack,
    pub input_jack: SimJack,
    pub http: SimHttpClient,
}

impl SimPdn {
    pub fn new(mac: MacAddress, bus: &PeerBus, clock: &ManualClock) -> Self {
        let output_jack = SimJack::new();
        let input_jack = SimJack::new();
        let http = SimHttpClient::new();

        let device = Pdn::new(PdnDrivers {
            clock: Box::new(clock.clone()),
            output_jack: Box::new(output_jack.clone()),
            input_jack: Box::new(input_jack.clone()),
            peer_comms: Box::new(SimPeerComms::new(mac, bus)),
            http_client: Box::new(http.clone()),
            haptics: Box::new(NullHaptics::default()),
            display: Box::new(NullScreen::default()),
            storage: Box::new(MemoryStorage::default()),
        });

        Self {
            device,
            mac,
            output_jack,
            input_jack,
            http,
        }
    }
}
