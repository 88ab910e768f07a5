//! The concrete game device.

use super::drivers::{Clock, HttpClient, PeerComms, SerialDriver};
use super::peripherals::{Haptics, Screen, Storage};
use super::serial::SerialManager;
use super::wireless::WirelessManager;
use super::Device;

/// Drivers a [`Pdn`] is assembled from.
pub struct PdnDrivers {
    pub clock: Box<dyn Clock>,
    pub output_jack: Box<dyn SerialDriver>,
    pub input_jack: Box<dyn SerialDriver>,
    pub peer_comms: Box<dyn PeerComms>,
    pub http_client: Box<dyn HttpClient>,
    pub haptics: Box<dyn Haptics>,
    pub display: Box<dyn Screen>,
    pub storage: Box<dyn Storage>,
}

/// One physical game device.
pub struct Pdn {
    clock: Box<dyn Clock>,
    serial: SerialManager,
    wireless: WirelessManager,
    haptics: Box<dyn Haptics>,
    display: Box<dyn Screen>,
    storage: Box<dyn Storage>,
}

impl Pdn {
    pub fn new(drivers: PdnDrivers) -> Self {
        Self {
            clock: drivers.clock,
            serial: SerialManager::new(drivers.output_jack, drivers.input_jack),
            wireless: WirelessManager::new(drivers.peer_comms, drivers.http_client),
            haptics: drivers.haptics,
            display: drivers.display,
            storage: drivers.storage,
        }
    }
}

impl Device for Pdn {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn serial_manager(&mut self) -> &mut SerialManager {
        &mut self.serial
    }

    fn wireless_manager(&mut self) -> &mut WirelessManager {
        &mut self.wireless
    }

    fn haptics(&mut self) -> &mut dyn Haptics {
        self.haptics.as_mut()
    }

    fn display(&mut self) -> &mut dyn Screen {
        self.display.as_mut()
    }

    fn storage(&mut self) -> &mut dyn Storage {
        self.storage.as_mut()
    }
}
