//! MFRC522 (RC522) RFID reader on ESP32 SPI.
//!
//! Each gate channel has its own reader on a shared SPI bus with a separate
//! chip select.
//!
//! # Presence
//!
//! A tag held on the antenna must keep reading as present so the dispatcher
//! can detect the departure edge. Polling therefore uses WUPA, which also
//! wakes cards put into HALT by [`acknowledge`](TagReader::acknowledge).
//! A WUPA timeout means no card is in the field.

use mfrc522::comm::Interface;
use mfrc522::{Initialized, Mfrc522};
use tracing::{debug, trace};

use crate::traits::{TagId, TagReader};

/// Reader error.
pub type RfidError<E> = mfrc522::Error<E>;

/// One MFRC522 reader.
pub struct Esp32Rfid<COMM: Interface> {
    mfrc522: Mfrc522<COMM, Initialized>,
    label: &'static str,
}

impl<COMM: Interface> Esp32Rfid<COMM> {
    /// Wrap an initialized reader. `label` names it in logs.
    pub fn new(mfrc522: Mfrc522<COMM, Initialized>, label: &'static str) -> Self {
        Self { mfrc522, label }
    }

    /// Chip firmware version (0x91 or 0x92 for genuine parts).
    pub fn version(&mut self) -> Result<u8, RfidError<COMM::Error>> {
        self.mfrc522.version()
    }
}

impl<COMM: Interface> TagReader for Esp32Rfid<COMM> {
    type Error = RfidError<COMM::Error>;

    fn read_tag(&mut self) -> Result<Option<TagId>, Self::Error> {
        let atqa = match self.mfrc522.wupa() {
            Ok(atqa) => atqa,
            Err(mfrc522::Error::Timeout) => return Ok(None),
            Err(e) => return Err(e),
        };

        let uid = match self.mfrc522.select(&atqa) {
            Ok(uid) => uid,
            // Card left the field between WUPA and anticollision
            Err(mfrc522::Error::Timeout) => return Ok(None),
            Err(e) => return Err(e),
        };

        let bytes = uid.as_bytes();
        if bytes.len() < 4 {
            debug!(reader = self.label, len = bytes.len(), "short UID ignored");
            return Ok(None);
        }
        let id = TagId::new([bytes[0], bytes[1], bytes[2], bytes[3]]);
        trace!(reader = self.label, %id, "tag in field");
        Ok(Some(id))
    }

    fn acknowledge(&mut self) -> Result<(), Self::Error> {
        self.mfrc522.hlta()
    }
}
