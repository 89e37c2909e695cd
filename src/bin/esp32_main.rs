//! ESP32 barn gate firmware.
//!
//! This is the main entry point for the physical gate. It:
//! - Drives the door stepper through a STEP/DIR driver with a ramped profile
//! - Polls the entry and exit MFRC522 readers
//! - Tracks who is in the barn
//! - Hosts a Wi-Fi access point and the web API (if enabled)
//!
//! The door and the readers run in a core-pinned motor task; the HTTP
//! server runs in the ESP-IDF server task; the main thread only reports.
//!
//! # Build
//!
//! ```bash
//! # Gate only (no network)
//! cargo build --release --features esp32
//!
//! # With access point + web API
//! cargo build --release --features esp32-http
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use mfrc522::comm::blocking::spi::SpiInterface;
use mfrc522::Mfrc522;
use tracing::{info, warn};

use barn_gate::hal::esp32::{self, pins, spawn_motor_task_pinned, Esp32Rfid};
use barn_gate::services::SharedGate;
use barn_gate::{AccessDispatcher, Config, DoorController, MotorLoop, TagRegistry};

/// Status report interval of the main thread.
const REPORT_INTERVAL: Duration = Duration::from_secs(30);

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();

    tracing_subscriber::fmt().with_ansi(false).init();
    info!("barn-gate starting");

    // =========================================================================
    // Configuration
    // =========================================================================
    let config = Config::default().with_wifi(
        barn_gate::WifiConfig::default()
            .with_ssid(option_env!("GATE_AP_SSID").unwrap_or("BarnGate"))
            .with_password(option_env!("GATE_AP_PASSWORD").unwrap_or("")),
    );

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Door Stepper (STEP/DIR/EN on GPIO25/26/27)
    // =========================================================================
    let stepper = esp32::door_stepper(
        peripherals.pins.gpio25.downgrade_output(),
        peripherals.pins.gpio26.downgrade_output(),
        peripherals.pins.gpio27.downgrade_output(),
    )?;
    let door = DoorController::new(stepper, config.door)?;
    info!(
        step = pins::STEP,
        dir = pins::DIR,
        enable = pins::ENABLE,
        "door stepper ready"
    );

    // =========================================================================
    // RFID Readers (two MFRC522 on SPI2)
    // =========================================================================
    let mut rfid_rst = PinDriver::output(peripherals.pins.gpio22)?;
    rfid_rst.set_high()?;

    // Both readers borrow the bus for the whole program
    let spi: &'static SpiDriver<'static> = Box::leak(Box::new(SpiDriver::new(
        peripherals.spi2,
        peripherals.pins.gpio18,
        peripherals.pins.gpio23,
        Some(peripherals.pins.gpio19),
        &SpiDriverConfig::new(),
    )?));
    let spi_config = SpiConfig::new().baudrate(pins::SPI_BAUD_HZ.Hz());

    let entry_dev = SpiDeviceDriver::new(spi, Some(peripherals.pins.gpio5), &spi_config)?;
    let exit_dev = SpiDeviceDriver::new(spi, Some(peripherals.pins.gpio17), &spi_config)?;

    let entry = Mfrc522::new(SpiInterface::new(entry_dev))
        .init()
        .map_err(|e| anyhow!("entry reader init failed: {e:?}"))?;
    let exit = Mfrc522::new(SpiInterface::new(exit_dev))
        .init()
        .map_err(|e| anyhow!("exit reader init failed: {e:?}"))?;

    let mut entry = Esp32Rfid::new(entry, "entry");
    let mut exit = Esp32Rfid::new(exit, "exit");
    for reader in [&mut entry, &mut exit] {
        match reader.version() {
            Ok(version) => info!(version = format_args!("{version:#04x}"), "MFRC522 found"),
            Err(e) => warn!(error = ?e, "MFRC522 version read failed"),
        }
    }

    // =========================================================================
    // Shared Gate and Motor Task (APP core)
    // =========================================================================
    let gate = Arc::new(SharedGate::new(door));
    let dispatcher = AccessDispatcher::new(TagRegistry::herd(), entry, exit);
    let _motor = spawn_motor_task_pinned(MotorLoop::new(
        Arc::clone(&gate),
        dispatcher,
        config.scheduler,
    ))?;

    // =========================================================================
    // Access Point (required for HTTP)
    // =========================================================================
    #[cfg(feature = "wifi")]
    let _wifi = {
        use barn_gate::hal::esp32::Esp32Wifi;
        use esp_idf_svc::eventloop::EspSystemEventLoop;
        use esp_idf_svc::nvs::EspDefaultNvsPartition;

        let sysloop = EspSystemEventLoop::take()?;
        let nvs = EspDefaultNvsPartition::take()?;
        Esp32Wifi::access_point(peripherals.modem, sysloop, Some(nvs), &config.wifi)?
    };

    // =========================================================================
    // HTTP Server (web API + UI)
    // =========================================================================
    #[cfg(feature = "esp32-http")]
    let _server = if config.web.enabled {
        Some(barn_gate::hal::esp32::Esp32HttpServer::new(
            &config.web,
            Arc::clone(&gate),
        )?)
    } else {
        info!("web API disabled");
        None
    };

    // =========================================================================
    // Report Loop
    // =========================================================================
    loop {
        let status = gate.status();
        let door = gate.door_status();
        info!(
            count = status.count,
            goats = ?status.goats,
            door = %status.door_status,
            moves = door.stats.moves,
            failures = door.stats.failures,
            "barn"
        );
        thread::sleep(REPORT_INTERVAL);
    }
}
