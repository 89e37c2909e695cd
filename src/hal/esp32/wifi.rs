//! Wi-Fi access point for the gate's local web API.
//!
//! The gate sits in a barn with no infrastructure network, so it hosts its
//! own access point and serves the status page at the AP gateway address
//! (192.168.71.1 by default in ESP-IDF).
//!
//! # Example
//!
//! ```ignore
//! use barn_gate::hal::esp32::Esp32Wifi;
//! use barn_gate::config::WifiConfig;
//!
//! let config = WifiConfig::default().with_ssid("BarnGate");
//! let wifi = Esp32Wifi::access_point(modem, sysloop, nvs, &config)?;
//! tracing::info!(ip = ?wifi.ip_addr(), "AP up");
//! ```

use std::net::Ipv4Addr;

use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, BlockingWifi, Configuration, EspWifi,
};
use tracing::info;

use crate::config::WifiConfig;

/// Access point mode Wi-Fi.
///
/// The AP is started during construction and stays up for the lifetime of
/// this struct.
pub struct Esp32Wifi<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
}

impl<'a> Esp32Wifi<'a> {
    /// Start an access point from `config`.
    ///
    /// An empty password starts an open network.
    ///
    /// # Errors
    ///
    /// Returns an error if driver initialization or AP startup fails.
    pub fn access_point(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let auth_method = if config.is_secured() {
            AuthMethod::WPA2Personal
        } else {
            AuthMethod::None
        };

        wifi.set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
            ssid: config.ap_ssid(),
            password: config.ap_password(),
            channel: config.channel,
            auth_method,
            ..Default::default()
        }))?;

        wifi.start()?;
        wifi.wait_netif_up()?;

        let this = Self { wifi };
        info!(
            ssid = config.ssid.as_str(),
            channel = config.channel,
            secured = config.is_secured(),
            ip = ?this.ip_addr(),
            "access point up"
        );
        Ok(this)
    }

    /// Gateway address clients reach the web API on.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .ap_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// True while the AP is running.
    pub fn is_started(&self) -> bool {
        self.wifi.is_started().unwrap_or(false)
    }
}
