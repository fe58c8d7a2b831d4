// WiFi Tasks - Station-Modus für die JSON State/Config API
use defmt::{Debug2Format, error, info, warn};
use embassy_net::{Runner, Stack};
use embassy_time::{Duration, Timer};
use esp_radio::wifi::{ClientConfig, ModeConfig, WifiController, WifiDevice, WifiEvent};

use crate::config::{HTTP_PORT, WIFI_PASSWORD, WIFI_RETRY_DELAY_SECS, WIFI_SSID};

/// WiFi Connection Task
///
/// Startet den Controller einmalig im Client-Modus und verbindet danach
/// in einer Schleife neu, sobald der Access Point die Verbindung trennt.
#[embassy_executor::task]
pub async fn connection_task(mut controller: WifiController<'static>) {
    info!("WiFi: Starting connection task for '{}'", WIFI_SSID);

    loop {
        if matches!(controller.is_started(), Ok(false)) {
            if let Err(e) = start_station(&mut controller).await {
                error!("WiFi: {}", e);
                retry_delay().await;
                continue;
            }
            info!("WiFi: Station started");
        }

        if let Err(e) = controller.connect_async().await {
            error!("WiFi: Connection failed: {}", Debug2Format(&e));
            retry_delay().await;
            continue;
        }
        info!("WiFi: Connected");

        controller
            .wait_for_event(WifiEvent::StaDisconnected)
            .await;
        warn!("WiFi: Disconnected from AP, reconnecting...");
        Timer::after(Duration::from_secs(2)).await;
    }
}

/// Konfiguriert SSID/Passwort und startet den Controller
async fn start_station(controller: &mut WifiController<'static>) -> Result<(), &'static str> {
    let client_config = ModeConfig::Client(
        ClientConfig::default()
            .with_ssid(WIFI_SSID.into())
            .with_password(WIFI_PASSWORD.into()),
    );

    controller
        .set_config(&client_config)
        .map_err(|_| "Failed to set configuration")?;
    controller
        .start_async()
        .await
        .map_err(|_| "Failed to start")?;
    Ok(())
}

async fn retry_delay() {
    Timer::after(Duration::from_secs(WIFI_RETRY_DELAY_SECS)).await;
}

/// Network Task
///
/// Prozessiert die Pakete des embassy-net Stacks.
#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

/// Wartet bis Link steht und eine IPv4-Adresse per DHCP vergeben ist
pub async fn wait_for_network(stack: &'static Stack<'static>) {
    loop {
        if stack.is_link_up() && stack.config_v4().is_some() {
            break;
        }
        Timer::after(Duration::from_millis(500)).await;
    }
}

/// DHCP Monitor Task
///
/// Loggt die Adresse, unter der die Status-Seite erreichbar ist.
#[embassy_executor::task]
pub async fn dhcp_task(stack: &'static Stack<'static>) {
    wait_for_network(stack).await;

    if let Some(config) = stack.config_v4() {
        info!(
            "WiFi: Got IP {}, status page on port {}",
            Debug2Format(&config.address.address()),
            HTTP_PORT
        );
        info!("  Gateway: {}", Debug2Format(&config.gateway));
    }
}
