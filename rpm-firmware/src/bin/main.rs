// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

// Heap Allocator (WiFi benötigt dynamischen Speicher)
extern crate alloc;

use defmt::info;
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Stack, StackResources};
use embassy_time::{Duration, Timer};

use esp_hal::clock::CpuClock;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;

use {esp_backtrace as _, esp_println as _};

use esp_rpm_meter::config::{EXTRA_HEAP_SIZE, HTTP_TASK_COUNT, WIFI_HEAP_SIZE};
use esp_rpm_meter::tasks::{
    connection_task, dhcp_task, http_server_task, net_task, rpm_meter_task,
};
use esp_rpm_meter::{ConfigCommandChannel, RpmStatusChannel};

// ESP-IDF App Descriptor - ohne ihn lehnt der Bootloader das Image ab
esp_bootloader_esp_idf::esp_app_desc!();

/// Socket-Bedarf: je ein Listener pro HTTP-Task plus DHCP und DNS
const NET_SOCKETS: usize = HTTP_TASK_COUNT + 2;

/// Main Entry Point
///
/// Initialisiert Hardware und WiFi, spawnt RPM-, WiFi- und HTTP-Tasks.
/// Danach schläft main() - alle Arbeit läuft in Tasks.
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    // Embassy Runtime (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    // Channels zwischen RPM-Task und WebSocket-Clients
    static STATUS_CHANNEL: static_cell::StaticCell<RpmStatusChannel> =
        static_cell::StaticCell::new();
    let status_channel = &*STATUS_CHANNEL.init(RpmStatusChannel::new());
    let status_publisher = status_channel
        .publisher()
        .expect("status channel has a publisher slot");

    static COMMAND_CHANNEL: static_cell::StaticCell<ConfigCommandChannel> =
        static_cell::StaticCell::new();
    let command_channel = COMMAND_CHANNEL.init(ConfigCommandChannel::new());
    let command_sender = command_channel.sender();
    let command_receiver = command_channel.receiver();

    // Der RPM-Task startet vor WiFi: das Segment funktioniert auch ohne Netz
    spawner
        .spawn(rpm_meter_task(
            peripherals.GPIO8,
            peripherals.RMT,
            peripherals.UART1,
            peripherals.GPIO4,
            peripherals.GPIO5,
            peripherals.GPIO7,
            status_publisher,
            command_receiver,
        ))
        .expect("spawn rpm_meter_task");

    static RADIO_INIT: static_cell::StaticCell<esp_radio::Controller> =
        static_cell::StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Random seed für TCP/IP Stack (Hardware RNG)
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    static RESOURCES: static_cell::StaticCell<StackResources<NET_SOCKETS>> =
        static_cell::StaticCell::new();
    let resources = RESOURCES.init(StackResources::new());

    let (stack, runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        resources,
        seed,
    );

    static STACK: static_cell::StaticCell<Stack<'static>> = static_cell::StaticCell::new();
    let stack = &*STACK.init(stack);

    spawner
        .spawn(connection_task(wifi_controller))
        .expect("spawn connection_task");
    spawner.spawn(net_task(runner)).expect("spawn net_task");
    spawner.spawn(dhcp_task(stack)).expect("spawn dhcp_task");

    for task_id in 0..HTTP_TASK_COUNT {
        spawner
            .spawn(http_server_task(
                task_id,
                stack,
                status_channel,
                command_sender,
            ))
            .expect("spawn http_server_task");
    }

    info!("Main: All tasks spawned");

    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
