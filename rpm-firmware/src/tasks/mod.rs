// Task-Modul: Enthält alle Embassy Tasks
//
// Tasks kommunizieren über Embassy Channels (RPM → HTTP Status, HTTP → RPM Config).

pub mod http;
pub mod rpm_meter;
pub mod wifi;

// Re-export Tasks für einfachen Import
pub use http::http_server_task;
pub use rpm_meter::{rpm_meter_logic, rpm_meter_task};
pub use wifi::{connection_task, dhcp_task, net_task};
