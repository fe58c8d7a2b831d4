// Web-Modul: Status-Seite und JSON State/Config API

pub mod protocol;

// HTML-Datei zur Compile-Zeit einbinden
pub const INDEX_HTML: &str = include_str!("index.html");
