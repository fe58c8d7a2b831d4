// Build-Script: Lädt WiFi-Credentials und konfiguriert den Linker für ESP32-C6

/// Variablen, die zur Compile-Zeit per `env!` eingebacken werden
const FORWARDED_ENV: [&str; 2] = ["WIFI_SSID", "WIFI_PASSWORD"];

fn main() {
    // Ohne .env müssen die Variablen in der Umgebung gesetzt sein
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("⚠️  .env file nicht gefunden: {}", e);
        eprintln!("   Setze {} als Environment-Variablen", FORWARDED_ENV.join(" und "));
    }

    for key in FORWARDED_ENV {
        println!("cargo:rerun-if-env-changed={}", key);
        if let Ok(value) = std::env::var(key) {
            println!("cargo:rustc-env={}={}", key, value);
        }
    }

    linker_be_nice();

    // defmt.x vor linkall.x, linkall.x muss als letztes kommen
    println!("cargo:rustc-link-arg=-Tdefmt.x");
    println!("cargo:rustc-link-arg=-Tlinkall.x");
}

/// Hinweis-Text für bekannte undefinierte Symbole
fn undefined_symbol_hint(symbol: &str) -> Option<&'static str> {
    match symbol {
        s if s.starts_with("_defmt_") => Some(
            "`defmt` not found - make sure `defmt.x` is added as a linker script and a defmt transport (esp-println) is linked",
        ),
        "_stack_start" => Some("Is the linker script `linkall.x` missing?"),
        s if s.starts_with("esp_rtos_") => Some(
            "`esp-radio` has no scheduler enabled. Make sure you have initialized `esp-rtos` or provided an external scheduler.",
        ),
        "free" | "malloc" | "calloc" | "get_free_internal_heap_size" | "malloc_internal"
        | "realloc_internal" | "calloc_internal" | "free_internal" => Some(
            "Did you forget the `esp-alloc` dependency or didn't enable the `compat` feature on it?",
        ),
        _ => None,
    }
}

// Wird vom Linker als "--error-handling-script" erneut aufgerufen
fn linker_be_nice() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 2 {
        if args[1] != "undefined-symbol" {
            std::process::exit(1);
        }
        if let Some(hint) = undefined_symbol_hint(&args[2]) {
            eprintln!();
            eprintln!("💡 {}", hint);
            eprintln!();
        }
        std::process::exit(0);
    }

    match std::env::current_exe() {
        Ok(exe) => println!(
            "cargo:rustc-link-arg=--error-handling-script={}",
            exe.display()
        ),
        Err(e) => eprintln!("⚠️  Linker error handler not registered: {}", e),
    }
}
