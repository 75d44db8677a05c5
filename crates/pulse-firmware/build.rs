/// Keys forwarded from the environment (or a local `.env` file) into the
/// firmware as compile-time configuration.
const CONFIG_KEYS: &[&str] = &[
    "PULSE_SSID",
    "PULSE_PASSWORD",
    "PULSE_BROKER_HOST",
    "PULSE_BROKER_PORT",
    "PULSE_TOPIC",
    "PULSE_PUBLISH_MODE",
];

fn main() {
    // Credentials live in an uncommitted .env next to this crate.
    let _ = dotenvy::dotenv();

    for key in CONFIG_KEYS {
        if let Ok(value) = std::env::var(key) {
            println!("cargo:rustc-env={key}={value}");
        }
        println!("cargo:rerun-if-env-changed={key}");
    }
    println!("cargo:rerun-if-changed=.env");
}
