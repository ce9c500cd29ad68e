use std::env;

fn main() {
    println!("cargo:rerun-if-changed=sdkconfig.defaults");

    if env::var("ESP_IDF_SDKCONFIG_DEFAULTS").is_err() {
        eprintln!("WARNING: ESP_IDF_SDKCONFIG_DEFAULTS not set, Bluetooth may be disabled.");
        eprintln!("Set it in .cargo/config.toml or export ESP_IDF_SDKCONFIG_DEFAULTS=sdkconfig.defaults");
    }

    embuild::espidf::sysenv::output();
}
