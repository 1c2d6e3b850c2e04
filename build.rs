fn main() {
    println!("cargo:rerun-if-env-changed=PLAYBUTTONS_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=PLAYBUTTONS_WIFI_PASSWORD");
    println!("cargo:rerun-if-env-changed=PLAYBUTTONS_MQTT_URL");

    // Host builds (tests, fuzzing) carry no ESP-IDF toolchain.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
