#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = raycast_core::Config::parse();
    log::info!("Starting with demo '{}'", config.demo);

    raycast_core::run(config)
}

// The web build starts from `raycast_core::start`.
#[cfg(target_arch = "wasm32")]
fn main() {}
