use anyhow::Result;
use log::LevelFilter;
use std::path::Path;

mod app;
mod config;
mod recording;

use app::App;
use config::AppConfig;

fn setup_logger() -> Result<(), fern::InitError> {
    let level = if std::env::var_os("NBACK_DEBUG").is_some() {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

fn main() -> Result<()> {
    setup_logger()?;

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "nback.json".into());
    let config = AppConfig::load(Path::new(&config_path))?;
    log::debug!("config: {:?}", config);

    App::new(config)?.run()
}
