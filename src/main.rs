use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    // Logs go to stderr; redirect it (`2>mandala.log`) when RUST_LOG is set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let cfg = mandala_tui::config::Config::parse();
    mandala_tui::app::run(cfg)
}
