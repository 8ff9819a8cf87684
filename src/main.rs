use {
    clap::Parser,
    ohlc_logger::{Cli, run},
    std::panic,
};

#[tokio::main]
async fn main() {
    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Debug)
    } else {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, global_level)
        .filter(Some("ohlc_logger"), my_code_level);
    // RUST_LOG still wins
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    builder.init();

    let args = Cli::parse();
    if let Err(e) = run(args).await {
        log::error!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}
