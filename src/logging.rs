use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Initialise the `env_logger` backend; `RUST_LOG` overrides the default filter
pub fn init_logger() {
    let env = Env::default().filter_or("RUST_LOG", "warn,dualsub=info");

    let mut builder = Builder::from_env(env);

    // HTTP stack is noisy at debug level
    builder
        .filter_module("hyper", LevelFilter::Error)
        .filter_module("reqwest", LevelFilter::Warn)
        .filter_module("mio", LevelFilter::Error)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);

    // A second init (tests, embedding apps) keeps the first logger
    if builder.try_init().is_err() {
        log::debug!("Logger already initialised");
    }
}
