/// Initialise the global logger. `RUST_LOG` still wins over `debug`.
pub fn init_logging(debug: bool) {
    let filter = if debug { "debug" } else { "warn" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{}] {} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
