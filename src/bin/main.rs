use ribrecon::config::Config;
use ribrecon::driver::ReconstructionDriver;
use std::fs;
use std::io::Write as _;

fn main() {
    let config = match Config::load() {
        Ok(c) => c,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = fs::create_dir_all(&config.output_dir) {
        eprintln!("failed to create output directory: {err}");
        std::process::exit(1);
    }

    init_logging(&config);

    log::info!(
        "Started: {} with arguments {:?}",
        std::env::args().collect::<Vec<_>>().join(" "),
        config
    );

    let driver = match ReconstructionDriver::new(config) {
        Ok(d) => d,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = driver.run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

/// Mirrors every log line to stdout and to `{output_dir}/{output_filename}.log`,
/// the closest idiomatic match to the original's `FileHandler` +
/// `StreamHandler` pair without pulling in a second logging framework.
fn init_logging(config: &Config) {
    let log_path = config.output_dir.join(format!("{}.log", config.output_filename));
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(log::LevelFilter::Info);
    if let Some(mut file) = log_file {
        builder.format(move |_buf, record| {
            let line = format!("{} {} {}\n", record.level(), record.target(), record.args());
            let _ = file.write_all(line.as_bytes());
            println!("{} {} {}", record.level(), record.target(), record.args());
            Ok(())
        });
    }
    builder.init();
}
