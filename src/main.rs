use clap::Parser;
use env_logger::{Builder, Env, Target};
use log::{error, info};
use std::process;
use xkcd_downloader::configuration::Settings;
use xkcd_downloader::run::run;

#[derive(clap::Parser)]
#[command(version, about = "Bulk-download every published xkcd comic")]
struct Args {
    /// Directory the comic images are saved into
    download_dir: String,

    /// Optional settings file overriding the built-in defaults
    #[clap(short, long)]
    config_file: Option<String>,
}

#[tokio::main]
async fn main() {
    // Init logging
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.target(Target::Stdout);
    builder.init();

    // Parse Args
    let args = Args::parse();
    info!("xkcd downloader {}", env!("CARGO_PKG_VERSION"));

    // Parse Settings
    let settings = Settings::new(args.config_file.as_deref());
    if let Err(e) = settings {
        error!("Configuration error: {}", e);
        process::exit(1);
    }
    let s = settings.unwrap();

    // Run
    if let Err(e) = run(&s, &args.download_dir).await {
        error!("Application error: {:#}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clap_test() {
        use clap::CommandFactory;
        Args::command().debug_assert()
    }
}
