//! Convert the nginx upstream health check json into zabbix json for
//! template discovery.
//!
//! Run with
//!
//! ```not_rust
//! NGINX_IP=172.17.0.2 healcheck_nginx
//! healcheck_nginx --url http://127.0.0.1/status/bestatus?format=json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use healcheck_nginx::config::{Config, ConfigSource};
use healcheck_nginx::core::logger;

#[derive(Parser, Debug)]
#[command(name = "healcheck_nginx", version)]
#[command(about = "Convert nginx-healcheck json to zabbix-json use for template discovery")]
struct Cli {
    /// config file (default is ./.healcheck_nginx.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// nginx status url, skips the config file
    #[arg(long)]
    url: Option<String>,

    /// log file
    #[arg(long, default_value = logger::DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// log to stderr only
    #[arg(long)]
    no_log_file: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = logger::init((!cli.no_log_file).then_some(cli.log_file.as_path()));

    let source = ConfigSource {
        url: cli.url,
        config_file: cli.config,
        ..ConfigSource::default()
    };
    let config = match Config::load(&source) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    match healcheck_nginx::run(&config).await {
        Ok(discovery) => {
            println!("{}", discovery);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
