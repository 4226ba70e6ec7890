use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILE: &str = "healcheck_nginx.log";
const DEFAULT_FILTER: &str = "healcheck_nginx=info";

/// Installs the global subscriber: stderr always, plus `log_file` when given
/// and writable. stdout is left alone, it carries the discovery document.
///
/// Keep the returned guard alive until exit or buffered file lines are lost.
pub fn init(log_file: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let (file_layer, guard) = match log_file.and_then(file_appender) {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
    {
        eprintln!("warning: logger already installed: {}", err);
    }

    guard
}

/// Opens `path` for appending. The subscriber is not up yet, so a failure
/// goes to stderr and logging falls back to stderr only.
fn file_appender(path: &Path) -> Option<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

    match RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
    {
        Ok(appender) => Some(appender),
        Err(err) => {
            eprintln!(
                "warning: cannot log to {}, logging to stderr only: {}",
                path.display(),
                err
            );
            None
        }
    }
}
