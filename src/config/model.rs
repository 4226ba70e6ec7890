use serde::{de::DeserializeOwned, Deserialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use crate::core::error::{Error, Result};

pub const DEFAULT_CONFIG_FILE: &str = ".healcheck_nginx.toml";
pub const NGINX_IP_ENV: &str = "NGINX_IP";
pub const URL_OVERRIDE_ENV: &str = "NGINXCONTAINERIP";
const STATUS_PATH: &str = "/status/bestatus";

// 用来接收 .healcheck_nginx.toml 解析结果
#[derive(Deserialize, Debug, Default)]
pub struct ConfigFile {
    #[serde(rename = "NginxContainerIP", alias = "nginx_container_ip", default)]
    pub nginx_container_ip: Option<String>,
}

/// HTTP client limits. A stalled nginx must not hang the zabbix agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub tls_handshake_timeout: Duration,
    pub response_header_timeout: Duration,
    pub tcp_keepalive: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            connect_timeout: Duration::from_secs(30),
            tls_handshake_timeout: Duration::from_secs(6),
            response_header_timeout: Duration::from_millis(5000),
            tcp_keepalive: Duration::from_secs(15),
            pool_idle_timeout: Duration::from_secs(30),
            pool_max_idle_per_host: 100,
        }
    }
}

impl TransportConfig {
    /// Upper bound for getting the response head: dial, handshake, then
    /// waiting for the first byte.
    pub fn header_deadline(&self) -> Duration {
        self.connect_timeout + self.tls_handshake_timeout + self.response_header_timeout
    }
}

/// Where to look for the status url.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// `--url`, wins over everything else.
    pub url: Option<String>,
    /// `--config`; when unset the default file in `work_dir` is used.
    pub config_file: Option<PathBuf>,
    pub work_dir: PathBuf,
}

impl Default for ConfigSource {
    fn default() -> Self {
        ConfigSource {
            url: None,
            config_file: None,
            work_dir: PathBuf::from("."),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub nginx_status_url: String,
    pub transport: TransportConfig,
}

impl Config {
    pub fn load(source: &ConfigSource) -> Result<Config> {
        Config::load_with_env(source, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`] with the environment lookup passed in.
    pub fn load_with_env<F>(source: &ConfigSource, env: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = source.url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(Config::with_url(url));
        }

        let path = match &source.config_file {
            Some(path) => path.clone(),
            None => {
                let path = source.work_dir.join(DEFAULT_CONFIG_FILE);
                if !path.exists() {
                    bootstrap_config_file(&path, lookup(NGINX_IP_ENV).as_deref())?;
                }
                path
            }
        };

        let mut url = if path.exists() {
            load_config::<ConfigFile>(&path)?.nginx_container_ip
        } else {
            error!(
                "{} does not exist, create it first before use",
                path.display()
            );
            None
        };

        if let Some(from_env) = lookup(URL_OVERRIDE_ENV) {
            info!("{} overrides configured url", URL_OVERRIDE_ENV);
            url = Some(from_env);
        }

        match url.filter(|u| !u.trim().is_empty()) {
            Some(url) => Ok(Config::with_url(&url)),
            None => Err(Error::Config("no nginx status url configured".to_string())),
        }
    }

    fn with_url(url: &str) -> Config {
        Config {
            nginx_status_url: url.trim().to_string(),
            transport: TransportConfig::default(),
        }
    }
}

/// Writes a default config pointing at `http://<nginx_ip>/status/bestatus`.
/// Without `NGINX_IP` nothing is written.
fn bootstrap_config_file(path: &Path, nginx_ip: Option<&str>) -> Result<()> {
    let Some(nginx_ip) = nginx_ip else {
        error!("{} variable not set or empty", NGINX_IP_ENV);
        return Ok(());
    };
    info!("{}: {}", NGINX_IP_ENV, nginx_ip);
    let content = format!("NginxContainerIP='http://{}{}'", nginx_ip.trim(), STATUS_PATH);
    std::fs::write(path, content).map_err(|e| {
        Error::Config(format!("failure create file {}: {}", path.display(), e))
    })
}

// 加载指定配置文件, yml/yaml 走 serde_yaml, 其余按 toml 处理
fn load_config<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failure read file {}: {}", path.display(), e)))?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yml") | Some("yaml")
    );
    if is_yaml {
        serde_yaml::from_str::<T>(&content)
            .map_err(|e| Error::Config(format!("invalid yaml in {}: {}", path.display(), e)))
    } else {
        toml::from_str::<T>(&content)
            .map_err(|e| Error::Config(format!("invalid toml in {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn source_in(dir: &Path) -> ConfigSource {
        ConfigSource {
            work_dir: dir.to_path_buf(),
            ..ConfigSource::default()
        }
    }

    #[test]
    fn reads_default_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "NginxContainerIP='http://10.1.1.1/status/bestatus'\n",
        )
        .unwrap();
        let config = Config::load_with_env(&source_in(dir.path()), env_of(&[])).unwrap();
        assert_eq!(config.nginx_status_url, "http://10.1.1.1/status/bestatus");
        assert_eq!(config.transport, TransportConfig::default());
    }

    #[test]
    fn reads_yaml_file_given_explicitly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("healcheck.yml");
        std::fs::write(&path, "nginx_container_ip: http://nginx:8080/status\n").unwrap();
        let source = ConfigSource {
            config_file: Some(path),
            ..source_in(dir.path())
        };
        let config = Config::load_with_env(&source, env_of(&[])).unwrap();
        assert_eq!(config.nginx_status_url, "http://nginx:8080/status");
    }

    #[test]
    fn bootstraps_file_from_nginx_ip() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            Config::load_with_env(&source_in(dir.path()), env_of(&[("NGINX_IP", "172.17.0.2")]))
                .unwrap();
        assert_eq!(config.nginx_status_url, "http://172.17.0.2/status/bestatus");
        let written = std::fs::read_to_string(dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(written, "NginxContainerIP='http://172.17.0.2/status/bestatus'");
    }

    #[test]
    fn existing_file_is_not_overwritten_by_bootstrap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "NginxContainerIP='http://keep/status'").unwrap();
        let config =
            Config::load_with_env(&source_in(dir.path()), env_of(&[("NGINX_IP", "10.0.0.1")]))
                .unwrap();
        assert_eq!(config.nginx_status_url, "http://keep/status");
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "NginxContainerIP='http://keep/status'"
        );
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "NginxContainerIP='http://from-file/status'",
        )
        .unwrap();
        let config = Config::load_with_env(
            &source_in(dir.path()),
            env_of(&[("NGINXCONTAINERIP", "http://from-env/status")]),
        )
        .unwrap();
        assert_eq!(config.nginx_status_url, "http://from-env/status");
    }

    #[test]
    fn cli_url_wins() {
        let dir = tempfile::tempdir().unwrap();
        let source = ConfigSource {
            url: Some("http://cli/status".to_string()),
            ..source_in(dir.path())
        };
        let config = Config::load_with_env(
            &source,
            env_of(&[("NGINXCONTAINERIP", "http://from-env/status")]),
        )
        .unwrap();
        assert_eq!(config.nginx_status_url, "http://cli/status");
        assert!(!dir.path().join(DEFAULT_CONFIG_FILE).exists());
    }

    #[test]
    fn no_url_anywhere_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_with_env(&source_in(dir.path()), env_of(&[("NGINX_IP", "  ")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {:?}", err);
        assert!(!dir.path().join(DEFAULT_CONFIG_FILE).exists());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "NginxContainerIP = [").unwrap();
        let err = Config::load_with_env(&source_in(dir.path()), env_of(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn header_deadline_sums_transport_budgets() {
        assert_eq!(
            TransportConfig::default().header_deadline(),
            Duration::from_secs(41)
        );
    }
}
