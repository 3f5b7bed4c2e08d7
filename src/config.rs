//! 用户配置（`<config_dir>/publicbin/settings.toml`）
//!
//! 取值顺序：命令行参数 > 配置文件 > 默认值。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

pub const APP_DIR: &str = "publicbin";
const CONFIG_FILE: &str = "settings.toml";

/// 默认的 pin 服务地址
pub const DEFAULT_API_URL: &str = "https://functions.poehali.dev/0faf505c-400d-47c3-b94e-eff3015e9f7a";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// settings.toml 的内容
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub api_url: Option<String>,
    pub language: Option<String>,
    pub http_timeout_secs: Option<u64>,
}

impl Config {
    /// 合并后的服务地址
    pub fn api_url(&self, cli_override: Option<&str>) -> Result<Url> {
        let raw = cli_override
            .or(self.api_url.as_deref())
            .unwrap_or(DEFAULT_API_URL);
        let url = Url::parse(raw)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "api url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(url)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// 读取配置；文件不存在时返回默认值
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => return Ok(Config::default()),
        },
    };
    if !path.exists() {
        return Ok(Config::default());
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "loaded settings");
    Ok(config)
}

/// 数据目录 (~/.local/share/publicbin/)，可由命令行覆盖
pub fn data_dir(cli_override: Option<&Path>) -> Result<PathBuf> {
    let data_dir = match cli_override {
        Some(dir) => dir.to_path_buf(),
        None => dirs::data_dir()
            .ok_or_else(|| Error::Config("cannot determine the user data directory".to_string()))?
            .join(APP_DIR),
    };

    fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(Some(&dir.path().join("settings.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "api_url = \"http://localhost:8080/pins\"\nlanguage = \"de\"\nhttp_timeout_secs = 5\n",
        )
        .unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.language.as_deref(), Some("de"));
        assert_eq!(config.http_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.api_url(None).unwrap().as_str(),
            "http://localhost:8080/pins"
        );
    }

    #[test]
    fn test_unknown_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "colour = \"blue\"\n").unwrap();
        assert!(matches!(load(Some(&path)), Err(Error::Toml(_))));
    }

    #[test]
    fn test_api_url_precedence() {
        let config = Config {
            api_url: Some("https://example.com/file".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.api_url(Some("http://127.0.0.1:9000/")).unwrap().as_str(),
            "http://127.0.0.1:9000/"
        );
        assert_eq!(config.api_url(None).unwrap().host_str(), Some("example.com"));
        assert_eq!(
            Config::default().api_url(None).unwrap().as_str(),
            DEFAULT_API_URL
        );
    }

    #[test]
    fn test_api_url_rejects_other_schemes() {
        let config = Config::default();
        assert!(matches!(
            config.api_url(Some("ftp://example.com")),
            Err(Error::Config(_))
        ));
        assert!(matches!(config.api_url(Some("not a url")), Err(Error::Url(_))));
    }

    #[test]
    fn test_data_dir_override_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("publicbin");
        let resolved = data_dir(Some(&nested)).unwrap();
        assert_eq!(resolved, nested);
        assert!(nested.is_dir());
    }
}
