use std::path::PathBuf;
use std::time::Duration;

/// DAAD 国際プログラム検索結果ページ
pub const DAAD_RESULT_URL: &str =
    "https://www2.daad.de/deutschland/studienangebote/international-programmes/en/result/";

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// 検索結果ページのベースURL
    pub base_url: String,
    pub headless: bool,
    /// 要素待機のタイムアウト
    pub timeout: Duration,
    /// 検索結果ページ読み込み後の待機時間
    pub settle: Duration,
    /// Chrome 実行ファイル（未指定なら自動検出）
    pub chrome_path: Option<PathBuf>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DAAD_RESULT_URL.to_string(),
            headless: true,
            timeout: Duration::from_secs(10),
            settle: Duration::from_secs(3),
            chrome_path: None,
        }
    }
}

impl ScraperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }
}

/// HTTPサーバー設定
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub scraper: ScraperConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            scraper: ScraperConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 環境変数から設定を読み込む
    ///
    /// `HOST`, `PORT`, `CHROME_PATH` (`CHROMIUM_PATH`), `SCRAPER_HEADLESS`,
    /// `SCRAPER_TIMEOUT_SECS`。不正な値はデフォルトにフォールバックする。
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse().ok()) {
            config.port = port;
        }
        if let Some(path) = lookup("CHROME_PATH").or_else(|| lookup("CHROMIUM_PATH")) {
            config.scraper = config.scraper.with_chrome_path(path);
        }
        if let Some(headless) = lookup("SCRAPER_HEADLESS").and_then(|v| parse_bool(&v)) {
            config.scraper = config.scraper.with_headless(headless);
        }
        if let Some(secs) = lookup("SCRAPER_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            config.scraper = config.scraper.with_timeout(Duration::from_secs(secs));
        }

        config
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_builder() {
        let config = ScraperConfig::new()
            .with_headless(false)
            .with_timeout(Duration::from_secs(20))
            .with_settle(Duration::from_millis(500))
            .with_chrome_path("/usr/bin/chromium")
            .with_base_url("http://localhost/result/");

        assert!(!config.headless);
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.settle, Duration::from_millis(500));
        assert_eq!(config.chrome_path, Some(PathBuf::from("/usr/bin/chromium")));
        assert_eq!(config.base_url, "http://localhost/result/");
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr(), ("0.0.0.0".to_string(), 5000));
        assert!(config.scraper.headless);
        assert_eq!(config.scraper.timeout, Duration::from_secs(10));
        assert_eq!(config.scraper.base_url, DAAD_RESULT_URL);
    }

    #[test]
    fn test_server_config_from_env_values() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("CHROMIUM_PATH", "/opt/chromium"),
            ("SCRAPER_HEADLESS", "false"),
            ("SCRAPER_TIMEOUT_SECS", "30"),
        ]));

        assert_eq!(config.bind_addr(), ("127.0.0.1".to_string(), 8080));
        assert_eq!(config.scraper.chrome_path, Some(PathBuf::from("/opt/chromium")));
        assert!(!config.scraper.headless);
        assert_eq!(config.scraper.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_env_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("SCRAPER_HEADLESS", "maybe"),
        ]));

        assert_eq!(config.port, 5000);
        assert!(config.scraper.headless);
    }
}
