//! DAAD スクレイパー実装
//!
//! 検索結果ページから詳細ページのリンクを集め、1件ずつ順番に開いて抽出する

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::extract::{parse_detail_links, parse_detail_page};
use super::types::CourseRecord;
use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::Scraper;

/// 要素待機のポーリング間隔（ミリ秒）
const POLL_INTERVAL_MS: u64 = 250;
/// クッキー同意モーダルの出現待機（秒）
const MODAL_WAIT_SECS: u64 = 3;

const MODAL_SELECTOR: &str = ".snoop-modal-wrapper";
const OVERVIEW_SELECTOR: &str = "#overview";
const REGISTRATION_TAB_SELECTOR: &str = "#registration-tab";
const REGISTRATION_SELECTOR: &str = "#registration";

pub struct DaadScraper {
    config: ScraperConfig,
    browser: Option<Browser>,
    page: Option<Arc<Page>>,
    handler: Option<JoinHandle<()>>,
    user_data_dir: Option<PathBuf>,
}

impl DaadScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config,
            browser: None,
            page: None,
            handler: None,
            user_data_dir: None,
        }
    }

    fn get_page(&self) -> Result<Arc<Page>, ScraperError> {
        self.page
            .clone()
            .ok_or_else(|| ScraperError::BrowserInit("Browser not initialized".into()))
    }

    /// セレクタに一致する要素が現れるまで待機（タイムアウト時は false）
    async fn wait_for_selector(
        &self,
        page: &Page,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, ScraperError> {
        let script = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        let start = Instant::now();

        loop {
            let found = page
                .evaluate(script.as_str())
                .await
                .map_err(|e| ScraperError::JavaScript(e.to_string()))?
                .into_value::<bool>()
                .unwrap_or(false);

            if found {
                return Ok(true);
            }
            if start.elapsed() >= timeout {
                debug!("'{}' not found after {:?}", selector, timeout);
                return Ok(false);
            }
            sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
    }

    /// クッキー同意モーダルを削除
    async fn remove_modal(&self, page: &Page) -> Result<(), ScraperError> {
        if self
            .wait_for_selector(page, MODAL_SELECTOR, Duration::from_secs(MODAL_WAIT_SECS))
            .await?
        {
            sleep(Duration::from_secs(1)).await;
        }

        page.evaluate(
            r#"
            document.querySelectorAll('.snoop-modal-wrapper, .snoop-modal-backdrop')
                .forEach(el => el.remove());
        "#,
        )
        .await
        .map_err(|e| ScraperError::JavaScript(e.to_string()))?;

        sleep(Duration::from_secs(1)).await;
        Ok(())
    }

    /// 出願タブ (#registration-tab) を開く
    async fn open_registration_tab(&self, page: &Page) -> Result<(), ScraperError> {
        self.remove_modal(page).await?;

        if !self
            .wait_for_selector(page, REGISTRATION_TAB_SELECTOR, self.config.timeout)
            .await?
        {
            return Err(ScraperError::ElementNotFound(
                REGISTRATION_TAB_SELECTOR.to_string(),
            ));
        }

        let clicked: bool = page
            .evaluate(
                r#"
                (function() {
                    var tab = document.querySelector('#registration-tab');
                    if (!tab) {
                        return false;
                    }
                    tab.scrollIntoView(true);
                    tab.click();
                    return true;
                })()
                "#,
            )
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?
            .into_value()
            .unwrap_or(false);

        if !clicked {
            return Err(ScraperError::ElementNotFound(
                REGISTRATION_TAB_SELECTOR.to_string(),
            ));
        }

        if !self
            .wait_for_selector(page, REGISTRATION_SELECTOR, self.config.timeout)
            .await?
        {
            return Err(ScraperError::Timeout(format!(
                "{} did not appear within {:?}",
                REGISTRATION_SELECTOR, self.config.timeout
            )));
        }

        sleep(Duration::from_secs(1)).await;
        Ok(())
    }
}

#[async_trait]
impl Scraper for DaadScraper {
    async fn initialize(&mut self) -> Result<(), ScraperError> {
        info!("Initializing browser for DAAD scraper...");

        // リクエストごとに別プロファイルを使う
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let user_data_dir = std::env::temp_dir().join(format!("course-scraper-{}", unique_id));

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&user_data_dir)
            .window_size(1920, 1080)
            .no_sandbox()
            .request_timeout(Duration::from_secs(60))
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage");

        if let Some(path) = &self.config.chrome_path {
            builder = builder.chrome_executable(path);
        }
        if !self.config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(format!("Browser config error: {}", e)))?;

        // 起動や new_page が失敗しても close() で後始末できるよう先に保持する
        self.user_data_dir = Some(user_data_dir);

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // ブラウザイベントハンドラをバックグラウンドで実行
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        self.handler = Some(handler_task);
        let browser = self.browser.insert(browser);

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;
        self.page = Some(Arc::new(page));

        info!("Browser initialized successfully");
        Ok(())
    }

    async fn detail_links(&mut self, search_url: &str) -> Result<Vec<String>, ScraperError> {
        let page = self.get_page()?;
        info!("Searching: {}", search_url);

        page.goto(search_url)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;

        sleep(self.config.settle).await;

        let html = page
            .content()
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;
        let current_url = page
            .url()
            .await
            .ok()
            .flatten()
            .unwrap_or_else(|| search_url.to_string());

        parse_detail_links(&html, &current_url)
    }

    async fn extract_course(&mut self, url: &str) -> Result<CourseRecord, ScraperError> {
        let page = self.get_page()?;

        page.goto(url)
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;

        if !self
            .wait_for_selector(&page, OVERVIEW_SELECTOR, self.config.timeout)
            .await?
        {
            return Err(ScraperError::Timeout(format!(
                "{} did not appear within {:?}",
                OVERVIEW_SELECTOR, self.config.timeout
            )));
        }

        // 出願タブが開けなくても概要は記録する
        let with_registration = match self.open_registration_tab(&page).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Error in registration tab for {}: {}", url, e);
                false
            }
        };

        let html = page
            .content()
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;

        let record = parse_detail_page(&html, url, with_registration)?;
        debug!("Extracted course: {:?}", record);
        Ok(record)
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        info!("Closing browser...");

        self.page = None;
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = browser.wait().await {
                debug!("Failed to wait for browser exit: {}", e);
            }
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        if let Some(dir) = self.user_data_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                debug!("Failed to remove profile dir {:?}: {}", dir, e);
            }
        }

        info!("Browser closed");
        Ok(())
    }
}
