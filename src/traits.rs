use async_trait::async_trait;
use tracing::{info, warn};

use crate::daad::CourseRecord;
use crate::error::ScraperError;

#[async_trait]
pub trait Scraper: Send + Sync {
    /// ブラウザ初期化
    async fn initialize(&mut self) -> Result<(), ScraperError>;

    /// 検索結果ページから詳細ページのURLを収集
    async fn detail_links(&mut self, search_url: &str) -> Result<Vec<String>, ScraperError>;

    /// 詳細ページからコース情報を抽出
    async fn extract_course(&mut self, url: &str) -> Result<CourseRecord, ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// 一括実行（initialize → detail_links → extract_course × N → close）
    ///
    /// 詳細ページ単位の失敗はログに残してスキップする。
    /// 初期化やリンク収集に失敗した場合もブラウザは閉じる。
    async fn execute(&mut self, search_url: &str) -> Result<Vec<CourseRecord>, ScraperError> {
        if let Err(e) = self.initialize().await {
            if let Err(close_err) = self.close().await {
                warn!("Failed to close browser: {}", close_err);
            }
            return Err(e);
        }

        let links = match self.detail_links(search_url).await {
            Ok(links) => links,
            Err(e) => {
                if let Err(close_err) = self.close().await {
                    warn!("Failed to close browser: {}", close_err);
                }
                return Err(e);
            }
        };

        let total = links.len();
        info!("Found {} course detail pages", total);

        let mut courses = Vec::with_capacity(total);
        for (idx, url) in links.iter().enumerate() {
            info!("Scraping course {}/{}: {}", idx + 1, total, url);
            match self.extract_course(url).await {
                Ok(course) => courses.push(course),
                Err(e) => warn!("Error in URL {}: {}", url, e),
            }
        }

        self.close().await?;
        Ok(courses)
    }
}
