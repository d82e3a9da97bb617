//! DAAD 国際プログラム検索スクレイパー
//!
//! - 検索条件から検索URLを組み立て、ヘッドレスChromeで結果と詳細ページを巡回
//! - 詳細ページからコース情報（大学名・学位・学費・締切・出願要件など）を抽出
//! - 結果をJSON (HTTP API) またはCSVで返す
//!
//! # 使用例
//!
//! ```rust,ignore
//! use course_scraper::{ScrapeRequest, ScraperConfig, ScraperService};
//! use tower::ServiceExt;
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = ScraperService::new(ScraperConfig::default());
//!
//!     let request = ScrapeRequest::new("computer science").with_limit(5);
//!
//!     let result = service.oneshot(request).await.unwrap();
//!     println!("Courses: {}", result.courses.len());
//! }
//! ```
//!
//! # CSV出力
//!
//! ```rust,ignore
//! use course_scraper::export::{export_to_csv, records_to_rows};
//!
//! let rows = records_to_rows(&result.courses)?;
//! let csv = export_to_csv(&rows)?;
//! ```

pub mod config;
pub mod daad;
pub mod error;
pub mod export;
pub mod server;
pub mod service;
pub mod traits;

// 主要な型をリエクスポート
pub use config::{ScraperConfig, ServerConfig};
pub use daad::{CourseRecord, DaadScraper, SearchQuery};
pub use error::ScraperError;
pub use service::{ScrapeRequest, ScrapeResult, ScraperService};
pub use traits::Scraper;
