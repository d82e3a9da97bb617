use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tower::Service;
use tracing::info;

use crate::config::ScraperConfig;
use crate::daad::{CourseRecord, DaadScraper, SearchQuery, DEFAULT_LIMIT};
use crate::error::ScraperError;
use crate::traits::Scraper;

/// スクレイピングリクエスト（`POST /api/scrape` のボディ）
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    #[serde(default)]
    pub course_name: String,
    #[serde(default = "default_degree_types", deserialize_with = "lenient_degree_types")]
    pub degree_types: Vec<String>,
    #[serde(default = "default_languages", deserialize_with = "lenient_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_start_periods", deserialize_with = "lenient_start_periods")]
    pub start_periods: Vec<String>,
    #[serde(default = "default_limit", deserialize_with = "lenient_limit")]
    pub university_limit: u32,
}

fn default_degree_types() -> Vec<String> {
    SearchQuery::default().degree_types
}

fn default_languages() -> Vec<String> {
    SearchQuery::default().languages
}

fn default_start_periods() -> Vec<String> {
    SearchQuery::default().start_periods
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// フィルター名の配列（`null`・配列以外はデフォルト、文字列以外の要素は無視）
fn lenient_names(value: Value, default: fn() -> Vec<String>) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name),
                _ => None,
            })
            .collect(),
        _ => default(),
    }
}

fn lenient_degree_types<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_names(Value::deserialize(deserializer)?, default_degree_types))
}

fn lenient_languages<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_names(Value::deserialize(deserializer)?, default_languages))
}

fn lenient_start_periods<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_names(Value::deserialize(deserializer)?, default_start_periods))
}

/// 数値・数値文字列のどちらも受け付け、解釈できなければデフォルト値
fn lenient_limit<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let limit = match &value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u32)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(limit.unwrap_or(DEFAULT_LIMIT))
}

impl ScrapeRequest {
    pub fn new(course_name: impl Into<String>) -> Self {
        let query = SearchQuery::new(course_name);
        Self {
            course_name: query.course_name,
            degree_types: query.degree_types,
            languages: query.languages,
            start_periods: query.start_periods,
            university_limit: query.limit,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.university_limit = limit;
        self
    }
}

impl From<ScrapeRequest> for SearchQuery {
    fn from(req: ScrapeRequest) -> Self {
        SearchQuery::new(req.course_name)
            .with_degree_types(req.degree_types)
            .with_languages(req.languages)
            .with_start_periods(req.start_periods)
            .with_limit(req.university_limit)
    }
}

/// スクレイピング結果
#[derive(Debug)]
pub struct ScrapeResult {
    pub search_url: String,
    pub courses: Vec<CourseRecord>,
}

/// tower::Serviceを実装したスクレイパーサービス
///
/// リクエストごとにブラウザを起動して終了する。
#[derive(Debug, Clone, Default)]
pub struct ScraperService {
    config: ScraperConfig,
}

impl ScraperService {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

impl Service<ScrapeRequest> for ScraperService {
    type Response = ScrapeResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!(
            "Scrape request received: course_name='{}', limit={}",
            req.course_name, req.university_limit
        );
        let config = self.config.clone();

        Box::pin(async move {
            let query: SearchQuery = req.into();
            let search_url = query.search_url(&config.base_url)?;

            let mut scraper = DaadScraper::new(config);
            let courses = scraper.execute(&search_url).await?;

            info!("Scrape completed: {} courses", courses.len());
            Ok(ScrapeResult {
                search_url,
                courses,
            })
        })
    }
}
