//! DAAD スクレイパーモジュール
//!
//! 国際プログラム検索からコース情報を取得する

mod extract;
mod query;
mod scraper;
mod types;

pub use extract::{parse_detail_links, parse_detail_page};
pub use query::{degree_code, language_code, start_period_code, SearchQuery, DEFAULT_LIMIT};
pub use self::scraper::DaadScraper;
pub use types::CourseRecord;
