//! 検索条件から DAAD 検索URLを組み立てる

use url::Url;

use crate::error::ScraperError;

/// 学位種別 → サイト側コード
pub fn degree_code(name: &str) -> Option<&'static str> {
    match name {
        "bachelor" => Some("1"),
        "master" => Some("2"),
        "phd" => Some("3"),
        "research" => Some("4"),
        "language" => Some("5"),
        "short" => Some("6"),
        "preparatory" => Some("7"),
        _ => None,
    }
}

/// 授業言語 → サイト側コード
pub fn language_code(name: &str) -> Option<&'static str> {
    match name {
        "german" => Some("1"),
        "english" => Some("2"),
        "other" => Some("3"),
        "german_english" => Some("4"),
        _ => None,
    }
}

/// 開始時期 → サイト側コード
pub fn start_period_code(name: &str) -> Option<&'static str> {
    match name {
        "winter" => Some("1"),
        "summer" => Some("2"),
        "other" => Some("5"),
        _ => None,
    }
}

pub const DEFAULT_LIMIT: u32 = 10;

/// 検索条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub course_name: String,
    pub degree_types: Vec<String>,
    pub languages: Vec<String>,
    pub start_periods: Vec<String>,
    pub limit: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            course_name: String::new(),
            degree_types: vec!["bachelor".to_string(), "master".to_string()],
            languages: vec!["english".to_string()],
            start_periods: vec!["winter".to_string()],
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchQuery {
    pub fn new(course_name: impl Into<String>) -> Self {
        Self {
            course_name: course_name.into(),
            ..Default::default()
        }
    }

    pub fn with_degree_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.degree_types = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_languages<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_start_periods<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.start_periods = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// 検索URLを生成
    ///
    /// 未知のフィルター名はエラーにせず読み飛ばす。
    pub fn search_url(&self, base_url: &str) -> Result<String, ScraperError> {
        let mut url = Url::parse(base_url)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", self.course_name.trim());
            for code in self.degree_types.iter().filter_map(|d| degree_code(d)) {
                pairs.append_pair("degree[]", code);
            }
            for code in self.languages.iter().filter_map(|l| language_code(l)) {
                pairs.append_pair("lang[]", code);
            }
            for code in self.start_periods.iter().filter_map(|b| start_period_code(b)) {
                pairs.append_pair("bgn[]", code);
            }
            pairs.append_pair("limit", &self.limit.to_string());
            pairs.append_pair("sort", "4");
            pairs.append_pair("display", "list");
        }
        Ok(url.into())
    }
}
