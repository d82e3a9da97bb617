//! 検索結果・詳細ページのHTMLからデータを抽出する

use std::collections::HashSet;

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;
use url::Url;

use super::types::CourseRecord;
use crate::error::ScraperError;

const DETAIL_LINK_SELECTOR: &str = "a.js-course-detail-link";
const OVERVIEW_DT_SELECTOR: &str = "#overview dt";
const REGISTRATION_DT_SELECTOR: &str = "#registration dt";
const UNIVERSITY_SELECTOR: &str = "a.c-contact__link";
const COURSE_WEBSITE_SELECTOR: &str = "a.c-contact__link.visitCourseWebsite";

fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::Selector(format!("{}: {:?}", css, e)))
}

/// 検索結果ページから詳細ページのURLを取得（重複除去・出現順）
pub fn parse_detail_links(html: &str, page_url: &str) -> Result<Vec<String>, ScraperError> {
    let base = Url::parse(page_url)?;
    let document = Html::parse_document(html);
    let link_selector = selector(DETAIL_LINK_SELECTOR)?;

    let mut seen = HashSet::new();
    let links = document
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .map(String::from)
        .filter(|url| url.contains("/detail/"))
        .filter(|url| seen.insert(url.clone()))
        .collect();

    Ok(links)
}

/// 詳細ページのHTMLから `CourseRecord` を作成
///
/// `with_registration` が false の場合、出願タブの項目は `None` のまま。
pub fn parse_detail_page(
    html: &str,
    url: &str,
    with_registration: bool,
) -> Result<CourseRecord, ScraperError> {
    let document = Html::parse_document(html);
    let mut record = CourseRecord::new(url);

    record.university_name = document
        .select(&selector(UNIVERSITY_SELECTOR)?)
        .next()
        .map(rendered_text);

    let p_selector = selector("p")?;
    for dt in document.select(&selector(OVERVIEW_DT_SELECTOR)?) {
        let label = rendered_text(dt);
        let Some(dd) = following_dd(dt) else {
            debug!("No <dd> for overview label '{}'", label);
            continue;
        };

        if let Some(field) = record.overview_field(&label) {
            let paragraphs: Vec<String> = dd
                .select(&p_selector)
                .map(rendered_text)
                .filter(|text| !text.is_empty())
                .collect();
            let has_paragraphs = dd.select(&p_selector).next().is_some();

            *field = Some(if has_paragraphs {
                paragraphs.join("\n")
            } else {
                rendered_text(dd)
            });
        }
    }

    if with_registration {
        for dt in document.select(&selector(REGISTRATION_DT_SELECTOR)?) {
            let label = rendered_text(dt);
            let Some(dd) = following_dd(dt) else {
                debug!("No <dd> for registration label '{}'", label);
                continue;
            };

            if let Some(field) = record.registration_field(&label) {
                *field = Some(stripped_lines(dd));
            }
        }
    }

    record.course_website = document
        .select(&selector(COURSE_WEBSITE_SELECTOR)?)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| resolve(url, href));

    Ok(record)
}

/// `dt` の直後にある兄弟 `dd`
fn following_dd(dt: ElementRef<'_>) -> Option<ElementRef<'_>> {
    dt.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "dd")
}

/// ブラウザ表示に近いテキスト（`<br>` とブロック要素で改行、行内の空白は1つに）
fn rendered_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(el) => {
                if matches!(el.name(), "br" | "p" | "div" | "li" | "ul" | "ol" | "tr") {
                    raw.push('\n');
                }
            }
            _ => {}
        }
    }

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// テキストノードごとに trim して空行を除き、改行で連結
fn stripped_lines(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn resolve(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}
