//! DAAD コース情報の型定義

use serde::{Deserialize, Serialize};

/// コース情報（詳細ページ1件分）
///
/// キーは全レコード共通で、CSV列がずれないようにする。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    #[serde(rename = "Course URL")]
    pub course_url: Option<String>,
    #[serde(rename = "University Name")]
    pub university_name: Option<String>,
    #[serde(rename = "Degree")]
    pub degree: Option<String>,
    #[serde(rename = "Course Location")]
    pub course_location: Option<String>,
    #[serde(rename = "Teaching Language")]
    pub teaching_language: Option<String>,
    #[serde(rename = "Full-time / Part-time")]
    pub study_mode: Option<String>,
    #[serde(rename = "Programme Duration")]
    pub programme_duration: Option<String>,
    #[serde(rename = "Beginning")]
    pub beginning: Option<String>,
    #[serde(rename = "Application Deadline")]
    pub application_deadline: Option<String>,
    #[serde(rename = "Tuition Fees")]
    pub tuition_fees: Option<String>,
    #[serde(rename = "Academic Requirements")]
    pub academic_requirements: Option<String>,
    #[serde(rename = "Language Requirements")]
    pub language_requirements: Option<String>,
    #[serde(rename = "Submit Application To")]
    pub submit_application_to: Option<String>,
    #[serde(rename = "Course Website")]
    pub course_website: Option<String>,
}

impl CourseRecord {
    pub fn new(course_url: impl Into<String>) -> Self {
        Self {
            course_url: Some(course_url.into()),
            ..Default::default()
        }
    }

    /// 概要タブの `dt` ラベルに対応するフィールド（完全一致）
    pub(crate) fn overview_field(&mut self, label: &str) -> Option<&mut Option<String>> {
        match label {
            "Degree" => Some(&mut self.degree),
            "Course location" => Some(&mut self.course_location),
            "Teaching language" => Some(&mut self.teaching_language),
            "Full-time / part-time" => Some(&mut self.study_mode),
            "Programme duration" => Some(&mut self.programme_duration),
            "Beginning" => Some(&mut self.beginning),
            "Application deadline" => Some(&mut self.application_deadline),
            "Tuition fees per semester in EUR" => Some(&mut self.tuition_fees),
            _ => None,
        }
    }

    /// 出願タブの `dt` ラベルに対応するフィールド（部分一致）
    pub(crate) fn registration_field(&mut self, label: &str) -> Option<&mut Option<String>> {
        if label.contains("Academic admission requirements") {
            Some(&mut self.academic_requirements)
        } else if label.contains("Language requirements") {
            Some(&mut self.language_requirements)
        } else if label.contains("Submit application to") {
            Some(&mut self.submit_application_to)
        } else {
            None
        }
    }
}
