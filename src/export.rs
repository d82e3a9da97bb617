//! コース情報のCSV出力
//!
//! ヘッダーは先頭レコードのキー（出現順）。HTTP経由で受け取った任意のJSON
//! オブジェクトも、スクレイプ結果の `CourseRecord` も同じ経路で出力する。

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::info;

use crate::daad::CourseRecord;
use crate::error::ScraperError;

/// CSV 1行分（キー順を保持するJSONオブジェクト）
pub type Row = Map<String, Value>;

/// `CourseRecord` をCSV行に変換
pub fn records_to_rows(records: &[CourseRecord]) -> Result<Vec<Row>, ScraperError> {
    records
        .iter()
        .map(|record| match serde_json::to_value(record)? {
            Value::Object(map) => Ok(map),
            other => Err(ScraperError::InvalidRow(format!(
                "expected object, got {}",
                other
            ))),
        })
        .collect()
}

/// CSV文字列を生成
pub fn export_to_csv(rows: &[Row]) -> Result<String, ScraperError> {
    let bytes = write_rows(Vec::new(), rows)?;
    String::from_utf8(bytes).map_err(|e| ScraperError::InvalidRow(e.to_string()))
}

/// CSVファイルに書き出す
pub fn write_csv_file(rows: &[Row], path: impl AsRef<Path>) -> Result<(), ScraperError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_rows(file, rows)?;
    info!("Wrote {} course rows to {:?}", rows.len(), path);
    Ok(())
}

fn write_rows<W: Write>(writer: W, rows: &[Row]) -> Result<W, ScraperError> {
    let first = rows.first().ok_or(ScraperError::NoCourseData)?;
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();

    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(writer);
    wtr.write_record(&headers)?;

    for (idx, row) in rows.iter().enumerate() {
        if let Some(extra) = row.keys().find(|key| !first.contains_key(key.as_str())) {
            return Err(ScraperError::InvalidRow(format!(
                "row {} has field '{}' that is not in the header",
                idx + 1,
                extra
            )));
        }
        wtr.write_record(headers.iter().map(|key| cell(row.get(*key))))?;
    }

    wtr.flush()?;
    wtr.into_inner().map_err(|e| ScraperError::FileIO(e.into_error()))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_header_follows_first_record() {
        let data = rows(json!([
            {"University Name": "TU Example", "Degree": "M.Sc.", "Tuition Fees": null},
            {"Degree": "B.Sc.", "University Name": "Uni Sample"}
        ]));

        let csv = export_to_csv(&data).unwrap();

        assert_eq!(
            csv,
            "University Name,Degree,Tuition Fees\r\nTU Example,M.Sc.,\r\nUni Sample,B.Sc.,\r\n"
        );
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let result = export_to_csv(&[]);
        assert!(matches!(result, Err(ScraperError::NoCourseData)));
    }

    #[test]
    fn test_unknown_field_in_later_row_is_rejected() {
        let data = rows(json!([
            {"Degree": "M.Sc."},
            {"Degree": "B.Sc.", "Scholarship": "yes"}
        ]));

        let err = export_to_csv(&data).unwrap_err();
        assert!(matches!(err, ScraperError::InvalidRow(ref msg) if msg.contains("Scholarship")));
    }

    #[test]
    fn test_multiline_and_non_string_values() {
        let data = rows(json!([
            {"Academic Requirements": "Bachelor's degree\nCV, transcript", "count": 3, "online": true}
        ]));

        let csv = export_to_csv(&data).unwrap();

        assert_eq!(
            csv,
            "Academic Requirements,count,online\r\n\"Bachelor's degree\nCV, transcript\",3,true\r\n"
        );
    }

    #[test]
    fn test_course_records_export() {
        let mut record = CourseRecord::new("https://example.org/detail/1/");
        record.degree = Some("Master of Science".to_string());

        let data = records_to_rows(&[record]).unwrap();
        let csv = export_to_csv(&data).unwrap();
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("Course URL,University Name,Degree,"));
        assert!(header.ends_with("Course Website"));
        assert_eq!(header.split(',').count(), 14);

        let row = lines.next().unwrap();
        assert!(row.starts_with("https://example.org/detail/1/,,Master of Science,"));
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("course_results.csv");
        let data = rows(json!([{"Degree": "M.A."}]));

        write_csv_file(&data, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Degree\r\nM.A.\r\n");
    }
}
