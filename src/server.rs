//! HTTP API（actix-web）
//!
//! - `POST /api/scrape`: 検索条件を受け取りコース情報をJSONで返す
//! - `POST /api/export-csv`: コース情報をCSVファイルとして返す

use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::http::header;
use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::daad::CourseRecord;
use crate::error::ScraperError;
use crate::export::{export_to_csv, Row};
use crate::service::{ScrapeRequest, ScraperService};

const CSV_FILENAME: &str = "course_results.csv";

pub struct AppState {
    service: ScraperService,
}

impl AppState {
    pub fn new(service: ScraperService) -> Self {
        Self { service }
    }
}

#[derive(Debug, Serialize)]
struct ScrapeResponse {
    success: bool,
    data: Vec<CourseRecord>,
    count: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl ErrorResponse {
    fn new(message: impl ToString) -> Self {
        Self {
            success: false,
            error: message.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExportRequest {
    #[serde(default)]
    data: Option<Vec<Row>>,
}

#[get("/api/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[post("/api/scrape")]
async fn scrape(state: web::Data<AppState>, body: web::Json<ScrapeRequest>) -> HttpResponse {
    let service = state.service.clone();

    match service.oneshot(body.into_inner()).await {
        Ok(result) => {
            info!(
                "Returning {} courses for {}",
                result.courses.len(),
                result.search_url
            );
            let count = result.courses.len();
            HttpResponse::Ok().json(ScrapeResponse {
                success: true,
                data: result.courses,
                count,
            })
        }
        Err(e) => {
            error!("Scrape failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(e))
        }
    }
}

#[post("/api/export-csv")]
async fn export_csv(body: web::Json<ExportRequest>) -> HttpResponse {
    let rows = body.into_inner().data.unwrap_or_default();

    match export_to_csv(&rows) {
        Ok(csv) => {
            info!("Exporting {} rows as CSV", rows.len());
            HttpResponse::Ok()
                .content_type("text/csv")
                .insert_header((
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", CSV_FILENAME),
                ))
                .body(csv)
        }
        Err(ScraperError::NoCourseData) => {
            warn!("CSV export requested without course data");
            HttpResponse::Ok().json(ErrorResponse::new(ScraperError::NoCourseData))
        }
        Err(e) => {
            warn!("CSV export failed: {}", e);
            HttpResponse::BadRequest().json(ErrorResponse::new(e))
        }
    }
}

/// ルーティングとJSONエラー応答を登録
pub fn configure(cfg: &mut web::ServiceConfig) {
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ErrorResponse::new(&err));
        InternalError::from_response(err, response).into()
    });

    cfg.app_data(json_config)
        .service(health)
        .service(scrape)
        .service(export_csv);
}

/// HTTPサーバーを起動
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let state = web::Data::new(AppState::new(ScraperService::new(config.scraper.clone())));
    let (host, port) = config.bind_addr();

    info!("Starting web server at http://{}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperConfig;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{json, Value};

    fn state(config: ScraperConfig) -> web::Data<AppState> {
        web::Data::new(AppState::new(ScraperService::new(config)))
    }

    #[actix_web::test]
    async fn test_export_csv_returns_attachment() {
        let app = test::init_service(
            App::new()
                .app_data(state(ScraperConfig::default()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/export-csv")
            .set_json(json!({
                "data": [
                    {"Course URL": "https://example.org/detail/1/", "Degree": "M.Sc."},
                    {"Course URL": "https://example.org/detail/2/", "Degree": null}
                ]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/csv"
        );
        assert_eq!(
            resp.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=course_results.csv"
        );

        let body = test::read_body(resp).await;
        assert_eq!(
            body,
            "Course URL,Degree\r\nhttps://example.org/detail/1/,M.Sc.\r\nhttps://example.org/detail/2/,\r\n"
        );
    }

    #[actix_web::test]
    async fn test_export_csv_without_data() {
        let app = test::init_service(
            App::new()
                .app_data(state(ScraperConfig::default()))
                .configure(configure),
        )
        .await;

        for body in [json!({"data": []}), json!({}), json!({"data": null})] {
            let req = test::TestRequest::post()
                .uri("/api/export-csv")
                .set_json(body)
                .to_request();
            let resp: Value = test::call_and_read_body_json(&app, req).await;

            assert_eq!(
                resp,
                json!({"success": false, "error": "No course data provided"})
            );
        }
    }

    #[actix_web::test]
    async fn test_export_csv_rejects_inconsistent_rows() {
        let app = test::init_service(
            App::new()
                .app_data(state(ScraperConfig::default()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/export-csv")
            .set_json(json!({"data": [{"Degree": "M.Sc."}, {"Fees": "none"}]}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
    }

    #[actix_web::test]
    async fn test_malformed_json_body() {
        let app = test::init_service(
            App::new()
                .app_data(state(ScraperConfig::default()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/export-csv")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
    }

    #[actix_web::test]
    async fn test_scrape_failure_is_reported() {
        let app = test::init_service(
            App::new()
                .app_data(state(ScraperConfig::new().with_base_url("not a url")))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/scrape")
            .set_json(json!({"courseName": "history"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(
            App::new()
                .app_data(state(ScraperConfig::default()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp, json!({"status": "ok"}));
    }
}
