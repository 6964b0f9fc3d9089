// src/import_export.rs - Workbook download and upload endpoints
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures_util::stream::StreamExt;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::models::sample_sections;
use crate::workbook::{
    import_workbook, load_lab_tests, load_sections, render_monthly_report, render_template, report_filename,
    ImportReport, ReportInput, TEMPLATE_FILENAME, XLSX_CONTENT_TYPE,
};
use crate::AppState;

fn xlsx_attachment(filename: String, bytes: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .body(bytes)
}

// ==================== EXPORT ====================

pub async fn download_monthly_report(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let inventory = load_sections(app_state.store.as_ref())
        .await
        .map_err(|(category, e)| ApiError::store_failure("loading", category, e))?;

    let report = &app_state.config.report;
    let lab_tests = load_lab_tests(app_state.store.as_ref(), &report.lab_tests).await;
    let header = report.header();
    let input = ReportInput {
        header: &header,
        personnel: &report.personnel,
        lab_tests: &lab_tests,
        inventory: &inventory,
    };

    let today = Utc::now().date_naive();
    let bytes = render_monthly_report(&input, today)?;
    Ok(xlsx_attachment(report_filename(today), bytes))
}

pub async fn download_template() -> ApiResult<HttpResponse> {
    let bytes = render_template(&sample_sections())?;
    Ok(xlsx_attachment(TEMPLATE_FILENAME.to_string(), bytes))
}

// ==================== IMPORT ====================

fn import_response(report: ImportReport) -> HttpResponse {
    if report.is_success() {
        let message = format!("Excel data imported successfully! {} records added.", report.total_inserted());
        return HttpResponse::Ok().json(ApiResponse::success_with_message(report, message));
    }

    let failed: Vec<&str> = report.failures().map(|c| c.category.collection()).collect();
    let message = format!("Some sections could not be imported: {}", failed.join(", "));
    HttpResponse::Ok().json(ApiResponse::partial(report, message))
}

async fn run_import(app_state: &AppState, bytes: &[u8]) -> ApiResult<HttpResponse> {
    if bytes.is_empty() {
        return Err(ApiError::bad_request("No file uploaded"));
    }
    let report = import_workbook(app_state.store.as_ref(), bytes)
        .await
        .map_err(|e| {
            log::warn!("Rejected workbook upload: {}", e);
            ApiError::from(e)
        })?;
    Ok(import_response(report))
}

/// Multipart upload; the first field carrying a file is imported.
pub async fn import_upload(
    app_state: web::Data<Arc<AppState>>,
    mut payload: Multipart,
) -> ApiResult<HttpResponse> {
    let limit = app_state.config.security.max_upload_bytes;
    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::bad_request(&format!("Multipart error: {}", e)))?;
        let is_file = field.content_disposition().get_filename().is_some();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ApiError::bad_request(&format!("Read error: {}", e)))?;
            bytes.extend_from_slice(&chunk);
            if bytes.len() > limit {
                return Err(ApiError::BadRequest(format!("File exceeds the {} byte upload limit", limit)));
            }
        }

        if is_file && file_bytes.is_none() {
            file_bytes = Some(bytes);
        }
    }

    let bytes = file_bytes.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    run_import(&app_state, &bytes).await
}

/// Workbook sent as the raw request body.
pub async fn import_raw(app_state: web::Data<Arc<AppState>>, body: web::Bytes) -> ApiResult<HttpResponse> {
    run_import(&app_state, &body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::test_state;
    use crate::models::{Category, LabTestRow};
    use crate::workbook::grid::SheetGrid;
    use crate::workbook::workbook_without_sheets;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    macro_rules! test_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state.clone()))
                    .configure(crate::configure_routes),
            )
            .await
        };
    }

    fn multipart_body(boundary: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nmonthly upload\r\n",
                boundary
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"inventory.xlsx\"\r\nContent-Type: {}\r\n\r\n",
                boundary, XLSX_CONTENT_TYPE
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        body
    }

    #[actix_rt::test]
    async fn test_template_download() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/api/v1/reports/template").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("content-type").unwrap(), XLSX_CONTENT_TYPE);
        let disposition = resp.headers().get("content-disposition").unwrap().to_str().unwrap().to_string();
        assert!(disposition.contains("Lab_Inventory_Template.xlsx"));

        let bytes = test::read_body(resp).await;
        assert!(bytes.starts_with(b"PK"));
    }

    #[actix_rt::test]
    async fn test_monthly_report_download_names_the_month() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/api/v1/reports/monthly").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers().get("content-disposition").unwrap().to_str().unwrap().to_string();
        assert!(disposition.contains(&report_filename(Utc::now().date_naive())));
    }

    /// Column B text of every row of a downloaded workbook.
    fn marker_column(bytes: &[u8]) -> Vec<String> {
        let grid = SheetGrid::open(bytes).unwrap();
        (0..grid.row_count()).map(|row| grid.cell(row, 1).to_string()).collect()
    }

    #[actix_rt::test]
    async fn test_monthly_report_uses_configured_lab_tests_by_default() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/api/v1/reports/monthly").to_request();
        let cells = marker_column(&test::call_and_read_body(&app, req).await);
        assert!(cells.iter().any(|c| c == "Full mud check"));
        assert!(cells.iter().any(|c| c == "Zinc Bromide check"));
    }

    #[actix_rt::test]
    async fn test_monthly_report_prints_stored_lab_tests() {
        let state = test_state().await;
        let app = test_app!(state);
        state
            .store
            .add_lab_test(LabTestRow {
                chemical_tested: "Barite check".into(),
                vendor: "SVS (UAE)".into(),
                status: "PASSED".into(),
                remark: "Within specification".into(),
            })
            .await
            .unwrap();

        let req = test::TestRequest::get().uri("/api/v1/reports/monthly").to_request();
        let cells = marker_column(&test::call_and_read_body(&app, req).await);
        assert!(cells.iter().any(|c| c == "Barite check"));
        assert!(!cells.iter().any(|c| c == "Full mud check"));
    }

    #[actix_rt::test]
    async fn test_raw_import_rejects_workbook_without_sheets() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/import/raw")
            .set_payload(workbook_without_sheets())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("no worksheet"));

        for category in Category::all() {
            assert!(state.store.list(category).await.unwrap().is_empty());
        }
    }

    #[actix_rt::test]
    async fn test_multipart_import_of_template() {
        let state = test_state().await;
        let app = test_app!(state);
        let workbook = render_template(&sample_sections()).unwrap();

        let boundary = "labstock-boundary";
        let req = test::TestRequest::post()
            .uri("/api/v1/import")
            .insert_header(("content-type", format!("multipart/form-data; boundary={}", boundary)))
            .set_payload(multipart_body(boundary, &workbook))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["sheet"], "Sheet1");
        assert_eq!(body["data"]["categories"][1]["inserted"], 2);
        assert_eq!(state.store.list(Category::Equipment).await.unwrap().len(), 2);
    }

    #[actix_rt::test]
    async fn test_raw_import_rejects_unreadable_file() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/import/raw")
            .set_payload("not a spreadsheet")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);

        for category in Category::all() {
            assert!(state.store.list(category).await.unwrap().is_empty());
        }
    }

    #[actix_rt::test]
    async fn test_exported_report_re_imports() {
        let state = test_state().await;
        let app = test_app!(state);
        for category in Category::all() {
            state
                .store
                .batch_insert(category, sample_sections().records(category).to_vec())
                .await
                .unwrap();
        }

        let req = test::TestRequest::get().uri("/api/v1/reports/monthly").to_request();
        let report = test::call_and_read_body(&app, req).await;

        let req = test::TestRequest::post().uri("/api/v1/import/raw").set_payload(report).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["sheet"], "Monthly Lab Report");
        // Import appends: every sample now exists twice.
        assert_eq!(state.store.list(Category::Reagent).await.unwrap().len(), 4);
    }
}
