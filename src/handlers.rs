// src/handlers.rs
use actix_web::{web, HttpResponse};
use futures_util::stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::models::{Category, Field, LabTestRow, RecordForm, RecordPatch, StoredRecord};
use crate::status::{classify, Severity};
use crate::store::LiveListing;
use crate::AppState;

// ==================== COMMON STRUCTURES ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }

    /// Completed request whose payload reports failed parts.
    pub fn partial(data: T, message: String) -> Self {
        Self {
            success: false,
            data: Some(data),
            message: Some(message),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub order_by: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBadge {
    pub field: String,
    pub text: String,
    pub severity: Severity,
    pub css_class: &'static str,
}

/// One table row: the stored record plus its display serial and badges.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub serial: usize,
    #[serde(flatten)]
    pub stored: StoredRecord,
    pub badges: Vec<StatusBadge>,
}

impl RecordView {
    pub fn new(serial: usize, stored: StoredRecord) -> Self {
        let badges = stored
            .record
            .statuses()
            .into_iter()
            .filter_map(|(field, text)| {
                classify(text).map(|severity| StatusBadge {
                    field: field.to_string(),
                    text: text.to_string(),
                    severity,
                    css_class: severity.css_class(),
                })
            })
            .collect();
        Self { serial, stored, badges }
    }
}

pub fn parse_category(segment: &str) -> ApiResult<Category> {
    Category::from_path(segment).ok_or_else(|| ApiError::unknown_category(segment))
}

fn order_field(category: Category, order_by: Option<&str>) -> String {
    order_by
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| category.identity_field().to_string())
}

// ==================== INVENTORY CRUD ====================

pub async fn list_inventory(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> ApiResult<HttpResponse> {
    let category = parse_category(&path.into_inner())?;
    let order_by = order_field(category, query.order_by.as_deref());

    let mut records = app_state.store.list_ordered_by(category, &order_by).await?;

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        records.retain(|r| r.record.identity().to_lowercase().contains(&needle));
    }

    let rows: Vec<RecordView> = records
        .into_iter()
        .enumerate()
        .map(|(index, stored)| RecordView::new(index + 1, stored))
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(rows)))
}

pub async fn get_record(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (segment, id) = path.into_inner();
    let category = parse_category(&segment)?;

    let stored = app_state
        .store
        .get(category, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} with ID '{}' not found", category.label(), id)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(RecordView::new(1, stored))))
}

pub async fn add_record(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    form: web::Json<RecordForm>,
) -> ApiResult<HttpResponse> {
    let category = parse_category(&path.into_inner())?;
    let record = form.into_inner().into_record(category)?;

    let id = app_state
        .store
        .add(category, record)
        .await
        .map_err(|e| ApiError::store_failure("adding", category, e))?;

    log::info!("{} '{}' added", category.label(), id);
    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        serde_json::json!({ "id": id }),
        format!("{} added successfully!", category.label()),
    )))
}

pub async fn update_record(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
    patch: web::Json<RecordPatch>,
) -> ApiResult<HttpResponse> {
    let (segment, id) = path.into_inner();
    let category = parse_category(&segment)?;
    let patch = patch.into_inner();

    if patch.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }
    if let Some(key) = patch.0.keys().find(|k| {
        k.as_str() != "kind" && k.parse::<Field>().map_or(true, |f| !f.applies_to(category))
    }) {
        return Err(ApiError::BadRequest(format!(
            "'{}' is not a {} field",
            key,
            category.as_ref()
        )));
    }

    let updated = app_state
        .store
        .update(category, &id, &patch)
        .await
        .map_err(|e| ApiError::store_failure("updating", category, e))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        RecordView::new(1, updated),
        format!("{} updated successfully!", category.label()),
    )))
}

pub async fn delete_record(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (segment, id) = path.into_inner();
    let category = parse_category(&segment)?;

    app_state
        .store
        .delete(category, &id)
        .await
        .map_err(|e| ApiError::store_failure("deleting", category, e))?;

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_with_message(
        (),
        format!("{} deleted successfully!", category.label()),
    )))
}

// ==================== LAB TESTS ====================

pub async fn list_lab_tests(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let tests = app_state.store.list_lab_tests().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(tests)))
}

pub async fn add_lab_test(
    app_state: web::Data<Arc<AppState>>,
    test: web::Json<LabTestRow>,
) -> ApiResult<HttpResponse> {
    let id = app_state.store.add_lab_test(test.into_inner()).await?;

    log::info!("Lab test '{}' added", id);
    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        serde_json::json!({ "id": id }),
        "Lab test added successfully!".to_string(),
    )))
}

// ==================== LIVE LISTING ====================

/// Server-sent events: one `data:` frame with the ordered listing now and
/// another after every change to the category. Dropping the connection
/// cancels the subscription.
pub async fn live_inventory(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> ApiResult<HttpResponse> {
    let category = parse_category(&path.into_inner())?;
    let order_by = order_field(category, query.order_by.as_deref());
    let live = LiveListing::start(app_state.store.clone(), category, &order_by)?;

    let events = stream::unfold(live, |mut live| async move {
        let frame = match live.next().await? {
            Ok(records) => {
                let rows: Vec<RecordView> = records
                    .into_iter()
                    .enumerate()
                    .map(|(index, stored)| RecordView::new(index + 1, stored))
                    .collect();
                match serde_json::to_string(&rows) {
                    Ok(json) => format!("data: {}\n\n", json),
                    Err(e) => {
                        live.cancel();
                        format!("event: error\ndata: {}\n\n", e)
                    }
                }
            }
            Err(e) => {
                log::error!("Live listing of {} failed: {}", live.category().collection(), e);
                live.cancel();
                format!("event: error\ndata: Error loading {}\n\n", live.category().collection())
            }
        };
        Some((Ok::<_, Infallible>(web::Bytes::from(frame)), live))
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(events))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::memory_store;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    pub(crate) async fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            store: Arc::new(memory_store().await),
            config: Config::default(),
        })
    }

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

    #[actix_rt::test]
    async fn test_add_then_list_with_badges() {
        let state = test_state().await;
        let app = test_app!(state);

        for body in [
            json!({"name": "Sodium Hydroxide", "size": "500ml", "stock": 5, "status": "Low Stock"}),
            json!({"name": "Acetone", "stock": 2, "status": "OK"}),
        ] {
            let req = test::TestRequest::post().uri("/api/v1/inventory/reagents").set_json(body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::get().uri("/api/v1/inventory/reagent").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["serial"], 1);
        assert_eq!(rows[0]["name"], "Acetone");
        assert_eq!(rows[1]["badges"][0]["severity"], "warning");
        assert_eq!(rows[1]["badges"][0]["cssClass"], "status-warning");
    }

    #[actix_rt::test]
    async fn test_text_counters_fall_back_to_zero() {
        let state = test_state().await;
        let app = test_app!(state);

        for (name, stock, expected) in [("Acetone", "12", 12), ("Ethanol", "abc", 0), ("Hexane", "", 0)] {
            let req = test::TestRequest::post()
                .uri("/api/v1/inventory/reagents")
                .set_json(json!({"name": name, "stock": stock}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
            let body: Value = test::read_body_json(resp).await;
            let id = body["data"]["id"].as_str().unwrap().to_string();

            let req = test::TestRequest::get()
                .uri(&format!("/api/v1/inventory/reagents/{}", id))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["data"]["stock"], expected);
        }

        let id = state.store.list(Category::Reagent).await.unwrap()[0].id.clone();
        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/inventory/reagents/{}", id))
            .set_json(json!({"stock": "7 bottles", "labStock": "n/a"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["stock"], 7);
        assert_eq!(body["data"]["labStock"], 0);
    }

    #[actix_rt::test]
    async fn test_blank_identity_is_rejected_without_write() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/inventory/glasswares")
            .set_json(json!({"description": "  ", "stock": 3}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation Error: Description is required!");

        assert!(state.store.list(Category::Glassware).await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn test_lab_tests_add_and_list() {
        let state = test_state().await;
        let app = test_app!(state);

        for (chemical, vendor) in [("Zinc Bromide check", "SVS (UAE)"), ("Barite check", "SHAFNET")] {
            let req = test::TestRequest::post()
                .uri("/api/v1/lab-tests")
                .set_json(json!({"chemicalTested": chemical, "vendor": vendor, "status": "PASSED"}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::post()
            .uri("/api/v1/lab-tests")
            .set_json(json!({"chemicalTested": " ", "vendor": "SHAFNET"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::get().uri("/api/v1/lab-tests").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let tests = body["data"].as_array().unwrap();
        assert_eq!(tests.len(), 2);
        assert_eq!(tests[0]["chemicalTested"], "Barite check");
        assert_eq!(tests[1]["vendor"], "SVS (UAE)");
    }

    #[actix_rt::test]
    async fn test_update_and_delete() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/v1/inventory/equipment")
            .set_json(json!({"description": "Digital Balance", "category": "calibration", "calibrationStatus": "Due Soon"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/inventory/equipment/{}", id))
            .set_json(json!({"equipmentStatus": "Damaged", "labStock": 2}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["labStock"], 2);
        let severities: Vec<&str> = body["data"]["badges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["severity"].as_str().unwrap())
            .collect();
        assert_eq!(severities, vec!["warning", "error"]);

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/inventory/equipment/{}", id))
            .set_json(json!({"size": "1L"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete().uri(&format!("/api/v1/inventory/equipment/{}", id)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri(&format!("/api/v1/inventory/equipment/{}", id)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri(&format!("/api/v1/inventory/equipment/{}", id)).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_listing_order_and_search() {
        let state = test_state().await;
        for (description, stock) in [("Test Tubes", 100), ("Pipette Tips", 200), ("Filter Paper", 50)] {
            let record = crate::models::InventoryRecord::named(Category::Consumable, description)
                .with(Field::Stock, stock);
            state.store.add(Category::Consumable, record).await.unwrap();
        }
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/v1/inventory/consumables?order_by=stock")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let stocks: Vec<i64> = body["data"].as_array().unwrap().iter().map(|r| r["stock"].as_i64().unwrap()).collect();
        assert_eq!(stocks, vec![50, 100, 200]);

        let req = test::TestRequest::get()
            .uri("/api/v1/inventory/consumables?search=TIPS")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["description"], "Pipette Tips");
        assert_eq!(rows[0]["serial"], 1);

        let req = test::TestRequest::get()
            .uri("/api/v1/inventory/consumables?order_by=name")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_unknown_category_is_not_found() {
        let state = test_state().await;
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/api/v1/inventory/chemicals").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_live_listing_streams_first_snapshot() {
        let state = test_state().await;
        state
            .store
            .add(Category::Reagent, crate::models::InventoryRecord::named(Category::Reagent, "Ethanol"))
            .await
            .unwrap();
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/api/v1/inventory/reagents/live").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("content-type").unwrap(), "text/event-stream");

        let mut body = resp.into_body();
        let chunk = futures_util::future::poll_fn(|cx| {
            actix_web::body::MessageBody::poll_next(std::pin::Pin::new(&mut body), cx)
        })
        .await
        .unwrap()
        .unwrap();
        let frame = String::from_utf8(chunk.to_vec()).unwrap();
        assert!(frame.starts_with("data: "));
        assert!(frame.contains("\"name\":\"Ethanol\""));
    }
}
