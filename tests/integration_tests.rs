// Integration tests for the recommendation pipeline

mod common;

use actix_web::{test, web, App};
use common::{group_row, major_row, profile, recommender, FakeAdmissions, FakeProfiles};
use gaokao_recommend::core::{RecommendLimits, SqlValue};
use gaokao_recommend::models::{MajorGroupRequest, Strategy, UniversityPriorityRequest};
use gaokao_recommend::routes::{configure_routes, AppState};
use gaokao_recommend::services::ProvinceCityDirectory;
use gaokao_recommend::RecommendError;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn priority_request(body: Value) -> UniversityPriorityRequest {
    serde_json::from_value(body).unwrap()
}

fn group_request(body: Value) -> MajorGroupRequest {
    serde_json::from_value(body).unwrap()
}

fn page_store() -> FakeAdmissions {
    FakeAdmissions {
        total: 3,
        groups: vec![
            group_row("1001", "武汉大学", "01"),
            group_row("1001", "武汉大学", "02"),
            group_row("2001", "华中科技大学", "01"),
        ],
        majors: vec![
            major_row("1001", "01", "计算机科学与技术", Some(598)),
            major_row("1001", "01", "软件工程", Some(603)),
            major_row("2001", "01", "电子信息工程", None),
        ],
        ..Default::default()
    }
}

#[tokio::test]
async fn test_stable_600_uses_window_595_to_603() {
    let store = Arc::new(page_store());
    let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

    let page = recommender
        .recommend(priority_request(json!({
            "province": "湖北",
            "subjects": "物理,化学",
            "score": 600,
            "strategy": 1
        })))
        .await
        .unwrap();

    let statements = store.recorded();
    assert_eq!(statements.len(), 3);

    let count = &statements[0];
    assert!(count.sql.starts_with("SELECT COUNT(DISTINCT (school_code, major_group_code)) AS total FROM admission_records"));
    assert_eq!(
        &count.args[..4],
        &[
            SqlValue::from("湖北"),
            SqlValue::Int(595),
            SqlValue::Int(603),
            SqlValue::Int(1)
        ]
    );

    assert_eq!(page.total, 3);
    assert_eq!(page.page, 1);
    assert_eq!(page.page_size, 20);
    assert_eq!(page.page_num, 1);
    assert_eq!(page.list.len(), 2);
    assert_eq!(page.list[0].university_name, "武汉大学");
    assert_eq!(page.list[0].major_groups.len(), 2);
    assert_eq!(page.list[1].university_name, "华中科技大学");
}

#[tokio::test]
async fn test_count_and_page_queries_share_conditions() {
    let store = Arc::new(page_store());
    let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

    recommender
        .recommend(priority_request(json!({
            "province": "湖北",
            "subjects": "物理,化学,生物",
            "score": 600,
            "citys": "武汉, 宜昌",
            "college_type": "公办,985",
            "page": 2,
            "page_size": 1
        })))
        .await
        .unwrap();

    let statements = store.recorded();
    let (count, rows) = (&statements[0], &statements[1]);

    assert_eq!(count.args, rows.args);
    let count_where = count.sql.split(" WHERE ").nth(1).unwrap();
    let rows_where = rows.sql.split(" WHERE ").nth(1).unwrap();
    assert!(rows_where.starts_with(count_where));
    assert!(rows.sql.ends_with("LIMIT 1 OFFSET 1"));

    // province, window, category, two cities, one ownership value, one tag
    assert_eq!(count.args.len(), 8);
    assert!(count.args.contains(&SqlValue::from("宜昌")));
    assert!(count.args.contains(&SqlValue::from("公办")));
    assert!(count.sql.contains("((school_ownership = $7) AND ($8 = ANY(school_tags)))"));
    assert!(count.sql.contains("(require_physics = TRUE OR require_chemistry = TRUE OR require_biology = TRUE)"));
}

#[tokio::test]
async fn test_majors_are_fetched_in_one_batch() {
    let store = Arc::new(page_store());
    let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

    let page = recommender
        .recommend(priority_request(json!({
            "province": "湖北",
            "subjects": "物理",
            "score": 600
        })))
        .await
        .unwrap();

    let detail = &store.recorded()[2];
    assert!(detail.sql.contains("((school_code, major_group_code) IN (($1, $2), ($3, $4), ($5, $6)))"));
    assert!(detail.sql.ends_with("ORDER BY school_code ASC, major_group_code ASC, major_name ASC"));

    let whu = &page.list[0];
    let first = &whu.major_groups[0];
    assert_eq!(first.majors.len(), 2);
    assert_eq!(first.majors[0].probability, 60);
    assert_eq!(first.majors[1].probability, 40);
    assert_eq!(first.majors[1].strategy, Strategy::Stable);
    assert_eq!(first.probability, 50);

    // group returned by the page query but without majors
    assert!(whu.major_groups[1].majors.is_empty());
    assert_eq!(whu.major_groups[1].probability, 0);

    // unknown cutoff falls back to 50 / stable
    let hust = &page.list[1].major_groups[0];
    assert_eq!(hust.majors[0].probability, 50);
    assert_eq!(hust.majors[0].strategy, Strategy::Stable);
}

#[tokio::test]
async fn test_rank_only_request_converts_to_score() {
    let store = Arc::new(page_store());
    let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

    recommender
        .recommend(priority_request(json!({
            "province": "湖北",
            "subjects": "物理,化学",
            "rank": 250,
            "strategy": 0
        })))
        .await
        .unwrap();

    // rank 250 → score 590, rush window [593, 610]
    let count = &store.recorded()[0];
    assert_eq!(count.args[1], SqlValue::Int(593));
    assert_eq!(count.args[2], SqlValue::Int(610));
}

#[tokio::test]
async fn test_rank_conversion_without_distribution_is_unavailable() {
    let store = Arc::new(page_store());
    let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

    let err = recommender
        .recommend(priority_request(json!({
            "province": "湖南",
            "subjects": "物理",
            "rank": 5000
        })))
        .await
        .unwrap_err();

    assert!(matches!(err, RecommendError::DataUnavailable(_)));
    assert!(store.recorded().is_empty());
}

#[tokio::test]
async fn test_profile_fills_missing_fields() {
    let store = Arc::new(page_store());
    let profiles = Arc::new(FakeProfiles::with(profile("p-1")));
    let recommender = recommender(Some(store.clone()), Some(profiles), RecommendLimits::default());

    recommender
        .recommend(priority_request(json!({ "profile_id": "p-1", "strategy": 2 })))
        .await
        .unwrap();

    // safe window for the profile's 600 is [580, 595]
    let count = &store.recorded()[0];
    assert_eq!(count.args[0], SqlValue::from("湖北"));
    assert_eq!(count.args[1], SqlValue::Int(580));
    assert_eq!(count.args[2], SqlValue::Int(595));
}

#[tokio::test]
async fn test_explicit_fields_win_over_profile() {
    let store = Arc::new(page_store());
    let profiles = Arc::new(FakeProfiles::with(profile("p-1")));
    let recommender = recommender(Some(store.clone()), Some(profiles), RecommendLimits::default());

    recommender
        .recommend(priority_request(json!({ "profile_id": "p-1", "score": 620 })))
        .await
        .unwrap();

    // omitted strategy is rush: [623, 640]
    let count = &store.recorded()[0];
    assert_eq!(count.args[1], SqlValue::Int(623));
    assert_eq!(count.args[2], SqlValue::Int(640));
}

fn tier_store() -> FakeAdmissions {
    FakeAdmissions {
        total: 1,
        groups: vec![group_row("1001", "武汉大学", "01")],
        majors: vec![
            major_row("1001", "01", "冲刺专业", Some(620)),
            major_row("1001", "01", "稳妥专业", Some(600)),
            major_row("1001", "01", "保底专业", Some(580)),
        ],
        ..Default::default()
    }
}

async fn displayed_majors(strategy: Option<i32>) -> (Vec<String>, Vec<SqlValue>) {
    let store = Arc::new(tier_store());
    let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

    let mut body = json!({ "province": "湖北", "subjects": "物理", "score": 600 });
    if let Some(code) = strategy {
        body["strategy"] = json!(code);
    }
    let page = recommender.recommend(priority_request(body)).await.unwrap();

    // mean of 0, 40 and 80
    let group = &page.list[0].major_groups[0];
    assert_eq!(group.probability, 40);
    let names = group.majors.iter().map(|m| m.name.clone()).collect();
    (names, store.recorded()[0].args.clone())
}

#[tokio::test]
async fn test_strategy_selects_displayed_majors() {
    let (rush, _) = displayed_majors(Some(0)).await;
    assert_eq!(rush, vec!["冲刺专业", "稳妥专业", "保底专业"]);

    let (stable, _) = displayed_majors(Some(1)).await;
    assert_eq!(stable, vec!["稳妥专业"]);

    let (safe, _) = displayed_majors(Some(2)).await;
    assert_eq!(safe, vec!["保底专业"]);
}

#[tokio::test]
async fn test_omitted_strategy_is_rush() {
    let (names, args) = displayed_majors(None).await;

    assert_eq!(names.len(), 3);
    assert_eq!(args[1], SqlValue::Int(603));
    assert_eq!(args[2], SqlValue::Int(620));
}

#[tokio::test]
async fn test_store_failures_name_the_failed_step() {
    let steps = ["count major groups", "fetch major group page", "fetch majors"];

    for (index, step) in steps.into_iter().enumerate() {
        let store = Arc::new(FakeAdmissions {
            fail_on: Some(index),
            ..page_store()
        });
        let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

        let err = recommender
            .recommend(priority_request(json!({
                "province": "湖北",
                "subjects": "物理,化学",
                "score": 600
            })))
            .await
            .unwrap_err();

        match &err {
            RecommendError::QueryFailed { operation, .. } => assert_eq!(*operation, step),
            other => panic!("expected query failure at {}, got {:?}", step, other),
        }
        let message = err.to_string();
        assert!(message.starts_with(&format!("query failed: {}", step)));
        assert!(!message.contains("SELECT"));
        assert!(!message.contains("WHERE"));
        assert_eq!(store.recorded().len(), index + 1);
    }
}

#[tokio::test]
async fn test_detail_store_failure_is_query_failed() {
    let store = Arc::new(FakeAdmissions {
        fail_on: Some(0),
        ..Default::default()
    });
    let recommender = recommender(Some(store), None, RecommendLimits::default());

    let err = recommender
        .major_group_detail(group_request(json!({ "school_code": "1001", "group_code": "01" })))
        .await
        .unwrap_err();

    assert!(matches!(err, RecommendError::QueryFailed { operation: "fetch majors", .. }));
    assert!(!err.to_string().contains("SELECT"));
}

#[tokio::test]
async fn test_profile_failure_is_not_fatal() {
    let store = Arc::new(page_store());
    let profiles = Arc::new(FakeProfiles::failing());
    let recommender = recommender(Some(store.clone()), Some(profiles), RecommendLimits::default());

    let page = recommender
        .recommend(priority_request(json!({
            "profile_id": "p-404",
            "province": "湖北",
            "subjects": "物理",
            "score": 600
        })))
        .await
        .unwrap();

    assert_eq!(page.total, 3);
}

#[tokio::test]
async fn test_missing_criteria_rejected_before_queries() {
    let store = Arc::new(page_store());
    let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

    let err = recommender
        .recommend(priority_request(json!({ "province": "湖北", "subjects": "物理" })))
        .await
        .unwrap_err();
    assert!(matches!(err, RecommendError::InvalidArgument(_)));

    let err = recommender
        .recommend(priority_request(json!({
            "province": "湖北",
            "subjects": "化学,生物",
            "score": 600
        })))
        .await
        .unwrap_err();
    assert!(matches!(err, RecommendError::InvalidSubjects(_)));

    assert!(store.recorded().is_empty());
}

#[tokio::test]
async fn test_unmerged_profile_still_needs_criteria() {
    let store = Arc::new(page_store());
    let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

    let err = recommender
        .recommend(priority_request(json!({ "profile_id": "p-1" })))
        .await
        .unwrap_err();

    assert!(matches!(err, RecommendError::InvalidArgument(_)));
    assert!(store.recorded().is_empty());
}

#[tokio::test]
async fn test_without_store_is_not_initialized() {
    let recommender = recommender(None, None, RecommendLimits::default());

    let err = recommender
        .recommend(priority_request(json!({
            "province": "湖北",
            "subjects": "物理",
            "score": 600
        })))
        .await
        .unwrap_err();
    assert!(matches!(err, RecommendError::NotInitialized));

    let err = recommender
        .major_group_detail(group_request(json!({ "school_code": "1001", "group_code": "01" })))
        .await
        .unwrap_err();
    assert!(matches!(err, RecommendError::NotInitialized));
}

#[tokio::test]
async fn test_empty_page_skips_detail_queries() {
    let store = Arc::new(FakeAdmissions::default());
    let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

    let page = recommender
        .recommend(priority_request(json!({
            "province": "湖北",
            "subjects": "历史,政治",
            "score": 540
        })))
        .await
        .unwrap();

    assert_eq!(page.total, 0);
    assert_eq!(page.page_num, 0);
    assert!(page.list.is_empty());
    assert_eq!(store.recorded().len(), 1);
}

#[tokio::test]
async fn test_page_size_is_capped() {
    let store = Arc::new(page_store());
    let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

    let page = recommender
        .recommend(priority_request(json!({
            "province": "湖北",
            "subjects": "物理",
            "score": 600,
            "page_size": 500
        })))
        .await
        .unwrap();

    assert_eq!(page.page_size, 100);
    assert!(store.recorded()[1].sql.ends_with("LIMIT 100 OFFSET 0"));
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let store = Arc::new(FakeAdmissions {
        delay: Some(Duration::from_millis(500)),
        ..page_store()
    });
    let limits = RecommendLimits {
        recommend_timeout: Duration::from_millis(20),
        ..RecommendLimits::default()
    };
    let recommender = recommender(Some(store), None, limits);

    let err = recommender
        .recommend(priority_request(json!({
            "province": "湖北",
            "subjects": "物理",
            "score": 600
        })))
        .await
        .unwrap_err();

    assert!(matches!(err, RecommendError::Timeout { operation: "recommend", .. }));
}

#[tokio::test]
async fn test_major_group_detail_classifies_majors() {
    let store = Arc::new(FakeAdmissions {
        majors: vec![
            major_row("1001", "01", "计算机科学与技术", Some(580)),
            major_row("1001", "01", "软件工程", Some(610)),
        ],
        ..Default::default()
    });
    let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

    let group = recommender
        .major_group_detail(group_request(json!({
            "school_code": " 1001 ",
            "group_code": "01",
            "province": "湖北",
            "subjects": "物理",
            "score": 600
        })))
        .await
        .unwrap();

    assert_eq!(group.group_code, "01");
    assert_eq!(group.majors.len(), 2);
    assert_eq!(group.majors[0].probability, 80);
    assert_eq!(group.majors[1].probability, 20);
    assert_eq!(group.probability, 50);

    let detail = &store.recorded()[0];
    assert_eq!(detail.args[0], SqlValue::from("1001"));
    assert_eq!(detail.args[1], SqlValue::from("01"));
}

#[tokio::test]
async fn test_unknown_major_group_is_empty() {
    let store = Arc::new(FakeAdmissions::default());
    let recommender = recommender(Some(store), None, RecommendLimits::default());

    let group = recommender
        .major_group_detail(group_request(json!({ "school_code": "9999", "group_code": "99" })))
        .await
        .unwrap();

    assert!(group.majors.is_empty());
    assert_eq!(group.probability, 0);
}

#[tokio::test]
async fn test_major_group_detail_requires_codes() {
    let store = Arc::new(FakeAdmissions::default());
    let recommender = recommender(Some(store.clone()), None, RecommendLimits::default());

    let err = recommender
        .major_group_detail(group_request(json!({ "school_code": "  ", "group_code": "01" })))
        .await
        .unwrap_err();

    assert!(matches!(err, RecommendError::InvalidArgument(_)));
    assert!(store.recorded().is_empty());
}

fn app_state(store: Arc<FakeAdmissions>, profiles: Arc<FakeProfiles>) -> AppState {
    let recommender = recommender(Some(store), Some(profiles.clone()), RecommendLimits::default());
    let mut regions = BTreeMap::new();
    regions.insert("湖北".to_string(), vec!["武汉".to_string(), "宜昌".to_string()]);
    regions.insert("湖南".to_string(), vec!["长沙".to_string()]);

    AppState {
        recommender: Arc::new(recommender),
        profiles: Some(profiles),
        regions: Arc::new(ProvinceCityDirectory::from_entries(regions)),
        postgres: None,
    }
}

#[actix_web::test]
async fn test_http_university_priority_envelope() {
    let state = app_state(Arc::new(page_store()), Arc::new(FakeProfiles::default()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/voluntary/universityPriority")
        .set_json(json!({
            "province": "湖北",
            "subjects": "物理,化学",
            "score": 600
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["list"][0]["university_name"], "武汉大学");
    assert_eq!(body["data"]["list"][0]["major_group"][0]["major"][0]["plan_num"], 3);
}

#[actix_web::test]
async fn test_http_errors_map_to_status() {
    let state = app_state(Arc::new(page_store()), Arc::new(FakeProfiles::default()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/voluntary/universityPriority")
        .set_json(json!({ "province": "湖北", "subjects": "化学", "score": 600 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::get()
        .uri("/api/rank/getRank?province=%E6%B9%96%E5%8D%97&category=physics&year=2024&score=600")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 503);

    let req = test::TestRequest::get().uri("/api/profile/missing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_http_rank_conversions() {
    let state = app_state(Arc::new(page_store()), Arc::new(FakeProfiles::default()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/rank/getRank?province=hubei&category=physics&year=2024&score=595")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["rank"], 250);

    let req = test::TestRequest::get()
        .uri("/api/rank/getScore?province=hubei&category=physics&year=2024&rank=300")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["score"], 580);

    let health: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/health").to_request(),
    )
    .await;
    assert_eq!(health["status"], "degraded");
    assert!(health["cached_tables"].as_u64().is_some());
}

#[actix_web::test]
async fn test_http_profile_round_trip() {
    let profiles = Arc::new(FakeProfiles::default());
    let state = app_state(Arc::new(page_store()), profiles);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/profile/create")
        .set_json(json!({
            "username": "student",
            "province": "湖北",
            "score": 600,
            "subjects": ["物理", "化学"]
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["profile_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri(&format!("/api/profile/{}", id)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["province"], "湖北");
    assert_eq!(body["data"]["subjects"][1], "化学");

    let req = test::TestRequest::post()
        .uri("/api/profile/create")
        .set_json(json!({ "username": "student", "province": "湖北", "subjects": [] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
}

#[actix_web::test]
async fn test_http_province_options() {
    let state = app_state(Arc::new(page_store()), Arc::new(FakeProfiles::default()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/options/provinces").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["msg"], "success");
    assert_eq!(body["data"]["provinces"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["provinces"][0]["province"], "湖北");
    assert_eq!(body["data"]["provinces"][0]["citys"][1], "宜昌");

    // 湖南, 西藏
    let req = test::TestRequest::get()
        .uri("/api/options/provinces?province=%E6%B9%96%E5%8D%97,%20%E8%A5%BF%E8%97%8F")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let provinces = body["data"]["provinces"].as_array().unwrap();
    assert_eq!(provinces.len(), 1);
    assert_eq!(provinces[0]["province"], "湖南");
    assert_eq!(provinces[0]["citys"][0], "长沙");
}

#[actix_web::test]
async fn test_http_recommend_requires_json_body() {
    let state = app_state(Arc::new(page_store()), Arc::new(FakeProfiles::default()));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/voluntary/universityPriority")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("province=%E6%B9%96%E5%8C%97&subjects=%E7%89%A9%E7%90%86&score=600")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
}
