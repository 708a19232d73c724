// apiserver.rs

use std::sync::Mutex;

use aqirelay::*;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

struct FakeQuerier {
    msgs: Vec<Msg>,
    fail: bool,
    seen: Mutex<Vec<(String, String, Rect)>>,
}

impl FakeQuerier {
    fn with(msgs: Vec<Msg>) -> Self {
        FakeQuerier {
            msgs,
            fail: false,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn broken() -> Self {
        FakeQuerier {
            fail: true,
            ..Self::with(Vec::new())
        }
    }
}

#[async_trait]
impl GeoQuerier for FakeQuerier {
    async fn query(
        &self,
        app: &str,
        user: &str,
        rect: &Rect,
        _cursor: Option<&str>,
    ) -> Result<GeoResponse, AqiError> {
        self.seen
            .lock()
            .unwrap()
            .push((app.to_string(), user.to_string(), *rect));
        if self.fail {
            return Err(AqiError::upstream("store geo query", anyhow!("connection refused")));
        }
        Ok(GeoResponse {
            msgs: self.msgs.clone(),
            cursor: None,
        })
    }
}

fn msg(id: &str, lat: f64, lng: f64, aqi: i64) -> Msg {
    Msg {
        id: id.into(),
        body: format!(r#"{{"AQI":{aqi},"Pollutant":"PM2.5","Status":"x"}}"#),
        lat,
        lng,
        sort_key: 0.0,
        custom_id: id.into(),
    }
}

/// Three sites at squared distances 0.5, 0.01 and 0.2 from (25.0, 121.5).
fn three_sites(near_aqi: i64) -> Vec<Msg> {
    vec![
        msg("far", 25.5, 122.0, 10),
        msg("near", 25.1, 121.5, near_aqi),
        msg("mid", 25.0, 121.5 + 0.2_f64.sqrt(), 200),
    ]
}

fn app(querier: FakeQuerier) -> (Router, Arc<FakeQuerier>, Arc<RecordingActuator>) {
    let querier = Arc::new(querier);
    let actuator = Arc::new(RecordingActuator::new());
    let config = MyConfig {
        static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/static").into(),
        ..MyConfig::default()
    };
    let state = Arc::new(MyState::new(config, querier.clone(), actuator.clone()));
    (api_router(state), querier, actuator)
}

async fn get(router: Router, uri: &str) -> (StatusCode, String) {
    let resp = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn post_form(router: Router, uri: &str, form: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn ids(body: &str) -> Vec<String> {
    let resp: GeoResponse = serde_json::from_str(body).unwrap();
    resp.msgs.into_iter().map(|m| m.id).collect()
}

#[tokio::test]
async fn nearest_drives_alert() {
    let (router, querier, actuator) = app(FakeQuerier::with(three_sites(80)));
    let (status, body) = get(router, "/Pollution?CLat=25.0&CLng=121.5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), ["near", "mid", "far"]);
    assert_eq!(actuator.history(), vec![Some(IndicatorState::Alert)]);

    let seen = querier.seen.lock().unwrap();
    let (app_id, user_id, rect) = &seen[0];
    assert_eq!(app_id, &MyConfig::default().app_id);
    assert_eq!(user_id, &MyConfig::default().user_id);
    assert_eq!(*rect, Rect::around(25.0, 121.5));
}

#[tokio::test]
async fn threshold_boundary() {
    for (aqi, want) in [(70, IndicatorState::Normal), (71, IndicatorState::Alert)] {
        let (router, _, actuator) = app(FakeQuerier::with(three_sites(aqi)));
        let (status, _) = get(router, "/Pollution?CLat=25.0&CLng=121.5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(actuator.last(), Some(want), "aqi {aqi}");
    }
}

#[tokio::test]
async fn form_post_works_like_query() {
    let (router, _, actuator) = app(FakeQuerier::with(three_sites(12)));
    let (status, body) = post_form(router, "/Pollution", "CLat=25.0&CLng=121.5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), ["near", "mid", "far"]);
    assert_eq!(actuator.last(), Some(IndicatorState::Normal));
}

async fn post(router: Router, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn post_reads_query_string_without_body() {
    let (router, querier, actuator) = app(FakeQuerier::with(three_sites(80)));
    let (status, body) = post(router, "/Pollution?CLat=25.0&CLng=121.5").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(ids(&body), ["near", "mid", "far"]);
    assert_eq!(actuator.history(), vec![Some(IndicatorState::Alert)]);
    assert_eq!(querier.seen.lock().unwrap()[0].2, Rect::around(25.0, 121.5));

    let (router, _, _) = app(FakeQuerier::with(three_sites(80)));
    let (status, body) = post(router, "/PollutionUI?CLat=25.0&CLng=121.5").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(">near<"));
}

#[tokio::test]
async fn post_body_wins_over_query_string() {
    let (router, querier, _) = app(FakeQuerier::with(three_sites(80)));
    let (status, _) = post_form(router, "/Pollution?CLat=1.0&CLng=2.0", "CLat=25.0").await;
    assert_eq!(status, StatusCode::OK);
    // CLat from the body, CLng from the URL
    assert_eq!(querier.seen.lock().unwrap()[0].2, Rect::around(25.0, 2.0));
}

#[tokio::test]
async fn repeated_param_takes_first_value() {
    let (router, querier, actuator) = app(FakeQuerier::with(three_sites(80)));
    let (status, body) = get(router, "/Pollution?CLat=25.0&CLat=26.0&CLng=121.5").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(querier.seen.lock().unwrap()[0].2, Rect::around(25.0, 121.5));
    assert_eq!(actuator.last(), Some(IndicatorState::Alert));
}

#[tokio::test]
async fn malformed_encoding_is_json_400() {
    let (router, querier, actuator) = app(FakeQuerier::with(three_sites(80)));
    let (status, body) = get(router, "/Pollution?CLat=%ZZ&CLng=121.5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["Error"]["Code"], "InvalidQueryError");
    assert!(querier.seen.lock().unwrap().is_empty());
    assert!(actuator.history().is_empty());
}

#[tokio::test]
async fn bad_params_are_400_with_code() {
    for uri in [
        "/Pollution?CLat=25.0",
        "/Pollution?CLng=121.5",
        "/Pollution?CLat=abc&CLng=121.5",
        "/Pollution",
    ] {
        let (router, querier, actuator) = app(FakeQuerier::with(three_sites(80)));
        let (status, body) = get(router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");

        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["Error"]["Code"], "InvalidQueryError", "{uri}");
        assert!(v["Error"]["Message"].as_str().unwrap().contains("CL"));
        assert!(querier.seen.lock().unwrap().is_empty());
        assert!(actuator.history().is_empty());
    }
}

#[tokio::test]
async fn empty_area_is_400_and_leaves_indicator() {
    let (router, _, actuator) = app(FakeQuerier::with(Vec::new()));
    let (status, body) = get(router, "/Pollution?CLat=25.0&CLng=121.5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["Error"]["Code"], "EmptyResultError");
    assert!(actuator.history().is_empty());
}

#[tokio::test]
async fn unreadable_body_is_400() {
    let mut msgs = three_sites(80);
    msgs[1].body = "garbage".into();
    let (router, _, actuator) = app(FakeQuerier::with(msgs));
    let (status, body) = get(router, "/Pollution?CLat=25.0&CLng=121.5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("SerializationError"));
    assert!(actuator.history().is_empty());
}

#[tokio::test]
async fn store_failure_is_400() {
    let (router, _, _) = app(FakeQuerier::broken());
    let (status, body) = get(router, "/Pollution?CLat=25.0&CLng=121.5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["Error"]["Code"], "UpstreamError");
    assert!(v["Error"]["Message"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn ui_lists_nearest_first_without_actuating() {
    let (router, _, actuator) = app(FakeQuerier::with(three_sites(80)));
    let (status, body) = get(router, "/PollutionUI?CLat=25.0&CLng=121.5").await;
    assert_eq!(status, StatusCode::OK);

    let near = body.find(">near<").unwrap();
    let mid = body.find(">mid<").unwrap();
    let far = body.find(">far<").unwrap();
    assert!(near < mid && mid < far);
    assert!(body.contains("<td>80</td>"));
    assert!(actuator.history().is_empty());
}

#[tokio::test]
async fn ui_handles_empty_area_and_bad_params() {
    let (router, _, _) = app(FakeQuerier::with(Vec::new()));
    let (status, body) = get(router, "/PollutionUI?CLat=25.0&CLng=121.5").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No readings in this area."));

    let (router, _, _) = app(FakeQuerier::with(Vec::new()));
    let (status, body) = post_form(router, "/PollutionUI", "CLat=25.0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("CLng"));
}

#[tokio::test]
async fn ui_escapes_store_content() {
    let mut msgs = three_sites(80);
    msgs[0].custom_id = "<script>".into();
    let (router, _, _) = app(FakeQuerier::with(msgs));
    let (_, body) = get(router, "/PollutionUI?CLat=25.0&CLng=121.5").await;
    assert!(!body.contains("<script>"));
    assert!(body.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn root_and_static() {
    let (router, _, _) = app(FakeQuerier::with(Vec::new()));
    let (status, body) = get(router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("Hello"));

    let (router, _, _) = app(FakeQuerier::with(Vec::new()));
    let (status, body) = get(router, "/static/index.css").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("border-collapse"));
}

// EOF
