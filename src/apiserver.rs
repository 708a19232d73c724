// apiserver.rs

use std::future::Future;

use askama::Template;
use axum::{
    body::Body,
    extract::{
        rejection::{FormRejection, QueryRejection},
        Form, Query, State,
    },
    http::{Response, StatusCode},
    response::{Html, IntoResponse},
    routing::*,
    Json, Router,
};
pub use axum_macros::debug_handler;
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::*;

pub fn api_router(state: Arc<MyState>) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);
    Router::new()
        .route("/", get(get_index))
        .route("/Pollution", get(get_pollution).post(post_pollution))
        .route("/PollutionUI", get(get_pollution_ui).post(post_pollution_ui))
        .nest_service("/static", static_dir)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_api_server<F>(state: Arc<MyState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listen = format!("0.0.0.0:{}", state.config.port);
    let addr = listen.parse::<net::SocketAddr>()?;
    let app = api_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening to {listen}");
    Ok(axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?)
}

pub async fn get_index(State(state): State<Arc<MyState>>) -> Response<Body> {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_index()");
    (
        StatusCode::OK,
        format!("Hello from aqirelay {VERSION} (built {BUILD_TIMESTAMP})\n"),
    )
        .into_response()
}

type Pairs = Vec<(String, String)>;

fn bad_encoding(e: impl std::fmt::Display) -> AqiError {
    AqiError::InvalidQuery {
        param: "CLat/CLng",
        reason: e.to_string(),
    }
}

/// Center parameters from the URL query string.
fn query_params(query: Result<Query<Pairs>, QueryRejection>) -> Result<RectParams, AqiError> {
    let Query(pairs) = query.map_err(bad_encoding)?;
    Ok(RectParams::from_pairs(pairs))
}

/// Center parameters from a POST: urlencoded body values first, then the URL
/// query string. A body that is not a form is ignored.
fn post_params(
    query: Result<Query<Pairs>, QueryRejection>,
    form: Result<Form<Pairs>, FormRejection>,
) -> Result<RectParams, AqiError> {
    let Query(query) = query.map_err(bad_encoding)?;
    let body = match form {
        Ok(Form(pairs)) => pairs,
        Err(FormRejection::InvalidFormContentType(_)) => Vec::new(),
        Err(e) => return Err(bad_encoding(e)),
    };
    Ok(RectParams::from_pairs(body.into_iter().chain(query)))
}

#[debug_handler]
pub async fn get_pollution(
    State(state): State<Arc<MyState>>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Response<Body> {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_pollution()");
    pollution(&state, query_params(query)).await
}

#[debug_handler]
pub async fn post_pollution(
    State(state): State<Arc<MyState>>,
    query: Result<Query<Pairs>, QueryRejection>,
    form: Result<Form<Pairs>, FormRejection>,
) -> Response<Body> {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} post_pollution()");
    pollution(&state, post_params(query, form)).await
}

#[debug_handler]
pub async fn get_pollution_ui(
    State(state): State<Arc<MyState>>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Response<Body> {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} get_pollution_ui()");
    pollution_ui(&state, query_params(query)).await
}

#[debug_handler]
pub async fn post_pollution_ui(
    State(state): State<Arc<MyState>>,
    query: Result<Query<Pairs>, QueryRejection>,
    form: Result<Form<Pairs>, FormRejection>,
) -> Response<Body> {
    let cnt = state.api_cnt.fetch_add(1, Ordering::Relaxed);
    info!("#{cnt} post_pollution_ui()");
    pollution_ui(&state, post_params(query, form)).await
}

/// Runs the geo query around the requested center, nearest message first.
pub async fn query_sorted(state: &MyState, params: &RectParams) -> Result<(Rect, GeoResponse), AqiError> {
    let rect = Rect::from_params(params)?;
    let mut resp = state
        .querier
        .query(&state.config.app_id, &state.config.user_id, &rect, None)
        .await?;
    sort_nearest(&mut resp.msgs, &rect);
    Ok((rect, resp))
}

/// Query, pick the nearest reading and commit the indicator for it.
pub async fn query_and_actuate(state: &MyState, params: &RectParams) -> Result<GeoResponse, AqiError> {
    let (rect, resp) = query_sorted(state, params).await?;
    let nearest = select_nearest(&resp.msgs, &rect)?;
    let aqi = body_aqi(&nearest.body)?;
    let indicator = IndicatorState::from_aqi(aqi);
    info!(
        "rect {rect:?}, nearest {:?} aqi {aqi} -> {}",
        nearest.custom_id,
        indicator.as_str()
    );
    actuate(state.actuator.as_ref(), indicator)?;
    Ok(resp)
}

async fn pollution(state: &MyState, params: Result<RectParams, AqiError>) -> Response<Body> {
    let res = match params {
        Ok(params) => query_and_actuate(state, &params).await,
        Err(e) => Err(e),
    };
    match res {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => {
            error!("Pollution query failed: {e}");
            json_error(&e)
        }
    }
}

pub fn json_error(e: &AqiError) -> Response<Body> {
    let body = json!({
        "Error": {
            "Code": e.code(),
            "Message": e.to_string(),
        }
    });
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

#[derive(Debug, Default, Deserialize)]
struct BodyView {
    #[serde(rename = "AQI")]
    aqi: Option<i64>,
    #[serde(rename = "Pollutant", default)]
    pollutant: String,
    #[serde(rename = "Status", default)]
    status: String,
}

pub struct MsgRow {
    pub custom_id: String,
    pub lat: f64,
    pub lng: f64,
    pub distance: String,
    pub aqi: String,
    pub pollutant: String,
    pub status: String,
}

#[derive(Template)]
#[template(path = "pollution_ui.html.ask", escape = "html")]
pub struct PollutionPage {
    pub rect: Rect,
    pub rows: Vec<MsgRow>,
}

impl PollutionPage {
    pub fn new(rect: Rect, msgs: &[Msg]) -> Self {
        let rows = msgs
            .iter()
            .map(|m| {
                let view = serde_json::from_str::<BodyView>(&m.body).unwrap_or_default();
                MsgRow {
                    custom_id: m.custom_id.clone(),
                    lat: m.lat,
                    lng: m.lng,
                    distance: format!("{:.6}", rect.sq_distance(m.lat, m.lng).sqrt()),
                    aqi: view.aqi.map(|a| a.to_string()).unwrap_or_else(|| "-".into()),
                    pollutant: view.pollutant,
                    status: view.status,
                }
            })
            .collect();
        PollutionPage { rect, rows }
    }
}

async fn pollution_ui(state: &MyState, params: Result<RectParams, AqiError>) -> Response<Body> {
    let res = match params {
        Ok(params) => query_sorted(state, &params).await,
        Err(e) => Err(e),
    };
    let (rect, resp) = match res {
        Ok(r) => r,
        Err(e) => {
            let msg = format!("{e}\n");
            error!("PollutionUI query failed: {e}");
            return (StatusCode::BAD_REQUEST, msg).into_response();
        }
    };

    match PollutionPage::new(rect, &resp.msgs).render() {
        Err(e) => {
            let err_msg = format!("PollutionUI template error: {e:?}\n");
            error!("{err_msg}");
            (StatusCode::INTERNAL_SERVER_ERROR, err_msg).into_response()
        }
        Ok(s) => (StatusCode::OK, Html(s)).into_response(),
    }
}

// EOF
