use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures_util::StreamExt;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{Error, SensorError};
use crate::sensor::{SensorReader, SensorReading};
use crate::stream::{self, FeedHub};

#[derive(Clone)]
pub struct AppState {
    feeds: Arc<FeedHub>,
    sensor: Arc<Mutex<Box<dyn SensorReader + Send>>>,
}

impl AppState {
    pub fn new(feeds: FeedHub, sensor: Box<dyn SensorReader + Send>) -> Self {
        Self {
            feeds: Arc::new(feeds),
            sensor: Arc::new(Mutex::new(sensor)),
        }
    }

    #[inline]
    pub fn feeds(&self) -> &FeedHub {
        &self.feeds
    }

    fn read_sensor(&self) -> Result<SensorReading, SensorError> {
        let mut sensor = self.sensor.lock().map_err(|_| SensorError::Unavailable)?;

        Ok(sensor.read()?.rounded())
    }
}

struct SensorFailure(SensorError);

impl IntoResponse for SensorFailure {
    fn into_response(self) -> Response {
        warn!("sensor read failed: {}", self.0);

        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string()).into_response()
    }
}

impl From<SensorError> for SensorFailure {
    fn from(err: SensorError) -> Self {
        Self(err)
    }
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head><title>snailtrack</title></head>
  <body>
    <h1>Live tracking</h1>
    <img src="/video_feed" alt="camera feed">
    <p><a href="/datos">Sensor readings</a></p>
  </body>
</html>
"#;

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn datos(State(state): State<AppState>) -> Result<Html<String>, SensorFailure> {
    let data = state.read_sensor()?;

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html>
  <head><title>snailtrack sensor</title></head>
  <body>
    <h1>Sensor readings</h1>
    <table>
      <tr><th>Temperature</th><td>{:.2} &deg;C</td></tr>
      <tr><th>Pressure</th><td>{:.2} hPa</td></tr>
    </table>
    <p><a href="/">Back</a></p>
  </body>
</html>
"#,
        data.temperature, data.pressure
    )))
}

async fn temperature(State(state): State<AppState>) -> Result<Json<SensorReading>, SensorFailure> {
    Ok(Json(state.read_sensor()?))
}

async fn video_feed(State(state): State<AppState>) -> Response {
    let parts = state
        .feeds
        .subscribe()
        .map(|jpeg| Ok::<_, Infallible>(stream::multipart_chunk(&jpeg)));

    ([(header::CONTENT_TYPE, stream::CONTENT_TYPE)], Body::from_stream(parts)).into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/datos", get(datos))
        .route("/temperature", get(temperature))
        .route("/video_feed", get(video_feed))
        .with_state(state)
}

/// Starts the shared feed (if any) and serves until the listener fails
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<(), Error> {
    let _worker = state.feeds.start();

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        "listening on http://{} ({:?} feed)",
        listener.local_addr()?,
        state.feeds.mode()
    );

    axum::serve(listener, router(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedMode;
    use crate::sensor::FixedSensor;
    use crate::stream::tests::CountingFactory;
    use std::time::Duration;

    struct DeadSensor;

    impl SensorReader for DeadSensor {
        fn read(&mut self) -> Result<SensorReading, SensorError> {
            Err(SensorError::Parse("nan".into()))
        }
    }

    fn state(mode: FeedMode, sensor: Box<dyn SensorReader + Send>) -> AppState {
        let hub = FeedHub::new(Arc::new(CountingFactory::new(2)), mode, 4);

        AppState::new(hub, sensor)
    }

    fn fixed() -> Box<dyn SensorReader + Send> {
        Box::new(FixedSensor(SensorReading::new(21.5678, 1013.254)))
    }

    async fn body_bytes(resp: Response) -> Vec<u8> {
        axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn temperature_is_rounded_json() {
        let resp = temperature(State(state(FeedMode::PerConsumer, fixed())))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");

        let body = body_bytes(resp).await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["temperature"], 21.57);
        assert_eq!(json["pressure"], 1013.25);
    }

    #[tokio::test]
    async fn sensor_failure_is_500() {
        let resp = temperature(State(state(FeedMode::PerConsumer, Box::new(DeadSensor))))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = datos(State(state(FeedMode::PerConsumer, Box::new(DeadSensor))))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn datos_page_shows_readings() {
        let resp = datos(State(state(FeedMode::PerConsumer, fixed())))
            .await
            .into_response();
        let page = String::from_utf8(body_bytes(resp).await).unwrap();

        assert!(page.contains("21.57 &deg;C"));
        assert!(page.contains("1013.25 hPa"));
    }

    #[tokio::test]
    async fn index_embeds_stream() {
        let resp = index().await.into_response();
        let page = String::from_utf8(body_bytes(resp).await).unwrap();

        assert!(page.contains(r#"<img src="/video_feed""#));
    }

    #[tokio::test]
    async fn video_feed_is_multipart() {
        let resp = video_feed(State(state(FeedMode::PerConsumer, fixed()))).await;
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "multipart/x-mixed-replace; boundary=frame"
        );

        let body = body_bytes(resp).await;
        let mut expected = Vec::new();
        expected.extend_from_slice(&stream::multipart_chunk(&[0xFF, 0xD8, 0]));
        expected.extend_from_slice(&stream::multipart_chunk(&[0xFF, 0xD8, 1]));
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn shared_video_feed_ends_with_the_source() {
        let state = state(FeedMode::Shared, fixed());
        let resp = video_feed(State(state.clone())).await;
        state.feeds.start().unwrap().join().unwrap();

        let body = tokio::time::timeout(Duration::from_secs(2), body_bytes(resp))
            .await
            .expect("shared feed body did not end");
        let mut expected = Vec::new();
        expected.extend_from_slice(&stream::multipart_chunk(&[0xFF, 0xD8, 0]));
        expected.extend_from_slice(&stream::multipart_chunk(&[0xFF, 0xD8, 1]));
        assert_eq!(body, expected);
    }

    #[test]
    fn router_builds() {
        let _ = router(state(FeedMode::Shared, fixed()));
    }
}
