//! Shared helpers: an in-process fake of the iLoveIMG endpoints and
//! request builders for the upscale API.

#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, State},
    http::{HeaderMap, Request, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use upscale_backend::config::{IloveImgConfig, ServerConfig};
use upscale_backend::services::upscaler::Upscaler;
use upscale_backend::{AppState, create_app};

pub const LANDING_HTML: &str = r#"<!DOCTYPE html><html><head><script>
var globals = {"lang":"id","token":"abc123","user":null};
ilovepdfConfig.taskId = 'task789';
</script></head><body>Tingkatkan gambar</body></html>"#;

pub const JPEG_BYTES: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xD9,
];

/// What the fake answers on each endpoint
#[derive(Clone)]
pub struct Behavior {
    pub landing_status: StatusCode,
    pub landing_html: String,
    pub upload_status: StatusCode,
    pub upload_body: Value,
    pub process_status: StatusCode,
    pub process_body: Value,
    pub process_delay: Duration,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            landing_status: StatusCode::OK,
            landing_html: LANDING_HTML.to_string(),
            upload_status: StatusCode::OK,
            upload_body: json!({ "server_filename": "srv_001.jpg" }),
            process_status: StatusCode::OK,
            process_body: json!({
                "status": "TaskSuccess",
                "download_filename": "ranzz_hd.jpg"
            }),
            process_delay: Duration::ZERO,
        }
    }
}

/// One request received by the fake
#[derive(Debug, Clone, Default)]
pub struct RecordedCall {
    pub headers: HashMap<String, String>,
    pub fields: HashMap<String, String>,
    pub file_name: Option<String>,
    pub file_len: usize,
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub session: Vec<RecordedCall>,
    pub upload: Vec<RecordedCall>,
    pub process: Vec<RecordedCall>,
}

#[derive(Clone)]
struct FakeState {
    behavior: Arc<Behavior>,
    recorded: Arc<Mutex<Recorded>>,
}

/// Fake iLoveIMG service bound to a random local port
pub struct FakeIloveImg {
    pub addr: SocketAddr,
    recorded: Arc<Mutex<Recorded>>,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeIloveImg {
    pub async fn start(behavior: Behavior) -> Self {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let state = FakeState {
            behavior: Arc::new(behavior),
            recorded: recorded.clone(),
        };

        let router = Router::new()
            .route("/id/tingkatkan-gambar", get(landing))
            .route("/v1/upload", post(upload))
            .route("/v1/process", post(process))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Self {
            addr,
            recorded,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client config pointing every call at this fake.
    ///
    /// The download base is left at its default so result URLs stay stable.
    pub fn config(&self) -> IloveImgConfig {
        let base = self.base_url();
        IloveImgConfig {
            landing_url: format!("{}/id/tingkatkan-gambar", base),
            upload_url: format!("{}/v1/upload", base),
            process_url: format!("{}/v1/process", base),
            origin: base,
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            ..IloveImgConfig::default()
        }
    }

    pub fn session_calls(&self) -> Vec<RecordedCall> {
        self.recorded.lock().unwrap().session.clone()
    }

    pub fn upload_calls(&self) -> Vec<RecordedCall> {
        self.recorded.lock().unwrap().upload.clone()
    }

    pub fn process_calls(&self) -> Vec<RecordedCall> {
        self.recorded.lock().unwrap().process.clone()
    }
}

impl Drop for FakeIloveImg {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect()
}

async fn read_multipart(headers: &HeaderMap, mut multipart: Multipart) -> RecordedCall {
    let mut call = RecordedCall {
        headers: header_map(headers),
        ..RecordedCall::default()
    };

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            call.file_name = field.file_name().map(|s| s.to_string());
            call.file_len = field.bytes().await.unwrap().len();
        } else {
            call.fields.insert(name, field.text().await.unwrap());
        }
    }

    call
}

async fn landing(State(state): State<FakeState>, headers: HeaderMap) -> Response {
    state.recorded.lock().unwrap().session.push(RecordedCall {
        headers: header_map(&headers),
        ..RecordedCall::default()
    });
    (
        state.behavior.landing_status,
        Html(state.behavior.landing_html.clone()),
    )
        .into_response()
}

async fn upload(
    State(state): State<FakeState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let call = read_multipart(&headers, multipart).await;
    state.recorded.lock().unwrap().upload.push(call);
    (
        state.behavior.upload_status,
        Json(state.behavior.upload_body.clone()),
    )
        .into_response()
}

async fn process(
    State(state): State<FakeState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let call = read_multipart(&headers, multipart).await;
    state.recorded.lock().unwrap().process.push(call);
    if !state.behavior.process_delay.is_zero() {
        tokio::time::sleep(state.behavior.process_delay).await;
    }
    (
        state.behavior.process_status,
        Json(state.behavior.process_body.clone()),
    )
        .into_response()
}

pub fn server_config(temp_dir: &Path) -> ServerConfig {
    ServerConfig {
        max_file_size: 1024 * 1024,
        temp_dir: temp_dir.to_path_buf(),
        request_deadline: Duration::from_secs(10),
    }
}

pub fn build_app(upscaler: Arc<dyn Upscaler>, config: ServerConfig) -> Router {
    create_app(AppState::new(upscaler, config))
}

pub const BOUNDARY: &str = "---------------------------upscaleboundary0123456789";

/// A multipart part: (field name, optional filename, content)
pub type FormPart<'a> = (&'a str, Option<&'a str>, &'a [u8]);

pub fn multipart_body(parts: &[FormPart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upscale_request(parts: &[FormPart<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upscale")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!("Response was not JSON: {:?}", String::from_utf8_lossy(&body))
    })
}

pub fn staged_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
