//! Shared fixtures for router-level tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::Engine as _;
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use docparse_server::analysis::{InferenceEngine, InferenceError, InferenceResult};
use docparse_server::config::{AnalyzerConfig, Config};
use docparse_server::dataset::{DatasetError, OfficeConverter, TypedDataset};
use docparse_server::routes::build_router;
use docparse_server::state::AppState;
use docparse_server::storage::ConfigCredentialResolver;

pub const BOUNDARY: &str = "docparse-test-boundary";

/// Engine returning a canned reply and recording every call
pub struct FakeEngine {
    reply: Value,
    fail: bool,
    calls: AtomicUsize,
    ocr_flags: Mutex<Vec<bool>>,
}

impl FakeEngine {
    pub fn replying(reply: Value) -> Self {
        Self {
            reply,
            fail: false,
            calls: AtomicUsize::new(0),
            ocr_flags: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::replying(json!({"pages": []}))
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn ocr_flags(&self) -> Vec<bool> {
        self.ocr_flags.lock().clone()
    }
}

#[async_trait]
impl InferenceEngine for FakeEngine {
    async fn analyze(
        &self,
        _dataset: TypedDataset,
        ocr: bool,
        _config: &AnalyzerConfig,
    ) -> Result<InferenceResult, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ocr_flags.lock().push(ocr);
        if self.fail {
            return Err(InferenceError::Unavailable("model server down".to_string()));
        }
        InferenceResult::from_value(self.reply.clone())
            .map_err(|e| InferenceError::Malformed(e.to_string()))
    }

    async fn is_available(&self) -> bool {
        !self.fail
    }
}

/// Converter that emits a fixed PDF and remembers where it ran
pub struct FakeConverter {
    pub seen: Mutex<Vec<PathBuf>>,
    output: Vec<u8>,
}

impl FakeConverter {
    pub fn emitting(output: Vec<u8>) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            output,
        }
    }
}

/// Converts to a page without a text layer, like a scanned deck
impl Default for FakeConverter {
    fn default() -> Self {
        Self::emitting(scanned_pdf())
    }
}

#[async_trait]
impl OfficeConverter for FakeConverter {
    async fn convert(&self, staged_dir: &Path) -> Result<Vec<PathBuf>, DatasetError> {
        self.seen.lock().push(staged_dir.to_path_buf());
        let out = staged_dir.join("source.pdf");
        tokio::fs::write(&out, &self.output).await?;
        Ok(vec![out])
    }
}

/// A router over fakes plus the directories it touches
pub struct TestApp {
    pub router: Router,
    pub engine: Arc<FakeEngine>,
    pub converter: Arc<FakeConverter>,
    pub staging: TempDir,
    pub output: TempDir,
}

impl TestApp {
    pub fn new(engine: FakeEngine) -> Self {
        Self::with_converter(engine, FakeConverter::default())
    }

    pub fn with_converter(engine: FakeEngine, converter: FakeConverter) -> Self {
        let staging = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let engine = Arc::new(engine);
        let converter = Arc::new(converter);

        let mut config = Config::default();
        config.staging.root = staging.path().to_path_buf();

        let state = AppState::new(
            config,
            engine.clone(),
            converter.clone(),
            Arc::new(ConfigCredentialResolver::default()),
        );

        Self {
            router: build_router(state),
            engine,
            converter,
            staging,
            output,
        }
    }

    pub fn output_dir(&self) -> String {
        self.output.path().to_string_lossy().to_string()
    }

    pub fn staging_entries(&self) -> usize {
        std::fs::read_dir(self.staging.path()).unwrap().count()
    }

    pub async fn post_form(&self, parts: &[Part<'_>]) -> (StatusCode, Value) {
        self.send(form_request().body(Body::from(multipart_body(parts))).unwrap())
            .await
    }

    /// Response as served, headers and encoded body untouched
    pub async fn respond(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(req).await
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.respond(req).await;
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}

/// Request builder for a multipart POST to the parse endpoint
pub fn form_request() -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri("/file_parse")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                        name, value
                    )
                    .as_bytes(),
                );
            }
            Part::File(file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// Single-page PDF whose only content stream is `content`
pub fn build_pdf(content: &str) -> Vec<u8> {
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref = pdf.len();
    let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        table.push_str(&format!("{:010} 00000 n \n", offset));
    }
    table.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref
    ));
    pdf.extend_from_slice(table.as_bytes());
    pdf
}

pub fn text_pdf() -> Vec<u8> {
    build_pdf("BT /F1 24 Tf 72 700 Td (Hello parsing world from a text layer) Tj ET")
}

/// A page with vector strokes and no text
pub fn scanned_pdf() -> Vec<u8> {
    build_pdf("0 0 m 612 792 l S")
}

pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::new(8, 8);
    let mut buffer = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    buffer
}

/// Reply for a one-page document with a title and a paragraph
pub fn simple_reply() -> Value {
    json!({
        "pages": [{
            "page_idx": 0,
            "width": 612.0,
            "height": 792.0,
            "blocks": [
                {"category": "title", "bbox": [72, 60, 540, 90], "text": "Hello parsing world", "level": 1},
                {"category": "text", "bbox": [72, 100, 540, 200], "text": "A single paragraph."},
                {"category": "footer", "bbox": [72, 760, 540, 780], "text": "Confidential"}
            ]
        }],
        "backend": "fake"
    })
}

/// Reply with `count` distinct image crops on one page
pub fn image_reply(count: u8) -> Value {
    let blocks: Vec<Value> = (0..count)
        .map(|i| {
            let crop = base64::engine::general_purpose::STANDARD.encode([0xff, 0xd8, i, 0xff, 0xd9]);
            json!({
                "category": "image",
                "bbox": [0, f32::from(i) * 50.0, 100, f32::from(i) * 50.0 + 40.0],
                "image_base64": crop
            })
        })
        .collect();
    json!({"pages": [{"page_idx": 0, "width": 612.0, "height": 792.0, "blocks": blocks}]})
}
