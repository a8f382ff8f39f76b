//! End-to-end tests for the parse endpoint

mod common;

use axum::http::StatusCode;
use serde_json::Value;

use axum::body::Body;
use axum::http::header::{ACCEPT_ENCODING, CONTENT_ENCODING};

use common::{
    form_request, image_reply, multipart_body, png_bytes, scanned_pdf, simple_reply, text_pdf,
    FakeConverter, FakeEngine, Part, TestApp,
};

#[tokio::test]
async fn text_pdf_upload_returns_markdown_and_content_list() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let output_dir = app.output_dir();
    let pdf = text_pdf();

    let (status, body) = app
        .post_form(&[
            Part::File("report.v2.pdf", &pdf),
            Part::Text("return_content_list", "true"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(
        body["md_content"],
        "# Hello parsing world\n\nA single paragraph.\n"
    );

    let list = body["content_list"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["type"], "text");
    assert_eq!(list[0]["text_level"], 1);
    assert_eq!(list[1]["text"], "A single paragraph.");
    assert_eq!(list[1]["page_idx"], 0);

    assert!(body.get("layout").is_none());
    assert!(body.get("info").is_none());
    assert!(body.get("images").is_none());

    // Auto mode picked text analysis for a PDF with a text layer
    assert_eq!(app.engine.ocr_flags(), vec![false]);

    // Nothing persisted without is_json_md_dump
    assert!(!app.output.path().join("report/report.md").exists());
}

#[tokio::test]
async fn scanned_pdf_is_analyzed_with_ocr() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let output_dir = app.output_dir();
    let pdf = scanned_pdf();

    let (status, _) = app
        .post_form(&[Part::File("scan.pdf", &pdf), Part::Text("output_dir", &output_dir)])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.engine.ocr_flags(), vec![true]);
}

#[tokio::test]
async fn explicit_method_overrides_classification() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let output_dir = app.output_dir();
    let pdf = text_pdf();

    let (status, _) = app
        .post_form(&[
            Part::File("paper.pdf", &pdf),
            Part::Text("parse_method", "ocr"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.engine.ocr_flags(), vec![true]);
}

#[tokio::test]
async fn both_or_neither_source_is_rejected() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let pdf = text_pdf();

    let (status, body) = app
        .post_form(&[
            Part::File("paper.pdf", &pdf),
            Part::Text("file_path", "/data/paper.pdf"),
        ])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not both"));

    let (status, body) = app
        .post_form(&[Part::Text("return_images", "true")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    assert_eq!(app.engine.calls(), 0);
}

#[tokio::test]
async fn unsupported_extension_touches_nothing() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let output_dir = app.output_dir();

    let (status, body) = app
        .post_form(&[
            Part::File("sheet.xlsx", b"PK\x03\x04"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("xlsx"));
    assert_eq!(app.staging_entries(), 0);
    assert_eq!(std::fs::read_dir(app.output.path()).unwrap().count(), 0);
    assert_eq!(app.engine.calls(), 0);
}

#[tokio::test]
async fn invalid_flag_and_method_are_rejected() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let pdf = text_pdf();

    let (status, _) = app
        .post_form(&[Part::File("a.pdf", &pdf), Part::Text("return_info", "sometimes")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_form(&[Part::File("a.pdf", &pdf), Part::Text("parse_method", "vlm")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.engine.calls(), 0);
}

#[tokio::test]
async fn non_pdf_bytes_with_pdf_extension_are_invalid() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let output_dir = app.output_dir();

    let (status, _) = app
        .post_form(&[
            Part::File("fake.pdf", b"not a pdf at all"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.engine.calls(), 0);
}

#[tokio::test]
async fn office_staging_is_removed_after_success() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let output_dir = app.output_dir();

    let (status, body) = app
        .post_form(&[
            Part::File("slides.pptx", b"pptx bytes"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    // The converted deck has no text layer, so auto mode falls back to OCR
    assert_eq!(app.engine.ocr_flags(), vec![true]);

    let seen = app.converter.seen.lock().clone();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with(app.staging.path()));
    assert!(!seen[0].exists());
    assert_eq!(app.staging_entries(), 0);
}

#[tokio::test]
async fn office_auto_mode_follows_the_converted_text_layer() {
    let app = TestApp::with_converter(
        FakeEngine::replying(simple_reply()),
        FakeConverter::emitting(text_pdf()),
    );
    let output_dir = app.output_dir();

    let (status, body) = app
        .post_form(&[
            Part::File("letter.docx", b"docx bytes"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let (status, _) = app
        .post_form(&[
            Part::File("letter.docx", b"docx bytes"),
            Part::Text("parse_method", "ocr"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.engine.ocr_flags(), vec![false, true]);
    assert_eq!(app.staging_entries(), 0);
}

#[tokio::test]
async fn office_staging_is_removed_after_analysis_failure() {
    let app = TestApp::new(FakeEngine::failing());
    let output_dir = app.output_dir();

    let (status, body) = app
        .post_form(&[
            Part::File("notes.docx", b"docx bytes"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Document analysis failed");
    assert_eq!(app.engine.calls(), 1);

    let seen = app.converter.seen.lock().clone();
    assert!(!seen[0].exists());
    assert_eq!(app.staging_entries(), 0);
}

#[tokio::test]
async fn image_upload_requires_ocr() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let output_dir = app.output_dir();
    let png = png_bytes();

    let (status, _) = app
        .post_form(&[
            Part::File("photo.png", &png),
            Part::Text("parse_method", "txt"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.engine.calls(), 0);
    assert_eq!(app.staging_entries(), 0);

    let (status, _) = app
        .post_form(&[Part::File("photo.png", &png), Part::Text("output_dir", &output_dir)])
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.engine.ocr_flags(), vec![true]);
    assert_eq!(app.staging_entries(), 0);
}

#[tokio::test]
async fn at_most_five_images_are_inlined() {
    let app = TestApp::new(FakeEngine::replying(image_reply(8)));
    let output_dir = app.output_dir();
    let pdf = text_pdf();

    let (status, body) = app
        .post_form(&[
            Part::File("figures.pdf", &pdf),
            Part::Text("return_images", "true"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);

    let images = body["images"].as_object().unwrap();
    assert_eq!(images.len(), 5);
    let names: Vec<&String> = images.keys().collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    for (name, uri) in images {
        assert!(name.ends_with(".jpg"));
        assert!(uri.as_str().unwrap().starts_with("data:image/jpeg;base64,"));
    }

    let on_disk = std::fs::read_dir(app.output.path().join("figures/images"))
        .unwrap()
        .count();
    assert_eq!(on_disk, 8);

    // Every extracted image is linked from the markdown
    assert_eq!(body["md_content"].as_str().unwrap().matches("![](images/").count(), 8);
}

#[tokio::test]
async fn persisted_artifacts_match_the_response() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let output_dir = app.output_dir();
    let pdf = text_pdf();

    let (status, body) = app
        .post_form(&[
            Part::File("annual.report.pdf", &pdf),
            Part::Text("is_json_md_dump", "true"),
            Part::Text("return_layout", "true"),
            Part::Text("return_info", "1"),
            Part::Text("return_content_list", "yes"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let dir = app.output.path().join("annual");
    let read_json = |name: &str| -> Value {
        serde_json::from_str(&std::fs::read_to_string(dir.join(name)).unwrap()).unwrap()
    };

    assert_eq!(
        std::fs::read_to_string(dir.join("annual.md")).unwrap(),
        body["md_content"].as_str().unwrap()
    );
    assert_eq!(read_json("annual_content_list.json"), body["content_list"]);
    assert_eq!(read_json("annual_middle.json"), body["info"]);
    assert_eq!(read_json("annual_model.json"), body["layout"]);

    assert_eq!(body["layout"]["backend"], "fake");
    assert_eq!(body["info"]["_parse_type"], "txt");
    assert_eq!(body["info"]["pdf_info"][0]["discarded_blocks"][0]["type"], "footer");
    assert!(dir.join("images").is_dir());
}

#[tokio::test]
async fn dump_without_return_flags_still_persists_everything() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let output_dir = app.output_dir();
    let pdf = text_pdf();

    let (status, body) = app
        .post_form(&[
            Part::File("memo.pdf", &pdf),
            Part::Text("is_json_md_dump", "on"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;
    assert_eq!(status, StatusCode::OK);

    let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["md_content"]);

    let dir = app.output.path().join("memo");
    for name in ["memo.md", "memo_content_list.json", "memo_middle.json", "memo_model.json"] {
        assert!(dir.join(name).is_file(), "missing {}", name);
    }
}

#[tokio::test]
async fn local_file_path_is_read_from_disk() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let output_dir = app.output_dir();
    let source = tempfile::TempDir::new().unwrap();
    let path = source.path().join("onpath.pdf");
    std::fs::write(&path, text_pdf()).unwrap();

    let (status, body) = app
        .post_form(&[
            Part::Text("file_path", &path.to_string_lossy()),
            Part::Text("output_dir", &output_dir),
        ])
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["md_content"].as_str().unwrap().starts_with("# Hello"));

    let missing = source.path().join("missing.pdf");
    let (status, body) = app
        .post_form(&[
            Part::Text("file_path", &missing.to_string_lossy()),
            Part::Text("output_dir", &output_dir),
        ])
        .await;
    // A missing source is a bad file_path, not a missing route
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("missing.pdf"));
    assert_eq!(app.engine.calls(), 1);
}

#[tokio::test]
async fn unconfigured_bucket_is_a_server_error() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));

    let (status, body) = app
        .post_form(&[Part::Text("file_path", "s3://unknown-bucket/in/a.pdf")])
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Storage is not configured for the requested location"
    );
    assert_eq!(app.engine.calls(), 0);
}

#[tokio::test]
async fn repeated_requests_produce_identical_exports() {
    let app = TestApp::new(FakeEngine::replying(image_reply(2)));
    let output_dir = app.output_dir();
    let pdf = text_pdf();
    let parts = [
        Part::File("again.pdf", &pdf),
        Part::Text("return_content_list", "true"),
        Part::Text("output_dir", &output_dir),
    ];

    let (_, first) = app.post_form(&parts).await;
    let (_, second) = app.post_form(&parts).await;

    assert_eq!(first["md_content"], second["md_content"]);
    assert_eq!(first["content_list"], second["content_list"]);
}

#[tokio::test]
async fn non_multipart_request_is_rejected() {
    let app = TestApp::new(FakeEngine::replying(simple_reply()));
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/file_parse")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{}"))
        .unwrap();

    let (status, body) = app.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn failure_after_analysis_returns_only_an_error() {
    let reply = serde_json::json!({
        "pages": [{
            "page_idx": 0,
            "width": 612.0,
            "height": 792.0,
            "blocks": [
                {"category": "text", "bbox": [72, 60, 540, 90], "text": "Before the figure"},
                {"category": "image", "bbox": [72, 100, 540, 400], "image_base64": "!!bad"}
            ]
        }]
    });
    let app = TestApp::new(FakeEngine::replying(reply));
    let output_dir = app.output_dir();

    let (status, body) = app
        .post_form(&[
            Part::File("deck.pptx", b"pptx bytes"),
            Part::Text("return_content_list", "true"),
            Part::Text("return_images", "true"),
            Part::Text("output_dir", &output_dir),
        ])
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.engine.calls(), 1);

    let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["error"]);
    assert_eq!(body["error"], "Failed to process document");
    assert_eq!(app.staging_entries(), 0);
    assert!(!app.output.path().join("deck/deck.md").exists());
}

#[tokio::test]
async fn large_responses_are_gzip_encoded() {
    let app = TestApp::new(FakeEngine::replying(image_reply(8)));
    let output_dir = app.output_dir();
    let pdf = text_pdf();
    let parts = [
        Part::File("figures.pdf", &pdf),
        Part::Text("return_content_list", "true"),
        Part::Text("return_images", "true"),
        Part::Text("output_dir", &output_dir),
    ];

    let req = form_request()
        .header(ACCEPT_ENCODING, "gzip")
        .body(Body::from(multipart_body(&parts)))
        .unwrap();
    let resp = app.respond(req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[CONTENT_ENCODING], "gzip");

    // Clients that do not ask for gzip get plain JSON
    let (status, body) = app.post_form(&parts).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["md_content"].is_string());
}
