use reqwest::{
    multipart::{Form, Part},
    StatusCode,
};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

use crate::config::Config;
use crate::state::AppState;

const MB: usize = 1024 * 1024;

struct TestApp {
    base: String,
    dir: TempDir,
    client: reqwest::Client,
}

impl TestApp {
    fn uploads(&self) -> std::path::PathBuf {
        self.dir.path().join("uploads")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

fn write_template(dir: &Path, name: &str) {
    std::fs::create_dir_all(dir).unwrap();
    image::RgbaImage::from_pixel(350, 248, image::Rgba([250, 245, 230, 255]))
        .save(dir.join(name))
        .unwrap();
}

async fn spawn_app(templates: &[&str]) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::rooted_at(dir.path());
    for name in templates {
        write_template(&config.templates_folder, name);
    }

    let state = Arc::new(AppState::new(Arc::new(config)));
    let app = super::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base: format!("http://{}", addr),
        dir,
        client: reqwest::Client::new(),
    }
}

fn jane(template: Option<&str>) -> Value {
    let mut body = json!({
        "name": "Jane Doe",
        "course": "Intro",
        "instructor": "A. Smith",
        "date": "2024-01-01",
    });
    if let Some(template) = template {
        body["template"] = json!(template);
    }
    body
}

async fn post_generate(app: &TestApp, body: &Value) -> (StatusCode, Value) {
    let res = app
        .client
        .post(app.url("/generate"))
        .json(body)
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap())
}

#[tokio::test]
async fn generate_renders_requested_template() {
    let app = spawn_app(&["1.png", "2.png"]).await;
    let (status, body) = post_generate(&app, &jane(Some("1.png"))).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Certificate generated successfully");
    let file = &body["file"];
    assert_eq!(file["template"], "1.png");
    assert_eq!(file["type"], "image/png");
    assert_eq!(file["data"]["name"], "Jane Doe");
    let url = file["url"].as_str().unwrap();
    assert!(url.ends_with(".png"));
    assert!(url.contains("/files/certificate_Jane_Doe_"));

    let name = file["name"].as_str().unwrap();
    let written = std::fs::read(app.uploads().join(name)).unwrap();
    assert_eq!(file["size"], written.len() as u64);
    let image = image::load_from_memory(&written).unwrap();
    assert_eq!((image.width(), image.height()), (350, 248));

    // the generated file is served back
    let res = app.client.get(url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
}

#[tokio::test]
async fn generate_defaults_to_first_template_alphabetically() {
    let app = spawn_app(&["b.png", "a.png"]).await;
    let (status, body) = post_generate(&app, &jane(None)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["file"]["template"], "a.png");
}

#[tokio::test]
async fn generate_unknown_template_lists_available() {
    let app = spawn_app(&["1.png", "2.png"]).await;
    let (status, body) = post_generate(&app, &jane(Some("9.png"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "Template 9.png not found. Available templates: 1.png, 2.png"
    );
    assert!(!app.uploads().exists());
}

#[tokio::test]
async fn generate_without_templates_is_not_found() {
    let app = spawn_app(&[]).await;
    let (status, _) = post_generate(&app, &jane(None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generate_reports_every_missing_field() {
    let app = spawn_app(&["1.png"]).await;
    let (status, body) = post_generate(&app, &json!({ "name": "Jane Doe" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Missing required fields: course, instructor, date"
    );
}

#[tokio::test]
async fn generate_rejects_malformed_json() {
    let app = spawn_app(&["1.png"]).await;
    let res = app
        .client
        .post(app.url("/generate"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_rejects_template_traversal() {
    let app = spawn_app(&["1.png"]).await;
    let (status, body) = post_generate(&app, &jane(Some("../1.png"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid filename");
}

#[tokio::test]
async fn generate_reports_undecodable_template_as_internal_error() {
    let app = spawn_app(&[]).await;
    let templates = app.dir.path().join("certificates");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(templates.join("1.png"), "not an image").unwrap();

    let (status, body) = post_generate(&app, &jane(Some("1.png"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate certificate");
    assert!(!body["details"].as_str().unwrap().is_empty(), "{}", body);
    assert!(!app.uploads().exists());
}

#[tokio::test]
async fn templates_are_listed_sorted() {
    let app = spawn_app(&["2.png", "1.png"]).await;
    std::fs::write(app.dir.path().join("certificates/notes.txt"), "x").unwrap();

    let body: Value = app
        .client
        .get(app.url("/templates"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 2);
    assert_eq!(body["templates"][0]["name"], "1.png");
    assert_eq!(body["templates"][0]["url"], "/certificates/1.png");
    assert_eq!(body["templates"][1]["name"], "2.png");
}

#[tokio::test]
async fn template_images_are_served_with_cache_headers() {
    let app = spawn_app(&["1.png"]).await;
    let res = app
        .client
        .get(app.url("/certificates/1.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.headers()["cache-control"], "public, max-age=3600");
    assert_eq!(
        res.headers()["content-disposition"],
        "inline; filename=\"1.png\""
    );

    let res = app
        .client
        .get(app.url("/certificates/3.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn traversal_names_are_rejected_on_serving_routes() {
    let app = spawn_app(&["1.png"]).await;
    std::fs::write(app.dir.path().join("secret.txt"), "top secret").unwrap();

    for path in [
        "/files/..%2Fsecret.txt",
        "/files/..secret.txt",
        "/files/a%5Cb.txt",
        "/certificates/..%2Fsecret.txt",
        "/certificates/",
        "/files/",
    ] {
        let res = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", path);
    }
}

#[tokio::test]
async fn files_listing_without_uploads_dir() {
    let app = spawn_app(&[]).await;
    let res = app.client.get(app.url("/files")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "files": [], "message": "No uploads directory found" })
    );
}

#[tokio::test]
async fn single_upload_overwrites_and_is_served() {
    let app = spawn_app(&[]).await;
    for content in ["first", "second"] {
        let form = Form::new().part(
            "file",
            Part::bytes(content.as_bytes().to_vec())
                .file_name("notes.txt")
                .mime_str("text/plain")
                .unwrap(),
        );
        let res = app
            .client
            .post(app.url("/upload"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["count"], 1);
        assert_eq!(body["files"][0]["name"], "notes.txt");
        assert_eq!(body["files"][0]["type"], "text/plain");
    }

    let res = app
        .client
        .get(app.url("/files/notes.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert_eq!(
        res.headers()["content-disposition"],
        "attachment; filename=\"notes.txt\""
    );
    assert_eq!(res.text().await.unwrap(), "second");

    let body: Value = app
        .client
        .get(app.url("/files"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["files"][0]["url"], "/files/notes.txt");
    assert_eq!(body["files"][0]["size"], 6);
    assert!(body["files"][0]["lastModified"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn multi_upload_uniquifies_names() {
    let app = spawn_app(&[]).await;
    let form = Form::new()
        .part("a", Part::bytes(b"one".to_vec()).file_name("same.txt"))
        .part("b", Part::bytes(b"two".to_vec()).file_name("same.txt"))
        .text("comment", "ignored");
    let res = app
        .client
        .post(app.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["count"], 2);

    let files = body["files"].as_array().unwrap();
    let first = files[0]["name"].as_str().unwrap();
    let second = files[1]["name"].as_str().unwrap();
    assert_ne!(first, second);
    for file in files {
        assert_eq!(file["originalName"], "same.txt");
        assert!(file["name"].as_str().unwrap().starts_with("same_"));
    }
    assert_eq!(std::fs::read_dir(app.uploads()).unwrap().count(), 2);
}

#[tokio::test]
async fn multi_upload_fails_only_when_nothing_is_stored() {
    let app = spawn_app(&[]).await;
    // a plain file where the uploads directory should be makes every save fail
    std::fs::write(app.uploads(), "in the way").unwrap();

    let form = Form::new()
        .part("a", Part::bytes(b"one".to_vec()).file_name("one.txt"))
        .part("b", Part::bytes(b"two".to_vec()).file_name("two.txt"));
    let res = app
        .client
        .post(app.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Failed to process upload");
    assert_eq!(body["details"], "no files could be stored");
}

#[tokio::test]
async fn quotes_in_served_names_are_escaped() {
    let app = spawn_app(&[]).await;
    std::fs::create_dir_all(app.uploads()).unwrap();
    std::fs::write(app.uploads().join("a\"b.txt"), "quoted").unwrap();

    let res = app
        .client
        .get(app.url("/files/a%22b.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()["content-disposition"],
        "attachment; filename=\"a\\\"b.txt\""
    );
    assert_eq!(res.text().await.unwrap(), "quoted");
}

#[tokio::test]
async fn oversized_single_upload_is_rejected() {
    let app = spawn_app(&[]).await;
    let form = Form::new().part("file", Part::bytes(vec![0u8; 15 * MB]).file_name("big.bin"));
    let res = app
        .client
        .post(app.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("too large"), "{}", error);
    assert!(error.contains("big.bin"), "{}", error);
    assert!(!app.uploads().exists());
}

#[tokio::test]
async fn oversized_batch_is_rejected_whole() {
    let app = spawn_app(&[]).await;
    // 50.5MB in total: over the batch limit but under the request body limit
    let mut form = Form::new();
    for i in 0..6 {
        let size = if i < 5 { 9 * MB } else { 5 * MB + MB / 2 };
        form = form.part(
            format!("file{}", i),
            Part::bytes(vec![1u8; size]).file_name(format!("part{}.bin", i)),
        );
    }
    let res = app
        .client
        .post(app.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("part5.bin"));
    assert!(!app.uploads().exists());
}

#[tokio::test]
async fn upload_without_files_is_bad_request() {
    let app = spawn_app(&[]).await;
    let form = Form::new().text("note", "no files here");
    let res = app
        .client
        .post(app.url("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "No file provided");
}

#[tokio::test]
async fn missing_upload_is_not_found() {
    let app = spawn_app(&[]).await;
    let res = app
        .client
        .get(app.url("/files/nothing.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "File not found");
}
