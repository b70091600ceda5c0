#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use url::Url;

use realty_api::config::Config;
use realty_api::routes::create_routes;
use realty_api::state::AppState;

const BOUNDARY: &str = "realty-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub uploads: TempDir,
    pub staging: TempDir,
}

pub async fn spawn_app() -> TestApp {
    // One connection, so every query sees the same in-memory database.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let uploads = tempfile::tempdir().unwrap();
    let staging = tempfile::tempdir().unwrap();
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 3500,
        cors_origins: Vec::new(),
        root_path: Url::parse("http://localhost:3500/").unwrap(),
        upload_dir: uploads.path().to_path_buf(),
        staging_dir: staging.path().to_path_buf(),
        max_upload_bytes: 10 * 1024 * 1024,
    };
    let router = create_routes(AppState::new(db.clone(), config));
    TestApp {
        router,
        db,
        uploads,
        staging,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn multipart(&self, method: Method, uri: &str, form: Multipart) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(form.finish()))
            .unwrap();
        self.send(request).await
    }

    /// Id of the only record a list endpoint returns.
    pub async fn single_id(&self, uri: &str) -> String {
        let (status, body) = self.get(uri).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1, "{body}");
        items[0]["id"].as_str().unwrap().to_string()
    }

    pub async fn create_agent(&self, name: &str, email: &str) -> String {
        let (status, body) = self
            .json(
                Method::POST,
                "/api/agents",
                serde_json::json!({ "name": name, "email": email, "phone": "+971500000000" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let (_, agents) = self.get(&format!("/api/agents/search?email={email}")).await;
        agents[0]["id"].as_str().unwrap().to_string()
    }
}

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

pub fn png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([20, 120, 220]));
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

/// Files below `dir`, recursively. Missing directories hold nothing.
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(files_under(&path));
        } else {
            files.push(path);
        }
    }
    files
}

/// Polls `check` until it holds, for work finished by background tasks.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..50 {
        if check() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    check()
}

/// Local path of a media url served under `/uploads`.
pub fn upload_path(app: &TestApp, url: &str) -> PathBuf {
    let relative = url
        .strip_prefix("http://localhost:3500/uploads/")
        .unwrap_or_else(|| panic!("not an upload url: {url}"));
    app.uploads.path().join(relative)
}
