#![allow(dead_code)]

use std::net::SocketAddr;

use reqwest::{Client, Method, Response};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

use umkm_api::{build_router, ApiConfig, AppState};

/// The API served in-process on an ephemeral port, backed by a database in
/// a temporary directory.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub database_url: String,
    /// Keeps cookies between requests like a browser does.
    pub client: Client,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(&[]).await
    }

    /// Starts with extra environment-style settings, e.g.
    /// `("ENFORCE_PERMISSIONS", "true")`.
    pub async fn start_with(vars: &[(&str, &str)]) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let database_url = format!("sqlite://{}", temp_dir.path().join("umkm.db").display());

        let mut settings: Vec<(String, String)> = vec![
            ("DATABASE_URL".to_string(), database_url.clone()),
            ("JWT_SECRET".to_string(), "integration-secret".to_string()),
            ("AI_TIMEOUT_SECS".to_string(), "5".to_string()),
        ];
        settings.extend(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        let config = ApiConfig::from_lookup(|key| {
            settings
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .expect("valid config");

        let state = AppState::new(config).expect("app state");
        state
            .databases
            .initialize(&database_url)
            .await
            .expect("initialize database");
        let base_url = serve(build_router(state)).await;

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("http client");

        Self {
            temp_dir,
            base_url,
            database_url,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and returns the status and the JSON body.
    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> (u16, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.expect("send request");
        json_of(response).await
    }

    /// Like [`send`](Self::send) with a bearer token and a fresh cookie jar.
    pub async fn send_as(
        &self,
        token: &str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> (u16, Value) {
        let mut request = Client::new()
            .request(method, self.url(path))
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.expect("send request");
        json_of(response).await
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> (u16, Value) {
        self.send(Method::DELETE, path, None).await
    }

    /// Creates a product and returns its id.
    pub async fn create_product(&self, name: &str, price: i64, stock: i64) -> String {
        let (status, body) = self
            .post(
                "/api/products",
                json!({ "name": name, "price": price, "cost": price / 2, "stock": stock }),
            )
            .await;
        assert_eq!(status, 200, "create product failed: {body}");
        body["data"]["id"].as_str().expect("product id").to_string()
    }

    pub async fn product_stock(&self, id: &str) -> i64 {
        let (status, body) = self.get(&format!("/api/products?id={}", id)).await;
        assert_eq!(status, 200, "get product failed: {body}");
        body["data"]["stock"].as_i64().expect("stock")
    }
}

/// Serves `app` on 127.0.0.1 with an OS-assigned port and returns its base URL.
pub async fn serve(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr: SocketAddr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}", addr)
}

async fn json_of(response: Response) -> (u16, Value) {
    let status = response.status().as_u16();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}
