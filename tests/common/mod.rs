use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};

use gerenciamento_api::app::{app, AppState};
use gerenciamento_api::services::ProjectService;
use gerenciamento_api::store::MemoryStore;

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    /// Boots a fresh application (empty store) on an unused port.
    ///
    /// The listener is bound before the serve task is spawned, so requests
    /// issued right after this returns cannot be refused. Each test gets its
    /// own server; state never leaks between tests.
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(MemoryStore::new());
        let service = Arc::new(ProjectService::new(store));
        let router = app(AppState::new(service));

        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self { port, base_url })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Attaches the identity headers the gateway would set for a plain user.
pub fn as_user(req: RequestBuilder, user_id: i64) -> RequestBuilder {
    req.header("x-user-id", user_id.to_string())
}

/// Attaches the identity headers the gateway would set for an administrator.
pub fn as_admin(req: RequestBuilder, user_id: i64) -> RequestBuilder {
    as_user(req, user_id).header("x-user-admin", "true")
}

/// Creates a project as `user_id` and returns its id.
pub async fn create_project(
    server: &TestServer,
    client: &Client,
    user_id: i64,
    titulo: &str,
) -> Result<i64> {
    let res = as_user(client.post(server.url("/gerenciamento")), user_id)
        .json(&serde_json::json!({ "titulo": titulo }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "project create failed: {}",
        res.status()
    );

    let body = res.json::<serde_json::Value>().await?;
    body["id"].as_i64().context("project response missing id")
}

/// Adds an item (row) to a project and returns its id.
pub async fn add_item(
    server: &TestServer,
    client: &Client,
    user_id: i64,
    project_id: i64,
    nome: &str,
) -> Result<i64> {
    let res = as_user(
        client.post(server.url(&format!("/gerenciamento/{}/itens", project_id))),
        user_id,
    )
    .json(&serde_json::json!({ "nome": nome }))
    .send()
    .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "item create failed: {}",
        res.status()
    );

    let body = res.json::<serde_json::Value>().await?;
    body["id"].as_i64().context("item response missing id")
}

/// Adds an action (column) to a project and returns its id.
pub async fn add_action(
    server: &TestServer,
    client: &Client,
    user_id: i64,
    project_id: i64,
    nome: &str,
) -> Result<i64> {
    let res = as_user(
        client.post(server.url(&format!("/gerenciamento/{}/acoes", project_id))),
        user_id,
    )
    .json(&serde_json::json!({ "nome": nome }))
    .send()
    .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "action create failed: {}",
        res.status()
    );

    let body = res.json::<serde_json::Value>().await?;
    body["id"].as_i64().context("action response missing id")
}

/// Toggles the cell at (item, action) and returns the response body.
pub async fn toggle_cell(
    server: &TestServer,
    client: &Client,
    user_id: i64,
    project_id: i64,
    item_id: i64,
    acao_id: i64,
) -> Result<serde_json::Value> {
    let res = as_user(
        client.post(server.url(&format!("/gerenciamento/{}/checklists", project_id))),
        user_id,
    )
    .json(&serde_json::json!({ "item_id": item_id, "acao_id": acao_id }))
    .send()
    .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED || res.status() == StatusCode::OK,
        "cell toggle failed: {}",
        res.status()
    );

    Ok(res.json::<serde_json::Value>().await?)
}
