mod common;

use anyhow::Result;
use reqwest::StatusCode;

// Rows, columns, and the per-cell state machine over the wire:
// POST /checklists toggles inclusion, PUT /checklists/:id sets absolute
// values, deletes cascade cells.

#[tokio::test]
async fn create_item_returns_slim_row() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;

    let res = common::as_user(
        client.post(server.url(&format!("/gerenciamento/{}/itens", project))),
        10,
    )
    .json(&serde_json::json!({ "nome": "Fundacao", "ordem": 3 }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::CREATED, "unexpected status: {}", res.status());

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["nome"], "Fundacao");
    assert_eq!(body["ordem"], 3);
    assert_eq!(body["gerenciamento_id"], project);
    assert!(body.get("checklists").is_none(), "slim response grew a matrix: {}", body);
    assert!(body.get("status").is_none(), "slim response grew a status: {}", body);

    Ok(())
}

#[tokio::test]
async fn items_come_back_in_explicit_order() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;

    for (nome, ordem) in [("Acabamento", 2), ("Fundacao", 0), ("Estrutura", 1)] {
        let res = common::as_user(
            client.post(server.url(&format!("/gerenciamento/{}/itens", project))),
            10,
        )
        .json(&serde_json::json!({ "nome": nome, "ordem": ordem }))
        .send()
        .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = common::as_user(client.get(server.url(&format!("/gerenciamento/{}", project))), 10)
        .send()
        .await?;
    let body = res.json::<serde_json::Value>().await?;
    let nomes: Vec<&str> = body["itens"]
        .as_array()
        .map(|itens| itens.iter().filter_map(|i| i["nome"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(nomes, vec!["Fundacao", "Estrutura", "Acabamento"]);

    Ok(())
}

#[tokio::test]
async fn update_item_renames_and_reorders() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;
    let item = common::add_item(&server, &client, 10, project, "Fundacao").await?;

    let res = common::as_user(
        client.put(server.url(&format!("/gerenciamento/{}/itens/{}", project, item))),
        10,
    )
    .json(&serde_json::json!({ "nome": "Fundacao profunda", "ordem": 5 }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::OK, "unexpected status: {}", res.status());

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["nome"], "Fundacao profunda");
    assert_eq!(body["ordem"], 5);

    Ok(())
}

#[tokio::test]
async fn update_action_renames_the_column() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;
    let action = common::add_action(&server, &client, 10, project, "Medir").await?;

    let res = common::as_user(
        client.put(server.url(&format!("/gerenciamento/{}/acoes/{}", project, action))),
        10,
    )
    .json(&serde_json::json!({ "nome": "Conferir medidas", "ordem": 2 }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::OK, "unexpected status: {}", res.status());

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["nome"], "Conferir medidas");
    assert_eq!(body["ordem"], 2);

    Ok(())
}

#[tokio::test]
async fn first_toggle_creates_an_active_incomplete_cell() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;
    let item = common::add_item(&server, &client, 10, project, "Fundacao").await?;
    let action = common::add_action(&server, &client, 10, project, "Medir").await?;

    let res = common::as_user(
        client.post(server.url(&format!("/gerenciamento/{}/checklists", project))),
        10,
    )
    .json(&serde_json::json!({ "item_id": item, "acao_id": action }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::CREATED, "unexpected status: {}", res.status());

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["ativo"], true);
    assert_eq!(body["concluido"], false);
    assert!(body["data_conclusao"].is_null());
    assert_eq!(body["status_item"], 0.0);
    assert_eq!(body["status_projeto"], 0.0);

    Ok(())
}

#[tokio::test]
async fn second_toggle_deactivates_with_ok() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;
    let item = common::add_item(&server, &client, 10, project, "Fundacao").await?;
    let action = common::add_action(&server, &client, 10, project, "Medir").await?;
    common::toggle_cell(&server, &client, 10, project, item, action).await?;

    let res = common::as_user(
        client.post(server.url(&format!("/gerenciamento/{}/checklists", project))),
        10,
    )
    .json(&serde_json::json!({ "item_id": item, "acao_id": action }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::OK, "unexpected status: {}", res.status());

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["ativo"], false);

    Ok(())
}

#[tokio::test]
async fn completion_flows_through_put_by_id() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;
    let item = common::add_item(&server, &client, 10, project, "Fundacao").await?;
    let action = common::add_action(&server, &client, 10, project, "Medir").await?;
    let cell = common::toggle_cell(&server, &client, 10, project, item, action).await?;
    let cell_id = cell["id"].as_i64().unwrap_or_default();

    let res = common::as_user(
        client.put(server.url(&format!("/gerenciamento/{}/checklists/{}", project, cell_id))),
        10,
    )
    .json(&serde_json::json!({ "concluido": true }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::OK, "unexpected status: {}", res.status());

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["concluido"], true);
    assert_eq!(body["concluido_por"], 10);
    assert!(body["data_conclusao"].is_string(), "missing completion stamp: {}", body);
    assert_eq!(body["status_item"], 1.0);
    assert_eq!(body["status_projeto"], 1.0);

    Ok(())
}

#[tokio::test]
async fn completing_an_inactive_cell_is_a_state_conflict() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;
    let item = common::add_item(&server, &client, 10, project, "Fundacao").await?;
    let action = common::add_action(&server, &client, 10, project, "Medir").await?;
    let cell = common::toggle_cell(&server, &client, 10, project, item, action).await?;
    let cell_id = cell["id"].as_i64().unwrap_or_default();

    // Deactivate, then try to complete
    common::toggle_cell(&server, &client, 10, project, item, action).await?;
    let res = common::as_user(
        client.put(server.url(&format!("/gerenciamento/{}/checklists/{}", project, cell_id))),
        10,
    )
    .json(&serde_json::json!({ "concluido": true }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT, "unexpected status: {}", res.status());

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "INVALID_STATE");

    // The cell is untouched
    let res = common::as_user(client.get(server.url(&format!("/gerenciamento/{}", project))), 10)
        .send()
        .await?;
    let detail = res.json::<serde_json::Value>().await?;
    let cell = &detail["itens"][0]["checklists"][0];
    assert_eq!(cell["ativo"], false);
    assert_eq!(cell["concluido"], false);

    Ok(())
}

#[tokio::test]
async fn disable_preserves_completion_for_later() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;
    let item = common::add_item(&server, &client, 10, project, "Fundacao").await?;
    let action = common::add_action(&server, &client, 10, project, "Medir").await?;
    let cell = common::toggle_cell(&server, &client, 10, project, item, action).await?;
    let cell_id = cell["id"].as_i64().unwrap_or_default();
    let put_url = server.url(&format!("/gerenciamento/{}/checklists/{}", project, cell_id));

    // Complete it, drop it from the plan, then bring it back
    let res = common::as_user(client.put(&put_url), 10)
        .json(&serde_json::json!({ "concluido": true }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    common::toggle_cell(&server, &client, 10, project, item, action).await?;
    let body = common::toggle_cell(&server, &client, 10, project, item, action).await?;

    assert_eq!(body["ativo"], true);
    assert_eq!(body["concluido"], true, "completion lost across disable: {}", body);
    assert!(body["data_conclusao"].is_string(), "stamp lost across disable: {}", body);
    assert_eq!(body["status_item"], 1.0);

    Ok(())
}

#[tokio::test]
async fn combined_put_reenables_and_completes_at_once() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;
    let item = common::add_item(&server, &client, 10, project, "Fundacao").await?;
    let action = common::add_action(&server, &client, 10, project, "Medir").await?;
    let cell = common::toggle_cell(&server, &client, 10, project, item, action).await?;
    let cell_id = cell["id"].as_i64().unwrap_or_default();

    // Deactivate first
    common::toggle_cell(&server, &client, 10, project, item, action).await?;

    let res = common::as_user(
        client.put(server.url(&format!("/gerenciamento/{}/checklists/{}", project, cell_id))),
        10,
    )
    .json(&serde_json::json!({ "ativo": true, "concluido": true }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::OK, "unexpected status: {}", res.status());

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["ativo"], true);
    assert_eq!(body["concluido"], true);

    Ok(())
}

#[tokio::test]
async fn combined_put_cannot_complete_while_disabling() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;
    let item = common::add_item(&server, &client, 10, project, "Fundacao").await?;
    let action = common::add_action(&server, &client, 10, project, "Medir").await?;
    let cell = common::toggle_cell(&server, &client, 10, project, item, action).await?;
    let cell_id = cell["id"].as_i64().unwrap_or_default();

    let res = common::as_user(
        client.put(server.url(&format!("/gerenciamento/{}/checklists/{}", project, cell_id))),
        10,
    )
    .json(&serde_json::json!({ "ativo": false, "concluido": true }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT, "unexpected status: {}", res.status());

    // Neither half applied
    let res = common::as_user(client.get(server.url(&format!("/gerenciamento/{}", project))), 10)
        .send()
        .await?;
    let detail = res.json::<serde_json::Value>().await?;
    let cell = &detail["itens"][0]["checklists"][0];
    assert_eq!(cell["ativo"], true);
    assert_eq!(cell["concluido"], false);

    Ok(())
}

#[tokio::test]
async fn deleting_an_item_cascades_its_cells() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;
    let item_a = common::add_item(&server, &client, 10, project, "Fundacao").await?;
    let item_b = common::add_item(&server, &client, 10, project, "Estrutura").await?;
    let action = common::add_action(&server, &client, 10, project, "Medir").await?;
    common::toggle_cell(&server, &client, 10, project, item_a, action).await?;
    common::toggle_cell(&server, &client, 10, project, item_b, action).await?;

    let res = common::as_user(
        client.delete(server.url(&format!("/gerenciamento/{}/itens/{}", project, item_a))),
        10,
    )
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT, "unexpected status: {}", res.status());

    let res = common::as_user(client.get(server.url(&format!("/gerenciamento/{}", project))), 10)
        .send()
        .await?;
    let detail = res.json::<serde_json::Value>().await?;
    let itens = detail["itens"].as_array().cloned().unwrap_or_default();
    assert_eq!(itens.len(), 1);
    assert_eq!(itens[0]["id"], item_b);
    assert_eq!(itens[0]["checklists"].as_array().map(|c| c.len()), Some(1));

    Ok(())
}

#[tokio::test]
async fn deleting_an_action_cascades_across_items() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;
    let item_a = common::add_item(&server, &client, 10, project, "Fundacao").await?;
    let item_b = common::add_item(&server, &client, 10, project, "Estrutura").await?;
    let medir = common::add_action(&server, &client, 10, project, "Medir").await?;
    let cortar = common::add_action(&server, &client, 10, project, "Cortar").await?;
    for item in [item_a, item_b] {
        common::toggle_cell(&server, &client, 10, project, item, medir).await?;
        common::toggle_cell(&server, &client, 10, project, item, cortar).await?;
    }

    let res = common::as_user(
        client.delete(server.url(&format!("/gerenciamento/{}/acoes/{}", project, medir))),
        10,
    )
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT, "unexpected status: {}", res.status());

    let res = common::as_user(client.get(server.url(&format!("/gerenciamento/{}", project))), 10)
        .send()
        .await?;
    let detail = res.json::<serde_json::Value>().await?;
    for item in detail["itens"].as_array().cloned().unwrap_or_default() {
        let checklists = item["checklists"].as_array().cloned().unwrap_or_default();
        assert_eq!(checklists.len(), 1, "stale cells under {}: {:?}", item["nome"], checklists);
        assert_eq!(checklists[0]["acao_id"], cortar);
    }

    Ok(())
}

#[tokio::test]
async fn cell_coordinates_must_belong_to_the_project() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project_a = common::create_project(&server, &client, 10, "Obra A").await?;
    let project_b = common::create_project(&server, &client, 10, "Obra B").await?;
    let item_a = common::add_item(&server, &client, 10, project_a, "Fundacao").await?;
    let action_b = common::add_action(&server, &client, 10, project_b, "Medir").await?;

    let res = common::as_user(
        client.post(server.url(&format!("/gerenciamento/{}/checklists", project_a))),
        10,
    )
    .json(&serde_json::json!({ "item_id": item_a, "acao_id": action_b }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST, "unexpected status: {}", res.status());

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");

    Ok(())
}

#[tokio::test]
async fn matrix_writes_require_edit_rights() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;
    let item = common::add_item(&server, &client, 10, project, "Fundacao").await?;
    let action = common::add_action(&server, &client, 10, project, "Medir").await?;

    // Anonymous gets 401
    let res = client
        .post(server.url(&format!("/gerenciamento/{}/itens", project)))
        .json(&serde_json::json!({ "nome": "Intruso" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "unexpected status: {}", res.status());

    // A stranger gets 403
    let res = common::as_user(
        client.post(server.url(&format!("/gerenciamento/{}/checklists", project))),
        99,
    )
    .json(&serde_json::json!({ "item_id": item, "acao_id": action }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN, "unexpected status: {}", res.status());

    Ok(())
}

#[tokio::test]
async fn put_checklist_with_unknown_id_is_not_found() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let project = common::create_project(&server, &client, 10, "Obra").await?;

    let res = common::as_user(
        client.put(server.url(&format!("/gerenciamento/{}/checklists/4242", project))),
        10,
    )
    .json(&serde_json::json!({ "concluido": true }))
    .send()
    .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND, "unexpected status: {}", res.status());

    Ok(())
}
