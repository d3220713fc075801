use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{categories, companies};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/companies", post(companies::create))
        .route(
            "/companies/{company_id}/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/companies/{company_id}/categories/roots",
            get(categories::roots),
        )
        .route("/companies/{company_id}/categories/tree", get(categories::tree))
        .route(
            "/companies/{company_id}/categories/reorder",
            post(categories::reorder),
        )
        .route(
            "/companies/{company_id}/categories/{id}",
            get(categories::get)
                .patch(categories::update)
                .delete(categories::delete),
        )
        .route(
            "/companies/{company_id}/categories/{id}/family",
            get(categories::family),
        )
        .route(
            "/companies/{company_id}/categories/{id}/products",
            get(categories::products),
        )
        .route(
            "/companies/{company_id}/categories/{id}/path",
            get(categories::path),
        )
        .with_state(state)
}

pub async fn run(engine: Engine) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use migration::{Migrator, MigratorTrait};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use uuid::Uuid;

    async fn test_router() -> (Router, Uuid) {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder().database(db).build().await.unwrap();
        let company_id = engine.create_company("Acme Retail").await.unwrap();
        let state = ServerState {
            engine: Arc::new(engine),
        };
        (router(state), company_id)
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(router: &Router, company_id: Uuid, body: Value) -> (StatusCode, Value) {
        send(
            router,
            Method::POST,
            &format!("/companies/{company_id}/categories"),
            Some(body),
        )
        .await
    }

    #[tokio::test]
    async fn create_company_returns_envelope() {
        let (router, _) = test_router().await;
        let (status, body) =
            send(&router, Method::POST, "/companies", Some(json!({"name": "Beta"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert!(body["data"]["id"].is_string());
    }

    #[tokio::test]
    async fn create_and_fetch_category() {
        let (router, company_id) = test_router().await;
        let (status, body) = create(&router, company_id, json!({"name": "Drinks"})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["name"], "Drinks");
        assert_eq!(body["data"]["sort_order"], 1);
        assert_eq!(body["data"]["is_active"], true);

        let id = body["data"]["id"].as_str().unwrap().to_string();
        let (status, body) = send(
            &router,
            Method::GET,
            &format!("/companies/{company_id}/categories/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Drinks");
        assert_eq!(body["parent_id"], Value::Null);
    }

    #[tokio::test]
    async fn duplicate_name_is_a_conflict_envelope() {
        let (router, company_id) = test_router().await;
        create(&router, company_id, json!({"name": "Drinks"})).await;
        let (status, body) = create(&router, company_id, json!({"name": "Drinks"})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(
            body["error"],
            "a category named \"Drinks\" already exists at this level"
        );
    }

    #[tokio::test]
    async fn missing_category_is_404() {
        let (router, company_id) = test_router().await;
        let missing = Uuid::new_v4();
        for suffix in ["", "/family", "/products", "/path"] {
            let (status, body) = send(
                &router,
                Method::GET,
                &format!("/companies/{company_id}/categories/{missing}{suffix}"),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::NOT_FOUND, "GET {suffix}");
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn patch_with_null_parent_moves_to_root() {
        let (router, company_id) = test_router().await;
        let (_, parent) = create(&router, company_id, json!({"name": "Drinks"})).await;
        let parent_id = parent["data"]["id"].as_str().unwrap().to_string();
        let (_, child) = create(
            &router,
            company_id,
            json!({"name": "Beer", "parent_id": parent_id}),
        )
        .await;
        let child_id = child["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(child["data"]["parent_id"], parent_id.as_str());

        let (status, body) = send(
            &router,
            Method::PATCH,
            &format!("/companies/{company_id}/categories/{child_id}"),
            Some(json!({"parent_id": null})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["parent_id"], Value::Null);
        assert_eq!(body["data"]["name"], "Beer");
    }

    #[tokio::test]
    async fn cycle_and_guarded_delete_are_422() {
        let (router, company_id) = test_router().await;
        let (_, parent) = create(&router, company_id, json!({"name": "Drinks"})).await;
        let parent_id = parent["data"]["id"].as_str().unwrap().to_string();
        let (_, child) = create(
            &router,
            company_id,
            json!({"name": "Beer", "parent_id": parent_id}),
        )
        .await;
        let child_id = child["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &router,
            Method::PATCH,
            &format!("/companies/{company_id}/categories/{parent_id}"),
            Some(json!({"parent_id": child_id})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            &router,
            Method::DELETE,
            &format!("/companies/{company_id}/categories/{parent_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "\"Drinks\" has subcategories, delete them first");

        let (status, body) = send(
            &router,
            Method::DELETE,
            &format!("/companies/{company_id}/categories/{child_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn undecodable_requests_answer_with_the_envelope() {
        let (router, company_id) = test_router().await;

        let (status, body) = send(
            &router,
            Method::GET,
            &format!("/companies/{company_id}/categories/not-a-uuid"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/companies/{company_id}/categories"))
            .header("content-type", "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);

        let (status, body) = create(&router, company_id, json!({"code": "DRK"})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            &router,
            Method::GET,
            &format!("/companies/{company_id}/categories?is_active=maybe"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn empty_patch_is_a_bad_request() {
        let (router, company_id) = test_router().await;
        let (_, created) = create(&router, company_id, json!({"name": "Drinks"})).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &router,
            Method::PATCH,
            &format!("/companies/{company_id}/categories/{id}"),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn reorder_then_list_roots_and_tree() {
        let (router, company_id) = test_router().await;
        let mut ids = Vec::new();
        for name in ["Drinks", "Food", "Snacks"] {
            let (_, body) = create(&router, company_id, json!({"name": name})).await;
            ids.push(body["data"]["id"].as_str().unwrap().to_string());
        }
        let (_, _) = create(
            &router,
            company_id,
            json!({"name": "Beer", "parent_id": ids[0]}),
        )
        .await;

        let (status, body) = send(
            &router,
            Method::POST,
            &format!("/companies/{company_id}/categories/reorder"),
            Some(json!({"ids": [ids[2], ids[0], ids[1]]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (_, roots) = send(
            &router,
            Method::GET,
            &format!("/companies/{company_id}/categories/roots"),
            None,
        )
        .await;
        let names: Vec<&str> = roots
            .as_array()
            .unwrap()
            .iter()
            .map(|root| root["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Snacks", "Drinks", "Food"]);

        let (_, tree) = send(
            &router,
            Method::GET,
            &format!("/companies/{company_id}/categories/tree"),
            None,
        )
        .await;
        let tree_roots = tree["roots"].as_array().unwrap();
        assert_eq!(tree_roots.len(), 3);
        assert_eq!(tree_roots[1]["name"], "Drinks");
        assert_eq!(tree_roots[1]["children"][0]["name"], "Beer");
    }

    #[tokio::test]
    async fn list_accepts_query_filters() {
        let (router, company_id) = test_router().await;
        let (_, drinks) = create(&router, company_id, json!({"name": "Drinks"})).await;
        let drinks_id = drinks["data"]["id"].as_str().unwrap().to_string();
        create(&router, company_id, json!({"name": "Food"})).await;
        create(
            &router,
            company_id,
            json!({"name": "Beer", "parent_id": drinks_id}),
        )
        .await;

        let (status, body) = send(
            &router,
            Method::GET,
            &format!("/companies/{company_id}/categories?root_only=true&include_children=true"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let categories = body["categories"].as_array().unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0]["name"], "Drinks");
        assert_eq!(categories[0]["children"][0]["name"], "Beer");
        assert_eq!(categories[1]["children"].as_array().unwrap().len(), 0);

        let (_, body) = send(
            &router,
            Method::GET,
            &format!("/companies/{company_id}/categories?search=ee"),
            None,
        )
        .await;
        let categories = body["categories"].as_array().unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0]["name"], "Beer");
    }

    #[tokio::test]
    async fn path_runs_root_first() {
        let (router, company_id) = test_router().await;
        let (_, drinks) = create(&router, company_id, json!({"name": "Drinks"})).await;
        let drinks_id = drinks["data"]["id"].as_str().unwrap().to_string();
        let (_, beer) = create(
            &router,
            company_id,
            json!({"name": "Beer", "parent_id": drinks_id}),
        )
        .await;
        let beer_id = beer["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &router,
            Method::GET,
            &format!("/companies/{company_id}/categories/{beer_id}/path"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["path"]
            .as_array()
            .unwrap()
            .iter()
            .map(|category| category["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Drinks", "Beer"]);
    }
}
