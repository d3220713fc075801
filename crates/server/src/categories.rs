//! Categories API endpoints.
//!
//! Every route is scoped to the company in the path; categories of other
//! companies answer 404 like missing ones.

use api_types::{
    ActionResponse,
    category::{
        CategoryFamilyResponse, CategoryList, CategoryListItem, CategoryListResponse, CategoryNew,
        CategoryPathResponse, CategoryProductsResponse, CategoryReorder, CategoryTreeNode,
        CategoryTreeResponse, CategoryUpdate, CategoryView, ProductView,
    },
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use engine::{CategoryFilter, CategoryNode, CategoryPatch, NewCategory, ParentScope};
use uuid::Uuid;

use crate::{
    ServerError,
    extract::{JsonBody, PathParams, QueryParams},
    server::ServerState,
};

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        parent_id: category.parent_id,
        name: category.name,
        code: category.code,
        description: category.description,
        image_path: category.image_path,
        sort_order: category.sort_order,
        is_active: category.is_active,
        created_at: category.created_at,
        updated_at: category.updated_at,
    }
}

fn map_node(node: CategoryNode) -> CategoryTreeNode {
    CategoryTreeNode {
        category: map_category(node.category),
        children: node.children.into_iter().map(map_node).collect(),
    }
}

fn map_product(product: engine::Product) -> ProductView {
    ProductView {
        id: product.id,
        name: product.name,
        sku: product.sku,
        price_minor: product.price_minor,
    }
}

fn filter_from_query(query: CategoryList) -> CategoryFilter {
    let parent = if query.root_only.unwrap_or(false) {
        ParentScope::Root
    } else {
        query.parent_id.map_or(ParentScope::Any, ParentScope::Of)
    };
    CategoryFilter {
        search: query.search.filter(|search| !search.is_empty()),
        is_active: query.is_active,
        parent,
        include_children: query.include_children.unwrap_or(false),
    }
}

fn not_found(id: Uuid) -> ServerError {
    ServerError::Engine(engine::EngineError::KeyNotFound(format!("category {id}")))
}

pub async fn list(
    State(state): State<ServerState>,
    PathParams(company_id): PathParams<Uuid>,
    QueryParams(query): QueryParams<CategoryList>,
) -> Result<Json<CategoryListResponse>, ServerError> {
    let filter = filter_from_query(query);
    let categories = state
        .engine
        .list_categories(company_id, &filter)
        .await?
        .into_iter()
        .map(|listing| CategoryListItem {
            category: map_category(listing.category),
            children: listing
                .children
                .map(|children| children.into_iter().map(map_category).collect()),
        })
        .collect();

    Ok(Json(CategoryListResponse { categories }))
}

pub async fn roots(
    State(state): State<ServerState>,
    PathParams(company_id): PathParams<Uuid>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let roots = state
        .engine
        .root_categories(company_id)
        .await?
        .into_iter()
        .map(map_category)
        .collect();
    Ok(Json(roots))
}

pub async fn tree(
    State(state): State<ServerState>,
    PathParams(company_id): PathParams<Uuid>,
) -> Result<Json<CategoryTreeResponse>, ServerError> {
    let roots = state
        .engine
        .category_tree(company_id)
        .await?
        .into_iter()
        .map(map_node)
        .collect();
    Ok(Json(CategoryTreeResponse { roots }))
}

pub async fn get(
    State(state): State<ServerState>,
    PathParams((company_id, id)): PathParams<(Uuid, Uuid)>,
) -> Result<Json<CategoryView>, ServerError> {
    let category = state
        .engine
        .category(company_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(map_category(category)))
}

pub async fn family(
    State(state): State<ServerState>,
    PathParams((company_id, id)): PathParams<(Uuid, Uuid)>,
) -> Result<Json<CategoryFamilyResponse>, ServerError> {
    let family = state
        .engine
        .category_family(company_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(CategoryFamilyResponse {
        category: map_category(family.category),
        parent: family.parent.map(map_category),
        children: family.children.into_iter().map(map_category).collect(),
    }))
}

pub async fn products(
    State(state): State<ServerState>,
    PathParams((company_id, id)): PathParams<(Uuid, Uuid)>,
) -> Result<Json<CategoryProductsResponse>, ServerError> {
    let found = state
        .engine
        .category_with_products(company_id, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(CategoryProductsResponse {
        category: map_category(found.category),
        products: found.products.into_iter().map(map_product).collect(),
    }))
}

pub async fn path(
    State(state): State<ServerState>,
    PathParams((company_id, id)): PathParams<(Uuid, Uuid)>,
) -> Result<Json<CategoryPathResponse>, ServerError> {
    let path = state.engine.category_path(company_id, id).await?;
    if path.is_empty() {
        return Err(not_found(id));
    }
    Ok(Json(CategoryPathResponse {
        path: path.into_iter().map(map_category).collect(),
    }))
}

pub async fn create(
    State(state): State<ServerState>,
    PathParams(company_id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<CategoryNew>,
) -> Result<(StatusCode, Json<ActionResponse<CategoryView>>), ServerError> {
    let input = NewCategory {
        name: payload.name,
        code: payload.code,
        description: payload.description,
        parent_id: payload.parent_id,
        sort_order: payload.sort_order,
        image_path: payload.image_path,
    };
    let category = state.engine.create_category(company_id, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok(map_category(category))),
    ))
}

pub async fn update(
    State(state): State<ServerState>,
    PathParams((company_id, id)): PathParams<(Uuid, Uuid)>,
    JsonBody(payload): JsonBody<CategoryUpdate>,
) -> Result<Json<ActionResponse<CategoryView>>, ServerError> {
    let patch = CategoryPatch {
        name: payload.name,
        code: payload.code,
        description: payload.description,
        image_path: payload.image_path,
        parent_id: payload.parent_id,
        sort_order: payload.sort_order,
        is_active: payload.is_active,
    };
    if patch.is_empty() {
        return Err(ServerError::Generic(
            "provide at least one field to update".to_string(),
        ));
    }

    let category = state.engine.update_category(company_id, id, patch).await?;
    Ok(Json(ActionResponse::ok(map_category(category))))
}

pub async fn delete(
    State(state): State<ServerState>,
    PathParams((company_id, id)): PathParams<(Uuid, Uuid)>,
) -> Result<Json<ActionResponse<()>>, ServerError> {
    state.engine.delete_category(company_id, id).await?;
    Ok(Json(ActionResponse::done()))
}

pub async fn reorder(
    State(state): State<ServerState>,
    PathParams(company_id): PathParams<Uuid>,
    JsonBody(payload): JsonBody<CategoryReorder>,
) -> Result<Json<ActionResponse<()>>, ServerError> {
    state
        .engine
        .reorder_categories(company_id, &payload.ids)
        .await?;
    Ok(Json(ActionResponse::done()))
}
