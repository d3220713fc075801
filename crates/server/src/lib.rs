use api_types::ActionResponse;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;

pub use server::{run, run_with_listener, spawn_with_listener};

mod categories;
mod companies;
mod extract;
mod server;

pub mod types {
    pub mod company {
        pub use api_types::company::{CompanyCreated, CompanyNew};
    }

    pub mod category {
        pub use api_types::category::{
            CategoryFamilyResponse, CategoryList, CategoryListItem, CategoryListResponse,
            CategoryNew, CategoryPathResponse, CategoryProductsResponse, CategoryReorder,
            CategoryTreeNode, CategoryTreeResponse, CategoryUpdate, CategoryView, ProductView,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    /// A request axum could not decode (bad uuid, malformed body, ...).
    Rejected(StatusCode, String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::DuplicateName(_) => StatusCode::CONFLICT,
        EngineError::InvalidName(_)
        | EngineError::ParentNotFound(_)
        | EngineError::SelfParent(_)
        | EngineError::CyclicParent(_)
        | EngineError::HasSubcategories(_)
        | EngineError::HasProducts(_)
        | EngineError::InvalidSortOrder(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::InvalidId(_) | EngineError::CorruptTree(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::InvalidId(_) | EngineError::CorruptTree(_) => {
            tracing::error!("inconsistent stored data: {err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Rejected(status, err) => (status, err),
        };

        (status, Json(ActionResponse::failed(error))).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Rejected(value.status(), value.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(value: PathRejection) -> Self {
        Self::Rejected(value.status(), value.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Rejected(value.status(), value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn duplicate_name_maps_to_409() {
        let res = ServerError::from(EngineError::DuplicateName("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn tree_rules_map_to_422() {
        for err in [
            EngineError::InvalidName("x".to_string()),
            EngineError::ParentNotFound("x".to_string()),
            EngineError::SelfParent("x".to_string()),
            EngineError::CyclicParent("x".to_string()),
            EngineError::HasSubcategories("x".to_string()),
            EngineError::HasProducts("x".to_string()),
            EngineError::InvalidSortOrder("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn storage_failures_map_to_500_and_hide_details() {
        let err = EngineError::Database(sea_orm::DbErr::Custom("disk on fire".to_string()));
        assert_eq!(status_for_engine_error(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message_for_engine_error(err), "internal server error");

        let err = EngineError::CorruptTree("loop".to_string());
        assert_eq!(status_for_engine_error(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn business_messages_reach_the_caller() {
        let err = EngineError::HasSubcategories("Drinks".to_string());
        assert_eq!(
            message_for_engine_error(err),
            "\"Drinks\" has subcategories, delete them first"
        );
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
