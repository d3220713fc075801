use serde::{Deserialize, Serialize};

/// Envelope of every write endpoint and of every error.
///
/// Rule violations (duplicate name, cycle, ...) come back with
/// `success = false` and a human readable `error`, ready to be rendered next
/// to the offending field.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ActionResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ActionResponse<()> {
    /// Success without a payload (delete, reorder).
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

pub mod company {
    use super::*;
    use uuid::Uuid;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CompanyNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CompanyCreated {
        pub id: Uuid,
    }
}

pub mod category {
    use super::*;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub parent_id: Option<Uuid>,
        pub name: String,
        pub code: Option<String>,
        pub description: Option<String>,
        pub image_path: Option<String>,
        pub sort_order: i32,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Query string of the listing endpoint.
    ///
    /// `root_only=true` restricts to root categories and wins over
    /// `parent_id`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryList {
        pub search: Option<String>,
        pub is_active: Option<bool>,
        pub parent_id: Option<Uuid>,
        pub root_only: Option<bool>,
        pub include_children: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListItem {
        #[serde(flatten)]
        pub category: CategoryView,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub children: Option<Vec<CategoryView>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryListItem>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub code: Option<String>,
        pub description: Option<String>,
        pub parent_id: Option<Uuid>,
        pub sort_order: Option<i32>,
        pub image_path: Option<String>,
    }

    /// Partial update.
    ///
    /// Absent keys are left untouched; for nullable fields an explicit `null`
    /// clears the value (`"parent_id": null` moves the category to the root).
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        #[serde(default, with = "::serde_with::rust::double_option")]
        pub code: Option<Option<String>>,
        #[serde(default, with = "::serde_with::rust::double_option")]
        pub description: Option<Option<String>>,
        #[serde(default, with = "::serde_with::rust::double_option")]
        pub image_path: Option<Option<String>>,
        #[serde(default, with = "::serde_with::rust::double_option")]
        pub parent_id: Option<Option<Uuid>>,
        pub sort_order: Option<i32>,
        pub is_active: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryReorder {
        pub ids: Vec<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryTreeNode {
        #[serde(flatten)]
        pub category: CategoryView,
        pub children: Vec<CategoryTreeNode>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryTreeResponse {
        pub roots: Vec<CategoryTreeNode>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryFamilyResponse {
        pub category: CategoryView,
        pub parent: Option<CategoryView>,
        pub children: Vec<CategoryView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductView {
        pub id: Uuid,
        pub name: String,
        pub sku: Option<String>,
        pub price_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryProductsResponse {
        pub category: CategoryView,
        pub products: Vec<ProductView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryPathResponse {
        /// Root first, the requested category last.
        pub path: Vec<CategoryView>,
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn update_tells_absent_from_null() {
            let absent: CategoryUpdate = serde_json::from_str(r#"{"name":"Beer"}"#).unwrap();
            assert_eq!(absent.name.as_deref(), Some("Beer"));
            assert_eq!(absent.parent_id, None);
            assert_eq!(absent.description, None);

            let cleared: CategoryUpdate =
                serde_json::from_str(r#"{"parent_id":null,"description":null}"#).unwrap();
            assert_eq!(cleared.parent_id, Some(None));
            assert_eq!(cleared.description, Some(None));

            let id = Uuid::new_v4();
            let moved: CategoryUpdate =
                serde_json::from_str(&format!(r#"{{"parent_id":"{id}"}}"#)).unwrap();
            assert_eq!(moved.parent_id, Some(Some(id)));
        }
    }
}
