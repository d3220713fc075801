//! Category registry per company.
//!
//! Categories form a forest: `parent_id` points at another category of the
//! same company, `None` marks a root. Relations are kept as plain ids; the
//! tree is rebuilt on demand (see [`crate::tree`]).

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{
    EngineError, Product, ResultEngine,
    util::{parse_optional_uuid, parse_uuid},
};

/// A product category.
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub company_id: Uuid,
    /// `None` for root-level categories.
    pub parent_id: Option<Uuid>,
    /// Unique among the non-deleted siblings sharing `parent_id`.
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    /// Position inside the sibling group; only compared between siblings.
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Input of [`Engine::create_category`](crate::Engine::create_category).
#[derive(Clone, Debug, Default)]
pub struct NewCategory {
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    /// When omitted the category is appended after its siblings.
    pub sort_order: Option<i32>,
    pub image_path: Option<String>,
}

impl NewCategory {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn under(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Partial update of a category.
///
/// `None` leaves a field untouched. Nullable fields use a nested option:
/// `Some(None)` clears the value, so `parent_id: Some(None)` moves the
/// category to the root level.
#[derive(Clone, Debug, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub code: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub image_path: Option<Option<String>>,
    pub parent_id: Option<Option<Uuid>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl CategoryPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.code.is_none()
            && self.description.is_none()
            && self.image_path.is_none()
            && self.parent_id.is_none()
            && self.sort_order.is_none()
            && self.is_active.is_none()
    }
}

/// Which sibling group a listing is restricted to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParentScope {
    #[default]
    Any,
    Root,
    Of(Uuid),
}

/// Filters for [`Engine::list_categories`](crate::Engine::list_categories).
#[derive(Clone, Debug, Default)]
pub struct CategoryFilter {
    /// Substring matched against name or description.
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub parent: ParentScope,
    /// Attach the direct children (one level) of every result.
    pub include_children: bool,
}

/// A listed category, optionally with its direct children.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryListing {
    pub category: Category,
    pub children: Option<Vec<Category>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryFamily {
    pub category: Category,
    pub parent: Option<Category>,
    pub children: Vec<Category>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CategoryWithProducts {
    pub category: Category,
    pub products: Vec<Product>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub company_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::companies::Entity",
        from = "Column::CompanyId",
        to = "super::companies::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Company,
    #[sea_orm(has_many = "super::products::Entity")]
    Products,
}

impl Related<super::companies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "category")?,
            company_id: parse_uuid(&model.company_id, "company")?,
            parent_id: parse_optional_uuid(model.parent_id.as_deref(), "parent category")?,
            name: model.name,
            code: model.code,
            description: model.description,
            image_path: model.image_path,
            sort_order: model.sort_order,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
            deleted_at: model.deleted_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_is_detected() {
        assert!(CategoryPatch::default().is_empty());
        let patch = CategoryPatch {
            parent_id: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn model_with_bad_parent_id_is_rejected() {
        let now = Utc::now();
        let model = Model {
            id: Uuid::new_v4().to_string(),
            company_id: Uuid::new_v4().to_string(),
            parent_id: Some("not-a-uuid".to_string()),
            name: "Drinks".to_string(),
            code: None,
            description: None,
            image_path: None,
            sort_order: 1,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        assert_eq!(
            Category::try_from(model),
            Err(EngineError::InvalidId(
                "invalid parent category id".to_string()
            ))
        );
    }
}
