//! Persistence boundary for categories and products.
//!
//! Both stores are bound to one company and to a connection, which may be a
//! plain connection or an open transaction. Every query starts from
//! [`CategoryStore::live`] / [`ProductStore::live`], the only place where the
//! tenant and soft-delete predicates are written.

use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, DbErr, PaginatorTrait, QueryFilter, QueryOrder,
    Select, SqlErr, prelude::*, sea_query::LikeExpr,
};
use uuid::Uuid;

use crate::{
    Category, CategoryFilter, CategoryPatch, EngineError, NewCategory, ParentScope, Product,
    ResultEngine, categories, products, util::normalize_optional_text,
};

pub(crate) struct CategoryStore<'a, C> {
    conn: &'a C,
    company_id: String,
}

impl<'a, C: ConnectionTrait> CategoryStore<'a, C> {
    pub(crate) fn new(conn: &'a C, company_id: Uuid) -> Self {
        Self {
            conn,
            company_id: company_id.to_string(),
        }
    }

    /// Non-deleted categories of this company.
    fn live(&self) -> Select<categories::Entity> {
        categories::Entity::find()
            .filter(categories::Column::CompanyId.eq(self.company_id.as_str()))
            .filter(categories::Column::DeletedAt.is_null())
    }

    fn sibling_order(select: Select<categories::Entity>) -> Select<categories::Entity> {
        select
            .order_by_asc(categories::Column::SortOrder)
            .order_by_asc(categories::Column::Name)
    }

    pub(crate) async fn find_many(&self, filter: &CategoryFilter) -> ResultEngine<Vec<Category>> {
        let mut query = self.live();
        if let Some(search) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            query = query.filter(
                Condition::any()
                    .add(categories::Column::Name.like(substring_pattern(search)))
                    .add(categories::Column::Description.like(substring_pattern(search))),
            );
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(categories::Column::IsActive.eq(is_active));
        }
        query = match filter.parent {
            ParentScope::Any => query,
            ParentScope::Root => query.filter(categories::Column::ParentId.is_null()),
            ParentScope::Of(parent_id) => {
                query.filter(categories::Column::ParentId.eq(parent_id.to_string()))
            }
        };

        collect(Self::sibling_order(query).all(self.conn).await?)
    }

    pub(crate) async fn find_one(&self, id: Uuid) -> ResultEngine<Option<Category>> {
        self.live()
            .filter(categories::Column::Id.eq(id.to_string()))
            .one(self.conn)
            .await?
            .map(Category::try_from)
            .transpose()
    }

    /// Direct children of `id`, in sibling order.
    pub(crate) async fn children(&self, id: Uuid) -> ResultEngine<Vec<Category>> {
        let query = self
            .live()
            .filter(categories::Column::ParentId.eq(id.to_string()));
        collect(Self::sibling_order(query).all(self.conn).await?)
    }

    /// Direct children of any of `ids`, in sibling order.
    pub(crate) async fn children_of(&self, ids: &[Uuid]) -> ResultEngine<Vec<Category>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = self.live().filter(
            categories::Column::ParentId.is_in(ids.iter().map(ToString::to_string)),
        );
        collect(Self::sibling_order(query).all(self.conn).await?)
    }

    /// The sibling (same parent) carrying exactly `name`, if any.
    pub(crate) async fn find_sibling_named(
        &self,
        parent_id: Option<Uuid>,
        name: &str,
        excluding: Option<Uuid>,
    ) -> ResultEngine<Option<Category>> {
        let mut query = self
            .live()
            .filter(parent_condition(parent_id))
            .filter(categories::Column::Name.eq(name));
        if let Some(id) = excluding {
            query = query.filter(categories::Column::Id.ne(id.to_string()));
        }
        query
            .one(self.conn)
            .await?
            .map(Category::try_from)
            .transpose()
    }

    pub(crate) async fn count_where(&self, condition: Condition) -> ResultEngine<u64> {
        Ok(self.live().filter(condition).count(self.conn).await?)
    }

    pub(crate) async fn count_children(&self, id: Uuid) -> ResultEngine<u64> {
        self.count_where(Condition::all().add(parent_condition(Some(id))))
            .await
    }

    pub(crate) async fn max_sibling_sort_order(
        &self,
        parent_id: Option<Uuid>,
    ) -> ResultEngine<Option<i32>> {
        let last = self
            .live()
            .filter(parent_condition(parent_id))
            .order_by_desc(categories::Column::SortOrder)
            .one(self.conn)
            .await?;
        Ok(last.map(|model| model.sort_order))
    }

    pub(crate) async fn insert(&self, new: &NewCategory, sort_order: i32) -> ResultEngine<Category> {
        let now = Utc::now();
        let active = categories::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            company_id: ActiveValue::Set(self.company_id.clone()),
            parent_id: ActiveValue::Set(new.parent_id.map(|id| id.to_string())),
            name: ActiveValue::Set(new.name.clone()),
            code: ActiveValue::Set(normalize_optional_text(new.code.as_deref())),
            description: ActiveValue::Set(normalize_optional_text(new.description.as_deref())),
            image_path: ActiveValue::Set(normalize_optional_text(new.image_path.as_deref())),
            sort_order: ActiveValue::Set(sort_order),
            is_active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            deleted_at: ActiveValue::Set(None),
        };
        let model = active
            .insert(self.conn)
            .await
            .map_err(|err| unique_violation_as_duplicate(err, &new.name))?;
        Category::try_from(model)
    }

    /// Write the fields present in `patch`. The row must exist.
    pub(crate) async fn update(&self, id: Uuid, patch: &CategoryPatch) -> ResultEngine<Category> {
        let mut active = categories::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        if let Some(name) = &patch.name {
            active.name = ActiveValue::Set(name.clone());
        }
        if let Some(code) = &patch.code {
            active.code = ActiveValue::Set(normalize_optional_text(code.as_deref()));
        }
        if let Some(description) = &patch.description {
            active.description = ActiveValue::Set(normalize_optional_text(description.as_deref()));
        }
        if let Some(image_path) = &patch.image_path {
            active.image_path = ActiveValue::Set(normalize_optional_text(image_path.as_deref()));
        }
        if let Some(parent_id) = patch.parent_id {
            active.parent_id = ActiveValue::Set(parent_id.map(|id| id.to_string()));
        }
        if let Some(sort_order) = patch.sort_order {
            active.sort_order = ActiveValue::Set(sort_order);
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = ActiveValue::Set(is_active);
        }

        let model = active.update(self.conn).await.map_err(|err| {
            unique_violation_as_duplicate(err, patch.name.as_deref().unwrap_or_default())
        })?;
        Category::try_from(model)
    }

    pub(crate) async fn soft_delete(&self, id: Uuid) -> ResultEngine<()> {
        let now = Utc::now();
        let active = categories::ActiveModel {
            id: ActiveValue::Set(id.to_string()),
            deleted_at: ActiveValue::Set(Some(now)),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        active.update(self.conn).await?;
        Ok(())
    }
}

pub(crate) struct ProductStore<'a, C> {
    conn: &'a C,
    company_id: String,
}

impl<'a, C: ConnectionTrait> ProductStore<'a, C> {
    pub(crate) fn new(conn: &'a C, company_id: Uuid) -> Self {
        Self {
            conn,
            company_id: company_id.to_string(),
        }
    }

    fn live(&self) -> Select<products::Entity> {
        products::Entity::find()
            .filter(products::Column::CompanyId.eq(self.company_id.as_str()))
            .filter(products::Column::DeletedAt.is_null())
    }

    fn in_category(&self, category_id: Uuid, active_only: bool) -> Select<products::Entity> {
        let query = self
            .live()
            .filter(products::Column::CategoryId.eq(category_id.to_string()));
        if active_only {
            query.filter(products::Column::IsActive.eq(true))
        } else {
            query
        }
    }

    pub(crate) async fn count_by_category(
        &self,
        category_id: Uuid,
        active_only: bool,
    ) -> ResultEngine<u64> {
        Ok(self
            .in_category(category_id, active_only)
            .count(self.conn)
            .await?)
    }

    pub(crate) async fn find_by_category(
        &self,
        category_id: Uuid,
        active_only: bool,
    ) -> ResultEngine<Vec<Product>> {
        self.in_category(category_id, active_only)
            .order_by_asc(products::Column::Name)
            .all(self.conn)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }
}

fn parent_condition(parent_id: Option<Uuid>) -> Condition {
    match parent_id {
        Some(id) => Condition::all().add(categories::Column::ParentId.eq(id.to_string())),
        None => Condition::all().add(categories::Column::ParentId.is_null()),
    }
}

/// `LIKE` pattern matching `search` literally anywhere in the value.
fn substring_pattern(search: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

fn collect(models: Vec<categories::Model>) -> ResultEngine<Vec<Category>> {
    models.into_iter().map(Category::try_from).collect()
}

/// The schema keeps a unique index on live sibling names; a race lost
/// against it surfaces as a unique violation.
fn unique_violation_as_duplicate(err: DbErr, name: &str) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::DuplicateName(name.to_string()),
        _ => EngineError::Database(err),
    }
}
