use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::{
    Category, CategoryFamily, CategoryFilter, CategoryListing, CategoryWithProducts, EngineError,
    ParentScope, ResultEngine,
    store::{CategoryStore, ProductStore},
    tree::{CategoryNode, build_forest},
};

use super::Engine;

mod write;

impl Engine {
    /// List the categories matching `filter`, ordered by `sort_order` then
    /// `name`.
    pub async fn list_categories(
        &self,
        company_id: Uuid,
        filter: &CategoryFilter,
    ) -> ResultEngine<Vec<CategoryListing>> {
        let store = CategoryStore::new(&self.database, company_id);
        let categories = store.find_many(filter).await?;
        tracing::debug!(%company_id, count = categories.len(), "listed categories");

        if !filter.include_children {
            return Ok(categories
                .into_iter()
                .map(|category| CategoryListing {
                    category,
                    children: None,
                })
                .collect());
        }

        let ids: Vec<Uuid> = categories.iter().map(|category| category.id).collect();
        let mut by_parent: HashMap<Uuid, Vec<Category>> = HashMap::new();
        for child in store.children_of(&ids).await? {
            if let Some(parent_id) = child.parent_id {
                by_parent.entry(parent_id).or_default().push(child);
            }
        }

        Ok(categories
            .into_iter()
            .map(|category| {
                let children = by_parent.remove(&category.id).unwrap_or_default();
                CategoryListing {
                    category,
                    children: Some(children),
                }
            })
            .collect())
    }

    /// Active root-level categories.
    pub async fn root_categories(&self, company_id: Uuid) -> ResultEngine<Vec<Category>> {
        let filter = CategoryFilter {
            parent: ParentScope::Root,
            is_active: Some(true),
            ..Default::default()
        };
        Ok(self
            .list_categories(company_id, &filter)
            .await?
            .into_iter()
            .map(|listing| listing.category)
            .collect())
    }

    /// The forest of active categories.
    ///
    /// An active category below an inactive parent is shown as a root.
    pub async fn category_tree(&self, company_id: Uuid) -> ResultEngine<Vec<CategoryNode>> {
        let filter = CategoryFilter {
            is_active: Some(true),
            ..Default::default()
        };
        let categories = CategoryStore::new(&self.database, company_id)
            .find_many(&filter)
            .await?;
        Ok(build_forest(categories))
    }

    pub async fn category(&self, company_id: Uuid, id: Uuid) -> ResultEngine<Option<Category>> {
        CategoryStore::new(&self.database, company_id)
            .find_one(id)
            .await
    }

    /// A category with its parent and its direct children.
    pub async fn category_family(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> ResultEngine<Option<CategoryFamily>> {
        let store = CategoryStore::new(&self.database, company_id);
        let Some(category) = store.find_one(id).await? else {
            return Ok(None);
        };
        let parent = match category.parent_id {
            Some(parent_id) => store.find_one(parent_id).await?,
            None => None,
        };
        let children = store.children(id).await?;
        Ok(Some(CategoryFamily {
            category,
            parent,
            children,
        }))
    }

    /// A category with its active products, ordered by product name.
    pub async fn category_with_products(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> ResultEngine<Option<CategoryWithProducts>> {
        let Some(category) = CategoryStore::new(&self.database, company_id)
            .find_one(id)
            .await?
        else {
            return Ok(None);
        };
        let products = ProductStore::new(&self.database, company_id)
            .find_by_category(id, true)
            .await?;
        Ok(Some(CategoryWithProducts { category, products }))
    }

    /// Ancestors of `id` followed by the category itself, root first.
    ///
    /// The walk stops at a root or at a missing parent. An unknown `id` yields
    /// an empty path.
    pub async fn category_path(&self, company_id: Uuid, id: Uuid) -> ResultEngine<Vec<Category>> {
        let store = CategoryStore::new(&self.database, company_id);
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = Some(id);

        while let Some(current) = cursor {
            if !seen.insert(current) {
                tracing::error!(%company_id, category_id = %id, "parent chain does not terminate");
                return Err(EngineError::CorruptTree(format!(
                    "parent chain of category {id} loops at {current}"
                )));
            }
            let Some(category) = store.find_one(current).await? else {
                break;
            };
            cursor = category.parent_id;
            path.push(category);
        }

        path.reverse();
        Ok(path)
    }
}
