use std::collections::{HashSet, VecDeque};

use sea_orm::{ConnectionTrait, TransactionTrait};
use uuid::Uuid;

use crate::{
    Category, CategoryPatch, EngineError, NewCategory, ResultEngine,
    store::{CategoryStore, ProductStore},
    util::ensure_required_name,
};

use super::super::{Engine, with_tx};

impl Engine {
    /// Create a category.
    ///
    /// Checks run in order and stop at the first failure: blank name, name
    /// already used by a sibling, unknown parent. Without an explicit
    /// `sort_order` the category is placed after its last sibling.
    pub async fn create_category(
        &self,
        company_id: Uuid,
        input: NewCategory,
    ) -> ResultEngine<Category> {
        ensure_required_name(&input.name, "category")?;

        let lock = self.tree_locks.for_company(company_id);
        let _guard = lock.lock().await;
        with_tx!(self, |db_tx| {
            self.require_company(&db_tx, company_id).await?;
            let store = CategoryStore::new(&db_tx, company_id);

            ensure_unique_name(&store, input.parent_id, &input.name, None).await?;
            if let Some(parent_id) = input.parent_id
                && store.find_one(parent_id).await?.is_none()
            {
                return Err(EngineError::ParentNotFound(parent_id.to_string()));
            }

            let sort_order = match input.sort_order {
                Some(sort_order) => sort_order,
                None => match store.max_sibling_sort_order(input.parent_id).await? {
                    None => 1,
                    Some(max) => max.checked_add(1).ok_or_else(|| {
                        EngineError::InvalidSortOrder(format!(
                            "no position left after sort order {max}, reorder the siblings first"
                        ))
                    })?,
                },
            };

            let category = store.insert(&input, sort_order).await?;
            tracing::info!(
                %company_id,
                category_id = %category.id,
                parent_id = ?category.parent_id,
                sort_order,
                "category created"
            );
            Ok(category)
        })
    }

    /// Apply a partial update.
    ///
    /// Moving under a new parent is rejected when the parent is the category
    /// itself, one of its descendants, or does not exist. When the name or the
    /// parent changes, the name must be free in the target sibling group.
    pub async fn update_category(
        &self,
        company_id: Uuid,
        id: Uuid,
        patch: CategoryPatch,
    ) -> ResultEngine<Category> {
        if let Some(name) = patch.name.as_deref() {
            ensure_required_name(name, "category")?;
        }

        let lock = self.tree_locks.for_company(company_id);
        let _guard = lock.lock().await;
        with_tx!(self, |db_tx| {
            let store = CategoryStore::new(&db_tx, company_id);
            let current = store
                .find_one(id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("category {id}")))?;
            if patch.is_empty() {
                return Ok(current);
            }

            let target_parent = patch.parent_id.unwrap_or(current.parent_id);
            let target_name = patch.name.as_deref().unwrap_or(&current.name);
            let parent_changed = target_parent != current.parent_id;
            let name_changed = target_name != current.name;

            if parent_changed && let Some(new_parent) = target_parent {
                if new_parent == id {
                    return Err(EngineError::SelfParent(current.name.clone()));
                }
                if descendant_ids(&store, id).await?.contains(&new_parent) {
                    tracing::warn!(%company_id, category_id = %id, %new_parent, "rejected cyclic move");
                    return Err(EngineError::CyclicParent(current.name.clone()));
                }
                if store.find_one(new_parent).await?.is_none() {
                    return Err(EngineError::ParentNotFound(new_parent.to_string()));
                }
            }
            if parent_changed || name_changed {
                ensure_unique_name(&store, target_parent, target_name, Some(id)).await?;
            }

            let category = store.update(id, &patch).await?;
            tracing::info!(%company_id, category_id = %id, "category updated");
            Ok(category)
        })
    }

    /// Soft-delete a category.
    ///
    /// Refused while the category still has subcategories or products. An
    /// already deleted category is reported as not found.
    pub async fn delete_category(&self, company_id: Uuid, id: Uuid) -> ResultEngine<()> {
        let lock = self.tree_locks.for_company(company_id);
        let _guard = lock.lock().await;
        with_tx!(self, |db_tx| {
            let store = CategoryStore::new(&db_tx, company_id);
            let category = store
                .find_one(id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("category {id}")))?;

            if store.count_children(id).await? > 0 {
                tracing::warn!(%company_id, category_id = %id, "delete refused: subcategories");
                return Err(EngineError::HasSubcategories(category.name));
            }
            let products = ProductStore::new(&db_tx, company_id)
                .count_by_category(id, false)
                .await?;
            if products > 0 {
                tracing::warn!(%company_id, category_id = %id, products, "delete refused: products");
                return Err(EngineError::HasProducts(category.name));
            }

            store.soft_delete(id).await?;
            tracing::info!(%company_id, category_id = %id, "category deleted");
            Ok(())
        })
    }

    /// Set `sort_order` to the position of each id in `ordered_ids`.
    ///
    /// All ids are expected to be siblings; this is not verified. The batch is
    /// applied in one transaction: an unknown id leaves every category as it
    /// was.
    pub async fn reorder_categories(
        &self,
        company_id: Uuid,
        ordered_ids: &[Uuid],
    ) -> ResultEngine<()> {
        let lock = self.tree_locks.for_company(company_id);
        let _guard = lock.lock().await;
        with_tx!(self, |db_tx| {
            let store = CategoryStore::new(&db_tx, company_id);
            for (index, id) in ordered_ids.iter().enumerate() {
                if store.find_one(*id).await?.is_none() {
                    return Err(EngineError::KeyNotFound(format!("category {id}")));
                }
                let patch = CategoryPatch {
                    sort_order: Some(i32::try_from(index).unwrap_or(i32::MAX)),
                    ..Default::default()
                };
                store.update(*id, &patch).await?;
            }
            tracing::info!(%company_id, count = ordered_ids.len(), "categories reordered");
            Ok(())
        })
    }
}

async fn ensure_unique_name<C: ConnectionTrait>(
    store: &CategoryStore<'_, C>,
    parent_id: Option<Uuid>,
    name: &str,
    excluding: Option<Uuid>,
) -> ResultEngine<()> {
    if store
        .find_sibling_named(parent_id, name, excluding)
        .await?
        .is_some()
    {
        return Err(EngineError::DuplicateName(name.to_string()));
    }
    Ok(())
}

/// Every category below `root`, breadth first.
///
/// Each id is visited once even if the stored links loop.
async fn descendant_ids<C: ConnectionTrait>(
    store: &CategoryStore<'_, C>,
    root: Uuid,
) -> ResultEngine<Vec<Uuid>> {
    let mut found = Vec::new();
    let mut seen = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);

    while let Some(current) = queue.pop_front() {
        for child in store.children(current).await? {
            if seen.insert(child.id) {
                found.push(child.id);
                queue.push_back(child.id);
            }
        }
    }

    Ok(found)
}
