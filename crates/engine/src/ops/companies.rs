use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Company, EngineError, ResultEngine, companies, util::ensure_required_name};

use super::{Engine, with_tx};

impl Engine {
    /// Register a new tenant.
    pub async fn create_company(&self, name: &str) -> ResultEngine<Uuid> {
        ensure_required_name(name, "company")?;
        let company = Company::new(name.trim().to_string());
        let model: companies::ActiveModel = (&company).into();
        with_tx!(self, |db_tx| {
            model.insert(&db_tx).await?;
            tracing::info!(company_id = %company.id, "company created");
            Ok(company.id)
        })
    }

    /// Return a company, or `None` when it does not exist.
    pub async fn company(&self, company_id: Uuid) -> ResultEngine<Option<Company>> {
        companies::Entity::find_by_id(company_id.to_string())
            .one(&self.database)
            .await?
            .map(Company::try_from)
            .transpose()
    }

    pub(super) async fn require_company(
        &self,
        db_tx: &DatabaseTransaction,
        company_id: Uuid,
    ) -> ResultEngine<()> {
        companies::Entity::find_by_id(company_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("company {company_id}")))?;
        Ok(())
    }
}
