//! The module contains the errors the engine can return.
//!
//! Errors come in two tiers:
//!
//! - business errors ([`DuplicateName`], [`CyclicParent`], [`HasProducts`], ...)
//!   are expected outcomes of a request and are meant to be shown to the
//!   caller as they are;
//! - [`Database`] wraps storage failures, which the engine never masks.
//!
//!  [`DuplicateName`]: EngineError::DuplicateName
//!  [`CyclicParent`]: EngineError::CyclicParent
//!  [`HasProducts`]: EngineError::HasProducts
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("a category named \"{0}\" already exists at this level")]
    DuplicateName(String),
    #[error("parent category \"{0}\" not found")]
    ParentNotFound(String),
    #[error("category \"{0}\" cannot be its own parent")]
    SelfParent(String),
    #[error("cannot move \"{0}\" under one of its own subcategories")]
    CyclicParent(String),
    #[error("\"{0}\" has subcategories, delete them first")]
    HasSubcategories(String),
    #[error("\"{0}\" has associated products")]
    HasProducts(String),
    #[error("Invalid sort order: {0}")]
    InvalidSortOrder(String),
    #[error("Corrupt category tree: {0}")]
    CorruptTree(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// `true` for rule violations a caller can render directly, `false` for
    /// storage failures.
    pub fn is_business(&self) -> bool {
        !matches!(self, Self::Database(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::DuplicateName(a), Self::DuplicateName(b)) => a == b,
            (Self::ParentNotFound(a), Self::ParentNotFound(b)) => a == b,
            (Self::SelfParent(a), Self::SelfParent(b)) => a == b,
            (Self::CyclicParent(a), Self::CyclicParent(b)) => a == b,
            (Self::HasSubcategories(a), Self::HasSubcategories(b)) => a == b,
            (Self::HasProducts(a), Self::HasProducts(b)) => a == b,
            (Self::InvalidSortOrder(a), Self::InvalidSortOrder(b)) => a == b,
            (Self::CorruptTree(a), Self::CorruptTree(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_are_not_business_errors() {
        let err = EngineError::Database(DbErr::Custom("disk full".to_string()));
        assert!(!err.is_business());
        assert!(EngineError::HasProducts("Drinks".to_string()).is_business());
    }

    #[test]
    fn messages_name_the_category() {
        let err = EngineError::HasSubcategories("Drinks".to_string());
        assert_eq!(
            err.to_string(),
            "\"Drinks\" has subcategories, delete them first"
        );
    }
}
