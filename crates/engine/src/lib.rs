//! Category tree of the back office.
//!
//! The [`Engine`] owns the rules of the product category hierarchy of every
//! company: unique names per level, cycle-free reparenting, sibling ordering
//! and guarded soft deletion. Persistence goes through sea-orm; the
//! soft-delete filter lives in the store layer only.

pub use categories::{
    Category, CategoryFamily, CategoryFilter, CategoryListing, CategoryPatch,
    CategoryWithProducts, NewCategory, ParentScope,
};
pub use companies::Company;
pub use error::EngineError;
pub use ops::{Engine, EngineBuilder};
pub use products::Product;
pub use tree::{CategoryNode, build_forest};

mod categories;
mod companies;
mod error;
mod ops;
mod products;
mod store;
mod tree;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
