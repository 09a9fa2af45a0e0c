//! Document store abstraction for the recipe collection.
//!
//! The request pipeline only talks to [`RecipeStore`]; the memory store lives
//! here, the PostgreSQL collection lives in the server crate.

mod memory;

pub use memory::MemoryStore;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Recipe;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: a recipe with id {0} already exists")]
    DuplicateKey(Uuid),

    #[error("recipe has no id")]
    MissingId,

    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store query failed: {0}")]
    Query(String),

    #[error("stored document is invalid: {0}")]
    Document(#[from] serde_json::Error),
}

/// Selects documents in the recipe collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    Id(Uuid),
    /// Case-insensitive substring match on the recipe name
    NameContains(String),
    Author(String),
    IngredientId(String),
}

impl Filter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => recipe.id.as_ref() == Some(id),
            Filter::NameContains(fragment) => recipe
                .name
                .to_lowercase()
                .contains(&fragment.to_lowercase()),
            Filter::Author(author) => &recipe.author == author,
            Filter::IngredientId(id) => recipe.uses_ingredient(id),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => write!(f, "all"),
            Filter::Id(id) => write!(f, "id={id}"),
            Filter::NameContains(fragment) => write!(f, "name~{fragment}"),
            Filter::Author(author) => write!(f, "author={author}"),
            Filter::IngredientId(id) => write!(f, "ingredient={id}"),
        }
    }
}

/// Trait for recipe collections.
///
/// Implementations must be safe to share between concurrent requests. Timeouts
/// are the implementation's concern; callers never retry.
#[async_trait]
pub trait RecipeStore: Send + Sync + fmt::Debug {
    /// First document matching the filter, if any.
    async fn find_one(&self, filter: &Filter) -> Result<Option<Arc<Recipe>>, StoreError>;

    async fn find_many(&self, filter: &Filter) -> Result<Vec<Recipe>, StoreError>;

    /// Insert a document that already carries its id.
    async fn insert_one(&self, recipe: Recipe) -> Result<(), StoreError>;

    /// Replace the first matching document. Returns the number of documents matched.
    async fn update_one(&self, filter: &Filter, recipe: Recipe) -> Result<u64, StoreError>;

    /// Delete the first matching document. Returns the number of documents deleted.
    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Backend name for logs ("memory", "postgres").
    fn backend_name(&self) -> &'static str;
}
