//! Registry of recipe operations.
//!
//! Each operation is a plain `async fn(OperationContext, payload)`. The
//! descriptor builders at the bottom pair each one with its canonical name
//! and payload type so route handlers cannot mix them up.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::models::{DeletedRecipe, Recipe};
use crate::pipeline::{
    Operation, OperationContext, OperationError, OperationResult, RawRequest, RequestDescriptor,
};
use crate::store::Filter;
use crate::validation::{Validate, ValidationErrors};

pub mod names {
    pub const FIND_ALL: &str = "find-all";
    pub const FIND_BY_ID: &str = "find-by-id";
    pub const FIND_BY_TITLE: &str = "find-by-title";
    pub const FIND_BY_INGREDIENT_ID: &str = "find-by-ingredient-id";
    pub const FIND_BY_AUTHOR_ID: &str = "find-by-author-id";
    pub const SAVE: &str = "save";
    pub const UPSERT_BY_ID: &str = "upsert-by-id";
    pub const DELETE_BY_ID: &str = "delete-by-id";

    pub const ALL: [&str; 8] = [
        FIND_ALL,
        FIND_BY_ID,
        FIND_BY_TITLE,
        FIND_BY_INGREDIENT_ID,
        FIND_BY_AUTHOR_ID,
        SAVE,
        UPSERT_BY_ID,
        DELETE_BY_ID,
    ];
}

/// Path parameter naming one recipe.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct RecipeIdParam {
    /// Recipe ID
    pub id: Uuid,
}

impl Validate for RecipeIdParam {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.id.is_nil() {
            errors.add("id", "must not be the nil UUID");
        }
        errors.into_result()
    }
}

/// Path parameter naming an external entity (author, catalog ingredient).
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ExternalIdParam {
    pub id: String,
}

impl Validate for ExternalIdParam {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.id.trim().is_empty() {
            errors.add("id", "is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct TitleParam {
    /// Part of the recipe name, matched case-insensitively
    pub title: String,
}

impl Validate for TitleParam {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.title.trim().is_empty() {
            errors.add("title", "is required");
        }
        errors.into_result()
    }
}

pub async fn find_all(ctx: OperationContext, _: ()) -> OperationResult<Vec<Recipe>> {
    let recipes = ctx.store().find_many(&Filter::All).await?;
    Ok(Arc::new(recipes))
}

pub async fn find_by_id(ctx: OperationContext, param: RecipeIdParam) -> OperationResult<Recipe> {
    let filter = Filter::Id(param.id);
    ctx.store()
        .find_one(&filter)
        .await?
        .ok_or_else(|| OperationError::NotFound(filter.to_string()))
}

pub async fn find_by_title(ctx: OperationContext, param: TitleParam) -> OperationResult<Recipe> {
    let filter = Filter::NameContains(param.title);
    ctx.store()
        .find_one(&filter)
        .await?
        .ok_or_else(|| OperationError::NotFound(filter.to_string()))
}

/// Possibly empty: an unused ingredient is not an error.
pub async fn find_by_ingredient_id(
    ctx: OperationContext,
    param: ExternalIdParam,
) -> OperationResult<Vec<Recipe>> {
    let recipes = ctx
        .store()
        .find_many(&Filter::IngredientId(param.id))
        .await?;
    Ok(Arc::new(recipes))
}

pub async fn find_by_author_id(
    ctx: OperationContext,
    param: ExternalIdParam,
) -> OperationResult<Vec<Recipe>> {
    let recipes = ctx.store().find_many(&Filter::Author(param.id)).await?;
    Ok(Arc::new(recipes))
}

/// Insert a recipe, giving it a fresh id unless the caller chose one.
///
/// A caller-chosen id that already exists fails with the store's
/// `DuplicateKey`.
pub async fn save(ctx: OperationContext, mut recipe: Recipe) -> OperationResult<Recipe> {
    let id = *recipe.id.get_or_insert_with(Uuid::new_v4);
    ctx.store().insert_one(recipe.clone()).await?;
    debug!(request = ctx.operation(), %id, backend = ctx.store().backend_name(), "Recipe saved");
    Ok(Arc::new(recipe))
}

/// Replace the stored recipe with the same id. Nothing is inserted when no
/// recipe matches.
pub async fn upsert_by_id(ctx: OperationContext, recipe: Recipe) -> OperationResult<Recipe> {
    let id = recipe.id.ok_or(OperationError::MissingId)?;
    let matched = ctx
        .store()
        .update_one(&Filter::Id(id), recipe.clone())
        .await?;
    if matched == 0 {
        return Err(OperationError::NoMatch(id));
    }
    Ok(Arc::new(recipe))
}

pub async fn delete_by_id(
    ctx: OperationContext,
    param: RecipeIdParam,
) -> OperationResult<DeletedRecipe> {
    let deleted = ctx.store().delete_one(&Filter::Id(param.id)).await?;
    if deleted == 0 {
        return Err(OperationError::NoMatch(param.id));
    }
    Ok(Arc::new(DeletedRecipe { id: param.id }))
}

pub fn find_all_request() -> RequestDescriptor<(), impl Operation<(), Output = Vec<Recipe>>> {
    RequestDescriptor::without_payload(names::FIND_ALL, find_all)
}

pub fn find_by_id_request(
    raw: RawRequest,
) -> RequestDescriptor<RecipeIdParam, impl Operation<RecipeIdParam, Output = Recipe>> {
    RequestDescriptor::with_payload(names::FIND_BY_ID, raw, find_by_id)
}

pub fn find_by_title_request(
    raw: RawRequest,
) -> RequestDescriptor<TitleParam, impl Operation<TitleParam, Output = Recipe>> {
    RequestDescriptor::with_payload(names::FIND_BY_TITLE, raw, find_by_title)
}

pub fn find_by_ingredient_id_request(
    raw: RawRequest,
) -> RequestDescriptor<ExternalIdParam, impl Operation<ExternalIdParam, Output = Vec<Recipe>>> {
    RequestDescriptor::with_payload(names::FIND_BY_INGREDIENT_ID, raw, find_by_ingredient_id)
}

pub fn find_by_author_id_request(
    raw: RawRequest,
) -> RequestDescriptor<ExternalIdParam, impl Operation<ExternalIdParam, Output = Vec<Recipe>>> {
    RequestDescriptor::with_payload(names::FIND_BY_AUTHOR_ID, raw, find_by_author_id)
}

pub fn save_request(
    raw: RawRequest,
) -> RequestDescriptor<Recipe, impl Operation<Recipe, Output = Recipe>> {
    RequestDescriptor::with_payload(names::SAVE, raw, save)
}

pub fn upsert_by_id_request(
    raw: RawRequest,
) -> RequestDescriptor<Recipe, impl Operation<Recipe, Output = Recipe>> {
    RequestDescriptor::with_payload(names::UPSERT_BY_ID, raw, upsert_by_id)
}

pub fn delete_by_id_request(
    raw: RawRequest,
) -> RequestDescriptor<RecipeIdParam, impl Operation<RecipeIdParam, Output = DeletedRecipe>> {
    RequestDescriptor::with_payload(names::DELETE_BY_ID, raw, delete_by_id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::store::{MemoryStore, RecipeStore};

    fn context(store: &Arc<MemoryStore>) -> OperationContext {
        let store: Arc<dyn RecipeStore> = store.clone();
        OperationContext::new("test", store)
    }

    fn pate() -> Recipe {
        Recipe {
            name: "Pate tomates basilic".to_string(),
            author: "Arsène Fougerouse".to_string(),
            servings: 4,
            ..Default::default()
        }
    }

    #[test]
    fn operation_names_are_unique() {
        let unique: HashSet<_> = names::ALL.iter().collect();
        assert_eq!(unique.len(), names::ALL.len());
    }

    #[tokio::test]
    async fn title_lookup_is_a_case_insensitive_substring_match() {
        let store = Arc::new(MemoryStore::with_documents([pate()]));

        let found = find_by_title(
            context(&store),
            TitleParam {
                title: "pate".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(found.name, "Pate tomates basilic");

        let missing = find_by_title(
            context(&store),
            TitleParam {
                title: "zzz".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(missing, OperationError::NotFound(_)));
    }

    #[tokio::test]
    async fn save_assigns_an_id_and_round_trips() {
        let store = Arc::new(MemoryStore::new());
        let saved = save(context(&store), pate()).await.unwrap();
        let id = saved.id.unwrap();
        assert!(!id.is_nil());

        let fetched = find_by_id(context(&store), RecipeIdParam { id }).await.unwrap();
        assert_eq!(
            Recipe {
                id: None,
                ..Recipe::clone(&fetched)
            },
            pate()
        );
    }

    #[tokio::test]
    async fn save_keeps_a_caller_supplied_id() {
        let store = Arc::new(MemoryStore::new());
        let id = Uuid::new_v4();
        let saved = save(
            context(&store),
            Recipe {
                id: Some(id),
                ..pate()
            },
        )
        .await
        .unwrap();
        assert_eq!(saved.id, Some(id));
    }

    #[tokio::test]
    async fn upsert_requires_an_existing_recipe() {
        let store = Arc::new(MemoryStore::with_documents([pate()]));
        let id = Uuid::new_v4();
        let err = upsert_by_id(
            context(&store),
            Recipe {
                id: Some(id),
                ..pate()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, OperationError::NoMatch(missing) if missing == id));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn upsert_replaces_every_field() {
        let original = Recipe {
            id: Some(Uuid::new_v4()),
            ..pate()
        };
        let store = Arc::new(MemoryStore::with_documents([original.clone()]));
        let patch = Recipe {
            name: "Pates carbonara".to_string(),
            servings: 2,
            steps: vec!["Cuire".to_string()],
            ..original.clone()
        };

        upsert_by_id(context(&store), patch.clone()).await.unwrap();

        let stored = store
            .find_one(&Filter::Id(original.id.unwrap()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(*stored, patch);
    }

    #[tokio::test]
    async fn delete_then_lookup_is_not_found() {
        let original = Recipe {
            id: Some(Uuid::new_v4()),
            ..pate()
        };
        let id = original.id.unwrap();
        let store = Arc::new(MemoryStore::with_documents([original]));

        let deleted = delete_by_id(context(&store), RecipeIdParam { id }).await.unwrap();
        assert_eq!(deleted.id, id);

        let err = find_by_id(context(&store), RecipeIdParam { id }).await.unwrap_err();
        assert!(matches!(err, OperationError::NotFound(_)));

        let err = delete_by_id(context(&store), RecipeIdParam { id }).await.unwrap_err();
        assert!(matches!(err, OperationError::NoMatch(_)));
    }

    #[tokio::test]
    async fn unused_ingredient_yields_an_empty_collection() {
        let store = Arc::new(MemoryStore::with_documents([pate()]));
        let recipes = find_by_ingredient_id(
            context(&store),
            ExternalIdParam {
                id: "598b651ffd078b0011140a21".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(recipes.is_empty());
    }
}
