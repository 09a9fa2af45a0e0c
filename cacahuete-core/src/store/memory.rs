use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Filter, RecipeStore, StoreError};
use crate::models::Recipe;

/// In-process recipe collection, kept in insertion order.
///
/// Documents are held behind `Arc` so lookups hand out shared references to
/// the stored buffer; callers that need their own copy must clone.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<Arc<Recipe>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with documents. Documents without an id are
    /// given a fresh one.
    pub fn with_documents(documents: impl IntoIterator<Item = Recipe>) -> Self {
        let documents = documents
            .into_iter()
            .map(|mut recipe| {
                recipe.id.get_or_insert_with(uuid::Uuid::new_v4);
                Arc::new(recipe)
            })
            .collect();
        Self {
            documents: RwLock::new(documents),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn find_one(&self, filter: &Filter) -> Result<Option<Arc<Recipe>>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|r| filter.matches(r)).cloned())
    }

    async fn find_many(&self, filter: &Filter) -> Result<Vec<Recipe>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| Recipe::clone(r))
            .collect())
    }

    async fn insert_one(&self, recipe: Recipe) -> Result<(), StoreError> {
        let id = recipe.id.ok_or(StoreError::MissingId)?;
        let mut documents = self.documents.write().await;
        if documents.iter().any(|r| r.id == Some(id)) {
            return Err(StoreError::DuplicateKey(id));
        }
        documents.push(Arc::new(recipe));
        Ok(())
    }

    async fn update_one(&self, filter: &Filter, recipe: Recipe) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|r| filter.matches(r)) {
            Some(slot) => {
                *slot = Arc::new(recipe);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        match documents.iter().position(|r| filter.matches(r)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn recipe(name: &str, author: &str) -> Recipe {
        Recipe {
            id: Some(Uuid::new_v4()),
            name: name.to_string(),
            author: author.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected() {
        let store = MemoryStore::new();
        let first = recipe("Tarte", "Alice");
        store.insert_one(first.clone()).await.unwrap();

        let err = store.insert_one(first).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn insert_requires_an_id() {
        let store = MemoryStore::new();
        let err = store.insert_one(Recipe::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingId));
    }

    #[tokio::test]
    async fn find_many_keeps_insertion_order() {
        let store = MemoryStore::with_documents([
            recipe("Soupe", "Alice"),
            recipe("Gratin", "Bob"),
            recipe("Salade", "Alice"),
        ]);

        let names: Vec<_> = store
            .find_many(&Filter::Author("Alice".to_string()))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Soupe", "Salade"]);
    }

    #[tokio::test]
    async fn name_filter_ignores_case() {
        let store = MemoryStore::with_documents([recipe("Pate tomates basilic", "Alice")]);
        let found = store
            .find_one(&Filter::NameContains("TOMATES".to_string()))
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn update_and_delete_report_match_counts() {
        let original = recipe("Crumble", "Bob");
        let id = original.id.unwrap();
        let store = MemoryStore::with_documents([original.clone()]);

        let missing = Filter::Id(Uuid::new_v4());
        assert_eq!(store.update_one(&missing, original.clone()).await.unwrap(), 0);
        assert_eq!(store.delete_one(&missing).await.unwrap(), 0);

        let renamed = Recipe {
            name: "Crumble aux pommes".to_string(),
            ..original
        };
        assert_eq!(store.update_one(&Filter::Id(id), renamed).await.unwrap(), 1);
        let stored = store.find_one(&Filter::Id(id)).await.unwrap().unwrap();
        assert_eq!(stored.name, "Crumble aux pommes");

        assert_eq!(store.delete_one(&Filter::Id(id)).await.unwrap(), 1);
        assert!(store.is_empty().await);
    }
}
