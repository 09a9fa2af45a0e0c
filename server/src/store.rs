//! PostgreSQL recipe collection.
//!
//! Each recipe is stored whole as a JSONB document, next to the columns the
//! lookups filter on (`name`, `author`). Diesel is synchronous, so every call
//! runs on the blocking pool.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use cacahuete_core::store::{Filter, RecipeStore, StoreError};
use cacahuete_core::Recipe;
use chrono::Utc;
use diesel::dsl::sql;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::Integer;
use serde_json::json;
use uuid::Uuid;

use crate::db::DbPool;
use crate::schema::recipes;

#[derive(Queryable, Selectable)]
#[diesel(table_name = recipes)]
struct RecipeRow {
    id: Uuid,
    document: serde_json::Value,
}

impl RecipeRow {
    fn into_recipe(self) -> Result<Recipe, StoreError> {
        let mut recipe: Recipe = serde_json::from_value(self.document)?;
        recipe.id = Some(self.id);
        Ok(recipe)
    }
}

#[derive(Insertable)]
#[diesel(table_name = recipes)]
struct NewRecipeRow<'a> {
    id: Uuid,
    name: &'a str,
    author: &'a str,
    document: serde_json::Value,
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run a diesel closure on a pooled connection off the async runtime.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::Connection(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Query(format!("blocking task failed: {e}")))?
    }
}

impl fmt::Debug for PgDocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.pool.state();
        f.debug_struct("PgDocumentStore")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

/// Escape LIKE wildcards so user input only ever matches literally.
fn like_pattern(fragment: &str) -> String {
    let escaped = fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn filtered(filter: &Filter) -> recipes::BoxedQuery<'static, Pg> {
    let query = recipes::table.into_boxed();
    match filter {
        Filter::All => query,
        Filter::Id(id) => query.filter(recipes::id.eq(*id)),
        Filter::NameContains(fragment) => query.filter(recipes::name.ilike(like_pattern(fragment))),
        Filter::Author(author) => query.filter(recipes::author.eq(author.clone())),
        Filter::IngredientId(id) => {
            query.filter(recipes::document.contains(json!({ "ingredients": [{ "id": id }] })))
        }
    }
}

/// Id of the first document (in insertion order) matching the filter.
fn first_match(conn: &mut PgConnection, filter: &Filter) -> QueryResult<Option<Uuid>> {
    filtered(filter)
        .select(recipes::id)
        .order(recipes::created_at.asc())
        .first(conn)
        .optional()
}

fn query_error(err: DieselError) -> StoreError {
    StoreError::Query(err.to_string())
}

/// The document column never repeats the id; it lives in the key column.
fn document_of(recipe: &Recipe) -> Result<serde_json::Value, StoreError> {
    let mut document = serde_json::to_value(recipe)?;
    if let Some(object) = document.as_object_mut() {
        object.remove("id");
    }
    Ok(document)
}

#[async_trait]
impl RecipeStore for PgDocumentStore {
    async fn find_one(&self, filter: &Filter) -> Result<Option<Arc<Recipe>>, StoreError> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let row: Option<RecipeRow> = filtered(&filter)
                .select(RecipeRow::as_select())
                .order(recipes::created_at.asc())
                .first(conn)
                .optional()
                .map_err(query_error)?;
            row.map(|row| row.into_recipe().map(Arc::new)).transpose()
        })
        .await
    }

    async fn find_many(&self, filter: &Filter) -> Result<Vec<Recipe>, StoreError> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            let rows: Vec<RecipeRow> = filtered(&filter)
                .select(RecipeRow::as_select())
                .order(recipes::created_at.asc())
                .load(conn)
                .map_err(query_error)?;
            rows.into_iter().map(RecipeRow::into_recipe).collect()
        })
        .await
    }

    async fn insert_one(&self, recipe: Recipe) -> Result<(), StoreError> {
        let id = recipe.id.ok_or(StoreError::MissingId)?;
        self.with_conn(move |conn| {
            let row = NewRecipeRow {
                id,
                name: &recipe.name,
                author: &recipe.author,
                document: document_of(&recipe)?,
            };
            match diesel::insert_into(recipes::table).values(&row).execute(conn) {
                Ok(_) => Ok(()),
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                    Err(StoreError::DuplicateKey(id))
                }
                Err(e) => Err(query_error(e)),
            }
        })
        .await
    }

    async fn update_one(&self, filter: &Filter, recipe: Recipe) -> Result<u64, StoreError> {
        let filter = filter.clone();
        let document = document_of(&recipe)?;
        self.with_conn(move |conn| {
            conn.transaction(|conn| {
                let Some(id) = first_match(conn, &filter)? else {
                    return Ok(0);
                };
                diesel::update(recipes::table.filter(recipes::id.eq(id)))
                    .set((
                        recipes::name.eq(&recipe.name),
                        recipes::author.eq(&recipe.author),
                        recipes::document.eq(document),
                        recipes::updated_at.eq(Utc::now()),
                    ))
                    .execute(conn)
            })
            .map(|updated| updated as u64)
            .map_err(query_error)
        })
        .await
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError> {
        let filter = filter.clone();
        self.with_conn(move |conn| {
            conn.transaction(|conn| {
                let Some(id) = first_match(conn, &filter)? else {
                    return Ok(0);
                };
                diesel::delete(recipes::table.filter(recipes::id.eq(id))).execute(conn)
            })
            .map(|deleted| deleted as u64)
            .map_err(query_error)
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            diesel::select(sql::<Integer>("1"))
                .get_result::<i32>(conn)
                .map(|_| ())
                .map_err(|e| StoreError::Connection(e.to_string()))
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
