//! Core of the cacahuete recipe catalog: the recipe model and its validation
//! rules, the document store contract, and the request pipeline that every
//! endpoint runs through.

pub mod envelope;
pub mod error;
pub mod models;
pub mod operations;
pub mod pipeline;
pub mod store;
pub mod units;
pub mod validation;

pub use envelope::{HealthResponse, HealthStatus};
pub use error::{ApiError, ErrorKind, ErrorResponse};
pub use models::{DeletedRecipe, Dish, IngredientRef, Recipe, Timer};
pub use pipeline::{RawRequest, RequestExecutor};
pub use store::{Filter, MemoryStore, RecipeStore, StoreError};
pub use validation::{Validate, ValidationErrors};
