//! The uniform contract every data-access operation satisfies.

use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{DeletedRecipe, Recipe};
use crate::store::{RecipeStore, StoreError};

/// Failure reported by an operation.
#[derive(Debug, Error)]
pub enum OperationError {
    /// A lookup found nothing
    #[error("no recipe found for {0}")]
    NotFound(String),

    /// An update or delete matched zero documents
    #[error("ID not found: {0}")]
    NoMatch(Uuid),

    #[error("recipe id is required")]
    MissingId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shape of a result, reported in debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    Single,
    Collection(usize),
}

impl fmt::Display for RecordShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordShape::Single => write!(f, "record"),
            RecordShape::Collection(len) => write!(f, "collection[{len}]"),
        }
    }
}

/// A structured record, or a collection of them. Operations can only return
/// types implementing this, so scalars never reach the transport layer.
pub trait Record: Serialize + Clone + Debug + Send + Sync + 'static {
    fn shape(&self) -> RecordShape {
        RecordShape::Single
    }
}

impl Record for Recipe {}

impl Record for DeletedRecipe {}

impl<T: Record> Record for Vec<T> {
    fn shape(&self) -> RecordShape {
        RecordShape::Collection(self.len())
    }
}

/// What an operation gets to work with.
#[derive(Debug, Clone)]
pub struct OperationContext {
    operation: &'static str,
    store: Arc<dyn RecipeStore>,
}

impl OperationContext {
    pub fn new(operation: &'static str, store: Arc<dyn RecipeStore>) -> Self {
        Self { operation, store }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn store(&self) -> &dyn RecipeStore {
        self.store.as_ref()
    }
}

pub type OperationResult<R> = Result<Arc<R>, OperationError>;

/// Anything callable as `(context, payload) -> Result<Arc<record>, error>`.
///
/// Implemented for every matching `FnOnce`, so plain `async fn`s are operations.
pub trait Operation<P>: Send {
    type Output: Record;
    type Future: Future<Output = OperationResult<Self::Output>> + Send;

    fn call(self, ctx: OperationContext, payload: P) -> Self::Future;
}

impl<P, R, F, Fut> Operation<P> for F
where
    F: FnOnce(OperationContext, P) -> Fut + Send,
    Fut: Future<Output = OperationResult<R>> + Send,
    R: Record,
{
    type Output = R;
    type Future = Fut;

    fn call(self, ctx: OperationContext, payload: P) -> Self::Future {
        self(ctx, payload)
    }
}
