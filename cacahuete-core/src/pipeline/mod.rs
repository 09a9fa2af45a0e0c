//! Generic request-execution pipeline.
//!
//! A route handler describes a request with a [`RequestDescriptor`] (payload
//! source, operation name, operation function) and hands it to the
//! [`RequestExecutor`], which:
//! - binds the raw request into the payload type and validates it
//! - opens a span for the request and a child span for the operation
//! - calls the operation against the store
//! - turns any failure into a single [`ApiError`](crate::error::ApiError)

mod binder;
mod descriptor;
mod executor;
mod operation;

pub use binder::{BindError, RawRequest};
pub use descriptor::RequestDescriptor;
pub use executor::{Payload, RequestExecutor};
pub use operation::{
    Operation, OperationContext, OperationError, OperationResult, Record, RecordShape,
};
