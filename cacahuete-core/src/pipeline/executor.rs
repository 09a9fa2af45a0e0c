//! Request executor: bind, validate, trace, invoke, normalize.

use std::any::type_name;
use std::fmt::Debug;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::field::Empty;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info_span, warn, Dispatch, Instrument, Span};

use super::descriptor::{PayloadSource, RequestDescriptor};
use super::operation::{Operation, OperationContext, Record};
use crate::error::ApiError;
use crate::store::RecipeStore;
use crate::validation::Validate;

/// A type the executor can bind from a request and validate.
pub trait Payload: DeserializeOwned + Validate + Debug + Send + 'static {}

impl<T> Payload for T where T: DeserializeOwned + Validate + Debug + Send + 'static {}

/// Runs request descriptors against one store.
///
/// Spans and log events of every execution go to the dispatch given at
/// construction, not to whatever subscriber happens to be the global default.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    store: Arc<dyn RecipeStore>,
    dispatch: Dispatch,
}

impl RequestExecutor {
    pub fn new(store: Arc<dyn RecipeStore>, dispatch: Dispatch) -> Self {
        Self { store, dispatch }
    }

    /// Executor reporting to the current default dispatcher.
    pub fn with_current_dispatch(store: Arc<dyn RecipeStore>) -> Self {
        Self::new(store, tracing::dispatcher::get_default(Dispatch::clone))
    }

    pub fn store(&self) -> &Arc<dyn RecipeStore> {
        &self.store
    }

    /// Execute one request end to end.
    ///
    /// A successful run opens two spans (`api.<operation>` and
    /// `<operation>.execute`); every failure emits exactly one WARN or ERROR
    /// event. Operation failures come back as `InternalFailure` wrapping the
    /// [`OperationError`](super::OperationError).
    pub async fn execute<P, O>(
        &self,
        descriptor: RequestDescriptor<P, O>,
    ) -> Result<O::Output, ApiError>
    where
        P: Payload,
        O: Operation<P>,
    {
        self.run(descriptor)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn run<P, O>(&self, descriptor: RequestDescriptor<P, O>) -> Result<O::Output, ApiError>
    where
        P: Payload,
        O: Operation<P>,
    {
        let RequestDescriptor {
            operation,
            payload,
            call,
        } = descriptor;

        if let PayloadSource::Raw(raw) = &payload {
            if raw.is_empty() {
                warn!(request = operation, "Request payload is nil");
                return Err(ApiError::invalid_request("payload is nil"));
            }
        }

        let span = info_span!(
            "api.request",
            otel.name = %format!("api.{operation}"),
            request = operation,
            otel.status_code = Empty,
            otel.status_message = Empty,
        );
        self.bind_and_invoke(operation, payload, call)
            .instrument(span)
            .await
    }

    async fn bind_and_invoke<P, O>(
        &self,
        operation: &'static str,
        payload: PayloadSource<P>,
        call: O,
    ) -> Result<O::Output, ApiError>
    where
        P: Payload,
        O: Operation<P>,
    {
        let payload = match payload {
            PayloadSource::Unit(payload) => payload,
            PayloadSource::Raw(raw) => {
                debug!(request = operation, request_object = ?raw, "Trying to bind and validate the request");
                let bound: P = raw.bind().map_err(|err| {
                    mark_failed(&Span::current(), &err);
                    warn!(request = operation, request_object = ?raw, error = %err, "Request binding failed");
                    ApiError::invalid_request(err)
                })?;
                if let Err(err) = bound.validate() {
                    mark_failed(&Span::current(), &err);
                    warn!(request = operation, request_object = ?bound, error = %err, "Request validation failed");
                    return Err(ApiError::unprocessable(err));
                }
                bound
            }
        };

        let op_span = info_span!(
            "api.operation",
            otel.name = %format!("{operation}.execute"),
            request = operation,
            otel.status_code = Empty,
            otel.status_message = Empty,
        );
        let snapshot = format!("{payload:?}");
        let ctx = OperationContext::new(operation, Arc::clone(&self.store));
        let outcome = call
            .call(ctx, payload)
            .instrument(op_span.clone())
            .await;

        let record = match outcome {
            Ok(record) => record,
            Err(err) => {
                mark_failed(&op_span, &err);
                error!(
                    parent: &op_span,
                    request = operation,
                    request_object = %snapshot,
                    error = %err,
                    "Error when trying to call method {operation} with object {snapshot}"
                );
                drop(op_span);
                mark_failed(&Span::current(), &err);
                return Err(ApiError::internal(err));
            }
        };
        drop(op_span);

        // The operation may still hold the record (a store buffer); detach from it.
        let response = Arc::unwrap_or_clone(record);
        debug!(
            request = operation,
            response_type = type_name::<O::Output>(),
            response_shape = %response.shape(),
            response_value = ?response,
            "Response object received from {operation} function"
        );
        Ok(response)
    }
}

fn mark_failed(span: &Span, err: &dyn std::error::Error) {
    span.record("otel.status_code", "ERROR");
    span.record("otel.status_message", tracing::field::display(err));
}
