use super::binder::RawRequest;

/// Where the executor gets the operation's payload from.
pub(crate) enum PayloadSource<P> {
    /// The operation takes no request payload
    Unit(P),
    /// Bind and validate `P` from the raw request
    Raw(RawRequest),
}

/// Everything needed to run one request: the payload source, the operation
/// name used for spans and logs, and the operation itself.
///
/// Built by a route handler and consumed by
/// [`RequestExecutor::execute`](super::RequestExecutor::execute).
pub struct RequestDescriptor<P, O> {
    pub(crate) operation: &'static str,
    pub(crate) payload: PayloadSource<P>,
    pub(crate) call: O,
}

impl<O> RequestDescriptor<(), O> {
    pub fn without_payload(operation: &'static str, call: O) -> Self {
        Self {
            operation,
            payload: PayloadSource::Unit(()),
            call,
        }
    }
}

impl<P, O> RequestDescriptor<P, O> {
    pub fn with_payload(operation: &'static str, raw: RawRequest, call: O) -> Self {
        Self {
            operation,
            payload: PayloadSource::Raw(raw),
            call,
        }
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Whether the executor will bind a payload for this request.
    pub fn declares_payload(&self) -> bool {
        matches!(self.payload, PayloadSource::Raw(_))
    }
}
