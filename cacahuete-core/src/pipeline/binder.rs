//! Binding raw transport input into typed payloads.

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("malformed JSON body: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("request body must be a JSON object to carry path parameters")]
    NotAnObject,

    #[error("request does not match the expected shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Transport input for one request: path parameters plus the JSON body.
#[derive(Clone, Default)]
pub struct RawRequest {
    params: BTreeMap<String, String>,
    body: Bytes,
}

impl RawRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_body(body: impl Into<Bytes>) -> Self {
        Self::new().with_body(body)
    }

    pub fn from_params<K, V>(params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        params
            .into_iter()
            .fold(Self::new(), |raw, (k, v)| raw.with_param(k, v))
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// No body and no parameters: nothing to bind a payload from.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.body.iter().all(u8::is_ascii_whitespace)
    }

    /// Deserialize the request into `P`.
    ///
    /// The body is parsed as a JSON object and path parameters are written
    /// over it as strings, so a path `id` always wins over a body `id`.
    pub fn bind<P: DeserializeOwned>(&self) -> Result<P, BindError> {
        let mut value = if self.body.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(&self.body).map_err(BindError::Syntax)?
        };

        if !self.params.is_empty() {
            let Value::Object(object) = &mut value else {
                return Err(BindError::NotAnObject);
            };
            for (name, param) in &self.params {
                object.insert(name.clone(), Value::String(param.clone()));
            }
        }

        serde_json::from_value(value).map_err(BindError::Shape)
    }
}

impl fmt::Debug for RawRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawRequest")
            .field("params", &self.params)
            .field("body", &String::from_utf8_lossy(&self.body))
            .finish()
    }
}
