//! Dynamic command API registry.
//!
//! Maps canonical command URIs (`domain/address/command`) to handlers.
//! Lookup first tries the exact three-segment prefix of the request; when no
//! handler is registered there, registered catch-all matchers get the full
//! request string instead.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A registered command handler.
///
/// Receives either the request suffix (exact match, surrounding `/` trimmed)
/// or the full request (catch-all), and returns a JSON value when it handled
/// the call.
pub type ApiHandler = Arc<dyn Fn(&str) -> Option<serde_json::Value> + Send + Sync>;

/// Process-wide command URI → handler mapping.
///
/// Register, unregister and lookup are all safe under concurrent access;
/// handlers run outside the internal locks so a slow handler never blocks
/// registration.
#[derive(Default)]
pub struct DynamicApiRegistry {
    handlers: RwLock<HashMap<String, ApiHandler>>,
    catch_all: RwLock<Vec<ApiHandler>>,
}

impl DynamicApiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a canonical `domain/address/command` key.
    ///
    /// Replaces any previous handler for the same key.
    pub fn register(&self, key: impl Into<String>, handler: ApiHandler) {
        self.handlers.write().insert(key.into(), handler);
    }

    /// Remove a handler; returns whether one was registered.
    pub fn unregister(&self, key: &str) -> bool {
        self.handlers.write().remove(key).is_some()
    }

    /// Register a fallback matcher consulted when no exact key matches.
    pub fn register_catch_all(&self, handler: ApiHandler) {
        self.catch_all.write().push(handler);
    }

    /// Dispatch a request.
    ///
    /// `request` is `domain/address/command[/suffix…]`; the exact handler for
    /// the three-segment prefix receives the suffix, catch-alls receive the
    /// whole request. Returns the first handler's non-`None` answer.
    pub fn handle(&self, request: &str) -> Option<serde_json::Value> {
        if let Some((key, suffix)) = split_request(request) {
            let handler = self.handlers.read().get(&key).cloned();
            if let Some(handler) = handler {
                return handler(suffix.trim_matches('/'));
            }
        }

        let fallbacks: Vec<ApiHandler> = self.catch_all.read().clone();
        fallbacks.iter().find_map(|handler| handler(request))
    }
}

/// Split a request into its canonical three-segment key and the suffix.
fn split_request(request: &str) -> Option<(String, &str)> {
    let trimmed = request.trim_matches('/');
    let mut segments = trimmed.splitn(4, '/');
    let domain = segments.next()?;
    let address = segments.next()?;
    let command = segments.next()?;
    let suffix = segments.next().unwrap_or("");
    Some((format!("{domain}/{address}/{command}"), suffix))
}
