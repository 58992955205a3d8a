//! Scripted transport for unit tests.

use crate::{
    api::{AppError, HttpRequest, HttpResponse, Transport},
    auth::store::{TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY},
};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};
use tokio::sync::Notify;

type Scripted = Result<HttpResponse, AppError>;

/// Replies per path from a queue. The last queued reply for a path is reused
/// once the others are consumed; unknown paths answer 404.
#[derive(Default)]
pub(crate) struct StubTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    protected: Mutex<HashMap<String, (String, Value)>>,
    requests: Mutex<Vec<HttpRequest>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, path: &str, status: StatusCode, body: Value) {
        self.push(path, Ok(HttpResponse::new(status, body)));
    }

    pub(crate) fn fail(&self, path: &str, message: &str) {
        self.push(path, Err(AppError::Network(message.to_string())));
    }

    /// Serves `body` to requests bearing `token` and 401 to everything else.
    pub(crate) fn protect(&self, path: &str, token: &str, body: Value) {
        self.protected
            .lock()
            .unwrap()
            .insert(path.to_string(), (token.to_string(), body));
    }

    /// Parks requests to `path` until the returned handle is notified.
    pub(crate) fn hold(&self, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.holds
            .lock()
            .unwrap()
            .insert(path.to_string(), Arc::clone(&gate));
        gate
    }

    fn push(&self, path: &str, reply: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.path == path)
            .count()
    }

    /// Bearer tokens sent to `path`, in order.
    pub(crate) fn bearers(&self, path: &str) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.path == path)
            .map(|request| {
                request
                    .bearer
                    .as_ref()
                    .map(|token| token.expose_secret().to_string())
            })
            .collect()
    }

    fn next_reply(&self, path: &str, bearer: Option<&str>) -> Scripted {
        if let Some((token, body)) = self.protected.lock().unwrap().get(path) {
            return Ok(if bearer == Some(token.as_str()) {
                HttpResponse::new(StatusCode::OK, body.clone())
            } else {
                HttpResponse::new(StatusCode::UNAUTHORIZED, json!({"error": "token expired"}))
            });
        }

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(path) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Ok(HttpResponse::new(
                StatusCode::NOT_FOUND,
                json!({"error": "no stub"}),
            )),
        }
    }
}

impl Transport for StubTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, AppError> {
        let path = request.path.clone();
        let bearer = request
            .bearer
            .as_ref()
            .map(|token| token.expose_secret().to_string());
        self.requests.lock().unwrap().push(request);
        // Let concurrent callers interleave like real I/O would.
        tokio::task::yield_now().await;
        let gate = self.holds.lock().unwrap().get(&path).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.next_reply(&path, bearer.as_deref())
    }
}

pub(crate) fn seed_session<S: TokenStore>(store: &S, access: &str, refresh: &str) {
    store
        .update(&[
            (ACCESS_TOKEN_KEY, Some(access)),
            (REFRESH_TOKEN_KEY, Some(refresh)),
        ])
        .unwrap();
}
