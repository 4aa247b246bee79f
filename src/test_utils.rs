// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses and the registry
//! boundary.

use async_trait::async_trait;
use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

use crate::error::{ImportError, Result as ImportResult};
use crate::import::TimestampProvider;
use crate::registry::{relocated_ref, ImageFetcher, ImageRelocator, Keychain, RemoteImage};

/// A mock HTTP service that returns predefined responses based on request
/// method and path. Responses registered for the same method/path are served
/// in registration order; the last one repeats. Every request is logged.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), VecDeque<(u16, String)>>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back((status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the exact path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    /// Add a response for PUT requests matching the exact path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    /// Add a response for watch requests (GET with `watch=true`) matching
    /// the exact path. The body is served as the whole watch stream, one
    /// JSON event per line.
    pub fn on_watch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("WATCH", path, status, body)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "stevedore-system")
    }

    /// Every (method, path) pair seen so far, in request order
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of mutating requests seen so far
    pub fn write_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == "POST" || m == "PUT" || m == "PATCH" || m == "DELETE")
            .count()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();

        // Try exact match first
        if let Some(queue) = responses.get_mut(&(method.to_string(), path.to_string())) {
            return take_response(queue);
        }

        // Try prefix match for paths like /api/v1/namespaces/foo
        for ((m, p), queue) in responses.iter_mut() {
            if m == method && path.starts_with(p.as_str()) {
                return take_response(queue);
            }
        }

        None
    }
}

/// Pop sequenced responses until one remains, then repeat it
fn take_response(queue: &mut VecDeque<(u16, String)>) -> Option<(u16, String)> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let mut method = req.method().to_string();
        let path = req.uri().path().to_string();
        if method == "GET" && req.uri().query().unwrap_or("").contains("watch=true") {
            method = "WATCH".to_string();
        }

        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.clone()));

        let response = self.find_response(&method, &path);

        Box::pin(async move {
            match response {
                Some((status, body)) => Ok(Response::builder()
                    .status(status)
                    .header("content-type", "application/json")
                    .body(Body::from(body.into_bytes()))
                    .unwrap()),
                None => {
                    // Default 404 for unmatched requests
                    let body = r#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"not found","reason":"NotFound","code":404}"#;
                    Ok(Response::builder()
                        .status(404)
                        .header("content-type", "application/json")
                        .body(Body::from(body.as_bytes().to_vec()))
                        .unwrap())
                }
            }
        })
    }
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// In-memory fetcher: serves registered images, errors on anything else
#[derive(Clone, Default)]
pub struct FakeFetcher {
    images: HashMap<String, RemoteImage>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, reference: &str, digest: &str) -> Self {
        self.images
            .insert(reference.to_string(), RemoteImage::new(reference, digest));
        self
    }

    pub fn with_stack_image(mut self, reference: &str, digest: &str, stack_id: &str) -> Self {
        self.images.insert(
            reference.to_string(),
            RemoteImage::new(reference, digest)
                .with_label(crate::constants::STACK_ID_LABEL, stack_id),
        );
        self
    }
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, _keychain: &Keychain, reference: &str) -> ImportResult<RemoteImage> {
        self.images
            .get(reference)
            .cloned()
            .ok_or_else(|| ImportError::Registry {
                image: reference.to_string(),
                reason: "image not found".to_string(),
            })
    }
}

/// Relocator that records every relocated reference it "pushes"
#[derive(Clone, Default)]
pub struct RecordingRelocator {
    writes: Arc<Mutex<Vec<String>>>,
}

impl RecordingRelocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageRelocator for RecordingRelocator {
    async fn relocate(
        &self,
        _keychain: &Keychain,
        image: &RemoteImage,
        destination_repository: &str,
    ) -> ImportResult<String> {
        let reference = relocated_ref(destination_repository, &image.digest);
        self.writes.lock().unwrap().push(reference.clone());
        Ok(reference)
    }
}

/// Deterministic timestamp provider
#[derive(Clone, Copy)]
pub struct FixedClock(pub &'static str);

impl TimestampProvider for FixedClock {
    fn timestamp(&self) -> String {
        self.0.to_string()
    }
}
