//! Test doubles shared by the unit tests in this crate.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cloister_core::{CacheStore, Error, Request, Response};
use tokio::sync::Notify;

use crate::fetch::Network;
use crate::sync::{ClientMessage, Observers};

enum Scripted {
    Respond(Response),
    Fail,
}

/// Scripted network. Unscripted URLs fail like an unreachable host.
#[derive(Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<String, Scripted>>,
    posts: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<String>>,
    posted: Mutex<Vec<(String, serde_json::Value)>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MockNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), Scripted::Respond(response));
    }

    pub fn fail(&self, url: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), Scripted::Fail);
    }

    /// Queue the outcome of the next POST. Unqueued POSTs answer 201.
    pub fn post_outcome(&self, response: Option<Response>) {
        let scripted = response.map(Scripted::Respond).unwrap_or(Scripted::Fail);
        self.posts.lock().unwrap().push_back(scripted);
    }

    /// Hold every GET until the returned handle is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn posted(&self) -> Vec<(String, serde_json::Value)> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.routes.lock().unwrap().get(&url) {
            Some(Scripted::Respond(response)) => Ok(response.clone()),
            Some(Scripted::Fail) | None => Err(Error::Network(format!("unreachable: {url}"))),
        }
    }

    async fn post_json(&self, url: &url::Url, body: &serde_json::Value) -> Result<Response, Error> {
        self.posted.lock().unwrap().push((url.to_string(), body.clone()));
        match self.posts.lock().unwrap().pop_front() {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail) => Err(Error::Network(format!("unreachable: {url}"))),
            None => Ok(Response::new(201, "Created", "")),
        }
    }
}

/// A store whose every operation fails, as if the disk were full.
pub struct BrokenStore;

#[async_trait]
impl CacheStore for BrokenStore {
    async fn match_request(&self, _region: Option<&str>, _request: &Request) -> Result<Option<Response>, Error> {
        Err(Error::CorruptEntry("store unavailable".into()))
    }

    async fn put(&self, _region: &str, _request: &Request, _response: &Response) -> Result<bool, Error> {
        Err(Error::CorruptEntry("quota exceeded".into()))
    }

    async fn put_all(&self, _region: &str, _entries: &[(Request, Response)]) -> Result<usize, Error> {
        Err(Error::CorruptEntry("quota exceeded".into()))
    }

    async fn list_regions(&self) -> Result<Vec<String>, Error> {
        Err(Error::CorruptEntry("store unavailable".into()))
    }

    async fn delete_regions_not_in(&self, _keep: &[String]) -> Result<Vec<String>, Error> {
        Err(Error::CorruptEntry("store unavailable".into()))
    }
}

/// Observer list that remembers everything published.
#[derive(Default)]
pub struct RecordingObservers {
    messages: Mutex<Vec<ClientMessage>>,
}

impl RecordingObservers {
    pub fn messages(&self) -> Vec<ClientMessage> {
        self.messages.lock().unwrap().clone()
    }
}

impl Observers for RecordingObservers {
    fn publish(&self, message: ClientMessage) {
        self.messages.lock().unwrap().push(message);
    }
}

pub fn ok(body: &'static str) -> Response {
    Response::new(200, "OK", body).with_header("content-type", "text/plain")
}

pub fn get(url: &str) -> Request {
    Request::get(url::Url::parse(url).unwrap())
}
