//! Long-poll readers for the backend's event queues.
//!
//! Each read is an infinite-timeout call that the backend answers whenever
//! the next log line, message, or result becomes available. The handle keeps
//! the call's Ref visible so a reader that is no longer wanted can be
//! cancelled instead of dangling forever.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::error::{Result, WireError};
use crate::request::{Request, Response};
use crate::service::{CallTimeout, Client};
use crate::term::Term;

/// An in-flight long-poll read.
pub struct LongPoll {
    reference: String,
    task: JoinHandle<Result<Response>>,
}

impl LongPoll {
    /// The read's Ref, usable with [`EventsApi::cancel`].
    pub fn ref_str(&self) -> &str {
        &self.reference
    }

    /// Wait for the backend to answer (or for cancellation/failure).
    pub async fn wait(self) -> Result<Response> {
        match self.task.await {
            Ok(result) => result,
            Err(_) => Err(WireError::Cancelled),
        }
    }
}

pub struct EventsApi {
    client: Arc<Client>,
}

impl EventsApi {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Read the next log line of simulation `id`.
    pub fn read_log(&self, id: i32) -> LongPoll {
        self.read("read_log", id)
    }

    /// Read the next inter-vertex message of simulation `id`.
    pub fn read_message(&self, id: i32) -> LongPoll {
        self.read("read_message", id)
    }

    /// Read the next result of simulation `id`.
    pub fn read_result(&self, id: i32) -> LongPoll {
        self.read("read_result", id)
    }

    /// Cancel an in-flight read by its Ref.
    pub fn cancel(&self, reference: &str) {
        self.client.cancel(reference);
    }

    fn read(&self, function: &str, id: i32) -> LongPoll {
        let request = Request::new("event_handler", function, vec![Term::int(id)]);
        let reference = request.ref_str().to_owned();
        let client = self.client.clone();
        // Spawn so the call is registered immediately; the caller may hold
        // the handle for a while before awaiting it.
        let task = tokio::spawn(async move { client.call(&request, CallTimeout::Infinity).await });
        LongPoll { reference, task }
    }
}
