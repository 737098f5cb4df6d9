//! Algorithm compilation operations.

use std::sync::Arc;

use crate::error::Result;
use crate::request::Request;
use crate::service::{CallTimeout, Client};
use crate::term::Term;

/// Outcome of asking the backend to compile an algorithm source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Ok,
    /// Rendered backend diagnostic, e.g. `{error, enoent}`.
    Error(String),
}

pub struct AlgorithmApi {
    client: Arc<Client>,
}

impl AlgorithmApi {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Compile `file` on the backend node.
    pub async fn compile(&self, file: &str) -> Result<CompileOutcome> {
        let request = Request::new("algorithm", "compile", vec![Term::str(file)]);
        let response = self.client.call(&request, CallTimeout::default()).await?;
        match response.payload() {
            payload if payload.is_atom("ok") => Ok(CompileOutcome::Ok),
            other => Ok(CompileOutcome::Error(other.to_string())),
        }
    }
}
