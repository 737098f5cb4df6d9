//! Simulation lifecycle operations.
//!
//! Calls carry the simulation id as their first argument; link edits and
//! kills are casts, since the backend emits their effects through the event
//! stream rather than as replies.

use std::sync::Arc;

use crate::error::Result;
use crate::request::Request;
use crate::service::{CallTimeout, Client};
use crate::term::Term;

use super::topology::Topology;

/// Outcome of registering a simulation id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The id is already registered on the backend.
    Exists,
}

pub struct SimulationApi {
    client: Arc<Client>,
}

impl SimulationApi {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Register a new simulation under `id`.
    pub async fn add(&self, id: i32) -> Result<AddOutcome> {
        let request = Request::new("simulation", "add", vec![Term::int(id)]);
        let response = self.client.call(&request, CallTimeout::default()).await?;
        if response.payload().is_atom("ok") {
            Ok(AddOutcome::Added)
        } else {
            Ok(AddOutcome::Exists)
        }
    }

    /// Install the vertex/edge layout for simulation `id`.
    pub async fn set_topology(&self, id: i32, topology: &Topology) -> Result<bool> {
        let request = Request::new(
            "simulation",
            "topology",
            vec![Term::int(id), topology.to_term()],
        );
        let response = self.client.call(&request, CallTimeout::default()).await?;
        Ok(response.payload().is_atom("ok"))
    }

    /// Start simulation `id` running `module` (entry function optional).
    pub async fn start(&self, id: i32, module: &str, function: Option<&str>) -> Result<bool> {
        let mut args = vec![Term::int(id), Term::atom(module)];
        if let Some(function) = function {
            args.push(Term::atom(function));
        }
        let request = Request::new("simulation", "start", args);
        let response = self.client.call(&request, CallTimeout::default()).await?;
        Ok(response.payload().is_atom("ok"))
    }

    /// Stop simulation `id`.
    pub async fn stop(&self, id: i32) -> Result<bool> {
        let request = Request::new("simulation", "stop", vec![Term::int(id)]);
        let response = self.client.call(&request, CallTimeout::default()).await?;
        Ok(response.payload().is_atom("ok"))
    }

    /// Tear down simulation `id` without waiting for confirmation.
    pub async fn kill(&self, id: i32) -> bool {
        let request = Request::new("simulation", "kill", vec![Term::int(id)]);
        self.client.cast(&request).await
    }

    /// Drop the link between two vertices.
    pub async fn remove_link(&self, id: i32, from: i32, to: i32) -> bool {
        let request = Request::new(
            "simulation",
            "remove_link",
            vec![Term::int(id), Term::int(from), Term::int(to)],
        );
        self.client.cast(&request).await
    }

    /// Restore a previously removed link.
    pub async fn reinsert_link(&self, id: i32, from: i32, to: i32) -> bool {
        let request = Request::new(
            "simulation",
            "reinsert_link",
            vec![Term::int(id), Term::int(from), Term::int(to)],
        );
        self.client.cast(&request).await
    }
}
