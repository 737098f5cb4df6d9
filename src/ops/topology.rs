//! Topology generation operations.

use std::sync::Arc;

use crate::error::{Result, WireError};
use crate::request::Request;
use crate::service::{CallTimeout, Client};
use crate::term::Term;

/// Vertex/adjacency description of a generated graph.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Topology {
    /// `(vertex id, neighbor ids)` pairs, in backend order.
    pub vertices: Vec<(i32, Vec<i32>)>,
}

impl Topology {
    pub fn new(vertices: Vec<(i32, Vec<i32>)>) -> Self {
        Self { vertices }
    }

    /// The topology as the backend expects it on the wire.
    pub fn to_term(&self) -> Term {
        Term::List(
            self.vertices
                .iter()
                .map(|(id, edges)| {
                    Term::Tuple(vec![
                        Term::Integer(*id),
                        Term::List(edges.iter().map(|edge| Term::Integer(*edge)).collect()),
                    ])
                })
                .collect(),
        )
    }

    /// Parse a topology reply.
    ///
    /// The wire format compacts a list made only of byte-sized integers into
    /// a string, so each adjacency list arrives either as a List of Integers
    /// or as a Str of code points.
    pub fn from_term(term: &Term) -> Option<Self> {
        let items = term.as_list()?;
        let mut vertices = Vec::with_capacity(items.len());
        for item in items {
            let fields = item.as_tuple()?;
            let [id, edges] = fields else {
                return None;
            };
            let id = id.as_int()?;
            let edges = match edges {
                Term::List(items) => items
                    .iter()
                    .map(Term::as_int)
                    .collect::<Option<Vec<i32>>>()?,
                Term::Str(packed) => packed.chars().map(|c| c as i32).collect(),
                _ => return None,
            };
            vertices.push((id, edges));
        }
        Some(Self { vertices })
    }
}

pub struct TopologyApi {
    client: Arc<Client>,
}

impl TopologyApi {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Generate a complete graph over vertex ids `from..=to`.
    pub async fn complete(&self, from: i32, to: i32) -> Result<Topology> {
        self.random(from, to, 1.0).await
    }

    /// Generate a random graph over `from..=to` with edge density `alpha`.
    pub async fn random(&self, from: i32, to: i32, alpha: f64) -> Result<Topology> {
        let request = Request::new(
            "topology",
            "random",
            vec![
                Term::tuple(vec![Term::int(from), Term::int(to)]),
                Term::float(alpha),
            ],
        );
        self.request_topology(request).await
    }

    /// Generate a ring over vertex ids `from..=to`.
    pub async fn ring(&self, from: i32, to: i32) -> Result<Topology> {
        let request = Request::new(
            "topology",
            "ring",
            vec![Term::tuple(vec![Term::int(from), Term::int(to)])],
        );
        self.request_topology(request).await
    }

    async fn request_topology(&self, request: Request) -> Result<Topology> {
        let response = self.client.call(&request, CallTimeout::default()).await?;
        Topology::from_term(response.payload())
            .ok_or_else(|| WireError::Protocol(format!("malformed topology reply: {}", response.payload())))
    }
}
