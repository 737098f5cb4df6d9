//! Request construction and response parsing.
//!
//! A request is the call term `{Ref, module:function/arity, [Args]}`; the
//! Ref is a fresh process-unique string minted at construction time and is
//! what the connection uses to pair the eventual response with its caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::term::Term;

static CALL_SEQ: AtomicU64 = AtomicU64::new(0);

/// Mint a process-unique correlation token.
///
/// A monotonic sequence number keeps concurrent refs distinct; the mixed-in
/// time/pid nonce keeps refs from separate process incarnations apart.
fn mint_ref() -> String {
    let seq = CALL_SEQ.fetch_add(1, Ordering::Relaxed);
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let nonce = nanos.wrapping_mul(0x517cc1b727220a95) ^ u64::from(std::process::id());
    format!("{seq:x}-{nonce:016x}")
}

/// One outgoing call: a target callable plus its argument terms.
///
/// Construction is pure apart from minting the Ref; nothing is written until
/// the request is handed to the connection.
#[derive(Debug, Clone)]
pub struct Request {
    reference: String,
    module: String,
    function: String,
    args: Vec<Term>,
}

impl Request {
    /// Build a request against `module:function`, with arity `args.len()`.
    pub fn new(module: impl Into<String>, function: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            reference: mint_ref(),
            module: module.into(),
            function: function.into(),
            args,
        }
    }

    /// The correlation token, for lookups and cancellation.
    pub fn ref_str(&self) -> &str {
        &self.reference
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn args(&self) -> &[Term] {
        &self.args
    }

    /// The call term as it goes on the wire.
    pub fn to_term(&self) -> Term {
        Term::Tuple(vec![
            Term::Str(self.reference.clone()),
            Term::Export {
                module: self.module.clone(),
                function: self.function.clone(),
                arity: self.args.len() as i32,
            },
            Term::List(self.args.clone()),
        ])
    }
}

/// One inbound reply: the originating request's Ref plus the payload term.
///
/// The Ref carries no meaning beyond correlation.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    reference: String,
    payload: Term,
}

impl Response {
    pub fn new(reference: impl Into<String>, payload: Term) -> Self {
        Self {
            reference: reference.into(),
            payload,
        }
    }

    /// Parse a decoded term into a response; `None` if the shape is not the
    /// expected `{Ref, Payload}` pair.
    pub fn from_term(term: Term) -> Option<Self> {
        if let Term::Tuple(elements) = term {
            if elements.len() == 2 {
                let mut elements = elements.into_iter();
                if let (Some(Term::Str(reference)), Some(payload)) =
                    (elements.next(), elements.next())
                {
                    return Some(Self { reference, payload });
                }
            }
        }
        None
    }

    pub fn ref_str(&self) -> &str {
        &self.reference
    }

    pub fn payload(&self) -> &Term {
        &self.payload
    }

    pub fn into_payload(self) -> Term {
        self.payload
    }

    /// The reply term as the backend would put it on the wire.
    pub fn to_term(&self) -> Term {
        Term::Tuple(vec![
            Term::Str(self.reference.clone()),
            self.payload.clone(),
        ])
    }
}
