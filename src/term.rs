//! The term model: a closed tagged union over every encodable value.
//!
//! A [`Term`] is a finite tree; tuples and lists own their elements and the
//! element order is significant. Construction helpers keep call sites short:
//!
//! ```
//! use termwire::Term;
//!
//! let term = Term::tuple(vec![Term::atom("ok"), Term::int(5)]);
//! assert_eq!(term.to_string(), "{ok, 5}");
//! ```

use std::fmt;

/// A value in the binary format's recursive tagged-union type.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Symbolic constant, e.g. `ok` or `error`.
    Atom(String),
    /// Signed 32-bit integer.
    Integer(i32),
    /// 64-bit IEEE-754 double.
    Float(f64),
    /// Byte string; distinct from [`Term::Atom`].
    Str(String),
    /// Ordered fixed-arity sequence.
    Tuple(Vec<Term>),
    /// Ordered sequence, terminated by an explicit nil marker on the wire.
    List(Vec<Term>),
    /// Reference to a remote callable.
    Export {
        module: String,
        function: String,
        arity: i32,
    },
}

impl Term {
    pub fn atom(name: impl Into<String>) -> Self {
        Term::Atom(name.into())
    }

    pub fn int(value: i32) -> Self {
        Term::Integer(value)
    }

    pub fn float(value: f64) -> Self {
        Term::Float(value)
    }

    pub fn str(value: impl Into<String>) -> Self {
        Term::Str(value.into())
    }

    pub fn tuple(elements: Vec<Term>) -> Self {
        Term::Tuple(elements)
    }

    pub fn list(elements: Vec<Term>) -> Self {
        Term::List(elements)
    }

    pub fn export(module: impl Into<String>, function: impl Into<String>, arity: i32) -> Self {
        Term::Export {
            module: module.into(),
            function: function.into(),
            arity,
        }
    }

    /// Atom text, if this term is an atom.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Term::Atom(name) => Some(name),
            _ => None,
        }
    }

    /// Integer value, if this term is an integer.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Term::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// String text, if this term is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Term::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Tuple elements, if this term is a tuple.
    pub fn as_tuple(&self) -> Option<&[Term]> {
        match self {
            Term::Tuple(elements) => Some(elements),
            _ => None,
        }
    }

    /// List elements, if this term is a list.
    pub fn as_list(&self) -> Option<&[Term]> {
        match self {
            Term::List(elements) => Some(elements),
            _ => None,
        }
    }

    /// Whether this term is the atom `name`.
    pub fn is_atom(&self, name: &str) -> bool {
        self.as_atom() == Some(name)
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, elements: &[Term]) -> fmt::Result {
    for (index, element) in elements.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{element}")?;
    }
    Ok(())
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(name) => write!(f, "{name}"),
            Term::Integer(value) => write!(f, "{value}"),
            Term::Float(value) => write!(f, "{value}"),
            Term::Str(value) => write!(f, "{value}"),
            Term::Tuple(elements) => {
                write!(f, "{{")?;
                write_joined(f, elements)?;
                write!(f, "}}")
            }
            Term::List(elements) => {
                write!(f, "[")?;
                write_joined(f, elements)?;
                write!(f, "]")
            }
            Term::Export {
                module,
                function,
                arity,
            } => write!(f, "{module}:{function}/{arity}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_scalars() {
        assert_eq!(Term::atom("ok").to_string(), "ok");
        assert_eq!(Term::int(-42).to_string(), "-42");
        assert_eq!(Term::float(2.5).to_string(), "2.5");
        assert_eq!(Term::str("hello").to_string(), "hello");
    }

    #[test]
    fn test_display_containers() {
        let tuple = Term::tuple(vec![Term::atom("error"), Term::atom("enoent")]);
        assert_eq!(tuple.to_string(), "{error, enoent}");

        let list = Term::list(vec![Term::int(1), Term::int(2), Term::int(3)]);
        assert_eq!(list.to_string(), "[1, 2, 3]");

        assert_eq!(Term::tuple(vec![]).to_string(), "{}");
        assert_eq!(Term::list(vec![]).to_string(), "[]");
    }

    #[test]
    fn test_display_nested() {
        let term = Term::tuple(vec![
            Term::int(1),
            Term::list(vec![Term::atom("a"), Term::tuple(vec![Term::int(2)])]),
        ]);
        assert_eq!(term.to_string(), "{1, [a, {2}]}");
    }

    #[test]
    fn test_display_export() {
        let term = Term::export("simulation", "start", 2);
        assert_eq!(term.to_string(), "simulation:start/2");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Term::atom("ok").as_atom(), Some("ok"));
        assert_eq!(Term::int(7).as_int(), Some(7));
        assert_eq!(Term::str("x").as_str(), Some("x"));
        assert_eq!(Term::atom("ok").as_int(), None);
        assert!(Term::atom("ok").is_atom("ok"));
        assert!(!Term::atom("ok").is_atom("error"));

        let tuple = Term::tuple(vec![Term::int(1)]);
        assert_eq!(tuple.as_tuple().map(<[Term]>::len), Some(1));
        assert_eq!(tuple.as_list(), None);
    }
}
