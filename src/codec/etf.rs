//! External term format encoding and decoding.
//!
//! All multi-byte integers are Big Endian. Every buffer begins with the
//! version marker byte (131), followed by exactly one tagged term.
//!
//! Recursion in both directions is bounded by a depth limit so that
//! adversarial input exhausts neither the stack nor patience; exceeding it
//! is an error, not a crash.

use crate::error::{DecodeError, EncodeError};
use crate::term::Term;

/// Version marker prefixed to every encoded term.
pub const VERSION: u8 = 131;

/// Default bound on term nesting for both encode and decode.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Tag bytes of the wire format.
pub mod tag {
    pub const NEW_FLOAT: u8 = 70;
    pub const SMALL_INTEGER: u8 = 97;
    pub const INTEGER: u8 = 98;
    pub const SMALL_TUPLE: u8 = 104;
    pub const LARGE_TUPLE: u8 = 105;
    pub const NIL: u8 = 106;
    pub const STRING: u8 = 107;
    pub const LIST: u8 = 108;
    pub const EXPORT: u8 = 113;
    pub const ATOM_UTF8: u8 = 118;
    pub const SMALL_ATOM_UTF8: u8 = 119;
}

/// Encode a term, prefixed with the version marker.
pub fn encode(term: &Term) -> Result<Vec<u8>, EncodeError> {
    encode_with_depth(term, DEFAULT_MAX_DEPTH)
}

/// Encode with a custom nesting bound.
pub fn encode_with_depth(term: &Term, max_depth: usize) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::with_capacity(64);
    buf.push(VERSION);
    encode_term(term, &mut buf, max_depth)?;
    Ok(buf)
}

fn encode_term(term: &Term, buf: &mut Vec<u8>, depth: usize) -> Result<(), EncodeError> {
    if depth == 0 {
        return Err(EncodeError::DepthLimit);
    }
    match term {
        Term::Atom(name) => encode_atom(name, buf),
        Term::Integer(value) => {
            encode_integer(*value, buf);
            Ok(())
        }
        Term::Float(value) => {
            buf.push(tag::NEW_FLOAT);
            buf.extend_from_slice(&value.to_be_bytes());
            Ok(())
        }
        Term::Str(value) => encode_string(value, buf, depth),
        Term::Tuple(elements) => {
            if elements.len() <= 0xFF {
                buf.push(tag::SMALL_TUPLE);
                buf.push(elements.len() as u8);
            } else {
                let arity = u32::try_from(elements.len())
                    .map_err(|_| EncodeError::TooManyElements(elements.len()))?;
                buf.push(tag::LARGE_TUPLE);
                buf.extend_from_slice(&arity.to_be_bytes());
            }
            for element in elements {
                encode_term(element, buf, depth - 1)?;
            }
            Ok(())
        }
        Term::List(elements) => encode_list(elements, buf, depth),
        Term::Export {
            module,
            function,
            arity,
        } => {
            buf.push(tag::EXPORT);
            encode_atom(module, buf)?;
            encode_atom(function, buf)?;
            encode_integer(*arity, buf);
            Ok(())
        }
    }
}

fn encode_atom(name: &str, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    let bytes = name.as_bytes();
    if bytes.len() <= 0xFF {
        buf.push(tag::SMALL_ATOM_UTF8);
        buf.push(bytes.len() as u8);
    } else if bytes.len() <= 0xFFFF {
        buf.push(tag::ATOM_UTF8);
        buf.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    } else {
        return Err(EncodeError::AtomTooLong(bytes.len()));
    }
    buf.extend_from_slice(bytes);
    Ok(())
}

fn encode_integer(value: i32, buf: &mut Vec<u8>) {
    if (0..=255).contains(&value) {
        buf.push(tag::SMALL_INTEGER);
        buf.push(value as u8);
    } else {
        buf.push(tag::INTEGER);
        buf.extend_from_slice(&value.to_be_bytes());
    }
}

fn encode_string(value: &str, buf: &mut Vec<u8>, depth: usize) -> Result<(), EncodeError> {
    let bytes = value.as_bytes();
    if bytes.len() <= 0xFFFF {
        buf.push(tag::STRING);
        buf.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        buf.extend_from_slice(bytes);
        return Ok(());
    }
    // The format has no large-string tag; fall back to a list of per-character
    // code points.
    let code_points: Vec<Term> = value.chars().map(|c| Term::Integer(c as i32)).collect();
    encode_list(&code_points, buf, depth)
}

fn encode_list(elements: &[Term], buf: &mut Vec<u8>, depth: usize) -> Result<(), EncodeError> {
    let count =
        u32::try_from(elements.len()).map_err(|_| EncodeError::TooManyElements(elements.len()))?;
    buf.push(tag::LIST);
    buf.extend_from_slice(&count.to_be_bytes());
    for element in elements {
        encode_term(element, buf, depth - 1)?;
    }
    // Proper lists carry an explicit terminator, the empty list included.
    buf.push(tag::NIL);
    Ok(())
}

/// Decode one term from a buffer that starts with the version marker.
///
/// Consumes the whole buffer: trailing bytes after the outermost term are an
/// error, as is a truncated payload.
pub fn decode(data: &[u8]) -> Result<Term, DecodeError> {
    decode_with_depth(data, DEFAULT_MAX_DEPTH)
}

/// Decode with a custom nesting bound.
pub fn decode_with_depth(data: &[u8], max_depth: usize) -> Result<Term, DecodeError> {
    let mut reader = Reader::new(data);
    let version = reader.take_u8()?;
    if version != VERSION {
        return Err(DecodeError::BadVersion(version));
    }
    let term = decode_term(&mut reader, max_depth)?;
    if reader.remaining() != 0 {
        return Err(DecodeError::TrailingBytes(reader.remaining()));
    }
    Ok(term)
}

/// Offset cursor over the input buffer; every read is bounds-checked.
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::Truncated);
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn take_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take_bytes(1)?[0])
    }

    fn take_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn take_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.take_u32()? as i32)
    }

    fn take_f64(&mut self) -> Result<f64, DecodeError> {
        let bytes = self.take_bytes(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(f64::from_be_bytes(raw))
    }

    fn take_str(&mut self, len: usize) -> Result<&'a str, DecodeError> {
        std::str::from_utf8(self.take_bytes(len)?).map_err(|_| DecodeError::InvalidUtf8)
    }
}

fn decode_term(reader: &mut Reader<'_>, depth: usize) -> Result<Term, DecodeError> {
    if depth == 0 {
        return Err(DecodeError::DepthLimit);
    }
    let tag_byte = reader.take_u8()?;
    match tag_byte {
        tag::SMALL_ATOM_UTF8 => {
            let len = reader.take_u8()? as usize;
            Ok(Term::Atom(reader.take_str(len)?.to_owned()))
        }
        tag::ATOM_UTF8 => {
            let len = reader.take_u16()? as usize;
            Ok(Term::Atom(reader.take_str(len)?.to_owned()))
        }
        tag::SMALL_INTEGER => Ok(Term::Integer(reader.take_u8()? as i32)),
        tag::INTEGER => Ok(Term::Integer(reader.take_i32()?)),
        tag::NEW_FLOAT => Ok(Term::Float(reader.take_f64()?)),
        tag::STRING => {
            let len = reader.take_u16()? as usize;
            Ok(Term::Str(reader.take_str(len)?.to_owned()))
        }
        tag::SMALL_TUPLE => {
            let arity = reader.take_u8()? as usize;
            Ok(Term::Tuple(decode_elements(reader, arity, depth)?))
        }
        tag::LARGE_TUPLE => {
            let arity = reader.take_u32()? as usize;
            Ok(Term::Tuple(decode_elements(reader, arity, depth)?))
        }
        tag::LIST => {
            let count = reader.take_u32()? as usize;
            let elements = decode_elements(reader, count, depth)?;
            let terminator = reader.take_u8().map_err(|_| DecodeError::ImproperList)?;
            if terminator != tag::NIL {
                return Err(DecodeError::ImproperList);
            }
            Ok(Term::List(elements))
        }
        tag::EXPORT => {
            let module = match decode_term(reader, depth - 1)? {
                Term::Atom(module) => module,
                _ => return Err(DecodeError::MalformedExport),
            };
            let function = match decode_term(reader, depth - 1)? {
                Term::Atom(function) => function,
                _ => return Err(DecodeError::MalformedExport),
            };
            let arity = match decode_term(reader, depth - 1)? {
                Term::Integer(arity) => arity,
                _ => return Err(DecodeError::MalformedExport),
            };
            Ok(Term::Export {
                module,
                function,
                arity,
            })
        }
        other => Err(DecodeError::UnknownTag(other)),
    }
}

fn decode_elements(
    reader: &mut Reader<'_>,
    count: usize,
    depth: usize,
) -> Result<Vec<Term>, DecodeError> {
    // Count fields come off the wire; cap the preallocation.
    let mut elements = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        elements.push(decode_term(reader, depth - 1)?);
    }
    Ok(elements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(term: Term) {
        let encoded = encode(&term).unwrap();
        assert_eq!(decode(&encoded).unwrap(), term, "roundtrip of {term}");
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(encode(&Term::atom("ok")).unwrap(), vec![131, 119, 2, 111, 107]);
        assert_eq!(encode(&Term::int(5)).unwrap(), vec![131, 97, 5]);
        assert_eq!(
            encode(&Term::list(vec![])).unwrap(),
            vec![131, 108, 0, 0, 0, 0, 106]
        );
    }

    #[test]
    fn test_integer_representation_switch() {
        assert_eq!(encode(&Term::int(0)).unwrap(), vec![131, 97, 0]);
        assert_eq!(encode(&Term::int(255)).unwrap(), vec![131, 97, 255]);
        assert_eq!(encode(&Term::int(256)).unwrap(), vec![131, 98, 0, 0, 1, 0]);
        // Negative values take the 4-byte form; no sign-extension surprises.
        assert_eq!(
            encode(&Term::int(-1)).unwrap(),
            vec![131, 98, 255, 255, 255, 255]
        );
        roundtrip(Term::int(i32::MIN));
        roundtrip(Term::int(i32::MAX));
        roundtrip(Term::int(-1));
    }

    #[test]
    fn test_float_bit_exact() {
        for value in [0.0, -0.0, 1.5, -123.456, f64::MIN_POSITIVE, f64::MAX] {
            let encoded = encode(&Term::float(value)).unwrap();
            assert_eq!(encoded[1], tag::NEW_FLOAT);
            match decode(&encoded).unwrap() {
                Term::Float(decoded) => assert_eq!(decoded.to_bits(), value.to_bits()),
                other => panic!("expected float, got {other}"),
            }
        }
    }

    #[test]
    fn test_atom_representation_switch() {
        let short = "a".repeat(255);
        let encoded = encode(&Term::atom(&short)).unwrap();
        assert_eq!(encoded[1], tag::SMALL_ATOM_UTF8);
        roundtrip(Term::atom(short));

        let long = "a".repeat(256);
        let encoded = encode(&Term::atom(&long)).unwrap();
        assert_eq!(encoded[1], tag::ATOM_UTF8);
        assert_eq!(&encoded[2..4], &[1, 0]);
        roundtrip(Term::atom(long));

        let oversized = "a".repeat(0x1_0000);
        assert_eq!(
            encode(&Term::atom(&oversized)),
            Err(EncodeError::AtomTooLong(0x1_0000))
        );
    }

    #[test]
    fn test_atom_length_counts_utf8_bytes() {
        // Two-byte characters: 127 of them still fit the 1-byte length field,
        // 128 of them (256 bytes) no longer do.
        let atom = "é".repeat(127);
        let encoded = encode(&Term::atom(&atom)).unwrap();
        assert_eq!(encoded[1], tag::SMALL_ATOM_UTF8);
        assert_eq!(encoded[2], 254);
        roundtrip(Term::atom(atom));

        let wide = "é".repeat(128);
        let encoded = encode(&Term::atom(&wide)).unwrap();
        assert_eq!(encoded[1], tag::ATOM_UTF8);
        roundtrip(Term::atom(wide));
    }

    #[test]
    fn test_tuple_representation_switch() {
        let small = Term::tuple(vec![Term::int(0); 255]);
        let encoded = encode(&small).unwrap();
        assert_eq!(encoded[1], tag::SMALL_TUPLE);
        assert_eq!(encoded[2], 255);
        roundtrip(small);

        let large = Term::tuple(vec![Term::int(0); 256]);
        let encoded = encode(&large).unwrap();
        assert_eq!(encoded[1], tag::LARGE_TUPLE);
        assert_eq!(&encoded[2..6], &[0, 0, 1, 0]);
        roundtrip(large);
    }

    #[test]
    fn test_string_representation_switch() {
        let max = "x".repeat(0xFFFF);
        let encoded = encode(&Term::str(&max)).unwrap();
        assert_eq!(encoded[1], tag::STRING);
        roundtrip(Term::str(max));

        // One past the 2-byte length field: re-encoded as a list of code
        // points, so the string identity is not preserved through decode.
        let over = "x".repeat(0x1_0000);
        let encoded = encode(&Term::str(&over)).unwrap();
        assert_eq!(encoded[1], tag::LIST);
        match decode(&encoded).unwrap() {
            Term::List(elements) => {
                assert_eq!(elements.len(), 0x1_0000);
                assert_eq!(elements[0], Term::Integer('x' as i32));
            }
            other => panic!("expected list, got {other}"),
        }
    }

    #[test]
    fn test_string_roundtrip() {
        roundtrip(Term::str(""));
        roundtrip(Term::str("hello world"));
        roundtrip(Term::str("päivää"));
    }

    #[test]
    fn test_export_roundtrip() {
        let term = Term::export("topology", "random", 2);
        let encoded = encode(&term).unwrap();
        assert_eq!(encoded[1], tag::EXPORT);
        roundtrip(term);
    }

    #[test]
    fn test_nested_roundtrip() {
        let term = Term::tuple(vec![
            Term::str("ref-1"),
            Term::export("simulation", "start", 2),
            Term::list(vec![
                Term::int(1),
                Term::tuple(vec![
                    Term::atom("node"),
                    Term::list(vec![
                        Term::float(0.5),
                        Term::tuple(vec![Term::list(vec![Term::int(-7)])]),
                    ]),
                ]),
            ]),
        ]);
        roundtrip(term);
    }

    #[test]
    fn test_empty_containers() {
        roundtrip(Term::tuple(vec![]));
        roundtrip(Term::list(vec![]));
        roundtrip(Term::atom(""));
    }

    #[test]
    fn test_decode_rejects_bad_version() {
        assert_eq!(decode(&[130, 97, 5]), Err(DecodeError::BadVersion(130)));
        assert_eq!(decode(&[]), Err(DecodeError::Truncated));
    }

    #[test]
    fn test_decode_rejects_unknown_tag() {
        assert_eq!(decode(&[131, 42]), Err(DecodeError::UnknownTag(42)));
        // A bare nil outside a list terminator position is likewise unknown.
        assert_eq!(decode(&[131, 106]), Err(DecodeError::UnknownTag(106)));
    }

    #[test]
    fn test_decode_rejects_improper_list() {
        let mut encoded = encode(&Term::list(vec![Term::int(1)])).unwrap();
        // Altered terminator.
        let last = encoded.len() - 1;
        encoded[last] = 0;
        assert_eq!(decode(&encoded), Err(DecodeError::ImproperList));
        // Omitted terminator.
        encoded.truncate(last);
        assert_eq!(decode(&encoded), Err(DecodeError::ImproperList));
    }

    #[test]
    fn test_decode_rejects_truncated_input() {
        let encoded = encode(&Term::tuple(vec![Term::int(300), Term::atom("ok")])).unwrap();
        for len in 2..encoded.len() {
            assert!(
                decode(&encoded[..len]).is_err(),
                "prefix of {len} bytes should not decode"
            );
        }
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut encoded = encode(&Term::int(5)).unwrap();
        encoded.extend_from_slice(&[97, 6]);
        assert_eq!(decode(&encoded), Err(DecodeError::TrailingBytes(2)));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        // SMALL_ATOM_UTF8 of length 1 with a continuation byte.
        assert_eq!(decode(&[131, 119, 1, 0xFF]), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_depth_limit() {
        let mut term = Term::int(0);
        for _ in 0..40 {
            term = Term::list(vec![term]);
        }
        let encoded = encode_with_depth(&term, 64).unwrap();
        assert_eq!(decode_with_depth(&encoded, 64).unwrap(), term);
        assert_eq!(
            decode_with_depth(&encoded, 40),
            Err(DecodeError::DepthLimit)
        );
        assert_eq!(
            encode_with_depth(&term, 40),
            Err(EncodeError::DepthLimit)
        );
    }

    #[test]
    fn test_decode_huge_claimed_count_is_truncated_not_oom() {
        // List header claiming u32::MAX elements with no payload.
        let data = [131, 108, 255, 255, 255, 255];
        assert_eq!(decode(&data), Err(DecodeError::Truncated));
    }
}
