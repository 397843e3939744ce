//! Primitive syntax tree to intermediate tree.
//!
//! The decoder resolves cache codes and turns `["^ ", k, v, ...]` arrays
//! back into maps. Tags are left untouched: inline strings and tagged pairs
//! are interpreted by the reader.

use crate::codec::cache::ReadCache;
use crate::codec::wire::Wire;
use crate::error::ReadError;
use crate::limits::MAP_AS_ARRAY;

/// A decoded node. Like [`Wire`], but map keys may be any node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Array(Vec<Node>),
    Map(Vec<(Node, Node)>),
}

impl Node {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Per-message decoding state.
#[derive(Debug, Default)]
pub struct Decoder {
    cache: ReadCache,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one message. Call once per message; the cache is not reset.
    pub fn decode(&mut self, wire: Wire) -> Result<Node, ReadError> {
        self.decode_node(wire, false)
    }

    fn decode_node(&mut self, wire: Wire, as_map_key: bool) -> Result<Node, ReadError> {
        Ok(match wire {
            Wire::Null => Node::Null,
            Wire::Bool(b) => Node::Bool(b),
            Wire::Int(i) => Node::Int(i),
            Wire::UInt(u) => Node::UInt(u),
            Wire::Float(f) => Node::Float(f),
            Wire::Str(s) => Node::Str(self.cache.decode(s, as_map_key)?),
            Wire::Array(items) => self.decode_array(items)?,
            Wire::Map(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    let key = self.decode_node(k, true)?;
                    pairs.push((key, self.decode_node(v, false)?));
                }
                Node::Map(pairs)
            }
        })
    }

    fn decode_array(&mut self, items: Vec<Wire>) -> Result<Node, ReadError> {
        let mut iter = items.into_iter();
        let first = match iter.next() {
            Some(first) => self.decode_node(first, false)?,
            None => return Ok(Node::Array(Vec::new())),
        };

        if first.as_str() == Some(MAP_AS_ARRAY) {
            let rest: Vec<Wire> = iter.collect();
            if rest.len() % 2 != 0 {
                return Err(ReadError::MalformedMapMarker { len: rest.len() });
            }
            let mut pairs = Vec::with_capacity(rest.len() / 2);
            let mut rest = rest.into_iter();
            while let (Some(k), Some(v)) = (rest.next(), rest.next()) {
                let key = self.decode_node(k, true)?;
                pairs.push((key, self.decode_node(v, false)?));
            }
            return Ok(Node::Map(pairs));
        }

        let mut out = Vec::with_capacity(iter.len() + 1);
        out.push(first);
        for item in iter {
            out.push(self.decode_node(item, false)?);
        }
        Ok(Node::Array(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: &str) -> Wire {
        Wire::from(x)
    }

    fn n(x: &str) -> Node {
        Node::Str(x.to_string())
    }

    #[test]
    fn test_map_as_array() {
        let wire = Wire::Array(vec![s("^ "), s("~:a"), Wire::Int(1), s("~i2"), s("two")]);
        assert_eq!(
            Decoder::new().decode(wire).unwrap(),
            Node::Map(vec![(n("~:a"), Node::Int(1)), (n("~i2"), n("two"))])
        );
    }

    #[test]
    fn test_odd_map_marker() {
        let wire = Wire::Array(vec![s("^ "), s("a"), Wire::Int(1), s("b")]);
        assert_eq!(
            Decoder::new().decode(wire),
            Err(ReadError::MalformedMapMarker { len: 3 })
        );
    }

    #[test]
    fn test_cache_codes_resolved() {
        let wire = Wire::Array(vec![
            Wire::Array(vec![s("^ "), s("this"), s("that")]),
            Wire::Array(vec![s("^ "), s("^0"), s("the other")]),
            Wire::Array(vec![s("~#ratio"), Wire::Array(vec![Wire::Int(1), Wire::Int(2)])]),
            Wire::Array(vec![s("^1"), Wire::Array(vec![])]),
        ]);
        let node = Decoder::new().decode(wire).unwrap();
        let Node::Array(items) = node else { panic!("expected array") };
        assert_eq!(items[1], Node::Map(vec![(n("this"), n("the other"))]));
        assert_eq!(items[3], Node::Array(vec![n("~#ratio"), Node::Array(vec![])]));
    }

    #[test]
    fn test_unassigned_code_fails() {
        let wire = Wire::Array(vec![s("^3")]);
        assert_eq!(
            Decoder::new().decode(wire),
            Err(ReadError::MalformedCacheCode { code: "^3".into() })
        );
    }

    #[test]
    fn test_verbose_map_keys_recorded() {
        let wire = Wire::Array(vec![
            Wire::Map(vec![(s("name"), s("a"))]),
            Wire::Array(vec![s("^ "), s("^0"), s("b")]),
        ]);
        let node = Decoder::new().decode(wire).unwrap();
        assert_eq!(
            node,
            Node::Array(vec![
                Node::Map(vec![(n("name"), n("a"))]),
                Node::Map(vec![(n("name"), n("b"))]),
            ])
        );
    }

    #[test]
    fn test_native_scalar_keys() {
        let wire = Wire::Array(vec![
            Wire::Map(vec![(Wire::Int(1), s("one")), (s("~:kwkey"), Wire::Null)]),
            Wire::Map(vec![(s("^0"), Wire::Int(2))]),
        ]);
        let node = Decoder::new().decode(wire).unwrap();
        assert_eq!(
            node,
            Node::Array(vec![
                Node::Map(vec![(Node::Int(1), n("one")), (n("~:kwkey"), Node::Null)]),
                Node::Map(vec![(n("~:kwkey"), Node::Int(2))]),
            ])
        );
    }

    #[test]
    fn test_escaped_marker_is_plain() {
        let wire = Wire::Array(vec![s("~^ "), s("x")]);
        assert_eq!(
            Decoder::new().decode(wire).unwrap(),
            Node::Array(vec![n("~^ "), n("x")])
        );
    }
}
