//! Extension types whose representation is itself composite.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigInt;

use crate::model::{Uri, Value};

/// How a [`Link`] should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkRender {
    Link,
    Image,
}

impl LinkRender {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkRender::Link => "link",
            LinkRender::Image => "image",
        }
    }
}

impl FromStr for LinkRender {
    type Err = String;

    /// Case-insensitive; only `link` and `image` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "link" => Ok(LinkRender::Link),
            "image" => Ok(LinkRender::Image),
            _ => Err(format!("render must be either link or image, got {:?}", s)),
        }
    }
}

/// A hypermedia link (tag `link`).
///
/// Written as a map with keys `href`, `rel`, `name`, `render` and `prompt`;
/// absent optional fields are written as null.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub href: Uri,
    pub rel: String,
    pub name: Option<String>,
    pub render: Option<LinkRender>,
    pub prompt: Option<String>,
}

impl Link {
    /// Creates a link with only the required fields.
    pub fn new(href: Uri, rel: impl Into<String>) -> Self {
        Self {
            href,
            rel: rel.into(),
            name: None,
            render: None,
            prompt: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_render(mut self, render: LinkRender) -> Self {
        self.render = Some(render);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Returns the map representation written on the wire.
    pub fn to_map(&self) -> Value {
        Value::Map(vec![
            (Value::from("href"), Value::Uri(self.href.clone())),
            (Value::from("rel"), Value::from(self.rel.as_str())),
            (Value::from("name"), Value::from(self.name.clone())),
            (Value::from("render"), Value::from(self.render.map(LinkRender::as_str))),
            (Value::from("prompt"), Value::from(self.prompt.clone())),
        ])
    }

    /// Rebuilds a link from its map representation.
    ///
    /// `href` may be a URI or a plain string; `rel` is required.
    pub fn from_map(rep: &Value) -> Result<Self, String> {
        let pairs = rep.as_map().ok_or("link representation must be a map")?;
        let field = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v)
                .filter(|v| !v.is_null())
        };
        let optional_string = |key: &str| -> Result<Option<String>, String> {
            match field(key) {
                None => Ok(None),
                Some(Value::String(s)) => Ok(Some(s.clone())),
                Some(other) => Err(format!("link {} must be a string, got {}", key, other.type_name())),
            }
        };

        let href = match field("href") {
            Some(Value::Uri(uri)) => uri.clone(),
            Some(Value::String(s)) => Uri::new(s.as_str()),
            Some(other) => return Err(format!("link href must be a URI, got {}", other.type_name())),
            None => return Err("link href is required".to_string()),
        };
        let rel = optional_string("rel")?.ok_or("link rel is required")?;
        let render = optional_string("render")?
            .map(|s| s.parse::<LinkRender>())
            .transpose()?;

        Ok(Self {
            href,
            rel,
            name: optional_string("name")?,
            render,
            prompt: optional_string("prompt")?,
        })
    }
}

/// A rational number (tag `ratio`), carried as a numerator/denominator pair.
///
/// The pair is kept as given; no reduction is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ratio {
    pub numerator: BigInt,
    pub denominator: BigInt,
}

impl Ratio {
    pub fn new(numerator: impl Into<BigInt>, denominator: impl Into<BigInt>) -> Self {
        Self {
            numerator: numerator.into(),
            denominator: denominator.into(),
        }
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A tag and representation with no more specific type.
///
/// Returned by the reader for tags that have no registered read handler, and
/// usable by callers to write an arbitrary tag directly.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedValue {
    pub tag: String,
    pub rep: Value,
}

impl TaggedValue {
    pub fn new(tag: impl Into<String>, rep: impl Into<Value>) -> Self {
        Self {
            tag: tag.into(),
            rep: rep.into(),
        }
    }
}
