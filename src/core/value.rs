use crate::event::Event;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref ADDRESS_RE: Regex =
        Regex::new(r"^0[xX][0-9a-fA-F]{1,40}$").expect("address pattern is valid");
}

/// Hex account or contract address, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Parse a literal `0x…` address (1 to 40 hex digits), left-padded to
    /// full width so `0x1000` equals a deployed handle at that address.
    pub fn parse(text: &str) -> Option<Self> {
        if ADDRESS_RE.is_match(text) {
            Some(Self(format!("0x{:0>40}", text[2..].to_ascii_lowercase())))
        } else {
            None
        }
    }

    pub fn is_literal(text: &str) -> bool {
        ADDRESS_RE.is_match(text)
    }

    /// Full-width address derived from a sequence number.
    pub fn from_index(index: u64) -> Self {
        Self(format!("0x{:040x}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed value produced by a coercer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Nothing,
    Address(Address),
    Number(u128),
    Text(String),
    Bool(bool),
    List(Vec<Value>),
    Event(Event),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nothing => "Nothing",
            Self::Address(_) => "Address",
            Self::Number(_) => "Number",
            Self::Text(_) => "String",
            Self::Bool(_) => "Bool",
            Self::List(_) => "List",
            Self::Event(_) => "Event",
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            Self::Address(address) => Some(address),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<u128> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(event) => Some(event),
            _ => None,
        }
    }

    /// JSON form used in registry metadata. Numbers become decimal strings so
    /// 256-bit style amounts survive consumers limited to f64.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Nothing => serde_json::Value::Null,
            Self::Address(address) => serde_json::Value::String(address.to_string()),
            Self::Number(n) => serde_json::Value::String(n.to_string()),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Event(event) => serde_json::Value::String(event.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Nothing => write!(f, "Nothing"),
            Self::Address(address) => write!(f, "{}", address),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "\"{}\"", s),
            Self::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Self::List(items) => {
                let rendered: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Self::Event(event) => write!(f, "{}", event),
        }
    }
}
