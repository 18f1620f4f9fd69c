use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Addresses a slot either by its position or by its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    /// Decimal text addresses a position, anything else a name.
    pub fn parse(text: &str) -> Key {
        match text.parse::<usize>() {
            Ok(i) => Key::Index(i),
            Err(_) => Key::Name(text.to_string()),
        }
    }
}
impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}
impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}
impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(name) => write!(f, "{}", name),
        }
    }
}

// ------------- Args -------------
/// The arguments of one call, as the caller wrote them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub positional: Vec<Value>,
    pub keyword: BTreeMap<String, Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn positional(values: Vec<Value>) -> Self {
        Self { positional: values, keyword: BTreeMap::new() }
    }
    pub fn arg(mut self, value: Value) -> Self {
        self.positional.push(value);
        self
    }
    pub fn kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.keyword.insert(name.into(), value);
        self
    }
    /// Same arguments with `receiver` in front, used when calling a bound method.
    pub fn with_receiver(&self, receiver: &Value) -> Args {
        let mut positional = Vec::with_capacity(self.positional.len() + 1);
        positional.push(receiver.clone());
        positional.extend(self.positional.iter().cloned());
        Args { positional, keyword: self.keyword.clone() }
    }
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }
    pub fn get_keyword(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }
}

// ------------- Bindings -------------
/// An ordered name -> value mapping, addressable by position and by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    entries: Vec<(String, Value)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entries.push((name.into(), value));
    }
    pub fn get(&self, key: &Key) -> Option<&Value> {
        match key {
            Key::Index(i) => self.entries.get(*i).map(|(_, v)| v),
            Key::Name(name) => self.by_name(name),
        }
    }
    pub fn by_name(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
    pub fn by_index(&self, index: usize) -> Option<&Value> {
        self.entries.get(index).map(|(_, v)| v)
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}

impl FromIterator<(String, Value)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}
