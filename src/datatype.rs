// used to print out readable forms of a type
use std::fmt;

// pest is the parser used for type expressions
use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::error::{ContractError, Result};

// names every process can resolve without help from a type environment
pub const STRING: &str = "string";
pub const INTEGER: &str = "integer";
pub const FLOAT: &str = "float";
pub const BOOLEAN: &str = "boolean";
pub const NONE: &str = "none";
pub const ANY: &str = "any";
pub const LIST: &str = "list";
pub const TUPLE: &str = "tuple";
pub const DICT: &str = "dict";
pub const OPTIONAL: &str = "optional";

pub const BUILTIN_NAMES: [&str; 10] = [
    STRING, INTEGER, FLOAT, BOOLEAN, NONE, ANY, LIST, TUPLE, DICT, OPTIONAL,
];

/// Opaque handle for the semantic type of a value slot.
///
/// Checkers are looked up by [`TypeSpec::name`], so `list[integer]` shares the
/// checkers registered for `list`. An `Unresolved` handle is what a decoder keeps
/// when a type expression names something the current process does not know;
/// it never has checkers and never equals a resolved handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    Named(String),
    Generic { name: String, args: Vec<TypeSpec> },
    Unresolved(String),
}

impl TypeSpec {
    pub fn named(name: impl Into<String>) -> Self {
        TypeSpec::Named(name.into())
    }
    pub fn generic(name: impl Into<String>, args: Vec<TypeSpec>) -> Self {
        TypeSpec::Generic { name: name.into(), args }
    }
    pub fn string() -> Self {
        Self::named(STRING)
    }
    pub fn integer() -> Self {
        Self::named(INTEGER)
    }
    pub fn float() -> Self {
        Self::named(FLOAT)
    }
    pub fn boolean() -> Self {
        Self::named(BOOLEAN)
    }
    /// The key used for checker lookups, `None` for unresolved handles.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeSpec::Named(name) => Some(name),
            TypeSpec::Generic { name, .. } => Some(name),
            TypeSpec::Unresolved(_) => None,
        }
    }
    pub fn is_simple(&self) -> bool {
        matches!(self, TypeSpec::Named(_))
    }
    pub fn is_resolved(&self) -> bool {
        !matches!(self, TypeSpec::Unresolved(_))
    }
    /// Parses the structural form written by `Display`, e.g. `dict[string, list[integer]]`.
    ///
    /// A name is anything up to the next bracket or comma, so qualified names
    /// such as `std::path::PathBuf` or `file-path` read back unchanged.
    ///
    /// Every name must satisfy `resolves`. The first name that does not is
    /// returned as `Ok(Err(name))` so callers can fall back to a placeholder,
    /// while malformed text is a hard [`ContractError::Decode`].
    pub fn parse<F>(text: &str, resolves: F) -> Result<std::result::Result<TypeSpec, String>>
    where
        F: Fn(&str) -> bool,
    {
        let spec = TypeExpressionParser::parse(Rule::type_expression, text)
            .map_err(|e| decode_error(text, e))?
            .next()
            .and_then(|expression| expression.into_inner().find(|p| p.as_rule() == Rule::spec))
            .map(build)
            .ok_or_else(|| ContractError::Decode(format!("empty type expression `{}`", text)))?;
        match spec.first_unknown(&resolves) {
            Some(name) => Ok(Err(name)),
            None => Ok(Ok(spec)),
        }
    }
    /// The first name that would not read back from the structural form.
    pub fn first_inexpressible(&self) -> Option<&str> {
        match self {
            TypeSpec::Named(name) => (!is_expressible(name)).then_some(name.as_str()),
            TypeSpec::Generic { name, args } => {
                if !is_expressible(name) {
                    return Some(name.as_str());
                }
                args.iter().find_map(TypeSpec::first_inexpressible)
            }
            TypeSpec::Unresolved(_) => None,
        }
    }
    fn first_unknown<F: Fn(&str) -> bool>(&self, resolves: &F) -> Option<String> {
        match self {
            TypeSpec::Named(name) => (!resolves(name)).then(|| name.clone()),
            TypeSpec::Generic { name, args } => {
                if !resolves(name) {
                    return Some(name.clone());
                }
                args.iter().find_map(|arg| arg.first_unknown(resolves))
            }
            TypeSpec::Unresolved(text) => Some(text.clone()),
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeSpec::Named(name) => write!(f, "{}", name),
            TypeSpec::Generic { name, args } => {
                write!(f, "{}[", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, "]")
            }
            TypeSpec::Unresolved(text) => write!(f, "{}", text),
        }
    }
}

// ------------- Parser -------------
// pest does the tokenizing, the grammar lives next to this file
#[derive(Parser)]
#[grammar = "typespec.pest"]
struct TypeExpressionParser;

fn build(pair: Pair<Rule>) -> TypeSpec {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .map(|p| p.as_str().trim().to_string())
        .unwrap_or_default();
    let args: Vec<TypeSpec> = inner.map(build).collect();
    if args.is_empty() {
        TypeSpec::Named(name)
    } else {
        TypeSpec::Generic { name, args }
    }
}

fn decode_error(text: &str, e: pest::error::Error<Rule>) -> ContractError {
    let offset = match e.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    ContractError::Decode(format!(
        "{} at offset {} in type expression `{}`",
        e.variant.message(),
        offset,
        text
    ))
}

/// Whether `name` reads back as a single name in a type expression.
pub fn is_expressible(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && !name.contains(|c| matches!(c, '[' | ']' | ','))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_agree_on_nested_generics() {
        let spec = TypeSpec::generic(
            DICT,
            vec![TypeSpec::string(), TypeSpec::generic(LIST, vec![TypeSpec::integer()])],
        );
        let text = spec.to_string();
        assert_eq!(text, "dict[string, list[integer]]");
        let parsed = TypeSpec::parse(&text, |_| true).unwrap().unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn unknown_names_are_reported_not_failed() {
        let res = TypeSpec::parse("list[Widget]", |n| n == LIST).unwrap();
        assert_eq!(res, Err(String::from("Widget")));
    }

    #[test]
    fn malformed_expressions_are_decode_errors() {
        assert!(matches!(TypeSpec::parse("list[", |_| true), Err(ContractError::Decode(_))));
        assert!(matches!(TypeSpec::parse("list[]", |_| true), Err(ContractError::Decode(_))));
        assert!(matches!(TypeSpec::parse("list[a]b", |_| true), Err(ContractError::Decode(_))));
        assert!(matches!(TypeSpec::parse("", |_| true), Err(ContractError::Decode(_))));
    }

    #[test]
    fn names_run_up_to_brackets_and_commas() {
        let text = "dict[std::path::PathBuf, file-path]";
        let parsed = TypeSpec::parse(text, |_| true).unwrap().unwrap();
        assert_eq!(
            parsed,
            TypeSpec::generic(DICT, vec![TypeSpec::named("std::path::PathBuf"), TypeSpec::named("file-path")])
        );
        assert_eq!(parsed.to_string(), text);
        assert_eq!(TypeSpec::parse(" list [ integer ] ", |_| true).unwrap(), Ok(TypeSpec::generic(LIST, vec![TypeSpec::integer()])));
        assert!(is_expressible("std::path::PathBuf"));
        assert!(!is_expressible("list[int]"));
        assert!(!is_expressible(" padded"));
    }
}
