//! Callguard – function contracts: describe a callable's inputs, outputs and
//! side effects, then check calls against that description at runtime.
//!
//! The central pieces are:
//! * A [`value::ValueDesc`] describes one input parameter or output slot: a
//!   semantic type ([`datatype::TypeSpec`]), an optional range whose meaning
//!   depends on the type, an optional default ([`value::DefaultValue::NotDef`]
//!   when there is none), a name and a doc string.
//! * The [`checker::CheckerRegistry`] maps type names to a type predicate and a
//!   range predicate. Built-ins cover `string`, `integer`, `float` and
//!   `boolean`; the [`kinds`] module adds membership (`OneOf`), subset
//!   (`SubSet`) and path (`InputPath`, `OutputPath`) kinds.
//! * A [`description::Description`] holds the ordered inputs and outputs plus
//!   the [`side_effect::SideEffect`]s checked around a call, and binds call
//!   arguments to inputs without needing the live callable.
//! * A [`guard::Guard`] wraps a callable with a description and enforces it on
//!   every call, collecting every violation of a phase into one
//!   [`error::CheckError`].
//! * The [`serialize`] module writes a description to JSON and reads it back,
//!   tolerating type names the reading process does not know.
//! * The [`signature`] module is the adapter from a reflected signature plus
//!   attached marks to a description, and back.
//!
//! ## Runtime values
//! Arguments, defaults, ranges and results are `serde_json::Value`s, which is
//! also what the serialized form stores.
//!
//! ## Quick Start
//! ```
//! use callguard::{Args, ContractError, Description, Guard, TypeSpec, ValueDesc};
//! use serde_json::json;
//!
//! let description = Description::new(
//!     vec![
//!         ValueDesc::typed(TypeSpec::integer()).with_range(json!([0, 10])).with_name("a"),
//!         ValueDesc::typed(TypeSpec::integer()).with_range(json!([10, 20])).with_name("b"),
//!     ],
//!     vec![ValueDesc::typed(TypeSpec::integer()).with_name("sum")],
//! );
//! let add = Guard::new(description, |args: &Args| {
//!     let a = args.get(0).and_then(|v| v.as_i64()).unwrap_or_default();
//!     let b = args.get(1).or(args.get_keyword("b")).and_then(|v| v.as_i64()).unwrap_or_default();
//!     json!(a + b)
//! });
//! let sum = add.call(&Args::new().arg(json!(5)).arg(json!(11))).unwrap();
//! assert_eq!(sum.as_value(), Some(&json!(16)));
//! let err = add.call(&Args::new().arg(json!(-10)).arg(json!(1))).unwrap_err();
//! assert!(matches!(err, ContractError::Check(ref e) if e.len() == 2));
//! ```
//!
//! ## Registry
//! Checkers are registered process-wide at startup through
//! [`checker::CheckerRegistry::global`] and only read afterwards. Registering
//! while other threads check is not guarded against beyond the registry's
//! locks; register everything before the first guarded call.

pub mod bindings;
pub mod checker;
pub mod datatype;
pub mod description;
pub mod error;
pub mod guard;
pub mod kinds;
pub mod serialize;
pub mod settings;
pub mod side_effect;
pub mod signature;
pub mod value;

pub use bindings::{Args, Bindings, Key};
pub use checker::{CheckerRegistry, ValueKind};
pub use datatype::TypeSpec;
pub use description::Description;
pub use error::{BindingError, CheckError, ContractError, Phase, Result, Violation};
pub use guard::{Guard, Return};
pub use serialize::{Decoded, SerializationWarning, TypeEnv};
pub use settings::GuardConfig;
pub use side_effect::{Described, SideEffect, WriteFile};
pub use signature::{
    Annotation, Mark, MarkTable, MethodSignature, Parameter, ReturnAnnotation, Signature,
    SignatureSource, parse_signature,
};
pub use value::{DefaultValue, ValueDesc};
