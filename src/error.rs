//! Error types used throughout the router.
//!
//! Every error is raised while the route table is being declared or compiled.
//! A request which no route matches is not an error; it is reported by a
//! `RouteMatchingResult` whose `match_found()` is `false`.

pub use {
    crate::rule::RuleError,
    failure::Error,
    uri_router_template::{Error as TemplateError, ErrorKind as TemplateErrorKind},
};

/// A type alias of `Result<T, E>` whose error type is restricted to `failure::Error`.
pub type Result<T> = std::result::Result<T, Error>;
