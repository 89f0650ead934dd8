//! A trie-based URI router.
//!
//! Routes are declared with URI templates such as `/users/:id(int)` or
//! `/posts[/:page=1(int)]`, compiled into a prefix tree, and matched against
//! the method, host, path and headers of incoming requests.
//!
//! ```
//! # use uri_router::{builder::RouteCollectionBuilder, RouteMatcher, TrieFactory, TrieRouteMatcher};
//! # use http::{HeaderMap, Method};
//! # fn main() -> Result<(), failure::Error> {
//! let factory = TrieFactory::new(|| {
//!     let mut builder = RouteCollectionBuilder::new();
//!     builder.get("/users/:id(int)").map_to("UserController", "show");
//!     builder.build()
//! });
//! let matcher = TrieRouteMatcher::from(factory.create_trie()?);
//!
//! let result = matcher.match_route(&Method::GET, "example.com", "/users/42", &HeaderMap::new());
//! assert!(result.match_found());
//! assert_eq!(result.route_variables["id"], "42");
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/uri-router/0.1.0-dev")]
#![warn(
    missing_docs,
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_idioms,
    rust_2018_compatibility,
    unused
)]

pub mod builder;
pub mod constraint;
pub mod error;
pub mod matcher;
pub mod route;
pub mod rule;
pub mod trie;

pub use crate::{
    builder::{RouteBuilder, RouteCollectionBuilder, RouteGroupOptions},
    constraint::{HttpMethodConstraint, RouteConstraint, RouteRequest},
    error::{Error, Result},
    matcher::{MatchedRouteCandidate, RouteMatcher, RouteMatchingResult, TrieRouteMatcher},
    route::{MiddlewareBinding, Route, RouteAction, RouteCollection, UriTemplate},
    rule::{Rule, RuleFactory},
    trie::{FileTrieCache, MemoryTrieCache, RouteFactory, TrieCache, TrieFactory, TrieNode},
};
