//! Constraints evaluated against structurally matched routes.

use {
    crate::{error::Result, matcher::MatchedRouteCandidate},
    http::{HeaderMap, Method},
    indexmap::{IndexMap, IndexSet},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::{fmt, sync::Arc},
};

/// The request tuple a route is matched against.
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest<'a> {
    /// The request method.
    pub method: &'a Method,
    /// The host of the request, without the port.
    pub host: &'a str,
    /// The path of the request, without the query.
    pub path: &'a str,
    /// The request headers.
    pub headers: &'a HeaderMap,
}

/// A trait representing a predicate which may veto a matched candidate.
///
/// Constraints are evaluated in the order they were attached to the route, and
/// the first failing one eliminates the candidate.
pub trait RouteConstraint: fmt::Debug + Send + Sync + 'static {
    /// Returns whether the candidate may be selected for the request.
    fn passes(&self, candidate: &MatchedRouteCandidate, request: &RouteRequest<'_>) -> bool;

    /// Returns the set of methods accepted by this constraint.
    ///
    /// When a constraint returning `Some` fails, its methods are collected
    /// into the `Allow` set of the matching result.
    fn allowed_methods(&self) -> Option<&IndexSet<Method>> {
        None
    }

    /// Returns a serializable description of this constraint, used to store it
    /// in a persistent trie cache.
    fn descriptor(&self) -> Option<ConstraintDescriptor> {
        None
    }
}

/// The serializable description of a constraint, restored through a `ConstraintFactory`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintDescriptor {
    /// The slug under which the constructor is registered.
    pub slug: String,
    /// The configuration passed to the constructor.
    pub config: Value,
}

/// A constraint which checks the request method against the methods of the route.
#[derive(Debug, Clone)]
pub struct HttpMethodConstraint {
    methods: IndexSet<Method>,
}

impl HttpMethodConstraint {
    /// The slug of the descriptor of this constraint.
    pub const SLUG: &'static str = "http-method";

    /// Creates a constraint accepting the given methods.
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        Self {
            methods: methods.into_iter().collect(),
        }
    }

    /// Returns the accepted methods.
    pub fn methods(&self) -> &IndexSet<Method> {
        &self.methods
    }
}

impl RouteConstraint for HttpMethodConstraint {
    fn passes(&self, _: &MatchedRouteCandidate, request: &RouteRequest<'_>) -> bool {
        self.methods.contains(request.method)
    }

    fn allowed_methods(&self) -> Option<&IndexSet<Method>> {
        Some(&self.methods)
    }

    fn descriptor(&self) -> Option<ConstraintDescriptor> {
        Some(ConstraintDescriptor {
            slug: Self::SLUG.into(),
            config: Value::Array(
                self.methods
                    .iter()
                    .map(|m| Value::String(m.as_str().into()))
                    .collect(),
            ),
        })
    }
}

type Constructor =
    dyn Fn(&Value) -> Result<Arc<dyn RouteConstraint>> + Send + Sync + 'static;

/// A registry which restores constraints from their descriptors.
#[derive(Clone)]
pub struct ConstraintFactory {
    constructors: IndexMap<String, Arc<Constructor>>,
}

impl fmt::Debug for ConstraintFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintFactory")
            .field("slugs", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ConstraintFactory {
    fn default() -> Self {
        let mut factory = Self {
            constructors: IndexMap::new(),
        };
        factory.register(HttpMethodConstraint::SLUG, |config| {
            let methods = match config {
                Value::Array(methods) => methods
                    .iter()
                    .map(|m| -> Result<Method> {
                        match m {
                            Value::String(m) => Ok(m.parse::<Method>()?),
                            m => failure::bail!("invalid method in constraint config: {}", m),
                        }
                    })
                    .collect::<Result<Vec<_>>>()?,
                config => failure::bail!("invalid http-method constraint config: {}", config),
            };
            Ok(Arc::new(HttpMethodConstraint::new(methods)) as Arc<dyn RouteConstraint>)
        });
        factory
    }
}

impl ConstraintFactory {
    /// Registers a constructor for the slug, replacing any previous one.
    pub fn register<F>(&mut self, slug: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<Arc<dyn RouteConstraint>> + Send + Sync + 'static,
    {
        self.constructors.insert(slug.into(), Arc::new(constructor));
        self
    }

    /// Restores a constraint from its descriptor.
    pub fn create(&self, descriptor: &ConstraintDescriptor) -> Result<Arc<dyn RouteConstraint>> {
        let constructor = self.constructors.get(&descriptor.slug).ok_or_else(|| {
            failure::format_err!(
                "no constraint factory is registered for slug \"{}\"",
                descriptor.slug
            )
        })?;
        constructor(&descriptor.config)
    }
}
