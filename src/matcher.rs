//! Matching of incoming requests against the compiled trie.

use {
    crate::{
        constraint::RouteRequest,
        route::Route,
        trie::{RouteVariables, TrieNode},
    },
    http::{header::HeaderValue, HeaderMap, Method},
    indexmap::IndexSet,
    std::sync::Arc,
};

/// A route reached by the trie descent, before its constraints are evaluated.
#[derive(Debug, Clone)]
pub struct MatchedRouteCandidate {
    /// The reached route.
    pub route: Arc<Route>,
    /// The values bound while descending to the route.
    pub route_variables: RouteVariables,
}

/// The outcome of matching a request.
///
/// Not finding a route is represented by this value rather than an error.
#[derive(Debug, Clone, Default)]
pub struct RouteMatchingResult {
    /// The selected route, if any.
    pub route: Option<Arc<Route>>,
    /// The values bound to the variables of the selected route.
    pub route_variables: RouteVariables,
    /// The methods accepted by the routes whose path matched, when none was selected.
    pub allowed_methods: IndexSet<Method>,
}

impl RouteMatchingResult {
    fn found(candidate: MatchedRouteCandidate) -> Self {
        Self {
            route: Some(candidate.route),
            route_variables: candidate.route_variables,
            allowed_methods: IndexSet::new(),
        }
    }

    fn not_found(allowed_methods: IndexSet<Method>) -> Self {
        Self {
            route: None,
            route_variables: RouteVariables::new(),
            allowed_methods,
        }
    }

    /// Returns whether a route was selected.
    pub fn match_found(&self) -> bool {
        self.route.is_some()
    }

    /// Returns `Some(true)` if a route matched, `Some(false)` if the path
    /// matched but the method did not, and `None` if nothing matched the path.
    pub fn method_is_allowed(&self) -> Option<bool> {
        if self.match_found() {
            Some(true)
        } else if self.allowed_methods.is_empty() {
            None
        } else {
            Some(false)
        }
    }

    /// Renders the value of the `Allow` header of a 405 response.
    pub fn allow_header(&self) -> Option<HeaderValue> {
        if self.method_is_allowed() != Some(false) {
            return None;
        }
        let methods: Vec<_> = self.allowed_methods.iter().map(Method::as_str).collect();
        HeaderValue::from_str(&methods.join(", ")).ok()
    }
}

/// A trait representing a router which maps a request to a route.
pub trait RouteMatcher {
    /// Returns the first candidate which passes all of its constraints.
    fn match_route(
        &self,
        method: &Method,
        host: &str,
        path: &str,
        headers: &HeaderMap,
    ) -> RouteMatchingResult;
}

/// A `RouteMatcher` which walks a compiled `TrieNode`.
#[derive(Debug, Clone)]
pub struct TrieRouteMatcher {
    trie: Arc<TrieNode>,
}

impl From<TrieNode> for TrieRouteMatcher {
    fn from(trie: TrieNode) -> Self {
        Self::new(Arc::new(trie))
    }
}

impl TrieRouteMatcher {
    /// Creates a matcher over a shared trie.
    pub fn new(trie: Arc<TrieNode>) -> Self {
        Self { trie }
    }

    /// Returns the trie this matcher walks.
    pub fn trie(&self) -> &Arc<TrieNode> {
        &self.trie
    }

    /// Returns an iterator over the routes structurally matching the host and
    /// path, in the order they are tried.
    pub fn candidates<'a>(&'a self, host: &'a str, path: &'a str) -> Candidates<'a> {
        Candidates::new(&self.trie, host, path)
    }
}

impl RouteMatcher for TrieRouteMatcher {
    fn match_route(
        &self,
        method: &Method,
        host: &str,
        path: &str,
        headers: &HeaderMap,
    ) -> RouteMatchingResult {
        let request = RouteRequest {
            method,
            host,
            path,
            headers,
        };
        let mut allowed_methods = IndexSet::new();

        'candidates: for candidate in self.candidates(host, path) {
            for constraint in candidate.route.constraints() {
                if !constraint.passes(&candidate, &request) {
                    log::trace!("route `{}` rejected by {:?}", candidate.route, constraint);
                    if let Some(methods) = constraint.allowed_methods() {
                        allowed_methods.extend(methods.iter().cloned());
                    }
                    continue 'candidates;
                }
            }

            log::trace!("{} {}{} matched `{}`", method, host, path, candidate.route);
            return RouteMatchingResult::found(candidate);
        }

        log::trace!("{} {}{} matched no route", method, host, path);
        RouteMatchingResult::not_found(allowed_methods)
    }
}

#[derive(Debug)]
enum Frame<'a> {
    /// Descends into a node with the segment at `index`.
    Descend {
        node: &'a TrieNode,
        in_host: bool,
        index: usize,
        variables: RouteVariables,
    },
    /// Tests the remaining variable children of a node.
    Variables {
        node: &'a TrieNode,
        in_host: bool,
        index: usize,
        child: usize,
        variables: RouteVariables,
    },
    /// Yields the remaining routes terminal at a node.
    Routes {
        routes: &'a [Arc<Route>],
        pos: usize,
        variables: RouteVariables,
    },
}

/// A lazy, depth-first enumeration of the candidates.
///
/// A literal child is always visited before the variable children of the same
/// node, and variable children are visited in declaration order. At a node
/// terminating a path, the host trie is visited before the routes without a
/// host template.
#[derive(Debug)]
pub struct Candidates<'a> {
    path: Vec<&'a str>,
    host: Vec<&'a str>,
    stack: Vec<Frame<'a>>,
}

impl<'a> Candidates<'a> {
    fn new(trie: &'a TrieNode, host: &'a str, path: &'a str) -> Self {
        let path = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let host = host
            .split('.')
            .filter(|s| !s.is_empty())
            .rev()
            .collect();
        Self {
            path,
            host,
            stack: vec![Frame::Descend {
                node: trie,
                in_host: false,
                index: 0,
                variables: RouteVariables::new(),
            }],
        }
    }

    fn segments(&self, in_host: bool) -> &[&'a str] {
        if in_host {
            &self.host[..]
        } else {
            &self.path[..]
        }
    }
}

impl<'a> Iterator for Candidates<'a> {
    type Item = MatchedRouteCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Descend {
                    node,
                    in_host,
                    index,
                    variables,
                } => {
                    let segment = self.segments(in_host).get(index).cloned();
                    match segment {
                        None => {
                            if !node.routes().is_empty() {
                                self.stack.push(Frame::Routes {
                                    routes: node.routes(),
                                    pos: 0,
                                    variables: variables.clone(),
                                });
                            }
                            if let (false, Some(host_trie)) = (in_host, node.host_trie()) {
                                self.stack.push(Frame::Descend {
                                    node: host_trie,
                                    in_host: true,
                                    index: 0,
                                    variables,
                                });
                            }
                        }
                        Some(segment) => {
                            if !node.variable_children().is_empty() {
                                self.stack.push(Frame::Variables {
                                    node,
                                    in_host,
                                    index,
                                    child: 0,
                                    variables: variables.clone(),
                                });
                            }
                            if let Some(child) = node.literal_child(segment) {
                                self.stack.push(Frame::Descend {
                                    node: child,
                                    in_host,
                                    index: index + 1,
                                    variables,
                                });
                            }
                        }
                    }
                }

                Frame::Variables {
                    node,
                    in_host,
                    index,
                    child,
                    variables,
                } => {
                    let children = node.variable_children();
                    let matched = self.segments(in_host).get(index).and_then(|segment| {
                        children[child].match_segment(segment, &variables)
                    });
                    if child + 1 < children.len() {
                        self.stack.push(Frame::Variables {
                            node,
                            in_host,
                            index,
                            child: child + 1,
                            variables,
                        });
                    }
                    if let Some(variables) = matched {
                        self.stack.push(Frame::Descend {
                            node: children[child].node(),
                            in_host,
                            index: index + 1,
                            variables,
                        });
                    }
                }

                Frame::Routes {
                    routes,
                    pos,
                    variables,
                } => {
                    let route = routes[pos].clone();
                    let mut route_variables = variables.clone();
                    if pos + 1 < routes.len() {
                        self.stack.push(Frame::Routes {
                            routes,
                            pos: pos + 1,
                            variables,
                        });
                    }
                    for (name, value) in route.uri_template().defaults() {
                        route_variables
                            .entry(name.clone())
                            .or_insert_with(|| value.clone());
                    }
                    return Some(MatchedRouteCandidate {
                        route,
                        route_variables,
                    });
                }
            }
        }
        None
    }
}
