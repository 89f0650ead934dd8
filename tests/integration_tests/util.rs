use {
    http::{HeaderMap, Method},
    uri_router::{
        builder::RouteCollectionBuilder, RouteCollection, RouteMatcher, RouteMatchingResult,
        TrieFactory, TrieRouteMatcher,
    },
};

pub fn matcher(f: impl FnOnce(&mut RouteCollectionBuilder)) -> TrieRouteMatcher {
    let mut builder = RouteCollectionBuilder::new();
    f(&mut builder);
    let routes = builder.build().expect("failed to build routes");
    let factory = move || -> uri_router::Result<RouteCollection> { Ok(routes.clone()) };
    let trie = TrieFactory::new(factory)
        .create_trie()
        .expect("failed to compile routes");
    TrieRouteMatcher::from(trie)
}

pub trait MatcherExt {
    fn perform(&self, method: Method, host: &str, path: &str) -> RouteMatchingResult;

    fn get(&self, path: &str) -> RouteMatchingResult {
        self.perform(Method::GET, "", path)
    }
}

impl<M> MatcherExt for M
where
    M: RouteMatcher,
{
    fn perform(&self, method: Method, host: &str, path: &str) -> RouteMatchingResult {
        self.match_route(&method, host, path, &HeaderMap::new())
    }
}

/// Returns the name of the controller method of the matched route.
pub fn action_of(result: &RouteMatchingResult) -> Option<&str> {
    result.route.as_ref().map(|route| &*route.action().method)
}
