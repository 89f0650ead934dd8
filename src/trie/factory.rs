use {
    super::{TrieCache, TrieCompiler, TrieNode},
    crate::{error::Result, route::RouteCollection},
    std::fmt,
};

/// A trait representing a loader of the route table.
pub trait RouteFactory {
    /// Loads the route table.
    fn create_routes(&self) -> Result<RouteCollection>;
}

impl<F> RouteFactory for F
where
    F: Fn() -> Result<RouteCollection>,
{
    fn create_routes(&self) -> Result<RouteCollection> {
        (*self)()
    }
}

/// Creates the routing trie, using a cache if one is configured.
pub struct TrieFactory<F> {
    routes: F,
    cache: Option<Box<dyn TrieCache>>,
    compiler: TrieCompiler,
}

impl<F> fmt::Debug for TrieFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrieFactory")
            .field("cache", &self.cache)
            .field("compiler", &self.compiler)
            .finish()
    }
}

impl<F> TrieFactory<F>
where
    F: RouteFactory,
{
    /// Creates a factory which loads the routes through `routes` on a cache miss.
    pub fn new(routes: F) -> Self {
        Self {
            routes,
            cache: None,
            compiler: TrieCompiler::default(),
        }
    }

    /// Sets the cache consulted before compiling.
    pub fn with_cache(self, cache: impl TrieCache + 'static) -> Self {
        Self {
            cache: Some(Box::new(cache)),
            ..self
        }
    }

    /// Replaces the compiler, e.g. to use a custom `RuleFactory`.
    pub fn with_compiler(self, compiler: TrieCompiler) -> Self {
        Self { compiler, ..self }
    }

    /// Returns the configured cache, if any.
    pub fn cache(&self) -> Option<&dyn TrieCache> {
        self.cache.as_ref().map(|c| &**c)
    }

    /// Returns the trie from the cache, or compiles the routes on a cache miss.
    ///
    /// The route factory is not called when the cache hits.
    pub fn create_trie(&self) -> Result<TrieNode> {
        if let Some(ref cache) = self.cache {
            if let Some(trie) = cache.get()? {
                log::debug!("trie cache hit");
                return Ok(trie);
            }
            log::debug!("trie cache miss");
        }

        let routes = self.routes.create_routes()?;
        let trie = self.compiler.compile_all(&routes)?;

        if let Some(ref cache) = self.cache {
            cache.set(&trie)?;
            log::debug!("stored the compiled trie into the cache");
        }

        Ok(trie)
    }
}
