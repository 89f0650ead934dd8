use {
    super::util::{action_of, MatcherExt},
    http::Method,
    std::{
        cell::Cell,
        env,
        path::PathBuf,
        rc::Rc,
        sync::Arc,
    },
    uri_router::{
        builder::RouteCollectionBuilder,
        rule::{Rule, RuleArg, RuleError, RuleFactory},
        trie::TrieCompiler,
        FileTrieCache, MemoryTrieCache, MiddlewareBinding, RouteCollection, TrieCache,
        TrieFactory, TrieRouteMatcher,
    },
};

fn cache_path(name: &str) -> PathBuf {
    env::temp_dir().join(format!(
        "uri-router-it-{}-{}.json",
        name,
        std::process::id()
    ))
}

fn routes() -> uri_router::Result<RouteCollection> {
    let mut builder = RouteCollectionBuilder::new();
    builder.get("/").map_to("HomeController", "index");
    builder
        .get("/users/:id(int, between(1, 100))")
        .map_to("UserController", "show")
        .with_middleware(MiddlewareBinding::new("Auth").with_attribute("scopes", vec!["read"]));
    builder.put("/users/:id(int)").map_to("UserController", "update");
    builder.get("/posts[/:page=1(int)]").map_to("PostController", "index");
    builder
        .get("/status")
        .with_host("api.:tld")
        .map_to("StatusController", "show");
    builder
        .get("/files/:name.:ext(in(\"pdf\", \"txt\"))")
        .map_to("FileController", "download");
    builder.build()
}

const REQUESTS: &[(&str, &str, &str)] = &[
    ("GET", "", "/"),
    ("GET", "", "/users/42"),
    ("GET", "", "/users/420"),
    ("PUT", "", "/users/420"),
    ("DELETE", "", "/users/42"),
    ("GET", "", "/posts"),
    ("GET", "", "/posts/3"),
    ("GET", "api.com", "/status"),
    ("GET", "www.com", "/status"),
    ("GET", "", "/files/a.pdf"),
    ("GET", "", "/files/a.exe"),
    ("GET", "", "/missing"),
];

fn outcomes(matcher: &TrieRouteMatcher) -> Vec<String> {
    REQUESTS
        .iter()
        .map(|&(method, host, path)| {
            let method: Method = method.parse().expect("should be a valid method");
            let result = matcher.perform(method, host, path);
            format!(
                "{:?} {:?} {:?} {:?}",
                action_of(&result),
                result.route_variables,
                result.method_is_allowed(),
                result.allowed_methods
            )
        })
        .collect()
}

#[test]
fn compiling_twice_is_deterministic() -> uri_router::Result<()> {
    let first = TrieRouteMatcher::from(TrieFactory::new(routes).create_trie()?);
    let second = TrieRouteMatcher::from(TrieFactory::new(routes).create_trie()?);
    assert_eq!(outcomes(&first), outcomes(&second));
    Ok(())
}

#[test]
fn file_cache_round_trip_is_deterministic() -> uri_router::Result<()> {
    let cache = FileTrieCache::new(cache_path("deterministic"));
    cache.flush()?;

    let compiled = TrieRouteMatcher::from(TrieFactory::new(routes).create_trie()?);

    TrieCache::set(&cache, &TrieFactory::new(routes).create_trie()?)?;
    let calls = Rc::new(Cell::new(0));
    let factory = TrieFactory::new({
        let calls = calls.clone();
        move || {
            calls.set(calls.get() + 1);
            routes()
        }
    })
    .with_cache(FileTrieCache::new(cache.path()));
    let cached = TrieRouteMatcher::from(factory.create_trie()?);

    assert_eq!(calls.get(), 0);
    assert_eq!(outcomes(&compiled), outcomes(&cached));

    let result = cached.get("/users/7");
    let route = result.route.expect("should match");
    assert_eq!(route.middleware()[0].class_name, "Auth");
    assert_eq!(
        route.middleware()[0].attributes["scopes"],
        serde_json::json!(["read"])
    );

    cache.flush()?;
    Ok(())
}

#[test]
fn file_cache_miss_stores_trie() -> uri_router::Result<()> {
    let path = cache_path("miss");
    FileTrieCache::new(&path).flush()?;

    let factory = TrieFactory::new(routes).with_cache(FileTrieCache::new(&path));
    factory.create_trie()?;
    assert!(path.exists());

    factory.cache().expect("should have a cache").flush()?;
    assert!(!path.exists());
    Ok(())
}

#[test]
fn memory_cache_is_flushed_manually() -> uri_router::Result<()> {
    let calls = Rc::new(Cell::new(0));
    let factory = TrieFactory::new({
        let calls = calls.clone();
        move || {
            calls.set(calls.get() + 1);
            routes()
        }
    })
    .with_cache(MemoryTrieCache::new());

    for _ in 0..3 {
        factory.create_trie()?;
    }
    assert_eq!(calls.get(), 1);

    factory.cache().expect("should have a cache").flush()?;
    factory.create_trie()?;
    assert_eq!(calls.get(), 2);
    Ok(())
}

#[derive(Debug)]
struct Even;

impl Rule for Even {
    fn passes(&self, value: &str) -> bool {
        value.parse::<i64>().map(|n| n % 2 == 0).unwrap_or(false)
    }
}

fn custom_rules() -> Arc<RuleFactory> {
    let mut rules = RuleFactory::default();
    rules.register("even", |args: &[RuleArg]| {
        if !args.is_empty() {
            return Err(RuleError::invalid_arguments("even", "takes no arguments"));
        }
        Ok(Arc::new(Even) as Arc<dyn Rule>)
    });
    Arc::new(rules)
}

fn even_routes() -> uri_router::Result<RouteCollection> {
    let mut builder = RouteCollectionBuilder::new();
    builder.get("/pairs/:n(even)").map_to("PairController", "show");
    builder.build()
}

#[test]
fn file_cache_with_custom_rules() -> uri_router::Result<()> {
    let path = cache_path("custom-rules");
    let rules = custom_rules();

    let store = FileTrieCache::new(&path).with_rule_factory(rules.clone());
    store.flush()?;
    let factory = TrieFactory::new(even_routes)
        .with_compiler(TrieCompiler::new(rules.clone()))
        .with_cache(store);
    factory.create_trie()?;

    let matcher = TrieRouteMatcher::from(factory.create_trie()?);
    assert!(matcher.get("/pairs/4").match_found());
    assert!(!matcher.get("/pairs/5").match_found());

    // the default factory does not know the rule
    assert!(FileTrieCache::new(&path).get().is_err());

    factory.cache().expect("should have a cache").flush()?;
    Ok(())
}

#[test]
fn compile_failcase_unregistered_rule() {
    let factory = TrieFactory::new(even_routes);
    assert!(factory.create_trie().is_err());
}
