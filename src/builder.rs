//! The programmatic route declaration layer.

use {
    crate::{
        constraint::RouteConstraint,
        error::Result,
        route::{MiddlewareBinding, Route, RouteAction, RouteCollection, UriTemplate},
    },
    failure::ResultExt,
    http::Method,
    indexmap::IndexMap,
    std::{fmt, sync::Arc},
};

/// Settings shared by all routes declared inside a group.
#[derive(Clone, Default)]
pub struct RouteGroupOptions {
    path_prefix: String,
    host: Option<String>,
    https_only: bool,
    middleware: Vec<MiddlewareBinding>,
    constraints: Vec<Arc<dyn RouteConstraint>>,
    attributes: IndexMap<String, String>,
}

impl fmt::Debug for RouteGroupOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGroupOptions")
            .field("path_prefix", &self.path_prefix)
            .field("host", &self.host)
            .field("https_only", &self.https_only)
            .field("middleware", &self.middleware)
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl RouteGroupOptions {
    /// Creates group options which prepend the path prefix.
    pub fn new(path_prefix: impl Into<String>) -> Self {
        Self {
            path_prefix: path_prefix.into(),
            ..Default::default()
        }
    }

    /// Sets the host template appended to the host of every route in the group.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Requires HTTPS for every route in the group.
    pub fn https_only(mut self) -> Self {
        self.https_only = true;
        self
    }

    /// Appends a middleware binding to every route in the group.
    pub fn with_middleware(mut self, middleware: MiddlewareBinding) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Appends a constraint to every route in the group.
    pub fn with_constraint(mut self, constraint: impl RouteConstraint) -> Self {
        self.constraints.push(Arc::new(constraint));
        self
    }

    /// Sets an attribute on every route in the group.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Nests `inner` within `self`.
    fn merge(&self, inner: &Self) -> Self {
        Self {
            path_prefix: join_path(&self.path_prefix, &inner.path_prefix),
            host: join_host(inner.host.as_ref().map(|s| &**s), self.host.as_ref().map(|s| &**s)),
            https_only: self.https_only || inner.https_only,
            middleware: self
                .middleware
                .iter()
                .chain(&inner.middleware)
                .cloned()
                .collect(),
            constraints: self
                .constraints
                .iter()
                .chain(&inner.constraints)
                .cloned()
                .collect(),
            attributes: self
                .attributes
                .iter()
                .chain(&inner.attributes)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

fn join_path(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".into(),
        (false, true) => prefix.into(),
        (true, false) => format!("/{}", path),
        (false, false) => format!("{}/{}", prefix, path),
    }
}

fn join_host(host: Option<&str>, suffix: Option<&str>) -> Option<String> {
    match (host, suffix) {
        (Some(host), Some(suffix)) => Some(format!(
            "{}.{}",
            host.trim_end_matches('.'),
            suffix.trim_start_matches('.')
        )),
        (host, suffix) => host.or(suffix).map(Into::into),
    }
}

/// A builder of a single route.
pub struct RouteBuilder {
    methods: Vec<Method>,
    path: String,
    host: Option<String>,
    https_only: bool,
    action: Option<RouteAction>,
    middleware: Vec<MiddlewareBinding>,
    constraints: Vec<Arc<dyn RouteConstraint>>,
    attributes: IndexMap<String, String>,
    group: RouteGroupOptions,
}

impl fmt::Debug for RouteBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteBuilder")
            .field("methods", &self.methods)
            .field("path", &self.path)
            .field("host", &self.host)
            .field("action", &self.action)
            .field("group", &self.group)
            .finish()
    }
}

impl RouteBuilder {
    /// Sets the host template of the route.
    pub fn with_host(&mut self, host: impl Into<String>) -> &mut Self {
        self.host = Some(host.into());
        self
    }

    /// Requires HTTPS for the route.
    pub fn https_only(&mut self) -> &mut Self {
        self.https_only = true;
        self
    }

    /// Sets the controller action which handles the route.
    pub fn map_to(&mut self, controller: impl Into<String>, method: impl Into<String>) -> &mut Self {
        self.action = Some(RouteAction::new(controller, method));
        self
    }

    /// Appends a middleware binding.
    pub fn with_middleware(&mut self, middleware: MiddlewareBinding) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Appends several middleware bindings, keeping their order.
    pub fn with_many_middleware(
        &mut self,
        middleware: impl IntoIterator<Item = MiddlewareBinding>,
    ) -> &mut Self {
        self.middleware.extend(middleware);
        self
    }

    /// Appends a constraint, evaluated after the method constraint.
    pub fn with_constraint(&mut self, constraint: impl RouteConstraint) -> &mut Self {
        self.constraints.push(Arc::new(constraint));
        self
    }

    /// Sets a custom attribute of the route.
    pub fn with_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    fn build(self) -> Result<Route> {
        let Self {
            methods,
            path,
            host,
            https_only,
            action,
            middleware,
            constraints,
            attributes,
            group,
        } = self;

        let path = join_path(&group.path_prefix, &path);
        let host = join_host(host.as_ref().map(|s| &**s), group.host.as_ref().map(|s| &**s));
        let action = match action {
            Some(action) => action,
            None => failure::bail!("the route `{}` is not mapped to any action", path),
        };
        let uri_template = UriTemplate::new(&path, host.as_ref().map(|s| &**s), group.https_only || https_only)
            .with_context(|_| format!("invalid URI template for the route to `{}`", action))?;

        let mut all_attributes = group.attributes;
        all_attributes.extend(attributes);

        Ok(Route::new(
            methods,
            uri_template,
            action,
            group.middleware.into_iter().chain(middleware).collect(),
            group.constraints.into_iter().chain(constraints).collect(),
            all_attributes,
        ))
    }
}

/// A builder of a `RouteCollection`.
///
/// # Examples
///
/// ```
/// # use uri_router::builder::{RouteCollectionBuilder, RouteGroupOptions};
/// let mut builder = RouteCollectionBuilder::new();
/// builder.get("/").map_to("HomeController", "index");
/// builder.group(RouteGroupOptions::new("/users"), |users| {
///     users.get("/:id(int)").map_to("UserController", "show");
///     users.post("/").map_to("UserController", "create");
/// });
/// let routes = builder.build().unwrap();
/// assert_eq!(routes.len(), 3);
/// ```
#[derive(Debug, Default)]
pub struct RouteCollectionBuilder {
    routes: Vec<RouteBuilder>,
    groups: Vec<RouteGroupOptions>,
}

impl RouteCollectionBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a declaration of a route which accepts the specified methods.
    pub fn route(&mut self, methods: impl IntoIterator<Item = Method>, path: impl Into<String>) -> &mut RouteBuilder {
        let group = self.groups.last().cloned().unwrap_or_default();
        self.routes.push(RouteBuilder {
            methods: methods.into_iter().collect(),
            path: path.into(),
            host: None,
            https_only: false,
            action: None,
            middleware: vec![],
            constraints: vec![],
            attributes: IndexMap::new(),
            group,
        });
        let i = self.routes.len() - 1;
        &mut self.routes[i]
    }

    /// Declares a route for `GET` requests.
    pub fn get(&mut self, path: impl Into<String>) -> &mut RouteBuilder {
        self.route(Some(Method::GET), path)
    }

    /// Declares a route for `POST` requests.
    pub fn post(&mut self, path: impl Into<String>) -> &mut RouteBuilder {
        self.route(Some(Method::POST), path)
    }

    /// Declares a route for `PUT` requests.
    pub fn put(&mut self, path: impl Into<String>) -> &mut RouteBuilder {
        self.route(Some(Method::PUT), path)
    }

    /// Declares a route for `PATCH` requests.
    pub fn patch(&mut self, path: impl Into<String>) -> &mut RouteBuilder {
        self.route(Some(Method::PATCH), path)
    }

    /// Declares a route for `DELETE` requests.
    pub fn delete(&mut self, path: impl Into<String>) -> &mut RouteBuilder {
        self.route(Some(Method::DELETE), path)
    }

    /// Declares a route for `HEAD` requests.
    pub fn head(&mut self, path: impl Into<String>) -> &mut RouteBuilder {
        self.route(Some(Method::HEAD), path)
    }

    /// Declares a route for `OPTIONS` requests.
    pub fn options(&mut self, path: impl Into<String>) -> &mut RouteBuilder {
        self.route(Some(Method::OPTIONS), path)
    }

    /// Starts a declaration of a route which accepts the common request methods.
    pub fn any(&mut self, path: impl Into<String>) -> &mut RouteBuilder {
        self.route(
            vec![
                Method::GET,
                Method::HEAD,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ],
            path,
        )
    }

    /// Declares routes which share the settings in `options`.
    ///
    /// Groups may be nested.
    pub fn group<F>(&mut self, options: RouteGroupOptions, f: F) -> &mut Self
    where
        F: FnOnce(&mut Self),
    {
        let merged = match self.groups.last() {
            Some(outer) => outer.merge(&options),
            None => RouteGroupOptions::default().merge(&options),
        };
        self.groups.push(merged);
        f(self);
        self.groups.pop();
        self
    }

    /// Validates the declared routes and collects them.
    pub fn build(self) -> Result<RouteCollection> {
        let routes = self
            .routes
            .into_iter()
            .map(RouteBuilder::build)
            .collect::<Result<RouteCollection>>()?;

        log::debug!("collected routes:");
        for route in &routes {
            log::debug!(" - {}", route);
        }

        Ok(routes)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            constraint::RouteRequest,
            matcher::MatchedRouteCandidate,
        },
        serde_json::json,
    };

    #[derive(Debug)]
    struct HeaderPresent(&'static str);

    impl RouteConstraint for HeaderPresent {
        fn passes(&self, _: &MatchedRouteCandidate, request: &RouteRequest<'_>) -> bool {
            request.headers.contains_key(self.0)
        }
    }

    #[test]
    fn join_paths() {
        assert_eq!(join_path("", ""), "/");
        assert_eq!(join_path("/api/", "/users"), "/api/users");
        assert_eq!(join_path("/api", ""), "/api");
        assert_eq!(join_path("", "users"), "/users");
    }

    #[test]
    fn join_hosts() {
        assert_eq!(join_host(Some("api"), Some("example.com")), Some("api.example.com".into()));
        assert_eq!(join_host(None, Some(":tenant.example.com")), Some(":tenant.example.com".into()));
        assert_eq!(join_host(Some("example.com"), None), Some("example.com".into()));
        assert_eq!(join_host(None, None), None);
    }

    #[test]
    fn build_simple_routes() -> Result<()> {
        let mut builder = RouteCollectionBuilder::new();
        builder
            .get("/users/:id(int)")
            .map_to("UserController", "show")
            .with_middleware(MiddlewareBinding::new("Auth").with_attribute("role", "admin"))
            .with_attribute("name", "users.show");
        builder.any("/ping").map_to("PingController", "ping");
        let routes = builder.build()?;

        assert_eq!(routes.len(), 2);
        let show = routes.iter().next().unwrap();
        assert_eq!(show.methods().iter().collect::<Vec<_>>(), vec![&Method::GET]);
        assert_eq!(show.uri_template().path_template(), "/users/:id(int)");
        assert_eq!(show.middleware()[0].attributes["role"], json!("admin"));
        assert_eq!(show.attributes()["name"], "users.show");
        Ok(())
    }

    #[test]
    fn build_nested_groups() -> Result<()> {
        let mut builder = RouteCollectionBuilder::new();
        builder.group(
            RouteGroupOptions::new("/api")
                .with_host("example.com")
                .with_middleware(MiddlewareBinding::new("Cors"))
                .with_attribute("area", "api"),
            |api| {
                api.group(
                    RouteGroupOptions::new("/v1")
                        .with_host(":tenant")
                        .https_only()
                        .with_constraint(HeaderPresent("x-api-key"))
                        .with_middleware(MiddlewareBinding::new("Auth")),
                    |v1| {
                        v1.post("/posts").map_to("PostController", "create");
                    },
                );
                api.get("/health").map_to("HealthController", "check");
            },
        );
        builder.get("/").map_to("HomeController", "index");
        let routes: Vec<_> = builder.build()?.iter().cloned().collect();

        let create = &routes[0];
        let template = create.uri_template();
        assert_eq!(template.path_template(), "/api/v1/posts");
        assert_eq!(template.host_template(), Some(":tenant.example.com"));
        assert!(template.is_https_only());
        let middleware: Vec<_> = create.middleware().iter().map(|m| &*m.class_name).collect();
        assert_eq!(middleware, vec!["Cors", "Auth"]);
        assert_eq!(create.constraints().len(), 2);
        assert_eq!(create.attributes()["area"], "api");

        let health = &routes[1];
        assert_eq!(health.uri_template().path_template(), "/api/health");
        assert_eq!(health.uri_template().host_template(), Some("example.com"));
        assert!(!health.uri_template().is_https_only());
        assert_eq!(health.constraints().len(), 1);

        let home = &routes[2];
        assert_eq!(home.uri_template().path_template(), "/");
        assert!(home.middleware().is_empty());
        Ok(())
    }

    #[test]
    fn build_failcase_missing_action() {
        let mut builder = RouteCollectionBuilder::new();
        builder.get("/orphan");
        assert!(builder.build().is_err());
    }

    #[test]
    fn build_failcase_invalid_template() {
        let mut builder = RouteCollectionBuilder::new();
        builder.get("/posts[/:page").map_to("PostController", "index");
        assert!(builder.build().is_err());
    }
}
