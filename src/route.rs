//! The route data model.

use {
    crate::{
        constraint::{HttpMethodConstraint, RouteConstraint},
        error::Result,
        rule::{RuleArg, RuleSpec},
    },
    http::Method,
    indexmap::{IndexMap, IndexSet},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::{fmt, iter::FromIterator, slice, str::FromStr, sync::Arc},
    uri_router_template::{Ast, NodeId, NodeKind, NodeValue},
};

/// A variable as declared in a template, before its rules are instantiated.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VariableDeclaration {
    pub(crate) name: String,
    pub(crate) default: Option<String>,
    pub(crate) rules: Vec<RuleSpec>,
}

impl VariableDeclaration {
    /// Reads the declaration from a `Variable` node and its children.
    pub(crate) fn from_ast(ast: &Ast, id: NodeId) -> Self {
        let name = ast[id].text().unwrap_or_default().to_owned();
        let mut default = None;
        let mut rules = vec![];

        for (child_id, child) in ast.children(id) {
            match child.kind() {
                NodeKind::VariableDefaultValue => {
                    default = child.text().map(ToOwned::to_owned);
                }
                NodeKind::VariableRule => {
                    let args = match ast.find_child(child_id, NodeKind::VariableRuleParameters) {
                        Some((params, _)) => ast
                            .children(params)
                            .filter_map(|(_, param)| match param.value() {
                                NodeValue::Number(n) => Some(RuleArg::from(*n)),
                                NodeValue::Text(s) => Some(RuleArg::Str(s.clone())),
                                NodeValue::None => None,
                            })
                            .collect(),
                        None => vec![],
                    };
                    rules.push(RuleSpec::new(child.text().unwrap_or_default(), args));
                }
                _ => {}
            }
        }

        Self {
            name,
            default,
            rules,
        }
    }
}

/// The compiled description of the matching surface of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UriTemplate {
    path: String,
    host: Option<String>,
    https_only: bool,
    variable_names: Vec<String>,
    defaults: IndexMap<String, String>,
    rules: IndexMap<String, Vec<RuleSpec>>,
}

impl FromStr for UriTemplate {
    type Err = failure::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s, None, false)
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.https_only {
            f.write_str("https://")?;
        }
        if let Some(ref host) = self.host {
            f.write_str(host)?;
        }
        f.write_str(&self.path)
    }
}

impl UriTemplate {
    /// Creates a template from a path template and an optional host template.
    ///
    /// Both templates are lexed and parsed here so that malformed templates are
    /// rejected when the route is declared.
    pub fn new(path: &str, host: Option<&str>, https_only: bool) -> Result<Self> {
        let path = format!("/{}", path.trim_start_matches('/'));
        let host = host.map(|h| h.trim_matches('.')).filter(|h| !h.is_empty());
        if let Some(host) = host {
            if host.contains('/') {
                failure::bail!("the host template \"{}\" must not contain '/'", host);
            }
        }

        let mut template = Self {
            path,
            host: host.map(Into::into),
            https_only,
            variable_names: vec![],
            defaults: IndexMap::new(),
            rules: IndexMap::new(),
        };

        let path_ast = uri_router_template::parse(&template.path)?;
        template.collect_variables(&path_ast)?;
        if let Some(host) = template.host.clone() {
            let host_ast = uri_router_template::parse(&host)?;
            template.collect_variables(&host_ast)?;
        }

        Ok(template)
    }

    fn collect_variables(&mut self, ast: &Ast) -> Result<()> {
        for (id, node) in ast.descendants(NodeId::root()) {
            if node.kind() != NodeKind::Variable {
                continue;
            }
            let decl = VariableDeclaration::from_ast(ast, id);
            if self.variable_names.contains(&decl.name) {
                failure::bail!(
                    "the route variable \"{}\" is declared more than once in \"{}\"",
                    decl.name,
                    self
                );
            }
            if let Some(default) = decl.default {
                self.defaults.insert(decl.name.clone(), default);
            }
            if !decl.rules.is_empty() {
                self.rules.insert(decl.name.clone(), decl.rules);
            }
            self.variable_names.push(decl.name);
        }
        Ok(())
    }

    /// Returns the normalized path template.
    pub fn path_template(&self) -> &str {
        &self.path
    }

    /// Returns the host template, if any.
    pub fn host_template(&self) -> Option<&str> {
        self.host.as_ref().map(|s| &**s)
    }

    /// Returns whether the host takes part in matching.
    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    /// Returns whether the route requires HTTPS.
    pub fn is_https_only(&self) -> bool {
        self.https_only
    }

    /// Returns the names of the route variables, path variables first.
    pub fn variable_names(&self) -> &[String] {
        &self.variable_names[..]
    }

    /// Returns the default values of variables, keyed by name.
    pub fn defaults(&self) -> &IndexMap<String, String> {
        &self.defaults
    }

    /// Returns the declared rules of each variable, keyed by name.
    pub fn rules(&self) -> &IndexMap<String, Vec<RuleSpec>> {
        &self.rules
    }
}

/// The descriptor of the controller action a route dispatches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteAction {
    /// The name of the controller.
    pub controller: String,
    /// The name of the controller method.
    pub method: String,
}

impl RouteAction {
    /// Creates an action from a controller and one of its methods.
    pub fn new(controller: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            controller: controller.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for RouteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.controller, self.method)
    }
}

/// A middleware attached to a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareBinding {
    /// The name of the middleware.
    pub class_name: String,
    /// The attributes passed to the middleware.
    pub attributes: IndexMap<String, Value>,
}

impl MiddlewareBinding {
    /// Creates a binding without attributes.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            attributes: IndexMap::new(),
        }
    }

    /// Adds an attribute to the binding.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }
}

/// A route registered in the router.
#[derive(Debug)]
pub struct Route {
    methods: IndexSet<Method>,
    uri_template: UriTemplate,
    action: RouteAction,
    middleware: Vec<MiddlewareBinding>,
    constraints: Vec<Arc<dyn RouteConstraint>>,
    attributes: IndexMap<String, String>,
}

impl Route {
    /// Creates a new route.
    ///
    /// An `HttpMethodConstraint` built from `methods` is inserted in front of
    /// the provided constraints.
    pub fn new(
        methods: impl IntoIterator<Item = Method>,
        uri_template: UriTemplate,
        action: RouteAction,
        middleware: Vec<MiddlewareBinding>,
        constraints: Vec<Arc<dyn RouteConstraint>>,
        attributes: IndexMap<String, String>,
    ) -> Self {
        let methods: IndexSet<Method> = methods.into_iter().collect();
        let mut all_constraints: Vec<Arc<dyn RouteConstraint>> =
            Vec::with_capacity(constraints.len() + 1);
        all_constraints.push(Arc::new(HttpMethodConstraint::new(methods.iter().cloned())));
        all_constraints.extend(constraints);

        Self::from_parts(
            methods,
            uri_template,
            action,
            middleware,
            all_constraints,
            attributes,
        )
    }

    /// Reassembles a route without adding any constraint.
    pub(crate) fn from_parts(
        methods: IndexSet<Method>,
        uri_template: UriTemplate,
        action: RouteAction,
        middleware: Vec<MiddlewareBinding>,
        constraints: Vec<Arc<dyn RouteConstraint>>,
        attributes: IndexMap<String, String>,
    ) -> Self {
        Self {
            methods,
            uri_template,
            action,
            middleware,
            constraints,
            attributes,
        }
    }

    /// Returns the methods this route accepts.
    pub fn methods(&self) -> &IndexSet<Method> {
        &self.methods
    }

    /// Returns the template this route is matched by.
    pub fn uri_template(&self) -> &UriTemplate {
        &self.uri_template
    }

    /// Returns the action which handles this route.
    pub fn action(&self) -> &RouteAction {
        &self.action
    }

    /// Returns the middleware bindings in the order they run.
    pub fn middleware(&self) -> &[MiddlewareBinding] {
        &self.middleware[..]
    }

    /// Returns the constraints, starting with the method constraint.
    pub fn constraints(&self) -> &[Arc<dyn RouteConstraint>] {
        &self.constraints[..]
    }

    /// Returns the custom attributes of the route.
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<_> = self.methods.iter().map(Method::as_str).collect();
        write!(
            f,
            "{} {} => {}",
            methods.join("|"),
            self.uri_template,
            self.action
        )
    }
}

/// An ordered collection of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteCollection {
    routes: Vec<Arc<Route>>,
}

impl RouteCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route and returns the shared handle to it.
    pub fn add(&mut self, route: Route) -> Arc<Route> {
        let route = Arc::new(route);
        self.routes.push(route.clone());
        route
    }

    /// Appends the routes in order.
    pub fn add_many(&mut self, routes: impl IntoIterator<Item = Route>) {
        for route in routes {
            self.add(route);
        }
    }

    /// Returns an iterator over the routes in declaration order.
    pub fn iter(&self) -> slice::Iter<'_, Arc<Route>> {
        self.routes.iter()
    }

    /// Returns the number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns whether the collection holds no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<'a> IntoIterator for &'a RouteCollection {
    type Item = &'a Arc<Route>;
    type IntoIter = slice::Iter<'a, Arc<Route>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Route> for RouteCollection {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = Route>,
    {
        let mut routes = Self::new();
        routes.add_many(iter);
        routes
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn template_collects_variables() -> Result<()> {
        let template = UriTemplate::new(
            "/users/:id(int, between(1, 100))/posts[/:page=1(int)]",
            Some(":sub.example.com"),
            true,
        )?;

        assert_eq!(template.path_template(), "/users/:id(int, between(1, 100))/posts[/:page=1(int)]");
        assert_eq!(template.host_template(), Some(":sub.example.com"));
        assert!(template.is_https_only());
        assert_eq!(template.variable_names(), &["id", "page", "sub"]);
        assert_eq!(template.defaults().get("page").map(String::as_str), Some("1"));
        assert_eq!(
            template.rules()["id"],
            vec![
                RuleSpec::new("int", vec![]),
                RuleSpec::new("between", vec![RuleArg::Int(1), RuleArg::Int(100)]),
            ]
        );
        assert!(template.rules().get("sub").is_none());
        Ok(())
    }

    #[test]
    fn template_normalizes_leading_slash() -> Result<()> {
        let template: UriTemplate = "users/:id".parse()?;
        assert_eq!(template.path_template(), "/users/:id");
        assert!(!template.has_host());
        Ok(())
    }

    #[test]
    fn template_failcase_duplicated_variable() {
        assert!(UriTemplate::new("/:id/:id", None, false).is_err());
        assert!(UriTemplate::new("/:id", Some(":id.example.com"), false).is_err());
    }

    #[test]
    fn template_failcase_malformed() {
        assert!(UriTemplate::new("/:(int)", None, false).is_err());
        assert!(UriTemplate::new("/posts[/:page", None, false).is_err());
        assert!(UriTemplate::new("/", Some("example.com/foo"), false).is_err());
    }

    #[test]
    fn route_prepends_method_constraint() -> Result<()> {
        let route = Route::new(
            vec![Method::GET, Method::POST],
            "/widgets".parse()?,
            RouteAction::new("WidgetController", "index"),
            vec![MiddlewareBinding::new("Auth").with_attribute("role", json!("admin"))],
            vec![],
            IndexMap::new(),
        );

        assert_eq!(route.constraints().len(), 1);
        let allowed = route.constraints()[0]
            .allowed_methods()
            .expect("should be the HTTP method constraint");
        assert!(allowed.contains(&Method::GET));
        assert!(allowed.contains(&Method::POST));
        assert_eq!(route.middleware()[0].attributes["role"], json!("admin"));
        assert_eq!(route.to_string(), "GET|POST /widgets => WidgetController::index");
        Ok(())
    }
}
