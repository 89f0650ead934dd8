use {
    super::util::{action_of, matcher, MatcherExt},
    http::Method,
    matches::assert_matches,
    uri_router::{
        builder::{RouteCollectionBuilder, RouteGroupOptions},
        MiddlewareBinding,
    },
};

#[test]
fn grouped_routes_are_matched() {
    let matcher = matcher(|m| {
        m.group(
            RouteGroupOptions::new("/admin")
                .with_middleware(MiddlewareBinding::new("Auth"))
                .with_attribute("area", "admin"),
            |m| {
                m.get("/").map_to("AdminController", "dashboard");
                m.group(RouteGroupOptions::new("/users"), |m| {
                    m.get("/:id(int)").map_to("AdminUserController", "show");
                    m.delete("/:id(int)").map_to("AdminUserController", "destroy");
                });
            },
        );
    });

    let result = matcher.get("/admin");
    assert_eq!(action_of(&result), Some("dashboard"));

    let result = matcher.perform(Method::DELETE, "", "/admin/users/9");
    assert_eq!(action_of(&result), Some("destroy"));
    let route = result.route.expect("should match");
    assert_eq!(route.middleware()[0].class_name, "Auth");
    assert_eq!(route.attributes()["area"], "admin");

    let result = matcher.perform(Method::POST, "", "/admin/users/9");
    assert_matches!(result.method_is_allowed(), Some(false));
    assert_eq!(result.allowed_methods.len(), 2);

    assert!(!matcher.get("/users/9").match_found());
}

#[test]
fn any_accepts_common_methods() {
    let matcher = matcher(|m| {
        m.any("/echo").map_to("EchoController", "echo");
    });
    for method in &[
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ] {
        assert!(matcher.perform(method.clone(), "", "/echo").match_found());
    }
    assert!(!matcher.perform(Method::TRACE, "", "/echo").match_found());
}

#[test]
fn https_only_is_recorded() -> uri_router::Result<()> {
    let mut builder = RouteCollectionBuilder::new();
    builder.group(RouteGroupOptions::new("/secure").https_only(), |m| {
        m.get("/login").map_to("LoginController", "show");
    });
    builder.get("/public").map_to("PublicController", "show");
    let routes = builder.build()?;

    let templates: Vec<_> = routes
        .iter()
        .map(|route| route.uri_template().is_https_only())
        .collect();
    assert_eq!(templates, vec![true, false]);
    Ok(())
}

#[test]
fn build_failcase_duplicated_variable() {
    let mut builder = RouteCollectionBuilder::new();
    builder
        .get("/:id/items/:id")
        .map_to("ItemController", "show");
    assert!(builder.build().is_err());
}

#[test]
fn build_failcase_malformed_template() {
    for template in &["/:", "/:id(int", "/:id(in(\"a)))", "/[/:page"] {
        let mut builder = RouteCollectionBuilder::new();
        builder.get(*template).map_to("Controller", "action");
        assert!(builder.build().is_err(), "should reject {:?}", template);
    }
}
