use {
    super::util::{action_of, matcher, MatcherExt},
    http::{header::HeaderValue, HeaderMap, Method},
    matches::assert_matches,
    uri_router::{
        builder::RouteGroupOptions, MatchedRouteCandidate, RouteConstraint, RouteMatcher,
        RouteRequest,
    },
};

#[test]
fn empty_routes() {
    let matcher = matcher(|_| {});
    let result = matcher.get("/");
    assert!(!result.match_found());
    assert_matches!(result.method_is_allowed(), None);
}

#[test]
fn literal_only_template() {
    let matcher = matcher(|m| {
        m.get("/about/team").map_to("PageController", "team");
    });

    let result = matcher.get("/about/team");
    assert_eq!(action_of(&result), Some("team"));
    assert!(result.route_variables.is_empty());

    assert!(matcher.get("/about/team/").match_found());
    assert!(matcher.get("/About/Team").match_found());
    assert!(!matcher.get("/about").match_found());
    assert!(!matcher.get("/about/team/lead").match_found());
}

#[test]
fn root_template() {
    let matcher = matcher(|m| {
        m.get("/").map_to("HomeController", "index");
    });
    assert!(matcher.get("/").match_found());
    assert!(matcher.get("").match_found());
    assert!(!matcher.get("/index").match_found());
}

#[test]
fn variable_extraction() {
    let matcher = matcher(|m| {
        m.get("/users/:id(int)").map_to("UserController", "show");
    });

    let result = matcher.get("/users/42");
    assert!(result.match_found());
    assert_eq!(result.route_variables["id"], "42");

    let result = matcher.get("/users/abc");
    assert!(!result.match_found());
    assert_matches!(result.method_is_allowed(), None);
}

#[test]
fn variable_values_keep_case() {
    let matcher = matcher(|m| {
        m.get("/Files/:name").map_to("FileController", "show");
    });
    let result = matcher.get("/files/ReadMe");
    assert_eq!(result.route_variables["name"], "ReadMe");
}

#[test]
fn method_mismatch() {
    let matcher = matcher(|m| {
        m.get("/widgets").map_to("WidgetController", "index");
    });

    let result = matcher.perform(Method::POST, "", "/widgets");
    assert!(!result.match_found());
    assert_matches!(result.method_is_allowed(), Some(false));
    assert_eq!(
        result.allowed_methods.iter().cloned().collect::<Vec<_>>(),
        vec![Method::GET]
    );
    assert_eq!(result.allow_header(), Some(HeaderValue::from_static("GET")));
}

#[test]
fn allowed_methods_are_collected_across_routes() {
    let matcher = matcher(|m| {
        m.get("/posts/:id").map_to("PostController", "show");
        m.put("/posts/:id").map_to("PostController", "update");
        m.route(vec![Method::GET, Method::DELETE], "/posts/:slug")
            .map_to("PostController", "remove");
    });

    let result = matcher.perform(Method::PATCH, "", "/posts/1");
    assert_matches!(result.method_is_allowed(), Some(false));
    assert_eq!(
        result.allow_header(),
        Some(HeaderValue::from_static("GET, PUT, DELETE"))
    );

    let result = matcher.perform(Method::PUT, "", "/posts/1");
    assert_eq!(action_of(&result), Some("update"));
    assert!(result.allowed_methods.is_empty());

    let result = matcher.perform(Method::DELETE, "", "/posts/1");
    assert_eq!(action_of(&result), Some("remove"));
    assert_eq!(result.route_variables["slug"], "1");
}

#[test]
fn literal_precedence() {
    let matcher = matcher(|m| {
        m.get("/foo/:x").map_to("FooController", "variable");
        m.get("/foo/bar").map_to("FooController", "literal");
    });

    assert_eq!(action_of(&matcher.get("/foo/bar")), Some("literal"));

    let result = matcher.get("/foo/baz");
    assert_eq!(action_of(&result), Some("variable"));
    assert_eq!(result.route_variables["x"], "baz");
}

#[test]
fn literal_branch_falls_back_to_variable_branch() {
    let matcher = matcher(|m| {
        m.get("/foo/bar/edit").map_to("FooController", "edit");
        m.get("/foo/:x/show").map_to("FooController", "show");
    });

    let result = matcher.get("/foo/bar/show");
    assert_eq!(action_of(&result), Some("show"));
    assert_eq!(result.route_variables["x"], "bar");
}

#[test]
fn variables_in_declaration_order() {
    let matcher = matcher(|m| {
        m.get("/items/:id(int)").map_to("ItemController", "by_id");
        m.get("/items/:slug").map_to("ItemController", "by_slug");
    });

    assert_eq!(action_of(&matcher.get("/items/7")), Some("by_id"));
    assert_eq!(action_of(&matcher.get("/items/seven")), Some("by_slug"));
}

#[test]
fn optional_segment() {
    let matcher = matcher(|m| {
        m.get("/posts[/:page=1(int)]").map_to("PostController", "index");
    });

    let result = matcher.get("/posts");
    assert_eq!(action_of(&result), Some("index"));
    assert_eq!(result.route_variables["page"], "1");

    let result = matcher.get("/posts/2");
    assert_eq!(action_of(&result), Some("index"));
    assert_eq!(result.route_variables["page"], "2");

    assert!(!matcher.get("/posts/two").match_found());
}

#[test]
fn nested_optional_segments() {
    let matcher = matcher(|m| {
        m.get("/archive[/:year(int)[/:month(int, between(1, 12))]]")
            .map_to("ArchiveController", "index");
    });

    assert!(matcher.get("/archive").match_found());
    let result = matcher.get("/archive/2020/12");
    assert_eq!(result.route_variables["year"], "2020");
    assert_eq!(result.route_variables["month"], "12");
    assert!(!matcher.get("/archive/2020/13").match_found());

    let result = matcher.get("/archive/2020");
    assert!(result.route_variables.get("month").is_none());
}

#[test]
fn sibling_optional_segments() {
    let matcher = matcher(|m| {
        m.get("/a[/b][/c]").map_to("Controller", "action");
    });

    assert!(matcher.get("/a").match_found());
    assert!(matcher.get("/a/b").match_found());
    assert!(matcher.get("/a/b/c").match_found());
    assert!(!matcher.get("/a/c").match_found());
}

#[test]
fn mixed_segment_tries_other_splits() {
    let matcher = matcher(|m| {
        m.get("/f/:name.:ext(alpha)").map_to("FileController", "show");
    });

    let result = matcher.get("/f/report.v2.pdf");
    assert_eq!(action_of(&result), Some("show"));
    assert_eq!(result.route_variables["name"], "report.v2");
    assert_eq!(result.route_variables["ext"], "pdf");
}

#[test]
fn nested_rule_call_argument() {
    let matcher = matcher(|m| {
        m.get("/x/:v(regex(foo(1)))").map_to("C", "nested");
    });
    assert!(matcher.get("/x/foo1").match_found());
    assert!(!matcher.get("/x/foo").match_found());
}

#[test]
fn mixed_segments() {
    let matcher = matcher(|m| {
        m.get("/users/user-:id(int).json").map_to("UserController", "json");
        m.get("/files/:name.:ext(in(\"pdf\", \"txt\"))")
            .map_to("FileController", "download");
    });

    let result = matcher.get("/users/user-12.json");
    assert_eq!(action_of(&result), Some("json"));
    assert_eq!(result.route_variables["id"], "12");
    assert!(!matcher.get("/users/user-x.json").match_found());

    let result = matcher.get("/files/report.pdf");
    assert_eq!(result.route_variables["name"], "report");
    assert_eq!(result.route_variables["ext"], "pdf");
    assert!(!matcher.get("/files/report.exe").match_found());
}

#[test]
fn host_matching() {
    let matcher = matcher(|m| {
        m.get("/status").with_host("api.:tld").map_to("StatusController", "show");
    });

    let result = matcher.perform(Method::GET, "api.com", "/status");
    assert!(result.match_found());
    assert_eq!(result.route_variables["tld"], "com");

    let result = matcher.perform(Method::GET, "other.com", "/status");
    assert!(!result.match_found());
    assert!(result.allowed_methods.is_empty());
    assert_matches!(result.method_is_allowed(), None);

    assert!(!matcher.perform(Method::GET, "", "/status").match_found());
}

#[test]
fn optional_host_prefix() {
    let matcher = matcher(|m| {
        m.get("/").with_host("[:sub.]example.com").map_to("HomeController", "index");
    });

    let result = matcher.perform(Method::GET, "example.com", "/");
    assert!(result.match_found());
    assert!(result.route_variables.get("sub").is_none());

    let result = matcher.perform(Method::GET, "Blog.example.com", "/");
    assert_eq!(result.route_variables["sub"], "Blog");

    assert!(!matcher.perform(Method::GET, "", "/").match_found());
    assert!(!matcher.perform(Method::GET, "example.org", "/").match_found());
}

#[test]
fn host_and_path_variables() {
    let matcher = matcher(|m| {
        m.group(
            RouteGroupOptions::new("/accounts").with_host(":tenant.example.com"),
            |m| {
                m.get("/:id(int)").map_to("AccountController", "show");
            },
        );
        m.get("/accounts/:id").map_to("AccountController", "fallback");
    });

    let result = matcher.perform(Method::GET, "acme.example.com", "/accounts/3");
    assert_eq!(action_of(&result), Some("show"));
    assert_eq!(result.route_variables["id"], "3");
    assert_eq!(result.route_variables["tenant"], "acme");

    let result = matcher.perform(Method::GET, "example.org", "/accounts/3");
    assert_eq!(action_of(&result), Some("fallback"));
    assert!(result.route_variables.get("tenant").is_none());
}

#[test]
fn rule_composition() {
    let matcher = matcher(|m| {
        m.get("/scores/:n(int, between(1, 100))").map_to("ScoreController", "show");
    });

    assert!(matcher.get("/scores/1").match_found());
    assert!(matcher.get("/scores/100").match_found());
    assert!(!matcher.get("/scores/150").match_found());
    assert!(!matcher.get("/scores/abc").match_found());
    assert!(!matcher.get("/scores/1.5").match_found());
}

#[test]
fn builtin_rules_in_templates() {
    let matcher = matcher(|m| {
        m.get("/a/:v(alpha)").map_to("C", "alpha");
        m.get("/b/:v(uuidv4)").map_to("C", "uuid");
        m.get("/c/:v(date(\"%Y-%m-%d\"))").map_to("C", "date");
        m.get("/d/:v(regex(\"^[a-z]{3}$\"))").map_to("C", "regex");
        m.get("/e/:v(notIn(\"admin\", \"root\"))").map_to("C", "not_in");
    });

    assert!(matcher.get("/a/abc").match_found());
    assert!(!matcher.get("/a/abc1").match_found());
    assert!(matcher
        .get("/b/8c1e0a3c-4b1f-4e5e-9a63-7f2d2b1c3e4f")
        .match_found());
    assert!(!matcher
        .get("/b/8c1e0a3c-4b1f-1e5e-9a63-7f2d2b1c3e4f")
        .match_found());
    assert!(matcher.get("/c/2024-02-29").match_found());
    assert!(!matcher.get("/c/2023-02-29").match_found());
    assert!(matcher.get("/d/abc").match_found());
    assert!(!matcher.get("/d/abcd").match_found());
    assert!(matcher.get("/e/guest").match_found());
    assert!(!matcher.get("/e/root").match_found());
}

#[derive(Debug)]
struct RequiresHeader(&'static str);

impl RouteConstraint for RequiresHeader {
    fn passes(&self, _: &MatchedRouteCandidate, request: &RouteRequest<'_>) -> bool {
        request.headers.contains_key(self.0)
    }
}

#[test]
fn custom_constraint_vetoes_candidate() {
    let matcher = matcher(|m| {
        m.get("/reports/:id")
            .with_constraint(RequiresHeader("x-api-key"))
            .map_to("ReportController", "api");
        m.get("/reports/:id").map_to("ReportController", "html");
    });

    let mut headers = HeaderMap::new();
    let result = matcher.match_route(&Method::GET, "", "/reports/1", &headers);
    assert_eq!(action_of(&result), Some("html"));

    headers.insert("x-api-key", HeaderValue::from_static("secret"));
    let result = matcher.match_route(&Method::GET, "", "/reports/1", &headers);
    assert_eq!(action_of(&result), Some("api"));
}

#[test]
fn failing_custom_constraint_does_not_report_methods() {
    let matcher = matcher(|m| {
        m.get("/private")
            .with_constraint(RequiresHeader("authorization"))
            .map_to("PrivateController", "index");
    });

    let result = matcher.get("/private");
    assert!(!result.match_found());
    assert_matches!(result.method_is_allowed(), None);
}
