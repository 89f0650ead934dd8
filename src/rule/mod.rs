//! Validation rules applied to route variables.
//!
//! A rule is declared in a template by its slug, e.g. `:id(int, between(1, 100))`,
//! and instantiated through a `RuleFactory` when the trie is compiled.

mod builtin;

pub use self::builtin::{
    AlphaRule, AlphanumericRule, BetweenRule, DateRule, InRule, IntegerRule, NotInRule,
    NumericRule, RegexRule, UuidV4Rule,
};

use {
    failure::Fail,
    indexmap::IndexMap,
    serde::{Deserialize, Serialize},
    std::{fmt, sync::Arc},
    uri_router_template::Number,
};

/// A trait representing a predicate over the value of a route variable.
pub trait Rule: fmt::Debug + Send + Sync + 'static {
    /// Returns whether the value satisfies this rule.
    fn passes(&self, value: &str) -> bool;
}

/// An argument passed to a rule constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuleArg {
    /// An integer literal.
    Int(i64),
    /// A decimal literal.
    Float(f64),
    /// A quoted string or a bare identifier.
    Str(String),
}

impl From<Number> for RuleArg {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(n) => RuleArg::Int(n),
            Number::Float(n) => RuleArg::Float(n),
        }
    }
}

impl<'a> From<&'a str> for RuleArg {
    fn from(s: &'a str) -> Self {
        RuleArg::Str(s.into())
    }
}

impl From<String> for RuleArg {
    fn from(s: String) -> Self {
        RuleArg::Str(s)
    }
}

impl From<i64> for RuleArg {
    fn from(n: i64) -> Self {
        RuleArg::Int(n)
    }
}

impl From<f64> for RuleArg {
    fn from(n: f64) -> Self {
        RuleArg::Float(n)
    }
}

impl fmt::Display for RuleArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleArg::Int(n) => fmt::Display::fmt(n, f),
            RuleArg::Float(n) => fmt::Display::fmt(n, f),
            RuleArg::Str(s) => f.write_str(s),
        }
    }
}

impl RuleArg {
    /// Returns the numeric value of the argument, parsing strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RuleArg::Int(n) => Some(*n as f64),
            RuleArg::Float(n) => Some(*n),
            RuleArg::Str(s) => builtin::parse_numeric(s),
        }
    }

    /// Returns the argument if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RuleArg::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// The declaration of a rule as written in a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// The name the rule is registered under.
    pub slug: String,
    /// The arguments of the rule.
    pub args: Vec<RuleArg>,
}

impl RuleSpec {
    /// Creates a declaration from a slug and its arguments.
    pub fn new(slug: impl Into<String>, args: Vec<RuleArg>) -> Self {
        Self {
            slug: slug.into(),
            args,
        }
    }
}

impl fmt::Display for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.slug)?;
        if !self.args.is_empty() {
            let args: Vec<_> = self.args.iter().map(ToString::to_string).collect();
            write!(f, "({})", args.join(", "))?;
        }
        Ok(())
    }
}

/// An error which will be thrown when a rule could not be instantiated.
#[derive(Debug, Fail)]
pub enum RuleError {
    /// No constructor is registered for the slug.
    #[fail(display = "no rule factory is registered for slug \"{}\"", slug)]
    Unregistered {
        /// The slug which was looked up.
        slug: String,
    },

    /// The constructor refused its arguments.
    #[fail(display = "invalid arguments for rule \"{}\": {}", slug, reason)]
    InvalidArguments {
        /// The slug of the rule.
        slug: String,
        /// Why the arguments were refused.
        reason: String,
    },
}

impl RuleError {
    /// Creates an `InvalidArguments` error for the rule.
    pub fn invalid_arguments(slug: &str, reason: impl Into<String>) -> Self {
        RuleError::InvalidArguments {
            slug: slug.into(),
            reason: reason.into(),
        }
    }
}

type Constructor = dyn Fn(&[RuleArg]) -> Result<Arc<dyn Rule>, RuleError> + Send + Sync + 'static;

/// A registry mapping rule slugs to their constructors.
///
/// `RuleFactory::default()` registers all built-in rules.
#[derive(Clone)]
pub struct RuleFactory {
    constructors: IndexMap<String, Arc<Constructor>>,
}

impl fmt::Debug for RuleFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleFactory")
            .field("slugs", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for RuleFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        builtin::register(&mut factory);
        factory
    }
}

impl RuleFactory {
    /// Creates a factory without any registered rules.
    pub fn empty() -> Self {
        Self {
            constructors: IndexMap::new(),
        }
    }

    /// Registers a constructor for the specified slug, replacing the previous one if any.
    pub fn register<F>(&mut self, slug: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&[RuleArg]) -> Result<Arc<dyn Rule>, RuleError> + Send + Sync + 'static,
    {
        self.constructors.insert(slug.into(), Arc::new(constructor));
        self
    }

    /// Returns whether a constructor is registered for the slug.
    pub fn has(&self, slug: &str) -> bool {
        self.constructors.contains_key(slug)
    }

    /// Creates a rule instance from its slug and arguments.
    pub fn create_rule(&self, slug: &str, args: &[RuleArg]) -> Result<Arc<dyn Rule>, RuleError> {
        let constructor = self
            .constructors
            .get(slug)
            .ok_or_else(|| RuleError::Unregistered { slug: slug.into() })?;
        constructor(args)
    }

    /// Instantiates the rule declared by the spec.
    pub fn create(&self, spec: &RuleSpec) -> Result<Arc<dyn Rule>, RuleError> {
        self.create_rule(&spec.slug, &spec.args)
    }
}
