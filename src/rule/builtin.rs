use {
    super::{Rule, RuleArg, RuleError, RuleFactory},
    chrono::{
        format::{Item, StrftimeItems},
        NaiveDate, NaiveDateTime, NaiveTime,
    },
    lazy_static::lazy_static,
    regex::Regex,
    std::sync::Arc,
};

lazy_static! {
    static ref NUMERIC: Regex =
        Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
            .expect("should be a valid pattern");
    static ref UUID_V4: Regex = Regex::new(
        r"(?i)^\{?[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}\}?$"
    )
    .expect("should be a valid pattern");
}

pub(super) fn parse_numeric(value: &str) -> Option<f64> {
    if NUMERIC.is_match(value) {
        value.parse().ok()
    } else {
        None
    }
}

pub(super) fn register(factory: &mut RuleFactory) {
    factory
        .register("alpha", |args| {
            no_args("alpha", args)?;
            Ok(Arc::new(AlphaRule) as Arc<dyn Rule>)
        })
        .register("alphanumeric", |args| {
            no_args("alphanumeric", args)?;
            Ok(Arc::new(AlphanumericRule) as Arc<dyn Rule>)
        })
        .register("numeric", |args| {
            no_args("numeric", args)?;
            Ok(Arc::new(NumericRule) as Arc<dyn Rule>)
        })
        .register("int", |args| {
            no_args("int", args)?;
            Ok(Arc::new(IntegerRule) as Arc<dyn Rule>)
        })
        .register("uuidv4", |args| {
            no_args("uuidv4", args)?;
            Ok(Arc::new(UuidV4Rule) as Arc<dyn Rule>)
        })
        .register("regex", |args| match args {
            [RuleArg::Str(pattern)] => RegexRule::new(pattern)
                .map(|rule| Arc::new(rule) as Arc<dyn Rule>)
                .map_err(|e| RuleError::invalid_arguments("regex", e.to_string())),
            _ => Err(RuleError::invalid_arguments(
                "regex",
                "expected a single pattern string",
            )),
        })
        .register("date", |args| {
            let formats = args
                .iter()
                .map(|arg| arg.as_str().map(ToOwned::to_owned))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| RuleError::invalid_arguments("date", "formats must be strings"))?;
            DateRule::new(formats).map(|rule| Arc::new(rule) as Arc<dyn Rule>)
        })
        .register("in", |args| {
            Ok(Arc::new(InRule::new(args.iter().map(ToString::to_string))) as Arc<dyn Rule>)
        })
        .register("notIn", |args| {
            Ok(Arc::new(NotInRule::new(args.iter().map(ToString::to_string))) as Arc<dyn Rule>)
        })
        .register("between", |args| {
            BetweenRule::from_args(args).map(|rule| Arc::new(rule) as Arc<dyn Rule>)
        });
}

fn no_args(slug: &str, args: &[RuleArg]) -> Result<(), RuleError> {
    if !args.is_empty() {
        return Err(RuleError::invalid_arguments(slug, "takes no arguments"));
    }
    Ok(())
}

/// Passes for non-empty values consisting of ASCII letters.
#[derive(Debug, Default, Clone)]
pub struct AlphaRule;

impl Rule for AlphaRule {
    fn passes(&self, value: &str) -> bool {
        !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic())
    }
}

/// Passes for non-empty values consisting of ASCII letters and digits.
#[derive(Debug, Default, Clone)]
pub struct AlphanumericRule;

impl Rule for AlphanumericRule {
    fn passes(&self, value: &str) -> bool {
        !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

/// Passes for any signed integer or decimal literal, with an optional exponent.
#[derive(Debug, Default, Clone)]
pub struct NumericRule;

impl Rule for NumericRule {
    fn passes(&self, value: &str) -> bool {
        parse_numeric(value).is_some()
    }
}

/// Passes for base-10 integers in the range of `i64`.
#[derive(Debug, Default, Clone)]
pub struct IntegerRule;

impl Rule for IntegerRule {
    fn passes(&self, value: &str) -> bool {
        value.parse::<i64>().is_ok()
    }
}

/// Passes if the whole value matches the pattern.
#[derive(Debug, Clone)]
pub struct RegexRule {
    regex: Regex,
}

impl RegexRule {
    /// Creates a rule which anchors the pattern to the whole value.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(&format!("^(?:{})$", pattern))?,
        })
    }
}

impl Rule for RegexRule {
    fn passes(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// Passes if the value parses under one of the formats and formats back to itself.
///
/// The formats use the `strftime` syntax of `chrono`.
#[derive(Debug, Clone)]
pub struct DateRule {
    formats: Vec<String>,
}

impl DateRule {
    /// Creates a rule from `strftime` formats, rejecting malformed ones.
    pub fn new(formats: Vec<String>) -> Result<Self, RuleError> {
        if formats.is_empty() {
            return Err(RuleError::invalid_arguments(
                "date",
                "at least one format is required",
            ));
        }
        for format in &formats {
            if StrftimeItems::new(format).any(|item| item == Item::Error) {
                return Err(RuleError::invalid_arguments(
                    "date",
                    format!("invalid date format \"{}\"", format),
                ));
            }
        }
        Ok(Self { formats })
    }
}

impl Rule for DateRule {
    fn passes(&self, value: &str) -> bool {
        self.formats.iter().any(|format| round_trips(value, format))
    }
}

fn round_trips(value: &str, format: &str) -> bool {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
        return datetime.format(format).to_string() == value;
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, format) {
        return date.format(format).to_string() == value;
    }
    if let Ok(time) = NaiveTime::parse_from_str(value, format) {
        return time.format(format).to_string() == value;
    }
    false
}

/// Passes if the value equals one of the values.
#[derive(Debug, Clone)]
pub struct InRule {
    values: Vec<String>,
}

impl InRule {
    /// Creates a rule from the accepted values.
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl Rule for InRule {
    fn passes(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// Passes if the value equals none of the values.
#[derive(Debug, Clone)]
pub struct NotInRule {
    values: Vec<String>,
}

impl NotInRule {
    /// Creates a rule from the rejected values.
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl Rule for NotInRule {
    fn passes(&self, value: &str) -> bool {
        self.values.iter().all(|v| v != value)
    }
}

/// Passes if the value is a number within the range.
#[derive(Debug, Clone)]
pub struct BetweenRule {
    min: f64,
    max: f64,
    inclusive: bool,
}

impl BetweenRule {
    /// Creates a rule for the range, including the bounds if `inclusive` is set.
    pub fn new(min: f64, max: f64, inclusive: bool) -> Self {
        Self {
            min,
            max,
            inclusive,
        }
    }

    fn from_args(args: &[RuleArg]) -> Result<Self, RuleError> {
        if args.len() < 2 || args.len() > 3 {
            return Err(RuleError::invalid_arguments(
                "between",
                "expected a minimum, a maximum and an optional inclusiveness flag",
            ));
        }
        let min = args[0]
            .as_f64()
            .ok_or_else(|| RuleError::invalid_arguments("between", "minimum must be numeric"))?;
        let max = args[1]
            .as_f64()
            .ok_or_else(|| RuleError::invalid_arguments("between", "maximum must be numeric"))?;
        let inclusive = match args.get(2) {
            None | Some(RuleArg::Int(1)) => true,
            Some(RuleArg::Int(0)) => false,
            Some(RuleArg::Str(ref s)) if s == "true" => true,
            Some(RuleArg::Str(ref s)) if s == "false" => false,
            Some(arg) => {
                return Err(RuleError::invalid_arguments(
                    "between",
                    format!("invalid inclusiveness flag: {}", arg),
                ));
            }
        };
        Ok(Self::new(min, max, inclusive))
    }
}

impl Rule for BetweenRule {
    fn passes(&self, value: &str) -> bool {
        match parse_numeric(value) {
            Some(n) if self.inclusive => n >= self.min && n <= self.max,
            Some(n) => n > self.min && n < self.max,
            None => false,
        }
    }
}

/// Passes for the textual form of a version 4 UUID, optionally wrapped in braces.
#[derive(Debug, Default, Clone)]
pub struct UuidV4Rule;

impl Rule for UuidV4Rule {
    fn passes(&self, value: &str) -> bool {
        UUID_V4.is_match(value)
    }
}
