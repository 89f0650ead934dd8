//! The prefix tree which routes are compiled into.

mod cache;
mod compiler;
mod factory;

pub use self::{
    cache::{FileTrieCache, MemoryTrieCache, TrieCache},
    compiler::TrieCompiler,
    factory::{RouteFactory, TrieFactory},
};

use {
    crate::{
        route::Route,
        rule::{Rule, RuleSpec},
    },
    indexmap::IndexMap,
    regex::{Regex, RegexBuilder},
    std::{fmt, iter, sync::Arc},
};

/// The values bound to route variables, in the order they were matched.
pub type RouteVariables = IndexMap<String, String>;

/// A node of the routing trie.
///
/// The structure is built once and then shared between matchers as read only.
#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    pub(crate) literal_children: IndexMap<String, TrieNode>,
    pub(crate) variable_children: Vec<VariableTrieNode>,
    pub(crate) routes: Vec<Arc<Route>>,
    pub(crate) host_trie: Option<Box<TrieNode>>,
}

impl TrieNode {
    /// Creates an empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the child keyed by the literal segment, ignoring case.
    pub fn literal_child(&self, segment: &str) -> Option<&TrieNode> {
        self.literal_children.get(&*segment.to_lowercase())
    }

    /// Returns the literal children with their lowercased keys, in insertion order.
    pub fn literal_children(&self) -> impl Iterator<Item = (&str, &TrieNode)> {
        self.literal_children.iter().map(|(k, v)| (&**k, v))
    }

    /// Returns the variable children in declaration order.
    pub fn variable_children(&self) -> &[VariableTrieNode] {
        &self.variable_children[..]
    }

    /// Returns the routes terminal at this node.
    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes[..]
    }

    /// Returns the host trie attached to this path-terminal node.
    pub fn host_trie(&self) -> Option<&TrieNode> {
        self.host_trie.as_ref().map(|t| &**t)
    }

    /// Returns whether nothing has been compiled into this node.
    pub fn is_empty(&self) -> bool {
        self.literal_children.is_empty()
            && self.variable_children.is_empty()
            && self.routes.is_empty()
            && self.host_trie.is_none()
    }

    /// Returns the total number of route entries stored in this subtree.
    pub fn route_count(&self) -> usize {
        self.routes.len()
            + self.literal_children.values().map(TrieNode::route_count).sum::<usize>()
            + self
                .variable_children
                .iter()
                .map(|ch| ch.node.route_count())
                .sum::<usize>()
            + self.host_trie().map_or(0, TrieNode::route_count)
    }

    /// Registers a route as terminal at this node.
    ///
    /// A route which is already registered here is not added twice.
    pub(crate) fn add_route(&mut self, route: Arc<Route>) {
        if !self.routes.iter().any(|r| Arc::ptr_eq(r, &route)) {
            self.routes.push(route);
        }
    }

    pub(crate) fn literal_child_mut(&mut self, segment: &str) -> &mut TrieNode {
        self.literal_children
            .entry(segment.to_lowercase())
            .or_insert_with(TrieNode::default)
    }

    pub(crate) fn variable_child_mut(&mut self, parts: Vec<SegmentPart>) -> &mut TrieNode {
        let pos = match self.variable_children.iter().position(|ch| ch.parts == parts) {
            Some(pos) => pos,
            None => {
                self.variable_children.push(VariableTrieNode::new(parts));
                self.variable_children.len() - 1
            }
        };
        &mut self.variable_children[pos].node
    }

    pub(crate) fn host_trie_mut(&mut self) -> &mut TrieNode {
        self.host_trie.get_or_insert_with(Default::default)
    }
}

/// A rule instantiated from its declaration.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// The declaration the rule was created from.
    pub spec: RuleSpec,
    /// The instantiated rule.
    pub rule: Arc<dyn Rule>,
}

impl PartialEq for CompiledRule {
    fn eq(&self, other: &Self) -> bool {
        self.spec == other.spec
    }
}

/// A route variable compiled into the trie.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteVariable {
    /// The name of the variable.
    pub name: String,
    /// The value bound when the variable is omitted.
    pub default: Option<String>,
    /// The rules a value must satisfy, in declaration order.
    pub rules: Vec<CompiledRule>,
}

impl RouteVariable {
    /// Returns whether the value satisfies all rules of this variable.
    pub fn is_match(&self, value: &str) -> bool {
        self.rules.iter().all(|r| r.rule.passes(value))
    }
}

/// A piece of a segment of the trie.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentPart {
    /// Literal text, compared ignoring case.
    Text(String),
    /// A variable bound to part of the segment.
    Variable(RouteVariable),
}

impl fmt::Display for SegmentPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentPart::Text(s) => f.write_str(s),
            SegmentPart::Variable(v) => write!(f, ":{}", v.name),
        }
    }
}

/// A child node reached through a segment which contains route variables.
///
/// A segment mixing text and variables, such as `:name.:ext`, binds the
/// shortest values accepted by the rules, from left to right.
#[derive(Debug, Clone)]
pub struct VariableTrieNode {
    parts: Vec<SegmentPart>,
    regex: Option<Regex>,
    pub(crate) node: TrieNode,
}

impl VariableTrieNode {
    pub(crate) fn new(parts: Vec<SegmentPart>) -> Self {
        let regex = match parts[..] {
            [SegmentPart::Variable(..)] => None,
            _ => Some(segment_regex(&parts)),
        };
        Self {
            parts,
            regex,
            node: TrieNode::default(),
        }
    }

    /// Returns the parts of the segment.
    pub fn parts(&self) -> &[SegmentPart] {
        &self.parts[..]
    }

    /// Returns the node reached through this segment.
    pub fn node(&self) -> &TrieNode {
        &self.node
    }

    /// Returns the variables of the segment in order.
    pub fn variables(&self) -> impl Iterator<Item = &RouteVariable> {
        self.parts.iter().filter_map(|part| match part {
            SegmentPart::Variable(v) => Some(v),
            SegmentPart::Text(..) => None,
        })
    }

    /// Tests the segment against this node, and returns the extended set of
    /// route variables if it matches.
    pub fn match_segment(&self, segment: &str, variables: &RouteVariables) -> Option<RouteVariables> {
        match self.regex {
            None => {
                let var = self.variables().next()?;
                if !var.is_match(segment) {
                    return None;
                }
                let mut variables = variables.clone();
                variables.insert(var.name.clone(), segment.to_owned());
                Some(variables)
            }
            Some(ref regex) => {
                if !regex.is_match(segment) {
                    return None;
                }
                let mut bound = vec![];
                if !bind_parts(&self.parts, segment, &mut bound) {
                    return None;
                }
                let mut variables = variables.clone();
                for (var, value) in bound {
                    variables.insert(var.name.clone(), value.to_owned());
                }
                Some(variables)
            }
        }
    }
}

/// Binds the variables of a mixed segment, trying shorter values first and
/// moving on to the next split whenever a rule rejects a value.
fn bind_parts<'p, 's>(
    parts: &'p [SegmentPart],
    segment: &'s str,
    bound: &mut Vec<(&'p RouteVariable, &'s str)>,
) -> bool {
    let (part, parts) = match parts.split_first() {
        Some(split) => split,
        None => return segment.is_empty(),
    };
    match part {
        SegmentPart::Text(text) => match segment.get(..text.len()) {
            Some(head) if head.eq_ignore_ascii_case(text) => {
                bind_parts(parts, &segment[text.len()..], bound)
            }
            _ => false,
        },
        SegmentPart::Variable(var) => {
            let ends = segment
                .char_indices()
                .map(|(i, _)| i)
                .chain(iter::once(segment.len()))
                .filter(|&end| end > 0);
            for end in ends {
                let value = &segment[..end];
                if !var.is_match(value) {
                    continue;
                }
                bound.push((var, value));
                if bind_parts(parts, &segment[end..], bound) {
                    return true;
                }
                bound.pop();
            }
            false
        }
    }
}

fn segment_regex(parts: &[SegmentPart]) -> Regex {
    let mut pattern = String::from("^");
    for part in parts {
        match part {
            SegmentPart::Text(s) => pattern += &regex::escape(s),
            SegmentPart::Variable(..) => pattern += "(.+?)",
        }
    }
    pattern += "$";
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .expect("should be a valid pattern")
}
