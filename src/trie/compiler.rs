use {
    super::{CompiledRule, RouteVariable, SegmentPart, TrieNode},
    crate::{
        error::Result,
        route::{Route, RouteCollection, VariableDeclaration},
        rule::RuleFactory,
    },
    failure::ResultExt,
    std::sync::Arc,
    uri_router_template::{Ast, NodeId, NodeKind},
};

/// A piece of an expanded template, before it is split into segments.
#[derive(Debug, Clone)]
enum Piece {
    Text(String),
    Variable(NodeId),
}

/// Compiles routes into a `TrieNode`.
#[derive(Debug, Clone, Default)]
pub struct TrieCompiler {
    rules: Arc<RuleFactory>,
}

impl TrieCompiler {
    /// Creates a compiler which instantiates rules through the factory.
    pub fn new(rules: Arc<RuleFactory>) -> Self {
        Self { rules }
    }

    /// Returns the factory which instantiates rules.
    pub fn rule_factory(&self) -> &Arc<RuleFactory> {
        &self.rules
    }

    /// Compiles all routes in the collection into a new trie.
    pub fn compile_all(&self, routes: &RouteCollection) -> Result<TrieNode> {
        let mut trie = TrieNode::default();
        for route in routes {
            self.compile(&mut trie, route.clone())?;
        }
        log::debug!(
            "compiled {} routes into {} trie entries",
            routes.len(),
            trie.route_count()
        );
        Ok(trie)
    }

    /// Inserts a route into the trie.
    ///
    /// The node at which each optional part of the path template begins
    /// becomes terminal for the route as well.
    pub fn compile(&self, trie: &mut TrieNode, route: Arc<Route>) -> Result<()> {
        let template = route.uri_template();

        let path_variants = self
            .compile_template(template.path_template(), '/')
            .with_context(|_| format!("failed to compile the path of route `{}`", route))?;

        let host_variants = match template.host_template() {
            Some(host) => {
                let mut variants = self
                    .compile_template(host, '.')
                    .with_context(|_| format!("failed to compile the host of route `{}`", route))?;
                for variant in &mut variants {
                    variant.reverse();
                }
                Some(variants)
            }
            None => None,
        };

        for path in path_variants {
            let n = insert_segments(trie, path);
            match host_variants {
                Some(ref host_variants) => {
                    for host in host_variants {
                        insert_segments(n.host_trie_mut(), host.clone()).add_route(route.clone());
                    }
                }
                None => n.add_route(route.clone()),
            }
        }

        Ok(())
    }

    fn compile_template(&self, template: &str, delimiter: char) -> Result<Vec<Vec<Vec<SegmentPart>>>> {
        let ast = uri_router_template::parse(template)?;
        expand(&ast, NodeId::root(), delimiter == '.')
            .into_iter()
            .map(|pieces| self.segments(&ast, pieces, delimiter))
            .collect()
    }

    /// Splits the expanded pieces into segments and instantiates the rules of
    /// each variable.
    fn segments(&self, ast: &Ast, pieces: Vec<Piece>, delimiter: char) -> Result<Vec<Vec<SegmentPart>>> {
        let mut segments = vec![];
        let mut current: Vec<SegmentPart> = vec![];

        for piece in pieces {
            match piece {
                Piece::Text(text) => {
                    let mut chunks = text.split(delimiter);
                    if let Some(first) = chunks.next() {
                        push_text(&mut current, first);
                    }
                    for chunk in chunks {
                        if !current.is_empty() {
                            segments.push(std::mem::replace(&mut current, vec![]));
                        }
                        push_text(&mut current, chunk);
                    }
                }
                Piece::Variable(id) => {
                    let variable = self.route_variable(VariableDeclaration::from_ast(ast, id))?;
                    current.push(SegmentPart::Variable(variable));
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        Ok(segments)
    }

    fn route_variable(&self, decl: VariableDeclaration) -> Result<RouteVariable> {
        let VariableDeclaration {
            name,
            default,
            rules,
        } = decl;
        let rules = rules
            .into_iter()
            .map(|spec| -> Result<CompiledRule> {
                let rule = self.rules.create(&spec).with_context(|_| {
                    format!("failed to create the rule `{}` of variable `{}`", spec, name)
                })?;
                Ok(CompiledRule { spec, rule })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(RouteVariable {
            name,
            default,
            rules,
        })
    }
}

fn push_text(parts: &mut Vec<SegmentPart>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(SegmentPart::Text(last)) = parts.last_mut() {
        last.push_str(text);
        return;
    }
    parts.push(SegmentPart::Text(text.to_owned()));
}

/// Collects the variants of a template: one ending where each optional
/// part begins, in document order, followed by the full template.
///
/// Omitting an optional part drops everything after it, so the number of
/// variants grows with the number of optional parts rather than doubling.
/// With `from_end`, the template is read from its end instead, as host
/// templates are matched from their last label.
fn expand(ast: &Ast, id: NodeId, from_end: bool) -> Vec<Vec<Piece>> {
    let mut variants = vec![];
    let mut pieces = vec![];
    collect_pieces(ast, id, from_end, &mut pieces, &mut variants);
    variants.push(pieces);
    if from_end {
        for variant in &mut variants {
            variant.reverse();
        }
    }
    variants
}

fn collect_pieces(
    ast: &Ast,
    id: NodeId,
    from_end: bool,
    pieces: &mut Vec<Piece>,
    variants: &mut Vec<Vec<Piece>>,
) {
    let mut children: Vec<_> = ast.children(id).collect();
    if from_end {
        children.reverse();
    }
    for (child_id, child) in children {
        match child.kind() {
            NodeKind::Text => {
                pieces.push(Piece::Text(child.text().unwrap_or_default().to_owned()));
            }
            NodeKind::Variable => pieces.push(Piece::Variable(child_id)),
            NodeKind::OptionalRoutePart => {
                variants.push(pieces.clone());
                collect_pieces(ast, child_id, from_end, pieces, variants);
            }
            _ => {}
        }
    }
}

/// Walks down the trie along the segments, creating missing nodes, and
/// returns the node reached by the last segment.
fn insert_segments(trie: &mut TrieNode, segments: Vec<Vec<SegmentPart>>) -> &mut TrieNode {
    let mut n = trie;
    for parts in segments {
        let literal = match parts[..] {
            [SegmentPart::Text(ref text)] => Some(text.clone()),
            _ => None,
        };
        n = match literal {
            Some(text) => { n }.literal_child_mut(&text),
            None => { n }.variable_child_mut(parts),
        };
    }
    n
}
