//! The abstract syntax tree of URI templates.
//!
//! The nodes are stored in an arena and addressed by `NodeId`. A node owns
//! its children through their indices and refers back to its parent by index.

use {
    crate::lexer::Number,
    std::{fmt, ops::Index},
};

/// The index of a node in an `Ast`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the id of the root node.
    pub fn root() -> Self {
        NodeId(0)
    }
}

/// The kind of an AST node.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The root of the tree.
    Root,
    /// Literal text, or a string argument of a rule.
    Text,
    /// A numeric argument of a rule.
    Number,
    /// A route variable, valued with its name.
    Variable,
    /// The default value of a variable.
    VariableDefaultValue,
    /// A rule of a variable, valued with its slug.
    VariableRule,
    /// The argument list of a rule.
    VariableRuleParameters,
    /// A part of the template which may be omitted.
    OptionalRoutePart,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The value carried by an AST node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// No value.
    None,
    /// A text value.
    Text(String),
    /// A numeric value.
    Number(Number),
}

/// A node of the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: NodeKind,
    value: NodeValue,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    /// Returns the kind of this node.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the value of this node.
    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    /// Returns the value of this node if it is text.
    pub fn text(&self) -> Option<&str> {
        match self.value {
            NodeValue::Text(ref s) => Some(s),
            _ => None,
        }
    }

    /// Returns the parent, or `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the children in document order.
    pub fn children(&self) -> &[NodeId] {
        &self.children[..]
    }
}

/// A URI template parsed into a tree of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Default for Ast {
    fn default() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                value: NodeValue::None,
                parent: None,
                children: vec![],
            }],
        }
    }
}

impl Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id.0]
    }
}

impl Ast {
    /// Returns the root node.
    pub fn root(&self) -> &Node {
        &self[NodeId::root()]
    }

    /// Returns the number of nodes, including the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.root().children.is_empty()
    }

    /// Appends a new node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind, value: NodeValue) -> NodeId {
        debug_assert!(kind != NodeKind::Root);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            value,
            parent: Some(parent),
            children: vec![],
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Returns an iterator over the children of the specified node.
    pub fn children<'a>(&'a self, id: NodeId) -> impl Iterator<Item = (NodeId, &'a Node)> + 'a {
        self[id].children.iter().map(move |&child| (child, &self[child]))
    }

    /// Returns the first child of the specified node with the given kind.
    pub fn find_child(&self, id: NodeId, kind: NodeKind) -> Option<(NodeId, &Node)> {
        self.children(id).find(|(_, node)| node.kind == kind)
    }

    /// Returns an iterator over the node IDs in depth-first, document order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            ast: self,
            stack: self[id].children.iter().rev().cloned().collect(),
        }
    }
}

/// An iterator over the descendants of a node in document order.
#[derive(Debug)]
pub struct Descendants<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = &self.ast[id];
        self.stack.extend(node.children.iter().rev().cloned());
        Some((id, node))
    }
}
