use {
    super::{CompiledRule, RouteVariable, SegmentPart, TrieNode, VariableTrieNode},
    crate::{
        constraint::{ConstraintDescriptor, ConstraintFactory, RouteConstraint},
        error::Result,
        route::{MiddlewareBinding, Route, RouteAction, UriTemplate},
        rule::{RuleFactory, RuleSpec},
    },
    failure::ResultExt,
    http::Method,
    indexmap::IndexMap,
    serde::{Deserialize, Serialize},
    std::{
        collections::HashMap,
        fmt, fs, io,
        path::{Path, PathBuf},
        sync::{Arc, RwLock},
    },
};

/// A trait representing a store of a compiled trie.
///
/// The router never invalidates a cache by itself. Call `flush` whenever the
/// route table has changed.
pub trait TrieCache: fmt::Debug + Send + Sync {
    /// Returns the cached trie, or `None` on a cache miss.
    fn get(&self) -> Result<Option<TrieNode>>;

    /// Stores the trie, replacing any previous one.
    fn set(&self, trie: &TrieNode) -> Result<()>;

    /// Removes the cached trie.
    fn flush(&self) -> Result<()>;
}

/// A cache which keeps the trie in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryTrieCache {
    trie: RwLock<Option<TrieNode>>,
}

impl MemoryTrieCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrieCache for MemoryTrieCache {
    fn get(&self) -> Result<Option<TrieNode>> {
        let trie = self
            .trie
            .read()
            .map_err(|_| failure::format_err!("the trie cache lock is poisoned"))?;
        Ok((*trie).clone())
    }

    fn set(&self, trie: &TrieNode) -> Result<()> {
        let mut cached = self
            .trie
            .write()
            .map_err(|_| failure::format_err!("the trie cache lock is poisoned"))?;
        *cached = Some(trie.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut cached = self
            .trie
            .write()
            .map_err(|_| failure::format_err!("the trie cache lock is poisoned"))?;
        *cached = None;
        Ok(())
    }
}

/// A cache which stores the trie as a JSON file.
///
/// Rules and constraints are stored by their descriptors and are instantiated
/// again through the factories when the file is read.
#[derive(Debug)]
pub struct FileTrieCache {
    path: PathBuf,
    rules: Arc<RuleFactory>,
    constraints: Arc<ConstraintFactory>,
}

impl FileTrieCache {
    /// Creates a cache stored at the path, using the default factories.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rules: Arc::new(RuleFactory::default()),
            constraints: Arc::new(ConstraintFactory::default()),
        }
    }

    /// Sets the factory which restores the rules of cached variables.
    pub fn with_rule_factory(self, rules: Arc<RuleFactory>) -> Self {
        Self { rules, ..self }
    }

    /// Sets the factory which restores cached constraints.
    pub fn with_constraint_factory(self, constraints: Arc<ConstraintFactory>) -> Self {
        Self {
            constraints,
            ..self
        }
    }

    /// Returns the location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

impl TrieCache for FileTrieCache {
    fn get(&self) -> Result<Option<TrieNode>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|_| format!("failed to read {}", self.path.display()))
                    .map_err(Into::into);
            }
        };
        let cached: CachedTrie = serde_json::from_str(&content)
            .with_context(|_| format!("malformed trie cache at {}", self.path.display()))?;
        cached.restore(&self.rules, &self.constraints).map(Some)
    }

    fn set(&self, trie: &TrieNode) -> Result<()> {
        let cached = CachedTrie::store(trie)?;
        let content = serde_json::to_string(&cached)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // the file is replaced by a rename, so a reader never sees a partial write.
        let staging = self.staging_path();
        fs::write(&staging, content)
            .with_context(|_| format!("failed to write {}", staging.display()))?;
        if let Err(e) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(e)
                .with_context(|_| format!("failed to replace {}", self.path.display()))
                .map_err(Into::into);
        }
        log::debug!("wrote the trie cache to {}", self.path.display());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("removed the trie cache at {}", self.path.display());
                Ok(())
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedTrie {
    routes: Vec<CachedRoute>,
    root: CachedNode,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedRoute {
    methods: Vec<String>,
    template: UriTemplate,
    action: RouteAction,
    middleware: Vec<MiddlewareBinding>,
    constraints: Vec<ConstraintDescriptor>,
    attributes: IndexMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedNode {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    literals: IndexMap<String, CachedNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    variables: Vec<CachedVariableNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    routes: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    host: Option<Box<CachedNode>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedVariableNode {
    parts: Vec<CachedPart>,
    node: CachedNode,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CachedPart {
    Text(String),
    Variable {
        name: String,
        default: Option<String>,
        rules: Vec<RuleSpec>,
    },
}

/// The routes already assigned an index in the route table.
#[derive(Default)]
struct RouteTable {
    routes: Vec<CachedRoute>,
    indices: HashMap<*const Route, usize>,
}

impl RouteTable {
    fn index_of(&mut self, route: &Arc<Route>) -> Result<usize> {
        let key = &**route as *const Route;
        if let Some(&i) = self.indices.get(&key) {
            return Ok(i);
        }

        let constraints = route
            .constraints()
            .iter()
            .map(|c| {
                c.descriptor().ok_or_else(|| {
                    failure::format_err!(
                        "the constraint {:?} of route `{}` cannot be cached since it has no descriptor",
                        c,
                        route
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.routes.push(CachedRoute {
            methods: route.methods().iter().map(|m| m.as_str().to_owned()).collect(),
            template: route.uri_template().clone(),
            action: route.action().clone(),
            middleware: route.middleware().to_vec(),
            constraints,
            attributes: route.attributes().clone(),
        });
        let i = self.routes.len() - 1;
        self.indices.insert(key, i);
        Ok(i)
    }
}

impl CachedTrie {
    fn store(trie: &TrieNode) -> Result<Self> {
        let mut table = RouteTable::default();
        let root = CachedNode::store(trie, &mut table)?;
        Ok(Self {
            routes: table.routes,
            root,
        })
    }

    fn restore(self, rules: &RuleFactory, constraints: &ConstraintFactory) -> Result<TrieNode> {
        let routes = self
            .routes
            .into_iter()
            .map(|route| route.restore(constraints).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        self.root.restore(&routes, rules)
    }
}

impl CachedRoute {
    fn restore(self, factory: &ConstraintFactory) -> Result<Route> {
        let methods = self
            .methods
            .iter()
            .map(|m| m.parse::<Method>().map_err(Into::into))
            .collect::<Result<_>>()?;
        let constraints = self
            .constraints
            .iter()
            .map(|descriptor| factory.create(descriptor))
            .collect::<Result<Vec<Arc<dyn RouteConstraint>>>>()?;
        Ok(Route::from_parts(
            methods,
            self.template,
            self.action,
            self.middleware,
            constraints,
            self.attributes,
        ))
    }
}

impl CachedNode {
    fn store(node: &TrieNode, table: &mut RouteTable) -> Result<Self> {
        Ok(Self {
            literals: node
                .literal_children
                .iter()
                .map(|(key, child)| -> Result<(String, CachedNode)> {
                    Ok((key.clone(), Self::store(child, table)?))
                })
                .collect::<Result<_>>()?,
            variables: node
                .variable_children
                .iter()
                .map(|child| -> Result<CachedVariableNode> {
                    Ok(CachedVariableNode {
                        parts: child.parts().iter().map(CachedPart::store).collect(),
                        node: Self::store(&child.node, table)?,
                    })
                })
                .collect::<Result<_>>()?,
            routes: node
                .routes
                .iter()
                .map(|route| table.index_of(route))
                .collect::<Result<_>>()?,
            host: match node.host_trie {
                Some(ref host) => Some(Box::new(Self::store(host, table)?)),
                None => None,
            },
        })
    }

    fn restore(self, routes: &[Arc<Route>], rules: &RuleFactory) -> Result<TrieNode> {
        let mut node = TrieNode::default();
        for (key, child) in self.literals {
            node.literal_children.insert(key, child.restore(routes, rules)?);
        }
        for child in self.variables {
            let parts = child
                .parts
                .into_iter()
                .map(|part| part.restore(rules))
                .collect::<Result<Vec<_>>>()?;
            let mut variable = VariableTrieNode::new(parts);
            variable.node = child.node.restore(routes, rules)?;
            node.variable_children.push(variable);
        }
        for i in self.routes {
            let route = routes
                .get(i)
                .ok_or_else(|| failure::format_err!("dangling route index {} in trie cache", i))?;
            node.routes.push(route.clone());
        }
        if let Some(host) = self.host {
            node.host_trie = Some(Box::new(host.restore(routes, rules)?));
        }
        Ok(node)
    }
}

impl CachedPart {
    fn store(part: &SegmentPart) -> Self {
        match part {
            SegmentPart::Text(text) => CachedPart::Text(text.clone()),
            SegmentPart::Variable(var) => CachedPart::Variable {
                name: var.name.clone(),
                default: var.default.clone(),
                rules: var.rules.iter().map(|r| r.spec.clone()).collect(),
            },
        }
    }

    fn restore(self, factory: &RuleFactory) -> Result<SegmentPart> {
        match self {
            CachedPart::Text(text) => Ok(SegmentPart::Text(text)),
            CachedPart::Variable {
                name,
                default,
                rules,
            } => {
                let rules = rules
                    .into_iter()
                    .map(|spec| -> Result<CompiledRule> {
                        let rule = factory.create(&spec)?;
                        Ok(CompiledRule { spec, rule })
                    })
                    .collect::<Result<_>>()?;
                Ok(SegmentPart::Variable(RouteVariable {
                    name,
                    default,
                    rules,
                }))
            }
        }
    }
}
