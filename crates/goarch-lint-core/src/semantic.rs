//! Semantic bridge: read-only type, method-set and package facts.
//!
//! Facts are computed once per unit by the front-end and stored in a
//! [`FactTable`]. A missing fact means "cannot confirm", never "violation".

use crate::tree::NodeId;
use std::collections::HashMap;

/// A resolved type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Predeclared basic type (`int64`, `string`, ...).
    Basic(String),
    /// Named type; `package` is `None` for predeclared names like `error`.
    Named {
        /// Defining package import path.
        package: Option<String>,
        /// Type name.
        name: String,
    },
    /// `*T`.
    Pointer(Box<Type>),
    /// `[]T`.
    Slice(Box<Type>),
}

impl Type {
    /// The predeclared `error` interface.
    #[must_use]
    pub fn error() -> Self {
        Self::Named {
            package: None,
            name: "error".to_string(),
        }
    }

    /// A basic type by name.
    #[must_use]
    pub fn basic(name: impl Into<String>) -> Self {
        Self::Basic(name.into())
    }

    /// A named type.
    #[must_use]
    pub fn named(package: Option<&str>, name: impl Into<String>) -> Self {
        Self::Named {
            package: package.map(String::from),
            name: name.into(),
        }
    }

    /// Returns true for the predeclared `error` type.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Named { package: None, name } if name == "error")
    }

    /// Returns true for `int64`.
    #[must_use]
    pub fn is_int64(&self) -> bool {
        matches!(self, Self::Basic(name) if name == "int64")
    }

    /// Strips pointer indirections.
    #[must_use]
    pub fn strip_pointers(&self) -> &Type {
        match self {
            Self::Pointer(inner) => inner.strip_pointers(),
            other => other,
        }
    }

    /// Name of the (dereferenced) named type.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self.strip_pointers() {
            Self::Named { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Key under which method sets of this type are stored.
    #[must_use]
    pub fn method_set_key(&self) -> Option<String> {
        match self.strip_pointers() {
            Self::Named {
                package: Some(pkg),
                name,
            } => Some(format!("{pkg}.{name}")),
            Self::Named {
                package: None,
                name,
            } => Some(name.clone()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic(name) => write!(f, "{name}"),
            Self::Named {
                package: Some(pkg),
                name,
            } => write!(f, "{pkg}.{name}"),
            Self::Named {
                package: None,
                name,
            } => write!(f, "{name}"),
            Self::Pointer(inner) => write!(f, "*{inner}"),
            Self::Slice(inner) => write!(f, "[]{inner}"),
        }
    }
}

/// Receiver kind of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiverKind {
    /// `func (t T) M()`.
    Value,
    /// `func (t *T) M()`.
    Pointer,
}

/// A method of a named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    /// Method name.
    pub name: String,
    /// Receiver kind.
    pub receiver: ReceiverKind,
}

/// Methods of a type, ordered by name, unique per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSet {
    methods: Vec<Method>,
}

impl MethodSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a method, replacing an existing one of the same name.
    pub fn insert(&mut self, method: Method) {
        match self
            .methods
            .binary_search_by(|m| m.name.as_str().cmp(&method.name))
        {
            Ok(i) => self.methods[i] = method,
            Err(i) => self.methods.insert(i, method),
        }
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Method> {
        self.methods
            .binary_search_by(|m| m.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.methods[i])
    }

    /// Returns true if a method of that name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Methods in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter()
    }

    /// Number of methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns true if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Read-only access to semantic facts of one unit.
pub trait SemanticBridge: Send + Sync {
    /// Resolved type of an expression or type node.
    fn type_of(&self, node: NodeId) -> Option<&Type>;

    /// Declared methods of a type.
    fn method_set(&self, ty: &Type) -> Option<&MethodSet>;

    /// Defining package of a node.
    fn package_path(&self, node: NodeId) -> Option<&str>;
}

/// Pre-computed fact table filled by a front-end.
#[derive(Debug, Clone, Default)]
pub struct FactTable {
    types: HashMap<NodeId, Type>,
    method_sets: HashMap<String, MethodSet>,
    packages: HashMap<NodeId, String>,
    unit_package: Option<String>,
}

impl FactTable {
    /// Creates an empty table (syntax-only analysis).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the package path of the unit, the fallback for
    /// [`SemanticBridge::package_path`].
    pub fn set_unit_package(&mut self, path: impl Into<String>) {
        self.unit_package = Some(path.into());
    }

    /// Records the type of a node.
    pub fn record_type(&mut self, node: NodeId, ty: Type) {
        self.types.insert(node, ty);
    }

    /// Records the package a node refers to (e.g. an import alias).
    pub fn record_package(&mut self, node: NodeId, path: impl Into<String>) {
        self.packages.insert(node, path.into());
    }

    /// Declares a (possibly empty) method set for a named type.
    pub fn declare_type(&mut self, ty: &Type) {
        if let Some(key) = ty.method_set_key() {
            self.method_sets.entry(key).or_default();
        }
    }

    /// Adds a method to a named type's set.
    pub fn record_method(&mut self, ty: &Type, method: Method) {
        if let Some(key) = ty.method_set_key() {
            self.method_sets.entry(key).or_default().insert(method);
        }
    }

    /// Number of typed nodes.
    #[must_use]
    pub fn typed_nodes(&self) -> usize {
        self.types.len()
    }
}

impl SemanticBridge for FactTable {
    fn type_of(&self, node: NodeId) -> Option<&Type> {
        self.types.get(&node)
    }

    fn method_set(&self, ty: &Type) -> Option<&MethodSet> {
        self.method_sets.get(&ty.method_set_key()?)
    }

    fn package_path(&self, node: NodeId) -> Option<&str> {
        self.packages
            .get(&node)
            .or(self.unit_package.as_ref())
            .map(String::as_str)
    }
}
