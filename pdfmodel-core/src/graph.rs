//! The object graph arena owned by a [`Document`](crate::Document).
//!
//! Every indirect object lives in one ordered map keyed by [`ObjectId`].
//! Views never hold pointers into it; they hold a [`NodePath`] which is
//! walked again on every access, so a mutation through one view is seen by
//! every other view of the same node.

use crate::engine::SecurityState;
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Attributes a page inherits from its ancestors in the page tree.
pub const INHERITABLE_PAGE_KEYS: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// Where a node path starts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeRoot {
    Trailer,
    Indirect(ObjectId),
}

/// One step below a node: a dictionary key or an array position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

/// Location of a node, direct or indirect, inside the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodePath {
    root: NodeRoot,
    steps: Vec<PathStep>,
}

impl NodePath {
    pub fn trailer() -> Self {
        Self {
            root: NodeRoot::Trailer,
            steps: Vec::new(),
        }
    }

    pub fn indirect(id: ObjectId) -> Self {
        Self {
            root: NodeRoot::Indirect(id),
            steps: Vec::new(),
        }
    }

    pub fn root(&self) -> &NodeRoot {
        &self.root
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// The indirect object this path starts from, if any.
    pub fn root_id(&self) -> Option<ObjectId> {
        match self.root {
            NodeRoot::Indirect(id) => Some(id),
            NodeRoot::Trailer => None,
        }
    }

    /// True for the path of the trailer dictionary itself.
    pub fn is_trailer_root(&self) -> bool {
        self.steps.is_empty() && matches!(self.root, NodeRoot::Trailer)
    }

    /// True for the path of a whole indirect object.
    pub fn is_indirect_root(&self) -> bool {
        self.steps.is_empty() && matches!(self.root, NodeRoot::Indirect(_))
    }

    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.steps.push(PathStep::Key(key.into()));
        next
    }

    pub fn index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.steps.push(PathStep::Index(index));
        next
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            NodeRoot::Trailer => f.write_str("trailer")?,
            NodeRoot::Indirect(id) => write!(f, "{id}")?,
        }
        for step in &self.steps {
            match step {
                PathStep::Key(key) => write!(f, "/{key}")?,
                PathStep::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Graph {
    version: String,
    trailer: Dictionary,
    objects: BTreeMap<ObjectId, Object>,
    max_id: u32,
    released: BTreeSet<ObjectId>,
    pub(crate) security: Option<SecurityState>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("1.7")
    }
}

impl Graph {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            trailer: Dictionary::new(),
            objects: BTreeMap::new(),
            max_id: 0,
            released: BTreeSet::new(),
            security: None,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub fn trailer_mut(&mut self) -> &mut Dictionary {
        &mut self.trailer
    }

    pub fn set_trailer(&mut self, trailer: Dictionary) {
        self.trailer = trailer;
    }

    pub fn max_id(&self) -> u32 {
        self.max_id
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn is_encrypted(&self) -> bool {
        self.security.is_some() || self.trailer().contains_key("Encrypt")
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn is_released(&self, id: ObjectId) -> bool {
        self.released.contains(&id)
    }

    pub fn get(&self, id: ObjectId) -> Result<&Object> {
        self.objects.get(&id).ok_or_else(|| self.missing(id))
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut Object> {
        if self.released.contains(&id) {
            return Err(PdfError::ObjectReleased(id));
        }
        self.objects
            .get_mut(&id)
            .ok_or(PdfError::ObjectNotFound(id))
    }

    fn missing(&self, id: ObjectId) -> PdfError {
        if self.released.contains(&id) {
            PdfError::ObjectReleased(id)
        } else {
            PdfError::ObjectNotFound(id)
        }
    }

    pub fn insert(&mut self, id: ObjectId, object: Object) {
        self.max_id = self.max_id.max(id.number());
        self.released.remove(&id);
        self.objects.insert(id, object);
    }

    /// Stores `object` under a fresh object number.
    pub fn add_object(&mut self, object: impl Into<Object>) -> Result<ObjectId> {
        let id = self.new_object_id()?;
        self.objects.insert(id, object.into());
        Ok(id)
    }

    pub fn new_object_id(&mut self) -> Result<ObjectId> {
        self.max_id = self
            .max_id
            .checked_add(1)
            .ok_or_else(|| PdfError::InvalidStructure("object numbers exhausted".into()))?;
        Ok(ObjectId::new(self.max_id, 0))
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<Object> {
        self.objects.remove(&id)
    }

    /// Drops an object and remembers that it was released on purpose.
    pub fn release(&mut self, id: ObjectId) -> Result<()> {
        if self.objects.remove(&id).is_none() {
            return Err(self.missing(id));
        }
        self.released.insert(id);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &Object)> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ObjectId, &mut Object)> {
        self.objects.iter_mut()
    }

    pub fn ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    /// Follows a chain of references to the first non-reference value.
    pub fn resolve<'a>(&'a self, object: &'a Object) -> Result<&'a Object> {
        let mut current = object;
        let mut seen = HashSet::new();
        while let Object::Reference(id) = current {
            if !seen.insert(*id) {
                return Err(PdfError::CircularReference(*id));
            }
            current = self.get(*id)?;
        }
        Ok(current)
    }

    /// Resolves `object` and returns its dictionary, if it has one.
    pub fn resolve_dict<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(object).ok().and_then(Object::as_dict)
    }

    pub fn dict(&self, id: ObjectId) -> Result<&Dictionary> {
        let object = self.get(id)?;
        object.as_dict().ok_or(PdfError::TypeMismatch {
            expected: "Dictionary",
            found: object.object_type().as_str(),
        })
    }

    pub fn dict_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary> {
        let object = self.get_mut(id)?;
        let found = object.object_type().as_str();
        object.as_dict_mut().ok_or(PdfError::TypeMismatch {
            expected: "Dictionary",
            found,
        })
    }

    /// The stored node at `path`. The trailer itself is not a stored node;
    /// use [`Graph::with_node`] to read it as an object.
    pub fn node(&self, path: &NodePath) -> Result<&Object> {
        let (mut current, steps) = match path.root() {
            NodeRoot::Indirect(id) => (self.get(*id)?, path.steps()),
            NodeRoot::Trailer => match path.steps().split_first() {
                Some((PathStep::Key(key), rest)) => (
                    self.trailer
                        .get(key)
                        .ok_or_else(|| PdfError::StaleView(path.to_string()))?,
                    rest,
                ),
                Some((PathStep::Index(_), _)) => return Err(PdfError::StaleView(path.to_string())),
                None => return Err(bare_trailer(path)),
            },
        };
        for step in steps {
            current = match (step, current) {
                (PathStep::Key(key), object) => object
                    .as_dict()
                    .and_then(|dict| dict.get(key))
                    .ok_or_else(|| PdfError::StaleView(path.to_string()))?,
                (PathStep::Index(i), Object::Array(items)) => items
                    .get(*i)
                    .ok_or_else(|| PdfError::StaleView(path.to_string()))?,
                (PathStep::Index(_), _) => return Err(PdfError::StaleView(path.to_string())),
            };
        }
        Ok(current)
    }

    pub fn node_mut(&mut self, path: &NodePath) -> Result<&mut Object> {
        let stale = || PdfError::StaleView(path.to_string());
        let (mut current, steps) = match path.root() {
            NodeRoot::Indirect(id) => (self.get_mut(*id)?, path.steps()),
            NodeRoot::Trailer => match path.steps().split_first() {
                Some((PathStep::Key(key), rest)) => {
                    (self.trailer.get_mut(key).ok_or_else(stale)?, rest)
                }
                Some((PathStep::Index(_), _)) => return Err(stale()),
                None => return Err(bare_trailer(path)),
            },
        };
        for step in steps {
            current = match step {
                PathStep::Key(key) => current
                    .as_dict_mut()
                    .and_then(|dict| dict.get_mut(key))
                    .ok_or_else(stale)?,
                PathStep::Index(i) => current
                    .as_array_mut()
                    .and_then(|items| items.get_mut(*i))
                    .ok_or_else(stale)?,
            };
        }
        Ok(current)
    }

    /// Runs `f` on the node at `path`, the trailer included.
    pub fn with_node<T>(&self, path: &NodePath, f: impl FnOnce(&Object) -> Result<T>) -> Result<T> {
        if path.is_trailer_root() {
            return f(&Object::Dictionary(self.trailer.clone()));
        }
        f(self.node(path)?)
    }

    /// Runs `f` on the node at `path`. The trailer must still be a
    /// dictionary afterwards; otherwise it is left as it was.
    pub fn with_node_mut<T>(
        &mut self,
        path: &NodePath,
        f: impl FnOnce(&mut Object) -> Result<T>,
    ) -> Result<T> {
        if !path.is_trailer_root() {
            return f(self.node_mut(path)?);
        }
        let mut root = Object::Dictionary(self.trailer.clone());
        let result = f(&mut root)?;
        match root {
            Object::Dictionary(dict) => {
                self.trailer = dict;
                Ok(result)
            }
            other => Err(PdfError::TypeMismatch {
                expected: "Dictionary",
                found: other.object_type().as_str(),
            }),
        }
    }

    pub fn catalog_id(&self) -> Result<ObjectId> {
        self.trailer()
            .get_reference("Root")
            .ok_or_else(|| PdfError::InvalidStructure("trailer has no /Root reference".into()))
    }

    pub fn catalog(&self) -> Result<&Dictionary> {
        self.dict(self.catalog_id()?)
    }

    pub fn pages_root_id(&self) -> Result<ObjectId> {
        self.catalog()?
            .get_reference("Pages")
            .ok_or_else(|| PdfError::InvalidStructure("catalog has no /Pages reference".into()))
    }

    /// Leaf page objects in document order.
    pub fn page_ids(&self) -> Result<Vec<ObjectId>> {
        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        self.collect_pages(self.pages_root_id()?, &mut pages, &mut visited)?;
        Ok(pages)
    }

    fn collect_pages(
        &self,
        node_id: ObjectId,
        pages: &mut Vec<ObjectId>,
        visited: &mut HashSet<ObjectId>,
    ) -> Result<()> {
        if !visited.insert(node_id) {
            tracing::warn!("page tree node {} visited twice, skipping", node_id);
            return Ok(());
        }
        let node = match self.dict(node_id) {
            Ok(node) => node,
            Err(PdfError::ObjectNotFound(id)) => {
                tracing::warn!("page tree references missing object {}", id);
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        match node.get_name("Type") {
            Some("Page") => pages.push(node_id),
            _ if node.contains_key("Kids") => {
                let kids = node
                    .get("Kids")
                    .and_then(|kids| self.resolve(kids).ok())
                    .and_then(Object::as_array)
                    .cloned()
                    .unwrap_or_default();
                for kid in kids {
                    if let Some(kid_id) = kid.as_reference() {
                        self.collect_pages(kid_id, pages, visited)?;
                    }
                }
            }
            Some("Pages") => {
                tracing::warn!("page tree node {} has no /Kids", node_id);
            }
            _ => pages.push(node_id),
        }
        Ok(())
    }

    /// Looks `key` up on the page, then on each ancestor through `/Parent`.
    pub fn inherited(&self, page_id: ObjectId, key: &str) -> Option<&Object> {
        let mut current = Some(page_id);
        let mut visited = HashSet::new();
        while let Some(id) = current {
            if !visited.insert(id) {
                break;
            }
            let dict = self.dict(id).ok()?;
            if let Some(value) = dict.get(key) {
                return Some(value);
            }
            current = dict.get_reference("Parent");
        }
        None
    }

    /// True when a linearization parameter dictionary is present.
    pub fn is_linearized(&self) -> bool {
        self.objects.values().any(|object| {
            object
                .as_dict()
                .is_some_and(|dict| dict.contains_key("Linearized"))
        })
    }

    /// Every object id reachable from `roots`, following references.
    pub fn reachable_from(&self, roots: &[ObjectId]) -> BTreeSet<ObjectId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<ObjectId> = roots.to_vec();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Ok(object) = self.get(id) {
                collect_references(object, &mut stack);
            }
        }
        seen
    }
}

fn bare_trailer(path: &NodePath) -> PdfError {
    PdfError::InvalidArgument(format!("{path} is the trailer itself, not a stored node"))
}

/// Pushes every reference found inside `object` onto `out`.
pub fn collect_references(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|item| collect_references(item, out)),
        Object::Dictionary(dict) => dict.values().for_each(|v| collect_references(v, out)),
        Object::Stream(stream) => stream
            .dictionary()
            .values()
            .for_each(|v| collect_references(v, out)),
        _ => {}
    }
}
