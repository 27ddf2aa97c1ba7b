//! Node ids, node kinds and the uniform node interface

use crate::{FormatValue, Formats};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Arena key of a node in a [`TableDocument`](crate::TableDocument).
///
/// A node id is fixed for the node's lifetime. It is distinct from the `row`
/// and `cell` identity attributes, which merges and relocations rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parse the hyphenated or simple UUID form
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// The closed set of node kinds making up a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Table,
    ColumnGroup,
    Column,
    Body,
    Row,
    Cell,
    CellLine,
}

impl NodeKind {
    /// Kinds this kind may hold as direct children
    pub fn allowed_children(self) -> &'static [NodeKind] {
        match self {
            NodeKind::Table => &[NodeKind::ColumnGroup, NodeKind::Body],
            NodeKind::ColumnGroup => &[NodeKind::Column],
            NodeKind::Body => &[NodeKind::Row],
            NodeKind::Row => &[NodeKind::Cell],
            NodeKind::Cell => &[NodeKind::CellLine],
            NodeKind::Column | NodeKind::CellLine => &[],
        }
    }

    pub fn can_contain(self, child: NodeKind) -> bool {
        self.allowed_children().contains(&child)
    }
}

/// Common interface for all table nodes
pub trait Node: std::fmt::Debug {
    /// Get the arena id of this node
    fn id(&self) -> NodeId;

    /// Get the kind tag of this node
    fn kind(&self) -> NodeKind;

    /// Get the ordered child ids
    fn children(&self) -> &[NodeId];

    /// Get the parent id (None for a table or a detached node)
    fn parent(&self) -> Option<NodeId>;

    /// Stored attributes, without defaults applied
    fn stored_formats(&self) -> &Formats;

    fn can_have_children(&self) -> bool {
        !self.kind().allowed_children().is_empty()
    }

    /// Text content (cell lines only)
    fn text_content(&self) -> Option<&str> {
        None
    }
}

/// A node of any kind, stored in the document arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableNode {
    id: NodeId,
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    formats: Formats,
    /// Line text; always empty for kinds other than `CellLine`
    #[serde(default)]
    text: String,
}

impl TableNode {
    pub(crate) fn new(kind: NodeKind, formats: Formats) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            parent: None,
            children: Vec::new(),
            formats,
            text: String::new(),
        }
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }

    pub(crate) fn formats_mut(&mut self) -> &mut Formats {
        &mut self.formats
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }

    /// Store `value` under `key`, or drop the key when there is no value
    pub(crate) fn toggle(&mut self, key: &str, value: Option<FormatValue>) {
        match value {
            Some(value) => {
                self.formats.insert(key.to_string(), value);
            }
            None => {
                self.formats.remove(key);
            }
        }
    }
}

impl Node for TableNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn children(&self) -> &[NodeId] {
        &self.children
    }

    fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    fn stored_formats(&self) -> &Formats {
        &self.formats
    }

    fn text_content(&self) -> Option<&str> {
        match self.kind {
            NodeKind::CellLine => Some(&self.text),
            _ => None,
        }
    }
}
