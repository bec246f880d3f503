//! Arena-backed tree of open and closed element nodes.
//!
//! Nodes live in a session-scoped arena and refer to each other through
//! generation-stamped [`NodeId`]s, so a stale id never reaches a reused slot.
//! Children are owned by their parent; the parent link is only an index.

use crate::registry::ParsedElement;
use crate::stop::Stop;
use crate::types::{Attributes, Parameters, Tag};
use crate::vehicle::VehicleParameter;

/// Handle to a node in an [`ObjectTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// One parsed element.
#[derive(Debug, Clone)]
pub struct Node {
    element: Tag,
    tag: Tag,
    rejected: bool,
    open: bool,
    attributes: Attributes,
    vehicle_parameter: Option<VehicleParameter>,
    stop_parameter: Option<Stop>,
    parameters: Parameters,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(element: Tag, parent: Option<NodeId>) -> Self {
        Self {
            element,
            tag: Tag::Nothing,
            rejected: false,
            open: false,
            attributes: Attributes::new(),
            vehicle_parameter: None,
            stop_parameter: None,
            parameters: Parameters::new(),
            parent,
            children: Vec::new(),
        }
    }

    /// Tag of the source element that opened this node.
    #[must_use]
    pub fn element(&self) -> Tag {
        self.element
    }

    /// Assigned tag; `Nothing` until a rule accepted the element.
    #[must_use]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// True if the element failed to parse and will be dropped on close.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    /// True while the node is on the open stack.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub fn vehicle_parameter(&self) -> Option<&VehicleParameter> {
        self.vehicle_parameter.as_ref()
    }

    #[must_use]
    pub fn stop_parameter(&self) -> Option<&Stop> {
        self.stop_parameter.as_ref()
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Assign the result of a successful element rule.
    pub fn assign(&mut self, parsed: ParsedElement) {
        self.tag = parsed.tag;
        self.attributes = parsed.attributes;
        self.vehicle_parameter = parsed.vehicle_parameter;
        self.stop_parameter = parsed.stop_parameter;
    }

    /// Mark the node as failed.
    pub fn reject(&mut self) {
        self.rejected = true;
        self.tag = Tag::Nothing;
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Tree of element nodes with an explicit stack of open nodes.
///
/// A synthetic root (tag `Nothing`) is created with the tree and is never
/// on the stack; nodes opened on an empty stack become its children.
#[derive(Debug)]
pub struct ObjectTree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    stack: Vec<NodeId>,
    root: NodeId,
}

impl ObjectTree {
    /// Create a tree holding only the synthetic root.
    #[must_use]
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            stack: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
        };
        tree.root = tree.allocate(Node::new(Tag::Nothing, None));
        tree
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            if let Some(slot) = self.slots.get_mut(index) {
                slot.generation = slot.generation.wrapping_add(1);
                slot.node = Some(node);
                return NodeId {
                    index,
                    generation: slot.generation,
                };
            }
        }
        let index = self.slots.len();
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// The synthetic root.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Open a node for `element` as the last child of the current node.
    pub fn open(&mut self, element: Tag) -> NodeId {
        let parent = self.current().unwrap_or(self.root);
        let mut node = Node::new(element, Some(parent));
        node.open = true;
        let id = self.allocate(node);
        if let Some(parent) = self.node_mut(parent) {
            parent.children.push(id);
        }
        self.stack.push(id);
        id
    }

    /// Close the current node; it becomes immutable.
    ///
    /// Returns `None` if no node is open.
    pub fn close(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        if let Some(node) = self.node_mut(id) {
            node.open = false;
        }
        Some(id)
    }

    /// The innermost open node.
    #[must_use]
    pub fn current(&self) -> Option<NodeId> {
        self.stack.last().copied()
    }

    /// Number of open nodes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Mutable access to the innermost open node only.
    pub fn current_mut(&mut self) -> Option<&mut Node> {
        let id = self.current()?;
        self.node_mut(id)
    }

    /// Read access to any live node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Attach a generic parameter to a live node's side table.
    ///
    /// Returns `false` if the node no longer exists.
    pub fn add_parameter(&mut self, id: NodeId, key: String, value: String) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.parameters.insert(key, value);
                true
            }
            None => false,
        }
    }

    /// Iterate over the ancestors of a node, nearest first, root included.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, &Node)> {
        std::iter::successors(
            self.get(id)
                .and_then(Node::parent)
                .and_then(|p| self.get(p).map(|n| (p, n))),
            move |(_, node)| node.parent.and_then(|p| self.get(p).map(|n| (p, n))),
        )
    }

    /// True if the id refers to the synthetic root.
    #[must_use]
    pub fn is_root(&self, id: NodeId) -> bool {
        id == self.root
    }

    /// Remove a closed node and its whole subtree, unlinking it from its parent.
    ///
    /// The root and open nodes are never removed.
    pub fn discard(&mut self, id: NodeId) {
        if self.is_root(id) {
            return;
        }
        let Some(parent) = self
            .get(id)
            .filter(|node| !node.is_open())
            .and_then(Node::parent)
        else {
            return;
        };
        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|child| *child != id);
        }

        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(slot) = self
                .slots
                .get_mut(next.index)
                .filter(|slot| slot.generation == next.generation)
            else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                pending.extend(node.children);
                self.free.push(next.index);
            }
        }
    }

    /// Number of allocated nodes, root included.
    #[must_use]
    pub fn live_nodes(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }
}

impl Default for ObjectTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_links_to_root_and_parent() {
        let mut tree = ObjectTree::new();
        let vehicle = tree.open(Tag::Vehicle);
        let stop = tree.open(Tag::Stop);

        assert_eq!(tree.get(vehicle).unwrap().parent(), Some(tree.root()));
        assert_eq!(tree.get(stop).unwrap().parent(), Some(vehicle));
        assert_eq!(tree.get(vehicle).unwrap().children(), [stop]);
        assert_eq!(tree.get(tree.root()).unwrap().parent(), None);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_close_pops_in_reverse_order() {
        let mut tree = ObjectTree::new();
        let outer = tree.open(Tag::Person);
        let inner = tree.open(Tag::Walk);
        assert_eq!(tree.close(), Some(inner));
        assert_eq!(tree.current(), Some(outer));
        assert_eq!(tree.close(), Some(outer));
        assert_eq!(tree.close(), None);
    }

    #[test]
    fn test_current_mut_is_top_only() {
        let mut tree = ObjectTree::new();
        let _outer = tree.open(Tag::Vehicle);
        let inner = tree.open(Tag::Route);
        tree.current_mut().unwrap().reject();
        assert!(tree.get(inner).unwrap().is_rejected());
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let mut tree = ObjectTree::new();
        let person = tree.open(Tag::Person);
        let walk = tree.open(Tag::Walk);
        let param = tree.open(Tag::Param);
        let ancestors: Vec<NodeId> = tree.ancestors(param).map(|(id, _)| id).collect();
        assert_eq!(ancestors, vec![walk, person, tree.root()]);
    }

    #[test]
    fn test_discard_frees_subtree_and_stales_ids() {
        let mut tree = ObjectTree::new();
        let vehicle = tree.open(Tag::Vehicle);
        let stop = tree.open(Tag::Stop);
        tree.close();
        tree.close();
        assert_eq!(tree.live_nodes(), 3);

        tree.discard(vehicle);
        assert_eq!(tree.live_nodes(), 1);
        assert!(tree.get(vehicle).is_none());
        assert!(tree.get(stop).is_none());
        assert!(tree.get(tree.root()).unwrap().children().is_empty());

        // Reused slots do not resurrect stale ids
        let flow = tree.open(Tag::Flow);
        assert!(tree.get(flow).is_some());
        assert!(tree.get(vehicle).is_none());
        assert!(tree.get(stop).is_none());
    }

    #[test]
    fn test_discard_ignores_open_nodes() {
        let mut tree = ObjectTree::new();
        let vehicle = tree.open(Tag::Vehicle);
        tree.discard(vehicle);
        assert!(tree.get(vehicle).is_some());
        tree.discard(tree.root());
        assert_eq!(tree.live_nodes(), 2);

        tree.close();
        assert!(!tree.get(vehicle).unwrap().is_open());
        tree.discard(vehicle);
        assert_eq!(tree.live_nodes(), 1);
    }

    #[test]
    fn test_reused_slot_gets_fresh_id() {
        let mut tree = ObjectTree::new();
        let first = tree.open(Tag::Vehicle);
        tree.close();
        tree.discard(first);

        let second = tree.open(Tag::Vehicle);
        assert_eq!(second.index, first.index);
        assert_ne!(second, first);
        assert_eq!(tree.get(second).unwrap().element(), Tag::Vehicle);

        let third = tree.open(Tag::Stop);
        assert_ne!(third.index, second.index);
        assert_eq!(tree.live_nodes(), 3);
    }

    #[test]
    fn test_deep_chain_closes_and_discards() {
        let mut tree = ObjectTree::new();
        let top = tree.open(Tag::Vehicle);
        for _ in 0..100_000 {
            tree.open(Tag::Nothing);
        }
        while tree.close().is_some() {}
        tree.discard(top);
        assert_eq!(tree.live_nodes(), 1);
    }

    #[test]
    fn test_add_parameter() {
        let mut tree = ObjectTree::new();
        let vehicle = tree.open(Tag::Vehicle);
        let _param = tree.open(Tag::Param);
        assert!(tree.add_parameter(vehicle, "k".into(), "v".into()));
        assert_eq!(
            tree.get(vehicle).unwrap().parameters().get("k").map(String::as_str),
            Some("v")
        );
    }
}
