use std::cmp::Ordering;
use std::mem;
use std::num::NonZeroU32;

use thiserror::Error;

pub mod cli;
pub mod parser;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Color {
    #[default]
    Red,
    Black,
}

/// Branch taken while descending, and the direction a node sinks on rotation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MegumiError {
    #[error("key not found")]
    KeyNotFound,
    #[error("rank {rank} out of range 1..={size}")]
    RankOutOfRange { rank: usize, size: usize },
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Arena slot index, shifted by one so `Option<NodeId>` stays four bytes.
/// An absent child link is the terminator: always black, subtree size zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct NodeId(NonZeroU32);

impl NodeId {
    fn from_index(index: usize) -> NodeId {
        assert!(index < u32::MAX as usize, "too many nodes");
        NodeId(NonZeroU32::new(index as u32 + 1).unwrap())
    }

    fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
    subtree_size: usize,
}

/// One visited node of a key descent, in root-to-stop order.
#[derive(Debug, PartialEq, Eq)]
pub struct PathStep<'a, K, V> {
    pub key: &'a K,
    pub value: &'a V,
    pub color: Color,
    /// Branch the descent took leaving this node, `None` on the stop node.
    pub branch: Option<Side>,
}

/// Order Statistic Red Black Tree over an index arena
/// [CLRS chapter 14](https://mitpress.mit.edu/9780262046305/introduction-to-algorithms/)
#[derive(Debug, Clone)]
pub struct Megumi<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
}

impl<K, V> Default for Megumi<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Megumi<K, V> {
    /// Creates an empty tree.
    pub fn new() -> Megumi<K, V> {
        Megumi {
            slots: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }

    /// Creates an empty tree with slots reserved for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Megumi<K, V> {
        Megumi {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            root: None,
        }
    }

    /// Returns the number of stored entries, read off the root annotation.
    pub fn len(&self) -> usize {
        self.size_of(self.root)
    }

    /// Returns `true` if the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Drops every node and resets the tree to empty.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.root = None;
    }

    /// Returns the entry at the 1-indexed ascending rank `rank`. The descent
    /// reads only cached subtree sizes, no key comparison happens.
    pub fn select(&self, rank: usize) -> Result<(&K, &V), MegumiError> {
        match self.nth_node(rank) {
            Some(id) => Ok(self.entry(id)),
            None => Err(MegumiError::RankOutOfRange {
                rank,
                size: self.len(),
            }),
        }
    }

    /// Lazy ascending pass over all entries, backed by rank selection.
    /// Each call starts a fresh pass.
    pub fn iter(&self) -> MegumiIter<'_, K, V> {
        MegumiIter {
            tree: self,
            rank: 0,
        }
    }

    /// Checks the color and black height invariants, reporting the first
    /// violation found.
    pub fn validate(&self) -> Result<(), MegumiError> {
        if self.color_of(self.root) == Color::Red {
            return Err(MegumiError::InvariantViolation("root is red".to_string()));
        }
        self.check_no_double_red(self.root)?;
        self.black_height(self.root)?;
        Ok(())
    }

    fn check_no_double_red(&self, id: Option<NodeId>) -> Result<(), MegumiError> {
        let Some(id) = id else { return Ok(()) };
        let node = self.node(id);
        if node.color == Color::Red && self.color_of(node.parent) == Color::Red {
            return Err(MegumiError::InvariantViolation(
                "red node with a red parent".to_string(),
            ));
        }
        self.check_no_double_red(node.left)?;
        self.check_no_double_red(node.right)
    }

    fn black_height(&self, id: Option<NodeId>) -> Result<usize, MegumiError> {
        let Some(id) = id else { return Ok(0) };
        let node = self.node(id);
        let left = self.black_height(node.left)?;
        let right = self.black_height(node.right)?;
        if left != right {
            return Err(MegumiError::InvariantViolation(format!(
                "black height mismatch (left {left}, right {right})"
            )));
        }
        Ok(left + usize::from(node.color == Color::Black))
    }

    fn nth_node(&self, rank: usize) -> Option<NodeId> {
        if rank == 0 || rank > self.len() {
            return None;
        }
        let mut id = self.root?;
        let mut rank = rank;
        loop {
            let on_left = self.size_of(self.node(id).left);
            if on_left == rank - 1 {
                return Some(id);
            }
            if on_left >= rank {
                id = self.node(id).left?;
            } else {
                rank -= on_left + 1;
                id = self.node(id).right?;
            }
        }
    }

    fn node(&self, id: NodeId) -> &Node<K, V> {
        self.slots[id.index()].as_ref().expect("dead node id")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        self.slots[id.index()].as_mut().expect("dead node id")
    }

    fn entry(&self, id: NodeId) -> (&K, &V) {
        let node = self.node(id);
        (&node.key, &node.value)
    }

    fn alloc(&mut self, key: K, value: V, color: Color, parent: Option<NodeId>) -> NodeId {
        let node = Node {
            key,
            value,
            color,
            left: None,
            right: None,
            parent,
            subtree_size: 0,
        };
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                NodeId::from_index(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.slots[id.index()] = None;
        self.free.push(id);
    }

    fn color_of(&self, id: Option<NodeId>) -> Color {
        match id {
            Some(id) => self.node(id).color,
            None => Color::Black,
        }
    }

    fn size_of(&self, id: Option<NodeId>) -> usize {
        match id {
            Some(id) => self.node(id).subtree_size,
            None => 0,
        }
    }

    fn child(&self, id: NodeId, side: Side) -> Option<NodeId> {
        match side {
            Side::Left => self.node(id).left,
            Side::Right => self.node(id).right,
        }
    }

    fn set_child(&mut self, id: NodeId, side: Side, child: Option<NodeId>) {
        match side {
            Side::Left => self.node_mut(id).left = child,
            Side::Right => self.node_mut(id).right = child,
        }
    }

    fn side_of(&self, child: NodeId, parent: NodeId) -> Side {
        if self.node(parent).left == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn subtree_min(&self, id: NodeId) -> NodeId {
        let mut x = id;
        while let Some(left) = self.node(x).left {
            x = left;
        }
        x
    }

    fn subtree_max(&self, id: NodeId) -> NodeId {
        let mut x = id;
        while let Some(right) = self.node(x).right {
            x = right;
        }
        x
    }

    /// Rotates `node` down toward `dir`, lifting its opposite child into
    /// `node`'s place. Cached subtree sizes of both are repaired in O(1) from
    /// their children; colors and ordering are untouched.
    fn rotate(&mut self, node: NodeId, dir: Side) {
        let pivot = self
            .child(node, dir.opposite())
            .expect("rotation needs a real pivot");
        let inner = self.child(pivot, dir);
        let parent = self.node(node).parent;

        self.set_child(node, dir.opposite(), inner);
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(node);
        }

        self.node_mut(pivot).parent = parent;
        match parent {
            Some(parent) => {
                let side = self.side_of(node, parent);
                self.set_child(parent, side, Some(pivot));
            }
            None => self.root = Some(pivot),
        }

        self.set_child(pivot, dir, Some(node));
        self.node_mut(node).parent = Some(pivot);

        self.refresh_size(node);
        self.refresh_size(pivot);
    }

    fn refresh_size(&mut self, id: NodeId) {
        let size = self.size_of(self.node(id).left) + self.size_of(self.node(id).right) + 1;
        self.node_mut(id).subtree_size = size;
    }

    fn grow_sizes(&mut self, from: NodeId) {
        let mut cur = Some(from);
        while let Some(id) = cur {
            self.node_mut(id).subtree_size += 1;
            cur = self.node(id).parent;
        }
    }

    fn shrink_sizes(&mut self, from: NodeId) {
        let mut cur = Some(from);
        while let Some(id) = cur {
            self.node_mut(id).subtree_size -= 1;
            cur = self.node(id).parent;
        }
    }
}

impl<K: Ord, V> Megumi<K, V> {
    /// Inserts a new entry. Duplicate keys are kept and route to the left of
    /// their equals.
    pub fn insert(&mut self, key: K, value: V) {
        match self.insertion_parent(&key) {
            None => {
                let id = self.alloc(key, value, Color::Black, None);
                self.root = Some(id);
                self.grow_sizes(id);
            }
            Some(parent) => {
                let side = match key.cmp(&self.node(parent).key) {
                    Ordering::Greater => Side::Right,
                    _ => Side::Left,
                };
                let id = self.alloc(key, value, Color::Red, Some(parent));
                self.set_child(parent, side, Some(id));
                self.grow_sizes(id);
                if self.node(parent).color == Color::Red {
                    self.fix_double_red(id);
                }
            }
        }
    }

    /// Removes one entry holding `key`.
    pub fn remove(&mut self, key: &K) -> Result<(), MegumiError> {
        let found = self.find_node(key).ok_or(MegumiError::KeyNotFound)?;
        let victim = match (self.node(found).left, self.node(found).right) {
            (Some(left), Some(_)) => {
                // two children: the in-order predecessor donates its slot,
                // the found node keeps color and position but takes its entry
                let pred = self.subtree_max(left);
                self.swap_entry(found, pred);
                pred
            }
            _ => found,
        };
        self.shrink_sizes(victim);
        self.splice_out(victim)?;
        self.release(victim);
        Ok(())
    }

    /// Returns the value stored under `key`.
    pub fn search(&self, key: &K) -> Result<&V, MegumiError> {
        match self.find_node(key) {
            Some(id) => Ok(&self.node(id).value),
            None => Err(MegumiError::KeyNotFound),
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find_node(key).is_some()
    }

    /// Returns the entry right before `key` in sort order, `Ok(None)` when
    /// `key` holds the minimum.
    pub fn predecessor(&self, key: &K) -> Result<Option<(&K, &V)>, MegumiError> {
        let node = self.find_node(key).ok_or(MegumiError::KeyNotFound)?;
        Ok(self.predecessor_of(node).map(|id| self.entry(id)))
    }

    /// Returns the entry right after `key` in sort order, `Ok(None)` when
    /// `key` holds the maximum.
    pub fn successor(&self, key: &K) -> Result<Option<(&K, &V)>, MegumiError> {
        let node = self.find_node(key).ok_or(MegumiError::KeyNotFound)?;
        Ok(self.successor_of(node).map(|id| self.entry(id)))
    }

    /// Walks the search descent for `key` and returns the visited nodes plus
    /// whether the key was found. Formatting is up to the caller.
    pub fn search_path(&self, key: &K) -> (Vec<PathStep<'_, K, V>>, bool) {
        let mut steps = Vec::new();
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = self.node(id);
            let branch = match key.cmp(&node.key) {
                Ordering::Equal => None,
                Ordering::Less => Some(Side::Left),
                Ordering::Greater => Some(Side::Right),
            };
            steps.push(PathStep {
                key: &node.key,
                value: &node.value,
                color: node.color,
                branch,
            });
            match branch {
                None => return (steps, true),
                Some(side) => cur = self.child(id, side),
            }
        }
        (steps, false)
    }

    fn find_node(&self, key: &K) -> Option<NodeId> {
        let mut cur = self.root;
        while let Some(id) = cur {
            cur = match key.cmp(&self.node(id).key) {
                Ordering::Equal => return Some(id),
                Ordering::Less => self.node(id).left,
                Ordering::Greater => self.node(id).right,
            };
        }
        None
    }

    fn insertion_parent(&self, key: &K) -> Option<NodeId> {
        let mut parent = None;
        let mut cur = self.root;
        while let Some(id) = cur {
            parent = Some(id);
            cur = match key.cmp(&self.node(id).key) {
                Ordering::Greater => self.node(id).right,
                _ => self.node(id).left,
            };
        }
        parent
    }

    fn predecessor_of(&self, node: NodeId) -> Option<NodeId> {
        if let Some(left) = self.node(node).left {
            return Some(self.subtree_max(left));
        }
        let mut x = node;
        let mut y = self.node(x).parent;
        while let Some(parent) = y {
            if self.node(parent).left != Some(x) {
                break;
            }
            x = parent;
            y = self.node(parent).parent;
        }
        y
    }

    fn successor_of(&self, node: NodeId) -> Option<NodeId> {
        if let Some(right) = self.node(node).right {
            return Some(self.subtree_min(right));
        }
        let mut x = node;
        let mut y = self.node(x).parent;
        while let Some(parent) = y {
            if self.node(parent).right != Some(x) {
                break;
            }
            x = parent;
            y = self.node(parent).parent;
        }
        y
    }

    fn swap_entry(&mut self, a: NodeId, b: NodeId) {
        debug_assert_ne!(a.index(), b.index(), "cannot swap a node with itself");
        let (lo, hi) = if a.index() < b.index() {
            (a.index(), b.index())
        } else {
            (b.index(), a.index())
        };
        let (head, tail) = self.slots.split_at_mut(hi);
        let x = head[lo].as_mut().expect("dead node id");
        let y = tail[0].as_mut().expect("dead node id");
        mem::swap(&mut x.key, &mut y.key);
        mem::swap(&mut x.value, &mut y.value);
    }

    /// Unlinks a node with at most one real child and repairs the black
    /// deficit its removal leaves behind.
    fn splice_out(&mut self, victim: NodeId) -> Result<(), MegumiError> {
        let parent = self.node(victim).parent;
        let child = self.node(victim).left.or(self.node(victim).right);

        match parent {
            Some(parent) => {
                let side = self.side_of(victim, parent);
                self.set_child(parent, side, child);
            }
            None => self.root = child,
        }
        if let Some(child) = child {
            self.node_mut(child).parent = parent;
        }

        if self.node(victim).color == Color::Black {
            match child {
                Some(child) if self.node(child).color == Color::Red => {
                    // a red replacement absorbs the missing black on its own
                    self.node_mut(child).color = Color::Black;
                }
                _ => self.fix_double_black(child, parent)?,
            }
        }
        Ok(())
    }

    fn fix_double_red(&mut self, node: NodeId) {
        let mut x = node;
        loop {
            let Some(parent) = self.node(x).parent else {
                self.node_mut(x).color = Color::Black;
                return;
            };
            if self.node(parent).color == Color::Black {
                return;
            }
            let Some(grand) = self.node(parent).parent else {
                self.node_mut(parent).color = Color::Black;
                return;
            };
            let parent_side = self.side_of(parent, grand);
            let uncle = self.child(grand, parent_side.opposite());

            // Case 1
            if let Some(uncle) = uncle {
                if self.node(uncle).color == Color::Red {
                    self.node_mut(parent).color = Color::Black;
                    self.node_mut(uncle).color = Color::Black;
                    self.node_mut(grand).color = Color::Red;
                    x = grand;
                    continue;
                }
            }

            // Case 2
            let mut top = parent;
            if self.side_of(x, parent) != parent_side {
                self.rotate(parent, parent_side);
                top = x;
            }

            // Case 3
            self.node_mut(top).color = Color::Black;
            self.node_mut(grand).color = Color::Red;
            self.rotate(grand, parent_side.opposite());
            return;
        }
    }

    /// Restores the black height after a black node left the position now held
    /// by `node` (`None` when a terminator stands there) under `parent`.
    fn fix_double_black(
        &mut self,
        node: Option<NodeId>,
        parent: Option<NodeId>,
    ) -> Result<(), MegumiError> {
        let mut x = node;
        let mut p = parent;
        loop {
            // Case 1
            let Some(parent) = p else {
                if let Some(x) = x {
                    self.node_mut(x).color = Color::Black;
                }
                return Ok(());
            };

            let side = if self.node(parent).left == x {
                Side::Left
            } else {
                Side::Right
            };
            let Some(sibling) = self.child(parent, side.opposite()) else {
                return Err(MegumiError::InvariantViolation(
                    "delete fixup found no sibling".to_string(),
                ));
            };

            // Case 2
            if self.node(sibling).color == Color::Red {
                self.node_mut(sibling).color = Color::Black;
                self.node_mut(parent).color = Color::Red;
                self.rotate(parent, side);
                continue;
            }

            let outer = self.child(sibling, side.opposite());
            let inner = self.child(sibling, side);

            // Case 3
            if self.color_of(outer) == Color::Red {
                let parent_color = self.node(parent).color;
                self.node_mut(sibling).color = parent_color;
                self.node_mut(parent).color = Color::Black;
                if let Some(outer) = outer {
                    self.node_mut(outer).color = Color::Black;
                }
                self.rotate(parent, side);
                return Ok(());
            }

            // Case 4
            if self.color_of(inner) == Color::Red {
                if let Some(inner) = inner {
                    self.node_mut(inner).color = Color::Black;
                }
                self.node_mut(sibling).color = Color::Red;
                self.rotate(sibling, side.opposite());
                continue;
            }

            // Case 5
            if self.node(parent).color == Color::Red {
                self.node_mut(parent).color = Color::Black;
                self.node_mut(sibling).color = Color::Red;
                return Ok(());
            }

            // Case 6
            self.node_mut(sibling).color = Color::Red;
            x = Some(parent);
            p = self.node(parent).parent;
        }
    }
}

pub struct MegumiIter<'a, K, V> {
    tree: &'a Megumi<K, V>,
    rank: usize,
}

impl<'a, K, V> Iterator for MegumiIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.rank += 1;
        self.tree.nth_node(self.rank).map(|id| self.tree.entry(id))
    }
}
