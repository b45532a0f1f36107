//! Arena-backed scene graph.
//!
//! Every node lives in one [`SceneGraph`] and is addressed by a stable
//! [`NodeId`]. Child lists hold handles and the parent back-reference is an
//! optional handle, so reparenting never fights ownership. A "scene" is any
//! node used as the root of a draw call; the same arena can hold several
//! scenes that share cameras and lights.
//!
//! Global matrices are never cached: [`SceneGraph::global_matrix`] folds the
//! parent chain on every call.

use anyhow::{anyhow, bail};
use cgmath::{Matrix4, SquareMatrix, Vector3};
use slotmap::SlotMap;

use crate::{
    data_structures::{camera::Camera, light::Light, mesh::Mesh},
    math::{self, Transform},
};

slotmap::new_key_type! {
    /// Stable handle to a node of a [`SceneGraph`].
    pub struct NodeId;
}

/// What a node contributes to a frame.
#[derive(Debug)]
pub enum NodeKind {
    /// Pure grouping container, also used for scene roots.
    Group,
    Mesh(Mesh),
    Light(Light),
    Camera(Camera),
}

#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    local: Matrix4<f32>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: String::new(),
            kind,
            local: Matrix4::identity(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.local = transform.to_matrix();
        self
    }

    pub fn local_matrix(&self) -> Matrix4<f32> {
        self.local
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a detached node.
    pub fn insert(&mut self, node: Node) -> NodeId {
        let mut node = node;
        node.parent = None;
        node.children.clear();
        self.nodes.insert(node)
    }

    /// Inserts an empty group, usually a scene root.
    pub fn add_group(&mut self, name: &str) -> NodeId {
        self.insert(Node::new(NodeKind::Group).with_name(name))
    }

    /// Inserts `node` and attaches it under `parent`.
    pub fn insert_child(&mut self, parent: NodeId, node: Node) -> anyhow::Result<NodeId> {
        if !self.nodes.contains_key(parent) {
            bail!("Parent node {:?} does not exist.", parent);
        }
        let id = self.insert(node);
        self.attach(parent, id)?;
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[][..], |n| n.children.as_slice())
    }

    pub fn mesh(&self, id: NodeId) -> Option<&Mesh> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self, id: NodeId) -> Option<&mut Mesh> {
        match self.nodes.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn light(&self, id: NodeId) -> Option<&Light> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Light(light)) => Some(light),
            _ => None,
        }
    }

    pub fn light_mut(&mut self, id: NodeId) -> Option<&mut Light> {
        match self.nodes.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Light(light)) => Some(light),
            _ => None,
        }
    }

    pub fn camera(&self, id: NodeId) -> Option<&Camera> {
        match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Camera(camera)) => Some(camera),
            _ => None,
        }
    }

    pub fn camera_mut(&mut self, id: NodeId) -> Option<&mut Camera> {
        match self.nodes.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Camera(camera)) => Some(camera),
            _ => None,
        }
    }

    /// Makes `child` the last child of `parent`, detaching it from any
    /// previous parent first.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> anyhow::Result<()> {
        if parent == child {
            bail!("A node cannot be its own parent.");
        }
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            bail!("Cannot attach {:?} to {:?}: stale node handle.", child, parent);
        }
        if self.is_ancestor(child, parent) {
            bail!(
                "Attaching {:?} under {:?} would create a cycle in the scene graph.",
                child,
                parent
            );
        }
        self.detach(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
        }
        Ok(())
    }

    /// Removes `child` from `parent`'s child list and clears its back-reference.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> anyhow::Result<()> {
        match self.parent(child) {
            Some(p) if p == parent => {
                self.detach(child);
                Ok(())
            }
            _ => Err(anyhow!("{:?} is not a child of {:?}.", child, parent)),
        }
    }

    /// Detaches `id` from its parent, if any. The node stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get_mut(id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|c| *c != id);
        }
    }

    /// Removes `id` and its whole subtree from the arena.
    pub fn despawn(&mut self, id: NodeId) {
        self.detach(id);
        let mut doomed = Vec::new();
        self.descendants_into(id, &mut doomed);
        for node in doomed {
            self.nodes.remove(node);
        }
    }

    /// True if `ancestor` lies on the parent chain of `id` (or is `id`).
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Pre-order list of `root` and everything below it, written into `out`.
    ///
    /// `out` is cleared first; reusing it across frames keeps the walk free of
    /// per-node allocations.
    pub fn descendants_into(&self, root: NodeId, out: &mut Vec<NodeId>) {
        out.clear();
        if !self.nodes.contains_key(root) {
            return;
        }
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }

    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.descendants_into(root, &mut out);
        out
    }

    pub fn local_matrix(&self, id: NodeId) -> Matrix4<f32> {
        self.nodes
            .get(id)
            .map_or_else(Matrix4::identity, |n| n.local)
    }

    pub fn set_local_matrix(&mut self, id: NodeId, m: Matrix4<f32>) {
        match self.nodes.get_mut(id) {
            Some(node) => node.local = m,
            None => log::warn!("Ignoring transform change on stale node {:?}.", id),
        }
    }

    pub fn set_transform(&mut self, id: NodeId, transform: &Transform) {
        self.set_local_matrix(id, transform.to_matrix());
    }

    /// Multiplies `m` into the local matrix: after it when `local` (object
    /// space), before it otherwise (parent space).
    pub fn apply_matrix(&mut self, id: NodeId, m: Matrix4<f32>, local: bool) {
        let current = self.local_matrix(id);
        let next = if local { current * m } else { m * current };
        self.set_local_matrix(id, next);
    }

    pub fn translate(&mut self, id: NodeId, x: f32, y: f32, z: f32, local: bool) {
        self.apply_matrix(id, math::translation(x, y, z), local);
    }

    pub fn rotate_x(&mut self, id: NodeId, angle: f32, local: bool) {
        self.apply_matrix(id, math::rotation_x(angle), local);
    }

    pub fn rotate_y(&mut self, id: NodeId, angle: f32, local: bool) {
        self.apply_matrix(id, math::rotation_y(angle), local);
    }

    pub fn rotate_z(&mut self, id: NodeId, angle: f32, local: bool) {
        self.apply_matrix(id, math::rotation_z(angle), local);
    }

    pub fn scale(&mut self, id: NodeId, s: f32, local: bool) {
        self.apply_matrix(id, math::scale(s), local);
    }

    pub fn position(&self, id: NodeId) -> Vector3<f32> {
        math::position_of(&self.local_matrix(id))
    }

    /// Overwrites the translation column of the local matrix.
    pub fn set_position(&mut self, id: NodeId, x: f32, y: f32, z: f32) {
        let mut m = self.local_matrix(id);
        m.w.x = x;
        m.w.y = y;
        m.w.z = z;
        self.set_local_matrix(id, m);
    }

    /// Product of every ancestor's local matrix, outermost first, times the
    /// node's own. A stale handle yields the identity.
    pub fn global_matrix(&self, id: NodeId) -> Matrix4<f32> {
        let Some(node) = self.nodes.get(id) else {
            return Matrix4::identity();
        };
        let mut m = node.local;
        let mut cursor = node.parent;
        while let Some(parent) = cursor.and_then(|p| self.nodes.get(p)) {
            m = parent.local * m;
            cursor = parent.parent;
        }
        m
    }

    pub fn global_position(&self, id: NodeId) -> Vector3<f32> {
        math::position_of(&self.global_matrix(id))
    }

    /// World-space forward (-z) axis of the node.
    pub fn direction(&self, id: NodeId) -> Vector3<f32> {
        math::forward_of(&self.global_matrix(id))
    }

    /// Rotates the node so its forward axis points at the world-space
    /// `target`, keeping its global position. Scale is reset.
    pub fn look_at(&mut self, id: NodeId, target: Vector3<f32>) {
        let position = self.global_position(id);
        let Some(world) = math::look_at(position, target) else {
            log::warn!("look_at target coincides with node {:?}; orientation unchanged.", id);
            return;
        };
        let parent_inverse = match self.parent(id) {
            Some(parent) => match self.global_matrix(parent).invert() {
                Some(inv) => inv,
                None => {
                    log::warn!("Parent of {:?} has a singular transform; orientation unchanged.", id);
                    return;
                }
            },
            None => Matrix4::identity(),
        };
        self.set_local_matrix(id, parent_inverse * world);
    }

    /// Points the node's forward axis along the world-space `direction`.
    pub fn set_direction(&mut self, id: NodeId, direction: Vector3<f32>) {
        let target = self.global_position(id) + direction;
        self.look_at(id, target);
    }
}
