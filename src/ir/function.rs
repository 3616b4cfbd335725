// Function bases: owners of IR nodes
//
//  Copyright (C) 2014-2023 Ryan Specialty, LLC.
//
//  This file is part of HWIR.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Function bases and the edge-mutating operations of the graph model.
//!
//! A [`FunctionBase`] owns an arena of [`Node`]s indexed by [`NodeId`].
//! Nodes are stored in creation order and are never moved;
//!   removing a node leaves a vacancy behind so that identifiers remain
//!   stable and are never reused.
//! Iteration over [`FunctionBase::nodes`] is therefore always in creation
//!   order,
//!     which the [topological sort](super::topo) relies upon as its seed
//!     order.
//!
//! Edges are stored in both directions:
//!   each node holds its ordered operands and its set of users.
//! The two directions are kept consistent by the mutating operations of
//!   this module
//!     ([`FunctionBase::add_node`],
//!      [`FunctionBase::replace_uses_with`],
//!      [`FunctionBase::remove_node`]),
//!   and are never recomputed by scanning the graph.
//!
//! There are three variants of function base,
//!   distinguished by [`FunctionKind`].
//! They share the node and edge model but differ in which nodes are
//!   roots of the graph.

use super::{
    FunctionId, IrError, IrResult, Node, NodeId, Op, SourceInfo,
};
use fxhash::FxHashMap;
use std::fmt::{self, Debug};

/// Data describing a function implemented outside of the compiler.
///
/// Calls to foreign functions are opaque and are never inlined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignFunctionData {
    /// Template used by code generation to instantiate the foreign
    ///   function.
    pub code_template: String,
}

/// Variant of a [`FunctionBase`],
///   carrying the roots of its graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionKind {
    /// A pure function producing a single return value.
    Function {
        return_value: Option<NodeId>,
        foreign: Option<ForeignFunctionData>,
    },

    /// A stateful process whose roots are its next token and next state.
    Proc {
        next_token: Option<NodeId>,
        next_state: Vec<NodeId>,
    },

    /// A structural block whose roots are its output ports.
    Block { outputs: Vec<NodeId> },
}

impl FunctionKind {
    pub fn function() -> Self {
        Self::Function {
            return_value: None,
            foreign: None,
        }
    }

    pub fn proc() -> Self {
        Self::Proc {
            next_token: None,
            next_state: Vec::new(),
        }
    }

    pub fn block() -> Self {
        Self::Block {
            outputs: Vec::new(),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Function { .. } => "function",
            Self::Proc { .. } => "proc",
            Self::Block { .. } => "block",
        }
    }

    fn roots(&self) -> Vec<NodeId> {
        match self {
            Self::Function { return_value, .. } => {
                return_value.iter().copied().collect()
            }
            Self::Proc {
                next_token,
                next_state,
            } => next_token.iter().chain(next_state).copied().collect(),
            Self::Block { outputs } => outputs.clone(),
        }
    }

    fn retarget_roots(&mut self, from: NodeId, to: NodeId) {
        let retarget = |id: &mut NodeId| {
            if *id == from {
                *id = to;
            }
        };

        match self {
            Self::Function { return_value, .. } => {
                return_value.iter_mut().for_each(retarget)
            }
            Self::Proc {
                next_token,
                next_state,
            } => next_token
                .iter_mut()
                .chain(next_state.iter_mut())
                .for_each(retarget),
            Self::Block { outputs } => outputs.iter_mut().for_each(retarget),
        }
    }
}

/// A function-like unit owning a graph of [`Node`]s.
#[derive(Clone)]
pub struct FunctionBase {
    id: FunctionId,
    name: String,
    kind: FunctionKind,

    /// Node arena indexed by [`NodeId::as_usize`].
    ///
    /// Removed nodes leave [`None`] behind.
    nodes: Vec<Option<Node>>,

    /// Number of nodes that have not been removed.
    live: usize,

    params: Vec<NodeId>,

    /// Assigned node names,
    ///   used to keep them unique within this function base.
    names: FxHashMap<String, NodeId>,
}

impl Debug for FunctionBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Dumping every node is far too much information for anything but
        //   the smallest of graphs.
        write!(
            f,
            "[{} `{}`: {} nodes]",
            self.kind.describe(),
            self.name,
            self.live,
        )
    }
}

impl FunctionBase {
    pub(super) fn new(
        id: FunctionId,
        name: String,
        kind: FunctionKind,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            nodes: Vec::new(),
            live: 0,
            params: Vec::new(),
            names: FxHashMap::default(),
        }
    }

    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, FunctionKind::Function { .. })
    }

    pub fn is_proc(&self) -> bool {
        matches!(self.kind, FunctionKind::Proc { .. })
    }

    pub fn is_block(&self) -> bool {
        matches!(self.kind, FunctionKind::Block { .. })
    }

    /// Foreign function data,
    ///   if this is a function implemented outside of the compiler.
    pub fn foreign_function_data(&self) -> Option<&ForeignFunctionData> {
        match &self.kind {
            FunctionKind::Function { foreign, .. } => foreign.as_ref(),
            _ => None,
        }
    }

    pub fn is_foreign(&self) -> bool {
        self.foreign_function_data().is_some()
    }

    /// Mark this function as implemented outside of the compiler.
    pub fn set_foreign_function_data(
        &mut self,
        data: ForeignFunctionData,
    ) -> IrResult<()> {
        match &mut self.kind {
            FunctionKind::Function { foreign, .. } => {
                foreign.replace(data);
                Ok(())
            }
            _ => Err(self.wrong_kind("function")),
        }
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.live
    }

    /// Upper bound (exclusive) of [`NodeId::as_usize`] for every node ever
    ///   created in this function base.
    ///
    /// This is suitable as the capacity of dense per-node tables.
    pub fn node_id_bound(&self) -> usize {
        self.nodes.len()
    }

    /// Live nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().flatten()
    }

    /// Identifiers of live nodes in creation order.
    ///
    /// The result is a snapshot;
    ///   it is safe to mutate the function base while iterating over it,
    ///     though nodes removed in the meantime must be skipped by the
    ///     caller.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(Node::id).collect()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.as_usize()).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Like [`Self::get`],
    ///   but failing with [`IrError::UnknownNode`].
    pub fn node(&self, id: NodeId) -> IrResult<&Node> {
        self.get(id).ok_or_else(|| self.unknown_node(id))
    }

    fn node_mut(&mut self, id: NodeId) -> IrResult<&mut Node> {
        match self.nodes.get_mut(id.as_usize()).and_then(Option::as_mut) {
            Some(node) => Ok(node),
            None => Err(IrError::UnknownNode {
                function: self.name.clone(),
                node: id,
            }),
        }
    }

    pub fn params(&self) -> &[NodeId] {
        &self.params
    }

    /// Parameter at position `i`.
    pub fn param_at(&self, i: usize) -> Option<NodeId> {
        self.params.get(i).copied()
    }

    /// Return value of a function.
    ///
    /// Always [`None`] for procs and blocks.
    pub fn return_value(&self) -> Option<NodeId> {
        match self.kind {
            FunctionKind::Function { return_value, .. } => return_value,
            _ => None,
        }
    }

    pub fn set_return_value(&mut self, id: NodeId) -> IrResult<()> {
        self.node(id)?;

        match &mut self.kind {
            FunctionKind::Function { return_value, .. } => {
                return_value.replace(id);
                Ok(())
            }
            _ => Err(self.wrong_kind("function")),
        }
    }

    pub fn set_next_token(&mut self, id: NodeId) -> IrResult<()> {
        self.node(id)?;

        match &mut self.kind {
            FunctionKind::Proc { next_token, .. } => {
                next_token.replace(id);
                Ok(())
            }
            _ => Err(self.wrong_kind("proc")),
        }
    }

    pub fn add_next_state(&mut self, id: NodeId) -> IrResult<()> {
        self.node(id)?;

        match &mut self.kind {
            FunctionKind::Proc { next_state, .. } => {
                next_state.push(id);
                Ok(())
            }
            _ => Err(self.wrong_kind("proc")),
        }
    }

    pub fn add_output(&mut self, id: NodeId) -> IrResult<()> {
        self.node(id)?;

        match &mut self.kind {
            FunctionKind::Block { outputs } => {
                outputs.push(id);
                Ok(())
            }
            _ => Err(self.wrong_kind("block")),
        }
    }

    /// Nodes that are live by virtue of being results of this function
    ///   base.
    ///
    /// For a function this is its return value;
    ///   for a proc its next token and next state;
    ///   and for a block its outputs.
    pub fn roots(&self) -> Vec<NodeId> {
        self.kind.roots()
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        self.kind.roots().contains(&id)
    }

    /// Create a new node from `op` with the given ordered operands.
    ///
    /// Each operand must be a live node of this function base,
    ///   and the number of operands must be accepted by the arity of `op`.
    /// The new node is registered as a user of each of its operands.
    pub fn add_node(
        &mut self,
        op: Op,
        operands: Vec<NodeId>,
        loc: SourceInfo,
    ) -> IrResult<NodeId> {
        op.check_arity(operands.len())?;

        if let Some(&missing) = operands.iter().find(|&&o| !self.contains(o))
        {
            return Err(self.unknown_node(missing));
        }

        let id = NodeId::from_index(self.nodes.len());

        if op == Op::Param {
            self.params.push(id);
        }

        for &operand in &operands {
            // Verified to exist above.
            if let Some(Some(def)) = self.nodes.get_mut(operand.as_usize()) {
                def.add_user(id);
            }
        }

        self.nodes.push(Some(Node::new(id, op, operands, loc)));
        self.live += 1;

        Ok(id)
    }

    /// Create a new node like [`Self::add_node`] and assign it a name.
    pub fn add_named_node(
        &mut self,
        op: Op,
        operands: Vec<NodeId>,
        loc: SourceInfo,
        name: impl Into<String>,
    ) -> IrResult<NodeId> {
        let id = self.add_node(op, operands, loc)?;
        self.set_name(id, name)?;

        Ok(id)
    }

    /// Create a node in this function base with the same operation,
    ///   payload,
    ///   assigned name,
    ///   and location as `node`,
    ///     but with `new_operands` as its operands.
    ///
    /// `node` may belong to any function base;
    ///   the clone is always a distinct node with an identifier allocated
    ///   by this function base,
    ///     and the original is left untouched.
    /// Fails if the number of operands is incompatible with the operation.
    pub fn clone_in_new_function(
        &mut self,
        node: &Node,
        new_operands: Vec<NodeId>,
    ) -> IrResult<NodeId> {
        let id =
            self.add_node(node.op().clone(), new_operands, node.loc().clone())?;

        if let Some(name) = node.assigned_name() {
            self.set_name(id, name)?;
        }

        Ok(id)
    }

    /// Rewire every user of `node` to reference `replacement` instead.
    ///
    /// Every operand slot referencing `node` is rewritten,
    ///   so a user referencing `node` twice will reference `replacement`
    ///   twice.
    /// Roots of the function base referencing `node` are retargeted to
    ///   `replacement`.
    /// If `node` has an assigned name and `replacement` does not,
    ///   the name moves to `replacement`.
    ///
    /// `replacement` itself is never rewired,
    ///   even if it uses `node`,
    ///   since that would introduce a cycle.
    ///
    /// Both nodes must be live nodes of this function base;
    ///   this is verified before anything is modified.
    pub fn replace_uses_with(
        &mut self,
        node: NodeId,
        replacement: NodeId,
    ) -> IrResult<()> {
        self.node(replacement)?;
        let users = self.node(node)?.users().to_vec();

        if node == replacement {
            return Ok(());
        }

        for user in users.into_iter().filter(|&u| u != replacement) {
            let user_node = self.node_mut(user)?;
            user_node
                .operands_mut()
                .iter_mut()
                .filter(|o| **o == node)
                .for_each(|o| *o = replacement);

            self.node_mut(node)?.remove_user(user);
            self.node_mut(replacement)?.add_user(user);
        }

        self.kind.retarget_roots(node, replacement);

        let name_moves = {
            let (n, r) = (self.node(node)?, self.node(replacement)?);
            n.has_assigned_name() && !r.has_assigned_name()
        };

        if name_moves {
            if let Some(name) = self.take_name(node)? {
                self.set_name(replacement, name)?;
            }
        }

        Ok(())
    }

    /// Remove a node from the function base.
    ///
    /// The node must have no users,
    ///   must not be a root,
    ///   and must not be a parameter.
    /// Its identifier will never be reused.
    pub fn remove_node(&mut self, id: NodeId) -> IrResult<()> {
        let node = self.node(id)?;

        if !node.users().is_empty() {
            return Err(IrError::NodeHasUsers {
                function: self.name.clone(),
                node: node.name().into_owned(),
                users: node.users().len(),
            });
        } else if node.is_param() {
            return Err(IrError::RemoveParam {
                function: self.name.clone(),
                node: node.name().into_owned(),
            });
        } else if self.is_root(id) {
            return Err(IrError::RemoveRoot {
                function: self.name.clone(),
                node: node.name().into_owned(),
            });
        }

        let operands = node.operands().to_vec();
        for operand in operands {
            self.node_mut(operand)?.remove_user(id);
        }

        self.take_name(id)?;
        self.nodes[id.as_usize()] = None;
        self.live -= 1;

        Ok(())
    }

    /// Assign a name to a node.
    ///
    /// Assigned names are unique within a function base;
    ///   if `name` is already taken by another node,
    ///   a suffix of the form `__N` is appended.
    pub fn set_name(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
    ) -> IrResult<()> {
        self.take_name(id)?;

        let name = self.uniquify_name(name.into());
        self.names.insert(name.clone(), id);
        self.node_mut(id)?.set_assigned_name(Some(name));

        Ok(())
    }

    /// Remove the assigned name of a node,
    ///   reverting it to its derived display name.
    pub fn clear_name(&mut self, id: NodeId) -> IrResult<()> {
        self.take_name(id).map(|_| ())
    }

    pub fn set_loc(&mut self, id: NodeId, loc: SourceInfo) -> IrResult<()> {
        self.node_mut(id)?.set_loc(loc);
        Ok(())
    }

    /// Node with the given assigned name.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    fn take_name(&mut self, id: NodeId) -> IrResult<Option<String>> {
        let node = self.node_mut(id)?;
        let name = node.assigned_name().map(String::from);
        node.set_assigned_name(None);

        if let Some(name) = &name {
            self.names.remove(name);
        }

        Ok(name)
    }

    fn uniquify_name(&self, name: String) -> String {
        if !self.names.contains_key(&name) {
            return name;
        }

        (1..)
            .map(|n| format!("{name}__{n}"))
            .find(|candidate| !self.names.contains_key(candidate))
            .unwrap_or(name)
    }

    fn unknown_node(&self, id: NodeId) -> IrError {
        IrError::UnknownNode {
            function: self.name.clone(),
            node: id,
        }
    }

    fn wrong_kind(&self, expected: &'static str) -> IrError {
        IrError::WrongFunctionKind {
            function: self.name.clone(),
            expected,
        }
    }
}

#[cfg(test)]
mod test;
