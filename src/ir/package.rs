// Packages: the unit of compilation
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

//! Packages of function bases.
//!
//! A [`Package`] owns every [`FunctionBase`] of a design by name and is the
//!   unit passed through pass pipelines.
//! Function bases are never removed from a package,
//!   so a [`FunctionId`] remains valid for the lifetime of its package.

use super::{
    FunctionBase, FunctionKind, IrError, IrResult, Node, NodeId, Op,
    SourceInfo,
};
use crate::global;
use fxhash::FxHashMap;
use std::fmt::{self, Debug, Display};

/// Identifier of a [`FunctionBase`] within its [`Package`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(global::FunctionIdSize);

impl FunctionId {
    fn from_index(index: usize) -> Self {
        global::FunctionIdSize::try_from(index)
            .map(FunctionId)
            .expect("internal error: function identifier space exhausted")
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Identity of a node across an entire [`Package`].
///
/// [`NodeId`]s are only unique within their function base;
///   this pairs one with the function base that owns it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef {
    pub function: FunctionId,
    pub node: NodeId,
}

impl NodeRef {
    pub fn new(function: FunctionId, node: NodeId) -> Self {
        Self { function, node }
    }
}

impl Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{}", self.function, self.node)
    }
}

/// A set of function bases;
///   the unit of compilation.
#[derive(Clone)]
pub struct Package {
    name: String,
    functions: Vec<FunctionBase>,
    index: FxHashMap<String, FunctionId>,
    top: Option<FunctionId>,
}

impl Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[package `{}`: {} function bases]",
            self.name,
            self.functions.len(),
        )
    }
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
            index: FxHashMap::default(),
            top: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a new,
    ///   empty function base.
    ///
    /// Names must be unique within the package.
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        kind: FunctionKind,
    ) -> IrResult<FunctionId> {
        let name = name.into();

        if self.index.contains_key(&name) {
            return Err(IrError::DuplicateFunction(name));
        }

        let id = FunctionId::from_index(self.functions.len());
        self.index.insert(name.clone(), id);
        self.functions.push(FunctionBase::new(id, name, kind));

        Ok(id)
    }

    pub fn function(&self, id: FunctionId) -> IrResult<&FunctionBase> {
        self.functions
            .get(id.as_usize())
            .ok_or_else(|| IrError::UnknownFunction(id.to_string()))
    }

    pub fn function_mut(
        &mut self,
        id: FunctionId,
    ) -> IrResult<&mut FunctionBase> {
        self.functions
            .get_mut(id.as_usize())
            .ok_or_else(|| IrError::UnknownFunction(id.to_string()))
    }

    pub fn function_id(&self, name: &str) -> Option<FunctionId> {
        self.index.get(name).copied()
    }

    pub fn function_by_name(&self, name: &str) -> IrResult<&FunctionBase> {
        self.function_id(name)
            .ok_or_else(|| IrError::UnknownFunction(name.into()))
            .and_then(|id| self.function(id))
    }

    /// Function bases in the order in which they were added.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionBase> + '_ {
        self.functions.iter()
    }

    pub fn function_ids(&self) -> Vec<FunctionId> {
        self.functions.iter().map(FunctionBase::id).collect()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn top(&self) -> Option<FunctionId> {
        self.top
    }

    pub fn set_top(&mut self, id: FunctionId) -> IrResult<()> {
        self.function(id)?;
        self.top = Some(id);

        Ok(())
    }

    /// Borrow one function base for reading and another for writing.
    ///
    /// This allows nodes to be cloned directly from one function base into
    ///   another.
    /// Fails if `read` and `write` are the same function base.
    pub fn split_mut(
        &mut self,
        read: FunctionId,
        write: FunctionId,
    ) -> IrResult<(&FunctionBase, &mut FunctionBase)> {
        let (r, w) = (read.as_usize(), write.as_usize());

        self.function(read)?;
        self.function(write)?;

        if r == w {
            return Err(IrError::AliasedFunction(
                self.functions[r].name().into(),
            ));
        }

        if r < w {
            let (lo, hi) = self.functions.split_at_mut(w);
            Ok((&lo[r], &mut hi[0]))
        } else {
            let (lo, hi) = self.functions.split_at_mut(r);
            Ok((&hi[0], &mut lo[w]))
        }
    }

    /// Create an invoke of `callee` within `caller`.
    ///
    /// The number of arguments must match the number of parameters of
    ///   `callee`.
    pub fn add_invoke(
        &mut self,
        caller: FunctionId,
        callee: FunctionId,
        args: Vec<NodeId>,
        loc: SourceInfo,
    ) -> IrResult<NodeId> {
        let callee_fn = self.function(callee)?;

        if callee_fn.params().len() != args.len() {
            return Err(IrError::InvokeArityMismatch {
                callee: callee_fn.name().into(),
                params: callee_fn.params().len(),
                given: args.len(),
            });
        }

        self.function_mut(caller)?
            .add_node(Op::Invoke(callee), args, loc)
    }

    /// Whether `node` is an invoke of a foreign function.
    ///
    /// An invoke of an unknown function is not considered to be foreign.
    pub fn is_foreign_invoke(&self, node: &Node) -> bool {
        node.callee()
            .and_then(|callee| self.function(callee).ok())
            .map_or(false, FunctionBase::is_foreign)
    }

    /// Whether `node` is an invoke that may be replaced by the body of its
    ///   callee.
    ///
    /// Foreign functions can not and should not be inlined.
    pub fn is_inlineable(&self, node: &Node) -> bool {
        node.callee().is_some() && !self.is_foreign_invoke(node)
    }

    /// Every live node of the package,
    ///   ordered by function base and then by creation.
    pub fn node_refs(&self) -> Vec<NodeRef> {
        self.functions
            .iter()
            .flat_map(|f| f.nodes().map(move |n| NodeRef::new(f.id(), n.id())))
            .collect()
    }

    /// Total number of live nodes across all function bases.
    pub fn node_count(&self) -> usize {
        self.functions.iter().map(FunctionBase::node_count).sum()
    }

    /// Clone `node` into the function base `target`.
    ///
    /// See [`FunctionBase::clone_in_new_function`].
    pub fn clone_in_new_function(
        &mut self,
        node: NodeRef,
        new_operands: Vec<NodeId>,
        target: FunctionId,
    ) -> IrResult<NodeRef> {
        let src = self.function(node.function)?.node(node.node)?.clone();

        self.function_mut(target)?
            .clone_in_new_function(&src, new_operands)
            .map(|id| NodeRef::new(target, id))
    }

    /// Rewire every user of `node` to `replacement`.
    ///
    /// Both nodes must belong to the same function base;
    ///   see [`FunctionBase::replace_uses_with`].
    pub fn replace_uses_with(
        &mut self,
        node: NodeRef,
        replacement: NodeRef,
    ) -> IrResult<()> {
        if node.function != replacement.function {
            return Err(IrError::ForeignReplacement {
                node: self.describe(node),
                replacement: self.describe(replacement),
            });
        }

        self.function_mut(node.function)?
            .replace_uses_with(node.node, replacement.node)
    }

    /// Remove `node` from its function base.
    ///
    /// See [`FunctionBase::remove_node`].
    pub fn remove_node(&mut self, node: NodeRef) -> IrResult<()> {
        self.function_mut(node.function)?.remove_node(node.node)
    }

    /// Human-readable `function::node` description for diagnostics.
    pub fn describe(&self, node: NodeRef) -> String {
        match self.function(node.function) {
            Ok(f) => match f.get(node.node) {
                Some(n) => format!("{}::{}", f.name(), n.name()),
                None => format!("{}::#{}", f.name(), node.node),
            },
            Err(_) => node.to_string(),
        }
    }
}
