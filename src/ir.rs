// Intermediate representation of hardware designs
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

//! Intermediate representation (IR) of hardware designs.
//!
//! The IR is a mutable dataflow graph.
//! A [`Package`] owns a set of [`FunctionBase`]s,
//!   each of which owns an acyclic graph of [`Node`]s connected by operand
//!   edges;
//!     every node also knows its users,
//!     and the two directions are kept consistent by every mutating
//!     operation.
//!
//! Graph Model
//! ===========
//! Nodes live in a per-function-base arena and are referenced by
//!   [`NodeId`],
//!     which is stable for the lifetime of the function base.
//! A node belongs to exactly one function base;
//!   moving a node into another function base is always performed by
//!   cloning it into a new node
//!     (see [`FunctionBase::clone_in_new_function`]).
//! Nodes are destroyed explicitly,
//!   and only after all of their users have been rewired away
//!     (see [`FunctionBase::replace_uses_with`] and
//!      [`FunctionBase::remove_node`]).
//!
//! Traversal
//! =========
//! - [`topo_sort`] and [`reverse_topo_sort`] order the nodes of a function
//!     base by dependency;
//! - [`functions_in_post_order`] orders the function bases of a package
//!     such that callees appear before their callers;
//!     and
//! - [`verify`] re-derives the invariants of the graph to detect
//!     corruption.

mod bits;
mod build;
mod error;
mod function;
mod loc;
mod node;
mod package;

pub mod call_graph;
pub mod topo;
pub mod verify;

pub use bits::Bits;
pub use call_graph::{functions_in_post_order, CallGraph};
pub use error::{IrError, IrResult};
pub use function::{ForeignFunctionData, FunctionBase, FunctionKind};
pub use loc::{SourceInfo, SourceLocation};
pub use node::{Arity, BinaryOp, NaryOp, Node, NodeId, Op, UnaryOp};
pub use package::{FunctionId, NodeRef, Package};
pub use topo::{reverse_topo_sort, topo_sort};
