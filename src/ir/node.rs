// IR nodes
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

//! Nodes and their operations.
//!
//! A [`Node`] is a single operation within a
//!   [`FunctionBase`](super::FunctionBase).
//! Its operation is a closed sum type [`Op`] carrying any
//!   operation-specific payload;
//!     transformations pattern match on it rather than inspecting a node's
//!     type at runtime.
//!
//! Operand order is significant
//!   (the first operand of `sub` is the minuend).
//! The users of a node are derived from the operands of other nodes and
//!   can only be changed through the edge-mutating operations of
//!   [`FunctionBase`](super::FunctionBase),
//!     which keep both directions in sync.

use super::{Bits, FunctionId, IrError, IrResult, SourceInfo};
use crate::global;
use std::{
    borrow::Cow,
    fmt::{self, Display},
};

/// Identifier of a [`Node`] within its
///   [`FunctionBase`](super::FunctionBase).
///
/// Identifiers are allocated in creation order and are never reused for
///   the lifetime of the function base,
///     even after the node they identify has been removed.
/// A node cloned into another function base is a distinct node with its
///   own identifier allocated by that function base.
///
/// The index `0` is never valid,
///   which allows us to have `Option<NodeId>` at no space cost.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(global::NonZeroNodeIdSize);
assert_eq_size!(Option<NodeId>, NodeId);

impl NodeId {
    /// Identifier of the node at the given creation index.
    ///
    /// Panics
    /// ======
    /// Will panic if the identifier space of [`global::NodeIdSize`] has
    ///   been exhausted.
    pub(super) fn from_index(index: usize) -> Self {
        index
            .checked_add(1)
            .and_then(|n| global::NodeIdSize::try_from(n).ok())
            .and_then(global::NonZeroNodeIdSize::new)
            .map(NodeId)
            .expect("internal error: node identifier space exhausted")
    }

    /// Creation index of this node,
    ///   suitable for indexing dense per-node tables.
    pub fn as_usize(self) -> usize {
        self.0.get() as usize - 1
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Number of operands accepted by an [`Op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Self::Exact(expected) => n == expected,
            Self::AtLeast(min) => n >= min,
        }
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "exactly {n}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Identity,
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Shll,
    Shrl,
    Eq,
    Ne,
    ULt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NaryOp {
    And,
    Or,
    Xor,
    Concat,
}

/// Operation performed by a [`Node`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    /// A parameter of the owning function base.
    ///
    /// Its position is its index within
    ///   [`FunctionBase::params`](super::FunctionBase::params).
    Param,

    Literal(Bits),
    UnOp(UnaryOp),
    BinOp(BinaryOp),
    NaryOp(NaryOp),
    Tuple,

    /// Extract the element at the given index of a tuple operand.
    TupleIndex(usize),

    /// Select among the cases (all operands after the first) using the
    ///   first operand.
    Select,

    /// Join any number of tokens into one,
    ///   ordering side-effecting operations.
    AfterAll,

    /// Call the given function with the operands as arguments.
    ///
    /// If the callee is a foreign function,
    ///   the call is opaque and will never be inlined.
    Invoke(FunctionId),

    /// A coverpoint whose operands are a token and a condition.
    ///
    /// The label must be unique within the compiled output.
    Cover { label: String },

    /// An assertion whose operands are a token and a condition.
    ///
    /// If present,
    ///   the label must be unique within the compiled output.
    Assert {
        message: String,
        label: Option<String>,
    },
}

impl Op {
    /// Short name of the operation,
    ///   used to derive display names for unnamed nodes.
    pub fn mnemonic(&self) -> &'static str {
        use BinaryOp::*;
        use NaryOp::*;
        use UnaryOp::*;

        match self {
            Self::Param => "param",
            Self::Literal(_) => "literal",
            Self::UnOp(Identity) => "identity",
            Self::UnOp(Neg) => "neg",
            Self::UnOp(Not) => "not",
            Self::BinOp(Add) => "add",
            Self::BinOp(Sub) => "sub",
            Self::BinOp(Mul) => "umul",
            Self::BinOp(Shll) => "shll",
            Self::BinOp(Shrl) => "shrl",
            Self::BinOp(BinaryOp::Eq) => "eq",
            Self::BinOp(Ne) => "ne",
            Self::BinOp(ULt) => "ult",
            Self::NaryOp(And) => "and",
            Self::NaryOp(Or) => "or",
            Self::NaryOp(Xor) => "xor",
            Self::NaryOp(Concat) => "concat",
            Self::Tuple => "tuple",
            Self::TupleIndex(_) => "tuple_index",
            Self::Select => "sel",
            Self::AfterAll => "after_all",
            Self::Invoke(_) => "invoke",
            Self::Cover { .. } => "cover",
            Self::Assert { .. } => "assert",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Self::Param | Self::Literal(_) => Arity::Exact(0),
            Self::UnOp(_) | Self::TupleIndex(_) => Arity::Exact(1),
            Self::BinOp(_) => Arity::Exact(2),
            Self::NaryOp(_) => Arity::AtLeast(1),
            Self::Select => Arity::AtLeast(2),
            Self::Tuple | Self::AfterAll | Self::Invoke(_) => {
                Arity::AtLeast(0)
            }
            Self::Cover { .. } | Self::Assert { .. } => Arity::Exact(2),
        }
    }

    /// Verify that this operation accepts `n` operands.
    pub fn check_arity(&self, n: usize) -> IrResult<()> {
        let expected = self.arity();

        if expected.accepts(n) {
            Ok(())
        } else {
            Err(IrError::ArityMismatch {
                op: self.mnemonic(),
                expected,
                given: n,
            })
        }
    }

    /// Whether the operation has an effect beyond producing its value.
    ///
    /// Such nodes are live even without users.
    /// Foreign invokes are also effectful,
    ///   but determining that requires the package;
    ///     see [`super::Package::is_foreign_invoke`].
    pub fn is_side_effecting(&self) -> bool {
        matches!(self, Self::Cover { .. } | Self::Assert { .. })
    }

    /// Label of a cover or assert,
    ///   if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Cover { label } => Some(label),
            Self::Assert { label, .. } => label.as_deref(),
            _ => None,
        }
    }

    /// This operation with its label replaced by `label`.
    ///
    /// Labels are immutable payload;
    ///   relabeling produces a new operation that must be placed on a new
    ///   node.
    /// Returns [`None`] if this operation carries no label.
    pub fn relabeled(&self, label: String) -> Option<Self> {
        match self {
            Self::Cover { .. } => Some(Self::Cover { label }),
            Self::Assert {
                message,
                label: Some(_),
            } => Some(Self::Assert {
                message: message.clone(),
                label: Some(label),
            }),
            _ => None,
        }
    }
}

/// A single operation within a [`FunctionBase`](super::FunctionBase).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    op: Op,
    operands: Vec<NodeId>,

    /// Nodes holding this node as an operand,
    ///   each listed once regardless of how many operand slots reference
    ///   this node.
    users: Vec<NodeId>,

    name: Option<String>,
    loc: SourceInfo,
}

impl Node {
    pub(super) fn new(
        id: NodeId,
        op: Op,
        operands: Vec<NodeId>,
        loc: SourceInfo,
    ) -> Self {
        Self {
            id,
            op,
            operands,
            users: Vec::new(),
            name: None,
            loc,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn operands(&self) -> &[NodeId] {
        &self.operands
    }

    pub fn operand(&self, i: usize) -> Option<NodeId> {
        self.operands.get(i).copied()
    }

    pub fn users(&self) -> &[NodeId] {
        &self.users
    }

    pub fn is_param(&self) -> bool {
        matches!(self.op, Op::Param)
    }

    /// Callee of an invoke.
    pub fn callee(&self) -> Option<FunctionId> {
        match self.op {
            Op::Invoke(callee) => Some(callee),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.op.label()
    }

    pub fn has_assigned_name(&self) -> bool {
        self.name.is_some()
    }

    pub fn assigned_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name of the node for display.
    ///
    /// This is the assigned name if there is one,
    ///   otherwise a name derived from the operation and identifier
    ///   (e.g. `neg.4`).
    pub fn name(&self) -> Cow<str> {
        match &self.name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("{}.{}", self.op.mnemonic(), self.id)),
        }
    }

    pub fn loc(&self) -> &SourceInfo {
        &self.loc
    }

    pub(super) fn set_assigned_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub(super) fn set_loc(&mut self, loc: SourceInfo) {
        self.loc = loc;
    }

    pub(super) fn operands_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.operands
    }

    /// Record `user` as a user of this node if it is not already.
    pub(super) fn add_user(&mut self, user: NodeId) {
        if !self.users.contains(&user) {
            self.users.push(user);
        }
    }

    pub(super) fn remove_user(&mut self, user: NodeId) {
        self.users.retain(|&u| u != user);
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} = {}(", self.name(), self.op.mnemonic())?;

        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "#{operand}")?;
        }

        match &self.op {
            Op::Literal(bits) => write!(f, "value={bits}")?,
            Op::TupleIndex(index) => write!(f, ", index={index}")?,
            Op::Invoke(callee) => write!(f, ", to_apply={callee}")?,
            Op::Cover { label } => write!(f, ", label=\"{label}\"")?,
            Op::Assert { message, label } => {
                write!(f, ", message=\"{message}\"")?;
                if let Some(label) = label {
                    write!(f, ", label=\"{label}\"")?;
                }
            }
            _ => (),
        }

        write!(f, ")")
    }
}
