// Convenience node construction
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

//! Shorthand for creating common nodes.
//!
//! The front end builds the IR from source;
//!   these helpers exist for embedders and tests that need to construct
//!   small graphs by hand.
//! Every node created here has an unknown source location.
//!
//! Invokes are created through [`super::Package::add_invoke`],
//!   since validating their arguments requires the callee.

use super::{
    BinaryOp, Bits, FunctionBase, IrResult, NaryOp, NodeId, Op, SourceInfo,
    UnaryOp,
};

impl FunctionBase {
    /// Append a named parameter.
    pub fn param(&mut self, name: impl Into<String>) -> IrResult<NodeId> {
        self.add_named_node(Op::Param, vec![], SourceInfo::unknown(), name)
    }

    pub fn literal(&mut self, value: Bits) -> IrResult<NodeId> {
        self.add_node(Op::Literal(value), vec![], SourceInfo::unknown())
    }

    /// Unsigned literal of `bit_count` bits.
    pub fn ubits(&mut self, value: u64, bit_count: u32) -> IrResult<NodeId> {
        self.literal(Bits::ubits(value, bit_count)?)
    }

    pub fn unop(&mut self, op: UnaryOp, x: NodeId) -> IrResult<NodeId> {
        self.add_node(Op::UnOp(op), vec![x], SourceInfo::unknown())
    }

    pub fn neg(&mut self, x: NodeId) -> IrResult<NodeId> {
        self.unop(UnaryOp::Neg, x)
    }

    pub fn not(&mut self, x: NodeId) -> IrResult<NodeId> {
        self.unop(UnaryOp::Not, x)
    }

    pub fn binop(
        &mut self,
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    ) -> IrResult<NodeId> {
        self.add_node(Op::BinOp(op), vec![lhs, rhs], SourceInfo::unknown())
    }

    pub fn add(&mut self, lhs: NodeId, rhs: NodeId) -> IrResult<NodeId> {
        self.binop(BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(&mut self, lhs: NodeId, rhs: NodeId) -> IrResult<NodeId> {
        self.binop(BinaryOp::Sub, lhs, rhs)
    }

    pub fn nary(&mut self, op: NaryOp, xs: Vec<NodeId>) -> IrResult<NodeId> {
        self.add_node(Op::NaryOp(op), xs, SourceInfo::unknown())
    }

    pub fn tuple(&mut self, xs: Vec<NodeId>) -> IrResult<NodeId> {
        self.add_node(Op::Tuple, xs, SourceInfo::unknown())
    }

    pub fn tuple_index(&mut self, x: NodeId, i: usize) -> IrResult<NodeId> {
        self.add_node(Op::TupleIndex(i), vec![x], SourceInfo::unknown())
    }

    /// Select among `cases` by `selector`.
    pub fn select(
        &mut self,
        selector: NodeId,
        cases: Vec<NodeId>,
    ) -> IrResult<NodeId> {
        let operands = std::iter::once(selector).chain(cases).collect();
        self.add_node(Op::Select, operands, SourceInfo::unknown())
    }

    pub fn after_all(&mut self, tokens: Vec<NodeId>) -> IrResult<NodeId> {
        self.add_node(Op::AfterAll, tokens, SourceInfo::unknown())
    }

    pub fn cover(
        &mut self,
        token: NodeId,
        condition: NodeId,
        label: impl Into<String>,
    ) -> IrResult<NodeId> {
        self.add_node(
            Op::Cover {
                label: label.into(),
            },
            vec![token, condition],
            SourceInfo::unknown(),
        )
    }

    pub fn assert(
        &mut self,
        token: NodeId,
        condition: NodeId,
        message: impl Into<String>,
        label: Option<String>,
    ) -> IrResult<NodeId> {
        self.add_node(
            Op::Assert {
                message: message.into(),
                label,
            },
            vec![token, condition],
            SourceInfo::unknown(),
        )
    }
}
