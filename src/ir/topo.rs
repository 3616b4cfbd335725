// Topological sort of IR function bases
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

//! Topological sort of a [`FunctionBase`].
//!
//! This is the dependency-order traversal used by every consumer of the
//!   graph that must see operands before their users:
//!     passes that clone or rewrite bodies,
//!     the scheduler,
//!     and code generation.
//!
//! The sort is a depth-first search (DFS) seeded by the nodes of the
//!   function base in creation order.
//! For each seed that has not yet been emitted,
//!   its operands are visited left-to-right by operand index,
//!   recursively,
//!   and a node is emitted only after every one of its operands has been
//!   emitted.
//! The result is therefore _directly_ in topological order,
//!   with operands strictly before their users;
//!     there is no reversal of a root-first search.
//! [`reverse_topo_sort`] is exactly the reverse of [`topo_sort`].
//!
//! The ordering depends only on the structure of the graph and the
//!   creation order of its nodes,
//!     so it is deterministic between runs on an unmodified graph.
//!
//! Dependency chains may be tens of thousands of nodes long,
//!   so the DFS maintains an explicit stack rather than recursing.
//!
//! The operand relation is required to be acyclic.
//! If it is not,
//!   every node is still emitted exactly once,
//!   but the order is meaningless;
//!     see [`verify`](super::verify) for cycle detection.

use super::{FunctionBase, NodeId};
use fixedbitset::FixedBitSet;

/// Sort the nodes of `f` such that every operand appears before each of
///   its users.
///
/// See the [module-level documentation](self) for details on ordering.
pub fn topo_sort(f: &FunctionBase) -> TopoSort {
    TopoSort::new(f)
}

/// The exact reverse of [`topo_sort`],
///   with every user appearing before each of its operands.
pub fn reverse_topo_sort(f: &FunctionBase) -> Vec<NodeId> {
    let mut order: Vec<_> = topo_sort(f).collect();
    order.reverse();
    order
}

/// Initial capacity of the [`TopoSort`] stack.
///
/// The stack must accommodate every node along the longest dependency
///   chain,
///     along with the not-yet-visited operands of each.
/// This number is arbitrary and only intended to reduce small initial
///   re-allocations.
const INIT_STACK_CAP: usize = 32;

/// Topological sort implemented as a post-order depth-first search over
///   operand edges.
pub struct TopoSort<'a> {
    f: &'a FunctionBase,

    /// Nodes of [`Self::f`] in creation order,
    ///   each of which begins a new DFS if it has not yet been emitted.
    seeds: std::vec::IntoIter<NodeId>,

    /// DFS stack.
    ///
    /// The first time a node reaches the top of the stack,
    ///   it is marked as entered and its unfinished operands are pushed
    ///   in reverse order,
    ///     so that they are visited left-to-right.
    /// The second time,
    ///   all of its operands have been emitted and so the node is popped
    ///   and emitted itself.
    stack: Vec<NodeId>,

    /// Nodes whose operands have been pushed onto [`Self::stack`].
    entered: FixedBitSet,

    /// Nodes that have been emitted.
    ///
    /// A node may be pushed onto the stack by any number of users before
    ///   it is emitted;
    ///     all but the first visit are discarded.
    finished: FixedBitSet,
}

impl<'a> TopoSort<'a> {
    fn new(f: &'a FunctionBase) -> Self {
        let set_cap = f.node_id_bound();

        Self {
            f,
            seeds: f.node_ids().into_iter(),
            stack: Vec::with_capacity(INIT_STACK_CAP),
            entered: FixedBitSet::with_capacity(set_cap),
            finished: FixedBitSet::with_capacity(set_cap),
        }
    }

    /// Push the next seed that has not yet been emitted,
    ///   returning `false` if the seeds have been exhausted.
    fn push_seed(&mut self) -> bool {
        let finished = &self.finished;

        match self.seeds.find(|id| !finished.contains(id.as_usize())) {
            Some(seed) => {
                self.stack.push(seed);
                true
            }
            None => false,
        }
    }
}

impl<'a> Iterator for TopoSort<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = match self.stack.last().copied() {
                Some(next) => next,
                None if self.push_seed() => continue,
                None => return None,
            };

            if self.entered.put(next.as_usize()) {
                self.stack.pop(); // next

                if !self.finished.put(next.as_usize()) {
                    return Some(next);
                } else {
                    // Emitted by way of another user.
                    continue;
                }
            }

            let f = self.f;
            let operands = match f.get(next) {
                Some(node) => node.operands(),
                None => &[],
            };

            let finished = &self.finished;
            self.stack.extend(
                operands
                    .iter()
                    .rev()
                    .filter(|id| !finished.contains(id.as_usize())),
            );
        }
    }
}
