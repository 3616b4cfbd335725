// Call graph of a package
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

//! Call graph over the function bases of a [`Package`].
//!
//! The call graph has an edge from a caller to each function base that it
//!   invokes.
//! It is derived on demand from the [`Op::Invoke`] nodes of every function
//!   base and is never stored within the package,
//!     so it cannot fall out of sync with the IR.
//!
//! Calls to foreign functions are not edges of this graph:
//!   they are never inlined,
//!   and so impose no ordering on transformations that process whole
//!   functions.
//!
//! The call graph must be acyclic;
//!   recursion is not supported.

use super::{FunctionBase, FunctionId, IrError, IrResult, Op, Package};
use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
    visit::DfsPostOrder,
};

/// Function bases of `package` ordered such that every function base
///   appears after each of the function bases that it invokes
///   ("leaves first").
///
/// Ties are broken by the order in which function bases were added to the
///   package,
///     so the result is deterministic.
///
/// Fails if the call graph contains a cycle.
pub fn functions_in_post_order(
    package: &Package,
) -> IrResult<Vec<FunctionId>> {
    let call_graph = CallGraph::new(package)?;
    call_graph.check_cycles(package)?;

    Ok(call_graph.post_order())
}

/// Graph of function bases connected by non-foreign call edges.
///
/// The index of each graph node is the index of its [`FunctionId`].
#[derive(Debug)]
pub struct CallGraph {
    graph: DiGraph<FunctionId, ()>,
}

impl CallGraph {
    pub fn new(package: &Package) -> IrResult<Self> {
        let mut graph = DiGraph::with_capacity(package.function_count(), 0);

        for f in package.functions() {
            graph.add_node(f.id());
        }

        for f in package.functions() {
            for callee in Self::direct_callees(package, f)? {
                graph.update_edge(index(f.id()), index(callee), ());
            }
        }

        Ok(Self { graph })
    }

    /// Distinct non-foreign callees of `f`,
    ///   in order of first invocation.
    fn direct_callees(
        package: &Package,
        f: &FunctionBase,
    ) -> IrResult<Vec<FunctionId>> {
        let mut callees = Vec::new();

        for node in f.nodes() {
            let callee = match node.op() {
                Op::Invoke(callee) => *callee,
                _ => continue,
            };

            if package.function(callee)?.is_foreign() {
                continue;
            }

            if !callees.contains(&callee) {
                callees.push(callee);
            }
        }

        Ok(callees)
    }

    /// Whether `caller` directly invokes `callee`,
    ///   ignoring foreign calls.
    pub fn calls(&self, caller: FunctionId, callee: FunctionId) -> bool {
        self.graph.contains_edge(index(caller), index(callee))
    }

    /// Fail with [`IrError::CallGraphCycle`] if any function base may
    ///   (transitively) invoke itself.
    pub fn check_cycles(&self, package: &Package) -> IrResult<()> {
        let cycle = tarjan_scc(&self.graph).into_iter().find(|scc| {
            // A single-node SCC is only a cycle if it invokes itself.
            scc.len() > 1
                || self.graph.neighbors(scc[0]).any(|nx| nx == scc[0])
        });

        match cycle {
            None => Ok(()),
            Some(scc) => Err(IrError::CallGraphCycle(
                scc.into_iter()
                    .map(|nx| {
                        package
                            .function(self.graph[nx])
                            .map(|f| f.name().to_string())
                            .unwrap_or_else(|_| self.graph[nx].to_string())
                    })
                    .collect(),
            )),
        }
    }

    /// Post-order DFS over call edges,
    ///   seeded by every function base in package order.
    ///
    /// This assumes that the graph is acyclic;
    ///   see [`Self::check_cycles`].
    pub fn post_order(&self) -> Vec<FunctionId> {
        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut dfs = DfsPostOrder::empty(&self.graph);

        for seed in self.graph.node_indices() {
            if dfs.finished.contains(seed.index()) {
                continue;
            }

            dfs.move_to(seed);

            while let Some(nx) = dfs.next(&self.graph) {
                order.push(self.graph[nx]);
            }
        }

        order
    }
}

fn index(id: FunctionId) -> NodeIndex {
    NodeIndex::new(id.as_usize())
}
