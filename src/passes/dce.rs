// Dead code elimination
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

//! Dead code elimination (DCE).
//!
//! A node is dead if nothing uses it and it has no effect of its own.
//! Nodes are visited in reverse topological order
//!   (users before operands),
//!   so removing a node may render its operands dead before they are
//!   visited,
//!     and entire dead chains are removed in a single run.

use crate::{
    ir::{reverse_topo_sort, FunctionBase, NodeId, Package},
    pass::{Pass, PassOptions, PassResult, PassResults},
};
use fxhash::FxHashSet;

/// Remove every node that is neither used,
///   a root of its function base,
///   a parameter,
///   nor side-effecting.
///
/// Covers, asserts, and invokes of foreign functions are side-effecting.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeadCodeEliminationPass;

impl DeadCodeEliminationPass {
    fn is_dead(
        package: &Package,
        f: &FunctionBase,
        roots: &FxHashSet<NodeId>,
        id: NodeId,
    ) -> bool {
        match f.get(id) {
            Some(node) => {
                node.users().is_empty()
                    && !roots.contains(&id)
                    && !node.is_param()
                    && !node.op().is_side_effecting()
                    && !package.is_foreign_invoke(node)
            }
            None => false,
        }
    }
}

impl Pass<Package> for DeadCodeEliminationPass {
    fn short_name(&self) -> &str {
        "dce"
    }

    fn long_name(&self) -> &str {
        "Dead Code Elimination"
    }

    fn run(
        &self,
        package: &mut Package,
        _options: &PassOptions,
        _results: &mut PassResults,
    ) -> PassResult<bool> {
        let mut removed = 0;

        for fid in package.function_ids() {
            let f = package.function(fid)?;
            let roots: FxHashSet<_> = f.roots().into_iter().collect();
            let order = reverse_topo_sort(f);

            for id in order {
                if Self::is_dead(package, package.function(fid)?, &roots, id) {
                    package.function_mut(fid)?.remove_node(id)?;
                    removed += 1;
                }
            }
        }

        log::trace!("removed {removed} dead node(s)");

        Ok(removed > 0)
    }
}
