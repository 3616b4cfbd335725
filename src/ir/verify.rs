// Structural verification of IR
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

//! Structural verification of the graph model.
//!
//! The mutating operations of [`FunctionBase`] maintain the invariants of
//!   the graph incrementally;
//!     this module instead re-derives them from scratch,
//!       which makes it suitable for catching corruption early
//!         (e.g. after each pass of a pipeline).
//! It is far too slow to use on the hot path.

use super::{
    topo_sort, FunctionBase, IrError, IrResult, NodeId, Op, Package,
};
use fxhash::{FxHashMap, FxHashSet};

/// Verify every function base of `package`.
pub fn verify_package(package: &Package) -> IrResult<()> {
    package
        .functions()
        .try_for_each(|f| verify_function(package, f))
}

/// Verify the structure of a single function base.
///
/// This checks that:
///   - every operand is a live node of `f`;
///   - the users of each node are exactly the nodes that hold it as an
///       operand;
///   - every node has an operand count accepted by its operation;
///   - the operand relation is acyclic;
///   - every invoke references a function base of `package` with a
///       matching number of parameters;
///   - every parameter and root is live;
///   - and cover and assert labels are unique.
pub fn verify_function(package: &Package, f: &FunctionBase) -> IrResult<()> {
    let malformed = |reason: String| IrError::Malformed {
        function: f.name().into(),
        reason,
    };

    let mut derived_users: FxHashMap<NodeId, FxHashSet<NodeId>> =
        FxHashMap::default();
    let mut labels = FxHashSet::default();

    for node in f.nodes() {
        node.op().check_arity(node.operands().len())?;

        for &operand in node.operands() {
            if !f.contains(operand) {
                return Err(malformed(format!(
                    "operand {operand} of `{}` is not a live node",
                    node.name(),
                )));
            }

            derived_users.entry(operand).or_default().insert(node.id());
        }

        if let Op::Invoke(callee) = node.op() {
            let callee = package.function(*callee)?;

            if callee.params().len() != node.operands().len() {
                return Err(IrError::InvokeArityMismatch {
                    callee: callee.name().into(),
                    params: callee.params().len(),
                    given: node.operands().len(),
                });
            }
        }

        if let Some(label) = node.label() {
            if !labels.insert(label) {
                return Err(malformed(format!("duplicate label `{label}`")));
            }
        }
    }

    for node in f.nodes() {
        let users: FxHashSet<_> = node.users().iter().copied().collect();
        let expected = derived_users.remove(&node.id()).unwrap_or_default();

        if users.len() != node.users().len() {
            return Err(malformed(format!(
                "users of `{}` contain duplicates",
                node.name(),
            )));
        } else if users != expected {
            return Err(malformed(format!(
                "users of `{}` are inconsistent with operands",
                node.name(),
            )));
        }
    }

    if let Some(&id) = f
        .params()
        .iter()
        .chain(f.roots().iter())
        .find(|&&id| !f.contains(id))
    {
        return Err(malformed(format!(
            "parameter or root {id} is not a live node"
        )));
    }

    check_acyclic(f).map_err(malformed)
}

/// Verify that every operand precedes its user in topological order,
///   which can only fail if the operand relation contains a cycle.
fn check_acyclic(f: &FunctionBase) -> Result<(), String> {
    let mut position = vec![usize::MAX; f.node_id_bound()];

    for (i, id) in topo_sort(f).enumerate() {
        position[id.as_usize()] = i;
    }

    for node in f.nodes() {
        let pos = position[node.id().as_usize()];

        if let Some(&operand) = node
            .operands()
            .iter()
            .find(|o| position[o.as_usize()] >= pos)
        {
            return Err(format!(
                "cycle through operand {operand} of `{}`",
                node.name(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod test;
