// Function inlining
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

//! Inlining of function invocations.
//!
//! [`InliningPass`] replaces every inlineable [`Op::Invoke`] with a clone
//!   of the body of its callee,
//!     leaving only invokes of foreign functions behind.
//!
//! Function bases are processed in call graph post-order
//!   (callees before callers;
//!     see [`functions_in_post_order`]),
//!   so by the time a function is inlined into its callers,
//!     every inlineable invoke within it has already been eliminated.
//! Encountering such an invoke in a callee is therefore an internal error
//!   ([`IrError::SurvivingInvoke`]).
//!
//! Names
//! =====
//! Cloned nodes retain their assigned names where possible,
//!   but names derived from a parameter of the callee are rewritten in
//!   terms of the corresponding argument at the callsite.
//! For example,
//!   given a callee parameter `x` and a callee node `x_negated`,
//!   an invoke passing `foo` as `x` yields a clone named `foo_negated`.
//! If more than one parameter name is a prefix of the node name,
//!   the longest wins;
//!     among parameters of equal length,
//!     the first by position wins.
//! The clone of the return value of the callee takes on the name of the
//!   invoke,
//!     if the invoke has one.
//!
//! Labels
//! ======
//! Cover and assert labels must be unique in the compiled output,
//!   but inlining the same callee twice would duplicate them.
//! Every cloned label is therefore prefixed with
//!   `{caller}_{n}_{callee}_`,
//!     where `n` counts the callsites inlined during this run of the pass.
//! Should the caller already carry a label of that form,
//!   the new label is further suffixed with `__N`,
//!     as with assigned names.
//! Labels are part of the operation rather than mutable node data,
//!   so relabeling replaces the cloned node with a new one.

use crate::{
    ir::{
        functions_in_post_order, topo_sort, FunctionBase, FunctionId,
        IrError, IrResult, Node, NodeId, NodeRef, Op, Package,
    },
    pass::{Pass, PassOptions, PassResult, PassResults},
};
use fxhash::FxHashMap;

/// Inline every invoke of a non-foreign function.
///
/// See the [module-level documentation](self) for more information.
#[derive(Debug, Clone, Copy, Default)]
pub struct InliningPass;

impl Pass<Package> for InliningPass {
    fn short_name(&self) -> &str {
        "inlining"
    }

    fn long_name(&self) -> &str {
        "Inlines invocations"
    }

    fn run(
        &self,
        package: &mut Package,
        _options: &PassOptions,
        _results: &mut PassResults,
    ) -> PassResult<bool> {
        let mut inline_count = 0;

        for fid in functions_in_post_order(package)? {
            // Inlining adds and removes nodes as we go.
            let snapshot = package.function(fid)?.node_ids();

            for id in snapshot {
                let callee = match package.function(fid)?.get(id) {
                    Some(node) if package.is_inlineable(node) => node.callee(),
                    _ => None,
                };

                if let Some(callee) = callee {
                    inline_invoke(
                        package,
                        NodeRef::new(fid, id),
                        callee,
                        inline_count,
                    )?;

                    inline_count += 1;
                }
            }
        }

        Ok(inline_count > 0)
    }
}

/// Replace the invoke `invoke` of `callee` with a clone of the body of
///   `callee`.
fn inline_invoke(
    package: &mut Package,
    invoke: NodeRef,
    callee: FunctionId,
    inline_count: usize,
) -> IrResult<()> {
    let order = callee_order(package, callee)?;
    let (callee_fn, caller_fn) = package.split_mut(callee, invoke.function)?;

    let return_value = callee_fn.return_value().ok_or_else(|| {
        IrError::Malformed {
            function: callee_fn.name().into(),
            reason: "invoked function has no return value".into(),
        }
    })?;

    let invoke_node = caller_fn.node(invoke.node)?.clone();

    // An invoke built directly through `add_node` bypasses the arity check
    //   of `Package::add_invoke`.
    if invoke_node.operands().len() != callee_fn.params().len() {
        return Err(IrError::InvokeArityMismatch {
            callee: callee_fn.name().into(),
            params: callee_fn.params().len(),
            given: invoke_node.operands().len(),
        });
    }

    let mut map: FxHashMap<NodeId, NodeId> = callee_fn
        .params()
        .iter()
        .copied()
        .zip(invoke_node.operands().iter().copied())
        .collect();

    for id in order {
        if map.contains_key(&id) {
            continue;
        }

        let node = callee_fn.node(id)?;

        if node.is_param() {
            return Err(IrError::Malformed {
                function: callee_fn.name().into(),
                reason: format!(
                    "parameter `{}` is not in the parameter list",
                    node.name(),
                ),
            });
        }

        let operands = node
            .operands()
            .iter()
            .map(|operand| mapped(&map, callee_fn, *operand))
            .collect::<IrResult<Vec<_>>>()?;

        let clone = caller_fn.clone_in_new_function(node, operands)?;

        if caller_fn.node(clone)?.loc().is_empty() {
            caller_fn.set_loc(clone, invoke_node.loc().clone())?;
        }

        map.insert(id, clone);
    }

    for node in callee_fn.nodes().filter(|node| !node.is_param()) {
        let clone = mapped(&map, callee_fn, node.id())?;

        if node.id() == return_value && invoke_node.has_assigned_name() {
            // The name of the invoke moves to the clone when the invoke is
            //   replaced below.
            caller_fn.clear_name(clone)?;
        } else if let Some(name) =
            inlined_node_name(callee_fn, caller_fn, node, &invoke_node)
        {
            caller_fn.set_name(clone, name)?;
        }

        if let Some(label) = node.label() {
            let label = unique_label(
                caller_fn,
                format!(
                    "{}_{inline_count}_{}_{label}",
                    caller_fn.name(),
                    callee_fn.name(),
                ),
            );

            let relabeled = relabel(caller_fn, clone, label)?;
            map.insert(node.id(), relabeled);
        }
    }

    let replacement = mapped(&map, callee_fn, return_value)?;
    caller_fn.replace_uses_with(invoke.node, replacement)?;
    caller_fn.remove_node(invoke.node)?;

    log::trace!(
        "inlined `{}` into `{}` ({} node(s) cloned)",
        callee_fn.name(),
        caller_fn.name(),
        map.len() - callee_fn.params().len(),
    );

    Ok(())
}

/// Nodes of `callee` in topological order,
///   failing if any inlineable invoke remains within it.
fn callee_order(
    package: &Package,
    callee: FunctionId,
) -> IrResult<Vec<NodeId>> {
    let callee_fn = package.function(callee)?;
    let order: Vec<_> = topo_sort(callee_fn).collect();

    let surviving = order
        .iter()
        .filter_map(|&id| callee_fn.get(id))
        .find(|node| package.is_inlineable(node));

    match surviving {
        None => Ok(order),
        Some(node) => Err(IrError::SurvivingInvoke {
            function: callee_fn.name().into(),
            node: node.name().into_owned(),
            callee: node
                .callee()
                .and_then(|id| package.function(id).ok())
                .map_or_else(String::new, |f| f.name().into()),
        }),
    }
}

/// Node of the caller corresponding to `id` of the callee.
fn mapped(
    map: &FxHashMap<NodeId, NodeId>,
    callee_fn: &FunctionBase,
    id: NodeId,
) -> IrResult<NodeId> {
    map.get(&id).copied().ok_or_else(|| IrError::Malformed {
        function: callee_fn.name().into(),
        reason: format!("node {id} was not cloned before its users"),
    })
}

/// Name for the clone of `node` derived from the arguments of the invoke.
///
/// See the [module-level documentation](self).
fn inlined_node_name(
    callee_fn: &FunctionBase,
    caller_fn: &FunctionBase,
    node: &Node,
    invoke_node: &Node,
) -> Option<String> {
    let name = node.assigned_name()?;
    let mut best: Option<(usize, String)> = None;

    let params = callee_fn.params().iter().zip(invoke_node.operands());

    for (&param, &operand) in params {
        let param_name = match callee_fn.get(param) {
            Some(param) => param.name(),
            None => continue,
        };

        let operand_name =
            match caller_fn.get(operand).and_then(Node::assigned_name) {
                Some(operand_name) => operand_name,
                None => continue,
            };

        let longer = best
            .as_ref()
            .map_or(true, |(len, _)| *len < param_name.len());

        if longer && name.starts_with(&*param_name) {
            let suffix = &name[param_name.len()..];
            best = Some((param_name.len(), format!("{operand_name}{suffix}")));
        }
    }

    best.map(|(_, derived)| derived)
}

/// `label`,
///   suffixed with `__N` if a node of `f` already carries it.
fn unique_label(f: &FunctionBase, label: String) -> String {
    let taken = |candidate: &str| {
        f.nodes().any(|node| node.label() == Some(candidate))
    };

    if !taken(&label) {
        return label;
    }

    let mut n = 1;
    loop {
        let candidate = format!("{label}__{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Replace the cover or assert `id` with an identical node bearing
///   `label`.
fn relabel(
    f: &mut FunctionBase,
    id: NodeId,
    label: String,
) -> IrResult<NodeId> {
    let old = f.node(id)?;

    let op: Op =
        old.op()
            .relabeled(label)
            .ok_or_else(|| IrError::Malformed {
                function: f.name().into(),
                reason: format!("`{}` does not carry a label", old.name()),
            })?;

    let (operands, loc) = (old.operands().to_vec(), old.loc().clone());
    let new = f.add_node(op, operands, loc)?;

    // Moves the assigned name along with the users.
    f.replace_uses_with(id, new)?;
    f.remove_node(id)?;

    Ok(new)
}
