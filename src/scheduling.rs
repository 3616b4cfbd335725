// Schedule-carrying pass pipelines
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

//! Pipeline schedules and the passes that maintain them.
//!
//! A [`PipelineSchedule`] assigns each node of a function base to a
//!   pipeline stage.
//! The scheduling algorithm itself is an external collaborator,
//!   represented here by the [`Scheduler`] trait;
//!     this module is concerned only with keeping a schedule consistent
//!     with the graph while passes continue to transform it.
//!
//! A [`SchedulingUnit`] pairs a [`Package`] with its schedule.
//! Passes over a [`SchedulingUnit`] are composed just like passes over a
//!   [`Package`]
//!     (see [`crate::pass`]),
//!   and general optimization passes can be reused within such a pipeline
//!   by way of [`WrapperPass`].

mod wrapper;

pub use wrapper::WrapperPass;

use crate::{
    ir::{FunctionBase, FunctionId, IrError, NodeId, Package},
    pass::{
        CompoundPass, InvariantChecker, Pass, PassOptions, PassResult,
        PassResults, PassUnit,
    },
    passes::DeadCodeEliminationPass,
};
use fxhash::FxHashMap;
use std::fmt::{self, Debug};

/// Index of a pipeline stage.
pub type Stage = usize;

/// Assignment of the nodes of a single function base to pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSchedule {
    function: FunctionId,
    stages: FxHashMap<NodeId, Stage>,
}

impl PipelineSchedule {
    pub fn new(function: FunctionId) -> Self {
        Self {
            function,
            stages: FxHashMap::default(),
        }
    }

    /// Function base to which this schedule applies.
    pub fn function(&self) -> FunctionId {
        self.function
    }

    pub fn stage(&self, node: NodeId) -> Option<Stage> {
        self.stages.get(&node).copied()
    }

    pub fn set_stage(&mut self, node: NodeId, stage: Stage) {
        self.stages.insert(node, stage);
    }

    pub fn is_scheduled(&self, node: NodeId) -> bool {
        self.stages.contains_key(&node)
    }

    /// Remove `node` from the schedule,
    ///   returning whether it was scheduled.
    pub fn remove_node(&mut self, node: NodeId) -> bool {
        self.stages.remove(&node).is_some()
    }

    /// Number of scheduled nodes.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Number of stages spanned by the schedule.
    pub fn stage_count(&self) -> usize {
        self.stages.values().max().map_or(0, |&last| last + 1)
    }

    /// Nodes assigned to `stage`,
    ///   ordered by identifier.
    pub fn nodes_in_stage(&self, stage: Stage) -> Vec<NodeId> {
        let mut nodes: Vec<_> = self
            .stages
            .iter()
            .filter(|&(_, &s)| s == stage)
            .map(|(&id, _)| id)
            .collect();

        nodes.sort();
        nodes
    }
}

/// Schedules of every scheduled function base of a package.
pub type PackageSchedule = FxHashMap<FunctionId, PipelineSchedule>;

/// A [`Package`] with an optional schedule.
///
/// The absence of a schedule means that the package must be
///   (re-)scheduled before it can be used by anything downstream that
///   requires one.
#[derive(Clone)]
pub struct SchedulingUnit {
    package: Package,
    schedule: Option<PackageSchedule>,
}

impl Debug for SchedulingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schedule {
            Some(schedule) => write!(
                f,
                "[scheduling unit: {:?}, {} schedule(s)]",
                self.package,
                schedule.len(),
            ),
            None => {
                write!(f, "[scheduling unit: {:?}, unscheduled]", self.package)
            }
        }
    }
}

impl SchedulingUnit {
    /// A unit for `package` that has not yet been scheduled.
    pub fn new(package: Package) -> Self {
        Self {
            package,
            schedule: None,
        }
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    pub fn into_package(self) -> Package {
        self.package
    }

    pub fn schedule(&self) -> Option<&PackageSchedule> {
        self.schedule.as_ref()
    }

    pub fn schedule_mut(&mut self) -> Option<&mut PackageSchedule> {
        self.schedule.as_mut()
    }

    /// Schedule of a single function base,
    ///   if the unit is scheduled.
    pub fn schedule_for(&self, id: FunctionId) -> Option<&PipelineSchedule> {
        self.schedule.as_ref().and_then(|s| s.get(&id))
    }

    pub fn is_scheduled(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn set_schedule(&mut self, schedule: PackageSchedule) {
        self.schedule = Some(schedule);
    }

    /// Discard the schedule,
    ///   requiring that the package be rescheduled.
    pub fn clear_schedule(&mut self) {
        self.schedule = None;
    }
}

impl PassUnit for SchedulingUnit {
    type Options = SchedulingPassOptions;
}

/// Options for passes over a [`SchedulingUnit`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulingPassOptions {
    pub pass_options: PassOptions,

    /// Number of pipeline stages requested of the [`Scheduler`],
    ///   if constrained.
    pub pipeline_stages: Option<usize>,
}

impl AsRef<PassOptions> for SchedulingPassOptions {
    fn as_ref(&self) -> &PassOptions {
        &self.pass_options
    }
}

/// The scheduling algorithm.
///
/// This is an external collaborator;
///   no scheduling algorithm is provided by this crate.
pub trait Scheduler {
    /// Produce a schedule for every live node of `f`.
    fn schedule(
        &self,
        f: &FunctionBase,
        options: &SchedulingPassOptions,
    ) -> PassResult<PipelineSchedule>;
}

/// Schedule every non-foreign function base of an unscheduled unit.
///
/// A unit that is already scheduled is left untouched.
pub struct PipelineSchedulingPass {
    scheduler: Box<dyn Scheduler>,
}

impl PipelineSchedulingPass {
    pub fn new(scheduler: impl Scheduler + 'static) -> Self {
        Self {
            scheduler: Box::new(scheduler),
        }
    }
}

impl Pass<SchedulingUnit> for PipelineSchedulingPass {
    fn short_name(&self) -> &str {
        "pipeline_scheduling"
    }

    fn long_name(&self) -> &str {
        "Pipeline scheduling"
    }

    fn run(
        &self,
        unit: &mut SchedulingUnit,
        options: &SchedulingPassOptions,
        _results: &mut PassResults,
    ) -> PassResult<bool> {
        if unit.is_scheduled() {
            return Ok(false);
        }

        let mut schedule = PackageSchedule::default();

        for f in unit.package().functions().filter(|f| !f.is_foreign()) {
            let fschedule = self.scheduler.schedule(f, options)?;
            log::trace!(
                "scheduled `{}` into {} stage(s)",
                f.name(),
                fschedule.stage_count(),
            );

            schedule.insert(f.id(), fschedule);
        }

        unit.set_schedule(schedule);
        Ok(true)
    }
}

/// Verify that the schedule of a unit,
///   if present,
///   is consistent with its package.
///
/// Every non-foreign function base must have a schedule covering exactly
///   its live nodes,
///     and no operand may be scheduled in a later stage than its user.
pub struct SchedulingChecker;

impl InvariantChecker<SchedulingUnit> for SchedulingChecker {
    fn name(&self) -> &str {
        "scheduling_checker"
    }

    fn check(
        &self,
        unit: &SchedulingUnit,
        _options: &SchedulingPassOptions,
    ) -> PassResult<()> {
        let schedule = match unit.schedule() {
            Some(schedule) => schedule,
            None => return Ok(()),
        };

        for f in unit.package().functions().filter(|f| !f.is_foreign()) {
            let malformed = |reason: String| IrError::Malformed {
                function: f.name().into(),
                reason,
            };

            let fschedule = schedule
                .get(&f.id())
                .ok_or_else(|| malformed("function is not scheduled".into()))?;

            if fschedule.len() != f.node_count() {
                return Err(malformed(format!(
                    "schedule has {} node(s), but function has {} live node(s)",
                    fschedule.len(),
                    f.node_count(),
                ))
                .into());
            }

            for node in f.nodes() {
                let stage = fschedule.stage(node.id()).ok_or_else(|| {
                    malformed(format!("`{}` is not scheduled", node.name()))
                })?;

                for &operand in node.operands() {
                    match fschedule.stage(operand) {
                        Some(ostage) if ostage <= stage => (),
                        _ => {
                            return Err(malformed(format!(
                                "operand {operand} of `{}` is not scheduled \
                                    at or before stage {stage}",
                                node.name(),
                            ))
                            .into())
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// Standard pipeline that schedules a package and then cleans up after
///   scheduling.
pub fn scheduling_pass_pipeline(
    scheduler: impl Scheduler + 'static,
) -> CompoundPass<SchedulingUnit> {
    let mut top =
        CompoundPass::new("scheduling", "Top level scheduling pass pipeline");

    top.add_invariant_checker(SchedulingChecker)
        .add(PipelineSchedulingPass::new(scheduler))
        .add(WrapperPass::new(DeadCodeEliminationPass, false));

    top
}

#[cfg(test)]
mod test;
