// Tests for pipeline schedules
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

use super::*;
use crate::{
    ir::{topo_sort, ForeignFunctionData, FunctionKind, NodeRef},
    pass::{ConfigError, PassError},
    passes::InliningPass,
};

/// Places each node one stage after the latest of its operands,
///   clamped to the last requested stage.
struct AsapScheduler;

impl Scheduler for AsapScheduler {
    fn schedule(
        &self,
        f: &FunctionBase,
        options: &SchedulingPassOptions,
    ) -> PassResult<PipelineSchedule> {
        let last = options
            .pipeline_stages
            .map_or(Stage::MAX, |n| n.saturating_sub(1));

        let mut schedule = PipelineSchedule::new(f.id());

        for id in topo_sort(f) {
            let stage = f
                .node(id)?
                .operands()
                .iter()
                .filter_map(|&operand| schedule.stage(operand))
                .map(|stage| stage + 1)
                .max()
                .unwrap_or(0)
                .min(last);

            schedule.set_stage(id, stage);
        }

        Ok(schedule)
    }
}

/// Adds an unused literal to every function base.
struct AddLiteralPass;

impl Pass<Package> for AddLiteralPass {
    fn short_name(&self) -> &str {
        "add_literal"
    }

    fn long_name(&self) -> &str {
        "Add literal"
    }

    fn run(
        &self,
        pkg: &mut Package,
        _options: &PassOptions,
        _results: &mut PassResults,
    ) -> PassResult<bool> {
        for fid in pkg.function_ids() {
            pkg.function_mut(fid)?.ubits(1, 1)?;
        }

        Ok(true)
    }
}

/// `f(x) { dead = not(x); ret neg(neg(x)) }` and a foreign function.
fn sample_package() -> (Package, FunctionId, NodeId) {
    let mut pkg = Package::new("sample");

    let ffi = pkg.add_function("ffi", FunctionKind::function()).unwrap();
    let p = pkg.function_mut(ffi).unwrap().param("p").unwrap();
    let ffi_fn = pkg.function_mut(ffi).unwrap();
    ffi_fn.set_return_value(p).unwrap();
    ffi_fn
        .set_foreign_function_data(ForeignFunctionData {
            code_template: "ffi {fn}(.p({p}))".into(),
        })
        .unwrap();

    let fid = pkg.add_function("f", FunctionKind::function()).unwrap();
    let f = pkg.function_mut(fid).unwrap();
    let x = f.param("x").unwrap();
    let dead = f.not(x).unwrap();
    let n1 = f.neg(x).unwrap();
    let n2 = f.neg(n1).unwrap();
    f.set_return_value(n2).unwrap();

    (pkg, fid, dead)
}

fn scheduled_unit() -> (SchedulingUnit, FunctionId, NodeId) {
    let (pkg, fid, dead) = sample_package();
    let mut unit = SchedulingUnit::new(pkg);

    PipelineSchedulingPass::new(AsapScheduler)
        .run(
            &mut unit,
            &SchedulingPassOptions::default(),
            &mut PassResults::new(),
        )
        .unwrap();

    (unit, fid, dead)
}

fn check(unit: &SchedulingUnit) -> PassResult<()> {
    SchedulingChecker.check(unit, &SchedulingPassOptions::default())
}

fn sample_package_unit() -> (SchedulingUnit, FunctionId, NodeId) {
    let (pkg, fid, dead) = sample_package();
    (SchedulingUnit::new(pkg), fid, dead)
}

fn unit_return_value(unit: &SchedulingUnit, fid: FunctionId) -> NodeId {
    unit.package().function(fid).unwrap().return_value().unwrap()
}

#[test]
fn schedule_stages() {
    let (pkg, fid, dead) = sample_package();
    let ids = pkg.function(fid).unwrap().node_ids();
    let (x, n1, n2) = (ids[0], ids[2], ids[3]);

    let mut schedule = PipelineSchedule::new(fid);
    assert_eq!(schedule.function(), fid);
    assert!(schedule.is_empty());
    assert_eq!(schedule.stage_count(), 0);

    schedule.set_stage(n2, 1);
    schedule.set_stage(x, 0);
    schedule.set_stage(n1, 1);
    schedule.set_stage(dead, 1);

    assert_eq!(schedule.len(), 4);
    assert_eq!(schedule.stage_count(), 2);
    assert_eq!(schedule.nodes_in_stage(1), vec![dead, n1, n2]);

    assert!(schedule.remove_node(dead));
    assert!(!schedule.remove_node(dead));
    assert!(!schedule.is_scheduled(dead));
    assert_eq!(schedule.stage(n2), Some(1));
}

#[test]
fn schedules_non_foreign_functions() {
    let (mut unit, fid, _) = sample_package_unit();
    let options = SchedulingPassOptions::default();
    let pass = PipelineSchedulingPass::new(AsapScheduler);

    assert!(!unit.is_scheduled());
    assert_eq!(
        pass.run(&mut unit, &options, &mut PassResults::new()),
        Ok(true),
    );
    assert!(unit.is_scheduled());

    let schedule = unit.schedule().unwrap();
    assert_eq!(schedule.len(), 1);
    assert_eq!(unit.schedule_for(fid).unwrap().stage_count(), 3);
    assert_eq!(check(&unit), Ok(()));

    // Already scheduled.
    assert_eq!(
        pass.run(&mut unit, &options, &mut PassResults::new()),
        Ok(false),
    );
}

#[test]
fn scheduler_receives_options() {
    let (mut unit, fid, _) = sample_package_unit();
    let options = SchedulingPassOptions {
        pipeline_stages: Some(2),
        ..Default::default()
    };

    PipelineSchedulingPass::new(AsapScheduler)
        .run(&mut unit, &options, &mut PassResults::new())
        .unwrap();

    assert_eq!(unit.schedule_for(fid).unwrap().stage_count(), 2);
}

#[test]
fn checker_accepts_unscheduled_unit() {
    let (unit, _, _) = sample_package_unit();
    assert_eq!(check(&unit), Ok(()));
}

#[test]
fn checker_rejects_missing_function_schedule() {
    let (mut unit, fid, _) = scheduled_unit();
    unit.schedule_mut().unwrap().remove(&fid);

    assert!(matches!(
        check(&unit),
        Err(PassError::Internal(IrError::Malformed { function, .. }))
            if function == "f"
    ));
}

#[test]
fn checker_rejects_stale_and_missing_nodes() {
    let (mut unit, fid, dead) = scheduled_unit();
    let rv = unit_return_value(&unit, fid);

    unit.package_mut()
        .function_mut(fid)
        .unwrap()
        .remove_node(dead)
        .unwrap();

    // `dead` is still scheduled.
    assert!(check(&unit).is_err());

    let fschedule = unit.schedule_mut().unwrap().get_mut(&fid).unwrap();
    fschedule.remove_node(dead);
    assert_eq!(check(&unit), Ok(()));

    let fschedule = unit.schedule_mut().unwrap().get_mut(&fid).unwrap();
    fschedule.remove_node(rv);
    assert!(check(&unit).is_err());
}

#[test]
fn checker_rejects_operand_in_later_stage() {
    let (mut unit, fid, _) = scheduled_unit();
    let rv = unit_return_value(&unit, fid);
    let operand = unit
        .package()
        .function(fid)
        .and_then(|f| f.node(rv).map(|node| node.operands()[0]))
        .unwrap();

    let fschedule = unit.schedule_mut().unwrap().get_mut(&fid).unwrap();
    fschedule.set_stage(operand, 5);

    let result = check(&unit);

    assert!(matches!(
        &result,
        Err(PassError::Internal(IrError::Malformed { reason, .. }))
            if reason.contains("not scheduled at or before stage")
    ));
    assert!(result.unwrap_err().is_internal());
}

#[test]
fn wrapper_names() {
    let wrapper = WrapperPass::new(DeadCodeEliminationPass, false);

    assert_eq!(wrapper.short_name(), "scheduling_dce");
    assert_eq!(wrapper.long_name(), "Dead Code Elimination (scheduling)");
    assert_eq!(wrapper.wrapped().short_name(), "dce");
}

#[test]
fn wrapper_removes_deleted_nodes_from_schedule() {
    let (mut unit, fid, dead) = scheduled_unit();
    let wrapper = WrapperPass::new(DeadCodeEliminationPass, false);

    assert!(unit.schedule_for(fid).unwrap().is_scheduled(dead));

    let changed = wrapper.run(
        &mut unit,
        &SchedulingPassOptions::default(),
        &mut PassResults::new(),
    );

    assert_eq!(changed, Ok(true));
    assert!(unit.is_scheduled());

    let fschedule = unit.schedule_for(fid).unwrap();
    assert!(!fschedule.is_scheduled(dead));
    assert_eq!(fschedule.len(), 3);
    assert_eq!(check(&unit), Ok(()));
}

#[test]
fn wrapper_rejects_new_nodes_without_rescheduling() {
    let (mut unit, _, _) = scheduled_unit();
    let before = unit.schedule().cloned();
    let wrapper = WrapperPass::new(AddLiteralPass, false);

    let result = wrapper.run(
        &mut unit,
        &SchedulingPassOptions::default(),
        &mut PassResults::new(),
    );

    assert_eq!(
        result,
        Err(PassError::Config(ConfigError::UnscheduledNewNodes {
            pass: "add_literal".into(),
            added: 2,
        })),
    );
    assert!(!result.unwrap_err().is_internal());

    // The schedule is untouched,
    //   though it no longer covers the new nodes.
    assert_eq!(unit.schedule().cloned(), before);
}

#[test]
fn wrapper_rejects_new_nodes_on_unscheduled_unit() {
    let (mut unit, _, _) = sample_package_unit();
    let wrapper = WrapperPass::new(AddLiteralPass, false);

    let result = wrapper.run(
        &mut unit,
        &SchedulingPassOptions::default(),
        &mut PassResults::new(),
    );

    assert!(matches!(result, Err(PassError::Config(_))));
}

#[test]
fn wrapper_discards_schedule_when_rescheduling() {
    let (mut unit, _, _) = scheduled_unit();
    let wrapper = WrapperPass::new(AddLiteralPass, true);

    let changed = wrapper.run(
        &mut unit,
        &SchedulingPassOptions::default(),
        &mut PassResults::new(),
    );

    assert_eq!(changed, Ok(true));
    assert!(!unit.is_scheduled());
}

#[test]
fn wrapper_without_change_keeps_schedule() {
    let (mut unit, _, _) = scheduled_unit();
    let before = unit.schedule().cloned();
    let wrapper = WrapperPass::new(InliningPass, false);

    let changed = wrapper.run(
        &mut unit,
        &SchedulingPassOptions::default(),
        &mut PassResults::new(),
    );

    assert_eq!(changed, Ok(false));
    assert_eq!(unit.schedule().cloned(), before);
}

#[test]
fn scheduling_pipeline_schedules_and_cleans() {
    let (mut unit, fid, dead) = sample_package_unit();
    let pipeline = scheduling_pass_pipeline(AsapScheduler);
    let mut results = PassResults::new();

    assert_eq!(
        pipeline.pass_names(),
        ["pipeline_scheduling", "scheduling_dce"],
    );

    let options = SchedulingPassOptions::default();
    let changed = pipeline.run(&mut unit, &options, &mut results);

    assert_eq!(changed, Ok(true));
    assert_eq!(
        results.changed_passes().collect::<Vec<_>>(),
        ["pipeline_scheduling", "scheduling_dce"],
    );

    assert!(!unit.package().function(fid).unwrap().contains(dead));
    assert!(!unit.schedule_for(fid).unwrap().is_scheduled(dead));
    assert_eq!(check(&unit), Ok(()));

    let removed = NodeRef::new(fid, dead);
    assert!(!unit.package().node_refs().contains(&removed));
    assert_eq!(unit.package().function_count(), 2);
}

#[test]
fn unit_debug() {
    let (unit, _, _) = sample_package_unit();
    assert_eq!(
        format!("{unit:?}"),
        "[scheduling unit: [package `sample`: 2 function bases], unscheduled]",
    );
}
