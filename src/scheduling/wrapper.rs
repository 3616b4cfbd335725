// Adapter running package passes on scheduled units
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

//! Running general passes on scheduled packages.
//!
//! Most passes know nothing of schedules.
//! Rather than maintaining a schedule-aware variant of each,
//!   [`WrapperPass`] runs a [`Pass<Package>`] on the package of a
//!   [`SchedulingUnit`] and then reconciles the schedule with whatever the
//!   pass did:
//!
//!   - nodes removed by the pass are removed from the schedule;
//!       and
//!   - nodes added by the pass have no stage,
//!       so either the pass fails with
//!       [`ConfigError::UnscheduledNewNodes`]
//!       or,
//!         if configured to reschedule new nodes,
//!         the entire schedule is discarded so that the package will be
//!         rescheduled.
//!
//! Nodes are compared by [`NodeRef`];
//!   since node identifiers are never reused,
//!   a node that was removed can never be mistaken for one that was added.

use super::{SchedulingPassOptions, SchedulingUnit};
use crate::{
    ir::{NodeRef, Package},
    pass::{ConfigError, Pass, PassResult, PassResults},
};
use fxhash::FxHashSet;

/// Adapter running a [`Pass<Package>`] as a [`Pass<SchedulingUnit>`].
///
/// See the [module-level documentation](self) for more information.
pub struct WrapperPass<P> {
    wrapped: P,
    reschedule_new_nodes: bool,
    short_name: String,
    long_name: String,
}

impl<P: Pass<Package>> WrapperPass<P> {
    /// Wrap `pass`.
    ///
    /// If `reschedule_new_nodes` is `false`,
    ///   the wrapper fails if `pass` adds any nodes;
    ///     otherwise,
    ///     adding nodes discards the schedule.
    pub fn new(wrapped: P, reschedule_new_nodes: bool) -> Self {
        let short_name = format!("scheduling_{}", wrapped.short_name());
        let long_name = format!("{} (scheduling)", wrapped.long_name());

        Self {
            wrapped,
            reschedule_new_nodes,
            short_name,
            long_name,
        }
    }

    pub fn wrapped(&self) -> &P {
        &self.wrapped
    }
}

impl<P: Pass<Package>> Pass<SchedulingUnit> for WrapperPass<P> {
    fn short_name(&self) -> &str {
        &self.short_name
    }

    fn long_name(&self) -> &str {
        &self.long_name
    }

    fn run(
        &self,
        unit: &mut SchedulingUnit,
        options: &SchedulingPassOptions,
        results: &mut PassResults,
    ) -> PassResult<bool> {
        let before: FxHashSet<NodeRef> =
            unit.package().node_refs().into_iter().collect();

        let changed =
            self.wrapped
                .run(unit.package_mut(), options.as_ref(), results)?;

        let after: FxHashSet<NodeRef> =
            unit.package().node_refs().into_iter().collect();

        let mut removed: Vec<_> = before.difference(&after).copied().collect();
        removed.sort();

        let added = after.difference(&before).count();

        if let Some(schedule) = unit.schedule_mut() {
            for node in &removed {
                if let Some(fschedule) = schedule.get_mut(&node.function) {
                    fschedule.remove_node(node.node);
                }
            }
        }

        log::trace!(
            "`{}` removed {} and added {added} node(s)",
            self.wrapped.short_name(),
            removed.len(),
        );

        if added > 0 {
            if !self.reschedule_new_nodes {
                return Err(ConfigError::UnscheduledNewNodes {
                    pass: self.wrapped.short_name().into(),
                    added,
                }
                .into());
            }

            log::debug!(
                "`{}` added {added} node(s); schedule discarded",
                self.wrapped.short_name(),
            );
            unit.clear_schedule();

            return Ok(true);
        }

        Ok(changed)
    }
}
