// Pass framework
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

//! Pass framework.
//!
//! A [`Pass`] transforms a unit of IR in place and reports whether it
//!   changed anything.
//! There are two shapes of unit,
//!   each implementing [`PassUnit`]:
//!
//!   - a [`Package`],
//!       for general optimization passes;
//!       and
//!   - a [`SchedulingUnit`](crate::scheduling::SchedulingUnit),
//!       a package carrying a pipeline schedule that must remain
//!       consistent with the graph.
//!
//! A general [`Pass<Package>`] can be used within a schedule-carrying
//!   pipeline by way of a
//!   [`WrapperPass`](crate::scheduling::WrapperPass).
//!
//! Passes are composed into pipelines using [`CompoundPass`],
//!   which runs its sub-passes in order and,
//!     after each sub-pass that reports a change,
//!     runs each of its [`InvariantChecker`]s.
//! The first failure of any kind halts the pipeline;
//!   errors are never recovered from within a pipeline.
//!
//! Pipelines run sequentially and hold exclusive access to their unit for
//!   the duration of a run.

mod error;
pub mod trace;

pub use error::{ConfigError, PassError, PassResult};

use crate::ir::Package;
use std::fmt::Debug;
use trace::{DefaultTrace, PassTrace};

/// A unit of IR that passes operate upon.
pub trait PassUnit: Debug {
    /// Options accepted by passes over this unit.
    ///
    /// Every options type carries the general [`PassOptions`],
    ///   so that general passes may run on any unit.
    type Options: AsRef<PassOptions>;
}

impl PassUnit for Package {
    type Options = PassOptions;
}

/// Options common to all passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOptions {
    /// If set,
    ///   only sub-passes with these short names are run by a
    ///   [`CompoundPass`].
    pub run_only_passes: Option<Vec<String>>,

    /// Short names of sub-passes that a [`CompoundPass`] must not run.
    pub skip_passes: Vec<String>,
}

impl PassOptions {
    /// Whether a pass with the given short name may be run.
    pub fn should_run(&self, short_name: &str) -> bool {
        let only = self
            .run_only_passes
            .as_ref()
            .map_or(true, |only| only.iter().any(|name| name == short_name));

        only && !self.skip_passes.iter().any(|name| name == short_name)
    }
}

impl AsRef<PassOptions> for PassOptions {
    fn as_ref(&self) -> &PassOptions {
        self
    }
}

/// A single invocation of a pass by a [`CompoundPass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassInvocation {
    pub pass_name: String,
    pub changed: bool,
}

/// Record of the passes run by a pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassResults {
    invocations: Vec<PassInvocation>,
}

impl PassResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, pass_name: impl Into<String>, changed: bool) {
        self.invocations.push(PassInvocation {
            pass_name: pass_name.into(),
            changed,
        })
    }

    /// Every leaf pass run,
    ///   in the order in which they were run.
    pub fn invocations(&self) -> &[PassInvocation] {
        &self.invocations
    }

    /// Short names of the passes that reported a change.
    pub fn changed_passes(&self) -> impl Iterator<Item = &str> + '_ {
        self.invocations
            .iter()
            .filter(|inv| inv.changed)
            .map(|inv| inv.pass_name.as_str())
    }
}

/// A transformation over a unit of IR.
pub trait Pass<U: PassUnit> {
    /// Short identifier of the pass,
    ///   as used by [`PassOptions`].
    fn short_name(&self) -> &str;

    /// Human-readable name of the pass.
    fn long_name(&self) -> &str;

    /// Whether this pass is composed of other passes.
    ///
    /// Only the invocations of passes that are not compound are recorded
    ///   in [`PassResults`].
    fn is_compound(&self) -> bool {
        false
    }

    /// Run the pass over `unit`,
    ///   returning whether it was changed.
    ///
    /// A pass that fails may leave `unit` in any state that is consistent
    ///   with the graph model,
    ///     but not necessarily in the state in which it began.
    fn run(
        &self,
        unit: &mut U,
        options: &U::Options,
        results: &mut PassResults,
    ) -> PassResult<bool>;
}

/// A validator run by a [`CompoundPass`] after any sub-pass reports a
///   change.
pub trait InvariantChecker<U: PassUnit> {
    fn name(&self) -> &str;

    fn check(&self, unit: &U, options: &U::Options) -> PassResult<()>;
}

/// An ordered pipeline of passes with invariant checkers.
///
/// Sub-passes run strictly in order of registration.
/// After each sub-pass that reports a change,
///   every invariant checker is run;
///     a checker failure halts the pipeline with
///     [`PassError::Invariant`],
///       identifying both the checker and the sub-pass that preceded it.
///
/// The compound pass reports a change if any of its sub-passes did.
pub struct CompoundPass<U: PassUnit, T: PassTrace = DefaultTrace> {
    short_name: String,
    long_name: String,
    passes: Vec<Box<dyn Pass<U>>>,
    checkers: Vec<Box<dyn InvariantChecker<U>>>,
    trace: T,
}

impl<U: PassUnit> CompoundPass<U> {
    pub fn new(
        short_name: impl Into<String>,
        long_name: impl Into<String>,
    ) -> Self {
        Self::with_trace(short_name, long_name)
    }
}

impl<U: PassUnit, T: PassTrace> CompoundPass<U, T> {
    /// Create a compound pass using the trace `T` rather than the default.
    pub fn with_trace(
        short_name: impl Into<String>,
        long_name: impl Into<String>,
    ) -> Self {
        Self {
            short_name: short_name.into(),
            long_name: long_name.into(),
            passes: Vec::new(),
            checkers: Vec::new(),
            trace: T::default(),
        }
    }

    /// Append a sub-pass.
    pub fn add(&mut self, pass: impl Pass<U> + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn add_invariant_checker(
        &mut self,
        checker: impl InvariantChecker<U> + 'static,
    ) -> &mut Self {
        self.checkers.push(Box::new(checker));
        self
    }

    /// Short names of sub-passes in the order they will be run.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.short_name()).collect()
    }

    fn check_invariants(
        &self,
        unit: &U,
        options: &U::Options,
        pass: &str,
    ) -> PassResult<()> {
        for checker in &self.checkers {
            checker.check(unit, options).map_err(|cause| {
                log::debug!(
                    "invariant checker `{}` failed after pass `{pass}`",
                    checker.name(),
                );

                PassError::Invariant {
                    checker: checker.name().into(),
                    pass: pass.into(),
                    cause: Box::new(cause),
                }
            })?;
        }

        Ok(())
    }
}

impl<U: PassUnit, T: PassTrace> Pass<U> for CompoundPass<U, T> {
    fn short_name(&self) -> &str {
        &self.short_name
    }

    fn long_name(&self) -> &str {
        &self.long_name
    }

    fn is_compound(&self) -> bool {
        true
    }

    fn run(
        &self,
        unit: &mut U,
        options: &U::Options,
        results: &mut PassResults,
    ) -> PassResult<bool> {
        log::debug!("running compound pass `{}`", self.long_name);

        let mut changed = false;

        for pass in &self.passes {
            let name = pass.short_name();

            if !options.as_ref().should_run(name) {
                log::debug!("skipping pass `{name}` per pass options");
                self.trace.trace_pass_skip(&self.short_name, name);
                continue;
            }

            log::debug!("running pass `{}` ({name})", pass.long_name());
            self.trace.trace_pass_begin(&self.short_name, name, &*unit);

            let result = pass.run(unit, options, results);
            self.trace.trace_pass_end(&*unit, &result);

            let pass_changed = result?;

            if !pass.is_compound() {
                results.record(name, pass_changed);
            }

            if pass_changed {
                changed = true;
                self.check_invariants(unit, options, name)?;
            }
        }

        Ok(changed)
    }
}
