// Tracing for pass pipelines
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

//! Tracing for pass pipelines.
//!
//! This provides human-readable traces on standard error any time a
//!   [`CompoundPass`](super::CompoundPass) runs or skips a sub-pass.
//! These traces are provided automatically when `cfg(test)`,
//!   which means that they are automatically included in the output of any
//!   test failure.
//!
//! Outside of tests,
//!   this can be enabled using the `pass-trace-stderr` feature flag.
//!
//! _These traces are not meant to be machine-readable!_
//! Do not try to parse them;
//!   the format is subject to change without notice.
//! For structured output,
//!   use the `log` facade,
//!     to which pipelines emit records independently of this trace.

use super::PassResult;
use std::fmt::Debug;

pub trait PassTrace: Default {
    /// Output the upper portion of a pass trace,
    ///   before the sub-pass `pass` of the compound pass `compound` is run
    ///   on `unit`.
    ///
    /// There is no means to return an error and a failure to output the
    ///   trace should not interrupt processing.
    fn trace_pass_begin<U: Debug>(&self, compound: &str, pass: &str, unit: &U);

    /// Output the lower portion of a pass trace,
    ///   including the result of the pass.
    fn trace_pass_end<U: Debug>(&self, unit: &U, result: &PassResult<bool>);

    /// Note that `pass` was excluded by pass options.
    fn trace_pass_skip(&self, compound: &str, pass: &str);
}

/// Perform no tracing.
///
/// This should be used by default for non-test builds,
///   since tracing can incur a significant performance cost.
#[derive(Debug, PartialEq, Default)]
pub struct VoidTrace;

impl PassTrace for VoidTrace {
    fn trace_pass_begin<U: Debug>(&self, _: &str, _: &str, _: &U) {
        // Do nothing at all.
    }

    fn trace_pass_end<U: Debug>(&self, _: &U, _: &PassResult<bool>) {
        // Do nothing at all.
    }

    fn trace_pass_skip(&self, _: &str, _: &str) {
        // Do nothing at all.
    }
}

/// Human-readable [`PassTrace`].
///
/// See [module-level](self) documentation for more information.
#[derive(Debug, PartialEq, Default)]
pub struct HumanReadableTrace;

impl PassTrace for HumanReadableTrace {
    fn trace_pass_begin<U: Debug>(&self, compound: &str, pass: &str, unit: &U) {
        eprint!(
            "\
[CompoundPass::run] ({compound})
| ==> Running pass `{pass}`.
|  |  {unit:?}
|\n",
        );
    }

    fn trace_pass_end<U: Debug>(&self, unit: &U, result: &PassResult<bool>) {
        match result {
            Ok(changed) => eprint!(
                "\
| ==> Pass complete (changed: {changed}).
|  |  {unit:?}\n",
            ),
            Err(err) => eprint!(
                "\
| ==> !!! error: {err}.
|  |  {err:?}\n",
            ),
        }

        eprint_cfg_note();
    }

    fn trace_pass_skip(&self, compound: &str, pass: &str) {
        eprint!(
            "\
[CompoundPass::run] ({compound})
| ==> Skipping pass `{pass}` per pass options.\n",
        );

        eprint_cfg_note();
    }
}

fn eprint_cfg_note() {
    #[allow(unused_variables)]
    let cfg = ""; // so that this compiles without matching cfg
    #[cfg(feature = "pass-trace-stderr")]
    #[allow(unused_variables)]
    let cfg = "feature = \"pass-trace-stderr\"";
    #[cfg(test)] // takes precedence if both are set
    let cfg = "test";
    eprint!(
        "= note: this trace was output as a debugging aid \
            because `cfg({cfg})`.\n\n",
    );
}

#[cfg(any(test, feature = "pass-trace-stderr"))]
pub type DefaultTrace = HumanReadableTrace;

#[cfg(not(any(test, feature = "pass-trace-stderr")))]
pub type DefaultTrace = VoidTrace;
