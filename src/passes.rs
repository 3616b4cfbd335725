// Optimization passes
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

//! Passes over whole packages.
//!
//! Each pass here is a [`Pass<Package>`];
//!   to run one on a scheduled package,
//!   wrap it in a [`WrapperPass`](crate::scheduling::WrapperPass).
//!
//! [`optimization_pipeline`] assembles the standard pipeline.

mod dce;
mod inlining;

pub use dce::DeadCodeEliminationPass;
pub use inlining::InliningPass;

use crate::{
    ir::{verify::verify_package, Package},
    pass::{CompoundPass, InvariantChecker, PassOptions, PassResult},
};

/// Structural verification of every function base of a package.
///
/// See [`crate::ir::verify`].
pub struct VerifyChecker;

impl InvariantChecker<Package> for VerifyChecker {
    fn name(&self) -> &str {
        "verify"
    }

    fn check(&self, unit: &Package, _options: &PassOptions) -> PassResult<()> {
        verify_package(unit).map_err(Into::into)
    }
}

/// Standard pipeline that flattens the call graph and removes whatever
///   inlining left unused,
///     verifying the package after each change.
pub fn optimization_pipeline() -> CompoundPass<Package> {
    let mut top = CompoundPass::new("ir", "Top level pass pipeline");

    top.add_invariant_checker(VerifyChecker)
        .add(InliningPass)
        .add(DeadCodeEliminationPass);

    top
}
