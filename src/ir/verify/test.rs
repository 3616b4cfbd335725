// Tests for structural verification
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
use crate::ir::{FunctionId, FunctionKind, SourceInfo};

fn new_function() -> (Package, FunctionId) {
    let mut pkg = Package::new("test");
    let id = pkg.add_function("f", FunctionKind::function()).unwrap();
    (pkg, id)
}

#[test]
fn well_formed_package_verifies() -> IrResult<()> {
    let mut pkg = Package::new("test");
    let h = pkg.add_function("h", FunctionKind::function())?;
    let g = pkg.add_function("g", FunctionKind::function())?;

    let hf = pkg.function_mut(h)?;
    let a = hf.param("a")?;
    let tok = hf.after_all(vec![])?;
    let cond = hf.ubits(1, 1)?;
    hf.cover(tok, cond, "ovf")?;
    hf.assert(tok, cond, "oops", None)?;
    hf.assert(tok, cond, "oops", None)?;
    let r = hf.neg(a)?;
    hf.set_return_value(r)?;

    let y = pkg.function_mut(g)?.param("y")?;
    let call = pkg.add_invoke(g, h, vec![y], SourceInfo::unknown())?;
    pkg.function_mut(g)?.set_return_value(call)?;

    verify_package(&pkg)
}

#[test]
fn duplicate_labels_are_malformed() -> IrResult<()> {
    let (mut pkg, fid) = new_function();
    let f = pkg.function_mut(fid)?;

    let tok = f.after_all(vec![])?;
    let cond = f.ubits(1, 1)?;
    f.cover(tok, cond, "same")?;
    f.assert(tok, cond, "msg", Some("same".into()))?;

    assert!(matches!(
        verify_package(&pkg),
        Err(IrError::Malformed { function, reason })
            if function == "f" && reason.contains("`same`"),
    ));

    Ok(())
}

#[test]
fn invoke_arity_is_rechecked() -> IrResult<()> {
    let mut pkg = Package::new("test");
    let h = pkg.add_function("h", FunctionKind::function())?;
    let g = pkg.add_function("g", FunctionKind::function())?;

    pkg.add_invoke(g, h, vec![], SourceInfo::unknown())?;

    // The callee's signature changed after the invoke was created.
    pkg.function_mut(h)?.param("late")?;

    assert_eq!(
        verify_package(&pkg),
        Err(IrError::InvokeArityMismatch {
            callee: "h".into(),
            params: 1,
            given: 0,
        }),
    );

    Ok(())
}

#[test]
fn operand_cycle_is_malformed() -> IrResult<()> {
    let (mut pkg, fid) = new_function();
    let f = pkg.function_mut(fid)?;

    let x = f.param("x")?;
    let u = f.neg(x)?;
    let v = f.not(u)?;
    let w = f.neg(x)?;
    let _user = f.add(w, v)?;

    // `u` becomes a user of `v`,
    //   which is itself a user of `u`.
    f.replace_uses_with(x, v)?;

    assert!(matches!(
        verify_package(&pkg),
        Err(IrError::Malformed { reason, .. }) if reason.contains("cycle"),
    ));

    Ok(())
}
