// Tests for function bases
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
use crate::ir::{BinaryOp, Bits, Package, SourceLocation};

fn new_function(kind: FunctionKind) -> (Package, FunctionId) {
    let mut pkg = Package::new("test");
    let id = pkg.add_function("f", kind).unwrap();
    (pkg, id)
}

#[test]
fn add_node_registers_users_once_per_user() -> IrResult<()> {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid)?;

    let x = f.param("x")?;
    let y = f.param("y")?;
    let sum = f.add(x, x)?;
    let diff = f.sub(y, x)?;

    assert_eq!(f.node(x)?.users(), &[sum, diff]);
    assert_eq!(f.node(y)?.users(), &[diff]);
    assert_eq!(f.node(diff)?.operands(), &[y, x]);
    assert!(f.node(sum)?.users().is_empty());
    assert_eq!(f.params(), &[x, y]);
    assert_eq!(f.node_count(), 4);

    Ok(())
}

#[test]
fn params_by_position() -> IrResult<()> {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid)?;

    let x = f.param("x")?;
    f.neg(x)?;
    let y = f.param("y")?;

    assert_eq!(f.param_at(0), Some(x));
    assert_eq!(f.param_at(1), Some(y));
    assert_eq!(f.param_at(2), None);

    Ok(())
}

#[test]
fn add_node_rejects_bad_arity() {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid).unwrap();
    let x = f.param("x").unwrap();

    assert_eq!(
        f.add_node(Op::BinOp(BinaryOp::Add), vec![x], SourceInfo::unknown()),
        Err(IrError::ArityMismatch {
            op: "add",
            expected: crate::ir::Arity::Exact(2),
            given: 1,
        }),
    );

    // Nothing was added.
    assert_eq!(f.node_count(), 1);
    assert!(f.node(x).unwrap().users().is_empty());
}

#[test]
fn add_node_rejects_unknown_operand() {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid).unwrap();

    let x = f.param("x").unwrap();
    let neg = f.neg(x).unwrap();
    f.remove_node(neg).unwrap();

    assert!(matches!(
        f.neg(neg),
        Err(IrError::UnknownNode { node, .. }) if node == neg,
    ));
}

#[test]
fn unnamed_nodes_display_derived_name() -> IrResult<()> {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid)?;

    let x = f.param("x")?;
    let neg = f.neg(x)?;

    assert_eq!(f.node(x)?.name(), "x");
    assert_eq!(f.node(neg)?.name(), "neg.2");
    assert_eq!(f.node(neg)?.assigned_name(), None);
    assert_eq!(f.node(neg)?.to_string(), "neg.2 = neg(#1)");

    Ok(())
}

#[test]
fn set_name_uniquifies_within_function() -> IrResult<()> {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid)?;

    let x = f.param("x")?;
    let a = f.neg(x)?;
    let b = f.not(x)?;

    f.set_name(a, "x")?;
    f.set_name(b, "x")?;

    assert_eq!(f.node(a)?.assigned_name(), Some("x__1"));
    assert_eq!(f.node(b)?.assigned_name(), Some("x__2"));
    assert_eq!(f.find_by_name("x__2"), Some(b));

    // Renaming frees the old name.
    f.set_name(a, "y")?;
    assert_eq!(f.find_by_name("x__1"), None);
    assert_eq!(f.find_by_name("y"), Some(a));

    f.clear_name(a)?;
    assert_eq!(f.find_by_name("y"), None);
    assert_eq!(f.node(a)?.name(), "neg.2");

    Ok(())
}

#[test]
fn replace_uses_with_rewires_every_operand_slot() -> IrResult<()> {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid)?;

    let x = f.param("x")?;
    let neg = f.neg(x)?;
    let not = f.not(x)?;
    let sum = f.add(neg, neg)?;
    f.set_return_value(sum)?;

    f.replace_uses_with(neg, not)?;

    assert_eq!(f.node(sum)?.operands(), &[not, not]);
    assert!(f.node(neg)?.users().is_empty());
    assert_eq!(f.node(not)?.users(), &[sum]);

    Ok(())
}

#[test]
fn replace_uses_with_retargets_roots_and_moves_name() -> IrResult<()> {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid)?;

    let x = f.param("x")?;
    let neg = f.neg(x)?;
    let not = f.not(x)?;
    f.set_name(neg, "result")?;
    f.set_return_value(neg)?;

    f.replace_uses_with(neg, not)?;

    assert_eq!(f.return_value(), Some(not));
    assert_eq!(f.node(not)?.assigned_name(), Some("result"));
    assert_eq!(f.node(neg)?.assigned_name(), None);

    // The old node is no longer a root and may now be removed.
    f.remove_node(neg)?;

    Ok(())
}

#[test]
fn replace_uses_with_keeps_replacement_name() -> IrResult<()> {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid)?;

    let x = f.param("x")?;
    let neg = f.neg(x)?;
    let not = f.not(x)?;
    f.set_name(neg, "a")?;
    f.set_name(not, "b")?;

    f.replace_uses_with(neg, not)?;

    assert_eq!(f.node(neg)?.assigned_name(), Some("a"));
    assert_eq!(f.node(not)?.assigned_name(), Some("b"));

    Ok(())
}

#[test]
fn replace_uses_with_does_not_rewire_replacement() -> IrResult<()> {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid)?;

    let x = f.param("x")?;
    let neg = f.neg(x)?;
    let wrapped = f.not(neg)?;
    let sum = f.add(neg, x)?;

    // `wrapped` uses `neg`; rewiring it would produce a self-loop.
    f.replace_uses_with(neg, wrapped)?;

    assert_eq!(f.node(wrapped)?.operands(), &[neg]);
    assert_eq!(f.node(sum)?.operands(), &[wrapped, x]);
    assert_eq!(f.node(neg)?.users(), &[wrapped]);

    Ok(())
}

#[test]
fn replace_uses_with_unknown_replacement_modifies_nothing() {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid).unwrap();

    let x = f.param("x").unwrap();
    let neg = f.neg(x).unwrap();
    let gone = f.not(x).unwrap();
    f.remove_node(gone).unwrap();

    assert!(f.replace_uses_with(x, gone).is_err());
    assert_eq!(f.node(neg).unwrap().operands(), &[x]);
}

#[test]
fn remove_node_refuses_nodes_with_users() {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid).unwrap();

    let x = f.param("x").unwrap();
    let neg = f.neg(x).unwrap();
    let _not = f.not(neg).unwrap();

    assert!(matches!(
        f.remove_node(neg),
        Err(IrError::NodeHasUsers { users: 1, .. }),
    ));
    assert!(f.contains(neg));
}

#[test]
fn remove_node_refuses_roots_and_params() {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid).unwrap();

    let x = f.param("x").unwrap();
    let neg = f.neg(x).unwrap();
    f.set_return_value(neg).unwrap();
    let other = f.not(x).unwrap();

    assert!(matches!(f.remove_node(neg), Err(IrError::RemoveRoot { .. })));

    f.remove_node(other).unwrap();
    let unused = f.param("unused").unwrap();
    assert!(matches!(
        f.remove_node(unused),
        Err(IrError::RemoveParam { .. }),
    ));
}

#[test]
fn remove_node_never_reuses_identifiers() -> IrResult<()> {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid)?;

    let x = f.param("x")?;
    let neg = f.neg(x)?;
    f.set_name(neg, "n")?;
    f.remove_node(neg)?;

    assert!(!f.contains(neg));
    assert!(f.node(x)?.users().is_empty());
    assert_eq!(f.find_by_name("n"), None);
    assert_eq!(f.node_count(), 1);

    let not = f.not(x)?;
    assert!(not > neg);
    assert_eq!(f.node_ids(), vec![x, not]);

    Ok(())
}

#[test]
fn clone_in_new_function_copies_payload_name_and_loc() -> IrResult<()> {
    let mut pkg = Package::new("test");
    let src_id = pkg.add_function("src", FunctionKind::function())?;
    let dst_id = pkg.add_function("dst", FunctionKind::function())?;

    let lit = {
        let src = pkg.function_mut(src_id)?;
        let lit = src.literal(Bits::ubits(42, 8)?)?;
        src.set_name(lit, "answer")?;
        src.set_loc(lit, SourceLocation::new(1, 2, 3).into())?;
        lit
    };

    let (src, dst) = pkg.split_mut(src_id, dst_id)?;
    let y = dst.param("y")?;
    let clone = dst.clone_in_new_function(src.node(lit)?, vec![])?;

    let node = dst.node(clone)?;
    assert_ne!(clone, y);
    assert_eq!(node.op(), &Op::Literal(Bits::ubits(42, 8)?));
    assert_eq!(node.assigned_name(), Some("answer"));
    assert_eq!(node.loc(), &SourceInfo::from(SourceLocation::new(1, 2, 3)));
    assert!(node.users().is_empty());

    // The original is untouched.
    assert_eq!(src.node_count(), 1);

    Ok(())
}

#[test]
fn clone_in_new_function_rejects_bad_arity() -> IrResult<()> {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid)?;

    let x = f.param("x")?;
    let neg = f.neg(x)?;
    let node = f.node(neg)?.clone();

    assert!(matches!(
        f.clone_in_new_function(&node, vec![x, x]),
        Err(IrError::ArityMismatch { op: "neg", .. }),
    ));

    Ok(())
}

#[test]
fn roots_by_function_kind() -> IrResult<()> {
    let mut pkg = Package::new("test");
    let pid = pkg.add_function("p", FunctionKind::proc())?;
    let bid = pkg.add_function("b", FunctionKind::block())?;

    let p = pkg.function_mut(pid)?;
    let tok = p.param("tok")?;
    let st = p.param("st")?;
    let next = p.not(st)?;
    p.set_next_token(tok)?;
    p.add_next_state(next)?;

    assert_eq!(p.roots(), vec![tok, next]);
    assert!(p.is_proc());
    assert_eq!(p.return_value(), None);
    assert!(matches!(
        p.set_return_value(next),
        Err(IrError::WrongFunctionKind {
            expected: "function",
            ..
        }),
    ));

    let b = pkg.function_mut(bid)?;
    let a = b.param("a")?;
    let out = b.neg(a)?;
    b.add_output(out)?;

    assert_eq!(b.roots(), vec![out]);
    assert!(b.is_root(out));
    assert!(!b.is_root(a));

    Ok(())
}

#[test]
fn foreign_function_data_only_for_functions() -> IrResult<()> {
    let mut pkg = Package::new("test");
    let fid = pkg.add_function("ffi", FunctionKind::function())?;
    let bid = pkg.add_function("b", FunctionKind::block())?;

    let data = ForeignFunctionData {
        code_template: "ffi {fn}(.x({x}))".into(),
    };

    pkg.function_mut(fid)?.set_foreign_function_data(data.clone())?;
    assert!(pkg.function(fid)?.is_foreign());
    assert_eq!(pkg.function(fid)?.foreign_function_data(), Some(&data));

    assert!(pkg.function_mut(bid)?.set_foreign_function_data(data).is_err());
    assert!(!pkg.function(bid)?.is_foreign());

    Ok(())
}

#[test]
fn debug_is_a_summary() -> IrResult<()> {
    let (mut pkg, fid) = new_function(FunctionKind::function());
    let f = pkg.function_mut(fid)?;
    f.param("x")?;

    assert_eq!(format!("{f:?}"), "[function `f`: 1 nodes]");

    Ok(())
}
