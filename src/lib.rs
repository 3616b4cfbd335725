// HWIR mid-end
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


//! Mid-end intermediate representation (IR) for hardware designs.
//!
//! A design is a [`Package`](ir::Package) of function bases,
//!   each owning a dataflow graph of nodes.
//! This crate provides:
//!
//!   - the graph model and its invariants ([`ir`]);
//!   - a deterministic topological sort ([`ir::topo`]);
//!   - the call graph of a package ([`ir::call_graph`]);
//!   - a pass framework with invariant checking ([`pass`]);
//!   - function inlining and dead code elimination ([`passes`]);
//!       and
//!   - pass pipelines over scheduled packages ([`scheduling`]).
//!
//! Scheduling algorithms are supplied by the embedder through
//!   [`Scheduler`](scheduling::Scheduler).

// We build docs for private items.
#![allow(rustdoc::private_intra_doc_links)]

pub mod global;

#[macro_use]
extern crate static_assertions;

pub mod ir;
pub mod pass;
pub mod passes;
pub mod scheduling;
