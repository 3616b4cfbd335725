// Global constants across the entirety of HWIR
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

//! System-wide static configuration.
//!
//! This module provides a system-wide configuration.
//! Subsystems should reference these values rather than defining their own
//!   and risk incompatibilities or maintenance issues as requirements
//!   change.
//!
//! By convention,
//!   import this entire module rather than individual members and reference
//!   them as `global::foo` to emphasize their nature and risk.

use std::num;

/// A size capable of representing every node ever created within a single
///   function base.
///
/// Node identifiers are never reused,
///   so this must accommodate every node created by every pass over the
///   lifetime of the function base,
///     not just the nodes that are live at any given moment.
/// Inlining in particular can easily expand a small design into a great
///   deal of IR.
pub type NodeIdSize = u32;

/// A non-zero equivalent of [`NodeIdSize`];
pub type NonZeroNodeIdSize = num::NonZeroU32;

/// A size capable of representing every function base within a single
///   package.
///
/// Function bases are never removed from a package.
pub type FunctionIdSize = u32;

/// Maximum width of a literal [`Bits`](crate::ir::Bits) value.
pub const MAX_LITERAL_BIT_COUNT: u32 = 64;
