// Source locations attached to IR nodes
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

//! Source location tags.
//!
//! A node carries a [`SourceInfo`] describing where in the source design
//!   it originated.
//! Locations are metadata only:
//!   they have no effect on the structure or semantics of the graph and
//!   exist for diagnostics.
//!
//! A single node may stem from multiple source locations
//!   (for example after two nodes are merged),
//!   so [`SourceInfo`] holds any number of them.
//! An empty [`SourceInfo`] means that the location is unknown.

use std::fmt::{self, Display};

/// A position within a source file.
///
/// Files are referenced by number rather than path;
///   mapping numbers to paths is the business of the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub fileno: u32,
    pub lineno: u32,
    pub colno: u32,
}

impl SourceLocation {
    pub fn new(fileno: u32, lineno: u32, colno: u32) -> Self {
        Self {
            fileno,
            lineno,
            colno,
        }
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.fileno, self.lineno, self.colno)
    }
}

/// Locations from which a node originated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SourceInfo(Vec<SourceLocation>);

impl SourceInfo {
    /// No known location.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn locations(&self) -> &[SourceLocation] {
        &self.0
    }
}

impl From<SourceLocation> for SourceInfo {
    fn from(loc: SourceLocation) -> Self {
        Self(vec![loc])
    }
}

impl From<Vec<SourceLocation>> for SourceInfo {
    fn from(locs: Vec<SourceLocation>) -> Self {
        Self(locs)
    }
}

impl Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "<unknown>"),
            [first, rest @ ..] => {
                write!(f, "{first}")?;
                rest.iter().try_for_each(|loc| write!(f, ", {loc}"))
            }
        }
    }
}
