// Pass framework errors
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

//! Errors resulting from running passes.
//!
//! There are three distinct classes of failure:
//!
//!   - [`PassError::Internal`] is a violated precondition of the graph
//!       model,
//!         which is a bug in the compiler;
//!   - [`PassError::Config`] is a caller's policy choice that a pass was
//!       unable to honor;
//!       and
//!   - [`PassError::Invariant`] is a failed invariant check after a pass
//!       reported a change,
//!         which is also a bug in the compiler.
//!
//! None of these are recovered from within a pipeline;
//!   the pipeline halts and the error is propagated to its driver.

use crate::ir::IrError;
use std::{
    error::Error,
    fmt::{self, Display},
};

/// A [`Result`] with a hard-coded [`PassError`] error type.
pub type PassResult<T> = Result<T, PassError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassError {
    /// A precondition of the graph model was violated.
    Internal(IrError),

    /// The pass could not honor the configuration it was given.
    Config(ConfigError),

    /// An invariant checker rejected the result of a pass.
    Invariant {
        checker: String,
        pass: String,
        cause: Box<PassError>,
    },
}

impl PassError {
    /// Whether this error represents a bug in the compiler,
    ///   as opposed to a failure resulting from caller policy.
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Internal(_) | Self::Invariant { .. } => true,
            Self::Config(_) => false,
        }
    }
}

impl From<IrError> for PassError {
    fn from(e: IrError) -> Self {
        Self::Internal(e)
    }
}

impl From<ConfigError> for PassError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl Display for PassError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Internal(e) => write!(
                f,
                "internal error: {e} (this may be a compiler bug!)"
            ),
            Self::Config(e) => Display::fmt(e, f),
            Self::Invariant {
                checker,
                pass,
                cause,
            } => write!(
                f,
                "invariant checker `{checker}` failed after pass \
                    `{pass}`: {cause}",
            ),
        }
    }
}

impl Error for PassError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Internal(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Invariant { cause, .. } => Some(cause.as_ref()),
        }
    }
}

/// A pass was unable to honor its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A pass wrapped for use on a scheduled package added nodes,
    ///   but the wrapper was not configured to reschedule them.
    UnscheduledNewNodes { pass: String, added: usize },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnscheduledNewNodes { pass, added } => write!(
                f,
                "pass `{pass}` added {added} node(s) to a scheduled \
                    package, but rescheduling new nodes was not requested",
            ),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
