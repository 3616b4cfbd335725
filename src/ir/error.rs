// IR graph errors
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

//! Errors resulting from operations on the IR graph.
//!
//! With the exception of [`IrError::LiteralOverflow`],
//!   which reflects bad input to a builder,
//!   every error here represents a violated precondition of the graph
//!   model.
//! They are not recoverable within the mid-end;
//!   a pass that encounters one aborts and propagates it to the pipeline
//!   driver as an internal error
//!     (see [`PassError::Internal`](crate::pass::PassError::Internal)).

use std::{
    error::Error,
    fmt::{self, Display},
};

use super::{node::Arity, NodeId};

/// A [`Result`] with a hard-coded [`IrError`] error type.
pub type IrResult<T> = Result<T, IrError>;

/// An error from an IR graph operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    /// A node was created or cloned with an operand count that is
    ///   incompatible with its operation.
    ArityMismatch {
        op: &'static str,
        expected: Arity,
        given: usize,
    },

    /// An invoke was given a number of arguments that does not match the
    ///   number of parameters of its callee.
    InvokeArityMismatch {
        callee: String,
        params: usize,
        given: usize,
    },

    /// A node cannot be removed while other nodes still use it.
    NodeHasUsers {
        function: String,
        node: String,
        users: usize,
    },

    /// A node that serves as a root of its function base
    ///   (e.g. the return value)
    ///   cannot be removed.
    RemoveRoot { function: String, node: String },

    /// Parameters define the signature of a function base and cannot be
    ///   removed as ordinary nodes.
    RemoveParam { function: String, node: String },

    /// A node may only be replaced by a node owned by the same function
    ///   base.
    ForeignReplacement { node: String, replacement: String },

    /// The node does not exist in the function base
    ///   (it was never created there or has since been removed).
    UnknownNode { function: String, node: NodeId },

    /// No function base with the given name exists in the package.
    UnknownFunction(String),

    /// A function base with this name already exists in the package.
    DuplicateFunction(String),

    /// Two distinct function bases were expected,
    ///   but the same function base was provided twice.
    AliasedFunction(String),

    /// The operation requires a different variant of function base.
    WrongFunctionKind {
        function: String,
        expected: &'static str,
    },

    /// The call graph contains a cycle through the named functions.
    CallGraphCycle(Vec<String>),

    /// An invoke of a non-foreign function remains in a callee that is
    ///   being inlined.
    ///
    /// Callees are processed before their callers,
    ///   so this can only happen if that ordering was violated.
    SurvivingInvoke {
        function: String,
        node: String,
        callee: String,
    },

    /// Structural verification of a function base failed.
    Malformed { function: String, reason: String },

    /// A literal value does not fit within the requested bit count.
    LiteralOverflow { value: String, bit_count: u32 },
}

impl IrError {
    /// Whether this error indicates a bug in the compiler rather than bad
    ///   input to a builder.
    pub fn is_precondition_violation(&self) -> bool {
        !matches!(self, Self::LiteralOverflow { .. })
    }
}

impl Display for IrError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use IrError::*;

        match self {
            ArityMismatch {
                op,
                expected,
                given,
            } => write!(
                f,
                "operation `{op}` expects {expected} operand(s), \
                    but {given} were given",
            ),
            InvokeArityMismatch {
                callee,
                params,
                given,
            } => write!(
                f,
                "invoke of `{callee}` has {given} argument(s), \
                    but the callee has {params} parameter(s)",
            ),
            NodeHasUsers {
                function,
                node,
                users,
            } => write!(
                f,
                "cannot remove node `{node}` from `{function}`: \
                    it still has {users} user(s)",
            ),
            RemoveRoot { function, node } => write!(
                f,
                "cannot remove node `{node}` from `{function}`: \
                    it is a root of the function",
            ),
            RemoveParam { function, node } => write!(
                f,
                "cannot remove parameter `{node}` from `{function}`",
            ),
            ForeignReplacement { node, replacement } => write!(
                f,
                "cannot replace uses of `{node}` with `{replacement}`: \
                    nodes belong to different function bases",
            ),
            UnknownNode { function, node } => {
                write!(f, "node {node} does not exist in `{function}`")
            }
            UnknownFunction(name) => {
                write!(f, "function `{name}` does not exist in package")
            }
            DuplicateFunction(name) => {
                write!(f, "function `{name}` already exists in package")
            }
            AliasedFunction(name) => write!(
                f,
                "function `{name}` cannot be both the source and \
                    destination of an operation",
            ),
            WrongFunctionKind { function, expected } => {
                write!(f, "`{function}` is not a {expected}")
            }
            CallGraphCycle(names) => {
                write!(f, "call graph contains a cycle through ")?;

                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "`{name}`")?;
                }

                Ok(())
            }
            SurvivingInvoke {
                function,
                node,
                callee,
            } => write!(
                f,
                "no invokes that are not foreign should remain in function \
                    to inline: `{function}` node `{node}` invokes `{callee}`",
            ),
            Malformed { function, reason } => {
                write!(f, "malformed function `{function}`: {reason}")
            }
            LiteralOverflow { value, bit_count } => write!(
                f,
                "value {value} does not fit in {bit_count} bit(s)",
            ),
        }
    }
}

impl Error for IrError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        None
    }
}
