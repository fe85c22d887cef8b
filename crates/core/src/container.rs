// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container records as reported by the container engine.

use serde::{Deserialize, Serialize};

/// State word the engine reports for a container that has exited.
pub const STATE_EXITED: &str = "exited";

/// Summary of one engine-managed container.
///
/// The manager only branches on `exited` versus everything else; all other
/// state words (`running`, `created`, ...) pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    /// Engine-assigned container ID.
    pub id: String,
    /// Names the engine reports. Listings prepend a `/`.
    pub names: Vec<String>,
    /// Engine state word (`running`, `exited`, `created`, ...).
    pub state: String,
}

impl ContainerRecord {
    /// Primary name with any leading `/` stripped.
    pub fn name(&self) -> &str {
        self.names
            .first()
            .map(|n| n.strip_prefix('/').unwrap_or(n))
            .unwrap_or("")
    }

    pub fn is_exited(&self) -> bool {
        self.state == STATE_EXITED
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
