//! The acting user and the capabilities they hold.
//!
//! Authentication happens elsewhere; the core only receives an [`Actor`]
//! with its capability set and checks it before every mutation.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use simba_shared::types::UserId;

use crate::error::CoreError;

/// Business module a capability or audit event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Module {
    /// Sales and CRM.
    Sales,
    /// Stock ledger.
    Inventory,
    /// Ledger, incomes, and accounts.
    Finance,
    /// Anything else.
    Other,
}

impl Module {
    /// Returns the string representation of the module.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sales => "SALES",
            Self::Inventory => "INVENTORY",
            Self::Finance => "FINANCE",
            Self::Other => "OTHER",
        }
    }

    /// Parses a module from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SALES" => Some(Self::Sales),
            "INVENTORY" => Some(Self::Inventory),
            "FINANCE" => Some(Self::Finance),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current user with their permission set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// User identifier.
    pub id: UserId,
    /// Display name for audit trails.
    pub name: String,
    capabilities: HashSet<Module>,
}

impl Actor {
    /// Creates an actor holding the given capabilities.
    pub fn new(id: UserId, name: impl Into<String>, capabilities: impl IntoIterator<Item = Module>) -> Self {
        Self {
            id,
            name: name.into(),
            capabilities: capabilities.into_iter().collect(),
        }
    }

    /// An actor allowed into every module (bootstrap jobs, seeders).
    pub fn system(name: impl Into<String>) -> Self {
        Self::new(
            UserId::new(),
            name,
            [Module::Sales, Module::Inventory, Module::Finance, Module::Other],
        )
    }

    /// Returns true if the actor may act in `module`.
    #[must_use]
    pub fn has_capability(&self, module: Module) -> bool {
        self.capabilities.contains(&module)
    }

    /// Fails with [`CoreError::PermissionDenied`] unless the actor holds `module`.
    pub fn require(&self, module: Module) -> Result<(), CoreError> {
        if self.has_capability(module) {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied {
                actor: self.id,
                module,
            })
        }
    }
}
