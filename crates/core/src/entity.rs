// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The fixed set of remote resources a mutation can target.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Mutable resource kinds known to the remote system of record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Field-service job tickets.
    WorkOrder,
    /// Billing counterparties.
    Customer,
    /// Sites where work is carried out.
    Property,
    /// Billing documents raised against completed work.
    Invoice,
    /// Filled-in form templates.
    FormSubmission,
}

impl EntityKind {
    /// Every kind, in declaration order.
    pub const ALL: [EntityKind; 5] = [
        EntityKind::WorkOrder,
        EntityKind::Customer,
        EntityKind::Property,
        EntityKind::Invoice,
        EntityKind::FormSubmission,
    ];

    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::WorkOrder => "work_order",
            EntityKind::Customer => "customer",
            EntityKind::Property => "property",
            EntityKind::Invoice => "invoice",
            EntityKind::FormSubmission => "form_submission",
        }
    }

    /// Returns the remote table (collection) name for this kind.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::WorkOrder => "work_orders",
            EntityKind::Customer => "customers",
            EntityKind::Property => "properties",
            EntityKind::Invoice => "invoices",
            EntityKind::FormSubmission => "form_submissions",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "work_order" | "work_orders" => Ok(EntityKind::WorkOrder),
            "customer" | "customers" => Ok(EntityKind::Customer),
            "property" | "properties" => Ok(EntityKind::Property),
            "invoice" | "invoices" => Ok(EntityKind::Invoice),
            "form_submission" | "form_submissions" => Ok(EntityKind::FormSubmission),
            _ => Err(Error::InvalidEntityKind(s.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
