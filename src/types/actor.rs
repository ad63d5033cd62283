//! The user acting on the engine

use super::account::{Account, CustomerId};
use super::error::BankError;
use std::fmt;
use std::str::FromStr;

/// Role of a system user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// May only operate their own accounts
    Customer,

    /// Bank staff, may operate any account
    Banker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Banker => "banker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "banker" => Ok(Role::Banker),
            other => Err(BankError::invalid_argument(format!(
                "user role must be either banker or customer, got '{}'",
                other
            ))),
        }
    }
}

/// Authenticated user performing operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: CustomerId,
    pub role: Role,
}

impl Actor {
    pub fn customer(id: CustomerId) -> Self {
        Actor {
            id,
            role: Role::Customer,
        }
    }

    pub fn banker(id: CustomerId) -> Self {
        Actor {
            id,
            role: Role::Banker,
        }
    }

    /// Customers may only act on accounts they own; bankers on any
    pub fn may_operate(&self, account: &Account) -> bool {
        self.may_act_for(account.owner)
    }

    pub fn may_act_for(&self, customer: CustomerId) -> bool {
        match self.role {
            Role::Banker => true,
            Role::Customer => self.id == customer,
        }
    }
}
