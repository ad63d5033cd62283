//! User directory
//!
//! Resolves who is acting and which customers exist, from the users file.
//! Credentials are handled elsewhere; only the ID and role columns are read.

use crate::core::traits::IdentityProvider;
use crate::io::delimited_reader::read_all;
use crate::io::record_format::parse_user;
use crate::types::{Actor, BankError, CustomerId, Role};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Registered users and the authenticated actor
#[derive(Debug, Clone)]
pub struct UserDirectory {
    actor: Actor,
    users: HashMap<CustomerId, Role>,
}

impl UserDirectory {
    /// Build a directory from known users
    ///
    /// # Errors
    ///
    /// - `BankError::CustomerNotFound` if the actor is not a registered user
    /// - `BankError::Unauthorized` if the actor claims a role the directory
    ///   does not grant them
    pub fn new(
        actor: Actor,
        users: impl IntoIterator<Item = (CustomerId, Role)>,
    ) -> Result<Self, BankError> {
        let users: HashMap<_, _> = users.into_iter().collect();

        match users.get(&actor.id) {
            None => Err(BankError::customer_not_found(actor.id)),
            Some(role) if *role != actor.role => Err(BankError::unauthorized(
                actor.id,
                format!("act as {}", actor.role),
            )),
            Some(_) => Ok(UserDirectory { actor, users }),
        }
    }

    /// Load the users file and authenticate `actor` against it
    ///
    /// A missing file reads as a directory with no users.
    pub fn load(path: &Path, actor: Actor) -> Result<Self, BankError> {
        let users = read_all(path, parse_user)?;
        debug!(users = users.len(), path = %path.display(), "user directory loaded");
        Self::new(actor, users)
    }

    pub fn role_of(&self, customer: CustomerId) -> Option<Role> {
        self.users.get(&customer).copied()
    }
}

impl IdentityProvider for UserDirectory {
    fn owner_exists(&self, customer: CustomerId) -> Result<bool, BankError> {
        Ok(self.users.contains_key(&customer))
    }

    fn current_actor(&self) -> Actor {
        self.actor
    }
}
