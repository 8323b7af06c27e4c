//! Subcommand implementations. Output goes to stdout; logs go to stderr.

#![allow(clippy::print_stdout)]

pub mod account;
pub mod orders;
pub mod products;

use tiendita_client::access::Capability;
use tiendita_client::{Tiendita, access};
use tiendita_core::Role;
use thiserror::Error;

/// Errors raised by the CLI itself rather than the client.
#[derive(Debug, Error)]
pub enum CliError {
    /// No stored session.
    #[error("Not logged in. Run `tienda login` first.")]
    NotLoggedIn,

    /// The logged-in role cannot do this.
    #[error("A {role} account cannot do that")]
    NotPermitted { role: Role },

    /// Malformed argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Role of the logged-in user, if they hold `capability`.
fn require(app: &Tiendita, capability: Capability) -> Result<Role, CliError> {
    let user = app.session().user().ok_or(CliError::NotLoggedIn)?;
    if access::allows(user.role, capability) {
        Ok(user.role)
    } else {
        Err(CliError::NotPermitted { role: user.role })
    }
}
