//! fn-bootstrap: provisions the network and registry prerequisites of a
//! serverless functions tenancy.
//!
//! A run finds or creates, in order, a virtual network, a subnet, an internet
//! gateway, a default route to that gateway and a container repository, then
//! reports the resolved ids and the connection context for the functions CLI.

pub mod bootstrap;
pub mod clients;
pub mod config;
pub mod error;
pub mod handler;
pub mod resolver;
pub mod result;
pub mod session;
pub mod signer;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use bootstrap::Bootstrapper;
pub use clients::{Connector, HttpConnector};
pub use config::{ProvisioningRequest, Topology};
pub use error::{ApiError, BootstrapError, Stage};
pub use handler::{Handler, router};
pub use result::ProvisioningResult;
pub use session::Session;
