//! Resolvers for the provisioned resources.
//!
//! Each resolver compares what the caller wants with what the cloud already
//! has and creates only what is missing, so re-running the sequence converges
//! instead of duplicating resources.

pub mod network;
pub mod repository;
pub mod route;

use std::future::Future;

use tracing::debug;

use crate::error::{ApiResult, BootstrapError, Result, Stage};

pub use network::{ensure_gateway, ensure_subnet, ensure_vcn};
pub use repository::ensure_repository;
pub use route::{RouteBinding, bind_default_route};

/// Outcome of a resolver: the resource already existed or was just created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<T> {
    Found(T),
    Created(T),
}

impl<T> Resolved<T> {
    pub fn created(&self) -> bool {
        matches!(self, Resolved::Created(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Resolved::Found(r) | Resolved::Created(r) => r,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Resolved::Found(r) | Resolved::Created(r) => r,
        }
    }
}

/// Error attribution for a list-then-create resource.
#[derive(Debug, Clone, Copy)]
pub struct ResourceKind {
    pub stage: Stage,
    pub list_action: &'static str,
    pub create_action: &'static str,
}

/// Return the first listed resource matching `matches`, creating one if none does.
///
/// Matching follows the provider's list order. There is no lock between the
/// list and the create call: two concurrent runs can both create.
pub async fn find_or_create<T, L, P, C, F>(
    kind: ResourceKind,
    list: L,
    matches: P,
    create: C,
) -> Result<Resolved<T>>
where
    L: Future<Output = ApiResult<Vec<T>>>,
    P: FnMut(&T) -> bool,
    C: FnOnce() -> F,
    F: Future<Output = ApiResult<T>>,
{
    let existing = list
        .await
        .map_err(|e| BootstrapError::provision(kind.stage, kind.list_action, e))?;
    debug!(stage = %kind.stage, count = existing.len(), "Listed existing resources");

    if let Some(found) = existing.into_iter().find(matches) {
        return Ok(Resolved::Found(found));
    }

    let created = create()
        .await
        .map_err(|e| BootstrapError::provision(kind.stage, kind.create_action, e))?;
    Ok(Resolved::Created(created))
}
