//! Route binder - points a subnet's default route at the internet gateway.

use tracing::{info, warn};

use crate::clients::{NetworkApi, RouteRule, UpdateRouteTableDetails};
use crate::error::{BootstrapError, Result, Stage};

/// What the binder did to the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteBinding {
    /// A rule already targets the gateway; nothing was sent.
    AlreadyPresent,
    /// A default rule was appended to the existing rules.
    Appended,
}

/// Ensure `route_table_id` has a rule targeting `gateway_id`.
///
/// The table is append-only here: existing rules are resubmitted unchanged,
/// including a default route to some other target.
pub async fn bind_default_route<A: NetworkApi + ?Sized>(
    api: &A,
    route_table_id: &str,
    gateway_id: &str,
    destination: &str,
) -> Result<RouteBinding> {
    let table = api
        .get_route_table(route_table_id)
        .await
        .map_err(|e| BootstrapError::provision(Stage::Route, "failed to get route table", e))?;

    if table
        .route_rules
        .iter()
        .any(|rule| rule.network_entity_id == gateway_id)
    {
        return Ok(RouteBinding::AlreadyPresent);
    }

    if let Some(conflict) = table
        .route_rules
        .iter()
        .find(|rule| rule.effective_destination() == Some(destination))
    {
        warn!(
            route_table_id,
            target = %conflict.network_entity_id,
            "Route table already has a default route to another target"
        );
    }

    let mut rules = table.route_rules;
    rules.push(RouteRule::cidr(destination, gateway_id));

    api.update_route_table(route_table_id, &UpdateRouteTableDetails { route_rules: rules })
        .await
        .map_err(|e| BootstrapError::provision(Stage::Route, "failed to update route table", e))?;

    info!(route_table_id, gateway_id, destination, "Added default route");
    Ok(RouteBinding::Appended)
}
