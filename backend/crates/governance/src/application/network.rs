//! Network Wiring
//!
//! Opens client -> broker traffic on both sides of the boundary pair.

use crate::domain::entity::network_boundary::{NetworkBoundary, RuleDirection};
use crate::domain::gateway::NetworkService;
use crate::domain::value_object::Port;
use crate::error::GovernanceResult;

/// Add the ingress rule on `broker` and the egress rule on `client`
///
/// Both rules are validated on the descriptors before the network service
/// is called; rules that already exist are not sent again.
pub async fn wire_client_to_broker<N>(
    network: &N,
    broker: &mut NetworkBoundary,
    client: &mut NetworkBoundary,
    port: u32,
) -> GovernanceResult<Port>
where
    N: NetworkService,
{
    let new_ingress = broker.open_ingress(client, port)?;
    let new_egress = client.open_egress(broker, port)?;
    let port = Port::new(port)?;

    if new_ingress {
        network
            .add_ingress_rule(&broker.security_group_id, &client.security_group_id, port)
            .await?;
        log_rule(RuleDirection::Ingress, broker, client, port);
    }
    if new_egress {
        network
            .add_egress_rule(&client.security_group_id, &broker.security_group_id, port)
            .await?;
        log_rule(RuleDirection::Egress, client, broker, port);
    }

    Ok(port)
}

fn log_rule(direction: RuleDirection, on: &NetworkBoundary, peer: &NetworkBoundary, port: Port) {
    tracing::info!(
        direction = ?direction,
        security_group = %on.security_group_id,
        peer = %peer.security_group_id,
        port = %port,
        "Security rule opened"
    );
}
