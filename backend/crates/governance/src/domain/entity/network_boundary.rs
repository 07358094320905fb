//! Network Boundary Entity
//!
//! A network scope (VPC equivalent) plus the security group guarding it.
//! Cross-boundary traffic is allowed only when both sides agree: the
//! receiving boundary has an ingress rule from the sender and the sender has
//! an egress rule to the receiver, on the same port.

use kernel::id::BoundaryId;
use serde::Serialize;

use crate::domain::value_object::{AccountId, Port};
use crate::error::GovernanceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleDirection {
    Ingress,
    Egress,
}

/// One security rule, always scoped to a peer boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityRule {
    pub direction: RuleDirection,
    pub peer: BoundaryId,
    pub peer_security_group: String,
    pub port: Port,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkBoundary {
    pub boundary_id: BoundaryId,
    /// Network scope shared by peered boundaries
    pub network_id: String,
    pub security_group_id: String,
    pub owner: AccountId,
    rules: Vec<SecurityRule>,
}

impl NetworkBoundary {
    pub fn new(
        network_id: impl Into<String>,
        security_group_id: impl Into<String>,
        owner: AccountId,
    ) -> Self {
        Self {
            boundary_id: BoundaryId::new(),
            network_id: network_id.into(),
            security_group_id: security_group_id.into(),
            owner,
            rules: Vec::new(),
        }
    }

    /// New boundary inside the same network scope as `shared`
    pub fn peered_with(
        shared: &NetworkBoundary,
        security_group_id: impl Into<String>,
        owner: AccountId,
    ) -> Self {
        Self::new(shared.network_id.clone(), security_group_id, owner)
    }

    pub fn rules(&self) -> &[SecurityRule] {
        &self.rules
    }

    /// Permit `peer -> self` on `port`
    ///
    /// Returns `Ok(false)` when the rule already existed.
    pub fn open_ingress(&mut self, peer: &NetworkBoundary, port: u32) -> GovernanceResult<bool> {
        self.add_rule(RuleDirection::Ingress, peer, port)
    }

    /// Permit `self -> peer` on `port`
    ///
    /// Returns `Ok(false)` when the rule already existed.
    pub fn open_egress(&mut self, peer: &NetworkBoundary, port: u32) -> GovernanceResult<bool> {
        self.add_rule(RuleDirection::Egress, peer, port)
    }

    pub fn allows(&self, direction: RuleDirection, peer: &BoundaryId, port: Port) -> bool {
        self.rules
            .iter()
            .any(|r| r.direction == direction && &r.peer == peer && r.port == port)
    }

    fn add_rule(
        &mut self,
        direction: RuleDirection,
        peer: &NetworkBoundary,
        port: u32,
    ) -> GovernanceResult<bool> {
        let port = Port::new(port)?;
        if self.allows(direction, &peer.boundary_id, port) {
            return Ok(false);
        }
        self.rules.push(SecurityRule {
            direction,
            peer: peer.boundary_id,
            peer_security_group: peer.security_group_id.clone(),
            port,
        });
        Ok(true)
    }
}

/// Two-sided rule check for traffic `client -> server` on `port`
pub fn permits_flow(server: &NetworkBoundary, client: &NetworkBoundary, port: Port) -> bool {
    server.allows(RuleDirection::Ingress, &client.boundary_id, port)
        && client.allows(RuleDirection::Egress, &server.boundary_id, port)
}
