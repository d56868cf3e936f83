//! `FindServers` service (C4).

use crate::composer::{compose_peer, compose_self};
use crate::registry::Registry;
use crate::types::{ApplicationDescription, FindServersRequest, FindServersResponse, NetworkLayer};

/// Contract: given `(server_uris, locale_ids)`, produce an ordered `servers`
/// list. Output order is self first (when included), then matched peers.
/// When filtering, peers appear in *request* order; when unfiltered, they
/// appear in registry insertion order.
pub fn find_servers(
    request: &FindServersRequest,
    application_uri: &str,
    self_description: &ApplicationDescription,
    network_layers: &[NetworkLayer],
    registry: &Registry,
) -> FindServersResponse {
    let mut servers = Vec::new();

    if request.server_uris.is_empty() {
        servers.push(compose_self(self_description, network_layers));
        for registered in registry.iter() {
            servers.push(compose_peer(request, registered));
        }
        return FindServersResponse { servers };
    }

    let mut include_self = false;
    let mut matched_peers = Vec::new();
    for uri in &request.server_uris {
        if uri == application_uri {
            include_self = true;
        } else if let Some(registered) = registry.lookup(uri) {
            matched_peers.push(registered);
        }
    }

    if include_self {
        servers.push(compose_self(self_description, network_layers));
    }
    servers.extend(matched_peers.into_iter().map(|r| compose_peer(request, r)));

    FindServersResponse { servers }
}
