//! `GetEndpoints` service (C5).

use crate::types::{EndpointDescription, GetEndpointsRequest, GetEndpointsResponse, NetworkLayer};

/// Contract (§4.4 / testable property 3 — fan-out size formula):
///
/// 1. Filter `endpoint_templates` by `request.profile_uris` when non-empty.
/// 2. If `request.endpoint_url` is non-empty, clone each surviving template
///    once with `endpoint_url` set to the request's URL (mirrored back, not
///    resolved against any network layer).
/// 3. Otherwise, fan out: for each network layer, clone every surviving
///    template with that layer's `discovery_url`, overwriting whatever URL
///    the template carried. Network layers form the outer loop, so output is
///    grouped by layer (`[E_a@u1, E_b@u1, E_a@u2, E_b@u2]`), not by template.
///
/// So the output size is `surviving.len() * (request.endpoint_url.is_empty()
/// ? network_layers.len() : 1)`.
pub fn get_endpoints(
    request: &GetEndpointsRequest,
    endpoint_templates: &[EndpointDescription],
    network_layers: &[NetworkLayer],
) -> GetEndpointsResponse {
    let surviving: Vec<&EndpointDescription> = if request.profile_uris.is_empty() {
        endpoint_templates.iter().collect()
    } else {
        endpoint_templates
            .iter()
            .filter(|t| request.profile_uris.iter().any(|p| p == &t.transport_profile_uri))
            .collect()
    };

    let mut endpoints = Vec::new();
    if !request.endpoint_url.is_empty() {
        for template in &surviving {
            let mut endpoint = (*template).clone();
            endpoint.endpoint_url = request.endpoint_url.clone();
            endpoints.push(endpoint);
        }
    } else {
        for layer in network_layers {
            for template in &surviving {
                let mut endpoint = (*template).clone();
                endpoint.endpoint_url = layer.discovery_url.clone();
                endpoints.push(endpoint);
            }
        }
    }

    GetEndpointsResponse { endpoints }
}
