//! `RegisterServer` / `RegisterServer2` services (C6).

use crate::config::Capabilities;
use crate::error::StatusCode;
use crate::registry::Registry;
use crate::types::{
    ApplicationType, DiscoveryConfigurationItem, RegisterServer2Request, RegisterServer2Response,
    RegisterServerRequest, RegisterServerResponse, RegisteredServer, RegisteredServerPayload,
};
use tokio::time::Instant;

/// Hook fired once per discovery URL when a registering server is itself a
/// `DiscoveryServer` and `capabilities.multicast` is set. A real resolver
/// creates the mDNS TXT record on an online transition and removes it on an
/// offline one; which URL index does the create/remove is a real-mDNS
/// interface-selection detail this crate leaves to the implementer, passing
/// every URL through with `is_online` for it to act on.
pub trait MdnsUpdater: Send + Sync {
    fn update(
        &self,
        server_uri: &str,
        mdns_server_name: &str,
        discovery_url: &str,
        is_online: bool,
        capabilities: &[String],
    );
}

/// Fired after a successful register or unregister, with the affected
/// record and whether it was brought online (`true`) or taken offline
/// (`false`).
pub type RegisterCallback<'a> = &'a (dyn Fn(&RegisteredServer, bool) + Send + Sync);

/// Step 2 (RegisterServer2 only): adopt the first `MdnsConfig` item found and
/// classify the rest. Returns the adopted config (if any) and one status per
/// input item, in input order.
fn process_discovery_configuration(
    items: &[DiscoveryConfigurationItem],
) -> (Option<&DiscoveryConfigurationItem>, Vec<StatusCode>) {
    let mut adopted = None;
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        match item {
            DiscoveryConfigurationItem::MdnsConfig(_) => {
                if adopted.is_none() {
                    adopted = Some(item);
                }
                results.push(StatusCode::Good);
            }
            DiscoveryConfigurationItem::Unsupported => {
                results.push(StatusCode::BadNotSupported);
            }
        }
    }
    (adopted, results)
}

/// Step 3: the adopted mDNS config's name takes priority over the request's
/// own `server_names[0]`. `None` means the server is unnamed entirely.
fn mdns_server_name(
    adopted: Option<&DiscoveryConfigurationItem>,
    payload: &RegisteredServerPayload,
) -> Option<String> {
    if let Some(DiscoveryConfigurationItem::MdnsConfig(cfg)) = adopted {
        return Some(cfg.mdns_server_name.clone());
    }
    payload.server_names.first().map(|n| n.text.clone())
}

/// Steps 3-7, shared by `register_server` and `register_server2`.
fn register_common(
    payload: RegisteredServerPayload,
    adopted: Option<&DiscoveryConfigurationItem>,
    registry: &mut Registry,
    capabilities: &Capabilities,
    now: Instant,
    mdns_updater: Option<&dyn MdnsUpdater>,
    on_register: Option<RegisterCallback<'_>>,
) -> StatusCode {
    let mdns_name = match mdns_server_name(adopted, &payload) {
        Some(name) => name,
        None => return StatusCode::BadServerNameMissing,
    };

    if payload.discovery_urls.is_empty() {
        return StatusCode::BadDiscoveryUrlMissing;
    }

    if capabilities.semaphore {
        if let Some(path) = &payload.semaphore_file_path {
            if !path.is_empty() && !std::path::Path::new(path).exists() {
                return StatusCode::BadSempahoreFileMissing;
            }
        }
    }

    let mdns_capabilities: Vec<String> = match adopted {
        Some(DiscoveryConfigurationItem::MdnsConfig(cfg)) => cfg.server_capabilities.clone(),
        _ => Vec::new(),
    };
    if capabilities.multicast && payload.server_type == ApplicationType::DiscoveryServer {
        if let Some(updater) = mdns_updater {
            for url in &payload.discovery_urls {
                updater.update(&payload.server_uri, &mdns_name, url, payload.is_online, &mdns_capabilities);
            }
        }
    }

    let record = RegisteredServer {
        server_uri: payload.server_uri,
        product_uri: payload.product_uri,
        server_names: payload.server_names,
        server_type: payload.server_type,
        gateway_server_uri: payload.gateway_server_uri,
        discovery_urls: payload.discovery_urls,
        semaphore_file_path: payload.semaphore_file_path,
        is_online: payload.is_online,
        last_seen: now,
    };

    if !record.is_online {
        return match registry.remove(&record.server_uri) {
            Some(_) => {
                if let Some(cb) = on_register {
                    cb(&record, false);
                }
                StatusCode::Good
            }
            None => StatusCode::BadNotFound,
        };
    }

    registry.insert_or_replace(record.clone());
    if let Some(cb) = on_register {
        cb(&record, true);
    }
    StatusCode::Good
}

pub fn register_server(
    request: RegisterServerRequest,
    registry: &mut Registry,
    capabilities: &Capabilities,
    now: Instant,
    on_register: Option<RegisterCallback<'_>>,
) -> RegisterServerResponse {
    let service_result =
        register_common(request.server, None, registry, capabilities, now, None, on_register);
    RegisterServerResponse { service_result }
}

pub fn register_server2(
    request: RegisterServer2Request,
    registry: &mut Registry,
    capabilities: &Capabilities,
    now: Instant,
    mdns_updater: Option<&dyn MdnsUpdater>,
    on_register: Option<RegisterCallback<'_>>,
) -> RegisterServer2Response {
    let (adopted, configuration_results) = process_discovery_configuration(&request.discovery_configuration);
    let service_result = register_common(
        request.server,
        adopted,
        registry,
        capabilities,
        now,
        mdns_updater,
        on_register,
    );
    RegisterServer2Response { service_result, configuration_results }
}
