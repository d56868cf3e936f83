//! Builds `ApplicationDescription` values for `FindServers` responses.

use crate::types::{
    ApplicationDescription, ApplicationType, FindServersRequest, LocalizedText, NetworkLayer,
    RegisteredServer,
};

/// Compose the self-description: a deep copy of `self_description` with
/// `DiscoveryServer` coerced to `Server` (UaExpert and similar clients don't
/// enumerate discovery servers) and the network layers' discovery URLs
/// appended. Not deduplicated against the configured URLs — matches the
/// source, which leaves this a TODO.
pub fn compose_self(
    self_description: &ApplicationDescription,
    network_layers: &[NetworkLayer],
) -> ApplicationDescription {
    let mut target = self_description.clone();
    if target.application_type == ApplicationType::DiscoveryServer {
        target.application_type = ApplicationType::Server;
    }
    target
        .discovery_urls
        .extend(network_layers.iter().map(|nl| nl.discovery_url.clone()));
    target
}

/// Compose a peer's `ApplicationDescription` from its registry record,
/// selecting `application_name` per the requested locales.
pub fn compose_peer(
    request: &FindServersRequest,
    registered: &RegisteredServer,
) -> ApplicationDescription {
    let application_name = select_application_name(&request.locale_ids, &registered.server_names);

    ApplicationDescription {
        application_uri: registered.server_uri.clone(),
        product_uri: registered.product_uri.clone(),
        application_name,
        application_type: registered.server_type,
        gateway_server_uri: registered.gateway_server_uri.clone(),
        discovery_profile_uri: String::new(),
        discovery_urls: registered.discovery_urls.clone(),
    }
}

/// Locale selection (§4.2.2 / testable property 2):
/// 1. Scan `locale_ids` in order; for each, scan `server_names` in order;
///    use the first match and stop.
/// 2. If no match but `server_names` is non-empty, use `server_names[0]`.
/// 3. If `server_names` is empty, return an empty `LocalizedText`.
fn select_application_name(locale_ids: &[String], server_names: &[LocalizedText]) -> LocalizedText {
    if !locale_ids.is_empty() {
        for locale in locale_ids {
            if let Some(found) = server_names.iter().find(|name| &name.locale == locale) {
                return found.clone();
            }
        }
        if let Some(first) = server_names.first() {
            return first.clone();
        }
        return LocalizedText::default();
    }

    server_names.first().cloned().unwrap_or_default()
}
