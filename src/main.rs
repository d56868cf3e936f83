//! OPC-UA discovery server binary.
//!
//! Wires configuration loading, `tracing-subscriber` initialization, and a
//! `tokio` runtime around the library. Since a real transport is out of
//! scope for this crate, the periodic self-registration scheduler is
//! demonstrated here against an in-process loopback [`client::Transport`]
//! stub rather than a network connection.

use clap::Parser;
use opcua_discovery::client::{DiscoveryClient, Transport};
use opcua_discovery::config::DiscoveryConfig;
use opcua_discovery::scheduler::DiscoveryScheduler;
use opcua_discovery::server::DiscoveryServer;
use opcua_discovery::types::{
    ApplicationDescription, ApplicationType, FindServersOnNetworkRequest, FindServersOnNetworkResponse,
    FindServersRequest, FindServersResponse, GetEndpointsRequest, GetEndpointsResponse, LocalizedText,
    NetworkLayer, RegisterServer2Request, RegisterServer2Response,
};
use opcua_discovery::StatusCode;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// OPC-UA discovery server - FindServers/GetEndpoints/RegisterServer(2) and
/// periodic self-registration against a remote LDS.
#[derive(Parser, Debug)]
#[command(name = "opcua-discovery")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (JSON format).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// This server's own application URI, used when no config file is given.
    #[arg(long, default_value = "urn:opcua-discovery:server")]
    application_uri: String,

    /// Discovery URL this server is reachable at. May be repeated.
    #[arg(long = "discovery-url")]
    discovery_urls: Vec<String>,

    /// Remote LDS URL to periodically self-register with. When absent, the
    /// scheduler is not started.
    #[arg(long)]
    register_with: Option<String>,

    /// Registration interval in seconds.
    #[arg(long, default_value = "600")]
    register_interval_secs: u64,

    /// Delay before the first self-registration attempt, in seconds.
    #[arg(long, default_value = "5")]
    register_delay_secs: u64,

    /// Registry sweep interval in seconds.
    #[arg(long, default_value = "60")]
    sweep_interval_secs: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_target(true).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = if let Some(path) = &args.config {
        info!(?path, "loading config");
        DiscoveryConfig::from_file(path)?
    } else {
        DiscoveryConfig { application_uri: args.application_uri.clone(), ..Default::default() }
    };
    config.validate()?;

    let self_description = ApplicationDescription {
        application_uri: config.application_uri.clone(),
        product_uri: format!("{}:product", config.application_uri),
        application_name: LocalizedText::new("en", &config.application_uri),
        application_type: ApplicationType::Server,
        gateway_server_uri: String::new(),
        discovery_profile_uri: String::new(),
        discovery_urls: vec![],
    };
    let network_layers: Vec<NetworkLayer> = args
        .discovery_urls
        .iter()
        .map(|url| NetworkLayer { discovery_url: url.clone() })
        .collect();

    info!("+----------------------------------------------------+");
    info!("|  opcua-discovery v{}", env!("CARGO_PKG_VERSION"));
    info!("+----------------------------------------------------+");
    info!(application_uri = %config.application_uri, "server identity");
    info!(count = network_layers.len(), "network layers configured");

    let server = Arc::new(DiscoveryServer::new(config.clone(), self_description, network_layers, vec![], None)?);

    let sweep_server = server.clone();
    let sweep_interval = tokio::time::Duration::from_secs(args.sweep_interval_secs);
    let sweep_task = tokio::spawn(async move { sweep_server.run(sweep_interval).await });

    // Holds the scheduler so it isn't dropped (and its retry/normal-tick
    // tasks aborted) before the process receives a shutdown signal.
    let _scheduler = if let Some(url) = args.register_with {
        let client = Arc::new(DiscoveryClient::new(LoopbackTransport::new(server.clone())));
        let scheduler = Arc::new(DiscoveryScheduler::new(SelfRegisterAttempt { client }));
        scheduler
            .add_periodic_server_register_job(
                url,
                tokio::time::Duration::from_secs(args.register_interval_secs),
                tokio::time::Duration::from_secs(args.register_delay_secs),
            )
            .await?;
        Some(scheduler)
    } else {
        None
    };

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    server.shutdown();
    sweep_task.await?;

    Ok(())
}

/// Drives the scheduler's registration ticks through the loopback client.
struct SelfRegisterAttempt {
    client: Arc<DiscoveryClient<LoopbackTransport>>,
}

#[async_trait::async_trait]
impl opcua_discovery::scheduler::RegisterAttempt for SelfRegisterAttempt {
    async fn attempt(&self, url: &str) -> bool {
        let request = RegisterServer2Request {
            server: opcua_discovery::types::RegisteredServerPayload {
                server_uri: String::new(),
                product_uri: String::new(),
                server_names: vec![],
                server_type: ApplicationType::Server,
                gateway_server_uri: String::new(),
                discovery_urls: vec![],
                semaphore_file_path: None,
                is_online: true,
            },
            discovery_configuration: vec![],
        };
        match self.client.register_discovery(url, request).await {
            Ok(response) => response.service_result.is_good(),
            Err(_) => false,
        }
    }
}

/// Loopback `Transport`: calls back into the local [`DiscoveryServer`]
/// instead of going over the network. Stands in for a real transport stack,
/// which is out of scope for this crate.
struct LoopbackTransport {
    server: Arc<DiscoveryServer>,
}

impl LoopbackTransport {
    fn new(server: Arc<DiscoveryServer>) -> Self {
        Self { server }
    }
}

#[async_trait::async_trait]
impl Transport for LoopbackTransport {
    async fn connect(&self, _url: &str) -> Result<(), StatusCode> {
        Ok(())
    }

    async fn disconnect(&self) {}

    async fn send_get_endpoints(&self, request: GetEndpointsRequest) -> GetEndpointsResponse {
        self.server.get_endpoints(request).await
    }

    async fn send_find_servers(&self, request: FindServersRequest) -> FindServersResponse {
        self.server.find_servers(request).await
    }

    async fn send_find_servers_on_network(
        &self,
        _request: FindServersOnNetworkRequest,
    ) -> FindServersOnNetworkResponse {
        FindServersOnNetworkResponse::default()
    }

    async fn send_register_server2(&self, request: RegisterServer2Request) -> RegisterServer2Response {
        self.server.register_server2(request).await
    }
}
