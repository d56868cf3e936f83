//! Client-side discovery calls (C8).
//!
//! Each call performs a full session lifecycle against a pluggable
//! [`Transport`]: connect (anonymous), send one service, disconnect, reset.
//! A connection already open to a *different* endpoint URL on the same
//! client handle fails the call immediately with `BadInvalidArgument`,
//! without attempting to connect — real transport, chunking, and secure
//! channel negotiation are out of scope for this crate.

use crate::error::StatusCode;
use crate::types::{
    FindServersOnNetworkRequest, FindServersOnNetworkResponse, FindServersRequest, FindServersResponse,
    GetEndpointsRequest, GetEndpointsResponse, RegisterServer2Request, RegisterServer2Response,
};
use tokio::sync::Mutex;

/// The session primitives a real OPC-UA binary/secure-channel stack would
/// provide. `connect`/`disconnect` model the anonymous session handshake;
/// the `send_*` methods model one request/response exchange over it.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self, url: &str) -> Result<(), StatusCode>;
    async fn disconnect(&self);
    async fn send_get_endpoints(&self, request: GetEndpointsRequest) -> GetEndpointsResponse;
    async fn send_find_servers(&self, request: FindServersRequest) -> FindServersResponse;
    async fn send_find_servers_on_network(
        &self,
        request: FindServersOnNetworkRequest,
    ) -> FindServersOnNetworkResponse;
    async fn send_register_server2(&self, request: RegisterServer2Request) -> RegisterServer2Response;
}

/// A discovery client handle. Tracks the endpoint URL of any open session so
/// overlapping calls to a different URL are rejected up front.
pub struct DiscoveryClient<T: Transport> {
    transport: T,
    connected_url: Mutex<Option<String>>,
}

impl<T: Transport> DiscoveryClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, connected_url: Mutex::new(None) }
    }

    /// Claim the session for `url`, failing fast if a different URL is
    /// already in flight on this handle.
    async fn begin_session(&self, url: &str) -> Result<(), StatusCode> {
        let mut guard = self.connected_url.lock().await;
        if let Some(existing) = guard.as_deref() {
            if existing != url {
                return Err(StatusCode::BadInvalidArgument);
            }
        }
        *guard = Some(url.to_string());
        drop(guard);
        if let Err(e) = self.transport.connect(url).await {
            *self.connected_url.lock().await = None;
            return Err(e);
        }
        Ok(())
    }

    async fn end_session(&self) {
        self.transport.disconnect().await;
        *self.connected_url.lock().await = None;
    }

    pub async fn get_endpoints(
        &self,
        url: &str,
        request: GetEndpointsRequest,
    ) -> Result<GetEndpointsResponse, StatusCode> {
        self.begin_session(url).await?;
        let response = self.transport.send_get_endpoints(request).await;
        self.end_session().await;
        Ok(response)
    }

    pub async fn find_servers(
        &self,
        url: &str,
        request: FindServersRequest,
    ) -> Result<FindServersResponse, StatusCode> {
        self.begin_session(url).await?;
        let response = self.transport.send_find_servers(request).await;
        self.end_session().await;
        Ok(response)
    }

    pub async fn find_servers_on_network(
        &self,
        url: &str,
        request: FindServersOnNetworkRequest,
    ) -> Result<FindServersOnNetworkResponse, StatusCode> {
        self.begin_session(url).await?;
        let response = self.transport.send_find_servers_on_network(request).await;
        self.end_session().await;
        Ok(response)
    }

    /// The client-side counterpart of C6, used by the scheduler (C7) to
    /// self-register against a remote LDS.
    pub async fn register_discovery(
        &self,
        url: &str,
        request: RegisterServer2Request,
    ) -> Result<RegisterServer2Response, StatusCode> {
        self.begin_session(url).await?;
        let response = self.transport.send_register_server2(request).await;
        self.end_session().await;
        Ok(response)
    }
}
