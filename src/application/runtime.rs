//! RealtimeRuntime - wiring for an embedded realtime layer.
//!
//! Builds the gateway, starts the dispatcher, and hands out the pieces the
//! host application needs: the axum router for client connections and
//! auto-emitting stores for business code.
//!
//! # Example
//!
//! ```ignore
//! let runtime = RealtimeRuntime::builder(validator, access)
//!     .with_signer(signer)
//!     .start();
//!
//! let tasks = runtime.auto_emit_store(record_store, tenant_id);
//! axum::serve(listener, runtime.router()).await?;
//! runtime.shutdown().await;
//! ```

use std::sync::Arc;

use crate::adapters::events::EmitDispatcher;
use crate::adapters::websocket::{
    websocket_router, RoomManager, WebSocketState, DEFAULT_OUTBOUND_CAPACITY,
};
use crate::domain::foundation::TenantId;
use crate::ports::{DownloadUrlSigner, ProjectAccessChecker, RecordStore, SessionValidator};

use super::interceptor::MutationInterceptor;
use super::scoped_store::{AutoEmitStore, ScopedStore};

/// Builder for [`RealtimeRuntime`].
pub struct RealtimeRuntimeBuilder {
    validator: Arc<dyn SessionValidator>,
    access: Arc<dyn ProjectAccessChecker>,
    signer: Option<Arc<dyn DownloadUrlSigner>>,
    outbound_capacity: usize,
}

impl RealtimeRuntimeBuilder {
    /// Presign download URLs in file event payloads.
    pub fn with_signer(mut self, signer: Arc<dyn DownloadUrlSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Per-connection outbound buffer size.
    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity;
        self
    }

    /// Build the gateway and start the dispatcher worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> RealtimeRuntime {
        let rooms = Arc::new(RoomManager::new(self.access, self.outbound_capacity));
        let dispatcher = Arc::new(EmitDispatcher::start(rooms.clone()));
        let interceptor = match self.signer {
            Some(signer) => MutationInterceptor::with_signer(signer),
            None => MutationInterceptor::new(),
        };

        tracing::info!(
            outbound_capacity = self.outbound_capacity,
            "Realtime runtime started"
        );

        RealtimeRuntime {
            rooms,
            dispatcher,
            interceptor,
            validator: self.validator,
        }
    }
}

/// A running realtime layer.
pub struct RealtimeRuntime {
    rooms: Arc<RoomManager>,
    dispatcher: Arc<EmitDispatcher>,
    interceptor: MutationInterceptor,
    validator: Arc<dyn SessionValidator>,
}

impl RealtimeRuntime {
    pub fn builder(
        validator: Arc<dyn SessionValidator>,
        access: Arc<dyn ProjectAccessChecker>,
    ) -> RealtimeRuntimeBuilder {
        RealtimeRuntimeBuilder {
            validator,
            access,
            signer: None,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }

    pub fn room_manager(&self) -> Arc<RoomManager> {
        self.rooms.clone()
    }

    pub fn dispatcher(&self) -> Arc<EmitDispatcher> {
        self.dispatcher.clone()
    }

    pub fn interceptor(&self) -> &MutationInterceptor {
        &self.interceptor
    }

    /// Router serving `GET /realtime` and `GET /health`.
    pub fn router(&self) -> axum::Router {
        websocket_router().with_state(WebSocketState::new(
            self.rooms.clone(),
            self.validator.clone(),
        ))
    }

    /// Store whose writes compute their effect without dispatching it.
    pub fn scoped_store(&self, store: Arc<dyn RecordStore>, tenant_id: TenantId) -> ScopedStore {
        ScopedStore::new(store, tenant_id, self.interceptor.clone())
    }

    /// Store whose writes are broadcast automatically.
    pub fn auto_emit_store(
        &self,
        store: Arc<dyn RecordStore>,
        tenant_id: TenantId,
    ) -> AutoEmitStore {
        AutoEmitStore::new(
            self.scoped_store(store, tenant_id),
            Some(self.dispatcher.clone()),
        )
    }

    /// Deliver everything already dispatched, then stop accepting effects.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
        tracing::info!(
            connections = self.rooms.connection_count(),
            "Realtime runtime stopped"
        );
    }
}
