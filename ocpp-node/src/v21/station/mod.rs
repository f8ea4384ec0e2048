mod events;
mod lifecycle;
mod requests;

use std::sync::Arc;

use ocpp_core::v21::messages::{
    cancel_reservation::CancelReservationRequest, change_availability::ChangeAvailabilityRequest,
    clear_display_message::ClearDisplayMessageRequest, cost_updated::CostUpdatedRequest,
    data_transfer::DataTransferRequest, delete_certificate::DeleteCertificateRequest,
    get_display_messages::GetDisplayMessagesRequest,
    get_installed_certificate_ids::GetInstalledCertificateIdsRequest,
    get_variables::GetVariablesRequest, install_certificate::InstallCertificateRequest,
    request_start_transaction::RequestStartTransactionRequest,
    request_stop_transaction::RequestStopTransactionRequest, reserve_now::ReserveNowRequest,
    reset::ResetRequest, set_display_message::SetDisplayMessageRequest,
    set_variables::SetVariablesRequest, unlock_connector::UnlockConnectorRequest,
};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::v21::{
    interfaces::Transport,
    node::{NetworkingNode, NodeConfig, RequestOptions, RequestSender},
    registry::HandlerRegistry,
    store::EntityStore,
    tasks::TaskSupervisor,
};

/// Charging-station behaviour on top of a node: answers the CSMS from the
/// entity store and reports back through the node's sender.
pub struct ChargingStation<T: Transport> {
    pub(crate) sender: RequestSender<T>,
    pub(crate) store: Arc<EntityStore>,
    pub(crate) config: Arc<NodeConfig>,
    pub(crate) tasks: TaskSupervisor,
    pub(crate) shutdown: CancellationToken,
    pub(crate) heartbeat: Arc<Mutex<Option<CancellationToken>>>,
}

impl<T: Transport> Clone for ChargingStation<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            store: self.store.clone(),
            config: self.config.clone(),
            tasks: self.tasks.clone(),
            shutdown: self.shutdown.clone(),
            heartbeat: self.heartbeat.clone(),
        }
    }
}

macro_rules! register_ocpp {
    ($station:expr, $registry:expr, { $($request:ty => $method:ident),+ $(,)? }) => {
        $(
            let station = $station.clone();
            $registry.register::<$request, _, _>(move |ctx, req| {
                let station = station.clone();
                async move { station.$method(ctx, req).await }
            });
        )+
    };
}

impl<T: Transport> ChargingStation<T> {
    pub fn new(node: &NetworkingNode<T>) -> Self {
        let config = node.config().clone();
        let store = EntityStore::new(config.number_of_evses, config.variables.clone());
        Self {
            sender: node.sender().clone(),
            store: Arc::new(store),
            config: Arc::new(config),
            tasks: node.tasks().clone(),
            shutdown: node.shutdown_token().clone(),
            heartbeat: Arc::new(Mutex::new(None)),
        }
    }

    /// Builds the station, registers its handlers on the node and starts
    /// releasing expired reservations.
    pub fn attach(node: &NetworkingNode<T>) -> Self {
        let station = Self::new(node);
        station.register_handlers(node.registry());
        station.spawn_reservation_sweeper();
        station
    }

    pub fn store(&self) -> &Arc<EntityStore> {
        &self.store
    }

    pub fn sender(&self) -> &RequestSender<T> {
        &self.sender
    }

    pub fn register_handlers(&self, registry: &HandlerRegistry) {
        register_ocpp!(self, registry, {
            ReserveNowRequest => reserve_now_ocpp,
            CancelReservationRequest => cancel_reservation_ocpp,
            RequestStartTransactionRequest => request_start_transaction_ocpp,
            RequestStopTransactionRequest => request_stop_transaction_ocpp,
            CostUpdatedRequest => cost_updated_ocpp,
            SetDisplayMessageRequest => set_display_message_ocpp,
            GetDisplayMessagesRequest => get_display_messages_ocpp,
            ClearDisplayMessageRequest => clear_display_message_ocpp,
            DataTransferRequest => data_transfer_ocpp,
            GetVariablesRequest => get_variables_ocpp,
            SetVariablesRequest => set_variables_ocpp,
            InstallCertificateRequest => install_certificate_ocpp,
            DeleteCertificateRequest => delete_certificate_ocpp,
            GetInstalledCertificateIdsRequest => get_installed_certificate_ids_ocpp,
            ResetRequest => reset_ocpp,
            UnlockConnectorRequest => unlock_connector_ocpp,
            ChangeAvailabilityRequest => change_availability_ocpp,
        });
        log::debug!("registered {} station handlers", registry.registered_actions().len());
    }

    /// Options for requests sent from background tasks: they give up when
    /// the node shuts down.
    pub(crate) fn background_options(&self) -> RequestOptions {
        RequestOptions::default().with_cancel(self.shutdown.clone())
    }
}
