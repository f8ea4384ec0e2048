/// A request payload together with the action name it travels under and the
/// payload type the peer answers with.
pub trait OcppRequest: serde::Serialize + serde::de::DeserializeOwned + Send + 'static {
    const ACTION: &'static str;
    type Response: serde::Serialize + serde::de::DeserializeOwned + Send + 'static;
}

macro_rules! ocpp_action {
    ($request:ty => $response:ty, $action:literal) => {
        impl $crate::v21::messages::OcppRequest for $request {
            const ACTION: &'static str = $action;
            type Response = $response;
        }
    };
}

pub mod authorize;
pub mod boot_notification;
pub mod cancel_reservation;
pub mod change_availability;
pub mod clear_display_message;
pub mod cost_updated;
pub mod data_transfer;
pub mod delete_certificate;
pub mod get_display_messages;
pub mod get_installed_certificate_ids;
pub mod get_variables;
pub mod heartbeat;
pub mod install_certificate;
pub mod notify_display_messages;
pub mod request_start_transaction;
pub mod request_stop_transaction;
pub mod reserve_now;
pub mod reset;
pub mod security_event_notification;
pub mod set_display_message;
pub mod set_variables;
pub mod status_notification;
pub mod transaction_event;
pub mod unlock_connector;
