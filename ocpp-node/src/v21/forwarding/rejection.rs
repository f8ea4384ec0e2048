use ocpp_core::v21::{
    messages::{
        cancel_reservation::CancelReservationResponse,
        change_availability::ChangeAvailabilityResponse,
        clear_display_message::ClearDisplayMessageResponse, data_transfer::DataTransferResponse,
        delete_certificate::DeleteCertificateResponse,
        get_display_messages::GetDisplayMessagesResponse,
        get_installed_certificate_ids::GetInstalledCertificateIdsResponse,
        install_certificate::InstallCertificateResponse,
        request_start_transaction::RequestStartTransactionResponse,
        request_stop_transaction::RequestStopTransactionResponse, reserve_now::ReserveNowResponse,
        reset::ResetResponse, set_display_message::SetDisplayMessageResponse,
        unlock_connector::UnlockConnectorResponse,
    },
    types::{
        CancelReservationStatus, ChangeAvailabilityStatus, ClearMessageStatus,
        DataTransferStatus, DeleteCertificateStatus, DisplayMessageStatus,
        GetDisplayMessagesStatus, GetInstalledCertificateStatus, InstallCertificateStatus,
        RequestStartStopStatus, ReserveNowStatus, ResetStatus, StatusInfo, UnlockStatus,
    },
};

/// Responses that can express "no" through their status field. Only calls
/// answered by such a response can be rejected by a forwarding filter.
pub trait Rejectable {
    fn rejected(info: StatusInfo) -> Self;
}

macro_rules! rejectable {
    ($response:ty, $status:expr) => {
        impl Rejectable for $response {
            fn rejected(info: StatusInfo) -> Self {
                Self {
                    status: $status,
                    status_info: Some(info),
                }
            }
        }
    };
}

rejectable!(ReserveNowResponse, ReserveNowStatus::Rejected);
rejectable!(CancelReservationResponse, CancelReservationStatus::Rejected);
rejectable!(ChangeAvailabilityResponse, ChangeAvailabilityStatus::Rejected);
rejectable!(ClearDisplayMessageResponse, ClearMessageStatus::Rejected);
rejectable!(DeleteCertificateResponse, DeleteCertificateStatus::Failed);
rejectable!(GetDisplayMessagesResponse, GetDisplayMessagesStatus::Unknown);
rejectable!(InstallCertificateResponse, InstallCertificateStatus::Rejected);
rejectable!(RequestStopTransactionResponse, RequestStartStopStatus::Rejected);
rejectable!(ResetResponse, ResetStatus::Rejected);
rejectable!(SetDisplayMessageResponse, DisplayMessageStatus::Rejected);
rejectable!(UnlockConnectorResponse, UnlockStatus::UnlockFailed);

impl Rejectable for DataTransferResponse {
    fn rejected(info: StatusInfo) -> Self {
        Self {
            status: DataTransferStatus::Rejected,
            status_info: Some(info),
            data: None,
        }
    }
}

impl Rejectable for RequestStartTransactionResponse {
    fn rejected(info: StatusInfo) -> Self {
        Self {
            status: RequestStartStopStatus::Rejected,
            status_info: Some(info),
            transaction_id: None,
        }
    }
}

impl Rejectable for GetInstalledCertificateIdsResponse {
    fn rejected(info: StatusInfo) -> Self {
        Self {
            status: GetInstalledCertificateStatus::NotFound,
            status_info: Some(info),
            certificate_hash_data_chain: None,
        }
    }
}
