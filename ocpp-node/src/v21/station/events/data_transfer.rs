use ocpp_core::v21::{
    messages::data_transfer::{DataTransferRequest, DataTransferResponse},
    types::DataTransferStatus,
};

use crate::v21::{interfaces::Transport, registry::RequestContext, station::ChargingStation};

impl<T: Transport> ChargingStation<T> {
    pub(crate) async fn data_transfer_ocpp(
        &self,
        _ctx: RequestContext,
        req: DataTransferRequest,
    ) -> DataTransferResponse {
        if !self.config.accepts_vendor(&req.vendor_id) {
            log::debug!("data transfer from unknown vendor {}", req.vendor_id);
            return DataTransferResponse {
                status: DataTransferStatus::UnknownVendorId,
                status_info: None,
                data: None,
            };
        }
        DataTransferResponse {
            status: DataTransferStatus::Accepted,
            status_info: None,
            data: req.data,
        }
    }
}
