use ocpp_core::v21::{
    messages::{
        clear_display_message::{ClearDisplayMessageRequest, ClearDisplayMessageResponse},
        get_display_messages::{GetDisplayMessagesRequest, GetDisplayMessagesResponse},
        set_display_message::{SetDisplayMessageRequest, SetDisplayMessageResponse},
    },
    types::{DisplayMessageStatus, GetDisplayMessagesStatus, StatusInfo},
};

use crate::v21::{interfaces::Transport, registry::RequestContext, station::ChargingStation};

impl<T: Transport> ChargingStation<T> {
    pub(crate) async fn set_display_message_ocpp(
        &self,
        _ctx: RequestContext,
        req: SetDisplayMessageRequest,
    ) -> SetDisplayMessageResponse {
        let id = req.message.id;
        let status = self.store.set_display_message(req.message);
        let status_info = match status {
            DisplayMessageStatus::UnknownTransaction => Some(StatusInfo::new("TxNotFound")),
            _ => None,
        };
        log::debug!("display message {} -> {:?}", id, status);
        SetDisplayMessageResponse {
            status,
            status_info,
        }
    }

    /// Matching messages are reported afterwards through NotifyDisplayMessages.
    pub(crate) async fn get_display_messages_ocpp(
        &self,
        ctx: RequestContext,
        req: GetDisplayMessagesRequest,
    ) -> GetDisplayMessagesResponse {
        let messages =
            self.store
                .query_display_messages(req.id.as_deref(), req.priority, req.state);
        if messages.is_empty() {
            return GetDisplayMessagesResponse {
                status: GetDisplayMessagesStatus::Unknown,
                status_info: None,
            };
        }
        let station = self.clone();
        let request_id = req.request_id;
        ctx.tasks.spawn("NotifyDisplayMessages", async move {
            station.notify_display_messages(request_id, messages).await
        });
        GetDisplayMessagesResponse {
            status: GetDisplayMessagesStatus::Accepted,
            status_info: None,
        }
    }

    pub(crate) async fn clear_display_message_ocpp(
        &self,
        _ctx: RequestContext,
        req: ClearDisplayMessageRequest,
    ) -> ClearDisplayMessageResponse {
        ClearDisplayMessageResponse {
            status: self.store.clear_display_message(req.id),
            status_info: None,
        }
    }
}
