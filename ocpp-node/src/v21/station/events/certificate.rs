use ocpp_core::v21::{
    messages::{
        delete_certificate::{DeleteCertificateRequest, DeleteCertificateResponse},
        get_installed_certificate_ids::{
            GetInstalledCertificateIdsRequest, GetInstalledCertificateIdsResponse,
        },
        install_certificate::{InstallCertificateRequest, InstallCertificateResponse},
    },
    types::{GetInstalledCertificateStatus, InstallCertificateStatus, StatusInfo},
};

use crate::v21::{interfaces::Transport, registry::RequestContext, station::ChargingStation};

impl<T: Transport> ChargingStation<T> {
    pub(crate) async fn install_certificate_ocpp(
        &self,
        ctx: RequestContext,
        req: InstallCertificateRequest,
    ) -> InstallCertificateResponse {
        let status = self
            .store
            .install_certificate(req.certificate_type, &req.certificate, ctx.received_at);
        InstallCertificateResponse {
            status,
            status_info: match status {
                InstallCertificateStatus::Accepted => None,
                InstallCertificateStatus::Rejected | InstallCertificateStatus::Failed => {
                    Some(StatusInfo::new("InvalidCertificate"))
                }
            },
        }
    }

    pub(crate) async fn delete_certificate_ocpp(
        &self,
        _ctx: RequestContext,
        req: DeleteCertificateRequest,
    ) -> DeleteCertificateResponse {
        let status = self.store.delete_certificate(&req.certificate_hash_data);
        log::info!(
            "delete certificate {} -> {:?}",
            req.certificate_hash_data.serial_number,
            status
        );
        DeleteCertificateResponse {
            status,
            status_info: None,
        }
    }

    pub(crate) async fn get_installed_certificate_ids_ocpp(
        &self,
        _ctx: RequestContext,
        req: GetInstalledCertificateIdsRequest,
    ) -> GetInstalledCertificateIdsResponse {
        let chains = self
            .store
            .installed_certificates(req.certificate_type.as_deref());
        if chains.is_empty() {
            return GetInstalledCertificateIdsResponse {
                status: GetInstalledCertificateStatus::NotFound,
                status_info: None,
                certificate_hash_data_chain: None,
            };
        }
        GetInstalledCertificateIdsResponse {
            status: GetInstalledCertificateStatus::Accepted,
            status_info: None,
            certificate_hash_data_chain: Some(chains),
        }
    }
}
