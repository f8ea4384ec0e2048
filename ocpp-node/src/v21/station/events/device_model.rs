use ocpp_core::v21::messages::{
    get_variables::{GetVariablesRequest, GetVariablesResponse},
    set_variables::{SetVariablesRequest, SetVariablesResponse},
};

use crate::v21::{interfaces::Transport, registry::RequestContext, station::ChargingStation};

impl<T: Transport> ChargingStation<T> {
    pub(crate) async fn get_variables_ocpp(
        &self,
        _ctx: RequestContext,
        req: GetVariablesRequest,
    ) -> GetVariablesResponse {
        GetVariablesResponse {
            get_variable_result: req
                .get_variable_data
                .iter()
                .map(|data| self.store.get_variable(data))
                .collect(),
        }
    }

    pub(crate) async fn set_variables_ocpp(
        &self,
        _ctx: RequestContext,
        req: SetVariablesRequest,
    ) -> SetVariablesResponse {
        let results: Vec<_> = req
            .set_variable_data
            .iter()
            .map(|data| self.store.set_variable(data))
            .collect();
        log::debug!("{} variable(s) written", results.len());
        SetVariablesResponse {
            set_variable_result: results,
        }
    }
}
