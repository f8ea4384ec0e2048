mod authorization;
mod availability;
mod boot;
mod certificate;
mod component_variable;
mod data_transfer_status;
mod evse;
mod id_token;
mod message_info;
mod reservation_status;
mod reset;
mod status_info;
mod transaction;
mod unlock_status;
mod variable_status;

pub use authorization::*;
pub use availability::*;
pub use boot::*;
pub use certificate::*;
pub use component_variable::*;
pub use data_transfer_status::*;
pub use evse::*;
pub use id_token::*;
pub use message_info::*;
pub use reservation_status::*;
pub use reset::*;
pub use status_info::*;
pub use transaction::*;
pub use unlock_status::*;
pub use variable_status::*;
