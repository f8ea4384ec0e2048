mod availability;
mod certificate;
mod data_transfer;
mod device_model;
mod display_message;
mod reservation;
mod transaction;
