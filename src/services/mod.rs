// Core services
pub mod transfers;

pub use transfers::TransferService;
