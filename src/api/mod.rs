pub mod client;
pub mod contract;
pub mod fhe;
pub mod models;
pub mod relayer;
pub mod session;
