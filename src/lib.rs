pub mod api;
pub mod app;
pub mod error;
pub mod logging;
pub mod oplog;
pub mod orchestrator;
pub mod state;
pub mod storage;
pub mod ui;
pub mod utils;

pub use app::{build_app, App, AppConfig};
pub use error::{AppError, ContractError, FheError};
pub use orchestrator::AddressBook;
