use fhe_address_book::ui::{console, setup};
use fhe_address_book::utils::RUNTIME;
use fhe_address_book::{build_app, AppConfig};
use tokio::io::{AsyncBufReadExt, BufReader};

fn main() {
    let config = AppConfig::load();
    if let Err(e) = fhe_address_book::logging::init(&config.log_level) {
        eprintln!("{}", e);
    }

    RUNTIME.block_on(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let config = if config.is_complete() {
            config
        } else {
            match setup::run_setup(&mut lines, config).await {
                Some(c) => c,
                None => return,
            }
        };

        match build_app(&config) {
            Ok(app) => console::run(app, &mut lines).await,
            Err(e) => log::error!("cannot start: {}", e),
        }
    });
}
