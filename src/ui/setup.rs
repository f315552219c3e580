use crate::app::AppConfig;
use tokio::io::{AsyncWriteExt, BufReader, Lines, Stdin};

pub type Input = Lines<BufReader<Stdin>>;

/// Prints `label` and reads one trimmed line; `None` at end of input.
pub async fn prompt(lines: &mut Input, label: &str) -> Option<String> {
    let mut out = tokio::io::stdout();
    let _ = out.write_all(format!("{}: ", label).as_bytes()).await;
    let _ = out.flush().await;
    match lines.next_line().await {
        Ok(Some(line)) => Some(line.trim().to_string()),
        _ => None,
    }
}

fn url_or_empty(input: String) -> String {
    if input.is_empty() { input } else { crate::utils::normalize_url(&input) }
}

/// Asks for the missing connection settings and persists them.
pub async fn run_setup(lines: &mut Input, mut config: AppConfig) -> Option<AppConfig> {
    println!("Connect the address book to its contract");

    if config.gateway_url.trim().is_empty() {
        config.gateway_url = url_or_empty(prompt(lines, "Contract bridge URL").await?);
    }
    if config.relayer_url.trim().is_empty() {
        config.relayer_url = url_or_empty(prompt(lines, "FHE relayer URL").await?);
    }
    if config.contract_address.trim().is_empty() {
        config.contract_address = prompt(lines, "Contract address").await?;
    }
    if config.account.is_none() {
        let account = prompt(lines, "Wallet account (blank to browse disconnected)").await?;
        config.account = (!account.is_empty()).then_some(account);
    }

    if !config.is_complete() {
        println!("Bridge URL, relayer URL and contract address are all required.");
        return None;
    }
    // Settings are kept even if the bridge cannot be reached yet
    if let Err(e) = config.save() {
        log::warn!("failed to save settings: {}", e);
    }
    Some(config)
}
