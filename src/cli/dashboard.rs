use std::sync::Arc;

use anyhow::Result;
use console::style;
use rand::Rng;

use super::parse_dashboard_flags;
use crate::core::openclaw::OpenClawGateway;
use crate::core::store::CacheStore;
use crate::core::terminal::{self, HelpSection, print_warn};
use crate::interfaces::web::{self, DashboardOptions};

pub async fn run_dashboard_command(args: &[String]) -> Result<()> {
    let mut flags = parse_dashboard_flags(args, 2);

    // Remote mode opens the listener to the network, so it always runs
    // behind a token. Generate one when the caller did not bring their own.
    if flags.remote {
        flags.host = "0.0.0.0".to_string();
        if flags.token.is_none() {
            flags.token = Some(generate_token());
        }
    }

    terminal::print_banner();

    let local_url = match flags.token.as_deref() {
        Some(token) => format!("http://127.0.0.1:{}?token={token}", flags.port),
        None => format!("http://127.0.0.1:{}", flags.port),
    };
    let mut section = HelpSection::new("Dashboard").status("Local", &local_url);
    if flags.remote {
        section = section
            .status("Mode", "remote (listening on all interfaces)")
            .status("Token", flags.token.as_deref().unwrap_or(""));
    }
    section
        .blank()
        .status("Stop", &format!("{}", style("Ctrl+C").bold().yellow()))
        .print();
    println!();

    if flags.remote {
        print_warn("Anyone with this token can read your heartbeat data. Keep it secret.");
    }

    let options = DashboardOptions {
        host: flags.host,
        port: flags.port,
        token: flags.token,
        config: flags.config,
        db_path: CacheStore::default_path(),
    };
    web::serve(Arc::new(OpenClawGateway::new()), options).await?;
    Ok(())
}

fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::generate_token;

    #[test]
    fn generated_tokens_are_32_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }
}
