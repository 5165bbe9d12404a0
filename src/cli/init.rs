use anyhow::Result;

use crate::core::config;
use crate::core::terminal::print_success;
use crate::core::timezone;

fn build_scaffold(timezone: &str) -> String {
    format!(
        r#"# Pacekeeper heartbeats
# One entry per heartbeat; run `pacekeeper sync` after editing.

defaults:
  timezone: {timezone}

heartbeats:
  # Example:
  # - name: Morning Briefing
  #   schedule: "0 8 * * *"
  #   prompt: "Run morning briefing"
  #   delivery: telegram
"#
    )
}

pub fn run_init_command() -> Result<()> {
    let path = config::default_config_path();
    if path.exists() {
        println!("\nConfig already exists at {}\n", path.display());
        return Ok(());
    }

    let detected = timezone::resolve_timezone(None, None).zone;
    let keep = inquire::Confirm::new(&format!("Detected timezone: {detected}. Use this?"))
        .with_default(true)
        .prompt()?;
    let zone = if keep {
        detected
    } else {
        let custom = inquire::Text::new("Enter IANA timezone (e.g. America/New_York):")
            .prompt()?
            .trim()
            .to_string();
        if custom.is_empty() { detected } else { custom }
    };

    config::write_raw(&path, &build_scaffold(&zone))?;

    println!();
    print_success(&format!("Created {}", path.display()));
    println!("\nNext steps:");
    println!("  1. Edit the file to add your heartbeats");
    println!("  2. Run: pacekeeper sync\n");
    Ok(())
}
