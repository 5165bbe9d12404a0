use console::{Emoji, style};

pub static LOOKING_GLASS: Emoji<'_, '_> = Emoji("🔍 ", "");
pub static HEARTBEAT: Emoji<'_, '_> = Emoji("🫀 ", "");
pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static PACKAGE: Emoji<'_, '_> = Emoji("📦 ", "");
pub static BOOK: Emoji<'_, '_> = Emoji("📖 ", "");
pub static CLIPBOARD: Emoji<'_, '_> = Emoji("📋 ", "");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static MEMO: Emoji<'_, '_> = Emoji("📝 ", "");
pub static WASTEBASKET: Emoji<'_, '_> = Emoji("🗑️  ", "");
pub static RUNNER: Emoji<'_, '_> = Emoji("🏃 ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

/// Char-boundary-safe prefix with a trailing ellipsis.
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

pub fn print_banner() {
    println!();
    println!(" {}", style("pacekeeper").bold().cyan());
    println!(
        " {}  {}",
        style("─╲╱╲─").red(),
        style("declarative heartbeats for OpenClaw").dim()
    );
    println!();
}

/// Aligned help/output section in the style of the CLI guide screens.
pub struct HelpSection {
    title: String,
    lines: Vec<String>,
}

impl HelpSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, description: &str) -> Self {
        self.lines.push(format!(
            "  {} {}",
            style(format!("{:<28}", name)).green(),
            description
        ));
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.lines.push(format!(
            "  {} {}",
            style(format!("{:<14}", label)).bold(),
            value
        ));
        self
    }

    pub fn blank(mut self) -> Self {
        self.lines.push(String::new());
        self
    }

    pub fn print(self) {
        println!("\n {}", style(self.title).bold().underlined());
        for line in self.lines {
            println!("{}", line);
        }
    }
}
