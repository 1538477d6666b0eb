//! Render message files the way a message window shows them, optionally
//! followed by the reply draft.
//!
//! Usage: render_message [--reply] <file>...

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use mailwin::config::Config;
use mailwin::mail::{CommandTransfer, FileStore, MessageStore, build_reply_draft};
use mailwin::ui::MemoryService;
use mailwin::window::{MessageWindow, Services, Window, WindowTask};

fn main() -> Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let reply = args.iter().any(|a| a == "--reply");
    args.retain(|a| a != "--reply");
    if args.is_empty() {
        bail!("usage: render_message [--reply] <file>...");
    }

    let config = Config::load();
    let ui = MemoryService::new();
    let services = Services {
        ui: Arc::new(ui.clone()),
        store: Arc::new(FileStore),
        transfer: Arc::new(
            CommandTransfer::from_command_line(&config.send_command)
                .context("send_command in config.toml is not usable")?,
        ),
        sender: config.sender.clone(),
    };

    for path in &args {
        println!("=== {} ===", path);

        let window = Window::Message(MessageWindow::new(path));
        let name = window.name();
        WindowTask::create(services.clone(), window)?;
        let probe = ui
            .find(&name)
            .with_context(|| format!("no surface for {}", name))?;

        print!("{}", probe.body());
        for diagnostic in probe.diagnostics() {
            println!("!! {}", diagnostic);
        }

        if reply {
            let original = FileStore.load(Path::new(path))?;
            let draft = build_reply_draft(&original, &config.sender)?;
            println!("\n--- reply ---");
            println!("{}", draft.to_buffer(|| chrono::Local::now().to_rfc2822()));
        }
        println!();
    }
    Ok(())
}
