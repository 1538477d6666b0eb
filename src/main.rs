use std::sync::Arc;

use anyhow::{Context, Result};

use mailwin::config::Config;
use mailwin::logging::setup_logging;
use mailwin::mail::{CommandTransfer, FileStore, MailIndex, NotmuchIndex};
use mailwin::ui::TerminalService;
use mailwin::window::{Services, ThreadListWindow, Window};

fn print_usage() {
    eprintln!(
        r#"mailwin - mail windows over notmuch

Usage: mailwin [--help] [query words...]

Without a query the configured default_query is searched.

Keys:
    j/k, g/G    move the cursor line
    Enter       open the thread or message on the cursor line
    :           run a command from the window's tag (e.g. :Reply, :Send)
    Tab         next window
    e           edit the window body in $EDITOR
    q / Q       close window / close all

Configuration file: ~/.config/mailwin/config.toml
"#
    );
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some("--help" | "-h" | "help") = args.first().map(|s| s.as_str()) {
        print_usage();
        return Ok(());
    }

    let config = Config::load();
    setup_logging(&config.log_path());

    let query = if args.is_empty() {
        config.default_query.clone()
    } else {
        args.join(" ")
    };

    let index = NotmuchIndex::new(&config.notmuch_command);
    let threads = index
        .search(&query)
        .with_context(|| format!("search for {:?} failed", query))?;
    let transfer = CommandTransfer::from_command_line(&config.send_command)
        .context("send_command in config.toml is not usable")?;

    let desk = Arc::new(TerminalService::new(
        config.theme.clone(),
        config.editor_command(),
    ));
    let services = Services {
        ui: desk.clone(),
        store: Arc::new(FileStore),
        transfer: Arc::new(transfer),
        sender: config.sender.clone(),
    };

    services.open(Window::ThreadList(ThreadListWindow::new(query, threads)))?;
    desk.run().context("terminal error")?;

    tracing::info!("desk closed");
    Ok(())
}
