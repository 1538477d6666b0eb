//! Print search results and every thread's message hierarchy without a terminal.

use anyhow::{Context, Result};

use mailwin::config::Config;
use mailwin::mail::{MailIndex, NotmuchIndex, build_hierarchy};
use mailwin::window::listing::{message_lines, thread_lines};

fn main() -> Result<()> {
    let config = Config::load();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let query = if args.is_empty() {
        config.default_query.clone()
    } else {
        args.join(" ")
    };

    let threads = NotmuchIndex::new(&config.notmuch_command)
        .search(&query)
        .with_context(|| format!("search for {:?} failed", query))?;

    let lines = match thread_lines(&threads) {
        Ok(lines) => lines,
        Err(_) => {
            println!("No threads match {:?}", query);
            return Ok(());
        }
    };

    for (thread, line) in threads.iter().zip(lines) {
        println!("{}", line);
        let nodes = build_hierarchy(thread.top_level_messages());
        let deepest = nodes.iter().map(|n| n.depth).max().unwrap_or(0);
        for message_line in message_lines(&nodes) {
            println!("    {}", message_line);
        }
        println!("    ({} messages, depth {})\n", nodes.len(), deepest);
    }

    println!("Threads: {}", threads.len());
    println!(
        "Messages: {} ({} matching)",
        threads.iter().map(|t| t.total).sum::<usize>(),
        threads.iter().map(|t| t.matched).sum::<usize>()
    );
    Ok(())
}
