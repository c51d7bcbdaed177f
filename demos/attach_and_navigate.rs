//! Attach to a page target and drive it over a flat session.
//!
//! Demonstrates:
//! - Target discovery and flat-mode attachment
//! - Session-scoped commands and events
//! - Waiting for an event created before the command that triggers it
//!
//! Usage:
//!   cargo run --example attach_and_navigate -- --endpoint ws://127.0.0.1:9222/devtools/browser/<id>
//!   cargo run --example attach_and_navigate -- --endpoint <ws-url> --url https://example.org --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use common::Args;
use devtools_link::domains::{Page, Runtime, Target};
use devtools_link::{Connection, Error, Result};

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_URL: &str = "https://example.com";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== Attach and navigate ===\n");

    // ========================================================================
    // Setup
    // ========================================================================

    println!("[Setup] Connecting to {}...", args.endpoint);

    let connection = Connection::builder()
        .command_timeout(Duration::from_secs(30))
        .connect(&args.endpoint)
        .await?;
    println!("        ✓ Connected\n");

    // ========================================================================
    // Discover and attach
    // ========================================================================

    let target = Target::new(&connection);
    let _created = target.on_target_created(|event| {
        println!("    [event] targetCreated {} ({})", event.target_info.target_id, event.target_info.kind);
    });
    target.set_discover_targets(true).await?;

    println!("[1] Listing targets...");
    let targets = target.get_targets().await?;
    for info in &targets {
        println!("    {} {} {}", info.target_id, info.kind, info.url);
    }

    let page_target = targets
        .into_iter()
        .find(|t| t.kind == "page")
        .ok_or_else(|| Error::invalid_argument("No page target to attach to"))?;

    println!("\n[2] Attaching to {}...", page_target.target_id);
    let session = target.attach_to_target(&page_target.target_id).await?;
    println!("    ✓ Session {session}");

    // ========================================================================
    // Drive the page
    // ========================================================================

    let page = Page::new(&connection).with_session(session.clone());
    let runtime = Runtime::new(&connection).with_session(session.clone());

    let _console = runtime.on_console_api_called(|event| {
        let text: Vec<String> = event
            .args
            .iter()
            .map(|arg| arg.value.as_ref().map_or_else(|| arg.kind.clone(), ToString::to_string))
            .collect();
        println!("    [console.{}] {}", event.kind, text.join(" "));
    });

    page.enable().await?;
    runtime.enable().await?;

    let url = args.url.as_deref().unwrap_or(DEFAULT_URL);
    println!("\n[3] Navigating to {url}...");

    let loaded = page.next_load_event();
    let navigation = page.navigate(url).await?;
    if let Some(error) = navigation.error_text {
        return Err(Error::protocol(format!("Navigation failed: {error}")));
    }
    let load = loaded.await?;
    println!("    ✓ Loaded (frame={}, t={:.3})", navigation.frame_id, load.timestamp);

    println!("\n[4] Evaluating document.title...");
    let evaluation = runtime.evaluate("console.log('hello from', location.href); document.title").await?;
    match evaluation.exception_details {
        Some(details) => println!("    ✗ Threw: {}", details.text),
        None => println!("    Title: {}", evaluation.result.value.unwrap_or_default()),
    }

    // ========================================================================
    // Cleanup
    // ========================================================================

    println!("\n[Cleanup] Detaching...");
    target.detach_from_target(&session).await?;
    connection.shutdown();
    println!("          ✓ Done");

    Ok(())
}
