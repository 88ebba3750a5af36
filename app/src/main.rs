//! imapcopy - Main application entry point

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use imapcopy_core::{transfer, Endpoint, ImapBox, TransferMode};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(version, about = "IMAP4 mailbox copy tool", long_about = None)]
struct Args {
    /// Source account ( user[:password]@host[:port] )
    source: String,

    /// Destination account ( user[:password]@host[:port] )
    dest: String,

    /// Perform "move" (clear source) instead of copy
    #[arg(long = "move")]
    do_move: bool,

    /// Copy/move only this mailbox (default - all)
    #[arg(long = "box", value_name = "NAME")]
    mailbox: Option<String>,

    /// Connect using TLS (default port becomes 993)
    #[arg(long)]
    ssl: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if args.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    if let Err(err) = run(args).await {
        error!("{err:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let source = resolve_endpoint(&args.source, args.ssl)?;
    let dest = resolve_endpoint(&args.dest, args.ssl)?;

    let mut src_box = ImapBox::connect(&source)
        .await
        .with_context(|| format!("source {}", source.label()))?;
    let mut dst_box = ImapBox::connect(&dest)
        .await
        .with_context(|| format!("destination {}", dest.label()))?;

    let mode = if args.do_move {
        TransferMode::Move
    } else {
        TransferMode::Copy
    };

    let report = transfer::copy(&mut src_box, &mut dst_box, args.mailbox.as_deref(), mode).await?;
    info!(
        "done: {} messages across {} mailboxes ({} skipped)",
        report.total_transferred(),
        report.mailboxes.len(),
        report.total_skipped()
    );

    src_box.close().await?;
    dst_box.close().await?;
    Ok(())
}

/// Parse an endpoint URI, prompting for the password when it is not part
/// of the URI. The prompt does not echo.
fn resolve_endpoint(uri: &str, ssl: bool) -> anyhow::Result<Endpoint> {
    let mut endpoint = Endpoint::parse(uri, ssl)?;
    if endpoint.password.is_none() {
        let password = rpassword::prompt_password(format!("password for {}: ", endpoint.login))
            .context("failed to read password")?;
        endpoint.password = Some(password);
    }
    Ok(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["imapcopy", "alice@src.example.com", "bob@dst.example.com"]);
        assert!(!args.do_move);
        assert!(!args.ssl);
        assert_eq!(args.mailbox, None);
    }

    #[test]
    fn test_args_move_box_ssl() {
        let args = Args::parse_from([
            "imapcopy",
            "--move",
            "--box",
            "INBOX",
            "--ssl",
            "alice@src.example.com",
            "bob@dst.example.com",
        ]);
        assert!(args.do_move);
        assert!(args.ssl);
        assert_eq!(args.mailbox.as_deref(), Some("INBOX"));
    }

    #[test]
    fn test_two_positionals_required() {
        assert!(Args::try_parse_from(["imapcopy", "alice@src.example.com"]).is_err());
    }
}
