use std::io;
use std::io::Write;

use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;

/// What to do with credentials found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReuseDecision {
    Reuse,
    Reauthorize,
}

/// Anything but an explicit yes keeps the existing credentials. French
/// answers are accepted since the router UI is French.
pub fn parse_answer(answer: &str) -> ReuseDecision {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" | "o" | "oui" => ReuseDecision::Reauthorize,
        _ => ReuseDecision::Reuse,
    }
}

/// Ask whether to request a new authorization. EOF counts as "no".
pub async fn ask_reauthorize<R>(input: &mut R) -> io::Result<ReuseDecision>
where
    R: AsyncBufRead + Unpin,
{
    print!("\nCreate a new authorization? (y/N): ");
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line).await?;
    Ok(parse_answer(&line))
}
