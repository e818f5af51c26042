//! Local activation from standard input
//!
//! Each non-blank line names one token to activate. The reader stops at end
//! of input or when the session goes away.

use jukebox_common::Token;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::events::{EventSender, SessionEvent};

/// Token named by one input line, if any
pub fn parse_activation(line: &str) -> Option<Token> {
    let name = line.trim();
    if name.is_empty() {
        None
    } else {
        Some(Token::from(name))
    }
}

/// Forward activations read from `reader`
pub async fn read_activations<R>(reader: R, events: EventSender)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(token) = parse_activation(&line) {
                    if events.send(SessionEvent::UserActivated(token)).is_err() {
                        break;
                    }
                }
            }
            Ok(None) => {
                debug!("Input closed");
                break;
            }
            Err(e) => {
                warn!("Failed to read input: {}", e);
                break;
            }
        }
    }
}

/// Forward activations typed on stdin
pub async fn read_stdin(events: EventSender) {
    read_activations(BufReader::new(tokio::io::stdin()), events).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;

    #[test]
    fn test_parse_activation() {
        assert_eq!(parse_activation("  bell \n"), Some(Token::from("bell")));
        assert_eq!(parse_activation("   "), None);
        assert_eq!(parse_activation(""), None);
    }

    #[tokio::test]
    async fn test_read_activations_skips_blank_lines() {
        let (tx, mut rx) = events::channel();
        let input: &[u8] = b"bell\n\n  chime  \n";

        read_activations(input, tx).await;

        let mut tokens = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                SessionEvent::UserActivated(token) => tokens.push(token.into_inner()),
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(tokens, vec!["bell", "chime"]);
    }
}
