//! Chat command parsing.

use crate::data::types::MarketId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Current(MarketId),
    Track(MarketId),
    Untrack(MarketId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("message is not a command")]
    NotACommand,

    #[error("Unknown command {0}. Use /help")]
    UnknownCommand(String),

    /// Missing or unrecognised market argument for the named command
    #[error("Use: /{0} london or /{0} nyc")]
    Usage(&'static str),
}

/// Parse a chat message into a command.
///
/// A `@botname` suffix on the command is ignored, as is anything after
/// the first argument.
pub fn parse_command(text: &str) -> Result<BotCommand, CommandError> {
    let mut parts = text.split_whitespace();
    let Some(raw) = parts.next() else {
        return Err(CommandError::NotACommand);
    };
    if !raw.starts_with('/') {
        return Err(CommandError::NotACommand);
    }

    let command = raw.split_once('@').map_or(raw, |(head, _)| head);
    let command = command.to_lowercase();
    let arg = parts.next();

    match command.as_str() {
        "/start" => Ok(BotCommand::Start),
        "/help" => Ok(BotCommand::Help),
        "/current" => market_arg(arg, "current").map(BotCommand::Current),
        "/track" => market_arg(arg, "track").map(BotCommand::Track),
        "/untrack" => market_arg(arg, "untrack").map(BotCommand::Untrack),
        _ => Err(CommandError::UnknownCommand(command)),
    }
}

fn market_arg(arg: Option<&str>, command: &'static str) -> Result<MarketId, CommandError> {
    arg.and_then(|a| a.parse().ok())
        .ok_or(CommandError::Usage(command))
}

pub fn command_help() -> &'static str {
    "📋 Commands\n\n\
    /current <london|nyc> - Top outcomes and volume trend\n\
    /track <london|nyc> - Report this market periodically\n\
    /untrack <london|nyc> - Stop periodic reports\n\
    /help - Show this message"
}

/// (command, description) pairs for `setMyCommands`.
pub fn bot_commands() -> Vec<(&'static str, &'static str)> {
    vec![
        ("current", "Top outcomes and volume trend"),
        ("track", "Report a market periodically"),
        ("untrack", "Stop periodic reports"),
        ("help", "Show all commands"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_current() {
        assert_eq!(
            parse_command("/current london").unwrap(),
            BotCommand::Current(MarketId::London)
        );
        assert_eq!(
            parse_command("/current NYC").unwrap(),
            BotCommand::Current(MarketId::Nyc)
        );
    }

    #[test]
    fn test_parse_with_bot_mention() {
        assert_eq!(
            parse_command("/current@celsius_bot nyc").unwrap(),
            BotCommand::Current(MarketId::Nyc)
        );
        assert_eq!(parse_command("/start@celsius_bot").unwrap(), BotCommand::Start);
    }

    #[test]
    fn test_parse_missing_or_bad_market() {
        assert_eq!(parse_command("/current"), Err(CommandError::Usage("current")));
        assert_eq!(parse_command("/current paris"), Err(CommandError::Usage("current")));
        assert_eq!(
            CommandError::Usage("current").to_string(),
            "Use: /current london or /current nyc"
        );
    }

    #[test]
    fn test_parse_tracking() {
        assert_eq!(
            parse_command("/track london").unwrap(),
            BotCommand::Track(MarketId::London)
        );
        assert_eq!(
            parse_command("/untrack nyc").unwrap(),
            BotCommand::Untrack(MarketId::Nyc)
        );
        assert_eq!(parse_command("/track"), Err(CommandError::Usage("track")));
    }

    #[test]
    fn test_parse_non_commands() {
        assert_eq!(parse_command(""), Err(CommandError::NotACommand));
        assert_eq!(parse_command("hello"), Err(CommandError::NotACommand));
        assert_eq!(
            parse_command("/foo"),
            Err(CommandError::UnknownCommand("/foo".to_string()))
        );
    }

    #[test]
    fn test_bot_commands_have_help() {
        let names: Vec<_> = bot_commands().into_iter().map(|(c, _)| c).collect();
        assert!(names.contains(&"current"));
        assert!(names.contains(&"help"));
        for name in names {
            assert!(command_help().contains(&format!("/{name}")));
        }
    }
}
