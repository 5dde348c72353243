use std::str::FromStr;

use crate::events::MessageId;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Show or hide the source documents of an answer
    Sources,
    /// Copy a code block to the clipboard
    Copy,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub keyword: &'static str,
    pub description: &'static str,
}

/// Code block addressed by `/copy`: block `index` (1-based) of answer `id`,
/// or of the latest answer when `id` is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyTarget {
    pub id: Option<MessageId>,
    pub index: usize,
}

fn parse_id(arg: &str) -> Option<MessageId> {
    arg.trim_start_matches('#').parse().ok().map(MessageId)
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Answer id for `/sources <id>`
    pub fn sources_target(&self) -> Option<MessageId> {
        if self.command != SlashCommand::Sources {
            return None;
        }
        parse_id(self.argument()?.trim())
    }

    /// Target of `/copy [<id>] <n>`; a bare `/copy` means block 1 of the latest answer.
    pub fn copy_target(&self) -> Option<CopyTarget> {
        if self.command != SlashCommand::Copy {
            return None;
        }

        let args: Vec<&str> = self.argument().unwrap_or("").split_whitespace().collect();
        let (id, index) = match args.as_slice() {
            [] => (None, 1),
            [index] => (None, index.parse().ok()?),
            [id, index] => (Some(parse_id(id)?), index.parse().ok()?),
            _ => return None,
        };

        (index >= 1).then_some(CopyTarget { id, index })
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Sources => "show or hide the source documents of answer <id>",
            SlashCommand::Copy => "copy code block [<id>] <n> to the clipboard",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Return all built-in commands in a Vec paired with their command string.
pub fn built_in_slash_commands() -> Vec<(&'static str, SlashCommand)> {
    SlashCommand::iter().map(|c| (c.command(), c)).collect()
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?;
    let rest: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(head).ok().or_else(|| {
        match head.to_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(SlashCommand::Bye),
            "s" | "src" | "source" => Some(SlashCommand::Sources),
            "c" | "cp" => Some(SlashCommand::Copy),
            "h" | "?" => Some(SlashCommand::Help),
            _ => None,
        }
    })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for (command_str, command) in built_in_slash_commands() {
        help.push_str(&format!("/{} - {}\n", command_str, command.description()));
    }

    help.push_str("\nAliases: /s for /sources, /c for /copy, /q for /bye.");
    help.push_str("\nPageUp/PageDown scroll the transcript; Esc or Ctrl+C quits.");

    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_aliases() {
        let parsed = parse_slash_command("/sources 2").unwrap();
        assert_eq!(parsed.command, SlashCommand::Sources);
        assert_eq!(parsed.sources_target(), Some(MessageId(2)));

        assert_eq!(parse_slash_command("/q").unwrap().command, SlashCommand::Bye);
        assert_eq!(parse_slash_command("/s #3").unwrap().sources_target(), Some(MessageId(3)));
        assert_eq!(parse_slash_command("/help").unwrap().command, SlashCommand::Help);
    }

    #[test]
    fn plain_text_and_unknown_commands_are_not_commands() {
        assert!(parse_slash_command("what is /usr?").is_none());
        assert!(parse_slash_command("/nope").is_none());
        assert!(parse_slash_command("/").is_none());
    }

    #[test]
    fn sources_needs_a_numeric_id() {
        assert_eq!(parse_slash_command("/sources").unwrap().sources_target(), None);
        assert_eq!(parse_slash_command("/sources x").unwrap().sources_target(), None);
    }

    #[test]
    fn copy_target_forms() {
        let target = |input: &str| parse_slash_command(input).unwrap().copy_target();

        assert_eq!(target("/copy"), Some(CopyTarget { id: None, index: 1 }));
        assert_eq!(target("/copy 2"), Some(CopyTarget { id: None, index: 2 }));
        assert_eq!(
            target("/copy 4 3"),
            Some(CopyTarget { id: Some(MessageId(4)), index: 3 })
        );
        assert_eq!(target("/copy 0"), None);
        assert_eq!(target("/copy a b"), None);
        assert_eq!(target("/copy 1 2 3"), None);
    }

    #[test]
    fn help_lists_every_command() {
        let help = get_help_text();
        for (keyword, _) in built_in_slash_commands() {
            assert!(help.contains(&format!("/{}", keyword)));
        }
    }
}
