use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;

/// How a command is spelled at the prompt.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Spelling {
    /// `history`
    Bare,
    /// `/set`
    Slash,
    /// Either form.
    Both,
}

/// What may follow a command word. Input whose arguments do not fit is
/// chat text, not a command.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// `history`
    Nothing,
    /// `run 2`, `save`, `load chat.json`
    OptionalWord,
    /// `temp`, `temp 0.9`
    OptionalNumber,
    /// Free text, only in the slash spelling; the bare word takes nothing.
    SlashText,
    /// Free text in either spelling.
    Text,
}

impl ArgShape {
    /// Whether `args` (the text after the command word) fits this shape.
    pub fn accepts(self, args: &str, slash: bool) -> bool {
        let mut words = args.split_whitespace();
        let first = words.next();
        let single = words.next().is_none();
        match self {
            ArgShape::Nothing => first.is_none(),
            ArgShape::OptionalWord => single,
            ArgShape::OptionalNumber => {
                single && first.is_none_or(|word| word.parse::<f32>().is_ok())
            }
            ArgShape::SlashText => slash || first.is_none(),
            ArgShape::Text => true,
        }
    }
}

pub struct Command {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub spelling: Spelling,
    pub args: ArgShape,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

impl Command {
    fn answers_to(&self, name: &str, slash: bool) -> bool {
        let spelled = match self.spelling {
            Spelling::Bare => !slash,
            Spelling::Slash => slash,
            Spelling::Both => true,
        };
        spelled
            && (self.name.eq_ignore_ascii_case(name)
                || self
                    .aliases
                    .iter()
                    .any(|alias| alias.eq_ignore_ascii_case(name)))
    }
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

impl<'a> CommandInvocation<'a> {
    pub fn arg_list(&self) -> Vec<&'a str> {
        self.args.split_whitespace().collect()
    }
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str, slash: bool) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.answers_to(name, slash))
}

const COMMANDS: &[Command] = &[
    Command {
        name: "list",
        aliases: &[],
        spelling: Spelling::Bare,
        args: ArgShape::Nothing,
        usage: "list",
        help: "List available models with numbers",
        handler: super::handle_list,
    },
    Command {
        name: "run",
        aliases: &[],
        spelling: Spelling::Bare,
        args: ArgShape::OptionalWord,
        usage: "run <model|number>",
        help: "Start chatting with a model by name or number",
        handler: super::handle_run,
    },
    Command {
        name: "model",
        aliases: &[],
        spelling: Spelling::Bare,
        args: ArgShape::OptionalWord,
        usage: "model [name]",
        help: "Show the active model, or switch to an installed one keeping history",
        handler: super::handle_model,
    },
    Command {
        name: "temp",
        aliases: &[],
        spelling: Spelling::Bare,
        args: ArgShape::OptionalNumber,
        usage: "temp [value]",
        help: "Show or set temperature (0.0-2.0)",
        handler: super::handle_temp,
    },
    Command {
        name: "system",
        aliases: &[],
        spelling: Spelling::Both,
        args: ArgShape::SlashText,
        usage: "/system [prompt]",
        help: "Set the system prompt, or clear it with no text; `system` shows it",
        handler: super::handle_system,
    },
    Command {
        name: "history",
        aliases: &[],
        spelling: Spelling::Bare,
        args: ArgShape::Nothing,
        usage: "history",
        help: "Show conversation history",
        handler: super::handle_history,
    },
    Command {
        name: "clear",
        aliases: &[],
        spelling: Spelling::Bare,
        args: ArgShape::Nothing,
        usage: "clear",
        help: "Clear conversation history",
        handler: super::handle_clear,
    },
    Command {
        name: "save",
        aliases: &[],
        spelling: Spelling::Bare,
        args: ArgShape::OptionalWord,
        usage: "save [file]",
        help: "Save the session",
        handler: super::handle_save,
    },
    Command {
        name: "load",
        aliases: &[],
        spelling: Spelling::Bare,
        args: ArgShape::OptionalWord,
        usage: "load <file>",
        help: "Load a saved session",
        handler: super::handle_load,
    },
    Command {
        name: "retry",
        aliases: &[],
        spelling: Spelling::Bare,
        args: ArgShape::Nothing,
        usage: "retry",
        help: "Resend the last interrupted or failed message",
        handler: super::handle_retry,
    },
    Command {
        name: "version",
        aliases: &[],
        spelling: Spelling::Bare,
        args: ArgShape::Nothing,
        usage: "version",
        help: "Show client and server versions",
        handler: super::handle_version,
    },
    Command {
        name: "set",
        aliases: &[],
        spelling: Spelling::Slash,
        args: ArgShape::Text,
        usage: "/set <think|verbose> <on|off>",
        help: "Toggle thinking separation or generation stats",
        handler: super::handle_set,
    },
    Command {
        name: "help",
        aliases: &["?"],
        spelling: Spelling::Both,
        args: ArgShape::Nothing,
        usage: "help",
        help: "Show this help",
        handler: super::handle_help,
    },
    Command {
        name: "exit",
        aliases: &["quit"],
        spelling: Spelling::Both,
        args: ArgShape::Nothing,
        usage: "exit",
        help: "Quit",
        handler: super::handle_exit,
    },
];
