//! The command interpreter.
//!
//! [`Interpreter::execute`] is a reducer: it takes one command line, the
//! current snapshot and the open editor's payload, and returns a new
//! snapshot with the lines to print. The caller's snapshot is never touched.
//! The only state the interpreter keeps between calls is its settings and
//! its hash generator.

use serde::Serialize;

use crate::commands::definitions::{find, CommandDef, Program};
use crate::commands::handlers::CommandContext;
use crate::commands::help;
use crate::commands::output::{LineKind, OutputLine, SessionDirective};
use crate::commands::router::{Command, CommandRouter};
use crate::commands::tokenizer::Token;
use crate::commands::Args;
use crate::config::InterpreterSettings;
use crate::error::CommandError;
use crate::repo::hash::{HashGenerator, RandomHashes};
use crate::repo::RepositoryState;
use crate::session::{ActiveSession, SessionPayload};

/// Everything one command produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    /// The snapshot to use from now on.
    pub state: RepositoryState,
    /// Terminal records, starting with the echoed input.
    pub lines: Vec<OutputLine>,
    /// Editor to open or close, if any.
    pub directive: Option<SessionDirective>,
    /// Whether the terminal should be wiped before printing.
    pub clear_screen: bool,
}

impl Outcome {
    fn unchanged(state: &RepositoryState) -> Self {
        Self {
            state: state.clone(),
            lines: Vec::new(),
            directive: None,
            clear_screen: false,
        }
    }

    /// All record texts joined by newlines, echo included.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether any record is an error.
    pub fn failed(&self) -> bool {
        self.lines.iter().any(|l| l.kind == LineKind::Error)
    }
}

/// Simulated terminal that runs git and shell commands against snapshots.
pub struct Interpreter {
    settings: InterpreterSettings,
    hashes: Box<dyn HashGenerator>,
}

impl Interpreter {
    /// Creates an interpreter with random hashes.
    pub fn new(settings: InterpreterSettings) -> Self {
        let hashes = Box::new(RandomHashes::new(settings.hash_length));
        Self::with_hashes(settings, hashes)
    }

    /// Creates an interpreter whose hashes repeat from run to run.
    pub fn seeded(settings: InterpreterSettings, seed: u64) -> Self {
        let hashes = Box::new(RandomHashes::seeded(seed, settings.hash_length));
        Self::with_hashes(settings, hashes)
    }

    /// Creates an interpreter with an injected hash generator.
    pub fn with_hashes(settings: InterpreterSettings, hashes: Box<dyn HashGenerator>) -> Self {
        Self { settings, hashes }
    }

    /// The settings this interpreter runs with.
    pub fn settings(&self) -> &InterpreterSettings {
        &self.settings
    }

    /// Runs one command line.
    pub fn execute(
        &mut self,
        line: &str,
        state: &RepositoryState,
        payload: &SessionPayload,
    ) -> Outcome {
        let line = line.trim();
        if line.is_empty() {
            return Outcome::unchanged(state);
        }

        // The editor buffer is part of the snapshot even if the command fails.
        let mut base = state.clone();
        payload.apply_to(&mut base.session);

        let mut lines = vec![OutputLine::new(LineKind::Input, format!("$ {line}"))];
        let (program, verb, tokens) = match CommandRouter::parse(line) {
            Command::Empty => return Outcome::unchanged(state),
            Command::BareGit => {
                lines.extend(text_lines(LineKind::Output, &help::git_overview()));
                return Outcome {
                    state: base,
                    lines,
                    directive: None,
                    clear_screen: false,
                };
            }
            Command::Git { verb, tokens } => (Program::Git, verb, tokens),
            Command::Shell { verb, tokens } => (Program::Shell, verb, tokens),
        };

        let outcome = match find(program, &verb) {
            Some(def) => self.run(def, &tokens, base.clone()),
            None => Err((
                Vec::new(),
                match program {
                    Program::Git => CommandError::unknown_git(&verb),
                    Program::Shell => CommandError::unknown_shell(&verb),
                },
            )),
        };

        match outcome {
            Ok(mut done) => {
                if let Some(directive) = &done.directive {
                    tracing::info!(%verb, ?directive, "session directive");
                }
                tracing::debug!(%verb, lines = done.lines.len(), "command succeeded");
                lines.append(&mut done.lines);
                done.lines = lines;
                done
            }
            Err((partial, err)) => {
                tracing::debug!(%verb, category = err.category(), "command failed");
                lines.extend(partial);
                lines.extend(text_lines(LineKind::Error, &err.to_string()));
                Outcome {
                    state: base,
                    lines,
                    directive: None,
                    clear_screen: false,
                }
            }
        }
    }

    /// Runs a resolved table entry on a working copy of `state`.
    ///
    /// On failure the lines written before the error are returned with it;
    /// the working copy is dropped.
    fn run(
        &mut self,
        def: &CommandDef,
        tokens: &[Token],
        state: RepositoryState,
    ) -> Result<Outcome, (Vec<OutputLine>, CommandError)> {
        if def.requires_repo && !state.initialized {
            return Err((Vec::new(), CommandError::NotARepository));
        }

        let args = Args::parse(tokens, def.flags).map_err(|e| (Vec::new(), e))?;
        if def.program == Program::Git {
            if let Some(flag) = args.unknown.first() {
                return Err((
                    Vec::new(),
                    CommandError::usage(format!(
                        "error: unknown option `{}'\nusage: {}",
                        flag.trim_start_matches('-'),
                        def.usage
                    )),
                ));
            }
        }
        check_session_gate(def, &args, &state.session).map_err(|e| (Vec::new(), e))?;

        let mut ctx = CommandContext::new(state, &self.settings, self.hashes.as_mut());
        match (def.handler)(&mut ctx, &args) {
            Ok(()) => Ok(Outcome {
                state: ctx.state,
                lines: ctx.out.into_lines(),
                directive: ctx.directive,
                clear_screen: ctx.clear_screen,
            }),
            Err(err) => Err((ctx.out.into_lines(), err)),
        }
    }
}

fn text_lines(kind: LineKind, text: &str) -> Vec<OutputLine> {
    if text.is_empty() {
        return vec![OutputLine::new(kind, "")];
    }
    text.lines().map(|l| OutputLine::new(kind, l)).collect()
}

/// Refuses commands that cannot run while a modal session is open.
fn check_session_gate(
    def: &CommandDef,
    args: &Args,
    session: &ActiveSession,
) -> Result<(), CommandError> {
    match session {
        ActiveSession::None => Ok(()),
        ActiveSession::InteractiveRebase(_) if def.blocked_during_rebase => {
            tracing::warn!(verb = def.name, "refused during interactive rebase");
            Err(CommandError::error(format!(
                "cannot {}: an interactive rebase is in progress.\n\
                 hint: Edit the todo list, then run \"git rebase --continue\",\n\
                 hint: or run \"git rebase --abort\" to leave history as it was.",
                def.name
            )))
        }
        ActiveSession::Conflict(conflict) if def.blocked_during_conflict => {
            if def.name == "merge" && args.has("abort") {
                return Ok(());
            }
            tracing::warn!(verb = def.name, file = %conflict.file, "refused during merge conflict");
            let activity = match def.name {
                "merge" => "Merging",
                "pull" => "Pulling",
                "cherry-pick" => "Cherry-picking",
                "revert" => "Reverting",
                "rebase" => {
                    return Err(CommandError::error(
                        "cannot rebase: You have unmerged paths.\n\
                         hint: Fix them up in the work tree, then 'git add <file>' and 'git commit'.",
                    ))
                }
                _ => {
                    return Err(CommandError::error(format!(
                        "you need to resolve your current index first\n{}: needs merge",
                        conflict.file
                    )))
                }
            };
            Err(CommandError::error(format!(
                "{activity} is not possible because you have unmerged files.\n\
                 hint: Fix them up in the work tree, and then use 'git add <file>'\n\
                 hint: as appropriate to mark resolution and make a commit.\n\
                 fatal: Exiting because of an unresolved conflict."
            )))
        }
        _ => Ok(()),
    }
}
