//! Command definitions for declarative command metadata.
//!
//! Every verb the terminal understands is one [`CommandDef`] entry in
//! [`COMMANDS`]. The entry carries the verb's flag grammar, its handler and
//! the gating metadata the dispatcher checks before running it, so adding a
//! verb is a table entry rather than a new branch in the dispatcher.

use super::args::FlagSpec;
use super::handlers::{
    auxiliary, branching, history, lifecycle, remote, rewrite, shell, stash, staging, Handler,
};

/// Which program a verb belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Program {
    /// `git <verb>`.
    Git,
    /// A bare shell verb (`ls`, `cat`, ...).
    Shell,
}

/// Definition of a command.
#[derive(Debug, Clone)]
pub struct CommandDef {
    /// Primary verb.
    pub name: &'static str,
    /// Alternative spellings.
    pub aliases: &'static [&'static str],
    /// Program the verb belongs to.
    pub program: Program,
    /// Short description shown in help.
    pub description: &'static str,
    /// Usage line.
    pub usage: &'static str,
    /// Flags the verb accepts.
    pub flags: &'static [FlagSpec],
    /// Function that executes the verb.
    pub handler: Handler,
    /// Whether the verb needs an initialized repository.
    pub requires_repo: bool,
    /// Whether the verb is refused while an interactive rebase is open.
    pub blocked_during_rebase: bool,
    /// Whether the verb is refused while a merge conflict is open.
    pub blocked_during_conflict: bool,
    /// Category for grouping in help.
    pub category: CommandCategory,
}

/// Category for grouping commands in help output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCategory {
    /// Creating and inspecting a repository.
    Lifecycle,
    /// Index and commit commands.
    Staging,
    /// History inspection.
    History,
    /// Branch, checkout and merge commands.
    Branching,
    /// History rewriting.
    Rewrite,
    /// Stash commands.
    Stash,
    /// Remote collaboration.
    Remote,
    /// Worktrees, submodules and configuration.
    Auxiliary,
    /// Shell commands.
    Shell,
}

impl CommandCategory {
    /// Every category, in help order.
    pub const ALL: [CommandCategory; 9] = [
        Self::Lifecycle,
        Self::Staging,
        Self::History,
        Self::Branching,
        Self::Rewrite,
        Self::Stash,
        Self::Remote,
        Self::Auxiliary,
        Self::Shell,
    ];

    /// Returns the display name for this category.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Lifecycle => "Start a working area",
            Self::Staging => "Work on the current change",
            Self::History => "Examine the history and state",
            Self::Branching => "Grow, mark and tweak your common history",
            Self::Rewrite => "Rewrite history",
            Self::Stash => "Shelve work in progress",
            Self::Remote => "Collaborate",
            Self::Auxiliary => "Ancillary commands",
            Self::Shell => "Shell commands",
        }
    }
}

const INIT_FLAGS: &[FlagSpec] = &[
    FlagSpec::value("initial-branch", Some('b'), &["initial-branch"]),
    FlagSpec::switch("quiet", Some('q'), &["quiet"]),
];

const STATUS_FLAGS: &[FlagSpec] = &[FlagSpec::switch("short", Some('s'), &["short"])];

const ADD_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("all", Some('A'), &["all"]),
    FlagSpec::switch("update", Some('u'), &["update"]),
];

const RESTORE_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("staged", Some('S'), &["staged"]),
    FlagSpec::switch("worktree", Some('W'), &["worktree"]),
];

const RESET_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("soft", None, &["soft"]),
    FlagSpec::switch("mixed", None, &["mixed"]),
    FlagSpec::switch("hard", None, &["hard"]),
];

const COMMIT_FLAGS: &[FlagSpec] = &[
    FlagSpec::value("message", Some('m'), &["message"]),
    FlagSpec::switch("all", Some('a'), &["all"]),
    FlagSpec::switch("amend", None, &["amend"]),
    FlagSpec::value("author", None, &["author"]),
    FlagSpec::redundant("no-edit", &["no-edit"]),
];

const LOG_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("oneline", None, &["oneline"]),
    FlagSpec::switch("graph", None, &["graph"]),
    FlagSpec::switch("all", None, &["all"]),
    FlagSpec::redundant("decorate", &["decorate"]),
    FlagSpec::value("max-count", Some('n'), &["max-count"]),
    FlagSpec::value("author", None, &["author"]),
    FlagSpec::value("pickaxe", Some('S'), &[]),
];

const DIFF_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("staged", None, &["staged", "cached"]),
    FlagSpec::switch("stat", None, &["stat"]),
    FlagSpec::switch("name-only", None, &["name-only"]),
];

const SHOW_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("stat", None, &["stat"]),
    FlagSpec::switch("name-only", None, &["name-only"]),
];

const TAG_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("annotate", Some('a'), &["annotate"]),
    FlagSpec::value("message", Some('m'), &["message"]),
    FlagSpec::switch("delete", Some('d'), &["delete"]),
    FlagSpec::switch("list", Some('l'), &["list"]),
];

const REFLOG_FLAGS: &[FlagSpec] = &[FlagSpec::value("max-count", Some('n'), &["max-count"])];

const BRANCH_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("all", Some('a'), &["all"]),
    FlagSpec::switch("remotes", Some('r'), &["remotes"]),
    FlagSpec::switch("delete", Some('d'), &["delete"]),
    FlagSpec::switch("force-delete", Some('D'), &[]),
    FlagSpec::switch("move", Some('m'), &["move"]),
    FlagSpec::switch("show-current", None, &["show-current"]),
    FlagSpec::switch("verbose", Some('v'), &["verbose"]),
];

const CHECKOUT_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("create", Some('b'), &[]),
    FlagSpec::switch("force-create", Some('B'), &[]),
    FlagSpec::switch("track", Some('t'), &["track"]),
    FlagSpec::switch("detach", None, &["detach"]),
];

const SWITCH_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("create", Some('c'), &["create"]),
    FlagSpec::switch("force-create", Some('C'), &["force-create"]),
    FlagSpec::switch("detach", Some('d'), &["detach"]),
];

const MERGE_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("no-ff", None, &["no-ff"]),
    FlagSpec::switch("ff-only", None, &["ff-only"]),
    FlagSpec::switch("abort", None, &["abort"]),
    FlagSpec::value("message", Some('m'), &["message"]),
];

const REBASE_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("interactive", Some('i'), &["interactive"]),
    FlagSpec::switch("continue", None, &["continue"]),
    FlagSpec::switch("abort", None, &["abort"]),
];

const REVERT_FLAGS: &[FlagSpec] = &[FlagSpec::redundant("no-edit", &["no-edit"])];

const STASH_FLAGS: &[FlagSpec] = &[
    FlagSpec::value("message", Some('m'), &["message"]),
    FlagSpec::switch("include-untracked", Some('u'), &["include-untracked"]),
];

const REMOTE_FLAGS: &[FlagSpec] = &[FlagSpec::switch("verbose", Some('v'), &["verbose"])];

const FETCH_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("all", None, &["all"]),
    FlagSpec::switch("prune", Some('p'), &["prune"]),
];

const PULL_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("rebase", Some('r'), &["rebase"]),
    FlagSpec::switch("ff-only", None, &["ff-only"]),
];

const PUSH_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("force", Some('f'), &["force"]),
    FlagSpec::switch("force-with-lease", None, &["force-with-lease"]),
    FlagSpec::switch("set-upstream", Some('u'), &["set-upstream"]),
    FlagSpec::switch("tags", None, &["tags"]),
];

const CLONE_FLAGS: &[FlagSpec] = &[FlagSpec::value("branch", Some('b'), &["branch"])];

const CONFIG_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("list", Some('l'), &["list"]),
    FlagSpec::switch("global", None, &["global"]),
    FlagSpec::switch("local", None, &["local"]),
    FlagSpec::switch("unset", None, &["unset"]),
    FlagSpec::switch("get", None, &["get"]),
];

const LS_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("all", Some('a'), &["all"]),
    FlagSpec::switch("long", Some('l'), &[]),
];

const RM_FLAGS: &[FlagSpec] = &[
    FlagSpec::switch("recursive", Some('r'), &["recursive"]),
    FlagSpec::switch("force", Some('f'), &["force"]),
];

const MKDIR_FLAGS: &[FlagSpec] = &[FlagSpec::switch("parents", Some('p'), &["parents"])];

/// Shorthand for a git entry with no gating beyond requiring a repository.
macro_rules! git {
    ($name:expr, $aliases:expr, $desc:expr, $usage:expr, $flags:expr, $handler:expr, $cat:expr) => {
        CommandDef {
            name: $name,
            aliases: $aliases,
            program: Program::Git,
            description: $desc,
            usage: $usage,
            flags: $flags,
            handler: $handler,
            requires_repo: true,
            blocked_during_rebase: false,
            blocked_during_conflict: false,
            category: $cat,
        }
    };
}

/// Shorthand for a shell entry.
macro_rules! shell {
    ($name:expr, $desc:expr, $usage:expr, $flags:expr, $handler:expr) => {
        CommandDef {
            name: $name,
            aliases: &[],
            program: Program::Shell,
            description: $desc,
            usage: $usage,
            flags: $flags,
            handler: $handler,
            requires_repo: false,
            blocked_during_rebase: false,
            blocked_during_conflict: false,
            category: CommandCategory::Shell,
        }
    };
}

/// All command definitions.
pub static COMMANDS: &[CommandDef] = &[
    // Lifecycle
    CommandDef {
        requires_repo: false,
        ..git!(
            "init",
            &[],
            "Create an empty Git repository",
            "git init [-b <branch>]",
            INIT_FLAGS,
            lifecycle::handle_init,
            CommandCategory::Lifecycle
        )
    },
    CommandDef {
        requires_repo: false,
        ..git!(
            "clone",
            &[],
            "Clone a repository into a new directory",
            "git clone <url> [<directory>]",
            CLONE_FLAGS,
            remote::handle_clone,
            CommandCategory::Lifecycle
        )
    },
    git!(
        "status",
        &[],
        "Show the working tree status",
        "git status [-s]",
        STATUS_FLAGS,
        lifecycle::handle_status,
        CommandCategory::Lifecycle
    ),
    // Staging
    git!(
        "add",
        &[],
        "Add file contents to the index",
        "git add [-A | -u | <pathspec>...]",
        ADD_FLAGS,
        staging::handle_add,
        CommandCategory::Staging
    ),
    git!(
        "restore",
        &[],
        "Restore working tree files or unstage them",
        "git restore [--staged] <pathspec>...",
        RESTORE_FLAGS,
        staging::handle_restore,
        CommandCategory::Staging
    ),
    CommandDef {
        blocked_during_rebase: true,
        ..git!(
            "reset",
            &[],
            "Reset current HEAD to the specified state",
            "git reset [--soft | --mixed | --hard] [<commit>] | git reset [HEAD] <path>...",
            RESET_FLAGS,
            staging::handle_reset,
            CommandCategory::Staging
        )
    },
    CommandDef {
        blocked_during_rebase: true,
        ..git!(
            "commit",
            &[],
            "Record changes to the repository",
            "git commit [-a] [--amend] [-m <msg>] [--author=<author>]",
            COMMIT_FLAGS,
            staging::handle_commit,
            CommandCategory::Staging
        )
    },
    // History
    git!(
        "log",
        &[],
        "Show commit logs",
        "git log [--oneline] [--graph] [-<n>] [--author=<a>] [-S<text>] [<branch>]",
        LOG_FLAGS,
        history::handle_log,
        CommandCategory::History
    ),
    git!(
        "diff",
        &[],
        "Show changes between the index and the working tree",
        "git diff [--staged | --cached] [--stat] [<path>...]",
        DIFF_FLAGS,
        history::handle_diff,
        CommandCategory::History
    ),
    git!(
        "show",
        &[],
        "Show a commit",
        "git show [<commit>]",
        SHOW_FLAGS,
        history::handle_show,
        CommandCategory::History
    ),
    git!(
        "tag",
        &[],
        "Create, list or delete tags",
        "git tag [-a] [-m <msg>] <name> [<commit>] | git tag -d <name>",
        TAG_FLAGS,
        history::handle_tag,
        CommandCategory::History
    ),
    git!(
        "blame",
        &[],
        "Show what revision last modified each line of a file",
        "git blame <file>",
        &[],
        history::handle_blame,
        CommandCategory::History
    ),
    git!(
        "bisect",
        &[],
        "Use binary search to find the commit that introduced a bug",
        "git bisect (start | good [<rev>] | bad [<rev>] | reset)",
        &[],
        history::handle_bisect,
        CommandCategory::History
    ),
    git!(
        "reflog",
        &[],
        "Show the history of HEAD movements",
        "git reflog [-n <count>]",
        REFLOG_FLAGS,
        history::handle_reflog,
        CommandCategory::History
    ),
    // Branching
    git!(
        "branch",
        &[],
        "List, create, rename or delete branches",
        "git branch [-a] | git branch <name> | git branch -d <name> | git branch -m <old> <new>",
        BRANCH_FLAGS,
        branching::handle_branch,
        CommandCategory::Branching
    ),
    CommandDef {
        blocked_during_rebase: true,
        blocked_during_conflict: true,
        ..git!(
            "checkout",
            &[],
            "Switch branches or restore working tree files",
            "git checkout [-b] <branch> | git checkout <commit> | git checkout -- <file>",
            CHECKOUT_FLAGS,
            branching::handle_checkout,
            CommandCategory::Branching
        )
    },
    CommandDef {
        blocked_during_rebase: true,
        blocked_during_conflict: true,
        ..git!(
            "switch",
            &[],
            "Switch branches",
            "git switch [-c] <branch>",
            SWITCH_FLAGS,
            branching::handle_switch,
            CommandCategory::Branching
        )
    },
    CommandDef {
        blocked_during_rebase: true,
        blocked_during_conflict: true,
        ..git!(
            "merge",
            &[],
            "Join two development histories together",
            "git merge [--no-ff] <branch> | git merge --abort",
            MERGE_FLAGS,
            branching::handle_merge,
            CommandCategory::Branching
        )
    },
    // Rewrite
    CommandDef {
        blocked_during_conflict: true,
        ..git!(
            "rebase",
            &[],
            "Reapply commits on top of another base tip",
            "git rebase <branch> | git rebase -i <HEAD~n | branch> | git rebase (--continue | --abort)",
            REBASE_FLAGS,
            rewrite::handle_rebase,
            CommandCategory::Rewrite
        )
    },
    CommandDef {
        blocked_during_rebase: true,
        blocked_during_conflict: true,
        ..git!(
            "cherry-pick",
            &[],
            "Apply the changes introduced by an existing commit",
            "git cherry-pick <commit>",
            &[],
            rewrite::handle_cherry_pick,
            CommandCategory::Rewrite
        )
    },
    CommandDef {
        blocked_during_rebase: true,
        blocked_during_conflict: true,
        ..git!(
            "revert",
            &[],
            "Revert an existing commit",
            "git revert <commit>",
            REVERT_FLAGS,
            rewrite::handle_revert,
            CommandCategory::Rewrite
        )
    },
    // Stash
    CommandDef {
        blocked_during_rebase: true,
        ..git!(
            "stash",
            &[],
            "Stash the changes in a dirty working directory away",
            "git stash [push [-m <msg>] [-u] | list | pop | apply | drop | show | clear]",
            STASH_FLAGS,
            stash::handle_stash,
            CommandCategory::Stash
        )
    },
    // Remote
    git!(
        "remote",
        &[],
        "Manage set of tracked repositories",
        "git remote [-v] | git remote add <name> <url> | git remote remove <name>",
        REMOTE_FLAGS,
        remote::handle_remote,
        CommandCategory::Remote
    ),
    git!(
        "fetch",
        &[],
        "Download objects and refs from another repository",
        "git fetch [<remote>]",
        FETCH_FLAGS,
        remote::handle_fetch,
        CommandCategory::Remote
    ),
    CommandDef {
        blocked_during_rebase: true,
        blocked_during_conflict: true,
        ..git!(
            "pull",
            &[],
            "Fetch from and integrate with another repository",
            "git pull [--rebase] [<remote> [<branch>]]",
            PULL_FLAGS,
            remote::handle_pull,
            CommandCategory::Remote
        )
    },
    git!(
        "push",
        &[],
        "Update remote refs along with associated objects",
        "git push [-u] [--force | --force-with-lease] [<remote> [<branch>]]",
        PUSH_FLAGS,
        remote::handle_push,
        CommandCategory::Remote
    ),
    // Auxiliary
    git!(
        "worktree",
        &[],
        "Manage multiple working trees",
        "git worktree (add <path> [<branch>] | list | remove <path>)",
        &[],
        auxiliary::handle_worktree,
        CommandCategory::Auxiliary
    ),
    git!(
        "submodule",
        &[],
        "Initialize, update or inspect submodules",
        "git submodule (add <url> [<path>] | status | update)",
        &[],
        auxiliary::handle_submodule,
        CommandCategory::Auxiliary
    ),
    CommandDef {
        requires_repo: false,
        ..git!(
            "config",
            &[],
            "Get and set repository options",
            "git config <key> [<value>] | git config --list",
            CONFIG_FLAGS,
            auxiliary::handle_config,
            CommandCategory::Auxiliary
        )
    },
    CommandDef {
        requires_repo: false,
        ..git!(
            "help",
            &[],
            "Display help information",
            "git help",
            &[],
            auxiliary::handle_help,
            CommandCategory::Auxiliary
        )
    },
    CommandDef {
        requires_repo: false,
        ..git!(
            "--version",
            &["version"],
            "Print the Git version",
            "git --version",
            &[],
            auxiliary::handle_version,
            CommandCategory::Auxiliary
        )
    },
    // Shell
    shell!("ls", "List directory contents", "ls [-a]", LS_FLAGS, shell::handle_ls),
    shell!("cat", "Print file contents", "cat <file>...", &[], shell::handle_cat),
    shell!("pwd", "Print the working directory", "pwd", &[], shell::handle_pwd),
    shell!(
        "echo",
        "Print text, or write it to a file with > or >>",
        "echo <text> [> <file> | >> <file>]",
        &[],
        shell::handle_echo
    ),
    shell!("touch", "Create an empty file", "touch <file>...", &[], shell::handle_touch),
    shell!("rm", "Remove files", "rm [-r] <file>...", RM_FLAGS, shell::handle_rm),
    shell!("mkdir", "Create a directory", "mkdir [-p] <dir>...", MKDIR_FLAGS, shell::handle_mkdir),
    shell!("clear", "Clear the terminal", "clear", &[], shell::handle_clear),
    shell!("help", "Show available commands", "help", &[], shell::handle_help),
];

/// Finds a command definition by program and name or alias.
pub fn find(program: Program, name: &str) -> Option<&'static CommandDef> {
    COMMANDS.iter().find(|c| {
        c.program == program && (c.name == name || c.aliases.iter().any(|a| *a == name))
    })
}

/// Commands belonging to one category, in table order.
pub fn commands_in(category: CommandCategory) -> impl Iterator<Item = &'static CommandDef> {
    COMMANDS.iter().filter(move |c| c.category == category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_command() {
        assert!(find(Program::Git, "commit").is_some());
        assert!(find(Program::Git, "version").is_some()); // alias
        assert!(find(Program::Shell, "ls").is_some());
        assert!(find(Program::Shell, "commit").is_none());
        assert!(find(Program::Git, "comit").is_none());
    }

    #[test]
    fn test_repo_free_commands() {
        let free: Vec<&str> = COMMANDS
            .iter()
            .filter(|c| c.program == Program::Git && !c.requires_repo)
            .map(|c| c.name)
            .collect();
        assert_eq!(free, vec!["init", "clone", "config", "help", "--version"]);
    }

    #[test]
    fn test_rebase_gating_table() {
        let blocked: Vec<&str> = COMMANDS
            .iter()
            .filter(|c| c.blocked_during_rebase)
            .map(|c| c.name)
            .collect();
        for name in [
            "commit", "merge", "cherry-pick", "revert", "reset", "pull", "checkout", "switch",
            "stash",
        ] {
            assert!(blocked.contains(&name), "{name} should be blocked");
        }
        assert!(!blocked.contains(&"status"));
    }

    #[test]
    fn test_names_are_unique() {
        let mut seen = std::collections::BTreeSet::new();
        for cmd in COMMANDS {
            assert!(seen.insert((cmd.program == Program::Git, cmd.name)));
        }
    }

    #[test]
    fn test_category_display_name() {
        assert_eq!(CommandCategory::Shell.display_name(), "Shell commands");
        assert!(commands_in(CommandCategory::Remote).any(|c| c.name == "push"));
    }
}
