//! Help text generated from the command table.

use super::definitions::{commands_in, CommandCategory, Program};

/// Usage banner printed by a bare `git`.
pub const GIT_USAGE: &str = "usage: git [--version] [--help] <command> [<args>]";

/// Full help listing, grouped by category.
pub fn generate_help_text() -> String {
    let category_blocks = CommandCategory::ALL
        .iter()
        .filter_map(|category| {
            let cmds: Vec<_> = commands_in(*category).collect();
            if cmds.is_empty() {
                return None;
            }

            let command_lines = cmds
                .iter()
                .map(|cmd| {
                    let name = match cmd.program {
                        Program::Git => format!("git {}", cmd.name),
                        Program::Shell => cmd.name.to_string(),
                    };
                    format!("  {name:<18} {}\n", cmd.description)
                })
                .collect::<Vec<_>>()
                .join("");

            Some(format!("{}:\n{}\n", category.display_name(), command_lines))
        })
        .collect::<Vec<_>>()
        .join("");

    let sessions = [
        "While a merge conflict is open:",
        "  edit the file in the conflict editor, then 'git add <file>' and 'git commit'",
        "While an interactive rebase is open:",
        "  edit the todo list, then 'git rebase --continue' or 'git rebase --abort'",
    ]
    .join("\n");

    format!("{category_blocks}{sessions}")
}

/// Short overview printed by a bare `git` or `git help`.
pub fn git_overview() -> String {
    let common = ["init", "clone", "add", "status", "commit", "log", "branch", "switch", "merge", "push", "pull"];
    let mut lines = vec![GIT_USAGE.to_string(), String::new()];
    lines.push("These are common Git commands:".to_string());
    for name in common {
        if let Some(cmd) = super::definitions::find(Program::Git, name) {
            lines.push(format!("   {:<11}{}", cmd.name, cmd.description));
        }
    }
    lines.push(String::new());
    lines.push("Type 'help' for every command the terminal understands.".to_string());
    lines.join("\n")
}
