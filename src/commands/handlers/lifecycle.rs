//! Repository lifecycle handlers (`init`, `status`).

use std::collections::BTreeSet;

use super::{plural, CommandContext, HandlerResult};
use crate::commands::args::Args;
use crate::repo::history::exclusive_commits;
use crate::repo::{short, Head};

/// Handle `git init`.
pub fn handle_init(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let workdir = ctx.settings.workdir.clone();
    let quiet = args.has("quiet");
    if ctx.state.initialized {
        if !quiet {
            ctx.out
                .output(format!("Reinitialized existing Git repository in {workdir}/.git/"));
        }
        return Ok(());
    }

    let branch = args
        .value("initial-branch")
        .unwrap_or(ctx.default_branch())
        .to_string();
    ctx.state.initialized = true;
    ctx.state.branches = BTreeSet::from([branch.clone()]);
    ctx.state.current_branch = branch;
    ctx.state.head = Head::Attached;
    if !quiet {
        ctx.out
            .success(format!("Initialized empty Git repository in {workdir}/.git/"));
    }
    Ok(())
}

/// Handle `git status`.
pub fn handle_status(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    if args.has("short") {
        short_status(ctx);
        return Ok(());
    }

    let state = &ctx.state;
    let mut lines: Vec<String> = Vec::new();

    match (&state.head, state.head_commit()) {
        (Head::Detached { hash }, _) => lines.push(format!("HEAD detached at {}", short(hash))),
        _ => lines.push(format!("On branch {}", state.current_branch)),
    }

    if let Some(rebase) = state.session.rebase() {
        lines.push(format!(
            "interactive rebase in progress; onto {}",
            rebase.onto.last().map(|c| c.short_hash()).unwrap_or("root")
        ));
        lines.push("  (use \"git rebase --continue\" once you are satisfied with your changes)".into());
        lines.push("  (use \"git rebase --abort\" to check out the original branch)".into());
        lines.push(String::new());
    }

    if let Some(tracking) = tracking_summary(ctx) {
        lines.extend(tracking);
        lines.push(String::new());
    }

    let state = &ctx.state;
    if state.commits.is_empty() {
        lines.push(String::new());
        lines.push("No commits yet".into());
        lines.push(String::new());
    }

    let conflict = state.session.conflict();
    if let Some(conflict) = conflict {
        lines.push("You have unmerged paths.".into());
        lines.push("  (fix conflicts and run \"git commit\")".into());
        lines.push("  (use \"git merge --abort\" to abort the merge)".into());
        lines.push(String::new());
        lines.push("Unmerged paths:".into());
        lines.push("  (use \"git add <file>...\" to mark resolution)".into());
        lines.push(format!("\tboth modified:   {}", conflict.file));
        lines.push(String::new());
    } else if state.merge_in_progress.is_some() {
        lines.push("All conflicts fixed but you are still merging.".into());
        lines.push("  (use \"git commit\" to conclude merge)".into());
        lines.push(String::new());
    }

    let conflicted = conflict.map(|c| c.file.as_str());
    let mut sets = state.status_sets();
    sets.modified.retain(|p| Some(p.as_str()) != conflicted);
    sets.staged.retain(|p| Some(p.as_str()) != conflicted);

    if !sets.staged.is_empty() {
        lines.push("Changes to be committed:".into());
        lines.push("  (use \"git restore --staged <file>...\" to unstage)".into());
        for path in &sets.staged {
            let label = if state.files.contains_key(path) {
                "modified:"
            } else {
                "new file:"
            };
            lines.push(format!("\t{label}   {path}"));
        }
        lines.push(String::new());
    }

    if !sets.modified.is_empty() {
        lines.push("Changes not staged for commit:".into());
        lines.push("  (use \"git add <file>...\" to update what will be committed)".into());
        lines.push(
            "  (use \"git restore <file>...\" to discard changes in working directory)".into(),
        );
        for path in &sets.modified {
            lines.push(format!("\tmodified:   {path}"));
        }
        lines.push(String::new());
    }

    if !sets.untracked.is_empty() {
        lines.push("Untracked files:".into());
        lines.push("  (use \"git add <file>...\" to include in what will be committed)".into());
        for path in &sets.untracked {
            lines.push(format!("\t{path}"));
        }
        lines.push(String::new());
    }

    if conflict.is_none() {
        if sets.is_clean() {
            if state.commits.is_empty() {
                lines.push("nothing to commit (create/copy files and use \"git add\" to track)".into());
            } else {
                lines.push("nothing to commit, working tree clean".into());
            }
        } else if sets.staged.is_empty() && !sets.modified.is_empty() {
            lines.push(
                "no changes added to commit (use \"git add\" and/or \"git commit -a\")".into(),
            );
        } else if sets.staged.is_empty() {
            lines.push(
                "nothing added to commit but untracked files present (use \"git add\" to track)"
                    .into(),
            );
        }
    }

    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    ctx.out.output(lines.join("\n"));
    Ok(())
}

/// `git status -s`.
fn short_status(ctx: &mut CommandContext<'_>) {
    let state = &ctx.state;
    let conflicted = state.session.conflict().map(|c| c.file.clone());
    let modified: BTreeSet<String> = state.modified_paths().into_iter().collect();
    let mut rows = Vec::new();

    for path in state.visible_paths() {
        if Some(&path) == conflicted.as_ref() {
            rows.push(format!("UU {path}"));
            continue;
        }
        let index = if state.staged_files.contains_key(&path) {
            if state.files.contains_key(&path) {
                'M'
            } else {
                'A'
            }
        } else {
            ' '
        };
        let work = if modified.contains(&path) { 'M' } else { ' ' };
        if index != ' ' || work != ' ' {
            rows.push(format!("{index}{work} {path}"));
        } else if !state.is_tracked(&path) {
            rows.push(format!("?? {path}"));
        }
    }

    for row in rows {
        ctx.out.output(row);
    }
}

/// Upstream comparison lines (`Your branch is ahead of ...`).
fn tracking_summary(ctx: &CommandContext<'_>) -> Option<Vec<String>> {
    let state = &ctx.state;
    if state.detached_head() {
        return None;
    }
    let upstream = state
        .upstreams
        .get(&state.current_branch)
        .cloned()
        .or_else(|| {
            let guess = format!("origin/{}", state.current_branch);
            state.remote_branches.contains_key(&guess).then_some(guess)
        })?;

    let remote = ctx.branch_history(&upstream).unwrap_or_default();
    let ahead = exclusive_commits(&state.commits, &remote).len();
    let behind = exclusive_commits(&remote, &state.commits).len();

    let lines = if state.diverged || (ahead > 0 && behind > 0) {
        vec![
            format!("Your branch and '{upstream}' have diverged,"),
            format!(
                "and have {} and {} different commits each, respectively.",
                ahead.max(1),
                behind.max(1)
            ),
            "  (use \"git pull\" to merge the remote branch into yours)".to_string(),
        ]
    } else if ahead > 0 {
        vec![
            format!("Your branch is ahead of '{upstream}' by {}.", plural(ahead, "commit")),
            "  (use \"git push\" to publish your local commits)".to_string(),
        ]
    } else if behind > 0 {
        vec![
            format!(
                "Your branch is behind '{upstream}' by {}, and can be fast-forwarded.",
                plural(behind, "commit")
            ),
            "  (use \"git pull\" to update your local branch)".to_string(),
        ]
    } else {
        vec![format!("Your branch is up to date with '{upstream}'.")]
    };
    Some(lines)
}
