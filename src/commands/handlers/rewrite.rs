//! History-rewriting handlers (`rebase`, `cherry-pick`, `revert`).
//!
//! Every commit these handlers produce draws a fresh hash, including
//! commits that are carried over unchanged by a rebase.

use super::branching::sync_clean_paths;
use super::staging::record_commit;
use super::{required, CommandContext, HandlerResult};
use crate::commands::args::Args;
use crate::commands::output::SessionDirective;
use crate::error::CommandError;
use crate::repo::diff::{self, DiffStat};
use crate::repo::history::{exclusive_commits, head_history, parse_relative, transition_files};
use crate::repo::{Commit, FileMap};
use crate::session::{ActiveSession, RebaseSession};

/// Handle `git rebase`.
pub fn handle_rebase(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    if args.has("continue") {
        return continue_rebase(ctx);
    }
    if args.has("abort") {
        return abort_rebase(ctx);
    }
    if ctx.state.rebase_in_progress() {
        return Err(CommandError::fatal(
            "It seems that there is already a rebase-merge directory.\n\
             hint: Use \"git rebase --continue\" or \"git rebase --abort\".",
        ));
    }

    let target = required(args, 0, "git rebase [-i] <upstream>")?;
    if args.has("interactive") {
        return open_interactive(ctx, target);
    }

    let theirs = ctx
        .branch_history(target)
        .ok_or_else(|| CommandError::fatal(format!("invalid upstream '{target}'")))?;
    rebase_onto(ctx, target, theirs);
    Ok(())
}

/// Replays the current branch's own commits on top of `theirs`.
fn rebase_onto(ctx: &mut CommandContext<'_>, target: &str, theirs: Vec<Commit>) {
    let ours = ctx.state.commits.clone();
    let mine = exclusive_commits(&ours, &theirs);
    let missing = exclusive_commits(&theirs, &ours);

    let branch = ctx.state.current_branch.clone();
    if missing.is_empty() {
        ctx.out
            .output(format!("Current branch {branch} is up to date."));
        return;
    }

    let mut rebuilt = theirs;
    for commit in mine {
        rebuilt.push(Commit {
            hash: ctx.fresh_hash(),
            ..commit
        });
    }
    install_history(ctx, rebuilt);
    ctx.out
        .success(format!("Successfully rebased and updated refs/heads/{branch}."));
    tracing::debug!(%branch, upstream = target, "rebased");
}

/// Replaces the current lineage, transitioning committed files.
fn install_history(ctx: &mut CommandContext<'_>, history: Vec<Commit>) {
    let before = ctx.state.files.clone();
    transition_files(&mut ctx.state.files, &ctx.state.commits, &history);
    ctx.state.commits = history;
    sync_clean_paths(&mut ctx.state, &before);
    if let Some(tip) = ctx.state.commits.last().map(|c| c.hash.clone()) {
        let branch = ctx.state.current_branch.clone();
        ctx.state
            .record_reflog(tip, "rebase (finish)", format!("returning to refs/heads/{branch}"));
    }
}

fn open_interactive(ctx: &mut CommandContext<'_>, target: &str) -> HandlerResult {
    let commits = ctx.state.commits.clone();

    let (window, onto) = match parse_relative(target) {
        Some(n) => {
            if n > commits.len() {
                return Err(CommandError::fatal(format!("invalid upstream '{target}'")));
            }
            let split = commits.len() - n;
            (commits[split..].to_vec(), commits[..split].to_vec())
        }
        None => {
            let theirs = ctx
                .branch_history(target)
                .ok_or_else(|| CommandError::fatal(format!("invalid upstream '{target}'")))?;
            (exclusive_commits(&commits, &theirs), theirs)
        }
    };

    if window.is_empty() {
        ctx.out.output(format!(
            "Current branch {} is up to date.",
            ctx.state.current_branch
        ));
        return Ok(());
    }

    let base = onto.last().map(|c| c.hash.clone());
    let session = RebaseSession::open(window, onto, base, target);
    ctx.directive = Some(SessionDirective::OpenRebase {
        commits: session.commits.clone(),
        todo_text: session.todo.clone(),
    });
    ctx.out.system(format!(
        "Opened the rebase todo list for {}. Edit it, then run 'git rebase --continue' (or 'git rebase --abort').",
        super::plural(session.commits.len(), "commit")
    ));
    tracing::info!(commits = session.commits.len(), target, "interactive rebase opened");
    ctx.state.session = ActiveSession::InteractiveRebase(session);
    Ok(())
}

fn continue_rebase(ctx: &mut CommandContext<'_>) -> HandlerResult {
    let Some(session) = ctx.state.session.rebase().cloned() else {
        return Err(CommandError::fatal("No rebase in progress?"));
    };

    let (lines, skipped) = session.parse_todo();
    for line in skipped {
        ctx.out
            .warning(format!("warning: ignoring unrecognized todo line: {line}"));
    }

    let replayed = RebaseSession::replay(&lines, || ctx.fresh_hash());
    let mut history = session.onto;
    history.extend(replayed);

    ctx.state.session = ActiveSession::None;
    ctx.directive = Some(SessionDirective::CloseSession);
    install_history(ctx, history);
    ctx.out.success(format!(
        "Successfully rebased and updated refs/heads/{}.",
        ctx.state.current_branch
    ));
    tracing::info!(applied = lines.len(), "interactive rebase finished");
    Ok(())
}

fn abort_rebase(ctx: &mut CommandContext<'_>) -> HandlerResult {
    if !ctx.state.rebase_in_progress() {
        return Err(CommandError::fatal("No rebase in progress?"));
    }
    ctx.state.session = ActiveSession::None;
    ctx.directive = Some(SessionDirective::CloseSession);
    tracing::info!("interactive rebase aborted");
    Ok(())
}

/// Total line change from `before` to `after` for the touched paths.
fn change_stat(before: &FileMap, touched: &FileMap) -> (usize, DiffStat) {
    let mut total = DiffStat::default();
    let mut files = 0;
    for (path, content) in touched {
        let old = before.get(path).map(String::as_str).unwrap_or("");
        if before.get(path) != Some(content) {
            files += 1;
            total.add(diff::stat(old, content));
        }
    }
    (files, total)
}

fn commit_label(ctx: &CommandContext<'_>) -> String {
    if ctx.state.detached_head() {
        "detached HEAD".to_string()
    } else {
        ctx.state.current_branch.clone()
    }
}

/// Handle `git cherry-pick`.
pub fn handle_cherry_pick(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let rev = required(args, 0, "git cherry-pick <commit>")?;
    let picked = ctx
        .resolve_commit(rev)
        .ok_or_else(|| CommandError::fatal(format!("bad revision '{rev}'")))?;

    if head_history(&ctx.state).iter().any(|c| c.hash == picked.hash) {
        return Err(CommandError::usage(format!(
            "On branch {}\n\
             The previous cherry-pick is now empty, possibly due to conflict resolution.",
            ctx.state.current_branch
        )));
    }

    let (files, stat) = change_stat(&ctx.state.files, &picked.files);
    let commit = Commit {
        hash: ctx.fresh_hash(),
        branch: ctx.state.current_branch.clone(),
        ..picked
    };
    let before = ctx.state.files.clone();
    ctx.state.files.extend(commit.files.clone());
    sync_clean_paths(&mut ctx.state, &before);

    ctx.out.success(format!(
        "[{} {}] {}",
        commit_label(ctx),
        commit.short_hash(),
        commit.subject()
    ));
    ctx.out.output(diff::summary_line(files, stat));
    ctx.state.record_reflog(
        commit.hash.clone(),
        "cherry-pick",
        commit.subject().to_string(),
    );
    record_commit(ctx, commit);
    Ok(())
}

/// Handle `git revert`.
pub fn handle_revert(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let rev = required(args, 0, "git revert <commit>")?;
    let target = ctx
        .resolve_commit(rev)
        .filter(|c| head_history(&ctx.state).iter().any(|h| h.hash == c.hash))
        .ok_or_else(|| CommandError::fatal(format!("bad revision '{rev}'")))?;

    let commit = Commit {
        hash: ctx.fresh_hash(),
        message: format!(
            "Revert \"{}\"\n\nThis reverts commit {}.",
            target.subject(),
            target.hash
        ),
        files: FileMap::new(),
        branch: ctx.state.current_branch.clone(),
        author: Some(ctx.author()),
    };

    ctx.out.success(format!(
        "[{} {}] {}",
        commit_label(ctx),
        commit.short_hash(),
        commit.subject()
    ));
    ctx.out.output(diff::summary_line(0, DiffStat::default()));
    ctx.state
        .record_reflog(commit.hash.clone(), "revert", commit.subject().to_string());
    record_commit(ctx, commit);
    Ok(())
}
