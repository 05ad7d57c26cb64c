//! Staging and commit handlers (`add`, `restore`, `reset`, `commit`).

use super::{CommandContext, HandlerResult};
use crate::commands::args::Args;
use crate::commands::output::SessionDirective;
use crate::error::CommandError;
use crate::repo::diff::{self, DiffStat};
use crate::repo::history::{
    parse_relative, split_remote_ref, transition_files, DETACHED_LINEAGE,
};
use crate::repo::{Commit, Head, RepositoryState};
use crate::session::ActiveSession;

/// Handle `git add`.
pub fn handle_add(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let everything = args.has("all") || args.positionals.iter().any(|p| p == "." || p == "*");
    let update = args.has("update");

    if !everything && !update && args.positionals.is_empty() {
        return Err(CommandError::usage(
            "Nothing specified, nothing added.\nhint: Maybe you wanted to say 'git add .'?",
        ));
    }

    let conflict_file = ctx.state.session.conflict().map(|c| c.file.clone());
    if let Some(file) = &conflict_file {
        if everything || args.positionals.iter().any(|p| p == file) {
            resolve_conflict(ctx);
        }
    }

    if everything {
        let pending: Vec<(String, String)> = ctx
            .state
            .working_directory
            .iter()
            .filter(|(path, content)| ctx.state.index_content(path) != Some(*content))
            .map(|(p, c)| (p.clone(), c.clone()))
            .collect();
        ctx.state.staged_files.extend(pending);
        return Ok(());
    }

    if update {
        let modified = ctx.state.modified_paths();
        stage_paths(&mut ctx.state, modified);
        return Ok(());
    }

    for path in &args.positionals {
        if Some(path) == conflict_file.as_ref() {
            continue;
        }
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let matched: Vec<String> = ctx
            .state
            .working_directory
            .keys()
            .filter(|p| *p == path || p.starts_with(&prefix))
            .cloned()
            .collect();

        if matched.is_empty() {
            if !ctx.state.is_tracked(path) {
                ctx.out
                    .error(format!("fatal: pathspec '{path}' did not match any files"));
            }
            continue;
        }
        stage_paths(&mut ctx.state, matched);
    }
    Ok(())
}

/// Copies working content into the index for paths that differ from it.
fn stage_paths(state: &mut RepositoryState, paths: Vec<String>) {
    for path in paths {
        let Some(content) = state.working_directory.get(&path).cloned() else {
            continue;
        };
        if state.index_content(&path) != Some(&content) {
            state.staged_files.insert(path, content);
        }
    }
}

/// Consumes the conflict session's resolution buffer.
fn resolve_conflict(ctx: &mut CommandContext<'_>) {
    let Some(session) = ctx.state.session.conflict().cloned() else {
        return;
    };
    ctx.state.session = ActiveSession::None;

    if session.has_markers() {
        ctx.out.warning(format!(
            "warning: {} still contains conflict markers",
            session.file
        ));
    }
    ctx.state
        .working_directory
        .insert(session.file.clone(), session.resolved.clone());
    ctx.state
        .staged_files
        .insert(session.file.clone(), session.resolved);
    ctx.directive = Some(SessionDirective::CloseSession);
    tracing::info!(file = %session.file, "conflict resolved");
}

/// Handle `git restore`.
pub fn handle_restore(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    if args.positionals.is_empty() {
        return Err(CommandError::fatal("you must specify path(s) to restore"));
    }

    let staged = args.has("staged");
    // `--staged` alone leaves the working tree; `--worktree` adds it back.
    let worktree = !staged || args.has("worktree");
    for path in &args.positionals {
        let targets: Vec<String> = if path == "." {
            let mut all: Vec<String> = Vec::new();
            if staged {
                all.extend(ctx.state.staged_files.keys().cloned());
            }
            if worktree {
                for p in ctx.state.modified_paths() {
                    if !all.contains(&p) {
                        all.push(p);
                    }
                }
            }
            all
        } else {
            vec![path.clone()]
        };

        for target in targets {
            if staged {
                let unstaged = ctx.state.staged_files.remove(&target).is_some();
                if !unstaged && !ctx.state.is_tracked(&target) {
                    return Err(CommandError::error(format!(
                        "pathspec '{target}' did not match any file(s) known to git"
                    )));
                }
                if !worktree {
                    continue;
                }
                if !ctx.state.is_tracked(&target) {
                    // A new file leaves both the index and the working tree.
                    ctx.state.working_directory.remove(&target);
                    continue;
                }
            }

            match ctx.state.index_content(&target).cloned() {
                Some(content) => {
                    ctx.state.working_directory.insert(target, content);
                }
                None => {
                    return Err(CommandError::error(format!(
                        "pathspec '{target}' did not match any file(s) known to git"
                    )))
                }
            }
        }
    }
    Ok(())
}

/// How far `git reset` rewinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResetMode {
    Soft,
    Mixed,
    Hard,
}

/// Handle `git reset`.
pub fn handle_reset(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let mode = if args.has("hard") {
        ResetMode::Hard
    } else if args.has("soft") {
        ResetMode::Soft
    } else {
        ResetMode::Mixed
    };

    let first = args.positional(0);
    let rev_distance = first.and_then(|rev| commit_distance(&ctx.state, rev));

    // `reset <path>` / `reset HEAD <path>` / `reset -- <path>`
    let paths: Vec<String> = match (first, rev_distance) {
        (Some(_), None) => args.positionals.clone(),
        (Some(_), Some(_)) if args.positionals.len() > 1 => args.rest().to_vec(),
        _ => Vec::new(),
    };
    if !paths.is_empty() || (args.separator && first.is_some()) {
        if mode != ResetMode::Mixed {
            return Err(CommandError::fatal(format!(
                "Cannot do {} reset with paths.",
                if mode == ResetMode::Hard { "hard" } else { "soft" }
            )));
        }
        if args.has("mixed") {
            ctx.out.warning(
                "warning: --mixed with paths is deprecated; use 'git reset -- <paths>' instead.",
            );
        }
        return unstage(ctx, &paths);
    }

    let distance = match (first, rev_distance) {
        (None, _) => 0,
        (Some(_), Some(n)) => n,
        (Some(rev), None) => {
            return Err(CommandError::fatal(format!(
                "ambiguous argument '{rev}': unknown revision or path not in the working tree."
            )))
        }
    };

    let len = ctx.state.commits.len();
    if distance > 0 && distance >= len {
        let rev = first.unwrap_or("HEAD");
        return Err(CommandError::fatal(format!(
            "ambiguous argument '{rev}': unknown revision or path not in the working tree."
        )));
    }

    let old = ctx.state.commits.clone();
    let popped = ctx.state.commits.split_off(len - distance);
    let kept = ctx.state.commits.clone();
    transition_files(&mut ctx.state.files, &old, &kept);

    match mode {
        ResetMode::Soft => {
            for commit in &popped {
                ctx.state.staged_files.extend(commit.files.clone());
            }
        }
        ResetMode::Mixed => {
            let mut unstaged: Vec<String> = ctx.state.staged_files.keys().cloned().collect();
            for commit in &popped {
                ctx.state.working_directory.extend(commit.files.clone());
                unstaged.extend(commit.files.keys().cloned());
            }
            ctx.state.staged_files.clear();
            unstaged.sort();
            unstaged.dedup();
            if !unstaged.is_empty() {
                ctx.out.output("Unstaged changes after reset:");
                for path in unstaged {
                    ctx.out.output(format!("M\t{path}"));
                }
            }
        }
        ResetMode::Hard => {
            ctx.state.staged_files.clear();
            ctx.state.working_directory.clear();
        }
    }

    let target = first.unwrap_or("HEAD").to_string();
    if let Some(head) = ctx.state.commits.last().cloned() {
        ctx.state.record_reflog(
            head.hash.clone(),
            "reset",
            format!("moving to {target}"),
        );
        if mode == ResetMode::Hard {
            ctx.out.warning(format!(
                "HEAD is now at {} {}",
                head.short_hash(),
                head.subject()
            ));
        }
    }
    tracing::debug!(?mode, distance, "reset");
    Ok(())
}

/// Number of commits between HEAD and `rev` on the current lineage.
fn commit_distance(state: &RepositoryState, rev: &str) -> Option<usize> {
    if let Some(n) = parse_relative(rev) {
        return Some(n);
    }
    let pos = state.commits.iter().rposition(|c| c.matches(rev))?;
    Some(state.commits.len() - 1 - pos)
}

fn unstage(ctx: &mut CommandContext<'_>, paths: &[String]) -> HandlerResult {
    for path in paths {
        if ctx.state.staged_files.remove(path).is_none() && !ctx.state.is_tracked(path) {
            return Err(CommandError::fatal(format!(
                "ambiguous argument '{path}': unknown revision or path not in the working tree."
            )));
        }
    }
    Ok(())
}

/// Handle `git commit`.
pub fn handle_commit(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    if ctx.state.session.conflict().is_some() {
        return Err(CommandError::usage(
            "error: Committing is not possible because you have unmerged files.\n\
             hint: Fix them up in the work tree, and then use 'git add/rm <file>'\n\
             hint: as appropriate to mark resolution and make a commit.\n\
             fatal: Exiting because of an unresolved conflict.",
        ));
    }

    if args.has("all") {
        let modified = ctx.state.modified_paths();
        stage_paths(&mut ctx.state, modified);
    }

    let message = {
        let parts: Vec<&str> = args
            .values("message")
            .iter()
            .map(String::as_str)
            .filter(|m| !m.trim().is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join("\n\n"))
    };
    let author = args
        .value("author")
        .map(str::to_string)
        .unwrap_or_else(|| ctx.author());

    if args.has("amend") {
        return amend(ctx, message, args.value("author").map(str::to_string));
    }

    let merging = ctx.state.merge_in_progress.clone();
    if ctx.state.staged_files.is_empty() && merging.is_none() {
        return Err(CommandError::usage(nothing_to_commit(ctx)));
    }

    let message = match (message, &merging) {
        (Some(m), _) => m,
        (None, Some(merge)) => format!("Merge branch '{}'", merge.branch),
        (None, None) => {
            return Err(CommandError::usage(
                "Aborting commit due to empty commit message.",
            ))
        }
    };

    let staged = std::mem::take(&mut ctx.state.staged_files);
    let stat = change_stat(&ctx.state, &staged);
    let created: Vec<String> = staged
        .keys()
        .filter(|p| !ctx.state.files.contains_key(*p))
        .cloned()
        .collect();

    let root = ctx.state.commits.is_empty();
    let hash = ctx.fresh_hash();
    let commit = Commit::new(hash.clone(), message, staged.clone(), ctx.state.current_branch.clone())
        .with_author(author);

    ctx.state.files.extend(staged);
    record_commit(ctx, commit.clone());

    let action = match (&merging, root) {
        (Some(_), _) => "commit (merge)",
        (None, true) => "commit (initial)",
        (None, false) => "commit",
    };
    ctx.state
        .record_reflog(hash.clone(), action, commit.subject().to_string());

    if let Some(merge) = ctx.state.merge_in_progress.take() {
        ctx.state.pending_conflicts.remove(&merge.branch);
        if split_remote_ref(&ctx.state, &merge.branch).is_some() {
            ctx.state.diverged = false;
        }
        tracing::info!(branch = %merge.branch, "merge concluded");
    }

    let label = if ctx.state.detached_head() {
        "detached HEAD".to_string()
    } else if root {
        format!("{} (root-commit)", ctx.state.current_branch)
    } else {
        ctx.state.current_branch.clone()
    };
    ctx.out
        .success(format!("[{label} {}] {}", commit.short_hash(), commit.subject()));
    ctx.out.output(diff::summary_line(commit.files.len(), stat));
    for path in created {
        ctx.out.output(format!(" create mode 100644 {path}"));
    }
    Ok(())
}

/// Appends a new commit to whatever HEAD points at.
pub(crate) fn record_commit(ctx: &mut CommandContext<'_>, commit: Commit) {
    if let Head::Detached { hash } = &mut ctx.state.head {
        *hash = commit.hash.clone();
        ctx.state
            .branch_lineages
            .entry(DETACHED_LINEAGE.to_string())
            .or_default()
            .push(commit.hash.clone());
        ctx.state.feature_commits.push(commit);
    } else {
        ctx.state.commits.push(commit);
    }
}

fn amend(
    ctx: &mut CommandContext<'_>,
    message: Option<String>,
    author: Option<String>,
) -> HandlerResult {
    let detached = ctx.state.detached_head();
    let last = if detached {
        // The branch keeps the old tip; only the detached lineage moves.
        let last = ctx.state.head_commit().cloned();
        if let (Some(last), Some(lineage)) =
            (&last, ctx.state.branch_lineages.get_mut(DETACHED_LINEAGE))
        {
            if lineage.last() == Some(&last.hash) {
                lineage.pop();
            }
        }
        last
    } else {
        ctx.state.commits.pop()
    };
    let Some(last) = last else {
        return Err(CommandError::fatal("You have nothing to amend."));
    };

    let staged = std::mem::take(&mut ctx.state.staged_files);
    let stat = change_stat(&ctx.state, &staged);
    let staged_count = staged.len();
    let mut files = last.files.clone();
    files.extend(staged.clone());

    let commit = Commit {
        hash: ctx.fresh_hash(),
        message: message.unwrap_or_else(|| last.message.clone()),
        files,
        branch: last.branch.clone(),
        author: author.or_else(|| last.author.clone()),
    };
    ctx.state.files.extend(staged);
    record_commit(ctx, commit.clone());
    ctx.state.record_reflog(
        commit.hash.clone(),
        "commit (amend)",
        commit.subject().to_string(),
    );

    let label = if detached {
        "detached HEAD"
    } else {
        ctx.state.current_branch.as_str()
    };
    ctx.out.success(format!(
        "[{label} {}] {}",
        commit.short_hash(),
        commit.subject()
    ));
    ctx.out
        .output(diff::summary_line(staged_count, stat));
    Ok(())
}

/// Diffstat of the staged content against the committed tree.
fn change_stat(state: &RepositoryState, staged: &crate::repo::FileMap) -> DiffStat {
    let mut total = DiffStat::default();
    for (path, content) in staged {
        let old = state.files.get(path).map(String::as_str).unwrap_or("");
        total.add(diff::stat(old, content));
    }
    total
}

fn nothing_to_commit(ctx: &CommandContext<'_>) -> String {
    let sets = ctx.state.status_sets();
    let head = if ctx.state.detached_head() {
        format!("HEAD detached at {}", ctx.head_label())
    } else {
        format!("On branch {}", ctx.state.current_branch)
    };
    let tail = if !sets.modified.is_empty() {
        format!(
            "Changes not staged for commit:\n{}\nno changes added to commit (use \"git add\" and/or \"git commit -a\")",
            sets.modified
                .iter()
                .map(|p| format!("\tmodified:   {p}"))
                .collect::<Vec<_>>()
                .join("\n")
        )
    } else if !sets.untracked.is_empty() {
        format!(
            "Untracked files:\n{}\nnothing added to commit but untracked files present (use \"git add\" to track)",
            sets.untracked
                .iter()
                .map(|p| format!("\t{p}"))
                .collect::<Vec<_>>()
                .join("\n")
        )
    } else {
        "nothing to commit, working tree clean".to_string()
    };
    format!("{head}\n{tail}")
}
