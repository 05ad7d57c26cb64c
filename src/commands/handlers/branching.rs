//! Branch handlers (`branch`, `checkout`, `switch`, `merge`).

use super::{required, valid_ref_name, CommandContext, HandlerResult};
use crate::commands::args::Args;
use crate::commands::output::SessionDirective;
use crate::error::CommandError;
use crate::repo::diff::{self, DiffStat};
use crate::repo::history::{
    common_prefix, exclusive_commits, head_history, history_at, looks_like_hash,
    parse_relative, split_remote_ref, switch_lineage, transition_files, DETACHED_LINEAGE,
};
use crate::repo::{Commit, FileMap, Head, MergeInProgress, RepositoryState};
use crate::session::{ActiveSession, ConflictSession};

/// Handle `git branch`.
pub fn handle_branch(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    if args.has("show-current") {
        if !ctx.state.detached_head() {
            ctx.out.output(ctx.state.current_branch.clone());
        }
        return Ok(());
    }

    if args.has("delete") || args.has("force-delete") {
        let force = args.has("force-delete");
        if args.positionals.is_empty() {
            return Err(CommandError::fatal("branch name required"));
        }
        for name in &args.positionals {
            delete_branch(ctx, name, force)?;
        }
        return Ok(());
    }

    if args.has("move") {
        return match args.positionals.as_slice() {
            [new] => {
                let old = ctx.state.current_branch.clone();
                rename_branch(&mut ctx.state, &old, new)
            }
            [old, new] => rename_branch(&mut ctx.state, old, new),
            _ => Err(CommandError::usage("usage: git branch -m [<old>] <new>")),
        };
    }

    match args.positional(0) {
        Some(name) => create_branch(ctx, name, args.positional(1), false),
        None => {
            list_branches(ctx, args);
            Ok(())
        }
    }
}

fn list_branches(ctx: &mut CommandContext<'_>, args: &Args) {
    let verbose = args.has("verbose");
    let describe = |ctx: &CommandContext<'_>, name: &str| -> String {
        if !verbose {
            return String::new();
        }
        ctx.branch_history(name)
            .and_then(|h| h.last().cloned())
            .map(|c| format!(" {} {}", c.short_hash(), c.subject()))
            .unwrap_or_default()
    };

    if !args.has("remotes") {
        if let Head::Detached { hash } = &ctx.state.head {
            ctx.out
                .success(format!("* (HEAD detached at {})", crate::repo::short(hash)));
        }
        let names: Vec<String> = ctx.state.branches.iter().cloned().collect();
        for name in names {
            let suffix = describe(ctx, &name);
            if name == ctx.state.current_branch && !ctx.state.detached_head() {
                ctx.out.success(format!("* {name}{suffix}"));
            } else {
                ctx.out.output(format!("  {name}{suffix}"));
            }
        }
    }

    if args.has("all") || args.has("remotes") {
        let prefix = if args.has("all") { "remotes/" } else { "" };
        let remotes: Vec<String> = ctx.state.remote_branches.keys().cloned().collect();
        for name in remotes {
            ctx.out.output(format!("  {prefix}{name}"));
        }
    }
}

/// Creates `name` at `start` (or HEAD) without switching to it.
pub(crate) fn create_branch(
    ctx: &mut CommandContext<'_>,
    name: &str,
    start: Option<&str>,
    reset: bool,
) -> HandlerResult {
    if !valid_ref_name(name) {
        return Err(CommandError::fatal(format!(
            "'{name}' is not a valid branch name"
        )));
    }
    if ctx.state.branches.contains(name) && !reset {
        return Err(CommandError::fatal(format!(
            "a branch named '{name}' already exists"
        )));
    }
    if reset && name == ctx.state.current_branch && !ctx.state.detached_head() {
        return Err(CommandError::fatal(format!(
            "cannot force update the branch '{name}' used by worktree at '{}'",
            ctx.settings.workdir
        )));
    }

    let history = match start {
        Some(rev) => start_point(ctx, rev).ok_or_else(|| {
            CommandError::fatal(format!("not a valid object name: '{rev}'"))
        })?,
        None => head_history(&ctx.state),
    };
    if history.is_empty() {
        return Err(CommandError::fatal(format!(
            "not a valid object name: '{}'",
            ctx.state.current_branch
        )));
    }

    ctx.state.branches.insert(name.to_string());
    ctx.state.branch_lineages.insert(
        name.to_string(),
        history.iter().map(|c| c.hash.clone()).collect(),
    );
    if let Some(rev) = start {
        if ctx.state.remote_branches.contains_key(rev) {
            ctx.state.upstreams.insert(name.to_string(), rev.to_string());
        }
    }
    tracing::debug!(branch = name, tip = ?history.last().map(|c| &c.hash), "branch created");
    Ok(())
}

/// History ending at a start-point revision.
fn start_point(ctx: &CommandContext<'_>, rev: &str) -> Option<Vec<Commit>> {
    if let Some(n) = parse_relative(rev) {
        let mut history = head_history(&ctx.state);
        let keep = history.len().checked_sub(n)?;
        history.truncate(keep);
        return Some(history);
    }
    if let Some(tag) = ctx.state.tags.get(rev) {
        return history_at(&ctx.state, &tag.hash, ctx.default_branch());
    }
    ctx.branch_history(rev)
        .or_else(|| history_at(&ctx.state, rev, ctx.default_branch()))
}

fn delete_branch(ctx: &mut CommandContext<'_>, name: &str, force: bool) -> HandlerResult {
    if name == ctx.state.current_branch && !ctx.state.detached_head() {
        return Err(CommandError::error(format!(
            "Cannot delete branch '{name}' checked out at '{}'",
            ctx.settings.workdir
        )));
    }
    if let Some(tree) = ctx.state.worktrees.iter().find(|w| w.branch == name) {
        return Err(CommandError::error(format!(
            "Cannot delete branch '{name}' checked out at '{}'",
            tree.path
        )));
    }
    if !ctx.state.branches.contains(name) {
        return Err(CommandError::error(format!("branch '{name}' not found.")));
    }

    let history = ctx.branch_history(name).unwrap_or_default();
    if !force && !exclusive_commits(&history, &head_history(&ctx.state)).is_empty() {
        return Err(CommandError::error(format!(
            "The branch '{name}' is not fully merged.\n\
             hint: If you are sure you want to delete it, run 'git branch -D {name}'"
        )));
    }

    ctx.state.branches.remove(name);
    ctx.state.branch_lineages.remove(name);
    ctx.state.upstreams.remove(name);
    let tip = history
        .last()
        .map(|c| c.short_hash().to_string())
        .unwrap_or_default();
    ctx.out.success(format!("Deleted branch {name} (was {tip})."));
    Ok(())
}

fn rename_branch(state: &mut RepositoryState, old: &str, new: &str) -> HandlerResult {
    if !state.branches.contains(old) {
        return Err(CommandError::error(format!(
            "refname refs/heads/{old} not found"
        )));
    }
    if !valid_ref_name(new) {
        return Err(CommandError::fatal(format!("'{new}' is not a valid branch name")));
    }
    if state.branches.contains(new) {
        return Err(CommandError::fatal(format!(
            "a branch named '{new}' already exists"
        )));
    }

    state.branches.remove(old);
    state.branches.insert(new.to_string());
    if let Some(lineage) = state.branch_lineages.remove(old) {
        state.branch_lineages.insert(new.to_string(), lineage);
    }
    if let Some(upstream) = state.upstreams.remove(old) {
        state.upstreams.insert(new.to_string(), upstream);
    }
    for commit in state.commits.iter_mut().chain(state.feature_commits.iter_mut()) {
        if commit.branch == old {
            commit.branch = new.to_string();
        }
    }
    if state.current_branch == old {
        state.current_branch = new.to_string();
    }
    Ok(())
}

/// Handle `git checkout`.
pub fn handle_checkout(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    if args.separator && !args.has("create") && !args.has("force-create") {
        let paths: Vec<String> = args
            .positionals
            .iter()
            .filter(|p| !(p.as_str() == "HEAD" || ctx.state.branches.contains(p.as_str())))
            .cloned()
            .collect();
        return restore_paths(ctx, &paths);
    }

    if args.has("create") || args.has("force-create") {
        let name = required(args, 0, "git checkout -b <branch> [<start-point>]")?;
        let upstream = match args.positional(1) {
            Some(start) if args.has("track") => {
                let remote = split_remote_ref(&ctx.state, start).is_some()
                    && ctx.state.remote_branches.contains_key(start);
                if !remote && !is_local_branch(&ctx.state, start) {
                    return Err(CommandError::fatal(format!(
                        "cannot set up tracking information; starting point '{start}' is not a branch"
                    )));
                }
                Some(start.to_string())
            }
            None if args.has("track") => {
                return Err(CommandError::fatal(
                    "cannot set up tracking information; starting point 'HEAD' is not a branch",
                ))
            }
            _ => None,
        };
        return create_and_switch(
            ctx,
            name,
            args.positional(1),
            args.has("force-create"),
            upstream,
        );
    }

    let target = required(args, 0, "git checkout <branch> | git checkout -- <file>")?;
    if args.has("track") {
        if split_remote_ref(&ctx.state, target).is_none()
            || !ctx.state.remote_branches.contains_key(target)
        {
            return Err(CommandError::fatal("missing branch name; try -b"));
        }
        return track_remote(ctx, target);
    }
    if args.has("detach") {
        return detach_at(ctx, target);
    }
    if is_local_branch(&ctx.state, target) {
        return switch_to(ctx, target);
    }
    if let Some(remote_ref) = tracking_candidate(&ctx.state, target) {
        return track_remote(ctx, &remote_ref);
    }
    if is_commit_like(ctx, target) {
        return detach_at(ctx, target);
    }
    if ctx.state.index_content(target).is_some() {
        return restore_paths(ctx, &args.positionals);
    }

    Err(CommandError::error(format!(
        "pathspec '{target}' did not match any file(s) known to git"
    )))
}

/// Handle `git switch`.
pub fn handle_switch(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    if args.has("create") || args.has("force-create") {
        let name = required(args, 0, "git switch -c <branch> [<start-point>]")?;
        return create_and_switch(ctx, name, args.positional(1), args.has("force-create"), None);
    }

    let target = required(args, 0, "git switch <branch>")?;
    if args.has("detach") {
        return detach_at(ctx, target);
    }
    if is_local_branch(&ctx.state, target) {
        return switch_to(ctx, target);
    }
    if let Some(remote_ref) = tracking_candidate(&ctx.state, target) {
        return track_remote(ctx, &remote_ref);
    }
    if is_commit_like(ctx, target) {
        return Err(CommandError::fatal(format!(
            "a branch is expected, got commit '{target}'\n\
             hint: If you want to detach HEAD at the commit, try again with the --detach option."
        )));
    }

    Err(CommandError::fatal(format!("invalid reference: {target}")))
}

fn is_local_branch(state: &RepositoryState, name: &str) -> bool {
    state.branches.contains(name) || name == state.current_branch
}

/// The remote-tracking ref a checkout of `target` should track, if any.
fn tracking_candidate(state: &RepositoryState, target: &str) -> Option<String> {
    if split_remote_ref(state, target).is_some() && state.remote_branches.contains_key(target) {
        return Some(target.to_string());
    }
    state
        .remotes
        .keys()
        .map(|remote| format!("{remote}/{target}"))
        .find(|candidate| state.remote_branches.contains_key(candidate))
}

fn is_commit_like(ctx: &CommandContext<'_>, target: &str) -> bool {
    if parse_relative(target).is_some() || ctx.state.tags.contains_key(target) {
        return ctx.resolve_commit(target).is_some();
    }
    looks_like_hash(target)
        && (ctx.state.find_commit(target).is_some()
            || ctx.state.reflog.iter().any(|e| e.hash.starts_with(target)))
}

fn restore_paths(ctx: &mut CommandContext<'_>, paths: &[String]) -> HandlerResult {
    if paths.is_empty() {
        return Err(CommandError::usage("usage: git checkout -- <file>..."));
    }
    for path in paths {
        let Some(content) = ctx.state.index_content(path).cloned() else {
            return Err(CommandError::error(format!(
                "pathspec '{path}' did not match any file(s) known to git"
            )));
        };
        ctx.state.working_directory.insert(path.clone(), content);
    }
    ctx.out
        .output(format!("Updated {} from the index", super::plural(paths.len(), "path")));
    Ok(())
}

fn create_and_switch(
    ctx: &mut CommandContext<'_>,
    name: &str,
    start: Option<&str>,
    reset: bool,
    upstream: Option<String>,
) -> HandlerResult {
    let existed = ctx.state.branches.contains(name);
    create_branch(ctx, name, start, reset)?;
    switch_to_quietly(ctx, name);
    if let Some(remote_ref) = upstream {
        ctx.out
            .output(format!("branch '{name}' set up to track '{remote_ref}'."));
        ctx.state.upstreams.insert(name.to_string(), remote_ref);
    }
    if existed {
        ctx.out.success(format!("Switched to and reset branch '{name}'"));
    } else {
        ctx.out.success(format!("Switched to a new branch '{name}'"));
    }
    Ok(())
}

fn track_remote(ctx: &mut CommandContext<'_>, remote_ref: &str) -> HandlerResult {
    let Some((_, local)) = remote_ref.split_once('/') else {
        return Err(CommandError::fatal(format!("invalid reference: {remote_ref}")));
    };
    let local = local.to_string();
    if !ctx.state.branches.contains(&local) {
        create_branch(ctx, &local, Some(remote_ref), false)?;
    }
    ctx.state
        .upstreams
        .insert(local.clone(), remote_ref.to_string());
    switch_to_quietly(ctx, &local);
    ctx.out
        .output(format!("branch '{local}' set up to track '{remote_ref}'."));
    ctx.out.success(format!("Switched to a new branch '{local}'"));
    Ok(())
}

/// Switches to an existing branch, reporting the move.
fn switch_to(ctx: &mut CommandContext<'_>, name: &str) -> HandlerResult {
    if name == ctx.state.current_branch && !ctx.state.detached_head() {
        ctx.out.output(format!("Already on '{name}'"));
        return Ok(());
    }
    switch_to_quietly(ctx, name);
    ctx.out.success(format!("Switched to branch '{name}'"));
    Ok(())
}

/// Moves HEAD onto `name`, leaving a detached HEAD first if needed.
fn switch_to_quietly(ctx: &mut CommandContext<'_>, name: &str) {
    let from = ctx.head_label();
    let old_files = ctx.state.files.clone();

    if let Head::Detached { hash } = ctx.state.head.clone() {
        let detached = head_history(&ctx.state);
        let commits = ctx.state.commits.clone();
        transition_files(&mut ctx.state.files, &detached, &commits);
        ctx.state.branch_lineages.remove(DETACHED_LINEAGE);
        ctx.state.head = Head::Attached;
        if let Some(commit) = detached.iter().find(|c| c.hash == hash) {
            ctx.out.output(format!(
                "Previous HEAD position was {} {}",
                commit.short_hash(),
                commit.subject()
            ));
        }
    }

    if name != ctx.state.current_branch {
        let history = ctx.branch_history(name).unwrap_or_default();
        switch_lineage(&mut ctx.state, name, history);
    }

    sync_clean_paths(&mut ctx.state, &old_files);
    if let Some(tip) = ctx.state.commits.last().map(|c| c.hash.clone()) {
        ctx.state
            .record_reflog(tip, "checkout", format!("moving from {from} to {name}"));
    }
}

/// Detaches HEAD at a commit, remembering the lineage that leads to it.
fn detach_at(ctx: &mut CommandContext<'_>, rev: &str) -> HandlerResult {
    let commit = ctx
        .resolve_commit(rev)
        .or_else(|| {
            let entry = ctx.state.reflog.iter().rev().find(|e| e.hash.starts_with(rev))?;
            ctx.state.find_commit(&entry.hash).cloned()
        })
        .ok_or_else(|| {
            CommandError::error(format!(
                "pathspec '{rev}' did not match any file(s) known to git"
            ))
        })?;

    let history = match parse_relative(rev) {
        Some(_) => {
            let mut history = head_history(&ctx.state);
            if let Some(pos) = history.iter().rposition(|c| c.hash == commit.hash) {
                history.truncate(pos + 1);
            }
            history
        }
        None => history_at(&ctx.state, &commit.hash, ctx.default_branch())
            .unwrap_or_else(|| vec![commit.clone()]),
    };

    let from = ctx.head_label();
    if let Head::Detached { hash } = &ctx.state.head {
        if let Some(previous) = ctx.state.find_commit(hash) {
            let line = format!(
                "Previous HEAD position was {} {}",
                previous.short_hash(),
                previous.subject()
            );
            ctx.out.output(line);
        }
    }

    let old_files = ctx.state.files.clone();
    let current = head_history(&ctx.state);
    transition_files(&mut ctx.state.files, &current, &history);
    sync_clean_paths(&mut ctx.state, &old_files);
    ctx.state.branch_lineages.insert(
        DETACHED_LINEAGE.to_string(),
        history.iter().map(|c| c.hash.clone()).collect(),
    );
    ctx.state.head = Head::Detached {
        hash: commit.hash.clone(),
    };
    ctx.state.record_reflog(
        commit.hash.clone(),
        "checkout",
        format!("moving from {from} to {rev}"),
    );

    ctx.out.warning(format!(
        "Note: switching to '{rev}'.\n\n\
         You are in 'detached HEAD' state. You can look around, make experimental\n\
         changes and commit them, and you can discard any commits you make in this\n\
         state without impacting any branches by switching back to a branch.\n\n\
         If you want to create a new branch to retain commits you create, you may\n\
         do so (now or later) by using -c with the switch command. Example:\n\n  \
         git switch -c <new-branch-name>\n"
    ));
    ctx.out.output(format!(
        "HEAD is now at {} {}",
        commit.short_hash(),
        commit.subject()
    ));
    tracing::debug!(hash = %commit.hash, "HEAD detached");
    Ok(())
}

/// Carries unmodified working copies along when committed content changes.
pub(crate) fn sync_clean_paths(state: &mut RepositoryState, old_files: &FileMap) {
    let clean: Vec<String> = state
        .working_directory
        .iter()
        .filter(|(path, content)| {
            old_files.get(*path) == Some(*content) && !state.staged_files.contains_key(*path)
        })
        .map(|(path, _)| path.clone())
        .collect();

    for path in clean {
        match state.files.get(&path) {
            Some(content) => {
                state.working_directory.insert(path, content.clone());
            }
            None => {
                state.working_directory.remove(&path);
            }
        }
    }
}

/// Prints `--stat` style rows and the summary for a committed-file change.
pub(crate) fn report_changes(ctx: &mut CommandContext<'_>, before: &FileMap, after: &FileMap) {
    let changed: Vec<(&String, DiffStat)> = after
        .iter()
        .filter(|(path, content)| before.get(*path) != Some(*content))
        .map(|(path, content)| {
            let old = before.get(path).map(String::as_str).unwrap_or("");
            (path, diff::stat(old, content))
        })
        .collect();
    if changed.is_empty() {
        return;
    }

    let width = changed.iter().map(|(p, _)| p.len()).max().unwrap_or(0);
    let mut total = DiffStat::default();
    for (path, stat) in &changed {
        total.add(*stat);
        ctx.out.output(diff::stat_row(path, width, *stat));
    }
    ctx.out.output(diff::summary_line(changed.len(), total));
    for path in after.keys().filter(|p| !before.contains_key(*p)) {
        ctx.out.output(format!(" create mode 100644 {path}"));
    }
}

/// Handle `git merge`.
pub fn handle_merge(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    if args.has("abort") {
        return abort_merge(ctx);
    }

    let target = required(args, 0, "git merge <branch>")?;
    if ctx.state.merge_in_progress.is_some() {
        return Err(CommandError::fatal(
            "You have not concluded your merge (MERGE_HEAD exists).\n\
             hint: Please, commit your changes before you merge.",
        ));
    }

    if let Some(conflict) = ctx.state.pending_conflicts.get(target).cloned() {
        open_conflict(ctx, target, conflict);
        return Ok(());
    }

    let theirs = ctx.branch_history(target).ok_or_else(|| {
        CommandError::fatal(format!("merge: {target} - not something we can merge"))
    })?;
    fold_history(ctx, target, theirs, args)
}

/// Opens the conflict sub-session for a declared conflict.
pub(crate) fn open_conflict(
    ctx: &mut CommandContext<'_>,
    branch: &str,
    conflict: crate::repo::Conflict,
) {
    let file = conflict.file.clone();
    let session = ConflictSession::open(conflict, branch);

    ctx.state.merge_in_progress = Some(MergeInProgress {
        branch: branch.to_string(),
        file: file.clone(),
        saved_working: ctx.state.working_directory.get(&file).cloned(),
        saved_staged: ctx.state.staged_files.get(&file).cloned(),
    });
    ctx.state
        .working_directory
        .insert(file.clone(), session.marked_view());
    ctx.directive = Some(SessionDirective::OpenConflict {
        file: session.file.clone(),
        ours: session.ours.clone(),
        theirs: session.theirs.clone(),
        resolved: session.resolved.clone(),
    });
    ctx.state.session = ActiveSession::Conflict(session);

    ctx.out.output(format!("Auto-merging {file}"));
    ctx.out
        .error(format!("CONFLICT (content): Merge conflict in {file}"));
    ctx.out
        .error("Automatic merge failed; fix conflicts and then commit the result.");
    tracing::info!(%file, %branch, "conflict session opened");
}

fn abort_merge(ctx: &mut CommandContext<'_>) -> HandlerResult {
    let Some(merge) = ctx.state.merge_in_progress.take() else {
        return Err(CommandError::fatal(
            "There is no merge to abort (MERGE_HEAD missing).",
        ));
    };

    match merge.saved_working {
        Some(content) => ctx.state.working_directory.insert(merge.file.clone(), content),
        None => ctx.state.working_directory.remove(&merge.file),
    };
    match merge.saved_staged {
        Some(content) => ctx.state.staged_files.insert(merge.file.clone(), content),
        None => ctx.state.staged_files.remove(&merge.file),
    };
    if ctx.state.session.conflict().is_some() {
        ctx.state.session = ActiveSession::None;
        ctx.directive = Some(SessionDirective::CloseSession);
        tracing::info!(file = %merge.file, "conflict session closed by abort");
    }
    Ok(())
}

/// Fast-forwards onto `theirs` or appends its exclusive commits plus a merge commit.
pub(crate) fn fold_history(
    ctx: &mut CommandContext<'_>,
    target: &str,
    theirs: Vec<Commit>,
    args: &Args,
) -> HandlerResult {
    let ours = ctx.state.commits.clone();
    let incoming = exclusive_commits(&theirs, &ours);
    if incoming.is_empty() {
        ctx.out.output("Already up to date.");
        return Ok(());
    }

    let before = ctx.state.files.clone();
    let can_fast_forward = common_prefix(&ours, &theirs) == ours.len();

    if can_fast_forward && !args.has("no-ff") {
        let from = ours.last().map(|c| c.short_hash().to_string()).unwrap_or_default();
        let tip = theirs.last().map(|c| c.hash.clone()).unwrap_or_default();
        let to = crate::repo::short(&tip).to_string();
        transition_files(&mut ctx.state.files, &ours, &theirs);
        ctx.state.commits = theirs;
        sync_clean_paths(&mut ctx.state, &before);

        ctx.out.output(format!("Updating {from}..{to}"));
        ctx.out.output("Fast-forward");
        let after = ctx.state.files.clone();
        report_changes(ctx, &before, &after);
        ctx.state
            .record_reflog(tip, format!("merge {target}"), "Fast-forward");
        return Ok(());
    }

    if args.has("ff-only") {
        return Err(CommandError::fatal("Not possible to fast-forward, aborting."));
    }

    let mut merged = FileMap::new();
    for commit in &incoming {
        merged.extend(commit.files.clone());
    }
    ctx.state.commits.extend(incoming);
    ctx.state.files.extend(merged.clone());

    let message = args
        .value("message")
        .map(str::to_string)
        .unwrap_or_else(|| format!("Merge branch '{target}'"));
    let commit = Commit {
        hash: ctx.fresh_hash(),
        message,
        files: merged,
        branch: ctx.state.current_branch.clone(),
        author: Some(ctx.author()),
    };
    let hash = commit.hash.clone();
    super::staging::record_commit(ctx, commit);
    sync_clean_paths(&mut ctx.state, &before);

    ctx.out.output("Merge made by the 'ort' strategy.");
    let after = ctx.state.files.clone();
    report_changes(ctx, &before, &after);
    ctx.state.record_reflog(
        hash,
        format!("merge {target}"),
        "Merge made by the 'ort' strategy.",
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{commit, git, two_branch_repo};
    use super::*;
    use crate::repo::Conflict;

    #[test]
    fn test_branch_list_marks_current() {
        let ran = git(two_branch_repo(), "branch");
        assert_eq!(ran.lines, vec!["  feature-a", "* main"]);
    }

    #[test]
    fn test_branch_create_rejects_duplicates() {
        let ran = git(two_branch_repo(), "branch feature-a");
        assert_eq!(ran.error(), "fatal: a branch named 'feature-a' already exists");

        let ran = git(two_branch_repo(), "branch hotfix");
        assert!(ran.result.is_ok());
        assert!(ran.state.branches.contains("hotfix"));
        assert_eq!(ran.state.branch_lineages["hotfix"], vec!["aaaa001", "aaaa002"]);
    }

    #[test]
    fn test_branch_delete_rules() {
        let ran = git(two_branch_repo(), "branch -d main");
        assert!(ran.error().starts_with("error: Cannot delete branch 'main'"));

        let ran = git(two_branch_repo(), "branch -d feature-a");
        assert!(ran.error().contains("not fully merged"));

        let ran = git(two_branch_repo(), "branch -D feature-a");
        assert!(ran.result.is_ok());
        assert!(!ran.state.branches.contains("feature-a"));
    }

    #[test]
    fn test_branch_rename_current() {
        let ran = git(two_branch_repo(), "branch -m trunk");
        assert!(ran.result.is_ok());
        assert_eq!(ran.state.current_branch, "trunk");
        assert!(!ran.state.branches.contains("main"));
    }

    #[test]
    fn test_checkout_existing_branch_transitions_files() {
        let ran = git(two_branch_repo(), "checkout feature-a");
        assert_eq!(ran.lines, vec!["Switched to branch 'feature-a'"]);
        assert_eq!(ran.state.current_branch, "feature-a");
        assert_eq!(ran.state.files["login.js"], "login()");

        let back = git(ran.state, "switch main");
        assert!(!back.state.files.contains_key("login.js"));
        assert_eq!(back.state.commits.len(), 2);
    }

    #[test]
    fn test_checkout_create_rejects_duplicates() {
        let ran = git(two_branch_repo(), "checkout -b feature-a");
        assert!(ran.result.is_err());

        let ran = git(two_branch_repo(), "checkout -b feature-b");
        assert_eq!(ran.lines, vec!["Switched to a new branch 'feature-b'"]);
        assert_eq!(ran.state.current_branch, "feature-b");
    }

    #[test]
    fn test_checkout_track_sets_upstream() {
        let mut state = two_branch_repo();
        state
            .remotes
            .insert("origin".to_string(), "https://example.com/app.git".to_string());
        state
            .remote_branches
            .insert("origin/hotfix".to_string(), "aaaa001".to_string());

        let ran = git(state.clone(), "checkout -b patch --track origin/hotfix");
        assert_eq!(
            ran.lines,
            vec![
                "branch 'patch' set up to track 'origin/hotfix'.",
                "Switched to a new branch 'patch'"
            ]
        );
        assert_eq!(ran.state.upstreams["patch"], "origin/hotfix");

        let ran = git(state.clone(), "checkout -t origin/hotfix");
        assert_eq!(ran.state.current_branch, "hotfix");
        assert_eq!(ran.state.upstreams["hotfix"], "origin/hotfix");

        let ran = git(state.clone(), "checkout -b patch -t main");
        assert_eq!(ran.state.upstreams["patch"], "main");
        let ran = git(state.clone(), "checkout -b patch -t aaaa001");
        assert_eq!(
            ran.error(),
            "fatal: cannot set up tracking information; starting point 'aaaa001' is not a branch"
        );
        let ran = git(state, "checkout -t feature-a");
        assert_eq!(ran.error(), "fatal: missing branch name; try -b");
    }

    #[test]
    fn test_checkout_hash_detaches() {
        let ran = git(two_branch_repo(), "checkout aaaa001");
        assert!(ran.result.is_ok());
        assert!(ran.state.detached_head());
        assert!(ran.printed("detached HEAD"));
        assert!(!ran.state.files.contains_key("config.txt"));

        let back = git(ran.state, "checkout main");
        assert!(!back.state.detached_head());
        assert_eq!(back.state.files["config.txt"], "port=3000");
    }

    #[test]
    fn test_checkout_unknown_target() {
        let ran = git(two_branch_repo(), "checkout nowhere");
        assert_eq!(
            ran.error(),
            "error: pathspec 'nowhere' did not match any file(s) known to git"
        );
        let ran = git(two_branch_repo(), "switch nowhere");
        assert_eq!(ran.error(), "fatal: invalid reference: nowhere");
    }

    #[test]
    fn test_merge_opens_declared_conflict() {
        let mut state = two_branch_repo();
        state.pending_conflicts.insert(
            "feature-a".to_string(),
            Conflict {
                file: "config.txt".to_string(),
                ours: "port=3000".to_string(),
                theirs: "port=8080".to_string(),
            },
        );
        let ran = git(state, "merge feature-a");
        assert!(ran.result.is_ok());
        assert!(matches!(ran.directive, Some(SessionDirective::OpenConflict { .. })));
        let conflict = ran.state.conflict_state().unwrap();
        assert_eq!(conflict.ours, "port=3000");
        assert_eq!(conflict.theirs, "port=8080");
        assert_eq!(ran.state.commits.len(), 2);

        let aborted = git(ran.state, "merge --abort");
        assert!(aborted.state.conflict_state().is_none());
        assert!(aborted.state.merge_in_progress.is_none());
        assert!(!aborted.state.working_directory.contains_key("config.txt"));
    }

    #[test]
    fn test_merge_fast_forward() {
        let ran = git(two_branch_repo(), "merge feature-a");
        assert!(ran.printed("Fast-forward"));
        assert_eq!(ran.state.commits.len(), 3);
        assert_eq!(ran.state.files["login.js"], "login()");
    }

    #[test]
    fn test_merge_creates_merge_commit_when_diverged() {
        let mut state = two_branch_repo();
        state.feature_commits[0] = commit("bbbb001", "Add login", "feature-a", &[("login.js", "x")]);
        state.branch_lineages.insert(
            "feature-a".to_string(),
            vec!["aaaa001".to_string(), "bbbb001".to_string()],
        );
        let ran = git(state, "merge feature-a");
        assert!(ran.printed("Merge made by the 'ort' strategy."));
        let last = ran.state.commits.last().unwrap();
        assert_eq!(last.message, "Merge branch 'feature-a'");
        assert_eq!(ran.state.commits.len(), 4);
    }

    #[test]
    fn test_merge_unknown_branch() {
        let ran = git(two_branch_repo(), "merge ghost");
        assert_eq!(ran.error(), "fatal: merge: ghost - not something we can merge");
    }
}
