//! Remote collaboration handlers (`remote`, `fetch`, `pull`, `push`, `clone`).
//!
//! Remotes are plain data in the snapshot. `remote_commits` holds what each
//! remote ref has been seen to contain; `remote_branches` holds where the
//! local tracking refs point.

use std::collections::BTreeSet;

use url::Url;

use super::branching::{fold_history, open_conflict};
use super::{required, CommandContext, HandlerResult};
use crate::commands::args::Args;
use crate::error::CommandError;
use crate::repo::history::published_history;
use crate::repo::{short, Commit, FileMap, RepositoryState};

/// Handle `git remote`.
pub fn handle_remote(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    match args.subcommand() {
        None => {
            let rows: Vec<String> = ctx
                .state
                .remotes
                .iter()
                .flat_map(|(name, url)| {
                    if args.has("verbose") {
                        vec![format!("{name}\t{url} (fetch)"), format!("{name}\t{url} (push)")]
                    } else {
                        vec![name.clone()]
                    }
                })
                .collect();
            for row in rows {
                ctx.out.output(row);
            }
            Ok(())
        }
        Some("add") => {
            let name = required(args, 1, "git remote add <name> <url>")?;
            let url = required(args, 2, "git remote add <name> <url>")?;
            if ctx.state.remotes.contains_key(name) {
                return Err(CommandError::error(format!("remote {name} already exists.")));
            }
            ctx.state.remotes.insert(name.to_string(), url.to_string());
            Ok(())
        }
        Some("remove") | Some("rm") => {
            let name = required(args, 1, "git remote remove <name>")?;
            if ctx.state.remotes.remove(name).is_none() {
                return Err(CommandError::error(format!("No such remote: '{name}'")));
            }
            let prefix = format!("{name}/");
            ctx.state.remote_branches.retain(|r, _| !r.starts_with(&prefix));
            ctx.state
                .remote_commits
                .retain(|r, _| r != name && !r.starts_with(&prefix));
            ctx.state.upstreams.retain(|_, r| !r.starts_with(&prefix));
            Ok(())
        }
        Some("get-url") => {
            let name = required(args, 1, "git remote get-url <name>")?;
            let url = ctx
                .state
                .remotes
                .get(name)
                .cloned()
                .ok_or_else(|| CommandError::error(format!("No such remote '{name}'")))?;
            ctx.out.output(url);
            Ok(())
        }
        Some("set-url") => {
            let name = required(args, 1, "git remote set-url <name> <newurl>")?;
            let url = required(args, 2, "git remote set-url <name> <newurl>")?;
            match ctx.state.remotes.get_mut(name) {
                Some(existing) => {
                    *existing = url.to_string();
                    Ok(())
                }
                None => Err(CommandError::error(format!("No such remote '{name}'"))),
            }
        }
        Some(other) => Err(CommandError::usage(format!(
            "error: unknown subcommand: '{other}'\n\
             usage: git remote [-v] | add <name> <url> | remove <name> | get-url <name>"
        ))),
    }
}

fn remote_url(state: &RepositoryState, remote: &str) -> Result<String, CommandError> {
    state.remotes.get(remote).cloned().ok_or_else(|| {
        CommandError::fatal(format!(
            "'{remote}' does not appear to be a git repository\n\
             fatal: Could not read from remote repository.\n\n\
             Please make sure you have the correct access rights\n\
             and the repository exists."
        ))
    })
}

/// The remote the current branch talks to by default.
fn default_remote(state: &RepositoryState) -> String {
    state
        .upstreams
        .get(&state.current_branch)
        .and_then(|r| r.split_once('/'))
        .map(|(remote, _)| remote.to_string())
        .unwrap_or_else(|| "origin".to_string())
}

/// Brings `remote/branch` up to date, returning the ref-update row if it moved.
fn fetch_ref(ctx: &mut CommandContext<'_>, remote: &str, branch: &str) -> Option<String> {
    let full_ref = format!("{remote}/{branch}");
    let published = published_history(&ctx.state, remote, &full_ref);
    let tip = published.last()?.hash.clone();
    let previous = ctx.state.remote_branches.get(&full_ref).cloned();

    // The bare-remote list only ever describes the current branch's ref.
    if branch == ctx.state.current_branch {
        ctx.state.remote_commits.remove(remote);
    }
    ctx.state.remote_commits.insert(full_ref.clone(), published);
    ctx.state
        .remote_branches
        .insert(full_ref.clone(), tip.clone());

    match previous {
        Some(old) if old == tip => None,
        Some(old) => Some(format!(
            "   {}..{}  {branch:<10} -> {full_ref}",
            short(&old),
            short(&tip)
        )),
        None => Some(format!(" * [new branch]      {branch:<10} -> {full_ref}")),
    }
}

/// Fetches every ref `remote` is known to hold.
///
/// With `prune`, tracking refs the remote no longer backs are deleted.
fn fetch_remote(ctx: &mut CommandContext<'_>, remote: &str, prune: bool) -> Result<(), CommandError> {
    let url = remote_url(&ctx.state, remote)?;
    let prefix = format!("{remote}/");
    let mut branches: BTreeSet<String> = ctx
        .state
        .remote_commits
        .keys()
        .filter_map(|r| r.strip_prefix(&prefix).map(str::to_string))
        .collect();
    if ctx.state.remote_commits.contains_key(remote)
        || ctx.state.remote_branches.contains_key(&format!("{prefix}{}", ctx.state.current_branch))
    {
        branches.insert(ctx.state.current_branch.clone());
    }

    let mut rows: Vec<String> = branches
        .iter()
        .filter_map(|branch| fetch_ref(ctx, remote, branch))
        .collect();
    if prune {
        let stale: Vec<String> = ctx
            .state
            .remote_branches
            .keys()
            .filter(|r| {
                r.strip_prefix(&prefix)
                    .is_some_and(|branch| !branches.contains(branch))
            })
            .cloned()
            .collect();
        for full_ref in stale {
            ctx.state.remote_branches.remove(&full_ref);
            ctx.state.remote_commits.remove(&full_ref);
            rows.push(format!(" - [deleted]         {:<10} -> {full_ref}", "(none)"));
        }
    }
    if !rows.is_empty() {
        ctx.out.output(format!("From {url}"));
        for row in rows {
            ctx.out.output(row);
        }
    }
    Ok(())
}

/// Handle `git fetch`.
pub fn handle_fetch(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    if ctx.state.remotes.is_empty() {
        return Err(CommandError::fatal(
            "No remote repository specified.  Please, specify either a URL or a\n\
             remote name from which new revisions should be fetched.",
        ));
    }

    let remotes: Vec<String> = if args.has("all") {
        ctx.state.remotes.keys().cloned().collect()
    } else {
        vec![args
            .positional(0)
            .map(str::to_string)
            .unwrap_or_else(|| default_remote(&ctx.state))]
    };
    for remote in remotes {
        fetch_remote(ctx, &remote, args.has("prune"))?;
    }
    Ok(())
}

/// Handle `git pull`.
pub fn handle_pull(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let remote = args
        .positional(0)
        .map(str::to_string)
        .unwrap_or_else(|| default_remote(&ctx.state));
    let branch = args
        .positional(1)
        .map(str::to_string)
        .unwrap_or_else(|| ctx.state.current_branch.clone());
    let url = remote_url(&ctx.state, &remote)?;
    let full_ref = format!("{remote}/{branch}");

    let row = fetch_ref(ctx, &remote, &branch);
    ctx.out.output(format!("From {url}"));
    ctx.out
        .output(row.unwrap_or_else(|| format!(" * branch            {branch:<10} -> FETCH_HEAD")));

    if let Some(conflict) = ctx.state.pending_conflicts.get(&full_ref).cloned() {
        open_conflict(ctx, &full_ref, conflict);
        return Ok(());
    }

    let theirs = ctx.branch_history(&full_ref).ok_or_else(|| {
        CommandError::fatal(format!("couldn't find remote ref {branch}"))
    })?;

    if args.has("rebase") {
        // Same fold as a merge pull; only the report differs.
        let report = std::mem::take(&mut ctx.out);
        let folded = fold_history(ctx, &full_ref, theirs, args);
        let moved = !ctx.out.lines().iter().any(|l| l.text == "Already up to date.");
        ctx.out = report;
        folded?;
        let branch = ctx.state.current_branch.clone();
        if moved {
            ctx.out
                .success(format!("Successfully rebased and updated refs/heads/{branch}."));
        } else {
            ctx.out
                .output(format!("Current branch {branch} is up to date."));
        }
    } else {
        fold_history(ctx, &full_ref, theirs, args)?;
    }

    ctx.state.diverged = false;
    Ok(())
}

/// Handle `git push`.
pub fn handle_push(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    if ctx.state.remotes.is_empty() {
        return Err(CommandError::fatal(
            "No configured push destination.\n\
             Either specify the URL from the command-line or configure a remote repository using\n\n    \
             git remote add <name> <url>\n\n\
             and then push using the remote name\n\n    \
             git push <name>",
        ));
    }

    let remote = args
        .positional(0)
        .map(str::to_string)
        .unwrap_or_else(|| default_remote(&ctx.state));
    let url = remote_url(&ctx.state, &remote)?;

    let branch = match args.positional(1) {
        Some("HEAD") | None => {
            if ctx.state.detached_head() {
                return Err(CommandError::fatal("You are not currently on a branch."));
            }
            ctx.state.current_branch.clone()
        }
        Some(refspec) => refspec
            .split_once(':')
            .map(|(src, _)| src)
            .unwrap_or(refspec)
            .to_string(),
    };

    let history = ctx.branch_history(&branch).unwrap_or_default();
    let known_branch = ctx.state.branches.contains(&branch) || branch == ctx.state.current_branch;
    if !known_branch || history.is_empty() {
        return Err(CommandError::error(format!(
            "src refspec {branch} does not match any\n\
             error: failed to push some refs to '{url}'"
        )));
    }

    let force = args.has("force") || args.has("force-with-lease");
    let on_current = branch == ctx.state.current_branch;
    if ctx.state.diverged && on_current && !force {
        tracing::warn!(%remote, %branch, "push rejected as non-fast-forward");
        return Err(CommandError::rejected(format!(
            "To {url}\n \
             ! [rejected]        {branch} -> {branch} (non-fast-forward)\n\
             error: failed to push some refs to '{url}'\n\
             hint: Updates were rejected because the tip of your current branch is behind\n\
             hint: its remote counterpart. If you want to integrate the remote changes,\n\
             hint: use 'git pull' before pushing again.\n\
             hint: See the 'Note about fast-forwards' in 'git push --help' for details."
        )));
    }

    let full_ref = format!("{remote}/{branch}");
    let tip = history.last().map(|c| c.hash.clone()).unwrap_or_default();
    let previous = ctx.state.remote_branches.get(&full_ref).cloned();
    let forced_update = force && ctx.state.diverged && on_current;

    let row = match &previous {
        None => Some(format!(" * [new branch]      {branch} -> {branch}")),
        Some(old) if *old == tip && !forced_update => None,
        Some(old) if forced_update => Some(format!(
            " + {}...{} {branch} -> {branch} (forced update)",
            short(old),
            short(&tip)
        )),
        Some(old) => Some(format!("   {}..{}  {branch} -> {branch}", short(old), short(&tip))),
    };

    let mut tag_rows = Vec::new();
    if args.has("tags") {
        for name in ctx.state.tags.keys() {
            tag_rows.push(format!(" * [new tag]         {name} -> {name}"));
        }
    }

    match row {
        None if tag_rows.is_empty() => ctx.out.output("Everything up-to-date"),
        row => {
            ctx.out.output(format!("To {url}"));
            for line in row.into_iter().chain(tag_rows) {
                ctx.out.success(line);
            }
        }
    }

    if on_current {
        ctx.state.remote_commits.remove(&remote);
        ctx.state.diverged = false;
    }
    ctx.state.remote_commits.insert(full_ref.clone(), history);
    ctx.state.remote_branches.insert(full_ref.clone(), tip);

    if args.has("set-upstream") {
        ctx.state.upstreams.insert(branch.clone(), full_ref.clone());
        ctx.out
            .output(format!("branch '{branch}' set up to track '{full_ref}'."));
    }
    Ok(())
}

/// Repository name a clone of `source` would create.
pub(crate) fn clone_name(source: &str) -> Option<String> {
    let last = match Url::parse(source) {
        Ok(url) => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string),
        // scp-style `git@host:user/repo.git` and plain paths
        Err(_) => source
            .trim_end_matches('/')
            .rsplit(['/', ':'])
            .next()
            .map(str::to_string),
    }?;
    let name = last.strip_suffix(".git").unwrap_or(&last).to_string();
    (!name.is_empty()).then_some(name)
}

/// Handle `git clone`.
pub fn handle_clone(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let source = required(args, 0, "git clone <repository> [<directory>]")?;
    let name = match args.positional(1) {
        Some(dir) => dir.to_string(),
        None => clone_name(source).ok_or_else(|| {
            CommandError::fatal(format!("repository '{source}' does not exist"))
        })?,
    };
    let branch = args
        .value("branch")
        .unwrap_or(ctx.default_branch())
        .to_string();

    let author = ctx.author();
    let canned: [(&str, FileMap); 3] = [
        (
            "Initial commit",
            FileMap::from([("README.md".to_string(), format!("# {name}"))]),
        ),
        (
            "Add project skeleton",
            FileMap::from([
                ("src/index.js".to_string(), "console.log('hello');".to_string()),
                ("package.json".to_string(), format!("{{\"name\": \"{name}\"}}")),
            ]),
        ),
        (
            "Add contributing guide",
            FileMap::from([(
                "CONTRIBUTING.md".to_string(),
                format!("Thanks for helping with {name}!"),
            )]),
        ),
    ];

    let mut state = RepositoryState::initialized();
    state.current_branch = branch.clone();
    state.branches = BTreeSet::from([branch.clone()]);
    for (message, files) in canned {
        let commit = Commit::new(ctx.fresh_hash(), message, files.clone(), branch.clone())
            .with_author(author.clone());
        state.files.extend(files);
        state.commits.push(commit);
    }

    let full_ref = format!("origin/{branch}");
    let tip = state.commits.last().map(|c| c.hash.clone()).unwrap_or_default();
    state.remotes.insert("origin".to_string(), source.to_string());
    state.remote_branches.insert(full_ref.clone(), tip.clone());
    state
        .remote_commits
        .insert(full_ref.clone(), state.commits.clone());
    state.upstreams.insert(branch.clone(), full_ref);
    state.record_reflog(tip, "clone", format!("from {source}"));
    state.config = ctx.state.config.clone();

    ctx.state = state;
    ctx.out.output(format!("Cloning into '{name}'..."));
    ctx.out.output("remote: Enumerating objects: 9, done.");
    ctx.out
        .output("Receiving objects: 100% (9/9), done.");
    tracing::info!(%source, %name, "repository cloned");
    Ok(())
}
