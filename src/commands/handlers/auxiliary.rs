//! Ancillary handlers: worktrees, submodules, `config`, `help` and `--version`.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::branching::create_branch;
use super::remote::clone_name;
use super::{required, CommandContext, HandlerResult};
use crate::commands::args::Args;
use crate::commands::help;
use crate::error::CommandError;
use crate::repo::history::head_history;
use crate::repo::Worktree;

/// Version string reported by `git --version`.
pub const GIT_VERSION: &str = "git version 2.43.0";

/// Handle `git worktree`.
pub fn handle_worktree(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    match args.subcommand() {
        Some("add") => add_worktree(ctx, args),
        Some("list") => {
            let head = ctx
                .state
                .head_commit()
                .map(|c| c.short_hash().to_string())
                .unwrap_or_else(|| "0000000".to_string());
            let width = ctx
                .state
                .worktrees
                .iter()
                .map(|w| w.path.len())
                .chain(std::iter::once(ctx.settings.workdir.len()))
                .max()
                .unwrap_or(0);

            let main_label = if ctx.state.detached_head() {
                "(detached HEAD)".to_string()
            } else {
                format!("[{}]", ctx.state.current_branch)
            };
            let mut rows = vec![format!("{:<width$}  {head} {main_label}", ctx.settings.workdir)];
            for tree in &ctx.state.worktrees {
                let tip = ctx
                    .branch_history(&tree.branch)
                    .and_then(|h| h.last().map(|c| c.short_hash().to_string()))
                    .unwrap_or_else(|| head.clone());
                rows.push(format!("{:<width$}  {tip} [{}]", tree.path, tree.branch));
            }
            for row in rows {
                ctx.out.output(row);
            }
            Ok(())
        }
        Some("remove") => {
            let path = required(args, 1, "git worktree remove <worktree>")?;
            let before = ctx.state.worktrees.len();
            ctx.state.worktrees.retain(|w| w.path != path);
            if ctx.state.worktrees.len() == before {
                return Err(CommandError::fatal(format!("'{path}' is not a working tree")));
            }
            Ok(())
        }
        Some(other) => Err(CommandError::usage(format!(
            "error: unknown subcommand: '{other}'\n\
             usage: git worktree add <path> [<branch>] | list | remove <worktree>"
        ))),
        None => Err(CommandError::usage(
            "usage: git worktree add <path> [<branch>] | list | remove <worktree>",
        )),
    }
}

fn add_worktree(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let path = required(args, 1, "git worktree add <path> [<branch>]")?.to_string();
    if ctx.state.worktrees.iter().any(|w| w.path == path) {
        return Err(CommandError::fatal(format!("'{path}' already exists")));
    }

    let (branch, created) = match args.positional(2) {
        Some(branch) => {
            if !ctx.state.branches.contains(branch) {
                return Err(CommandError::fatal(format!("invalid reference: {branch}")));
            }
            (branch.to_string(), false)
        }
        None => {
            let name = path
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(&path)
                .to_string();
            let exists = ctx.state.branches.contains(&name);
            if !exists {
                create_branch(ctx, &name, None, false)?;
            }
            (name, !exists)
        }
    };

    let checked_out_here = branch == ctx.state.current_branch && !ctx.state.detached_head();
    if checked_out_here {
        return Err(CommandError::fatal(format!(
            "'{branch}' is already used by worktree at '{}'",
            ctx.settings.workdir
        )));
    }
    if let Some(tree) = ctx.state.worktrees.iter().find(|w| w.branch == branch) {
        return Err(CommandError::fatal(format!(
            "'{branch}' is already used by worktree at '{}'",
            tree.path
        )));
    }

    if created {
        ctx.out
            .output(format!("Preparing worktree (new branch '{branch}')"));
    } else {
        ctx.out
            .output(format!("Preparing worktree (checking out '{branch}')"));
    }
    let tip = ctx
        .branch_history(&branch)
        .unwrap_or_else(|| head_history(&ctx.state))
        .last()
        .map(|c| format!("{} {}", c.short_hash(), c.subject()));
    if let Some(tip) = tip {
        ctx.out.output(format!("HEAD is now at {tip}"));
    }

    ctx.state.worktrees.push(Worktree { path, branch });
    Ok(())
}

/// Stable pseudo-hash for a submodule's checked-out commit.
fn submodule_commit(url: &str) -> String {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn gitmodules(ctx: &CommandContext<'_>) -> String {
    ctx.state
        .submodules
        .iter()
        .map(|(path, url)| format!("[submodule \"{path}\"]\n\tpath = {path}\n\turl = {url}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Handle `git submodule`.
pub fn handle_submodule(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    match args.subcommand().unwrap_or("status") {
        "add" => {
            let url = required(args, 1, "git submodule add <repository> [<path>]")?.to_string();
            let path = match args.positional(2) {
                Some(p) => p.to_string(),
                None => clone_name(&url).ok_or_else(|| {
                    CommandError::fatal(format!("repository '{url}' does not exist"))
                })?,
            };
            if ctx.state.submodules.contains_key(&path) || ctx.state.files.contains_key(&path) {
                return Err(CommandError::fatal(format!(
                    "'{path}' already exists in the index"
                )));
            }

            ctx.state.submodules.insert(path.clone(), url);
            let manifest = gitmodules(ctx);
            for (file, content) in [(".gitmodules".to_string(), manifest), (path.clone(), String::new())] {
                ctx.state
                    .working_directory
                    .insert(file.clone(), content.clone());
                ctx.state.staged_files.insert(file, content);
            }
            ctx.out.output(format!(
                "Cloning into '{}/{path}'...",
                ctx.settings.workdir
            ));
            ctx.out.output("done.");
            Ok(())
        }
        "status" => {
            let rows: Vec<String> = ctx
                .state
                .submodules
                .iter()
                .map(|(path, url)| format!(" {} {path} (heads/main)", submodule_commit(url)))
                .collect();
            for row in rows {
                ctx.out.output(row);
            }
            Ok(())
        }
        "update" | "init" => {
            let rows: Vec<String> = ctx
                .state
                .submodules
                .iter()
                .map(|(path, url)| {
                    format!("Submodule path '{path}': checked out '{}'", submodule_commit(url))
                })
                .collect();
            for row in rows {
                ctx.out.output(row);
            }
            Ok(())
        }
        other => Err(CommandError::usage(format!(
            "error: unknown subcommand: '{other}'\n\
             usage: git submodule add <repository> [<path>] | status | update"
        ))),
    }
}

/// Handle `git config`.
///
/// Values live in the snapshot, so `--global` writes the same map as a
/// repository-local setting.
pub fn handle_config(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    if args.has("local") && args.has("global") {
        return Err(CommandError::error("only one config file at a time"));
    }
    if !ctx.state.initialized && args.has("local") {
        return Err(CommandError::fatal(
            "--local can only be used inside a git repository",
        ));
    }
    if !ctx.state.initialized && !args.has("global") {
        return Err(CommandError::fatal("not in a git directory"));
    }

    if args.has("list") {
        let mut rows = Vec::new();
        if !ctx.state.config.contains_key("user.name") {
            rows.push(format!("user.name={}", ctx.settings.user_name));
        }
        if !ctx.state.config.contains_key("user.email") {
            rows.push(format!("user.email={}", ctx.settings.user_email));
        }
        rows.extend(ctx.state.config.iter().map(|(k, v)| format!("{k}={v}")));
        for row in rows {
            ctx.out.output(row);
        }
        return Ok(());
    }

    let key = required(args, 0, "git config [--global] <name> [<value>]")?.to_lowercase();
    if !key.contains('.') || key.starts_with('.') || key.ends_with('.') {
        return Err(CommandError::error(format!(
            "key does not contain a section: {key}"
        )));
    }

    if args.has("unset") {
        ctx.state.config.remove(&key);
        return Ok(());
    }

    match args.positional(1) {
        Some(_) if args.has("get") => Err(CommandError::usage(
            "error: wrong number of arguments, should be from 1 to 2",
        )),
        Some(_) => {
            let value = args.rest().join(" ");
            tracing::debug!(%key, %value, "config set");
            ctx.state.config.insert(key, value);
            Ok(())
        }
        None => {
            let value = ctx.state.config.get(&key).cloned().or_else(|| match key.as_str() {
                "user.name" => Some(ctx.settings.user_name.clone()),
                "user.email" => Some(ctx.settings.user_email.clone()),
                "init.defaultbranch" => Some(ctx.settings.default_branch.clone()),
                _ => None,
            });
            // An unset key prints nothing, like the real command.
            if let Some(value) = value {
                ctx.out.output(value);
            }
            Ok(())
        }
    }
}

/// Handle `git help`.
pub fn handle_help(ctx: &mut CommandContext<'_>, _args: &Args) -> HandlerResult {
    ctx.out.output(help::git_overview());
    Ok(())
}

/// Handle `git --version`.
pub fn handle_version(ctx: &mut CommandContext<'_>, _args: &Args) -> HandlerResult {
    ctx.out.output(GIT_VERSION);
    Ok(())
}
