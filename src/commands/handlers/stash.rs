//! `git stash` and its sub-verbs.

use std::sync::LazyLock;

use regex::Regex;

use super::{lifecycle, CommandContext, HandlerResult};
use crate::commands::args::Args;
use crate::error::CommandError;
use crate::repo::diff::{self, DiffStat};
use crate::repo::{FileMap, StashEntry};

static STASH_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:stash@\{(\d+)\}|(\d+))$").expect("static regex is valid"));

/// Handle `git stash`.
pub fn handle_stash(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    match args.subcommand().unwrap_or("push") {
        "push" => push(ctx, args, args.value("message").map(str::to_string)),
        "save" => {
            let message = (!args.rest().is_empty()).then(|| args.rest().join(" "));
            push(ctx, args, message.or_else(|| args.value("message").map(str::to_string)))
        }
        "list" => {
            let lines: Vec<String> = ctx
                .state
                .stash
                .iter()
                .enumerate()
                .map(|(idx, entry)| format!("stash@{{{idx}}}: {}", entry.message))
                .collect();
            for line in lines {
                ctx.out.output(line);
            }
            Ok(())
        }
        "show" => show(ctx, args),
        "apply" => {
            let idx = entry_index(ctx, args)?;
            apply(ctx, idx)
        }
        "pop" => {
            let idx = entry_index(ctx, args)?;
            apply(ctx, idx)?;
            let entry = ctx.state.stash.remove(idx);
            ctx.out
                .output(format!("Dropped stash@{{{idx}}} ({})", entry.message));
            Ok(())
        }
        "drop" => {
            let idx = entry_index(ctx, args)?;
            let entry = ctx.state.stash.remove(idx);
            ctx.out
                .output(format!("Dropped stash@{{{idx}}} ({})", entry.message));
            Ok(())
        }
        "clear" => {
            ctx.state.stash.clear();
            Ok(())
        }
        other => Err(CommandError::usage(format!(
            "error: unknown subcommand: '{other}'\n\
             usage: git stash list | show | drop | pop | apply | push | clear"
        ))),
    }
}

fn push(ctx: &mut CommandContext<'_>, args: &Args, message: Option<String>) -> HandlerResult {
    let mut paths = ctx.state.modified_paths();
    if args.has("include-untracked") {
        paths.extend(ctx.state.status_sets().untracked);
    }

    if paths.is_empty() && ctx.state.staged_files.is_empty() {
        ctx.out.output("No local changes to save");
        return Ok(());
    }

    let branch = ctx.head_label();
    let message = match message {
        Some(msg) => format!("On {branch}: {msg}"),
        None => match ctx.state.head_commit() {
            Some(head) => format!("WIP on {branch}: {} {}", head.short_hash(), head.subject()),
            None => format!("WIP on {branch}: (no commits)"),
        },
    };

    let files: FileMap = paths
        .iter()
        .filter_map(|p| {
            ctx.state
                .working_directory
                .get(p)
                .map(|c| (p.clone(), c.clone()))
        })
        .collect();
    let staged = std::mem::take(&mut ctx.state.staged_files);

    // Put every stashed path back to its committed content.
    for path in files.keys().chain(staged.keys()) {
        match ctx.state.files.get(path).cloned() {
            Some(content) => {
                ctx.state.working_directory.insert(path.clone(), content);
            }
            None => {
                ctx.state.working_directory.remove(path);
            }
        }
    }

    ctx.state.stash.insert(
        0,
        StashEntry {
            files,
            staged,
            message: message.clone(),
        },
    );
    ctx.out
        .success(format!("Saved working directory and index state {message}"));
    Ok(())
}

fn entry_index(ctx: &CommandContext<'_>, args: &Args) -> Result<usize, CommandError> {
    if ctx.state.stash.is_empty() {
        return Err(CommandError::error("No stash entries found."));
    }
    let Some(rev) = args.rest().first() else {
        return Ok(0);
    };
    let idx = STASH_REF
        .captures(rev)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .filter(|idx| *idx < ctx.state.stash.len());
    idx.ok_or_else(|| CommandError::error(format!("{rev} is not a valid reference")))
}

fn apply(ctx: &mut CommandContext<'_>, idx: usize) -> HandlerResult {
    let entry = ctx.state.stash[idx].clone();
    for (path, content) in &entry.staged {
        // New files go back into the index; edits to tracked files come back unstaged.
        if !ctx.state.files.contains_key(path) {
            ctx.state.staged_files.insert(path.clone(), content.clone());
        }
        ctx.state
            .working_directory
            .insert(path.clone(), content.clone());
    }
    ctx.state.working_directory.extend(entry.files);
    lifecycle::handle_status(ctx, &Args::default())
}

fn show(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let idx = entry_index(ctx, args)?;
    let entry = &ctx.state.stash[idx];
    let mut changed = entry.staged.clone();
    changed.extend(entry.files.clone());

    let width = changed.keys().map(String::len).max().unwrap_or(0);
    let mut total = DiffStat::default();
    let mut rows = Vec::new();
    for (path, content) in &changed {
        let old = ctx.state.files.get(path).map(String::as_str).unwrap_or("");
        let stat = diff::stat(old, content);
        total.add(stat);
        rows.push(diff::stat_row(path, width, stat));
    }
    for row in rows {
        ctx.out.output(row);
    }
    ctx.out.output(diff::summary_line(changed.len(), total));
    Ok(())
}
