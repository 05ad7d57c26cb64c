//! Shell verbs over the simulated working tree (`ls`, `cat`, `echo`, ...).
//!
//! The working tree is the committed files overlaid with
//! `working_directory`, plus any empty directories made with `mkdir`.

use std::collections::BTreeSet;

use super::{required, CommandContext, HandlerResult};
use crate::commands::args::Args;
use crate::commands::help;
use crate::error::CommandError;
use crate::repo::RepositoryState;

/// Every directory in the tree: explicit ones and the parents of files.
fn all_directories(state: &RepositoryState) -> BTreeSet<String> {
    let mut dirs = state.directories.clone();
    for path in state.visible_paths() {
        let mut parent = path.as_str();
        while let Some((dir, _)) = parent.rsplit_once('/') {
            dirs.insert(dir.to_string());
            parent = dir;
        }
    }
    dirs
}

fn normalize(path: &str) -> String {
    path.trim_start_matches("./").trim_end_matches('/').to_string()
}

/// Handle `ls`.
pub fn handle_ls(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let dir = args.positional(0).map(normalize).unwrap_or_default();
    let dirs = all_directories(&ctx.state);
    let paths = ctx.state.visible_paths();

    if !dir.is_empty() && dir != "." && !dirs.contains(&dir) {
        if paths.contains(&dir) {
            ctx.out.output(dir);
            return Ok(());
        }
        return Err(CommandError::usage(format!(
            "ls: cannot access '{dir}': No such file or directory"
        )));
    }

    let prefix = if dir.is_empty() || dir == "." {
        String::new()
    } else {
        format!("{dir}/")
    };
    let mut entries = BTreeSet::new();
    for path in paths.iter().chain(dirs.iter()) {
        let Some(rest) = path.strip_prefix(&prefix) else {
            continue;
        };
        match rest.split_once('/') {
            Some((child, _)) => entries.insert(format!("{child}/")),
            None if dirs.contains(path) => entries.insert(format!("{rest}/")),
            None if !rest.is_empty() => entries.insert(rest.to_string()),
            None => false,
        };
    }

    let mut listing: Vec<String> = Vec::new();
    if args.has("all") {
        listing.extend(["./", "../"].map(String::from));
        if prefix.is_empty() && ctx.state.initialized {
            listing.push(".git/".to_string());
        }
    }
    listing.extend(entries);

    if args.has("long") {
        let rows: Vec<String> = listing
            .iter()
            .map(|name| {
                if name.ends_with('/') {
                    format!("drwxr-xr-x  learner  {:>5}  {name}", 4096)
                } else {
                    let size = ctx
                        .state
                        .working_content(&format!("{prefix}{name}"))
                        .map(String::len)
                        .unwrap_or(0);
                    format!("-rw-r--r--  learner  {size:>5}  {name}")
                }
            })
            .collect();
        for row in rows {
            ctx.out.output(row);
        }
    } else if !listing.is_empty() {
        ctx.out.output(listing.join("  "));
    }
    Ok(())
}

/// Handle `cat`.
///
/// Missing files are reported inline so the remaining files still print.
pub fn handle_cat(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    required(args, 0, "cat <file>...")?;
    let dirs = all_directories(&ctx.state);
    for raw in &args.positionals {
        let path = normalize(raw);
        if let Some(session) = ctx.state.session.conflict() {
            if session.file == path {
                let view = session.marked_view();
                ctx.out.output(view);
                continue;
            }
        }
        if dirs.contains(&path) {
            ctx.out.error(format!("cat: {raw}: Is a directory"));
            continue;
        }
        match ctx.state.working_content(&path).cloned() {
            Some(content) if content.is_empty() => {}
            Some(content) => ctx.out.output(content),
            None => ctx.out.error(format!("cat: {raw}: No such file or directory")),
        }
    }
    Ok(())
}

/// Handle `pwd`.
pub fn handle_pwd(ctx: &mut CommandContext<'_>, _args: &Args) -> HandlerResult {
    ctx.out.output(ctx.settings.workdir.clone());
    Ok(())
}

/// How an `echo` line ends.
enum Redirect {
    Write(String),
    Append(String),
}

/// Splits `echo` words into the text and an optional redirection target.
fn split_redirect(words: &[String]) -> Result<(String, Option<Redirect>), CommandError> {
    let mut text = Vec::new();
    let mut iter = words.iter();
    while let Some(word) = iter.next() {
        let (append, inline) = if let Some(rest) = word.strip_prefix(">>") {
            (true, rest)
        } else if let Some(rest) = word.strip_prefix('>') {
            (false, rest)
        } else {
            text.push(word.as_str());
            continue;
        };

        let target = if inline.is_empty() {
            iter.next().map(String::as_str)
        } else {
            Some(inline)
        };
        let Some(target) = target else {
            return Err(CommandError::usage(
                "bash: syntax error near unexpected token `newline'",
            ));
        };
        let target = normalize(target);
        let redirect = if append {
            Redirect::Append(target)
        } else {
            Redirect::Write(target)
        };
        return Ok((text.join(" "), Some(redirect)));
    }
    Ok((text.join(" "), None))
}

/// Handle `echo`, including `>` and `>>` redirection into the working tree.
pub fn handle_echo(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let (text, redirect) = split_redirect(&args.positionals)?;
    let (path, content) = match redirect {
        None => {
            ctx.out.output(text);
            return Ok(());
        }
        Some(Redirect::Write(path)) => (path, text),
        Some(Redirect::Append(path)) => {
            let content = match ctx.state.working_content(&path) {
                Some(existing) if !existing.is_empty() => format!("{existing}\n{text}"),
                _ => text,
            };
            (path, content)
        }
    };

    if all_directories(&ctx.state).contains(&path) {
        return Err(CommandError::usage(format!("bash: {path}: Is a directory")));
    }

    // Editing the conflicted file from the shell is a resolution too.
    if let Some(session) = ctx.state.session.conflict_mut() {
        if session.file == path {
            session.resolved = content.clone();
        }
    }
    ctx.state.working_directory.insert(path, content);
    Ok(())
}

/// Handle `touch`.
pub fn handle_touch(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    required(args, 0, "touch <file>...")?;
    for raw in &args.positionals {
        let path = normalize(raw);
        if ctx.state.working_content(&path).is_none() {
            ctx.state.working_directory.insert(path, String::new());
        }
    }
    Ok(())
}

/// Handle `rm`.
///
/// Only the working-tree overlay can be removed; committed content stays.
pub fn handle_rm(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    required(args, 0, "rm [-r] <file>...")?;
    let recursive = args.has("recursive");
    let force = args.has("force");

    for raw in &args.positionals {
        let path = normalize(raw);
        let dirs = all_directories(&ctx.state);

        if dirs.contains(&path) {
            if !recursive {
                return Err(CommandError::usage(format!(
                    "rm: cannot remove '{raw}': Is a directory"
                )));
            }
            let prefix = format!("{path}/");
            if ctx.state.files.keys().any(|p| p.starts_with(&prefix)) {
                return Err(CommandError::usage(format!(
                    "rm: cannot remove '{raw}': contains files tracked by git"
                )));
            }
            ctx.state
                .working_directory
                .retain(|p, _| !p.starts_with(&prefix));
            ctx.state.staged_files.retain(|p, _| !p.starts_with(&prefix));
            ctx.state
                .directories
                .retain(|d| d != &path && !d.starts_with(&prefix));
            continue;
        }

        if ctx.state.files.contains_key(&path) {
            return Err(CommandError::usage(format!(
                "rm: cannot remove '{raw}': file is tracked by git"
            )));
        }
        let removed = ctx.state.working_directory.remove(&path).is_some()
            | ctx.state.staged_files.remove(&path).is_some();
        if !removed && !force {
            return Err(CommandError::usage(format!(
                "rm: cannot remove '{raw}': No such file or directory"
            )));
        }
    }
    Ok(())
}

/// Handle `mkdir`.
pub fn handle_mkdir(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    required(args, 0, "mkdir [-p] <dir>...")?;
    let parents = args.has("parents");

    for raw in &args.positionals {
        let path = normalize(raw);
        let dirs = all_directories(&ctx.state);
        if dirs.contains(&path) || ctx.state.working_content(&path).is_some() {
            if parents {
                continue;
            }
            return Err(CommandError::usage(format!(
                "mkdir: cannot create directory '{raw}': File exists"
            )));
        }

        match path.rsplit_once('/') {
            Some((parent, _)) if !parents && !dirs.contains(parent) => {
                return Err(CommandError::usage(format!(
                    "mkdir: cannot create directory '{raw}': No such file or directory"
                )));
            }
            Some(_) => {
                let mut prefix = String::new();
                for part in path.split('/') {
                    if !prefix.is_empty() {
                        prefix.push('/');
                    }
                    prefix.push_str(part);
                    ctx.state.directories.insert(prefix.clone());
                }
            }
            None => {
                ctx.state.directories.insert(path);
            }
        }
    }
    Ok(())
}

/// Handle `clear`.
pub fn handle_clear(ctx: &mut CommandContext<'_>, _args: &Args) -> HandlerResult {
    ctx.clear_screen = true;
    Ok(())
}

/// Handle `help`.
pub fn handle_help(ctx: &mut CommandContext<'_>, _args: &Args) -> HandlerResult {
    ctx.out.output(help::generate_help_text());
    Ok(())
}
