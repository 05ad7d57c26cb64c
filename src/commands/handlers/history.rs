//! History inspection handlers (`log`, `diff`, `show`, `tag`, `blame`,
//! `bisect`, `reflog`).

use std::sync::LazyLock;

use regex::Regex;

use super::{required, CommandContext, HandlerResult};
use crate::commands::args::Args;
use crate::error::CommandError;
use crate::repo::diff::{self, DiffStat};
use crate::repo::history::{all_history, head_history};
use crate::repo::{BisectState, Commit, Tag};

static COUNT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-(\d+)$").expect("static regex is valid"));

/// Handle `git log`.
pub fn handle_log(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let mut limit = match args.value("max-count") {
        Some(n) => Some(n.parse::<usize>().map_err(|_| {
            CommandError::fatal(format!("'{n}': not an integer"))
        })?),
        None => None,
    };
    let mut target: Option<&str> = None;
    for word in &args.positionals {
        if let Some(caps) = COUNT_WORD.captures(word) {
            limit = caps[1].parse().ok();
        } else if target.is_none() {
            target = Some(word);
        }
    }

    let history = match target {
        _ if args.has("all") => all_history(&ctx.state, ctx.default_branch()),
        Some(rev) => ctx.branch_history(rev).ok_or_else(|| {
            CommandError::fatal(format!(
                "ambiguous argument '{rev}': unknown revision or path not in the working tree."
            ))
        })?,
        None => head_history(&ctx.state),
    };

    if history.is_empty() {
        return Err(CommandError::fatal(format!(
            "your current branch '{}' does not have any commits yet",
            ctx.state.current_branch
        )));
    }

    let author = args.value("author").map(str::to_lowercase);
    let pickaxe = args.value("pickaxe");
    let mut selected: Vec<&Commit> = history
        .iter()
        .filter(|c| match &author {
            Some(needle) => c
                .author
                .as_deref()
                .is_some_and(|a| a.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .filter(|c| match pickaxe {
            Some(needle) => c.files.values().any(|content| content.contains(needle)),
            None => true,
        })
        .collect();

    if let Some(n) = limit {
        let skip = selected.len().saturating_sub(n);
        selected.drain(..skip);
    }

    let oneline = args.has("oneline");
    let graph = args.has("graph");
    let mut blocks = Vec::new();
    for commit in selected.iter().rev() {
        let refs = ctx.state.decorations(&commit.hash);
        let decoration = if refs.is_empty() {
            String::new()
        } else {
            format!(" ({})", refs.join(", "))
        };

        if oneline {
            let bullet = if graph { "* " } else { "" };
            blocks.push(format!(
                "{bullet}{}{decoration} {}",
                commit.short_hash(),
                commit.subject()
            ));
            continue;
        }

        let author = commit.author.clone().unwrap_or_else(|| ctx.author());
        let mut lines = vec![
            format!("commit {}{decoration}", commit.hash),
            format!("Author: {author} <{}>", ctx.author_email(&author)),
            String::new(),
        ];
        lines.extend(commit.message.lines().map(|l| format!("    {l}")));
        if graph {
            let mut iter = lines.into_iter();
            let head = iter.next().map(|l| format!("* {l}"));
            lines = head
                .into_iter()
                .chain(iter.map(|l| format!("| {l}")))
                .collect();
        }
        blocks.push(lines.join("\n"));
    }

    let separator = if oneline { "\n" } else { "\n\n" };
    if !blocks.is_empty() {
        ctx.out.output(blocks.join(separator));
    }
    Ok(())
}

/// One file's change between two versions.
struct FileChange {
    path: String,
    old: Option<String>,
    new: Option<String>,
}

impl FileChange {
    fn stat(&self) -> DiffStat {
        diff::stat(
            self.old.as_deref().unwrap_or(""),
            self.new.as_deref().unwrap_or(""),
        )
    }

    fn render_patch(&self) -> String {
        let path = &self.path;
        let mut lines = vec![format!("diff --git a/{path} b/{path}")];
        match (&self.old, &self.new) {
            (None, Some(_)) => {
                lines.push("new file mode 100644".to_string());
                lines.push("--- /dev/null".to_string());
                lines.push(format!("+++ b/{path}"));
            }
            (Some(_), None) => {
                lines.push("deleted file mode 100644".to_string());
                lines.push(format!("--- a/{path}"));
                lines.push("+++ /dev/null".to_string());
            }
            _ => {
                lines.push(format!("--- a/{path}"));
                lines.push(format!("+++ b/{path}"));
            }
        }
        for hunk in diff::hunks(
            self.old.as_deref().unwrap_or(""),
            self.new.as_deref().unwrap_or(""),
            3,
        ) {
            lines.push(hunk.header());
            lines.extend(hunk.lines.iter().map(|l| l.render()));
        }
        lines.join("\n")
    }
}

fn render_changes(ctx: &mut CommandContext<'_>, changes: &[FileChange], args: &Args) {
    if changes.is_empty() {
        return;
    }
    if args.has("name-only") {
        for change in changes {
            ctx.out.output(&change.path);
        }
        return;
    }
    if args.has("stat") {
        let width = changes.iter().map(|c| c.path.len()).max().unwrap_or(0);
        let mut total = DiffStat::default();
        for change in changes {
            let stat = change.stat();
            total.add(stat);
            ctx.out.output(diff::stat_row(&change.path, width, stat));
        }
        ctx.out.output(diff::summary_line(changes.len(), total));
        return;
    }
    for change in changes {
        ctx.out.output(change.render_patch());
    }
}

/// Handle `git diff`.
pub fn handle_diff(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let filter = |path: &str| -> bool {
        args.positionals.is_empty()
            || args
                .positionals
                .iter()
                .any(|p| p == path || path.starts_with(&format!("{}/", p.trim_end_matches('/'))))
    };

    let state = &ctx.state;
    let changes: Vec<FileChange> = if args.has("staged") {
        state
            .staged_files
            .iter()
            .filter(|(path, _)| filter(path.as_str()))
            .filter(|(path, content)| state.files.get(*path) != Some(*content))
            .map(|(path, content)| FileChange {
                path: path.clone(),
                old: state.files.get(path).cloned(),
                new: Some(content.clone()),
            })
            .collect()
    } else {
        state
            .modified_paths()
            .into_iter()
            .filter(|path| filter(path.as_str()))
            .map(|path| FileChange {
                old: state.index_content(&path).cloned(),
                new: state.working_directory.get(&path).cloned(),
                path,
            })
            .collect()
    };

    render_changes(ctx, &changes, args);
    Ok(())
}

/// Handle `git show`.
pub fn handle_show(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let rev = args.positional(0).unwrap_or("HEAD");
    let commit = ctx.resolve_commit(rev).ok_or_else(|| {
        CommandError::fatal(format!(
            "ambiguous argument '{rev}': unknown revision or path not in the working tree."
        ))
    })?;

    if let Some((name, tag)) = ctx
        .state
        .tags
        .iter()
        .find(|(name, t)| *name == rev && t.annotated)
    {
        ctx.out.output(format!("tag {name}"));
        if let Some(message) = &tag.message {
            ctx.out.output(format!("\n{message}\n"));
        }
    }

    let refs = ctx.state.decorations(&commit.hash);
    let decoration = if refs.is_empty() {
        String::new()
    } else {
        format!(" ({})", refs.join(", "))
    };
    let author = commit.author.clone().unwrap_or_else(|| ctx.author());
    let email = ctx.author_email(&author);
    ctx.out.output(format!("commit {}{decoration}", commit.hash));
    ctx.out.output(format!("Author: {author} <{email}>"));
    ctx.out.output("");
    for line in commit.message.lines() {
        ctx.out.output(format!("    {line}"));
    }
    ctx.out.output("");

    // Compare every path against the commit's parent on the same history.
    let history = ctx
        .branch_history(&commit.branch)
        .filter(|h| h.iter().any(|c| c.hash == commit.hash))
        .unwrap_or_else(|| head_history(&ctx.state));
    let parent_files = parent_snapshot(&history, &commit.hash);
    let changes: Vec<FileChange> = commit
        .files
        .iter()
        .filter(|(path, content)| parent_files.get(*path) != Some(*content))
        .map(|(path, content)| FileChange {
            path: path.clone(),
            old: parent_files.get(path).cloned(),
            new: Some(content.clone()),
        })
        .collect();
    render_changes(ctx, &changes, args);
    Ok(())
}

/// Committed tree just before `hash` on `history`.
fn parent_snapshot(history: &[Commit], hash: &str) -> crate::repo::FileMap {
    let mut files = crate::repo::FileMap::new();
    for commit in history {
        if commit.hash == hash {
            break;
        }
        files.extend(commit.files.clone());
    }
    files
}

/// Handle `git tag`.
pub fn handle_tag(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    if args.has("delete") {
        let name = required(args, 0, "git tag -d <tagname>")?;
        let Some(tag) = ctx.state.tags.remove(name) else {
            return Err(CommandError::error(format!("tag '{name}' not found.")));
        };
        ctx.out.success(format!(
            "Deleted tag '{name}' (was {})",
            crate::repo::short(&tag.hash)
        ));
        return Ok(());
    }

    let Some(name) = args.positional(0).filter(|_| !args.has("list")) else {
        for name in ctx.state.tags.keys() {
            ctx.out.output(name);
        }
        return Ok(());
    };

    if !super::valid_ref_name(name) {
        return Err(CommandError::fatal(format!("'{name}' is not a valid tag name.")));
    }
    if ctx.state.tags.contains_key(name) {
        return Err(CommandError::fatal(format!("tag '{name}' already exists")));
    }

    let rev = args.positional(1).unwrap_or("HEAD");
    let commit = ctx.resolve_commit(rev).ok_or_else(|| {
        CommandError::fatal(format!("Failed to resolve '{rev}' as a valid ref."))
    })?;

    let message = args.value("message").map(str::to_string);
    let annotated = args.has("annotate") || message.is_some();
    if annotated && message.is_none() {
        return Err(CommandError::fatal("no tag message given; use -m <msg>"));
    }

    ctx.state.tags.insert(
        name.to_string(),
        Tag {
            annotated,
            hash: commit.hash.clone(),
            message,
        },
    );
    ctx.out.success(format!(
        "Created {} tag '{name}' at {}",
        if annotated { "annotated" } else { "lightweight" },
        commit.short_hash()
    ));
    Ok(())
}

/// Handle `git blame`.
pub fn handle_blame(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let path = required(args, 0, "git blame <file>")?;
    let history = head_history(&ctx.state);
    let Some(content) = ctx.state.files.get(path).cloned() else {
        return Err(CommandError::fatal(format!("no such path '{path}' in HEAD")));
    };

    let width = history
        .iter()
        .filter_map(|c| c.author.as_ref().map(String::len))
        .chain(std::iter::once(ctx.author().len()))
        .max()
        .unwrap_or(0);

    for (idx, line) in content.lines().enumerate() {
        // Oldest commit whose copy of the file has the line.
        let origin = history
            .iter()
            .find(|c| c.files.get(path).is_some_and(|f| f.lines().any(|l| l == line)));

        let row = match origin {
            Some(commit) => {
                let author = commit.author.clone().unwrap_or_else(|| ctx.author());
                format!(
                    "{} ({author:<width$} {:>3}) {line}",
                    commit.short_hash(),
                    idx + 1
                )
            }
            None => format!(
                "00000000 ({:<width$} {:>3}) {line}",
                "Not Committed Yet",
                idx + 1
            ),
        };
        ctx.out.output(row);
    }
    Ok(())
}

/// Handle `git bisect`.
pub fn handle_bisect(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let sub = required(args, 0, "git bisect (start | good | bad | reset)")?;
    let history = ctx.state.commits.clone();

    match sub {
        "start" => {
            ctx.state.bisect = Some(BisectState::default());
            ctx.out.output("status: waiting for both good and bad commits");
            Ok(())
        }
        "reset" => {
            if ctx.state.bisect.take().is_none() {
                ctx.out.output("We are not bisecting.");
                return Ok(());
            }
            ctx.out.success(format!(
                "Previous HEAD position was restored. Switched to branch '{}'",
                ctx.state.current_branch
            ));
            Ok(())
        }
        "good" | "bad" => {
            let Some(mut bisect) = ctx.state.bisect.clone() else {
                return Err(CommandError::usage(
                    "You need to start by \"git bisect start\"",
                ));
            };
            let rev = args
                .positional(1)
                .map(str::to_string)
                .or_else(|| bisect.current.clone())
                .unwrap_or_else(|| "HEAD".to_string());
            let commit = ctx
                .resolve_commit(&rev)
                .ok_or_else(|| CommandError::fatal(format!("Bad rev input: {rev}")))?;

            if sub == "good" {
                bisect.good = Some(commit.hash.clone());
            } else {
                bisect.bad = Some(commit.hash.clone());
            }

            let position = |hash: &Option<String>| {
                hash.as_ref()
                    .and_then(|h| history.iter().position(|c| &c.hash == h))
            };
            match (position(&bisect.good), position(&bisect.bad)) {
                (Some(good), Some(bad)) if good < bad => {
                    if bad - good == 1 {
                        let culprit = &history[bad];
                        ctx.out.success(format!("{} is the first bad commit", culprit.hash));
                        ctx.out.output(format!("    {}", culprit.subject()));
                        bisect.current = None;
                    } else {
                        let remaining = bad - good - 1;
                        let mid = good + (bad - good) / 2;
                        let probe = &history[mid];
                        let steps = usize::BITS - remaining.leading_zeros();
                        ctx.out.output(format!(
                            "Bisecting: {} revisions left to test after this (roughly {} steps)",
                            remaining / 2,
                            steps.saturating_sub(1)
                        ));
                        ctx.out
                            .output(format!("[{}] {}", probe.hash, probe.subject()));
                        bisect.current = Some(probe.hash.clone());
                    }
                }
                (Some(_), Some(_)) => {
                    return Err(CommandError::usage(
                        "Some good revs are not ancestors of the bad rev.",
                    ))
                }
                (Some(_), None) => ctx
                    .out
                    .output("status: waiting for bad commit, 1 good commit known"),
                (None, Some(_)) => ctx
                    .out
                    .output("status: waiting for good commit(s), bad commit known"),
                (None, None) => {}
            }
            ctx.state.bisect = Some(bisect);
            Ok(())
        }
        other => Err(CommandError::usage(format!(
            "error: unknown bisect subcommand '{other}'"
        ))),
    }
}

/// Handle `git reflog`.
pub fn handle_reflog(ctx: &mut CommandContext<'_>, args: &Args) -> HandlerResult {
    let limit = args
        .value("max-count")
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(usize::MAX);

    let lines: Vec<String> = ctx
        .state
        .reflog
        .iter()
        .rev()
        .take(limit)
        .enumerate()
        .map(|(idx, entry)| {
            format!(
                "{} HEAD@{{{idx}}}: {}: {}",
                crate::repo::short(&entry.hash),
                entry.action,
                entry.message
            )
        })
        .collect();
    for line in lines {
        ctx.out.output(line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterpreterSettings;
    use crate::commands::definitions::{find, Program};
    use crate::commands::tokenizer::tokenize;
    use crate::repo::hash::SequentialHashes;
    use crate::repo::{FileMap, RepositoryState};

    fn commit(hash: &str, message: &str, author: &str, files: &[(&str, &str)]) -> Commit {
        Commit::new(
            hash,
            message,
            files
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<FileMap>(),
            "main",
        )
        .with_author(author)
    }

    fn repo() -> RepositoryState {
        let mut state = RepositoryState::initialized();
        state.commits = vec![
            commit("aaaa001", "Add config", "Alice", &[("config.txt", "port=3000")]),
            commit("aaaa002", "Add password check", "Bob", &[("auth.js", "check(password)")]),
            commit("aaaa003", "Tidy auth", "alice", &[("auth.js", "verify()")]),
        ];
        state.files.insert("config.txt".into(), "port=3000".into());
        state.files.insert("auth.js".into(), "verify()".into());
        state
    }

    fn run(state: RepositoryState, verb: &str, line: &str) -> (HandlerResult, Vec<String>) {
        let def = find(Program::Git, verb).unwrap();
        let args = Args::parse(&tokenize(line), def.flags).unwrap();
        let settings = InterpreterSettings::default();
        let mut hashes = SequentialHashes::new();
        let mut ctx = CommandContext::new(state, &settings, &mut hashes);
        let result = (def.handler)(&mut ctx, &args);
        let lines = ctx.out.lines().iter().map(|l| l.text.clone()).collect();
        (result, lines)
    }

    #[test]
    fn test_log_oneline_newest_first() {
        let (_, lines) = run(repo(), "log", "--oneline");
        assert_eq!(
            lines,
            vec![
                "aaaa003 (HEAD -> main) Tidy auth",
                "aaaa002 Add password check",
                "aaaa001 Add config"
            ]
        );
    }

    #[test]
    fn test_log_filters_compose_before_limit() {
        let (_, lines) = run(repo(), "log", "--oneline --author=ALICE -1");
        assert_eq!(lines, vec!["aaaa003 (HEAD -> main) Tidy auth"]);

        let (_, lines) = run(repo(), "log", "--oneline -Spassword");
        assert_eq!(lines, vec!["aaaa002 Add password check"]);
    }

    #[test]
    fn test_log_all_includes_other_branches() {
        let mut state = repo();
        state.branches.insert("feature".into());
        state.feature_commits = vec![Commit::new(
            "ffff001",
            "Change port",
            FileMap::new(),
            "feature",
        )];

        let (_, lines) = run(state.clone(), "log", "--oneline");
        assert_eq!(lines.len(), 3);

        let (_, lines) = run(state, "log", "--oneline --all");
        assert_eq!(
            lines,
            vec![
                "ffff001 Change port",
                "aaaa003 (HEAD -> main) Tidy auth",
                "aaaa002 Add password check",
                "aaaa001 Add config"
            ]
        );
    }

    #[test]
    fn test_log_on_empty_history() {
        let (result, _) = run(RepositoryState::initialized(), "log", "");
        assert_eq!(
            result.unwrap_err().to_string(),
            "fatal: your current branch 'main' does not have any commits yet"
        );
    }

    #[test]
    fn test_diff_shows_unstaged_hunk() {
        let mut state = repo();
        state
            .working_directory
            .insert("config.txt".into(), "port=8080".into());
        let (_, lines) = run(state, "diff", "");
        assert!(lines.contains(&"diff --git a/config.txt b/config.txt".to_string()));
        assert!(lines.contains(&"-port=3000".to_string()));
        assert!(lines.contains(&"+port=8080".to_string()));
    }

    #[test]
    fn test_diff_stat_for_staged() {
        let mut state = repo();
        state.staged_files.insert("new.txt".into(), "a\nb".into());
        let (_, lines) = run(state, "diff", "--cached --stat");
        assert_eq!(lines, vec![" new.txt | 2 ++", " 1 file changed, 2 insertions(+)"]);
    }

    #[test]
    fn test_tag_duplicates_rejected() {
        let mut state = repo();
        state.tags.insert(
            "v1.0".into(),
            Tag {
                annotated: false,
                hash: "aaaa001".into(),
                message: None,
            },
        );
        let (result, _) = run(state, "tag", "v1.0");
        assert_eq!(result.unwrap_err().to_string(), "fatal: tag 'v1.0' already exists");
    }

    #[test]
    fn test_blame_attributes_lines() {
        let (_, lines) = run(repo(), "blame", "auth.js");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("aaaa003 (alice"));
    }

    #[test]
    fn test_bisect_narrows_to_first_bad() {
        let mut state = repo();
        state.bisect = Some(BisectState::default());
        let (_, _) = run(state.clone(), "bisect", "bad");
        state.bisect = Some(BisectState {
            good: Some("aaaa002".into()),
            bad: None,
            current: None,
        });
        let (_, lines) = run(state, "bisect", "bad aaaa003");
        assert_eq!(lines[0], "aaaa003 is the first bad commit");
    }
}
