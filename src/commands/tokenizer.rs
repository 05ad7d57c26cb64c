//! Tokenizer for command lines.
//!
//! Provides robust parsing of command arguments with support for:
//! - Quoted strings (single and double quotes)
//! - Escape sequences within quotes
//! - Long flags with optional values (`--flag`, `--flag=value`)
//! - Clustered short flags (`-am`, `-Sneedle`)
//! - Numeric words (`-3`) and the `--` separator

/// A token parsed from command input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A plain word (unquoted or quoted argument).
    Word(String),
    /// A long flag, with its `=value` part if present.
    LongFlag { name: String, value: Option<String> },
    /// A cluster of short flags (`-am` → "am").
    ShortFlags(String),
    /// The `--` end-of-options marker.
    Separator,
}

impl Token {
    /// Returns the token as a word if it is one.
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(s) => Some(s),
            _ => None,
        }
    }

    /// Renders the token back into command-line form.
    pub fn to_arg(&self) -> String {
        match self {
            Token::Word(w) => w.clone(),
            Token::LongFlag { name, value: None } => format!("--{name}"),
            Token::LongFlag {
                name,
                value: Some(v),
            } => format!("--{name}={v}"),
            Token::ShortFlags(cluster) => format!("-{cluster}"),
            Token::Separator => "--".to_string(),
        }
    }
}

/// Tokenizes a command line.
///
/// Handles:
/// - Whitespace-separated tokens
/// - Double-quoted strings: `"hello world"` → `hello world`
/// - Single-quoted strings: `'hello world'` → `hello world`
/// - Escape sequences in quotes: `"say \"hi\""` → `say "hi"`
/// - Long flags: `--force` → LongFlag { name: "force", value: None }
/// - Long flags with values: `--author="Jane Doe"` → LongFlag { name: "author", value: Some("Jane Doe") }
/// - Short flags: `-am` → ShortFlags("am")
/// - Dash-digit words: `-3` → Word("-3")
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        // Skip whitespace
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '-' {
            chars.next();
            match chars.peek() {
                Some('-') => {
                    chars.next();
                    let body = collect_word_or_quoted(&mut chars);
                    if body.is_empty() {
                        tokens.push(Token::Separator);
                    } else if let Some((name, value)) = body.split_once('=') {
                        tokens.push(Token::LongFlag {
                            name: name.to_string(),
                            value: Some(value.to_string()),
                        });
                    } else {
                        tokens.push(Token::LongFlag {
                            name: body,
                            value: None,
                        });
                    }
                }
                Some(next) if next.is_alphabetic() => {
                    let cluster = collect_word_or_quoted(&mut chars);
                    tokens.push(Token::ShortFlags(cluster));
                }
                _ => {
                    // Just a dash or `-3`, treat as word
                    let mut word = String::from("-");
                    word.push_str(&collect_word_or_quoted(&mut chars));
                    tokens.push(Token::Word(word));
                }
            }
            continue;
        }

        let quoted = c == '"' || c == '\'';
        let word = collect_word_or_quoted(&mut chars);
        if word.is_empty() && !quoted {
            continue;
        }
        tokens.push(Token::Word(word));
    }

    tokens
}

/// Collects a word up to whitespace, splicing in quoted segments.
fn collect_word_or_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut result = String::new();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            break;
        }

        if c == '"' || c == '\'' {
            chars.next();
            let quoted = collect_quoted(chars, c);
            result.push_str(&quoted);
            continue;
        }

        chars.next();
        result.push(c);
    }

    result
}

/// Collects characters inside quotes, handling escape sequences.
fn collect_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, quote: char) -> String {
    let mut result = String::new();
    let mut escaped = false;

    while let Some(&c) = chars.peek() {
        chars.next();

        if escaped {
            // Handle escape sequences
            match c {
                'n' => result.push('\n'),
                't' => result.push('\t'),
                '\\' => result.push('\\'),
                '"' => result.push('"'),
                '\'' => result.push('\''),
                _ => {
                    // Unknown escape, keep as-is
                    result.push('\\');
                    result.push(c);
                }
            }
            escaped = false;
            continue;
        }

        if c == '\\' && quote == '"' {
            escaped = true;
            continue;
        }

        if c == quote {
            break; // End of quoted string
        }

        result.push(c);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    fn long(name: &str, value: Option<&str>) -> Token {
        Token::LongFlag {
            name: name.to_string(),
            value: value.map(str::to_string),
        }
    }

    #[test]
    fn test_simple_words() {
        assert_eq!(tokenize("git status"), vec![word("git"), word("status")]);
    }

    #[test]
    fn test_double_quoted_message() {
        let tokens = tokenize(r#"git commit -m "Add login page""#);
        assert_eq!(
            tokens,
            vec![
                word("git"),
                word("commit"),
                Token::ShortFlags("m".to_string()),
                word("Add login page")
            ]
        );
    }

    #[test]
    fn test_single_quoted_string() {
        let tokens = tokenize("echo 'hello world'");
        assert_eq!(tokens, vec![word("echo"), word("hello world")]);
    }

    #[test]
    fn test_escaped_quotes() {
        let tokens = tokenize(r#"-m "say \"hello\"""#);
        assert_eq!(
            tokens,
            vec![Token::ShortFlags("m".to_string()), word("say \"hello\"")]
        );
    }

    #[test]
    fn test_long_flag_with_quoted_value() {
        let tokens = tokenize(r#"--author="Jane Doe" --force"#);
        assert_eq!(tokens, vec![long("author", Some("Jane Doe")), long("force", None)]);
    }

    #[test]
    fn test_short_flag_cluster() {
        let tokens = tokenize("-am fix -Spassword");
        assert_eq!(
            tokens,
            vec![
                Token::ShortFlags("am".to_string()),
                word("fix"),
                Token::ShortFlags("Spassword".to_string())
            ]
        );
    }

    #[test]
    fn test_numeric_dash_word() {
        assert_eq!(tokenize("log -3"), vec![word("log"), word("-3")]);
    }

    #[test]
    fn test_separator() {
        assert_eq!(
            tokenize("checkout -- app.js"),
            vec![word("checkout"), Token::Separator, word("app.js")]
        );
    }

    #[test]
    fn test_key_value_stays_a_word() {
        assert_eq!(
            tokenize("echo port=3000 > config.txt"),
            vec![word("echo"), word("port=3000"), word(">"), word("config.txt")]
        );
    }

    #[test]
    fn test_empty_quotes_produce_empty_word() {
        assert_eq!(tokenize(r#"-m """#), vec![Token::ShortFlags("m".to_string()), word("")]);
    }

    #[test]
    fn test_token_methods() {
        assert_eq!(long("force", None).to_arg(), "--force");
        assert_eq!(long("author", Some("Jane")).to_arg(), "--author=Jane");
        assert_eq!(Token::ShortFlags("am".to_string()).to_arg(), "-am");
        assert_eq!(word("x").as_word(), Some("x"));
    }
}
