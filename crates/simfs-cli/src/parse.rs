/// Errors turning a line of input into a [`Command`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unterminated quote")]
    UnterminatedQuote,

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("Unknown command: {0}")]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `content` is `None` when the user should be prompted for it.
    Touch { path: String, content: Option<String> },
    Mkdir(String),
    Ls(String),
    Tree(String),
    Read(String),
    Detail { path: String, json: bool },
    Rm(String),
    Rmdir(String),
    Cd(String),
    Pwd,
    Df { json: bool },
    Fsck,
    Help,
    Exit,
}

/// Splits a line on whitespace. Double quotes group words; inside quotes
/// `\n`, `\"` and `\\` are unescaped.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quote = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quote = !in_quote;
                in_token = true;
            }
            '\\' if in_quote => match chars.next() {
                Some('n') => current.push('\n'),
                Some(other) => current.push(other),
                None => return Err(ParseError::UnterminatedQuote),
            },
            c if c.is_whitespace() && !in_quote => {
                if in_token {
                    parts.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quote {
        return Err(ParseError::UnterminatedQuote);
    }
    if in_token {
        parts.push(current);
    }
    Ok(parts)
}

impl Command {
    /// `Ok(None)` for blank lines and `#` comments.
    pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        let parts = tokenize(trimmed)?;
        let Some((program, args)) = parts.split_first() else {
            return Ok(None);
        };
        // Only `detail` and `df` take flags; elsewhere `--json` is an ordinary word.
        let takes_json = matches!(program.as_str(), "detail" | "stat" | "df");
        let json = takes_json && args.iter().any(|a| a == "--json");
        let mut positional = args
            .iter()
            .filter(|a| !(takes_json && a.as_str() == "--json"))
            .cloned();
        let first = positional.next();

        let command = match program.as_str() {
            "touch" => {
                let path = first.ok_or(ParseError::Usage("touch <path> [content]"))?;
                let rest: Vec<String> = positional.collect();
                let content = if rest.is_empty() {
                    None
                } else {
                    Some(rest.join(" "))
                };
                Command::Touch { path, content }
            }
            "mkdir" => Command::Mkdir(first.ok_or(ParseError::Usage("mkdir <path>"))?),
            "ls" => Command::Ls(first.unwrap_or_else(|| ".".to_string())),
            "tree" => Command::Tree(first.unwrap_or_else(|| ".".to_string())),
            "read" | "cat" => Command::Read(first.ok_or(ParseError::Usage("read <path>"))?),
            "detail" | "stat" => Command::Detail {
                path: first.ok_or(ParseError::Usage("detail <path> [--json]"))?,
                json,
            },
            "rm" => Command::Rm(first.ok_or(ParseError::Usage("rm <path>"))?),
            "rmdir" => Command::Rmdir(first.ok_or(ParseError::Usage("rmdir <path>"))?),
            "cd" => Command::Cd(first.unwrap_or_else(|| "/".to_string())),
            "pwd" => Command::Pwd,
            "df" => Command::Df { json },
            "fsck" => Command::Fsck,
            "help" => Command::Help,
            "exit" | "quit" => Command::Exit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}
