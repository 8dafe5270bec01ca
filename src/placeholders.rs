//! Splitting SQL on `?` placeholders for client-side parameter injection.
//!
//! A single pass over the input tracks quoting, identifier and comment
//! state so that only placeholders in plain code are counted. Executable
//! comment forms (`/*! ... */`, `/*M! ... */`, `/*!NNNNN ... */`) are
//! scanned as normal code because the server may run their contents.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Normal,
    String,
    Escape,
    SlashStarComment,
    EolComment,
    Backtick,
}

/// SQL split on placeholders into `param_count + 1` byte fragments.
#[derive(Debug)]
pub struct ParsedSql {
    parts: Vec<Box<[u8]>>,

    /// The statement ends with a semicolon (possibly followed by spaces).
    pub ends_with_semicolon: bool,
}

impl ParsedSql {
    pub fn param_count(&self) -> usize {
        self.parts.len() - 1
    }

    pub fn parts(&self) -> &[Box<[u8]>] {
        &self.parts
    }
}

/// Split `sql` on unquoted `?` placeholders.
///
/// `no_backslash_escapes` mirrors the server's NO_BACKSLASH_ESCAPES mode:
/// when set, a backslash inside a string is an ordinary character.
pub fn parameter_parts(sql: &str, no_backslash_escapes: bool) -> ParsedSql {
    let bytes = sql.as_bytes();

    let mut parts = Vec::new();
    let mut state = LexState::Normal;
    let mut last_char = 0u8;
    let mut single_quotes = false;
    let mut ends_with_semicolon = false;
    let mut last_parameter_position = 0;

    for (i, &car) in bytes.iter().enumerate() {
        if state == LexState::Escape
            && !((car == b'\'' && single_quotes) || (car == b'"' && !single_quotes))
        {
            state = LexState::String;
            last_char = car;
            continue;
        }

        match car {
            b'*' => {
                if state == LexState::Normal && last_char == b'/' {
                    // /*! and /*M! forms stay executable code
                    let executable = matches!(bytes.get(i + 1), Some(b'!'))
                        || (matches!(bytes.get(i + 1), Some(b'M'))
                            && matches!(bytes.get(i + 2), Some(b'!')));

                    if !executable {
                        state = LexState::SlashStarComment;
                    }
                }
            }

            b'/' => {
                if state == LexState::SlashStarComment && last_char == b'*' {
                    state = LexState::Normal;
                } else if state == LexState::Normal && last_char == b'/' {
                    state = LexState::EolComment;
                }
            }

            b'#' => {
                if state == LexState::Normal {
                    state = LexState::EolComment;
                }
            }

            b'-' => {
                if state == LexState::Normal && last_char == b'-' {
                    state = LexState::EolComment;
                }
            }

            b'\n' => {
                if state == LexState::EolComment {
                    state = LexState::Normal;
                }
            }

            b'"' => match state {
                LexState::Normal => {
                    state = LexState::String;
                    single_quotes = false;
                }
                LexState::String if !single_quotes => state = LexState::Normal,
                LexState::Escape => state = LexState::String,
                _ => {}
            },

            b'\'' => match state {
                LexState::Normal => {
                    state = LexState::String;
                    single_quotes = true;
                }
                LexState::String if single_quotes => state = LexState::Normal,
                LexState::Escape => state = LexState::String,
                _ => {}
            },

            b'\\' => {
                if !no_backslash_escapes && state == LexState::String {
                    state = LexState::Escape;
                }
            }

            b';' => {
                if state == LexState::Normal {
                    ends_with_semicolon = true;
                }
            }

            b'?' => {
                if state == LexState::Normal {
                    parts.push(bytes[last_parameter_position..i].into());
                    last_parameter_position = i + 1;
                }
            }

            b'`' => match state {
                LexState::Backtick => state = LexState::Normal,
                LexState::Normal => state = LexState::Backtick,
                _ => {}
            },

            _ => {
                if state == LexState::Normal && ends_with_semicolon && car >= 40 {
                    ends_with_semicolon = false;
                }
            }
        }

        last_char = car;
    }

    parts.push(bytes[last_parameter_position..].into());

    ParsedSql {
        parts,
        ends_with_semicolon,
    }
}

#[cfg(test)]
mod tests {
    use super::parameter_parts;

    fn rejoin(sql: &str, no_backslash_escapes: bool) -> String {
        let parsed = parameter_parts(sql, no_backslash_escapes);
        let parts: Vec<&str> = parsed
            .parts()
            .iter()
            .map(|p| std::str::from_utf8(p).unwrap())
            .collect();
        parts.join("?")
    }

    #[test]
    fn it_counts_plain_placeholders() {
        let parsed = parameter_parts("INSERT INTO t VALUES (?, ?, ?)", false);
        assert_eq!(parsed.param_count(), 3);
    }

    #[test]
    fn it_rejoins_to_the_original() {
        for sql in [
            "SELECT 1",
            "SELECT ?, '?', ?",
            "SELECT * FROM t WHERE a = ? AND b = 'x?y' -- trailing ? here\n AND c = ?",
            "UPDATE `weird?table` SET a = ? /* not ? */ WHERE b = ?",
        ] {
            assert_eq!(rejoin(sql, false), sql);
        }
    }

    #[test]
    fn it_ignores_placeholders_in_strings_identifiers_and_comments() {
        assert_eq!(parameter_parts("SELECT '?'", false).param_count(), 0);
        assert_eq!(parameter_parts("SELECT \"?\"", false).param_count(), 0);
        assert_eq!(parameter_parts("SELECT `a?b` FROM t", false).param_count(), 0);
        assert_eq!(parameter_parts("SELECT 1 /* ? */", false).param_count(), 0);
        assert_eq!(parameter_parts("SELECT 1 -- ?\n", false).param_count(), 0);
        assert_eq!(parameter_parts("SELECT 1 # ?\n", false).param_count(), 0);
        assert_eq!(parameter_parts("SELECT 1 // ?\n", false).param_count(), 0);
    }

    #[test]
    fn it_counts_placeholders_in_executable_comments() {
        assert_eq!(
            parameter_parts("SELECT /*! STRAIGHT_JOIN ? */ 1", false).param_count(),
            1
        );
        assert_eq!(
            parameter_parts("SELECT /*M! ? */ 1", false).param_count(),
            1
        );
        assert_eq!(
            parameter_parts("SELECT /*!100301 ? */ 1", false).param_count(),
            1
        );
    }

    #[test]
    fn it_honours_escape_rules_inside_strings() {
        // the escaped quote does not close the string
        assert_eq!(parameter_parts("SELECT 'a\\'?' , ?", false).param_count(), 1);
        assert_eq!(parameter_parts("SELECT 'a\\', ?", false).param_count(), 0);

        // with NO_BACKSLASH_ESCAPES the backslash is literal, so the
        // string closes at the second quote
        assert_eq!(parameter_parts("SELECT 'a\\', ?", true).param_count(), 1);
    }

    #[test]
    fn it_notes_trailing_semicolons() {
        assert!(parameter_parts("SELECT 1;", false).ends_with_semicolon);
        assert!(parameter_parts("SELECT 1;  ", false).ends_with_semicolon);
        assert!(!parameter_parts("SELECT 1; SELECT 2", false).ends_with_semicolon);
    }
}
