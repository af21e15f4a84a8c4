//! Minimal gettext PO reader.
//!
//! Understands comments, `#,` flags, `#~` obsolete entries, `msgctxt`,
//! `msgid`, `msgid_plural`, `msgstr` / `msgstr[n]`, multi-line string
//! continuation and the usual C escapes. Anything else is a syntax error.

use thiserror::Error;

/// One catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoEntry {
    pub context: Option<String>,
    pub msgid: String,
    pub msgid_plural: Option<String>,
    /// `msgstr`, or `msgstr[0..n]` for plural entries
    pub msgstr: Vec<String>,
    pub flags: Vec<String>,
    pub obsolete: bool,
}

impl PoEntry {
    /// The header entry carries catalog metadata under an empty msgid.
    pub fn is_header(&self) -> bool {
        self.msgid.is_empty() && self.context.is_none()
    }

    pub fn is_fuzzy(&self) -> bool {
        self.flags.iter().any(|flag| flag == "fuzzy")
    }

    /// The singular translation, if present and not blank.
    pub fn translation(&self) -> Option<&str> {
        self.msgstr
            .first()
            .map(String::as_str)
            .filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoParseError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
}

fn syntax(line: usize, message: impl Into<String>) -> PoParseError {
    PoParseError::Syntax {
        line,
        message: message.into(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Context,
    Id,
    IdPlural,
    Str(usize),
}

#[derive(Default)]
struct Builder {
    entry: PoEntry,
    has_msgid: bool,
    last: Option<Field>,
}

impl Builder {
    fn push(&mut self, field: Field, text: String) {
        match field {
            Field::Context => self.entry.context.get_or_insert_with(String::new).push_str(&text),
            Field::Id => self.entry.msgid.push_str(&text),
            Field::IdPlural => self
                .entry
                .msgid_plural
                .get_or_insert_with(String::new)
                .push_str(&text),
            Field::Str(index) => {
                if self.entry.msgstr.len() <= index {
                    self.entry.msgstr.resize(index + 1, String::new());
                }
                self.entry.msgstr[index].push_str(&text);
            }
        }
    }

    fn is_empty(&self) -> bool {
        !self.has_msgid && self.entry.context.is_none() && self.entry.flags.is_empty()
    }
}

/// Parse a whole PO document.
pub fn parse(input: &str) -> Result<Vec<PoEntry>, PoParseError> {
    let mut entries = Vec::new();
    let mut current = Builder::default();

    let finish = |builder: &mut Builder, entries: &mut Vec<PoEntry>| {
        let done = std::mem::take(builder);
        if done.has_msgid {
            entries.push(done.entry);
        }
    };

    for (index, raw) in input.lines().enumerate() {
        let line_no = index + 1;
        let mut line = raw.trim();

        if line.is_empty() {
            finish(&mut current, &mut entries);
            continue;
        }

        let mut obsolete = false;
        if let Some(rest) = line.strip_prefix("#~") {
            obsolete = true;
            line = rest.trim();
            if current.has_msgid && !current.entry.obsolete {
                finish(&mut current, &mut entries);
            }
            if line.is_empty() {
                continue;
            }
        } else if let Some(rest) = line.strip_prefix("#,") {
            if current.has_msgid {
                finish(&mut current, &mut entries);
            }
            current.entry.flags.extend(
                rest.split(',')
                    .map(str::trim)
                    .filter(|flag| !flag.is_empty())
                    .map(str::to_string),
            );
            continue;
        } else if line.starts_with('#') {
            // translator, extracted, reference and previous-msgid comments
            if current.has_msgid {
                finish(&mut current, &mut entries);
            }
            continue;
        }

        if line.starts_with('"') {
            let field = current
                .last
                .ok_or_else(|| syntax(line_no, "string continuation without a keyword"))?;
            let text = unquote(line).map_err(|message| syntax(line_no, message))?;
            current.push(field, text);
            continue;
        }

        let (keyword, rest) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| syntax(line_no, format!("unexpected content: {}", line)))?;
        let field = parse_keyword(keyword)
            .ok_or_else(|| syntax(line_no, format!("unknown keyword: {}", keyword)))?;

        // A new msgctxt/msgid after a complete entry starts the next entry.
        if matches!(field, Field::Context | Field::Id) && current.has_msgid {
            finish(&mut current, &mut entries);
        }
        if obsolete {
            current.entry.obsolete = true;
        }

        let text = unquote(rest.trim()).map_err(|message| syntax(line_no, message))?;
        if matches!(field, Field::Id) {
            current.has_msgid = true;
        } else if !current.has_msgid && !matches!(field, Field::Context) {
            return Err(syntax(line_no, format!("{} before msgid", keyword)));
        }
        current.push(field, text);
        current.last = Some(field);
    }

    if !current.is_empty() {
        finish(&mut current, &mut entries);
    }

    Ok(entries)
}

fn parse_keyword(keyword: &str) -> Option<Field> {
    match keyword {
        "msgctxt" => Some(Field::Context),
        "msgid" => Some(Field::Id),
        "msgid_plural" => Some(Field::IdPlural),
        "msgstr" => Some(Field::Str(0)),
        other => other
            .strip_prefix("msgstr[")
            .and_then(|rest| rest.strip_suffix(']'))
            .and_then(|index| index.parse().ok())
            .map(Field::Str),
    }
}

/// Strip the surrounding quotes and resolve escapes.
fn unquote(quoted: &str) -> Result<String, String> {
    let inner = quoted
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| format!("expected a quoted string, got: {}", quoted))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '"' {
            return Err(format!("unescaped quote in: {}", quoted));
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => return Err(format!("unterminated string: {}", quoted)),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# Ukrainian translations
msgid ""
msgstr ""
"Content-Type: text/plain; charset=UTF-8\n"
"Language: uk\n"

#: apps/services/models.py:8
msgid "Name"
msgstr "Назва"

#, fuzzy, python-format
msgid "Active"
msgstr "Активна"

msgid "Untranslated"
msgstr ""

msgctxt "menu"
msgid "Open"
msgstr "Відкрити"

msgid "One project"
msgid_plural "%d projects"
msgstr[0] "%d проєкт"
msgstr[1] "%d проєкти"
msgstr[2] "%d проєктів"

#~ msgid "Old label"
#~ msgstr "Стара мітка"
"#;

    #[test]
    fn test_parse_sample_entry_count() {
        let entries = parse(SAMPLE).unwrap();
        assert_eq!(entries.len(), 7);
    }

    #[test]
    fn test_header_entry() {
        let entries = parse(SAMPLE).unwrap();
        let header = &entries[0];
        assert!(header.is_header());
        assert!(header.msgstr[0].contains("Language: uk\n"));
    }

    #[test]
    fn test_simple_entry() {
        let entries = parse(SAMPLE).unwrap();
        let name = entries.iter().find(|e| e.msgid == "Name").unwrap();
        assert_eq!(name.translation(), Some("Назва"));
        assert!(!name.is_fuzzy());
        assert!(!name.obsolete);
    }

    #[test]
    fn test_flags_parsed() {
        let entries = parse(SAMPLE).unwrap();
        let active = entries.iter().find(|e| e.msgid == "Active").unwrap();
        assert!(active.is_fuzzy());
        assert_eq!(active.flags, vec!["fuzzy", "python-format"]);
    }

    #[test]
    fn test_untranslated_has_no_translation() {
        let entries = parse(SAMPLE).unwrap();
        let entry = entries.iter().find(|e| e.msgid == "Untranslated").unwrap();
        assert_eq!(entry.translation(), None);
    }

    #[test]
    fn test_context_entry() {
        let entries = parse(SAMPLE).unwrap();
        let open = entries.iter().find(|e| e.msgid == "Open").unwrap();
        assert_eq!(open.context.as_deref(), Some("menu"));
        assert!(!open.is_header());
    }

    #[test]
    fn test_plural_entry() {
        let entries = parse(SAMPLE).unwrap();
        let plural = entries.iter().find(|e| e.msgid == "One project").unwrap();
        assert_eq!(plural.msgid_plural.as_deref(), Some("%d projects"));
        assert_eq!(plural.msgstr.len(), 3);
        assert_eq!(plural.translation(), Some("%d проєкт"));
    }

    #[test]
    fn test_obsolete_entry() {
        let entries = parse(SAMPLE).unwrap();
        let old = entries.iter().find(|e| e.msgid == "Old label").unwrap();
        assert!(old.obsolete);
        assert_eq!(old.translation(), Some("Стара мітка"));
    }

    #[test]
    fn test_multiline_and_escapes() {
        let input = "msgid \"\"\n\"Say \\\"hi\\\"\"\n\" twice\"\nmsgstr \"Line\\none\\tTab \\\\\"\n";
        let entries = parse(input).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].msgid, "Say \"hi\" twice");
        assert_eq!(entries[0].msgstr[0], "Line\none\tTab \\");
    }

    #[test]
    fn test_entries_without_blank_separator() {
        let input = "msgid \"a\"\nmsgstr \"A\"\nmsgid \"b\"\nmsgstr \"B\"\n";
        let entries = parse(input).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].translation(), Some("B"));
    }

    #[test]
    fn test_crlf_input() {
        let input = "msgid \"a\"\r\nmsgstr \"A\"\r\n";
        let entries = parse(input).unwrap();
        assert_eq!(entries[0].translation(), Some("A"));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("# only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_keyword_is_error() {
        let err = parse("msgid \"a\"\nmsgfoo \"b\"\n").unwrap_err();
        assert_eq!(
            err,
            PoParseError::Syntax {
                line: 2,
                message: "unknown keyword: msgfoo".to_string()
            }
        );
    }

    #[test]
    fn test_unterminated_string_is_error() {
        assert!(parse("msgid \"open\nmsgstr \"x\"\n").is_err());
    }

    #[test]
    fn test_orphan_continuation_is_error() {
        let err = parse("\"dangling\"\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_msgstr_before_msgid_is_error() {
        assert!(parse("msgstr \"x\"\n").is_err());
    }
}
