//! Question body normalization.
//!
//! Bodies are reflowed paragraph by paragraph. Two embedded table shapes are
//! recognised and re-emitted as semicolon-delimited rows: the fixed
//! "Tabla XX. Partes y obras del Proyecto" block and generic rows whose
//! columns are separated by runs of two or more spaces.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HYPHEN_BREAK: Regex = Regex::new(r"-\n(\w)").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n\s*\n+").unwrap();
    static ref LIST_ITEM_BREAK: Regex =
        Regex::new(r"\n\s*([A-Za-z]\)|\d+\)|\([A-Za-z0-9]+\)|[-•])").unwrap();
    static ref NEWLINES: Regex = Regex::new(r"\n+").unwrap();
    static ref SPACE_RUN: Regex = Regex::new(r"[ \t]{2,}").unwrap();
    static ref SPACE_AT_BREAK: Regex = Regex::new(r"[ \t]*\n[ \t]*").unwrap();
    static ref COLUMN_GAP: Regex = Regex::new(r"\s{2,}").unwrap();

    static ref PARTS_TABLE_TITLE: Regex =
        Regex::new(r"(?i)^\s*Tabla\s+XX\.\s*Partes\s+y\s+obras\s+del\s+Proyecto\s*$").unwrap();
    static ref PART_NAME: Regex =
        Regex::new(r"(?i)^\s*\[(Nombre\s+parte/obra\s+.+?)\]\s*$").unwrap();
    static ref PART_CHARACTER: Regex =
        Regex::new(r"(?i)^\s*\[(Temporal\s+o\s+permanente)\]\s*$").unwrap();
    static ref PART_PHASE: Regex = Regex::new(r"(?i)^\s*\[(Construcción.*?cierre)\]\s*$").unwrap();
    static ref BARE_NUMBER: Regex = Regex::new(r"^\s*\d{1,4}\.\s*$").unwrap();
}

/// Paragraph placeholder; never whitespace, never in extracted text.
const PARAGRAPH: &str = "\u{0}";

/// Header of the re-emitted parts-and-works table.
pub const PARTS_TABLE_HEADER: &str = "Tabla;Nombre;Descripción;Carácter;Fase";

/// Split text into lines, keeping empty ones.
pub fn split_lines_keep_empty(text: &str) -> Vec<String> {
    text.replace('\x0c', "\n")
        .split('\n')
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect()
}

/// Reflow text into paragraphs.
///
/// Hyphenated line breaks are joined, blank lines and list-item markers
/// (`a)`, `1)`, `(a)`, `-`, `•`) start a new line, and every other line break
/// becomes a space.
///
/// ```
/// use icsara::text::normalize_preserving_paragraphs;
///
/// let text = "El titular debe\nprecisar el alcan-\nce del proyecto:\na) obras\nb) partes";
/// assert_eq!(
///     normalize_preserving_paragraphs(text),
///     "El titular debe precisar el alcance del proyecto:\na) obras\nb) partes"
/// );
/// ```
pub fn normalize_preserving_paragraphs(text: &str) -> String {
    let para_break = format!("\n{}\n", PARAGRAPH);
    let text = HYPHEN_BREAK.replace_all(text, "$1");
    let text = BLANK_LINES.replace_all(&text, para_break.as_str());
    let text = LIST_ITEM_BREAK.replace_all(&text, format!("{}$1", para_break).as_str());
    let text = NEWLINES.replace_all(&text, " ");
    let text = text.replace(PARAGRAPH, "\n");
    let text = SPACE_RUN.replace_all(&text, " ");
    SPACE_AT_BREAK.replace_all(&text, "\n").trim().to_string()
}

/// Whether a line looks like a row of a multi-space delimited table.
pub fn looks_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    COLUMN_GAP.is_match(trimmed) && split_table_row(trimmed).len() >= 2
}

/// Split a table row on runs of two or more spaces.
pub fn split_table_row(line: &str) -> Vec<String> {
    COLUMN_GAP
        .split(line.trim())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render table rows as semicolon-joined lines, padded to the widest row.
pub fn format_semicolon_table(lines: &[String]) -> String {
    let mut rows: Vec<Vec<String>> = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| split_table_row(l))
        .collect();
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(width, String::new());
    }
    rows.iter().map(|r| r.join(";")).collect::<Vec<_>>().join("\n")
}

fn skip_to_part_name(lines: &[String], mut i: usize) -> usize {
    while i < lines.len() && !PART_NAME.is_match(lines[i].trim()) {
        i += 1;
    }
    i
}

/// Parse a "Tabla XX. Partes y obras del Proyecto" block starting at `start`.
///
/// Returns the semicolon table and the index of the first line after the
/// block, or `None` when `start` is not such a block or it holds no rows.
pub fn parse_parts_table(lines: &[String], start: usize) -> Option<(String, usize)> {
    let title = lines.get(start)?.trim();
    if !PARTS_TABLE_TITLE.is_match(title) {
        return None;
    }
    let title = title.to_string();
    let mut i = skip_to_part_name(lines, start + 1);
    let mut rows: Vec<[String; 5]> = Vec::new();

    while i < lines.len() {
        let current = lines[i].trim();
        if PARTS_TABLE_TITLE.is_match(current) {
            i = skip_to_part_name(lines, i + 1);
            continue;
        }
        let name = match PART_NAME.captures(current).and_then(|c| c.get(1)) {
            Some(m) => format!("[{}]", m.as_str()),
            None => break,
        };
        i += 1;

        let mut description_lines: Vec<&str> = Vec::new();
        while i < lines.len() && !PART_CHARACTER.is_match(lines[i].trim()) {
            if PART_NAME.is_match(lines[i].trim()) {
                break;
            }
            description_lines.push(&lines[i]);
            i += 1;
        }
        let description = normalize_preserving_paragraphs(&description_lines.join("\n"));

        let mut character = String::new();
        if i < lines.len() && PART_CHARACTER.is_match(lines[i].trim()) {
            character = "Temporal o permanente".to_string();
            i += 1;
        }

        let mut phase = String::new();
        if i < lines.len() {
            let line = lines[i].trim();
            if let Some(m) = PART_PHASE.captures(line).and_then(|c| c.get(1)) {
                phase = m.as_str().to_string();
                i += 1;
            } else if line.starts_with('[') && line.ends_with(']') {
                phase = line.trim_matches(|c| c == '[' || c == ']').trim().to_string();
                i += 1;
            }
        }

        rows.push([title.clone(), name, description, character, phase]);

        while i < lines.len() && lines[i].trim().is_empty() {
            i += 1;
        }
        if i < lines.len() && BARE_NUMBER.is_match(&lines[i]) {
            break;
        }
    }

    if rows.is_empty() {
        return None;
    }
    let mut out = vec![PARTS_TABLE_HEADER.to_string()];
    out.extend(rows.iter().map(|r| r.join(";")));
    Some((out.join("\n"), i))
}

/// Format a raw question body.
///
/// Embedded tables become semicolon rows; everything else is reflowed with
/// [`normalize_preserving_paragraphs`]. Blocks are joined by line breaks.
pub fn format_question(raw: &str) -> String {
    let lines = split_lines_keep_empty(raw);
    let mut parts: Vec<String> = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();

    fn flush(buffer: &mut Vec<&str>, parts: &mut Vec<String>) {
        if buffer.is_empty() {
            return;
        }
        let block = buffer.join("\n");
        let block = block.trim();
        if !block.is_empty() {
            parts.push(normalize_preserving_paragraphs(block));
        }
        buffer.clear();
    }

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].as_str();
        if line.trim().is_empty() {
            buffer.push("");
            i += 1;
            continue;
        }
        if PARTS_TABLE_TITLE.is_match(line.trim()) {
            flush(&mut buffer, &mut parts);
            if let Some((table, next)) = parse_parts_table(&lines, i) {
                parts.push(table);
                i = next;
                continue;
            }
        }
        if looks_table_row(line) {
            flush(&mut buffer, &mut parts);
            let begin = i;
            while i < lines.len() && !lines[i].trim().is_empty() && looks_table_row(&lines[i]) {
                i += 1;
            }
            let table = format_semicolon_table(&lines[begin..i]);
            if !table.is_empty() {
                parts.push(table);
            }
            continue;
        }
        buffer.push(line);
        i += 1;
    }
    flush(&mut buffer, &mut parts);

    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
