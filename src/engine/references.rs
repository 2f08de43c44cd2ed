//! Cross-sheet references
//!
//! `Worksheet::insert_new_row` shifts cells, merges, drawings and formulas
//! inside the sheet it expands. Formulas on other sheets that point into
//! that sheet are rewritten here. Cells on other sheets never move.
//!
//! Row references with a `$` lock are left alone, the same rule umya
//! applies inside the expanded sheet.

use tracing::debug;
use umya_spreadsheet::Spreadsheet;

/// Shifts references to rows `>= position` of `sheet` by `count`, in every
/// formula that lives on another sheet. Returns the number of cells changed.
pub fn shift_foreign_references(book: &mut Spreadsheet, sheet: &str, position: u32, count: u32) -> usize {
    if count == 0 {
        return 0;
    }

    let mut changed = 0;
    for ws in book.get_sheet_collection_mut().iter_mut() {
        if ws.get_name().eq_ignore_ascii_case(sheet) {
            continue;
        }
        for cell in ws.get_cell_collection_mut() {
            let Some(formula) = cell.get_formula_obj() else {
                continue;
            };
            let Some(text) = shift_formula(formula.get_text(), sheet, position, count) else {
                continue;
            };
            let mut formula = formula.clone();
            formula.set_text(text.as_str());
            formula.set_text_view(text.as_str());
            cell.get_cell_value_mut().set_formula_obj(formula);
            changed += 1;
        }
    }

    if changed > 0 {
        debug!(sheet, position, count, changed, "shifted references from other sheets");
    }
    changed
}

/// Rewrites the sheet-qualified references to `sheet` in one formula.
///
/// Returns `None` when nothing in the formula points at the moved rows.
pub fn shift_formula(formula: &str, sheet: &str, position: u32, count: u32) -> Option<String> {
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len() + 4);
    let mut changed = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '"' {
            let end = closing_quote(&chars, i, '"');
            out.extend(&chars[i..end]);
            i = end;
            continue;
        }

        let qualifier = if c == '\'' {
            let end = closing_quote(&chars, i, '\'');
            (chars.get(end) == Some(&'!')).then(|| {
                let name: String = chars[i + 1..end - 1].iter().collect();
                (name.replace("''", "'"), end)
            })
        } else if is_name_char(c) && (i == 0 || !is_name_char(chars[i - 1])) {
            let end = i + chars[i..].iter().take_while(|c| is_name_char(**c)).count();
            (chars.get(end) == Some(&'!')).then(|| (chars[i..end].iter().collect::<String>(), end))
        } else {
            None
        };

        let Some((name, bang)) = qualifier else {
            if c == '\'' {
                let end = closing_quote(&chars, i, '\'');
                out.extend(&chars[i..end]);
                i = end;
            } else if is_name_char(c) {
                let end = i + chars[i..].iter().take_while(|c| is_name_char(**c)).count();
                out.extend(&chars[i..end]);
                i = end;
            } else {
                out.push(c);
                i += 1;
            }
            continue;
        };

        out.extend(&chars[i..=bang]);
        let start = bang + 1;
        let end = start
            + chars[start..]
                .iter()
                .take_while(|c| c.is_ascii_alphanumeric() || **c == '$' || **c == ':')
                .count();
        let range: String = chars[start..end].iter().collect();

        if name.eq_ignore_ascii_case(sheet) {
            let shifted = shift_range(&range, position, count);
            changed |= shifted != range;
            out.push_str(&shifted);
        } else {
            out.push_str(&range);
        }
        i = end;
    }

    changed.then_some(out)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Index just past the quote closing the one at `open`; doubled quotes are escapes
fn closing_quote(chars: &[char], open: usize, quote: char) -> usize {
    let mut i = open + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

fn shift_range(range: &str, position: u32, count: u32) -> String {
    range
        .split(':')
        .map(|part| shift_coordinate(part, position, count))
        .collect::<Vec<_>>()
        .join(":")
}

/// Shifts the row of `A5`, `$A5` or a bare row `5`. Anything else, including
/// column-only parts and `$`-locked rows, comes back unchanged.
fn shift_coordinate(part: &str, position: u32, count: u32) -> String {
    let col_lock = usize::from(part.starts_with('$'));
    let letters = part[col_lock..]
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .count();
    let rest = &part[col_lock + letters..];
    if rest.starts_with('$') || letters > 3 || (letters == 0 && col_lock == 1) {
        return part.to_string();
    }

    match rest.parse::<u32>() {
        Ok(row) if row >= position && rest.bytes().all(|b| b.is_ascii_digit()) => {
            format!("{}{}", &part[..col_lock + letters], row + count)
        }
        _ => part.to_string(),
    }
}
