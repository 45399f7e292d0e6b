use crate::row::ReportRow;

const DELIMITER: &str = "\t";

/// Marker substituted for newlines inside a message cell.
const NEWLINE_MARKER: &str = " NEWLINE ";

/// Render rows as tab-delimited text, one line per row.
///
/// Fixed leading columns: Автор, Repost, Дата, Сообщение, Ссылка. The
/// maximum note count across rows determines the extra header columns:
/// Категория, Подкатегория, then Note3, Note4, … Rows with fewer notes are
/// shorter — consumers must treat rows as ragged. Missing optional fields
/// render as empty cells. Deterministic and pure.
pub fn render(rows: &[ReportRow]) -> String {
    let mut max_notes = 0;
    let mut lines = Vec::with_capacity(rows.len());

    for row in rows {
        let mut cells: Vec<String> = vec![
            row.title.clone().unwrap_or_default(),
            row.forwarded_from.clone().unwrap_or_default(),
            row.date.clone().unwrap_or_default(),
            row.message
                .as_deref()
                .map(|m| m.replace('\n', NEWLINE_MARKER))
                .unwrap_or_default(),
            row.full_link.clone(),
        ];
        cells.extend(row.notes.iter().cloned());
        max_notes = max_notes.max(row.notes.len());
        lines.push(cells.join(DELIMITER));
    }

    let mut header = String::from("Автор\tRepost\tДата\tСообщение\tСсылка");
    for index in 1..=max_notes {
        header.push_str(DELIMITER);
        match index {
            1 => header.push_str("Категория"),
            2 => header.push_str("Подкатегория"),
            n => header.push_str(&format!("Note{n}")),
        }
    }
    header.push('\n');

    header + &lines.join("\n")
}
