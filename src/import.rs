use crate::errors::{ImportFileError, RowError, UnresolvedMappingError};
use crate::roster::StudentRecord;
use std::fs;
use std::path::Path;

/// Number of data rows included in a file preview.
pub const PREVIEW_ROWS: usize = 5;

/// Candidate header substrings per logical field, in priority order. A
/// header matches a pattern case-insensitively; exact matches are preferred
/// over substring matches so a column literally named "email" always wins
/// the email field.
const NAME_PATTERNS: &[&str] = &["nome", "name", "aluno", "estudante", "participante"];
const PHONE_PATTERNS: &[&str] = &["celular", "telefone", "phone", "tel", "whatsapp", "contato"];
const EMAIL_PATTERNS: &[&str] = &["email", "e-mail", "mail", "correio"];

/// Reads an import file into memory as decoded text.
///
/// The file MUST be valid UTF-8; any decode or I/O failure is file-level
/// fatal and aborts the whole import.
pub fn read_import_file(path: &Path) -> Result<String, ImportFileError> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8(bytes)?)
}

/// Splits decoded text into trimmed, non-blank lines. Blank lines are
/// dropped entirely rather than kept as empty entries, so line numbers
/// reported downstream refer to positions in this sequence.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Splits a single line into field values.
///
/// Both `,` and `;` act as delimiters so exports from spreadsheets in
/// either locale convention are accepted. A double quote toggles quoted
/// mode, inside which delimiters are literal data. A doubled quote inside
/// a quoted field is collapsed to one literal quote. Fields are trimmed as
/// they are flushed, and the buffer after the final character is always
/// flushed, so a trailing delimiter yields a trailing empty field.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' | ';' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// The association between each required logical field and a source column
/// header. Derived once per file by [`ColumnMapping::detect`] and optionally
/// overridden before the import commits.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnMapping {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Column indexes of the three logical fields in the tokenized header row.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ColumnIndexes {
    name: usize,
    phone: usize,
    email: usize,
}

impl ColumnMapping {
    /// Heuristically maps the tokenized header row to the three logical
    /// fields. For each field the candidate patterns are scanned in priority
    /// order and the first header (in column order) containing the pattern
    /// wins; a header exactly equal to the pattern beats a mere substring
    /// hit. Fields with no matching header stay unresolved.
    pub fn detect(headers: &[String]) -> Self {
        Self {
            name: find_best_match(headers, NAME_PATTERNS),
            phone: find_best_match(headers, PHONE_PATTERNS),
            email: find_best_match(headers, EMAIL_PATTERNS),
        }
    }

    /// Replaces individual field mappings with caller-supplied column names,
    /// keeping the detected value wherever no override is given.
    pub fn override_with(
        mut self,
        name: Option<String>,
        phone: Option<String>,
        email: Option<String>,
    ) -> Self {
        if name.is_some() {
            self.name = name;
        }
        if phone.is_some() {
            self.phone = phone;
        }
        if email.is_some() {
            self.email = email;
        }
        self
    }

    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.phone.is_some() && self.email.is_some()
    }

    /// Resolves each mapped header to its column index. A field that is
    /// unmapped, or mapped to a header absent from the header row, blocks
    /// the import; the error names every unresolved field at once.
    fn resolve(&self, headers: &[String]) -> Result<ColumnIndexes, UnresolvedMappingError> {
        let name = resolve_field(headers, self.name.as_deref());
        let phone = resolve_field(headers, self.phone.as_deref());
        let email = resolve_field(headers, self.email.as_deref());

        match (name, phone, email) {
            (Some(name), Some(phone), Some(email)) => Ok(ColumnIndexes { name, phone, email }),
            (name, phone, email) => {
                let mut fields = Vec::new();
                if name.is_none() {
                    fields.push("name");
                }
                if phone.is_none() {
                    fields.push("phone");
                }
                if email.is_none() {
                    fields.push("email");
                }
                Err(UnresolvedMappingError::new(fields))
            }
        }
    }
}

fn find_best_match(headers: &[String], patterns: &[&str]) -> Option<String> {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();

    for pattern in patterns {
        if let Some(index) = lowered.iter().position(|h| h == pattern) {
            return Some(headers[index].clone());
        }
        if let Some(index) = lowered.iter().position(|h| h.contains(pattern)) {
            return Some(headers[index].clone());
        }
    }

    None
}

fn resolve_field(headers: &[String], mapped: Option<&str>) -> Option<usize> {
    mapped.and_then(|header| headers.iter().position(|h| h == header))
}

/// A short look at a selected file: the tokenized header, up to the first
/// [`PREVIEW_ROWS`] tokenized data rows, and the total data-row count.
#[derive(Debug, PartialEq)]
pub struct CsvPreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub row_count: usize,
}

impl CsvPreview {
    pub fn parse(text: &str) -> Result<Self, ImportFileError> {
        let lines = split_lines(text);
        if lines.len() < 2 {
            return Err(ImportFileError::NotEnoughLines(lines.len()));
        }

        Ok(Self {
            headers: tokenize_line(lines[0]),
            rows: lines[1..]
                .iter()
                .take(PREVIEW_ROWS)
                .map(|line| tokenize_line(line))
                .collect(),
            row_count: lines.len() - 1,
        })
    }
}

/// The outcome of mapping every data row: the records that validated plus
/// one [`RowError`] per row that did not. Row failures are independent and
/// never abort the pass.
#[derive(Debug)]
pub struct MappedRows {
    pub records: Vec<StudentRecord>,
    pub errors: Vec<RowError>,
}

/// Maps the full line sequence (header at index 0) into student records.
///
/// Each data row is re-tokenized and the mapped columns are looked up by
/// index and trimmed. A row missing any of the three required values is
/// skipped whole and reported with its 1-based line number in the original
/// file, the header being line 1. Valid rows become records with freshly
/// generated ids and the caller-supplied training name.
pub fn map_rows(
    lines: &[&str],
    mapping: &ColumnMapping,
    training: &str,
) -> Result<MappedRows, UnresolvedMappingError> {
    let headers = tokenize_line(lines[0]);
    let indexes = mapping.resolve(&headers)?;

    let mut records = Vec::new();
    let mut errors = Vec::new();

    for (index, line) in lines.iter().enumerate().skip(1) {
        let row = tokenize_line(line);
        let name = field_at(&row, indexes.name);
        let phone = field_at(&row, indexes.phone);
        let email = field_at(&row, indexes.email);

        let mut missing = Vec::new();
        if name.is_empty() {
            missing.push("name");
        }
        if phone.is_empty() {
            missing.push("phone");
        }
        if email.is_empty() {
            missing.push("email");
        }
        if !missing.is_empty() {
            errors.push(RowError::new(index + 1, missing));
            continue;
        }

        records.push(StudentRecord::from_row(name, phone, email, training));
    }

    Ok(MappedRows { records, errors })
}

/// Looks up a field value by column index, treating a column that is absent
/// from a short row the same as an empty value.
fn field_at(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn should_split_text_into_trimmed_non_blank_lines() {
        let text = "Nome,Email\n\n  Ana,ana@example.com  \n\r\nBeto,beto@example.com\n\n";
        assert_eq!(
            split_lines(text),
            vec!["Nome,Email", "Ana,ana@example.com", "Beto,beto@example.com"]
        );
    }

    #[test]
    fn should_tokenize_comma_and_semicolon_delimited_lines() {
        assert_eq!(
            tokenize_line("Ana Silva, +55 11 98888-7777 ,ana@example.com"),
            vec!["Ana Silva", "+55 11 98888-7777", "ana@example.com"]
        );
        assert_eq!(
            tokenize_line("Ana Silva;+55 11 98888-7777;ana@example.com"),
            vec!["Ana Silva", "+55 11 98888-7777", "ana@example.com"]
        );
    }

    #[test]
    fn should_not_split_on_delimiters_inside_quotes() {
        // A quoted embedded delimiter must not fragment the field: the line
        // yields the same field count as its unquoted counterpart.
        let quoted = tokenize_line(r#""Silva, Ana",11988887777,ana@example.com"#);
        let plain = tokenize_line("Ana Silva,11988887777,ana@example.com");
        assert_eq!(quoted.len(), plain.len());
        assert_eq!(quoted[0], "Silva, Ana");
    }

    #[test]
    fn should_strip_surrounding_quotes_from_fields() {
        assert_eq!(
            tokenize_line(r#""Ana","ana@example.com""#),
            vec!["Ana", "ana@example.com"]
        );
    }

    #[test]
    fn should_collapse_doubled_quotes_inside_quoted_fields() {
        assert_eq!(
            tokenize_line(r#""Ana ""Aninha"" Silva",ana@example.com"#),
            vec![r#"Ana "Aninha" Silva"#, "ana@example.com"]
        );
    }

    #[test]
    fn should_emit_trailing_empty_field_for_trailing_delimiter() {
        assert_eq!(tokenize_line("Ana,"), vec!["Ana", ""]);
    }

    #[test]
    fn should_tokenize_lone_delimiter_as_two_empty_fields() {
        assert_eq!(tokenize_line(","), vec!["", ""]);
        assert_eq!(tokenize_line(";"), vec!["", ""]);
    }

    #[test]
    fn should_detect_mapping_from_portuguese_headers() {
        let mapping = ColumnMapping::detect(&headers(&["Nome Completo", "Celular", "E-mail"]));
        assert_eq!(mapping.name.as_deref(), Some("Nome Completo"));
        assert_eq!(mapping.phone.as_deref(), Some("Celular"));
        assert_eq!(mapping.email.as_deref(), Some("E-mail"));
    }

    #[test]
    fn should_detect_mapping_from_english_headers() {
        let mapping = ColumnMapping::detect(&headers(&["Full Name", "Phone Number", "Email"]));
        assert_eq!(mapping.name.as_deref(), Some("Full Name"));
        assert_eq!(mapping.phone.as_deref(), Some("Phone Number"));
        assert_eq!(mapping.email.as_deref(), Some("Email"));
    }

    #[test]
    fn should_resolve_literal_email_header_over_substring_hits() {
        // Another column mentioning "email" earlier in the row must not
        // steal the mapping from the column literally named "email".
        let mapping = ColumnMapping::detect(&headers(&["Aluno", "Tel", "Email Backup", "Email"]));
        assert_eq!(mapping.email.as_deref(), Some("Email"));
    }

    #[test]
    fn should_scan_patterns_in_priority_order() {
        // "celular" outranks "telefone" even when it appears in a later
        // column.
        let mapping = ColumnMapping::detect(&headers(&["Nome", "Telefone Fixo", "Celular", "Email"]));
        assert_eq!(mapping.phone.as_deref(), Some("Celular"));
    }

    #[test]
    fn should_leave_unmatched_fields_unresolved() {
        let mapping = ColumnMapping::detect(&headers(&["Coluna A", "Coluna B"]));
        assert_eq!(mapping, ColumnMapping::default());
        assert!(!mapping.is_complete());
    }

    #[test]
    fn should_keep_detected_values_not_overridden() {
        let mapping = ColumnMapping::detect(&headers(&["Nome", "Celular", "Email"]))
            .override_with(None, Some("Whatsapp".to_string()), None);
        assert_eq!(mapping.name.as_deref(), Some("Nome"));
        assert_eq!(mapping.phone.as_deref(), Some("Whatsapp"));
        assert_eq!(mapping.email.as_deref(), Some("Email"));
    }

    #[test]
    fn should_preview_header_and_first_five_rows() {
        let mut text = String::from("Nome,Celular,Email\n");
        for i in 0..8 {
            text.push_str(&format!("Aluno {0},1198888000{0},aluno{0}@example.com\n", i));
        }

        let preview = CsvPreview::parse(&text).unwrap();
        assert_eq!(preview.headers, vec!["Nome", "Celular", "Email"]);
        assert_eq!(preview.rows.len(), PREVIEW_ROWS);
        assert_eq!(preview.row_count, 8);
        assert_eq!(preview.rows[0][0], "Aluno 0");
    }

    #[test]
    fn should_reject_preview_of_header_only_file() {
        let err = CsvPreview::parse("Nome,Celular,Email\n\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            ImportFileError::NotEnoughLines(1).to_string()
        );
    }

    #[test]
    fn should_map_all_well_formed_rows() {
        let text = "Nome,Celular,Email\n\
                    Ana,11988887777,Ana@Example.com\n\
                    Beto,11977776666,beto@example.com\n";
        let lines = split_lines(text);
        let mapping = ColumnMapping::detect(&tokenize_line(lines[0]));

        let mapped = map_rows(&lines, &mapping, "Imersão Inside").unwrap();
        assert_eq!(mapped.records.len(), 2);
        assert!(mapped.errors.is_empty());
        assert_eq!(mapped.records[0].name, "Ana");
        assert_eq!(mapped.records[0].training, "Imersão Inside");
        // Values are normalized on record construction.
        assert_eq!(mapped.records[0].email, "ana@example.com");
        assert_eq!(mapped.records[0].phone, "+5511988887777");
    }

    #[test]
    fn should_skip_incomplete_rows_and_report_their_line_numbers() {
        let text = "Nome,Celular,Email\n\
                    Ana,11988887777,ana@example.com\n\
                    Beto,,beto@example.com\n\
                    Carla,11955554444,carla@example.com\n";
        let lines = split_lines(text);
        let mapping = ColumnMapping::detect(&tokenize_line(lines[0]));

        let mapped = map_rows(&lines, &mapping, "SBIE Care").unwrap();
        assert_eq!(mapped.records.len(), 2);
        // The bad row sits on line 3 of the original file (header is line 1)
        // and produces exactly one error naming the empty field.
        assert_eq!(mapped.errors, vec![RowError::new(3, vec!["phone"])]);
    }

    #[test]
    fn should_treat_short_rows_as_missing_values() {
        let text = "Nome,Celular,Email\nAna\n";
        let lines = split_lines(text);
        let mapping = ColumnMapping::detect(&tokenize_line(lines[0]));

        let mapped = map_rows(&lines, &mapping, "ASBIE").unwrap();
        assert!(mapped.records.is_empty());
        assert_eq!(mapped.errors, vec![RowError::new(2, vec!["phone", "email"])]);
    }

    #[test]
    fn should_block_mapping_resolution_and_name_every_missing_field() {
        let text = "Coluna A,Coluna B\nx,y\n";
        let lines = split_lines(text);
        let mapping = ColumnMapping::detect(&tokenize_line(lines[0]));

        let err = map_rows(&lines, &mapping, "ASBIE").unwrap_err();
        assert_eq!(err.fields(), &["name", "phone", "email"]);
        assert_eq!(
            err.to_string(),
            "required fields are not mapped to any column: name, phone, email"
        );
    }

    #[test]
    fn should_block_resolution_when_override_names_unknown_column() {
        let text = "Nome,Celular,Email\nAna,11988887777,ana@example.com\n";
        let lines = split_lines(text);
        let mapping = ColumnMapping::detect(&tokenize_line(lines[0])).override_with(
            None,
            Some("No Such Column".to_string()),
            None,
        );

        let err = map_rows(&lines, &mapping, "ASBIE").unwrap_err();
        assert_eq!(err.fields(), &["phone"]);
    }
}
