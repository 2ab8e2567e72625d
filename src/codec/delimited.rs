use csv::{QuoteStyle, StringRecord, Terminator};
use thiserror::Error;
use tracing::{debug, warn};

use crate::codec::FormatError;
use crate::core::catalog::Catalog;
use crate::core::product::{is_valid_price, Product};
use crate::core::types::{Category, ProductId};

/// Fixed header row of exported tables, in column order
pub const HEADER: [&str; 6] = [
    "id",
    "nombre",
    "precio",
    "codigo",
    "categoria",
    "descripcion",
];

/// Byte-order marker prepended to exports so spreadsheet tools detect UTF-8
pub const BOM: char = '\u{feff}';

/// Name given to rows whose name column is blank
pub const MISSING_NAME_LABEL: &str = "Sin Nombre";

const ID_COLUMN: usize = 0;
const NAME_COLUMN: usize = 1;
const PRICE_COLUMN: usize = 2;
const CODE_COLUMN: usize = 3;
const CATEGORY_COLUMN: usize = 4;
const DESCRIPTION_COLUMN: usize = 5;

/// A recoverable problem in a single row. The row is still imported with a
/// default in place of the bad field, except for `Unreadable` rows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("Line {line}: blank id, generated '{generated}'")]
    GeneratedId { line: u64, generated: ProductId },

    #[error("Line {line}: blank name, using '{MISSING_NAME_LABEL}'")]
    BlankName { line: u64 },

    #[error("Line {line}: invalid price '{value}', using 0")]
    InvalidPrice { line: u64, value: String },

    #[error("Line {line}: unknown category '{value}', using 'Otro'")]
    UnknownCategory { line: u64, value: String },

    #[error("Line {line}: row skipped: {message}")]
    Unreadable { line: u64, message: String },
}

/// Result of a permissive decode: the products that were read plus every
/// field that had to be defaulted
#[derive(Debug, Default)]
pub struct DelimitedDecode {
    pub catalog: Catalog,
    pub issues: Vec<RowError>,
}

/// Serialize the catalog as a CSV table with a BOM and the fixed header row.
///
/// Fields containing a comma, quote or newline are quoted with embedded
/// quotes doubled. Prices are written as plain decimals.
///
/// # Errors
///
/// Returns `FormatError::Csv` if a record cannot be written, or
/// `FormatError::Output` if the buffer cannot be recovered as UTF-8.
pub fn encode_delimited(catalog: &Catalog) -> Result<String, FormatError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![]);

    writer.write_record(HEADER)?;

    for product in catalog {
        let price = product.price.to_string();
        writer.write_record([
            product.id.as_str(),
            product.name.as_str(),
            price.as_str(),
            product.code.as_deref().unwrap_or(""),
            product.category.label(),
            product.description.as_deref().unwrap_or(""),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FormatError::Output(e.to_string()))?;
    let table = String::from_utf8(bytes).map_err(|e| FormatError::Output(e.to_string()))?;

    let mut output = String::with_capacity(table.len() + BOM.len_utf8());
    output.push(BOM);
    output.push_str(&table);
    Ok(output)
}

/// Parse a CSV table, never failing. See [`decode_delimited_with_report`].
pub fn decode_delimited(text: &str) -> Catalog {
    decode_delimited_with_report(text).catalog
}

/// Parse a CSV table and report every recovered field.
///
/// The first line is always treated as the header and discarded. Blank rows
/// are skipped. Columns are positional: id, name, price, code, category,
/// description. Missing trailing columns read as empty.
///
/// A quoted field may continue over several lines. When a quote is never
/// closed, or a multi-line field is followed by stray text, only the line it
/// starts on is skipped (`RowError::Unreadable`) and reading resumes on the
/// next line.
pub fn decode_delimited_with_report(text: &str) -> DelimitedDecode {
    let text = text.trim_start_matches(BOM);
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut products = Vec::new();
    let mut issues = Vec::new();

    // index 0 is the header
    let mut start = 1;
    while start < lines.len() {
        let line = start as u64 + 1;

        let mut scan = scan_line(lines[start], false);
        let mut end = start;
        while scan.in_quotes && end + 1 < lines.len() {
            end += 1;
            let next = scan_line(lines[end], true);
            scan = LineScan {
                in_quotes: next.in_quotes,
                clean: scan.clean && next.clean,
            };
        }

        if scan.in_quotes {
            issues.push(RowError::Unreadable {
                line,
                message: "quoted field is never closed".to_string(),
            });
            start += 1;
            continue;
        }
        if end > start && !scan.clean {
            issues.push(RowError::Unreadable {
                line,
                message: "unexpected text after a multi-line quoted field".to_string(),
            });
            start += 1;
            continue;
        }

        match read_record(&lines[start..=end].join("\n")) {
            Ok(Some(record)) if !is_blank_record(&record) => {
                products.push(parse_row(&record, line, &mut issues));
            }
            Ok(_) => {}
            Err(e) => issues.push(RowError::Unreadable {
                line,
                message: e.to_string(),
            }),
        }
        start = end + 1;
    }

    for issue in &issues {
        match issue {
            RowError::GeneratedId { .. } => debug!("{issue}"),
            _ => warn!("{issue}"),
        }
    }

    DelimitedDecode {
        catalog: Catalog::from_products(products),
        issues,
    }
}

/// Quote state at the end of a physical line
struct LineScan {
    in_quotes: bool,
    /// Every closing quote was followed by a delimiter or the end of the line
    clean: bool,
}

/// Track quoting the way the csv reader does: a quote opens a field only at
/// the start of the field, and `""` inside a quoted field is a literal quote.
fn scan_line(line: &str, mut in_quotes: bool) -> LineScan {
    let mut clean = true;
    let mut field_start = !in_quotes;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_quotes = false;
                    clean &= matches!(chars.peek(), None | Some(','));
                }
            }
        } else if c == '"' && field_start {
            in_quotes = true;
            field_start = false;
        } else {
            field_start = c == ',';
        }
    }

    LineScan { in_quotes, clean }
}

fn read_record(row: &str) -> Result<Option<StringRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(row.as_bytes());

    let mut record = StringRecord::new();
    if reader.read_record(&mut record)? {
        Ok(Some(record))
    } else {
        Ok(None)
    }
}

fn is_blank_record(record: &StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

fn parse_row(record: &StringRecord, line: u64, issues: &mut Vec<RowError>) -> Product {
    let field = |index: usize| record.get(index).unwrap_or("");

    let id = field(ID_COLUMN);
    let id = if id.trim().is_empty() {
        let generated = ProductId::generate();
        issues.push(RowError::GeneratedId {
            line,
            generated: generated.clone(),
        });
        generated
    } else {
        ProductId::new(id)
    };

    let name = field(NAME_COLUMN);
    let name = if name.trim().is_empty() {
        issues.push(RowError::BlankName { line });
        MISSING_NAME_LABEL.to_string()
    } else {
        name.to_string()
    };

    let raw_price = field(PRICE_COLUMN).trim();
    let price = parse_price(raw_price).unwrap_or_else(|| {
        issues.push(RowError::InvalidPrice {
            line,
            value: raw_price.to_string(),
        });
        0.0
    });

    let raw_category = field(CATEGORY_COLUMN).trim();
    let category = Category::parse(raw_category).unwrap_or_else(|| {
        issues.push(RowError::UnknownCategory {
            line,
            value: raw_category.to_string(),
        });
        Category::Other
    });

    Product {
        id,
        name,
        price,
        code: optional_field(field(CODE_COLUMN)),
        category,
        description: optional_field(field(DESCRIPTION_COLUMN)),
    }
}

/// Parse a price, accepting a decimal comma. Negative or non-finite values
/// are rejected.
fn parse_price(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .or_else(|| raw.replace(',', ".").parse::<f64>().ok())
        .filter(|price| is_valid_price(*price))
}

fn optional_field(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
