//! Watchlist CSV ingestion and the pre-scan price/volume screen.
//!
//! Exports from common screeners name their columns differently
//! (`Symbol`/`Ticker`, `Last Sale`/`Price`, `Volume`/`Vol`), and quote
//! prices as `"$1,234.50"`. Headers are matched case-insensitively after
//! trimming; values are cleaned of `$` and `,` before parsing.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::{ScanConfig, Symbol};

const SYMBOL_COLUMNS: &[&str] = &["symbol", "ticker"];
const PRICE_COLUMNS: &[&str] = &["last sale", "price", "last"];
const VOLUME_COLUMNS: &[&str] = &["volume", "vol"];

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("watchlist is empty")]
    Empty,
    #[error("missing {missing} column (detected columns: {})", detected.join(", "))]
    MissingColumns {
        missing: &'static str,
        detected: Vec<String>,
    },
    #[error("unterminated quoted field on line {line}")]
    UnterminatedQuote { line: usize },
    #[error("failed to read watchlist '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One parsed watchlist row.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchlistEntry {
    pub symbol: Symbol,
    pub last_price: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Watchlist {
    entries: Vec<WatchlistEntry>,
    skipped: usize,
}

impl Watchlist {
    pub fn parse(text: &str) -> Result<Self, WatchlistError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut records = split_records(text)?
            .into_iter()
            .filter(|fields| !is_blank(fields));

        let header = records.next().ok_or(WatchlistError::Empty)?;
        let columns: Vec<String> = header
            .into_iter()
            .map(|name| name.trim().to_ascii_lowercase())
            .collect();

        let symbol_at = find_column(&columns, SYMBOL_COLUMNS, "symbol")?;
        let price_at = find_column(&columns, PRICE_COLUMNS, "price")?;
        let volume_at = find_column(&columns, VOLUME_COLUMNS, "volume")?;

        let mut watchlist = Self::default();
        for fields in records {
            match parse_entry(&fields, symbol_at, price_at, volume_at) {
                Some(entry) => watchlist.entries.push(entry),
                None => watchlist.skipped += 1,
            }
        }
        Ok(watchlist)
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, WatchlistError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| WatchlistError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    /// Rows dropped because a symbol, price or volume did not parse.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Symbols passing the price and volume floors, in file order.
    pub fn screen(&self, config: &ScanConfig) -> Vec<Symbol> {
        self.entries
            .iter()
            .filter(|entry| entry.last_price >= config.min_price && entry.volume >= config.min_volume)
            .map(|entry| entry.symbol.clone())
            .collect()
    }
}

fn find_column(
    columns: &[String],
    aliases: &[&str],
    missing: &'static str,
) -> Result<usize, WatchlistError> {
    columns
        .iter()
        .position(|column| aliases.contains(&column.as_str()))
        .ok_or_else(|| WatchlistError::MissingColumns {
            missing,
            detected: columns.to_vec(),
        })
}

fn parse_entry(
    fields: &[String],
    symbol_at: usize,
    price_at: usize,
    volume_at: usize,
) -> Option<WatchlistEntry> {
    let symbol = Symbol::parse(fields.get(symbol_at)?).ok()?;
    let last_price = clean_number(fields.get(price_at)?).parse::<f64>().ok()?;
    if !last_price.is_finite() {
        return None;
    }
    let volume = parse_volume(&clean_number(fields.get(volume_at)?))?;

    Some(WatchlistEntry {
        symbol,
        last_price,
        volume,
    })
}

fn clean_number(raw: &str) -> String {
    raw.trim().chars().filter(|ch| !matches!(ch, '$' | ',')).collect()
}

/// Accepts fractional volumes (`"1200.0"`) the way spreadsheet exports write them.
fn parse_volume(value: &str) -> Option<u64> {
    if let Ok(volume) = value.parse::<u64>() {
        return Some(volume);
    }
    let volume = value.parse::<f64>().ok()?;
    if volume.is_finite() && volume >= 0.0 {
        Some(volume.trunc() as u64)
    } else {
        None
    }
}

fn is_blank(fields: &[String]) -> bool {
    fields.iter().all(|field| field.trim().is_empty())
}

/// Splits CSV text into records, honouring double-quoted fields and `""`
/// escapes. A quoted field may span lines.
fn split_records(text: &str) -> Result<Vec<Vec<String>>, WatchlistError> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut fields));
                line += 1;
                record_line = line;
            }
            '\n' => {
                field.push(ch);
                line += 1;
            }
            _ => field.push(ch),
        }
    }
    if in_quotes {
        return Err(WatchlistError::UnterminatedQuote { line: record_line });
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        records.push(fields);
    }
    Ok(records)
}
