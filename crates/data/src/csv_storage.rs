use crate::models::Candle;
use anyhow::{Context, Result};
use csv::Writer;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

pub struct CsvStorage;

impl CsvStorage {
    /// Reads candles from a CSV file.
    ///
    /// Format: timestamp,symbol,open,high,low,close,volume (header row required)
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or a row fails to parse
    pub fn read_candles(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
        let mut candles = Vec::new();

        for (line, result) in reader.records().enumerate() {
            let record = result?;
            let field = |i: usize| -> Result<Decimal> {
                Decimal::from_str(record.get(i).unwrap_or_default().trim())
                    .with_context(|| format!("Invalid decimal in column {i} at row {}", line + 1))
            };
            candles.push(Candle {
                timestamp: record.get(0).unwrap_or_default().trim().parse()?,
                symbol: record.get(1).unwrap_or_default().trim().to_ascii_uppercase(),
                open: field(2)?,
                high: field(3)?,
                low: field(4)?,
                close: field(5)?,
                volume: field(6)?,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }

    /// Reads candles grouped by symbol, each series in chronological order.
    ///
    /// # Errors
    /// Returns error if the file cannot be read
    pub fn read_candles_by_symbol(path: impl AsRef<Path>) -> Result<BTreeMap<String, Vec<Candle>>> {
        let mut grouped: BTreeMap<String, Vec<Candle>> = BTreeMap::new();
        for candle in Self::read_candles(path)? {
            grouped.entry(candle.symbol.clone()).or_default().push(candle);
        }
        Ok(grouped)
    }

    /// Writes candles in the format `read_candles` accepts.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_candles(path: impl AsRef<Path>, candles: &[Candle]) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut writer = Writer::from_writer(file);

        writer.write_record(["timestamp", "symbol", "open", "high", "low", "close", "volume"])?;

        let mut sorted = candles.to_vec();
        sorted.sort_by_key(|c| c.timestamp);

        for candle in sorted {
            writer.write_record(&[
                candle.timestamp.to_rfc3339(),
                candle.symbol.clone(),
                candle.open.to_string(),
                candle.high.to_string(),
                candle.low.to_string(),
                candle.close.to_string(),
                candle.volume.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}
