use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::{Duration, Instant};

use strata_domain::error::SweepError;
use strata_domain::repositories::market_data::{CandleQuery, MarketDataRepository};
use strata_domain::value_objects::candle::Candle;

const EXCHANGE: &str = "binance";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// HTTP adapter for the candle service. The body is
/// `{ "candles": [[timestamp_ms, open, high, low, close, volume], ...] }`
/// with numeric fields encoded either as numbers or as strings.
pub struct HttpMarketDataRepository {
    base_url: String,
    token: String,
    client: Client,
}

impl HttpMarketDataRepository {
    pub fn new(base_url: String, token: String) -> Result<Self, SweepError> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT_MS)
    }

    pub fn with_timeout(
        base_url: String,
        token: String,
        timeout_ms: u64,
    ) -> Result<Self, SweepError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|err| SweepError::DataFetch(format!("failed to build http client: {err}")))?;
        Ok(Self {
            base_url,
            token,
            client,
        })
    }
}

impl MarketDataRepository for HttpMarketDataRepository {
    fn fetch_candles(&self, query: &CandleQuery) -> Result<Vec<Candle>, SweepError> {
        let endpoint = format!("{}/data/candles", self.base_url.trim_end_matches('/'));
        let span = tracing::info_span!(
            "infra.market_data.fetch",
            endpoint = %endpoint,
            symbol = %query.symbol,
            market = query.market_type.as_str(),
            interval_minutes = query.interval_minutes,
        );
        let _enter = span.enter();

        metrics::counter!("strata.infra.market_data.requests_total").increment(1);
        let start = Instant::now();

        let interval = format!("{}m", query.interval_minutes);
        let response = self
            .client
            .get(&endpoint)
            .bearer_auth(&self.token)
            .query(&[
                ("exchange", EXCHANGE),
                ("trading_type", query.market_type.as_str()),
                ("symbol", query.symbol.as_str()),
                ("interval", interval.as_str()),
            ])
            .query(&[("from", query.from_ms), ("to", query.to_ms)])
            .send()
            .map_err(|err| SweepError::DataFetch(format!("candle request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            metrics::counter!("strata.infra.market_data.errors_total").increment(1);
            return Err(SweepError::DataFetch(format!(
                "candle service returned {status} for {symbol}",
                symbol = query.symbol
            )));
        }

        let payload: CandlePayload = response
            .json()
            .map_err(|err| SweepError::DataFetch(format!("invalid candle payload: {err}")))?;
        metrics::histogram!("strata.infra.market_data.fetch_ms")
            .record(start.elapsed().as_millis() as f64);

        let candles = parse_rows(payload.candles)?;
        tracing::info!(count = candles.len(), "fetched candles");
        Ok(candles)
    }
}

#[derive(Deserialize)]
struct CandlePayload {
    candles: Vec<Vec<serde_json::Value>>,
}

fn parse_rows(rows: Vec<Vec<serde_json::Value>>) -> Result<Vec<Candle>, SweepError> {
    if rows.is_empty() {
        return Err(SweepError::EmptyResult);
    }
    let mut candles = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        if row.len() < 6 {
            return Err(SweepError::DataFetch(format!(
                "candle row {index} has {} fields, expected 6",
                row.len()
            )));
        }
        candles.push(Candle {
            timestamp: timestamp_field(&row[0], index)?,
            open: decimal_field(&row[1], index, "open")?,
            high: decimal_field(&row[2], index, "high")?,
            low: decimal_field(&row[3], index, "low")?,
            close: decimal_field(&row[4], index, "close")?,
            volume: decimal_field(&row[5], index, "volume")?,
        });
    }
    candles.sort_by_key(|c| c.timestamp);
    Ok(candles)
}

fn timestamp_field(value: &serde_json::Value, index: usize) -> Result<i64, SweepError> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().ok_or_else(|| {
            SweepError::DataFetch(format!("candle row {index}: non-integer timestamp {n}"))
        }),
        serde_json::Value::String(s) => s.trim().parse::<i64>().map_err(|_| {
            SweepError::DataFetch(format!("candle row {index}: bad timestamp {s:?}"))
        }),
        other => Err(SweepError::DataFetch(format!(
            "candle row {index}: unexpected timestamp {other}"
        ))),
    }
}

fn decimal_field(
    value: &serde_json::Value,
    index: usize,
    field: &str,
) -> Result<Decimal, SweepError> {
    let raw = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        other => {
            return Err(SweepError::DataFetch(format!(
                "candle row {index}: unexpected {field} {other}"
            )))
        }
    };
    raw.parse::<Decimal>().map_err(|_| {
        SweepError::DataFetch(format!("candle row {index}: bad {field} {raw:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn row(ts: i64, price: &str) -> Vec<serde_json::Value> {
        vec![
            json!(ts),
            json!(price),
            json!(price),
            json!(price),
            json!(price),
            json!("1.5"),
        ]
    }

    #[test]
    fn parses_string_and_numeric_fields() {
        let rows = vec![
            vec![
                json!(60_000),
                json!("100.5"),
                json!(101),
                json!("99.25"),
                json!(100.75),
                json!("12.0"),
            ],
        ];
        let candles = parse_rows(rows).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].timestamp, 60_000);
        assert_eq!(candles[0].open, dec!(100.5));
        assert_eq!(candles[0].high, dec!(101));
        assert_eq!(candles[0].low, dec!(99.25));
        assert_eq!(candles[0].close, dec!(100.75));
        assert_eq!(candles[0].volume, dec!(12.0));
    }

    #[test]
    fn rows_are_sorted_by_timestamp() {
        let rows = vec![row(120_000, "101"), row(0, "99"), row(60_000, "100")];
        let candles = parse_rows(rows).unwrap();
        let stamps: Vec<i64> = candles.iter().map(|c| c.timestamp).collect();
        assert_eq!(stamps, vec![0, 60_000, 120_000]);
    }

    #[test]
    fn empty_payload_is_an_empty_result() {
        assert!(matches!(parse_rows(Vec::new()), Err(SweepError::EmptyResult)));
    }

    #[test]
    fn short_row_is_rejected() {
        let err = parse_rows(vec![vec![json!(0), json!("1")]]).unwrap_err();
        assert!(err.to_string().contains("expected 6"));
    }

    #[test]
    fn malformed_price_is_rejected() {
        let mut bad = row(0, "100");
        bad[4] = json!("not-a-price");
        let err = parse_rows(vec![bad]).unwrap_err();
        assert!(err.to_string().contains("close"));
    }
}
