use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::{
    models::{
        request_params::{BarsRequestParams, ProviderParams},
        timeframe::{TimeFrame, TimeFrameUnit},
    },
    providers::{ProviderError, ValidationSnafu},
};

/// Specifies the corporate action adjustment for stock data.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Adjustment {
    #[default]
    Raw,
    Split,
    Dividend,
    All,
}

/// Specifies the source feed for stock data.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Feed {
    #[default]
    Sip,
    Iex,
    Otc,
}

/// Specifies the sort order for the bars.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    #[default]
    Asc,
    Desc,
}

/// Alpaca-specific parameters for a bars request.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AlpacaBarsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<Adjustment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<Feed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

fn token<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_value(value).ok()? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    }
}

/// Checks the timeframe against the amounts Alpaca accepts.
pub fn validate_timeframe(timeframe: &TimeFrame) -> Result<(), ProviderError> {
    let amount = timeframe.amount;
    let ok = match timeframe.unit {
        TimeFrameUnit::Minute => (1..=59).contains(&amount),
        TimeFrameUnit::Hour => (1..=23).contains(&amount),
        TimeFrameUnit::Day | TimeFrameUnit::Week => amount == 1,
        TimeFrameUnit::Month => matches!(amount, 1 | 2 | 3 | 4 | 6 | 12),
    };
    if ok {
        Ok(())
    } else {
        ValidationSnafu {
            message: format!("Alpaca does not support timeframe {timeframe}"),
        }
        .fail()
    }
}

/// Builds the query string for `/v2/stocks/bars`, minus `page_token`.
pub fn construct_params(params: &BarsRequestParams) -> Vec<(String, String)> {
    let mut query = vec![
        ("symbols".to_string(), params.symbols.join(",")),
        ("timeframe".to_string(), params.timeframe.to_string()),
        (
            "start".to_string(),
            params.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        (
            "end".to_string(),
            params.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
    ];

    if let ProviderParams::Alpaca(extra) = &params.provider_specific {
        if let Some(adjustment) = extra.adjustment.as_ref().and_then(token) {
            query.push(("adjustment".to_string(), adjustment));
        }
        if let Some(feed) = extra.feed.as_ref().and_then(token) {
            query.push(("feed".to_string(), feed));
        }
        if let Some(currency) = &extra.currency {
            query.push(("currency".to_string(), currency.clone()));
        }
        if let Some(limit) = extra.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(sort) = extra.sort.as_ref().and_then(token) {
            query.push(("sort".to_string(), sort));
        }
    }

    query
}
