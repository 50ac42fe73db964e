use crate::decode::{self, DecodeError};
use crate::invest::BrokerageApi;
use crate::money::annotate;
use anyhow::Result;
use serde_json::Value;
use std::io::Write;

// Placeholder name for a share whose `ShareBy` lookup failed.
const NULL_NAME: &str = "null";

/// Aggregate figures from the portfolio root.
#[derive(Debug, Clone, Copy)]
pub struct PortfolioSummary {
    pub total_value: f64,
    pub yield_percent: f64,
}

impl PortfolioSummary {
    pub fn from_portfolio(portfolio: &Value) -> Result<Self, DecodeError> {
        let total = decode::extract_money_at(portfolio, "totalAmountShares")?;
        let yield_percent = decode::extract_money_at(portfolio, "expectedYield")?;
        Ok(Self {
            total_value: total.to_f64(),
            yield_percent: yield_percent.to_f64(),
        })
    }
}

/// Daily gains and (absolute) daily losses across the processed shares.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DailyTotals {
    pub gained: f64,
    pub lost: f64,
}

impl DailyTotals {
    fn add(&mut self, daily_yield: f64) {
        if daily_yield > 0.0 {
            self.gained += daily_yield;
        } else if daily_yield < 0.0 {
            self.lost += -daily_yield;
        }
    }
}

/// Writes the full report: header, one line-block per `"share"` position in
/// server order, then the daily gain/loss footer.
pub async fn write_report<W: Write>(
    api: &dyn BrokerageApi,
    portfolio: &Value,
    summary: &PortfolioSummary,
    out: &mut W,
) -> Result<DailyTotals> {
    writeln!(out, "## Сумма портфеля: {:.2}₽", summary.total_value)?;
    writeln!(out, "## Процент роста портфеля: {:.2}%", summary.yield_percent)?;

    let positions = portfolio
        .get("positions")
        .and_then(Value::as_array)
        .ok_or_else(|| DecodeError::FieldMissing {
            path: "positions".to_string(),
        })?;

    let mut totals = DailyTotals::default();
    for position in positions {
        if position.get("instrumentType").and_then(Value::as_str) != Some("share") {
            continue;
        }

        let figi = decode::extract_str(position, &["figi"])?;
        let price = decode::extract_money_at(position, "currentPrice")?.to_f64();
        let quantity = decode::extract_money_at(position, "quantity")?;
        let daily_yield = decode::extract_money_at(position, "dailyYield")?.to_f64();
        let yearly_yield = decode::extract_money_at(position, "expectedYield")?.to_f64();

        let name = match resolve_share_name(api, figi).await {
            Ok(name) => name,
            Err(err) => {
                tracing::warn!(%figi, error = %err, "share name lookup failed; emitting placeholder");
                NULL_NAME.to_string()
            }
        };

        // Quantity is counted in whole units only.
        let qty = quantity.units;
        let value = price * qty as f64;

        writeln!(out, "# {name} {price:.2}₽ ({qty})({value:.2})")?;
        writeln!(out, "> Дневной результат - {}", annotate(daily_yield))?;
        writeln!(out, "> Годовое ожидание - {}", annotate(yearly_yield))?;

        totals.add(daily_yield);
    }

    writeln!(
        out,
        "## Прирост за день: <font color=008000>{:.2}₽</font>",
        totals.gained
    )?;
    writeln!(
        out,
        "## Падение за день: <font color=FF0000>{:.2}₽</font>",
        totals.lost
    )?;

    Ok(totals)
}

async fn resolve_share_name(api: &dyn BrokerageApi, figi: &str) -> Result<String> {
    let res = api.share_by(figi).await?;
    let name = decode::extract_str(&res, &["instrument", "name"])?;
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::json;
    use std::collections::HashMap;

    struct StubApi {
        names: HashMap<&'static str, &'static str>,
    }

    impl StubApi {
        fn with_names(pairs: &[(&'static str, &'static str)]) -> Self {
            Self {
                names: pairs.iter().copied().collect(),
            }
        }
    }

    #[async_trait::async_trait]
    impl BrokerageApi for StubApi {
        async fn get_accounts(&self) -> Result<Value> {
            bail!("not used by the report generator")
        }

        async fn get_portfolio(&self, _account_id: &str) -> Result<Value> {
            bail!("not used by the report generator")
        }

        async fn share_by(&self, figi: &str) -> Result<Value> {
            match self.names.get(figi) {
                Some(name) => Ok(json!({"instrument": {"name": name}})),
                None => bail!("instrument not found: {figi}"),
            }
        }
    }

    fn money(units: i64, nano: i32) -> Value {
        json!({"units": units.to_string(), "nano": nano})
    }

    fn share_position(figi: &str, price: (i64, i32), qty: i64, daily: i64, yearly: i64) -> Value {
        json!({
            "instrumentType": "share",
            "figi": figi,
            "currentPrice": money(price.0, price.1),
            "quantity": money(qty, 0),
            "dailyYield": money(daily, 0),
            "expectedYield": money(yearly, 0),
        })
    }

    fn portfolio_with(positions: Vec<Value>) -> Value {
        json!({
            "totalAmountShares": money(1000, 500_000_000),
            "expectedYield": money(2, 750_000_000),
            "positions": positions,
        })
    }

    async fn render(api: &dyn BrokerageApi, portfolio: &Value) -> (String, DailyTotals) {
        let summary = PortfolioSummary::from_portfolio(portfolio).unwrap();
        let mut buf = Vec::new();
        let totals = write_report(api, portfolio, &summary, &mut buf).await.unwrap();
        (String::from_utf8(buf).unwrap(), totals)
    }

    #[test]
    fn summary_decodes_portfolio_root() {
        let portfolio = portfolio_with(vec![]);
        let summary = PortfolioSummary::from_portfolio(&portfolio).unwrap();
        assert_eq!(summary.total_value, 1000.5);
        assert_eq!(summary.yield_percent, 2.75);
    }

    #[test]
    fn summary_requires_both_totals() {
        let portfolio = json!({"totalAmountShares": money(1000, 0)});
        assert!(PortfolioSummary::from_portfolio(&portfolio).is_err());
    }

    #[tokio::test]
    async fn renders_full_report_for_one_share() {
        let api = StubApi::with_names(&[("BBG004730RP0", "Газпром")]);
        let portfolio = portfolio_with(vec![share_position(
            "BBG004730RP0",
            (160, 500_000_000),
            10,
            3,
            -20,
        )]);

        let (text, _) = render(&api, &portfolio).await;
        assert_eq!(
            text,
            "## Сумма портфеля: 1000.50₽\n\
             ## Процент роста портфеля: 2.75%\n\
             # Газпром 160.50₽ (10)(1605.00)\n\
             > Дневной результат - рост на <font color=008000>3.00₽</font>\n\
             > Годовое ожидание - падение на <font color=FF0000>20.00₽</font>\n\
             ## Прирост за день: <font color=008000>3.00₽</font>\n\
             ## Падение за день: <font color=FF0000>0.00₽</font>\n"
        );
    }

    #[tokio::test]
    async fn accumulates_gains_and_losses_independent_of_order() {
        let api = StubApi::with_names(&[("FIGI-A", "A"), ("FIGI-B", "B")]);

        let loser = share_position("FIGI-A", (10, 0), 1, -5, 0);
        let winner = share_position("FIGI-B", (10, 0), 1, 3, 0);

        let (_, totals) = render(&api, &portfolio_with(vec![loser.clone(), winner.clone()])).await;
        assert_eq!(totals, DailyTotals { gained: 3.0, lost: 5.0 });

        let (_, totals) = render(&api, &portfolio_with(vec![winner, loser])).await;
        assert_eq!(totals, DailyTotals { gained: 3.0, lost: 5.0 });
    }

    #[tokio::test]
    async fn skips_non_share_instruments() {
        let api = StubApi::with_names(&[("FIGI-A", "A")]);

        let mut bond = share_position("FIGI-BOND", (100, 0), 2, -7, 0);
        bond["instrumentType"] = json!("bond");
        let share = share_position("FIGI-A", (10, 0), 1, 1, 0);

        let (text, totals) = render(&api, &portfolio_with(vec![bond, share])).await;
        assert!(!text.contains("FIGI-BOND"));
        assert_eq!(totals, DailyTotals { gained: 1.0, lost: 0.0 });
        // Exactly one share line-block.
        assert_eq!(text.matches("# A ").count(), 1);
    }

    #[tokio::test]
    async fn instrument_type_match_is_case_sensitive() {
        let api = StubApi::with_names(&[]);

        let mut position = share_position("FIGI-A", (10, 0), 1, 1, 0);
        position["instrumentType"] = json!("Share");

        let (_, totals) = render(&api, &portfolio_with(vec![position])).await;
        assert_eq!(totals, DailyTotals::default());
    }

    #[tokio::test]
    async fn failed_name_lookup_degrades_to_placeholder() {
        // Stub knows no names, so every lookup fails.
        let api = StubApi::with_names(&[]);
        let portfolio = portfolio_with(vec![share_position("FIGI-A", (10, 0), 2, 1, 1)]);

        let (text, totals) = render(&api, &portfolio).await;
        assert!(text.contains("# null 10.00₽ (2)(20.00)"));
        assert_eq!(totals.gained, 1.0);
    }

    #[tokio::test]
    async fn partial_money_pair_in_position_is_an_error() {
        let api = StubApi::with_names(&[("FIGI-A", "A")]);

        let mut position = share_position("FIGI-A", (10, 0), 1, 1, 0);
        position["dailyYield"] = json!({"units": "1"});
        let portfolio = portfolio_with(vec![position]);

        let summary = PortfolioSummary::from_portfolio(&portfolio).unwrap();
        let mut buf = Vec::new();
        let err = write_report(&api, &portfolio, &summary, &mut buf)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<DecodeError>(),
            Some(&DecodeError::FieldMissing {
                path: "dailyYield.nano".to_string()
            })
        );
    }

    #[tokio::test]
    async fn missing_positions_array_is_an_error() {
        let api = StubApi::with_names(&[]);
        let portfolio = json!({
            "totalAmountShares": money(0, 0),
            "expectedYield": money(0, 0),
        });

        let summary = PortfolioSummary::from_portfolio(&portfolio).unwrap();
        let mut buf = Vec::new();
        let err = write_report(&api, &portfolio, &summary, &mut buf)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<DecodeError>().is_some());
    }
}
