//! Single-symbol portfolio state and equity tracking.

use chrono::NaiveDate;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Option<Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            position: None,
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    /// Invest all cash in `symbol` at `price`. Returns false when already
    /// long or there is nothing to invest.
    pub fn enter_long(&mut self, symbol: &str, price: f64, date: NaiveDate) -> bool {
        if self.position.is_some() || self.cash <= 0.0 || price <= 0.0 {
            return false;
        }
        let quantity = self.cash / price;
        self.cash = 0.0;
        self.position = Some(Position {
            symbol: symbol.to_string(),
            quantity,
            entry_price: price,
            entry_date: date,
        });
        true
    }

    /// Sell the whole position at `price`. Returns false when flat.
    pub fn exit_long(&mut self, price: f64, date: NaiveDate) -> bool {
        let Some(position) = self.position.take() else {
            return false;
        };
        self.cash += position.market_value(price);
        self.closed_trades.push(position.close(price, date));
        true
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }

    /// Cash plus the position marked at `price`.
    pub fn total_equity(&self, price: Option<f64>) -> f64 {
        let position_value = match (&self.position, price) {
            (Some(pos), Some(p)) => pos.market_value(p),
            (Some(pos), None) => pos.market_value(pos.entry_price),
            (None, _) => 0.0,
        };
        self.cash + position_value
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_capital)
    }
}
