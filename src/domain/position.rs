//! Open positions and closed trade records.

use chrono::NaiveDate;
use serde::Serialize;

/// A long holding. Quantity is fractional: the whole cash balance is invested.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.entry_price)
    }

    /// Close the position at `exit_price` on `exit_date`.
    pub fn close(self, exit_price: f64, exit_date: NaiveDate) -> ClosedTrade {
        let pnl = self.unrealized_pnl(exit_price);
        let return_pct = if self.entry_price > 0.0 {
            (exit_price - self.entry_price) / self.entry_price
        } else {
            0.0
        };
        ClosedTrade {
            symbol: self.symbol,
            quantity: self.quantity,
            entry_price: self.entry_price,
            exit_price,
            entry_date: self.entry_date,
            exit_date,
            pnl,
            return_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
    /// Trade return as a fraction of the entry price.
    pub return_pct: f64,
}

impl ClosedTrade {
    pub fn duration_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
