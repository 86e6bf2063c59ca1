use crate::price_book::PriceBook;
use async_trait::async_trait;
use autotrader_core::{
    BrokerAdapter, BrokerCapabilities, BrokerError, Clock, Direction, OrderAck, SystemClock,
    TradePlan,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;

/// A simulated fill kept for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct PaperFill {
    pub order_id: String,
    pub symbol: String,
    pub direction: Direction,
    pub quantity: Decimal,
    pub price: Decimal,
    pub commission: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Paper trading broker adapter.
///
/// Fills market entries against the shared `PriceBook` (falling back to the
/// plan's entry when no quote exists) with slippage applied against the taker.
/// Exchange precision is emulated with a tick size for prices and a lot size
/// for quantities.
///
/// # Safety
///
/// This adapter makes **zero API calls**. It is impossible to execute real
/// trades through it.
pub struct PaperBroker {
    name: String,
    price_book: Arc<PriceBook>,
    commission_rate: Decimal,
    slippage_bps: Decimal,
    tick_size: Decimal,
    lot_size: Decimal,
    clock: Arc<dyn Clock>,
    fills: Mutex<Vec<PaperFill>>,
}

impl PaperBroker {
    /// Creates a new paper broker.
    ///
    /// # Arguments
    ///
    /// * `name` - Adapter name accounts refer to
    /// * `price_book` - Quotes used for fills
    /// * `commission_rate` - Commission as a fraction (e.g., 0.00025 = 0.025%)
    /// * `slippage_bps` - Slippage in basis points (e.g., 10 = 0.1%)
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        price_book: Arc<PriceBook>,
        commission_rate: Decimal,
        slippage_bps: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            price_book,
            commission_rate,
            slippage_bps,
            tick_size: Decimal::new(1, 2),
            lot_size: Decimal::new(1, 8),
            clock: Arc::new(SystemClock),
            fills: Mutex::new(Vec::new()),
        }
    }

    /// Overrides the precision grid. Non-positive values disable the rule.
    #[must_use]
    pub fn with_precision(mut self, tick_size: Decimal, lot_size: Decimal) -> Self {
        self.tick_size = tick_size;
        self.lot_size = lot_size;
        self
    }

    /// Stamps fills with `clock` instead of wall time.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn fills(&self) -> Vec<PaperFill> {
        self.fills.lock().clone()
    }

    fn apply_slippage(&self, price: Decimal, direction: Direction) -> Decimal {
        let slippage = price * self.slippage_bps / Decimal::from(10_000);
        match direction {
            Direction::Long => price + slippage,
            Direction::Short => price - slippage,
        }
    }

    fn on_grid(value: Decimal, step: Decimal) -> bool {
        step <= Decimal::ZERO || (value % step).is_zero()
    }
}

#[async_trait]
impl BrokerAdapter for PaperBroker {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> BrokerCapabilities {
        BrokerCapabilities {
            supports_market_entry: true,
            supports_protective_exits: false,
            enforces_precision_rules: true,
        }
    }

    async fn validate(&self, plan: &TradePlan) -> Result<(), BrokerError> {
        plan.check_geometry().map_err(BrokerError::Validation)?;

        if !Self::on_grid(plan.quantity, self.lot_size) {
            return Err(BrokerError::Validation(format!(
                "quantity {} is not a multiple of lot size {}",
                plan.quantity, self.lot_size
            )));
        }
        for (label, price) in [("entry", plan.entry), ("stop", plan.stop), ("target", plan.target)] {
            if !Self::on_grid(price, self.tick_size) {
                return Err(BrokerError::Validation(format!(
                    "{label} {price} is not a multiple of tick size {}",
                    self.tick_size
                )));
            }
        }
        Ok(())
    }

    async fn place(&self, plan: &TradePlan) -> Result<OrderAck, BrokerError> {
        if plan.quantity <= Decimal::ZERO {
            return Err(BrokerError::Rejected(format!(
                "quantity {} must be positive",
                plan.quantity
            )));
        }

        let base_price = self.price_book.price(&plan.symbol).await.unwrap_or(plan.entry);
        let price = self.apply_slippage(base_price, plan.direction);
        let commission = price * plan.quantity * self.commission_rate;
        let order_id = uuid::Uuid::new_v4().to_string();

        self.fills.lock().push(PaperFill {
            order_id: order_id.clone(),
            symbol: plan.symbol.clone(),
            direction: plan.direction,
            quantity: plan.quantity,
            price,
            commission,
            timestamp: self.clock.now(),
        });

        tracing::debug!(
            broker = %self.name,
            symbol = %plan.symbol,
            direction = %plan.direction,
            quantity = %plan.quantity,
            price = %price,
            "Paper fill"
        );

        Ok(OrderAck {
            order_id,
            fill_price: Some(price),
            message: format!("paper fill {} {} @ {price}", plan.direction, plan.quantity),
        })
    }

    async fn cancel_all(&self, symbol: &str) -> Result<String, BrokerError> {
        Ok(format!("no resting paper orders for {symbol}"))
    }
}
