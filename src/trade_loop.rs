use crate::config::{BotConfig, EquityMode, TradingConfig};
use crate::error::BotError;
use crate::execution::{ExecutionResult, OrderExecutor, PositionGuard};
use crate::gateway::BrokerGateway;
use crate::models::{AccountState, Candle, OrderIntent, OrderSide, SymbolInfo};
use crate::risk::RiskCalculator;
use crate::shutdown::Shutdown;
use crate::strategy::SignalDetector;
use crate::Result;
use chrono::{Duration as ChronoDuration, Utc};
use std::time::Duration;

/// Where the current cycle is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    SignalPending,
    Confirming,
    ReadyToTrade,
    Submitted,
}

/// How a cycle ended, when it did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Move below threshold
    NoSignal { change_pct: f64 },
    /// First detection did not survive the cooldown
    NotSustained { first_pct: f64, second_pct: f64 },
    /// Signal confirmed but the symbol already has exposure
    Blocked { active_count: usize },
    Submitted(ExecutionResult),
    /// Shutdown requested mid-cycle, nothing was sent
    Interrupted,
}

/// Single-symbol decision-and-execution loop
pub struct TradeLoop<'a, G: BrokerGateway> {
    gateway: &'a G,
    trading: TradingConfig,
    detector: SignalDetector,
    risk: RiskCalculator,
    account: AccountState,
    shutdown: Shutdown,
    state: CycleState,
}

impl<'a, G: BrokerGateway> TradeLoop<'a, G> {
    /// Build the loop around equity read at startup
    pub fn new(gateway: &'a G, config: &BotConfig, equity: f64, shutdown: Shutdown) -> Result<Self> {
        Ok(Self {
            gateway,
            trading: config.trading.clone(),
            detector: SignalDetector::new(config.risk.price_threshold_pct),
            risk: RiskCalculator::new(config.risk.clone()),
            account: AccountState {
                equity: checked_equity(equity)?,
            },
            shutdown,
            state: CycleState::Idle,
        })
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn equity(&self) -> f64 {
        self.account.equity
    }

    /// Run cycles until shutdown, returning the number of completed iterations
    ///
    /// A failed cycle is logged and the loop moves on.
    pub async fn run(&mut self) -> u64 {
        let poll = Duration::from_secs(self.trading.poll_interval_secs);
        let mut iteration = 0u64;

        while !self.shutdown.is_triggered() {
            match self.run_cycle().await {
                Ok(CycleOutcome::Interrupted) => break,
                Ok(_) => {}
                Err(e) => tracing::warn!("  ✗ Cycle skipped: {}", e),
            }

            tracing::info!("Iteration {}", iteration);
            iteration += 1;

            if !self.shutdown.sleep(poll).await {
                break;
            }
        }

        iteration
    }

    /// One pass through the state machine, always ending in `Idle`
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome> {
        let outcome = self.evaluate().await;
        self.transition(CycleState::Idle);
        outcome
    }

    async fn evaluate(&mut self) -> Result<CycleOutcome> {
        let symbol = self.trading.symbol.clone();

        // Idle: first sample
        let candles = self.fetch_window().await?;
        let quote = self.gateway.quote(&symbol).await?;
        let Some(first_pct) = self.detector.detect(&candles)? else {
            let change_pct = SignalDetector::change_pct(&candles)?;
            tracing::info!(
                "  {} @ {:.2}/{:.2}: difference is only {:.2}% (need {}%), trying again...",
                symbol,
                quote.bid,
                quote.ask,
                change_pct,
                self.detector.threshold_pct()
            );
            return Ok(CycleOutcome::NoSignal { change_pct });
        };

        // SignalPending: wait out the cooldown, then resample
        self.transition(CycleState::SignalPending);
        tracing::info!(
            "📈 dif 1: {} moved {:.2}%, confirming in {}s",
            symbol,
            first_pct,
            self.risk.params().cooldown_secs
        );
        let cooldown = Duration::from_secs(self.risk.params().cooldown_secs);
        if !self.shutdown.sleep(cooldown).await {
            tracing::info!("  Cooldown interrupted, abandoning cycle");
            return Ok(CycleOutcome::Interrupted);
        }
        let candles = self.fetch_window().await?;

        // Confirming
        self.transition(CycleState::Confirming);
        let Some(second_pct) = self.detector.confirm(first_pct, &candles)? else {
            let second_pct = SignalDetector::change_pct(&candles)?;
            tracing::info!(
                "  No sustained move: {:.2}% then {:.2}%",
                first_pct,
                second_pct
            );
            return Ok(CycleOutcome::NotSustained {
                first_pct,
                second_pct,
            });
        };
        tracing::info!("📈 dif 2: {} moved {:.2}%", symbol, second_pct);

        // ReadyToTrade: exposure is checked last, only pure work runs
        // between the guard and the order
        self.transition(CycleState::ReadyToTrade);
        let side = self.trading.side_for(second_pct);
        let executor = OrderExecutor::new(self.gateway);
        let info = executor.prepare_symbol(&symbol).await?;
        let entry_price = self.gateway.quote(&symbol).await?.entry_price(side);
        if self.trading.equity_mode == EquityMode::PerCycle {
            let equity = checked_equity(self.gateway.account_equity().await?)?;
            tracing::debug!("Equity refreshed: {:.2}", equity);
            self.account.equity = equity;
        }

        let guard = PositionGuard::new(self.gateway).check(&symbol).await?;
        if !guard.can_trade {
            tracing::info!(
                "  Signal detected, but {} has {} active trade(s)",
                symbol,
                guard.active_count
            );
            return Ok(CycleOutcome::Blocked {
                active_count: guard.active_count,
            });
        }

        let intent = self.build_intent(side, entry_price, &info, second_pct)?;

        // Submitted
        self.transition(CycleState::Submitted);
        let result = executor.submit(&intent).await?;
        Ok(CycleOutcome::Submitted(result))
    }

    fn build_intent(
        &self,
        side: OrderSide,
        entry_price: f64,
        info: &SymbolInfo,
        change_pct: f64,
    ) -> Result<OrderIntent> {
        let symbol = &self.trading.symbol;
        let levels = self
            .risk
            .compute(self.account.equity, entry_price, side, info)?;

        tracing::info!(
            "  {} moved {:.2}%, opening {} position",
            symbol,
            change_pct,
            side
        );

        Ok(OrderIntent {
            symbol: symbol.clone(),
            side,
            volume: levels.volume,
            entry_price,
            stop_loss: levels.stop_loss,
            take_profit: levels.take_profit,
            tag: self.risk.params().magic,
            comment: self.trading.comment.clone(),
        })
    }

    /// Candle window ending now, never cached between samples
    async fn fetch_window(&self) -> Result<Vec<Candle>> {
        let hours = self.trading.lookback_hours;
        let to = Utc::now();
        let from = i64::try_from(hours)
            .ok()
            .and_then(ChronoDuration::try_hours)
            .and_then(|lookback| to.checked_sub_signed(lookback))
            .ok_or_else(|| {
                BotError::Config(format!("lookback of {} hours is out of range", hours))
            })?;
        self.gateway
            .candles(&self.trading.symbol, self.trading.timeframe, from, to)
            .await
    }

    fn transition(&mut self, next: CycleState) {
        if self.state != next {
            tracing::debug!("{:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

fn checked_equity(equity: f64) -> Result<f64> {
    if equity.is_finite() && equity > 0.0 {
        Ok(equity)
    } else {
        Err(BotError::InvalidEquity(equity))
    }
}
