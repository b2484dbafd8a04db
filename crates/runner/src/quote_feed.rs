//! Quote feed - simulated market for the bundled providers
//!
//! Each step moves every tick-subscribed symbol's reference price by a
//! bounded random walk and pushes a fresh quote through its provider.
//! Moving the price also fills resting limit orders it crosses.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use hermes_engine::SimulatedProvider;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct QuoteFeedConfig {
    /// Time between quote rounds
    pub interval: Duration,
    /// Largest relative move per step (0.0005 = 0.05%)
    pub volatility: f64,
    /// Starting reference prices; other symbols start at the provider default
    pub initial_prices: HashMap<String, Decimal>,
}

impl Default for QuoteFeedConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1_000),
            volatility: 0.0005,
            initial_prices: HashMap::new(),
        }
    }
}

pub struct QuoteFeed {
    providers: Vec<Arc<SimulatedProvider>>,
    config: QuoteFeedConfig,
    rng: StdRng,
}

impl QuoteFeed {
    pub fn new(providers: Vec<Arc<SimulatedProvider>>, config: QuoteFeedConfig) -> Self {
        Self::with_rng(providers, config, StdRng::from_entropy())
    }

    /// Reproducible feed
    pub fn with_seed(
        providers: Vec<Arc<SimulatedProvider>>,
        config: QuoteFeedConfig,
        seed: u64,
    ) -> Self {
        Self::with_rng(providers, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        providers: Vec<Arc<SimulatedProvider>>,
        config: QuoteFeedConfig,
        rng: StdRng,
    ) -> Self {
        for provider in &providers {
            for (symbol, price) in &config.initial_prices {
                provider.set_price(symbol, *price);
            }
        }
        Self {
            providers,
            config,
            rng,
        }
    }

    /// Move prices and quote once; returns the number of quotes sent
    pub fn step(&mut self) -> usize {
        let mut quoted = 0;
        for provider in &self.providers {
            for symbol in provider.tick_symbols() {
                let current = provider.price(&symbol);
                let next = walk(current, self.config.volatility, &mut self.rng);
                provider.set_price(&symbol, next);
            }
            quoted += provider.quote_subscribed();
        }
        quoted
    }

    /// Run `step` every interval until the task is aborted
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.interval);
            loop {
                ticker.tick().await;
                let quoted = self.step();
                if quoted > 0 {
                    debug!("Quote feed sent {} quotes", quoted);
                }
            }
        })
    }
}

/// One random-walk step, kept positive and rounded to cents
fn walk(current: Decimal, volatility: f64, rng: &mut StdRng) -> Decimal {
    let change: f64 = rng.gen_range(-1.0..1.0);
    let Some(price) = current.to_f64() else {
        return current;
    };
    Decimal::from_f64(price * (1.0 + volatility * change))
        .map(|next| next.round_dp(2))
        .filter(|next| next.is_sign_positive() && !next.is_zero())
        .unwrap_or(current)
}
