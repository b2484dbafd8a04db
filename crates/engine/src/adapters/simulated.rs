//! Simulated provider
//!
//! An in-process stand-in for a market data and order execution vendor.
//! Logins are acknowledged immediately, market orders fill in full at the
//! symbol's reference price, and limit orders rest until the reference
//! price crosses them or they are cancelled. Ticks, bars, locates and
//! positions are pushed by whoever drives the simulation.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::Duration;
use dashmap::DashMap;
use hermes_core::{
    Bar, CancelOrder, Execution, HistoricBarData, HistoricBarRequest, LocateOrder,
    LocateResponse, Order, OrderId, OrderStatus, OrderType, Position, Price, Quantity,
    Rejection, RejectionKind, Side, Subscribe, SubscriptionKind, Symbol, Tick, Unsubscribe,
};
use hermes_ports::{Clock, ProviderAdapter, ProviderError, ProviderEvents, ProviderResult};
use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;

/// Upper bound on bars synthesized for one historic request
const MAX_HISTORIC_BARS: i64 = 10_000;

pub struct SimulatedProvider {
    name: String,
    clock: Arc<dyn Clock>,
    events: RwLock<Option<Arc<dyn ProviderEvents>>>,
    connected: AtomicBool,
    subscriptions: Mutex<HashSet<(Symbol, SubscriptionKind)>>,
    prices: DashMap<Symbol, Price>,
    default_price: Price,
    resting: DashMap<OrderId, Order>,
    executions: AtomicU64,
}

impl SimulatedProvider {
    pub fn new(name: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            clock,
            events: RwLock::new(None),
            connected: AtomicBool::new(false),
            subscriptions: Mutex::new(HashSet::new()),
            prices: DashMap::new(),
            default_price: Decimal::ONE_HUNDRED,
            resting: DashMap::new(),
            executions: AtomicU64::new(0),
        }
    }

    /// Reference price used for symbols without one set
    pub fn with_default_price(mut self, price: Price) -> Self {
        self.default_price = price;
        self
    }

    pub fn price(&self, symbol: &str) -> Price {
        self.prices
            .get(symbol)
            .map(|p| *p)
            .unwrap_or(self.default_price)
    }

    /// Move the reference price and fill any resting limit order it crosses
    pub fn set_price(&self, symbol: &str, price: Price) {
        self.prices.insert(symbol.to_string(), price);

        let crossed: Vec<OrderId> = self
            .resting
            .iter()
            .filter(|order| order.symbol == symbol && crosses(order.value(), price))
            .map(|order| order.id)
            .collect();
        for order_id in crossed {
            if let Some((_, order)) = self.resting.remove(&order_id) {
                let limit = order.limit_price.unwrap_or(price);
                self.fill(&order, limit);
            }
        }
    }

    pub fn is_subscribed(&self, symbol: &str, kind: SubscriptionKind) -> bool {
        self.subscriptions
            .lock()
            .contains(&(symbol.to_string(), kind))
    }

    /// Symbols with a live tick subscription, sorted
    pub fn tick_symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self
            .subscriptions
            .lock()
            .iter()
            .filter(|(_, kind)| *kind == SubscriptionKind::Tick)
            .map(|(symbol, _)| symbol.clone())
            .collect();
        symbols.sort();
        symbols
    }

    pub fn resting_orders(&self) -> usize {
        self.resting.len()
    }

    /// Push a quote for a subscribed symbol
    ///
    /// Returns false when nobody subscribed to the symbol's ticks.
    pub fn publish_tick(&self, symbol: &str, bid: Price, ask: Price, size: Quantity) -> bool {
        if !self.is_subscribed(symbol, SubscriptionKind::Tick) {
            return false;
        }
        let tick = Tick::quote(&self.name, symbol, bid, size, ask, size, self.clock.now());
        self.emit(|events| events.on_tick_arrived(tick));
        true
    }

    /// Quote every tick-subscribed symbol one cent either side of its
    /// reference price
    pub fn quote_subscribed(&self) -> usize {
        let spread = Decimal::new(1, 2);
        let symbols = self.tick_symbols();
        for symbol in &symbols {
            let mid = self.price(symbol);
            self.publish_tick(symbol, mid - spread, mid + spread, Decimal::ONE_HUNDRED);
        }
        symbols.len()
    }

    /// Push a completed live bar for a subscribed symbol
    pub fn publish_bar(&self, bar: Bar) -> bool {
        let kind = SubscriptionKind::LiveBar {
            bar_seconds: bar.bar_seconds,
        };
        if !self.is_subscribed(&bar.symbol, kind) {
            return false;
        }
        self.emit(|events| events.on_bar_arrived(bar));
        true
    }

    /// Offer a short locate to an application
    pub fn send_locate(&self, locate: LocateOrder) {
        self.emit(|events| events.on_locate_arrived(locate));
    }

    pub fn send_position(&self, position: Position) {
        self.emit(|events| events.on_position_arrived(position));
    }

    fn emit<F: FnOnce(&dyn ProviderEvents)>(&self, f: F) {
        // Clone out so no lock is held while the engine handles the event
        let events = self.events.read().clone();
        match events {
            Some(events) => f(events.as_ref()),
            None => debug!("{}: no listener attached, event dropped", self.name),
        }
    }

    fn ensure_connected(&self) -> ProviderResult<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ProviderError::NotConnected(self.name.clone()))
        }
    }

    fn reject(&self, reason: &str) -> ProviderError {
        ProviderError::Rejected {
            provider: self.name.clone(),
            reason: reason.to_string(),
        }
    }

    fn accept(&self, order: &Order) -> ProviderResult<()> {
        self.ensure_connected()?;
        if order.provider != self.name {
            return Err(self.reject("order addressed to another provider"));
        }
        if !order.validate() {
            return Err(self.reject("invalid quantity or price for order type"));
        }
        let ack = order.with_status(OrderStatus::New);
        self.emit(|events| events.on_order_new(ack));
        Ok(())
    }

    fn fill(&self, order: &Order, price: Price) {
        let sequence = self.executions.fetch_add(1, Ordering::Relaxed) + 1;
        let execution = Execution {
            execution_id: format!("{}-{}", self.name, sequence),
            order_id: order.id,
            provider: self.name.clone(),
            symbol: order.symbol.clone(),
            side: order.side,
            quantity: order.quantity,
            price,
            cumulative_quantity: order.quantity,
            leaves_quantity: Decimal::ZERO,
            timestamp: self.clock.now(),
        };
        self.emit(|events| events.on_order_executed(execution));
    }
}

/// True when a limit order is marketable at `price`
fn crosses(order: &Order, price: Price) -> bool {
    match (order.order_type, order.limit_price) {
        (OrderType::Market, _) | (_, None) => true,
        (OrderType::Limit, Some(limit)) => match order.side {
            Side::Buy => price <= limit,
            Side::Sell | Side::Short => price >= limit,
        },
    }
}

impl ProviderAdapter for SimulatedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn attach(&self, events: Arc<dyn ProviderEvents>) -> ProviderResult<()> {
        let mut slot = self.events.write();
        if slot.is_some() {
            return Err(ProviderError::ListenerAlreadyAttached(self.name.clone()));
        }
        *slot = Some(events);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn login(&self) -> ProviderResult<()> {
        if !self.connected.swap(true, Ordering::AcqRel) {
            info!("{}: session opened", self.name);
        }
        self.emit(|events| events.on_logon_arrived(&self.name));
        Ok(())
    }

    fn logout(&self) -> ProviderResult<()> {
        if self.connected.swap(false, Ordering::AcqRel) {
            info!("{}: session closed", self.name);
        }
        self.subscriptions.lock().clear();
        self.emit(|events| events.on_logout_arrived(&self.name));
        Ok(())
    }

    fn subscribe(&self, request: &Subscribe) -> ProviderResult<()> {
        self.ensure_connected()?;
        self.subscriptions
            .lock()
            .insert((request.symbol.clone(), request.kind));
        debug!("{}: streaming {:?} for {}", self.name, request.kind, request.symbol);
        Ok(())
    }

    fn unsubscribe(&self, request: &Unsubscribe) -> ProviderResult<()> {
        self.subscriptions
            .lock()
            .remove(&(request.symbol.clone(), request.kind));
        debug!("{}: stopped {:?} for {}", self.name, request.kind, request.symbol);
        Ok(())
    }

    fn request_historic_bars(&self, request: &HistoricBarRequest) -> ProviderResult<()> {
        self.ensure_connected()?;
        if request.bar_seconds == 0 {
            return Err(self.reject("bar length must be positive"));
        }
        if request.end < request.start {
            return Err(self.reject("historic range ends before it starts"));
        }

        let step = Duration::seconds(i64::from(request.bar_seconds));
        let span = (request.end - request.start).num_seconds() / i64::from(request.bar_seconds);
        let count = span.clamp(0, MAX_HISTORIC_BARS);
        let price = self.price(&request.symbol);
        let bars = (0..count)
            .map(|i| Bar {
                provider: self.name.clone(),
                symbol: request.symbol.clone(),
                bar_seconds: request.bar_seconds,
                open: price,
                high: price,
                low: price,
                close: price,
                volume: Decimal::ZERO,
                timestamp: request.start + step * (i as i32),
            })
            .collect();

        let data = HistoricBarData {
            request_id: request.request_id.clone(),
            provider: self.name.clone(),
            symbol: request.symbol.clone(),
            bars,
        };
        self.emit(|events| events.on_historic_data_arrived(data));
        Ok(())
    }

    fn send_market_order(&self, order: &Order) -> ProviderResult<()> {
        if order.order_type != OrderType::Market {
            return Err(self.reject("not a market order"));
        }
        self.accept(order)?;
        self.fill(order, self.price(&order.symbol));
        Ok(())
    }

    fn send_limit_order(&self, order: &Order) -> ProviderResult<()> {
        if order.order_type != OrderType::Limit {
            return Err(self.reject("not a limit order"));
        }
        self.accept(order)?;

        let price = self.price(&order.symbol);
        if crosses(order, price) {
            self.fill(order, order.limit_price.unwrap_or(price));
        } else {
            self.resting
                .insert(order.id, order.with_status(OrderStatus::New));
        }
        Ok(())
    }

    fn cancel_order(&self, request: &CancelOrder) -> ProviderResult<()> {
        self.ensure_connected()?;
        match self.resting.remove(&request.order_id) {
            Some((_, order)) => {
                let cancelled = order.with_status(OrderStatus::Cancelled);
                self.emit(|events| events.on_order_cancelled(cancelled));
            }
            None => {
                let rejection = Rejection {
                    order_id: request.order_id,
                    provider: self.name.clone(),
                    reason: "unknown or already completed order".to_string(),
                    kind: RejectionKind::Cancel,
                    timestamp: self.clock.now(),
                };
                self.emit(|events| events.on_order_rejected(rejection));
            }
        }
        Ok(())
    }

    fn send_locate_response(&self, response: &LocateResponse) -> ProviderResult<()> {
        self.ensure_connected()?;
        info!(
            "{}: locate {} {} by {}",
            self.name,
            response.locate_id,
            if response.accepted { "accepted" } else { "declined" },
            response.app_id
        );
        Ok(())
    }
}
