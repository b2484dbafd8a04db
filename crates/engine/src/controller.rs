//! Engine controller
//!
//! Glue between the three sides of an engine server:
//!
//! ```text
//!   request queues ──► handle_request ──► provider adapters
//!                                              │
//!   reply routing keys ◄── route ◄── ProviderEvents callbacks
//!          ▲
//!          └── heartbeat monitor (keep-alives, evictions)
//! ```
//!
//! Inbound requests are served on queue consumer tasks, provider callbacks
//! arrive on adapter threads, and heartbeat ticks on the timer task, all at
//! the same time. Every table here is a `DashMap`, and no map guard is held
//! while calling into a provider, since adapters may call straight back.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use hermes_core::{
    AppInfo, ApplicationId, Bar, CancelOrder, DomainEvent, Execution, Heartbeat,
    HistoricBarData, HistoricBarRequest, Inquiry, InquiryResponse, InquiryType, LocateOrder,
    LocateResponse, Login, Logout, Order, OrderId, Position, Rejection, RejectionKind,
    Subscribe, SubscriptionKind, Symbol, Tick, Unsubscribe,
};
use hermes_dispatcher::Dispatcher;
use hermes_gateway::{InboundRequest, QueueTopologyManager};
use hermes_ports::{Clock, ProviderAdapter, ProviderEvents, ProviderResult};
use hermes_session::{
    AppIdGenerator, HeartbeatListener, HeartbeatMonitor, RoutingDirectory, SessionError,
};
use log::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// One provider-level market data stream
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    pub provider: String,
    pub symbol: Symbol,
    pub kind: SubscriptionKind,
}

impl SubscriptionKey {
    pub fn new(provider: &str, symbol: &str, kind: SubscriptionKind) -> Self {
        Self {
            provider: provider.to_string(),
            symbol: symbol.to_string(),
            kind,
        }
    }

    fn unsubscribe_for(&self, app_id: &ApplicationId) -> Unsubscribe {
        Unsubscribe {
            app_id: app_id.clone(),
            provider: self.provider.clone(),
            symbol: self.symbol.clone(),
            kind: self.kind,
        }
    }
}

impl From<&Subscribe> for SubscriptionKey {
    fn from(request: &Subscribe) -> Self {
        Self::new(&request.provider, &request.symbol, request.kind)
    }
}

impl From<&Unsubscribe> for SubscriptionKey {
    fn from(request: &Unsubscribe) -> Self {
        Self::new(&request.provider, &request.symbol, request.kind)
    }
}

pub struct EngineController {
    name: String,
    clock: Arc<dyn Clock>,
    directory: Arc<RoutingDirectory>,
    heartbeat: Arc<HeartbeatMonitor>,
    ids: AppIdGenerator,
    topology: Arc<QueueTopologyManager>,
    dispatcher: Arc<Dispatcher>,
    providers: DashMap<String, Arc<dyn ProviderAdapter>>,
    subscriptions: DashMap<SubscriptionKey, HashSet<ApplicationId>>,
    order_owners: DashMap<OrderId, ApplicationId>,
    cancel_requests: DashMap<OrderId, ApplicationId>,
    historic_requests: DashMap<String, ApplicationId>,
    logon_requests: DashMap<String, HashSet<ApplicationId>>,
    unroutable: AtomicU64,
}

impl EngineController {
    pub fn new(
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
        topology: Arc<QueueTopologyManager>,
        dispatcher: Arc<Dispatcher>,
    ) -> Result<Self> {
        let directory = Arc::new(RoutingDirectory::new());
        let heartbeat = Arc::new(HeartbeatMonitor::new(
            config.heartbeat_config(),
            Arc::clone(&directory),
            Arc::clone(&clock),
        )?);
        let ids = match &config.app_id_prefix {
            Some(prefix) => AppIdGenerator::with_prefix(prefix),
            None => AppIdGenerator::new(),
        };

        Ok(Self {
            name: config.name.clone(),
            clock,
            directory,
            heartbeat,
            ids,
            topology,
            dispatcher,
            providers: DashMap::new(),
            subscriptions: DashMap::new(),
            order_owners: DashMap::new(),
            cancel_requests: DashMap::new(),
            historic_requests: DashMap::new(),
            logon_requests: DashMap::new(),
            unroutable: AtomicU64::new(0),
        })
    }

    /// Register this controller as the handler for every configured queue
    /// and as the heartbeat listener
    ///
    /// Both registrations hold the controller weakly.
    pub fn bind(self: &Arc<Self>) -> Result<()> {
        let kinds: Vec<_> = self.topology.config().kinds().collect();
        for kind in kinds {
            let controller = Arc::downgrade(self);
            self.topology.on_request(kind, move |request| {
                if let Some(controller) = controller.upgrade() {
                    controller.handle_request(request);
                }
            })?;
        }
        self.heartbeat
            .set_listener(Arc::new(ControllerHandle(Arc::downgrade(self))))?;
        Ok(())
    }

    /// Add a provider adapter and attach this controller to its events
    pub fn register_provider(self: &Arc<Self>, provider: Arc<dyn ProviderAdapter>) -> Result<()> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(EngineError::DuplicateProvider(name));
        }
        provider.attach(Arc::new(ControllerHandle(Arc::downgrade(self))))?;
        self.providers.insert(name.clone(), provider);
        info!("{}: registered provider '{}'", self.name, name);
        Ok(())
    }

    pub fn provider(&self, name: &str) -> Option<Arc<dyn ProviderAdapter>> {
        self.providers.get(name).map(|p| Arc::clone(p.value()))
    }

    /// Registered provider names, sorted
    pub fn provider_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.iter().map(|p| p.key().clone()).collect();
        names.sort();
        names
    }

    pub fn directory(&self) -> &Arc<RoutingDirectory> {
        &self.directory
    }

    pub fn heartbeat(&self) -> &Arc<HeartbeatMonitor> {
        &self.heartbeat
    }

    /// Applications currently subscribed to `key`
    pub fn subscribers(&self, key: &SubscriptionKey) -> Vec<ApplicationId> {
        self.subscriptions
            .get(key)
            .map(|apps| apps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Events dropped because their application had no destination
    pub fn unroutable(&self) -> u64 {
        self.unroutable.load(Ordering::Relaxed)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn order_owner(&self, order_id: &OrderId) -> Option<ApplicationId> {
        self.order_owners.get(order_id).map(|owner| owner.clone())
    }

    pub fn open_orders(&self) -> usize {
        self.order_owners.len()
    }

    pub fn handle_request(&self, request: InboundRequest) {
        debug!("{}: handling {} request", self.name, request.kind());
        match request {
            InboundRequest::Login(login) => self.on_login(login),
            InboundRequest::Logout(logout) => self.on_logout(logout),
            InboundRequest::Subscribe(request) => self.on_subscribe(request),
            InboundRequest::Unsubscribe(request) => self.on_unsubscribe(request),
            InboundRequest::HistoricBars(request) => self.on_historic_bars(request),
            InboundRequest::MarketOrder(order) => {
                self.on_order(order, |provider, order| provider.send_market_order(order))
            }
            InboundRequest::LimitOrder(order) => {
                self.on_order(order, |provider, order| provider.send_limit_order(order))
            }
            InboundRequest::CancelOrder(request) => self.on_cancel(request),
            InboundRequest::LocateResponse(response) => self.on_locate_response(response),
            InboundRequest::Inquiry(inquiry) => self.on_inquiry(inquiry),
            InboundRequest::AppInfo(info) => self.on_app_info(info),
            InboundRequest::Heartbeat(heartbeat) => self.on_heartbeat(heartbeat),
        }
    }

    /// Deliver `event` to the destination `app_id` registered for its class
    ///
    /// Returns false when no destination is known; the event is dropped.
    pub fn route(&self, app_id: &ApplicationId, event: DomainEvent) -> bool {
        let Some(destination) = self.directory.resolve(app_id, event.message_type()) else {
            debug!(
                "{}: no {} destination for {}, dropping {}",
                self.name,
                event.message_type(),
                app_id,
                event.name()
            );
            self.unroutable.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        self.publish(&destination, &event);
        true
    }

    /// Encode `event` once and deliver it to each application
    ///
    /// Returns how many applications had a destination for it.
    pub fn fan_out(&self, app_ids: &[ApplicationId], event: &DomainEvent) -> usize {
        let message_type = event.message_type();
        let destinations: Vec<String> = app_ids
            .iter()
            .filter_map(|app_id| {
                let destination = self.directory.resolve(app_id, message_type);
                if destination.is_none() {
                    debug!(
                        "{}: no {} destination for {}, dropping {}",
                        self.name,
                        message_type,
                        app_id,
                        event.name()
                    );
                    self.unroutable.fetch_add(1, Ordering::Relaxed);
                }
                destination
            })
            .collect();
        if destinations.is_empty() {
            return 0;
        }

        let payload = match self.topology.codec().encode_event(event) {
            Ok(payload) => payload,
            Err(e) => {
                error!("{}: failed to encode {}: {}", self.name, event.name(), e);
                return 0;
            }
        };
        for destination in &destinations {
            self.send_bytes(destination, &payload, event);
        }
        destinations.len()
    }

    /// Forget everything held for an application and drop provider
    /// streams nobody else is using
    ///
    /// Safe to call for an application that is already gone.
    pub fn release_application(&self, app_id: &ApplicationId) {
        let had_route = self.directory.unregister(app_id);
        self.heartbeat.remove(app_id);

        let mut abandoned = Vec::new();
        for mut entry in self.subscriptions.iter_mut() {
            if entry.value_mut().remove(app_id) && entry.value().is_empty() {
                abandoned.push(entry.key().clone());
            }
        }
        for key in &abandoned {
            self.subscriptions.remove_if(key, |_, apps| apps.is_empty());
        }

        for mut entry in self.logon_requests.iter_mut() {
            entry.value_mut().remove(app_id);
        }
        self.order_owners.retain(|_, owner| *owner != *app_id);
        self.cancel_requests.retain(|_, requester| *requester != *app_id);
        self.historic_requests.retain(|_, owner| *owner != *app_id);

        for key in abandoned {
            self.unsubscribe_provider(&key.unsubscribe_for(app_id));
        }
        if had_route {
            info!("{}: released application {}", self.name, app_id);
        }
    }

    fn publish(&self, destination: &str, event: &DomainEvent) {
        if event.is_data_plane() {
            match self.topology.codec().encode_event(event) {
                Ok(payload) => self.send_bytes(destination, &payload, event),
                Err(e) => error!("{}: failed to encode {}: {}", self.name, event.name(), e),
            }
        } else if let Err(e) = self.topology.publish_event(destination, event) {
            error!(
                "{}: failed to publish {} to '{}': {}",
                self.name,
                event.name(),
                destination,
                e
            );
        }
    }

    fn send_bytes(&self, destination: &str, payload: &[u8], event: &DomainEvent) {
        if event.is_data_plane() {
            if let Err(e) = self.dispatcher.dispatch(destination, payload) {
                error!(
                    "{}: failed to dispatch {} to '{}': {}",
                    self.name,
                    event.name(),
                    destination,
                    e
                );
            }
        } else if let Err(e) = self.topology.publish_bytes(destination, payload) {
            error!(
                "{}: failed to publish {} to '{}': {}",
                self.name,
                event.name(),
                destination,
                e
            );
        }
    }

    fn provider_or_warn(
        &self,
        name: &str,
        app_id: &ApplicationId,
    ) -> Option<Arc<dyn ProviderAdapter>> {
        let provider = self.provider(name);
        if provider.is_none() {
            warn!(
                "{}: request from {} names unknown provider '{}'",
                self.name, app_id, name
            );
        }
        provider
    }

    fn on_login(&self, login: Login) {
        let Some(provider) = self.provider_or_warn(&login.provider, &login.app_id) else {
            return;
        };
        self.logon_requests
            .entry(login.provider.clone())
            .or_default()
            .insert(login.app_id.clone());

        if provider.is_connected() {
            let app_id = login.app_id.clone();
            self.route(&app_id, DomainEvent::Logon(login));
            return;
        }
        if let Err(e) = provider.login() {
            error!("{}: login to '{}' failed: {}", self.name, login.provider, e);
        }
    }

    fn on_logout(&self, logout: Logout) {
        let Some(provider) = self.provider_or_warn(&logout.provider, &logout.app_id) else {
            return;
        };
        let remaining = self
            .logon_requests
            .get_mut(&logout.provider)
            .map(|mut apps| {
                apps.remove(&logout.app_id);
                apps.len()
            })
            .unwrap_or(0);

        let app_id = logout.app_id.clone();
        let provider_name = logout.provider.clone();
        self.route(&app_id, DomainEvent::Logout(logout));

        if remaining == 0 && provider.is_connected() {
            if let Err(e) = provider.logout() {
                error!("{}: logout from '{}' failed: {}", self.name, provider_name, e);
            }
        }
    }

    fn on_subscribe(&self, request: Subscribe) {
        let Some(provider) = self.provider_or_warn(&request.provider, &request.app_id) else {
            return;
        };
        let key = SubscriptionKey::from(&request);
        let first = {
            let mut apps = self.subscriptions.entry(key.clone()).or_default();
            let was_empty = apps.is_empty();
            apps.insert(request.app_id.clone()) && was_empty
        };
        if !first {
            debug!(
                "{}: {} joined existing {:?} stream for {}",
                self.name, request.app_id, key.kind, key.symbol
            );
            return;
        }

        if let Err(e) = provider.subscribe(&request) {
            warn!(
                "{}: subscribe to {} on '{}' failed: {}",
                self.name, request.symbol, request.provider, e
            );
            if let Some(mut apps) = self.subscriptions.get_mut(&key) {
                apps.remove(&request.app_id);
            }
            self.subscriptions.remove_if(&key, |_, apps| apps.is_empty());
        }
    }

    fn on_unsubscribe(&self, request: Unsubscribe) {
        let key = SubscriptionKey::from(&request);
        let removed = self
            .subscriptions
            .get_mut(&key)
            .is_some_and(|mut apps| apps.remove(&request.app_id));
        if !removed {
            debug!(
                "{}: {} was not subscribed to {:?} for {}",
                self.name, request.app_id, key.kind, key.symbol
            );
            return;
        }
        if self
            .subscriptions
            .remove_if(&key, |_, apps| apps.is_empty())
            .is_some()
        {
            self.unsubscribe_provider(&request);
        }
    }

    fn unsubscribe_provider(&self, request: &Unsubscribe) {
        let Some(provider) = self.provider(&request.provider) else {
            return;
        };
        if let Err(e) = provider.unsubscribe(request) {
            warn!(
                "{}: unsubscribe from {} on '{}' failed: {}",
                self.name, request.symbol, request.provider, e
            );
        }
    }

    fn on_historic_bars(&self, request: HistoricBarRequest) {
        let Some(provider) = self.provider_or_warn(&request.provider, &request.app_id) else {
            return;
        };
        self.historic_requests
            .insert(request.request_id.clone(), request.app_id.clone());
        if let Err(e) = provider.request_historic_bars(&request) {
            warn!(
                "{}: historic bar request {} failed: {}",
                self.name, request.request_id, e
            );
            self.historic_requests.remove(&request.request_id);
        }
    }

    fn on_order<F>(&self, order: Order, send: F)
    where
        F: FnOnce(&dyn ProviderAdapter, &Order) -> ProviderResult<()>,
    {
        let Some(provider) = self.provider_or_warn(&order.provider, &order.app_id) else {
            self.reject(&order.app_id, order.id, &order.provider, "unknown provider");
            return;
        };
        self.order_owners.insert(order.id, order.app_id.clone());

        if let Err(e) = send(provider.as_ref(), &order) {
            warn!("{}: order {} failed: {}", self.name, order.id, e);
            self.order_owners.remove(&order.id);
            self.reject(&order.app_id, order.id, &order.provider, &e.to_string());
        }
    }

    fn on_cancel(&self, request: CancelOrder) {
        if let Some(owner) = self.order_owner(&request.order_id) {
            if owner != request.app_id {
                warn!(
                    "{}: {} tried to cancel order {} owned by {}",
                    self.name, request.app_id, request.order_id, owner
                );
                self.reject_cancel(
                    &request.app_id,
                    request.order_id,
                    &request.provider,
                    "order belongs to another application",
                );
                return;
            }
        }
        let Some(provider) = self.provider_or_warn(&request.provider, &request.app_id) else {
            self.reject_cancel(
                &request.app_id,
                request.order_id,
                &request.provider,
                "unknown provider",
            );
            return;
        };
        self.cancel_requests
            .insert(request.order_id, request.app_id.clone());
        if let Err(e) = provider.cancel_order(&request) {
            warn!("{}: cancel of {} failed: {}", self.name, request.order_id, e);
            self.cancel_requests.remove(&request.order_id);
            self.reject_cancel(
                &request.app_id,
                request.order_id,
                &request.provider,
                &e.to_string(),
            );
        }
    }

    fn reject(&self, app_id: &ApplicationId, order_id: OrderId, provider: &str, reason: &str) {
        self.reject_as(app_id, order_id, provider, reason, RejectionKind::Order);
    }

    fn reject_cancel(
        &self,
        app_id: &ApplicationId,
        order_id: OrderId,
        provider: &str,
        reason: &str,
    ) {
        self.reject_as(app_id, order_id, provider, reason, RejectionKind::Cancel);
    }

    fn reject_as(
        &self,
        app_id: &ApplicationId,
        order_id: OrderId,
        provider: &str,
        reason: &str,
        kind: RejectionKind,
    ) {
        let rejection = Rejection {
            order_id,
            provider: provider.to_string(),
            reason: reason.to_string(),
            kind,
            timestamp: self.clock.now(),
        };
        self.route(app_id, DomainEvent::Rejection(rejection));
    }

    fn on_locate_response(&self, response: LocateResponse) {
        let Some(provider) = self.provider_or_warn(&response.provider, &response.app_id) else {
            return;
        };
        if let Err(e) = provider.send_locate_response(&response) {
            warn!(
                "{}: locate response {} failed: {}",
                self.name, response.locate_id, e
            );
        }
    }

    fn on_inquiry(&self, inquiry: Inquiry) {
        match inquiry.inquiry {
            InquiryType::AppId => {
                let Some(reply_to) = inquiry.reply_to.filter(|rk| !rk.is_empty()) else {
                    warn!("{}: AppId inquiry without a reply routing key", self.name);
                    return;
                };
                let app_id = self.ids.next_id();
                info!("{}: issued application id {}", self.name, app_id);
                let event = DomainEvent::InquiryResponse(InquiryResponse::app_id(app_id));
                self.publish(&reply_to, &event);
            }
            InquiryType::DisconnectClient => match inquiry.app_id {
                Some(app_id) => self.release_application(&app_id),
                None => warn!("{}: disconnect inquiry without an application id", self.name),
            },
            InquiryType::Providers => match inquiry.app_id {
                Some(app_id) => {
                    let providers = self.provider_names();
                    let response = InquiryResponse::providers(app_id.clone(), providers);
                    self.route(&app_id, DomainEvent::InquiryResponse(response));
                }
                None => warn!("{}: providers inquiry without an application id", self.name),
            },
        }
    }

    fn on_app_info(&self, info: AppInfo) {
        match self.directory.register_app_info(&info) {
            Ok(true) => info!(
                "{}: registered {} with {} destinations",
                self.name,
                info.app_id,
                info.destinations.len()
            ),
            Ok(false) => debug!("{}: refreshed destinations for {}", self.name, info.app_id),
            Err(e) => {
                warn!("{}: ignoring app info: {}", self.name, e);
                return;
            }
        }
        self.heartbeat.update(&info.app_id, self.clock.now());
    }

    fn on_heartbeat(&self, heartbeat: Heartbeat) {
        if !self.directory.contains(&heartbeat.app_id) {
            debug!(
                "{}: heartbeat from unregistered application {}",
                self.name, heartbeat.app_id
            );
            return;
        }
        // Liveness is judged on the server clock; the client's stamp is ignored
        self.heartbeat.update(&heartbeat.app_id, self.clock.now());
    }

    /// Owner recorded for an order, falling back to the id it carries
    fn owner_for(&self, order: &Order) -> ApplicationId {
        self.order_owner(&order.id)
            .unwrap_or_else(|| order.app_id.clone())
    }

    fn logon_audience(&self, provider: &str) -> Vec<ApplicationId> {
        self.logon_requests
            .get(provider)
            .map(|apps| apps.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl ProviderEvents for EngineController {
    fn on_logon_arrived(&self, provider: &str) {
        info!("{}: provider '{}' logged on", self.name, provider);
        for app_id in self.logon_audience(provider) {
            let login = Login::new(app_id.clone(), provider);
            self.route(&app_id, DomainEvent::Logon(login));
        }
    }

    fn on_logout_arrived(&self, provider: &str) {
        info!("{}: provider '{}' logged out", self.name, provider);
        for app_id in self.logon_audience(provider) {
            let logout = Logout::new(app_id.clone(), provider);
            self.route(&app_id, DomainEvent::Logout(logout));
        }
    }

    fn on_tick_arrived(&self, tick: Tick) {
        let key = SubscriptionKey::new(&tick.provider, &tick.symbol, SubscriptionKind::Tick);
        let apps = self.subscribers(&key);
        if apps.is_empty() {
            debug!("{}: no subscribers for {} ticks", self.name, tick.symbol);
            return;
        }
        self.fan_out(&apps, &DomainEvent::Tick(tick));
    }

    fn on_bar_arrived(&self, bar: Bar) {
        let kind = SubscriptionKind::LiveBar {
            bar_seconds: bar.bar_seconds,
        };
        let apps = self.subscribers(&SubscriptionKey::new(&bar.provider, &bar.symbol, kind));
        if apps.is_empty() {
            debug!("{}: no subscribers for {} bars", self.name, bar.symbol);
            return;
        }
        self.fan_out(&apps, &DomainEvent::Bar(bar));
    }

    fn on_historic_data_arrived(&self, data: HistoricBarData) {
        let Some((_, app_id)) = self.historic_requests.remove(&data.request_id) else {
            debug!(
                "{}: historic data for unknown request {}",
                self.name, data.request_id
            );
            return;
        };
        self.route(&app_id, DomainEvent::HistoricBarData(data));
    }

    fn on_order_new(&self, order: Order) {
        let owner = self.owner_for(&order);
        self.route(&owner, DomainEvent::OrderAccepted(order));
    }

    fn on_order_cancelled(&self, order: Order) {
        let owner = self.owner_for(&order);
        self.order_owners.remove(&order.id);
        self.cancel_requests.remove(&order.id);
        self.route(&owner, DomainEvent::OrderCancelled(order));
    }

    fn on_order_executed(&self, execution: Execution) {
        let owner = if execution.is_complete() {
            self.order_owners.remove(&execution.order_id).map(|(_, owner)| owner)
        } else {
            self.order_owner(&execution.order_id)
        };
        match owner {
            Some(owner) => {
                self.route(&owner, DomainEvent::Execution(execution));
            }
            None => debug!(
                "{}: execution for unowned order {}",
                self.name, execution.order_id
            ),
        }
    }

    fn on_order_rejected(&self, rejection: Rejection) {
        let requester = self
            .cancel_requests
            .remove(&rejection.order_id)
            .map(|(_, app_id)| app_id);
        let owner = if rejection.is_terminal() {
            self.order_owners
                .remove(&rejection.order_id)
                .map(|(_, owner)| owner)
        } else {
            // A refused cancel leaves the order working
            self.order_owner(&rejection.order_id)
        };
        match owner.or(requester) {
            Some(app_id) => {
                self.route(&app_id, DomainEvent::Rejection(rejection));
            }
            None => debug!(
                "{}: rejection for unowned order {}",
                self.name, rejection.order_id
            ),
        }
    }

    fn on_locate_arrived(&self, locate: LocateOrder) {
        let app_id = locate.app_id.clone();
        self.route(&app_id, DomainEvent::Locate(locate));
    }

    fn on_position_arrived(&self, position: Position) {
        let app_id = position.app_id.clone();
        self.route(&app_id, DomainEvent::Position(position));
    }
}

impl HeartbeatListener for EngineController {
    fn on_heartbeat_response(
        &self,
        destination: &str,
        response: hermes_core::HeartbeatResponse,
    ) -> hermes_session::Result<()> {
        self.topology
            .publish_event(destination, &DomainEvent::Heartbeat(response))
            .map_err(|e| SessionError::Publish(e.to_string()))
    }

    fn on_application_disconnect(&self, app_id: &ApplicationId) {
        self.release_application(app_id);
    }
}

/// Weak reference handed to providers and the heartbeat monitor
///
/// Both are owned by the controller and must not hold it strongly.
struct ControllerHandle(Weak<EngineController>);

impl ControllerHandle {
    fn with<F: FnOnce(&EngineController)>(&self, f: F) {
        if let Some(controller) = self.0.upgrade() {
            f(&controller);
        }
    }
}

impl ProviderEvents for ControllerHandle {
    fn on_logon_arrived(&self, provider: &str) {
        self.with(|c| c.on_logon_arrived(provider));
    }

    fn on_logout_arrived(&self, provider: &str) {
        self.with(|c| c.on_logout_arrived(provider));
    }

    fn on_tick_arrived(&self, tick: Tick) {
        self.with(|c| c.on_tick_arrived(tick));
    }

    fn on_bar_arrived(&self, bar: Bar) {
        self.with(|c| c.on_bar_arrived(bar));
    }

    fn on_historic_data_arrived(&self, data: HistoricBarData) {
        self.with(|c| c.on_historic_data_arrived(data));
    }

    fn on_order_new(&self, order: Order) {
        self.with(|c| c.on_order_new(order));
    }

    fn on_order_cancelled(&self, order: Order) {
        self.with(|c| c.on_order_cancelled(order));
    }

    fn on_order_executed(&self, execution: Execution) {
        self.with(|c| c.on_order_executed(execution));
    }

    fn on_order_rejected(&self, rejection: Rejection) {
        self.with(|c| c.on_order_rejected(rejection));
    }

    fn on_locate_arrived(&self, locate: LocateOrder) {
        self.with(|c| c.on_locate_arrived(locate));
    }

    fn on_position_arrived(&self, position: Position) {
        self.with(|c| c.on_position_arrived(position));
    }
}

impl HeartbeatListener for ControllerHandle {
    fn on_heartbeat_response(
        &self,
        destination: &str,
        response: hermes_core::HeartbeatResponse,
    ) -> hermes_session::Result<()> {
        match self.0.upgrade() {
            Some(controller) => controller.on_heartbeat_response(destination, response),
            None => Err(SessionError::Publish("engine controller dropped".to_string())),
        }
    }

    fn on_application_disconnect(&self, app_id: &ApplicationId) {
        self.with(|c| c.on_application_disconnect(app_id));
    }
}
