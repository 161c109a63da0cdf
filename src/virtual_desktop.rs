use crate::acquire::{acquire, Availability, Capability, Handles, SubsystemState};
use crate::backend::{Interop, Pump, PumpEvent, PumpHandler};
use crate::config::Config;
use crate::desktop::{DesktopId, DesktopInfo};
use crate::dispatcher::Dispatcher;
use crate::polling::PollingBackend;
use crate::resolver::Resolver;
use crate::version::PlatformVariant;

use anyhow::{anyhow, Result};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Current virtual desktop queries and switch notifications.
///
/// Must be created, used and dropped on the thread that runs the message
/// loop; switch listeners are invoked from that loop.
pub struct VirtualDesktops {
    shared: Rc<Shared>,
}

struct Shared {
    config: Config,
    build: Option<u32>,
    variant: PlatformVariant,
    state: Cell<SubsystemState>,
    interop: RefCell<Box<dyn Interop>>,
    handles: RefCell<Handles>,
    polling: PollingBackend,
    last_seen: Cell<Option<DesktopId>>,
    dispatcher: Dispatcher,
    pump: RefCell<Option<Box<dyn Pump>>>,
    cookie: Cell<Option<u32>>,
    polling_timer: Cell<bool>,
}

impl VirtualDesktops {
    pub fn new(config: Config, interop: Box<dyn Interop>) -> Self {
        let build = interop.build_number();
        let variant = PlatformVariant::detect(build);
        if variant == PlatformVariant::Unknown {
            warn!(
                "Unknown windows build {:?}, assuming {}",
                build,
                PlatformVariant::NEWEST
            );
        }
        let shared = Shared {
            config,
            build,
            variant,
            state: Cell::new(SubsystemState::Uninitialized),
            interop: RefCell::new(interop),
            handles: RefCell::new(Handles::default()),
            polling: PollingBackend::default(),
            last_seen: Cell::new(None),
            dispatcher: Dispatcher::default(),
            pump: RefCell::new(None),
            cookie: Cell::new(None),
            polling_timer: Cell::new(false),
        };
        Self {
            shared: Rc::new(shared),
        }
    }

    #[cfg(windows)]
    pub fn with_system(config: Config) -> Self {
        Self::new(config, Box::new(crate::interop::ComInterop::new()))
    }

    /// Acquires the desktop interfaces of the running system. Never fails.
    pub fn init(&self) -> Availability {
        let shared = &self.shared;
        match shared.state.get() {
            SubsystemState::Uninitialized => {}
            SubsystemState::ShutDown => {
                warn!("Virtual desktops already shut down");
                return Availability::Unavailable;
            }
            state => return state.availability(),
        }
        info!(
            "Init virtual desktops, build {:?}, variant {}",
            shared.build, shared.variant
        );
        let handles = {
            let mut interop = shared.interop.borrow_mut();
            acquire(&mut **interop, shared.variant, &shared.config)
        };
        let state = match handles.capability() {
            Some(capability) => SubsystemState::Ready(capability),
            None => SubsystemState::Unavailable,
        };
        *shared.handles.borrow_mut() = handles;
        shared.state.set(state);
        if shared.dispatcher.has_listener() {
            shared.seed_listener();
            shared.start_watching();
        }
        state.availability()
    }

    pub fn current_desktop(&self) -> DesktopInfo {
        self.shared.resolve(|resolver| resolver.current())
    }

    pub fn desktop_count(&self) -> u32 {
        self.shared.resolve(|resolver| resolver.count())
    }

    /// Desktop at the 1-based `index` of a fresh enumeration.
    pub fn desktop_by_index(&self, index: u32) -> Result<DesktopInfo> {
        self.shared.resolve(|resolver| resolver.by_index(index))
    }

    /// Registers the switch listener, replacing any previous one.
    pub fn set_switch_listener<F>(&self, listener: F)
    where
        F: Fn(u32, &str) + 'static,
    {
        let shared = &self.shared;
        if shared.state.get() == SubsystemState::ShutDown {
            warn!("Ignore switch listener, virtual desktops shut down");
            return;
        }
        shared.dispatcher.set(Rc::new(listener));
        shared.seed_listener();
        shared.start_watching();
    }

    pub fn clear_switch_listener(&self) {
        self.shared.dispatcher.clear();
        self.shared.stop_watching();
    }

    /// Releases everything in reverse acquisition order. Idempotent.
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }

    pub fn state(&self) -> SubsystemState {
        self.shared.state.get()
    }

    pub fn variant(&self) -> PlatformVariant {
        self.shared.variant
    }

    pub fn build_number(&self) -> Option<u32> {
        self.shared.build
    }
}

impl Drop for VirtualDesktops {
    fn drop(&mut self) {
        self.shared.shutdown();
    }
}

impl Shared {
    fn resolve<T>(&self, f: impl FnOnce(&Resolver) -> T) -> T {
        let handles = self.handles.borrow();
        let resolver = Resolver::new(
            &handles,
            &self.polling,
            &self.last_seen,
            self.config.registry_names,
        );
        f(&resolver)
    }

    fn seed_listener(&self) {
        if !matches!(self.state.get(), SubsystemState::Ready(_)) {
            return;
        }
        let current = self.resolve(|resolver| resolver.try_current().ok().map(|info| info.id));
        self.dispatcher.set_delivered(current);
    }

    /// Starts the event sink, else the polling timer.
    fn start_watching(self: &Rc<Self>) {
        let SubsystemState::Ready(capability) = self.state.get() else {
            return;
        };
        if self.cookie.get().is_some() || self.polling_timer.get() {
            return;
        }
        if capability == Capability::Notification {
            match self.register_sink() {
                Ok(true) => return,
                Ok(false) => {}
                Err(err) => warn!("{err}, polling for switches"),
            }
        }
        if let Err(err) = self.start_polling() {
            error!("{err}");
        }
    }

    fn register_sink(self: &Rc<Self>) -> Result<bool> {
        if self.handles.borrow().notifications.is_none() {
            return Ok(false);
        }
        let notifier = self.with_pump(|pump| pump.notifier())?;
        let mut handles = self.handles.borrow_mut();
        let Some(service) = handles.notifications.as_mut() else {
            return Ok(false);
        };
        let cookie = service.register(notifier)?;
        debug!("Registered desktop notification, cookie {cookie}");
        self.cookie.set(Some(cookie));
        Ok(true)
    }

    fn start_polling(self: &Rc<Self>) -> Result<()> {
        let seed = {
            let handles = self.handles.borrow();
            let Some(public) = handles.public.as_deref() else {
                return Err(anyhow!("No desktop manager to poll"));
            };
            PollingBackend::sample(public, handles.store.as_deref())
        };
        self.polling.seed(seed);
        let interval = self.config.poll_interval;
        self.with_pump(|pump| pump.start_timer(interval))??;
        self.polling_timer.set(true);
        debug!("Polling for desktop switches every {interval:?}");
        Ok(())
    }

    fn with_pump<T>(self: &Rc<Self>, f: impl FnOnce(&mut dyn Pump) -> T) -> Result<T> {
        if self.pump.borrow().is_none() {
            let weak: Weak<Shared> = Rc::downgrade(self);
            let handler: PumpHandler = Rc::new(move |event| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_pump_event(event);
                }
            });
            let pump = self.interop.borrow_mut().pump(handler)?;
            *self.pump.borrow_mut() = Some(pump);
        }
        let mut pump = self.pump.borrow_mut();
        let pump = pump
            .as_deref_mut()
            .ok_or_else(|| anyhow!("Failed to create message pump"))?;
        Ok(f(pump))
    }

    fn stop_watching(&self) {
        if let Some(cookie) = self.cookie.take() {
            let mut handles = self.handles.borrow_mut();
            if let Some(service) = handles.notifications.as_mut() {
                match service.unregister(cookie) {
                    Ok(()) => debug!("Unregistered desktop notification, cookie {cookie}"),
                    Err(err) => error!("Failed to unregister desktop notification, {err}"),
                }
            }
        }
        if self.polling_timer.replace(false) {
            if let Some(pump) = self.pump.borrow_mut().as_deref_mut() {
                pump.stop_timer();
            }
            self.polling.seed(None);
        }
    }

    fn on_pump_event(&self, event: PumpEvent) {
        if !matches!(self.state.get(), SubsystemState::Ready(_)) || !self.dispatcher.has_listener()
        {
            return;
        }
        match event {
            PumpEvent::Tick => {
                let changed = {
                    let handles = self.handles.borrow();
                    match handles.public.as_deref() {
                        Some(public) => self.polling.check(public, handles.store.as_deref()),
                        None => false,
                    }
                };
                if !changed {
                    return;
                }
            }
            PumpEvent::Switched => {
                if self.cookie.get().is_none() {
                    debug!("Drop switch notification without sink");
                    return;
                }
            }
        }
        self.dispatcher
            .dispatch(|| self.resolve(|resolver| resolver.try_current()));
    }

    fn shutdown(&self) {
        if self.state.replace(SubsystemState::ShutDown) == SubsystemState::ShutDown {
            return;
        }
        self.dispatcher.clear();
        self.stop_watching();
        self.pump.borrow_mut().take();

        let mut handles = std::mem::take(&mut *self.handles.borrow_mut());
        let mut interop = self.interop.borrow_mut();
        drop(handles.store.take());
        drop(handles.notifications.take());
        drop(handles.internal.take());
        if handles.located {
            interop.release();
        }
        drop(handles.public.take());
        if handles.owns_activation {
            interop.uninitialize();
        }
        info!("Virtual desktops shut down");
    }
}
