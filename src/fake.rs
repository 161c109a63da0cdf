//! In-memory implementations of the backend seams.

use crate::backend::{
    DesktopManager, DesktopStore, Interop, NotificationService, PublicManager, Pump, PumpEvent,
    PumpHandler, SwitchNotifier, WindowHandle,
};
use crate::desktop::DesktopId;
use crate::tables::InterfaceTable;
use crate::version::PlatformVariant;

use anyhow::{anyhow, bail, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const FOREGROUND: WindowHandle = WindowHandle(1);

#[derive(Debug, Default, Clone)]
pub struct Failures {
    pub activation: bool,
    pub public: bool,
    pub locator: bool,
    pub internal: bool,
    pub service: bool,
    pub register: bool,
    pub query: bool,
    pub pump: bool,
}

#[derive(Default)]
pub struct World {
    pub build: Option<u32>,
    pub desktops: Vec<DesktopId>,
    pub current: usize,
    pub os_names: HashMap<DesktopId, String>,
    pub has_name_accessor: bool,
    pub registry_names: HashMap<DesktopId, String>,
    pub registry_ids: Option<Vec<DesktopId>>,
    pub registry_current: Option<DesktopId>,
    pub foreground: Option<WindowHandle>,
    pub windows: Vec<(WindowHandle, Option<DesktopId>)>,
    pub fail: Failures,
    pub owns_activation: bool,
    pub timer: Option<Duration>,
    pub sinks: HashMap<u32, SwitchNotifier>,
    pub next_cookie: u32,
    pub handler: Option<PumpHandler>,
    pub queued: Arc<AtomicUsize>,
    pub events: Vec<String>,
}

pub fn desktop(n: u128) -> DesktopId {
    DesktopId::from_u128(0x1000 + n)
}

impl World {
    pub fn with_desktops(count: usize) -> Rc<RefCell<World>> {
        let desktops: Vec<DesktopId> = (1..=count as u128).map(desktop).collect();
        let world = World {
            build: Some(22631),
            windows: vec![(FOREGROUND, desktops.first().copied())],
            registry_ids: Some(desktops.clone()),
            desktops,
            has_name_accessor: true,
            owns_activation: true,
            foreground: Some(FOREGROUND),
            ..Default::default()
        };
        Rc::new(RefCell::new(world))
    }

    pub fn current_id(&self) -> DesktopId {
        self.desktops.get(self.current).copied().unwrap_or_default()
    }

    /// Moves the user to desktop `index` (0-based); the foreground window follows.
    pub fn switch_to(&mut self, index: usize) {
        self.current = index;
        let id = self.current_id();
        for (window, desktop) in self.windows.iter_mut() {
            if Some(*window) == self.foreground && desktop.is_some() {
                *desktop = Some(id);
            }
        }
    }

    pub fn remove_desktop(&mut self, index: usize) {
        let id = self.desktops.remove(index);
        if let Some(ids) = self.registry_ids.as_mut() {
            ids.retain(|v| *v != id);
        }
        if self.current >= self.desktops.len() {
            self.current = self.desktops.len().saturating_sub(1);
        }
    }

    fn window_desktop(&self, window: WindowHandle) -> Option<DesktopId> {
        self.windows
            .iter()
            .find(|(w, _)| *w == window)
            .and_then(|(_, d)| *d)
    }
}

/// Runs one timer tick on the pump.
pub fn tick(world: &Rc<RefCell<World>>) {
    let handler = world.borrow().handler.clone();
    if let Some(handler) = handler {
        handler(PumpEvent::Tick);
    }
}

/// Processes queued switch work items one per pump turn.
pub fn deliver(world: &Rc<RefCell<World>>) -> usize {
    let mut processed = 0;
    loop {
        let (queued, handler) = {
            let w = world.borrow();
            (w.queued.clone(), w.handler.clone())
        };
        if queued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_sub(1))
            .is_err()
        {
            return processed;
        }
        if let Some(handler) = handler {
            handler(PumpEvent::Switched);
        }
        processed += 1;
    }
}

/// Switches desktops and fires every registered sink, as the shell would.
pub fn os_switch(world: &Rc<RefCell<World>>, index: usize) {
    let sinks: Vec<SwitchNotifier> = {
        let mut w = world.borrow_mut();
        w.switch_to(index);
        w.sinks.values().cloned().collect()
    };
    for sink in sinks {
        sink();
    }
}

fn record(world: &Rc<RefCell<World>>, event: &str) {
    if let Ok(mut w) = world.try_borrow_mut() {
        w.events.push(event.to_string());
    }
}

pub struct FakeInterop(pub Rc<RefCell<World>>);

impl Interop for FakeInterop {
    fn build_number(&self) -> Option<u32> {
        self.0.borrow().build
    }

    fn initialize(&mut self) -> Result<bool> {
        let w = self.0.borrow();
        if w.fail.activation {
            bail!("Failed to initialize activation context");
        }
        Ok(w.owns_activation)
    }

    fn uninitialize(&mut self) {
        record(&self.0, "uninitialize");
    }

    fn public_manager(&mut self) -> Result<Box<dyn PublicManager>> {
        if self.0.borrow().fail.public {
            bail!("Failed to create public manager");
        }
        Ok(Box::new(FakePublic(self.0.clone())))
    }

    fn service_locator(&mut self) -> Result<()> {
        if self.0.borrow().fail.locator {
            bail!("Failed to create service locator");
        }
        Ok(())
    }

    fn internal_manager(
        &mut self,
        _variant: PlatformVariant,
        _table: &InterfaceTable,
    ) -> Result<Box<dyn DesktopManager>> {
        if self.0.borrow().fail.internal {
            bail!("Failed to query internal manager");
        }
        Ok(Box::new(FakeManager(self.0.clone())))
    }

    fn notification_service(
        &mut self,
        _variant: PlatformVariant,
    ) -> Result<Box<dyn NotificationService>> {
        if self.0.borrow().fail.service {
            bail!("Failed to query notification service");
        }
        Ok(Box::new(FakeService(self.0.clone())))
    }

    fn desktop_store(&mut self) -> Box<dyn DesktopStore> {
        Box::new(FakeStore(self.0.clone()))
    }

    fn pump(&mut self, handler: PumpHandler) -> Result<Box<dyn Pump>> {
        let mut w = self.0.borrow_mut();
        if w.fail.pump {
            bail!("Failed to create pump");
        }
        w.handler = Some(handler);
        Ok(Box::new(FakePump(self.0.clone())))
    }

    fn release(&mut self) {
        record(&self.0, "release");
    }
}

pub struct FakeManager(Rc<RefCell<World>>);

impl FakeManager {
    fn check(&self) -> Result<()> {
        if self.0.borrow().fail.query {
            bail!("Failed to query internal manager");
        }
        Ok(())
    }
}

impl DesktopManager for FakeManager {
    fn current(&self) -> Result<DesktopId> {
        self.check()?;
        Ok(self.0.borrow().current_id())
    }

    fn count(&self) -> Result<u32> {
        self.check()?;
        Ok(self.0.borrow().desktops.len() as u32)
    }

    fn desktops(&self) -> Result<Vec<DesktopId>> {
        self.check()?;
        Ok(self.0.borrow().desktops.clone())
    }

    fn name(&self, id: DesktopId) -> Result<Option<String>> {
        self.check()?;
        let w = self.0.borrow();
        if !w.has_name_accessor {
            return Ok(None);
        }
        Ok(w.os_names.get(&id).cloned())
    }
}

impl Drop for FakeManager {
    fn drop(&mut self) {
        record(&self.0, "drop internal");
    }
}

pub struct FakePublic(Rc<RefCell<World>>);

impl PublicManager for FakePublic {
    fn foreground_window(&self) -> Option<WindowHandle> {
        self.0.borrow().foreground
    }

    fn visible_windows(&self) -> Vec<WindowHandle> {
        self.0.borrow().windows.iter().map(|(w, _)| *w).collect()
    }

    fn window_desktop(&self, window: WindowHandle) -> Result<Option<DesktopId>> {
        let w = self.0.borrow();
        if w.fail.query {
            bail!("Failed to get window desktop");
        }
        Ok(w.window_desktop(window))
    }

    fn is_on_current_desktop(&self, window: WindowHandle) -> Result<bool> {
        let w = self.0.borrow();
        if w.fail.query {
            bail!("Failed to check current desktop");
        }
        Ok(w.window_desktop(window) == Some(w.current_id()))
    }
}

impl Drop for FakePublic {
    fn drop(&mut self) {
        record(&self.0, "drop public");
    }
}

pub struct FakeStore(Rc<RefCell<World>>);

impl DesktopStore for FakeStore {
    fn name(&self, id: DesktopId) -> Result<Option<String>> {
        Ok(self.0.borrow().registry_names.get(&id).cloned())
    }

    fn desktops(&self) -> Result<Vec<DesktopId>> {
        self.0
            .borrow()
            .registry_ids
            .clone()
            .ok_or_else(|| anyhow!("Failed to open reg key"))
    }

    fn current(&self) -> Result<Option<DesktopId>> {
        Ok(self.0.borrow().registry_current)
    }
}

pub struct FakeService(Rc<RefCell<World>>);

impl NotificationService for FakeService {
    fn register(&mut self, notifier: SwitchNotifier) -> Result<u32> {
        let mut w = self.0.borrow_mut();
        if w.fail.register {
            bail!("Failed to register notification");
        }
        w.next_cookie += 1;
        let cookie = w.next_cookie;
        w.sinks.insert(cookie, notifier);
        Ok(cookie)
    }

    fn unregister(&mut self, cookie: u32) -> Result<()> {
        let mut w = self.0.borrow_mut();
        w.sinks
            .remove(&cookie)
            .map(|_| ())
            .ok_or_else(|| anyhow!("Unknown cookie {cookie}"))?;
        w.events.push(format!("unregister {cookie}"));
        Ok(())
    }
}

impl Drop for FakeService {
    fn drop(&mut self) {
        record(&self.0, "drop service");
    }
}

pub struct FakePump(Rc<RefCell<World>>);

impl Pump for FakePump {
    fn start_timer(&mut self, interval: Duration) -> Result<()> {
        self.0.borrow_mut().timer = Some(interval);
        Ok(())
    }

    fn stop_timer(&mut self) {
        self.0.borrow_mut().timer = None;
    }

    fn notifier(&self) -> SwitchNotifier {
        let queued = self.0.borrow().queued.clone();
        Arc::new(move || {
            queued.fetch_add(1, Ordering::SeqCst);
        })
    }
}

impl Drop for FakePump {
    fn drop(&mut self) {
        if let Ok(mut w) = self.0.try_borrow_mut() {
            w.handler = None;
            w.events.push("drop pump".to_string());
        }
    }
}
