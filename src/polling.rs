use crate::backend::{DesktopStore, PublicManager, WindowHandle};
use crate::desktop::DesktopId;

use std::cell::Cell;

/// Change detection for systems where only the documented manager exists.
///
/// The documented API can only tell which desktop a window lives on, so the
/// current desktop is inferred from windows that are on it.
#[derive(Debug, Default)]
pub struct PollingBackend {
    last_known: Cell<Option<DesktopId>>,
}

impl PollingBackend {
    pub fn last_known(&self) -> Option<DesktopId> {
        self.last_known.get()
    }

    /// Starts a new observation period from `id`.
    pub fn seed(&self, id: Option<DesktopId>) {
        self.last_known.set(id);
    }

    /// Samples the current desktop once.
    pub fn sample(
        public: &dyn PublicManager,
        store: Option<&dyn DesktopStore>,
    ) -> Option<DesktopId> {
        if let Some(id) = public.foreground_window().and_then(|w| window_on_current(public, w)) {
            return Some(id);
        }
        if let Some(id) = public
            .visible_windows()
            .into_iter()
            .find_map(|w| window_on_current(public, w))
        {
            return Some(id);
        }
        match store.map(|store| store.current()) {
            Some(Ok(Some(id))) if !id.is_nil() => Some(id),
            Some(Err(err)) => {
                debug!("{err}");
                None
            }
            _ => None,
        }
    }

    /// Runs one timer tick, returns whether the current desktop changed.
    pub fn check(&self, public: &dyn PublicManager, store: Option<&dyn DesktopStore>) -> bool {
        let Some(id) = Self::sample(public, store) else {
            return false;
        };
        if self.last_known.get() == Some(id) {
            return false;
        }
        debug!("polled desktop changed to {id}");
        self.last_known.set(Some(id));
        true
    }

    /// The last observed identity, sampled once when nothing was observed yet.
    ///
    /// Does not touch the last known identity, so a switch seen here is still
    /// reported by the next tick.
    pub fn current(
        &self,
        public: &dyn PublicManager,
        store: Option<&dyn DesktopStore>,
    ) -> Option<DesktopId> {
        self.last_known
            .get()
            .or_else(|| Self::sample(public, store))
    }
}

fn window_on_current(public: &dyn PublicManager, window: WindowHandle) -> Option<DesktopId> {
    match public.is_on_current_desktop(window) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(err) => {
            debug!("{err}");
            return None;
        }
    }
    match public.window_desktop(window) {
        Ok(Some(id)) if !id.is_nil() => Some(id),
        Ok(_) => None,
        Err(err) => {
            debug!("{err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Interop;
    use crate::fake::{desktop, FakeInterop, World, FOREGROUND};

    #[test]
    fn test_foreground() {
        let world = World::with_desktops(3);
        let mut interop = FakeInterop(world.clone());
        let public = interop.public_manager().unwrap();
        assert_eq!(PollingBackend::sample(&*public, None), Some(desktop(1)));
        world.borrow_mut().switch_to(2);
        assert_eq!(PollingBackend::sample(&*public, None), Some(desktop(3)));
    }

    #[test]
    fn test_pinned_foreground() {
        let world = World::with_desktops(3);
        {
            let mut w = world.borrow_mut();
            w.windows = vec![
                (FOREGROUND, None),
                (WindowHandle(2), Some(desktop(1))),
                (WindowHandle(3), Some(desktop(2))),
            ];
            w.current = 1;
        }
        let mut interop = FakeInterop(world.clone());
        let public = interop.public_manager().unwrap();
        assert_eq!(PollingBackend::sample(&*public, None), Some(desktop(2)));

        world.borrow_mut().foreground = None;
        assert_eq!(PollingBackend::sample(&*public, None), Some(desktop(2)));
    }

    #[test]
    fn test_registry_current() {
        let world = World::with_desktops(2);
        {
            let mut w = world.borrow_mut();
            w.windows = vec![(FOREGROUND, None)];
            w.registry_current = Some(desktop(2));
        }
        let mut interop = FakeInterop(world);
        let public = interop.public_manager().unwrap();
        let store = interop.desktop_store();
        assert_eq!(PollingBackend::sample(&*public, None), None);
        assert_eq!(PollingBackend::sample(&*public, Some(&*store)), Some(desktop(2)));
    }

    #[test]
    fn test_check() {
        let world = World::with_desktops(2);
        let mut interop = FakeInterop(world.clone());
        let public = interop.public_manager().unwrap();
        let polling = PollingBackend::default();
        assert_eq!(polling.current(&*public, None), Some(desktop(1)));
        assert_eq!(polling.last_known(), None);
        assert!(polling.check(&*public, None));
        assert!(!polling.check(&*public, None));
        world.borrow_mut().switch_to(1);
        assert_eq!(polling.current(&*public, None), Some(desktop(1)));
        assert!(polling.check(&*public, None));
        assert_eq!(polling.current(&*public, None), Some(desktop(2)));
        assert_eq!(polling.last_known(), Some(desktop(2)));

        world.borrow_mut().fail.query = true;
        assert!(!polling.check(&*public, None));
        assert_eq!(polling.current(&*public, None), Some(desktop(2)));
    }
}
