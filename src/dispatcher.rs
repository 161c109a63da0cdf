use crate::desktop::{DesktopId, DesktopInfo};

use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Callback receiving the 1-based index and the name of the new desktop.
pub type Listener = Rc<dyn Fn(u32, &str)>;

/// Holds the single switch listener and serializes its invocations.
#[derive(Default)]
pub struct Dispatcher {
    listener: RefCell<Option<Listener>>,
    last_delivered: Cell<Option<DesktopId>>,
    dispatching: Cell<bool>,
    pending: Cell<bool>,
}

impl Dispatcher {
    /// Replaces the listener; nothing counts as delivered to it yet.
    pub fn set(&self, listener: Listener) {
        *self.listener.borrow_mut() = Some(listener);
        self.last_delivered.set(None);
    }

    /// Records `id` as the desktop the listener already knows about.
    pub fn set_delivered(&self, id: Option<DesktopId>) {
        self.last_delivered.set(id);
    }

    pub fn clear(&self) {
        self.listener.borrow_mut().take();
        self.last_delivered.set(None);
        self.pending.set(false);
    }

    pub fn has_listener(&self) -> bool {
        self.listener.borrow().is_some()
    }

    /// Handles one switch signal, returns how many times the listener ran.
    ///
    /// `resolve` is called afresh for every delivery. A signal raised while
    /// the listener runs is folded into one more pass after it returns.
    pub fn dispatch(&self, resolve: impl Fn() -> Result<DesktopInfo>) -> usize {
        if self.dispatching.get() {
            debug!("switch signal while dispatching, coalesced");
            self.pending.set(true);
            return 0;
        }
        self.dispatching.set(true);
        let mut delivered = 0;
        loop {
            self.pending.set(false);
            match resolve() {
                Ok(info) if self.last_delivered.get() == Some(info.id) => {
                    debug!("desktop {} unchanged", info.id);
                }
                Ok(info) => {
                    let listener = self.listener.borrow().clone();
                    if let Some(listener) = listener {
                        self.last_delivered.set(Some(info.id));
                        debug!("switched to desktop {} '{}'", info.index, info.name);
                        listener(info.index, &info.name);
                        delivered += 1;
                    }
                }
                Err(err) => error!("Failed to resolve switched desktop, {err}"),
            }
            if !self.pending.get() {
                break;
            }
        }
        self.dispatching.set(false);
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::desktop;
    use anyhow::bail;

    fn info(n: u128) -> DesktopInfo {
        DesktopInfo {
            id: desktop(n),
            index: n as u32,
            name: format!("Desktop {n}"),
        }
    }

    #[test]
    fn test_dispatch() {
        let seen = Rc::new(RefCell::new(vec![]));
        let dispatcher = Dispatcher::default();
        let seen2 = seen.clone();
        dispatcher.set(
            Rc::new(move |index: u32, name: &str| {
                seen2.borrow_mut().push((index, name.to_string()))
            }),
        );
        dispatcher.set_delivered(Some(desktop(1)));
        assert_eq!(dispatcher.dispatch(|| Ok(info(1))), 0);
        assert_eq!(dispatcher.dispatch(|| Ok(info(2))), 1);
        assert_eq!(dispatcher.dispatch(|| Ok(info(2))), 0);
        assert_eq!(dispatcher.dispatch(|| bail!("gone")), 0);
        assert_eq!(dispatcher.dispatch(|| Ok(info(1))), 1);
        assert_eq!(
            *seen.borrow(),
            vec![(2, "Desktop 2".to_string()), (1, "Desktop 1".to_string())]
        );

        dispatcher.clear();
        assert!(!dispatcher.has_listener());
        assert_eq!(dispatcher.dispatch(|| Ok(info(3))), 0);
    }

    #[test]
    fn test_reentrant_signals_coalesced() {
        let dispatcher = Rc::new(Dispatcher::default());
        let current = Rc::new(Cell::new(2u128));
        let calls = Rc::new(RefCell::new(vec![]));
        let depth = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&dispatcher);
        let (current2, calls2, depth2) = (current.clone(), calls.clone(), depth.clone());
        dispatcher.set(
            Rc::new(move |index: u32, _: &str| {
                depth2.set(depth2.get() + 1);
                assert_eq!(depth2.get(), 1);
                calls2.borrow_mut().push(index);
                if index == 2 {
                    // two more switches land while this listener runs
                    let dispatcher = weak.upgrade().unwrap();
                    for next in [3, 4] {
                        current2.set(next);
                        let current3 = current2.clone();
                        assert_eq!(dispatcher.dispatch(move || Ok(info(current3.get()))), 0);
                    }
                }
                depth2.set(depth2.get() - 1);
            }),
        );
        dispatcher.set_delivered(Some(desktop(1)));
        let current4 = current.clone();
        assert_eq!(dispatcher.dispatch(move || Ok(info(current4.get()))), 2);
        assert_eq!(*calls.borrow(), vec![2, 4]);
    }
}
