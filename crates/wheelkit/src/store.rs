//! Reactive application state.
//!
//! `Store` is a plain value handed to whoever needs it; there is no global
//! instance. Listeners run synchronously, in subscription order, after every
//! `set_state`.

use crate::expand::expand;
use crate::item::{ItemId, WheelItem};
use crate::roll::RollOutcome;
use crate::settings::SpinSettings;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::SystemTime;
use strum::{Display as StrumDisplay, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Wheel,
    History,
    Settings,
}

/// Everything the wheel shows for one roll. Replaced as a whole, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct WheelSnapshot {
    /// Normalized items as received, before splitting and padding.
    pub source: Arc<[WheelItem]>,
    /// Items as laid out on the wheel.
    pub items: Arc<[WheelItem]>,
    pub winner_id: Option<ItemId>,
    pub winner_item: Option<WheelItem>,
    pub updated_at: SystemTime,
}

impl WheelSnapshot {
    /// Normalize weights, flag the winner and lay the items out for a wheel of
    /// `outer_radius` (left unexpanded when the radius is unknown).
    pub fn new(
        items: Vec<WheelItem>,
        winner_id: Option<ItemId>,
        winner_item: Option<WheelItem>,
        outer_radius: Option<f64>,
    ) -> Self {
        let source: Arc<[WheelItem]> = items
            .into_iter()
            .map(|mut item| {
                item.weight = item.effective_weight();
                item.winner = winner_id.as_ref().is_some_and(|w| item.origin_id() == w);
                item
            })
            .collect();
        let laid_out = expand(&source, winner_id.as_ref(), outer_radius);
        Self {
            items: laid_out.into(),
            source,
            winner_id,
            winner_item,
            updated_at: SystemTime::now(),
        }
    }

    /// A fresh snapshot of the same roll laid out for a different radius.
    pub fn reexpanded(&self, outer_radius: Option<f64>) -> Self {
        Self {
            items: expand(&self.source, self.winner_id.as_ref(), outer_radius).into(),
            source: self.source.clone(),
            winner_id: self.winner_id.clone(),
            winner_item: self.winner_item.clone(),
            updated_at: SystemTime::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub view: View,
    pub wheel: Option<WheelSnapshot>,
    pub spin: SpinSettings,
    /// Winner of the last finished spin.
    pub result: Option<WheelItem>,
    /// Entry the user clicked on the idle wheel.
    pub focused: Option<WheelItem>,
    pub rolling: bool,
}

impl AppState {
    pub fn items(&self) -> &[WheelItem] {
        self.wheel.as_ref().map(|w| &*w.items).unwrap_or(&[])
    }
}

type Listener<S> = Rc<dyn Fn(&S)>;

struct Listeners<S> {
    next_id: Cell<u64>,
    entries: RefCell<Vec<(u64, Listener<S>)>>,
}

pub struct Store<S> {
    state: RefCell<Rc<S>>,
    listeners: Rc<Listeners<S>>,
}

/// Handle returned by [`Store::subscribe`]. Dropping it keeps the listener
/// registered; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription<S> {
    id: u64,
    listeners: Weak<Listeners<S>>,
}

impl<S> Subscription<S> {
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.entries.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

impl<S: Clone + 'static> Store<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: RefCell::new(Rc::new(initial)),
            listeners: Rc::new(Listeners {
                next_id: Cell::new(0),
                entries: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn get_state(&self) -> Rc<S> {
        self.state.borrow().clone()
    }

    /// Apply `update` to a copy of the state, publish it, then notify every
    /// listener. Listeners may call back into the store; keeping that from
    /// recursing forever is up to them.
    pub fn set_state(&self, update: impl FnOnce(&mut S)) {
        let next = {
            let current = self.state.borrow();
            let mut next = S::clone(&current);
            update(&mut next);
            Rc::new(next)
        };
        *self.state.borrow_mut() = next.clone();

        let listeners: Vec<Listener<S>> = self
            .listeners
            .entries
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(&next);
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&S) + 'static) -> Subscription<S> {
        let id = self.listeners.next_id.get();
        self.listeners.next_id.set(id + 1);
        self.listeners
            .entries
            .borrow_mut()
            .push((id, Rc::new(listener)));
        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }
}

impl Store<AppState> {
    /// Replace the wheel with the result of a roll or a history replay.
    pub fn apply_snapshot(&self, outcome: RollOutcome, outer_radius: Option<f64>) {
        let snapshot = WheelSnapshot::new(
            outcome.wheel_items,
            Some(outcome.winner_id),
            outcome.winner_item,
            outer_radius,
        );
        log::info!(
            "Applied wheel snapshot with {} entries ({} source items)",
            snapshot.items.len(),
            snapshot.source.len()
        );
        self.set_state(|s| {
            s.wheel = Some(snapshot);
            s.focused = None;
            s.rolling = false;
        });
    }

    /// Lay the current wheel out again after the wheel radius changed.
    pub fn reexpand(&self, outer_radius: Option<f64>) {
        let Some(current) = self.get_state().wheel.clone() else {
            return;
        };
        let snapshot = current.reexpanded(outer_radius);
        self.set_state(|s| s.wheel = Some(snapshot));
    }

    pub fn set_spin_settings(&self, spin: SpinSettings) {
        self.set_state(|s| s.spin = spin.sanitized());
    }
}
