use crate::config::{self, Config};
use crate::events::AppEvent;
use crate::gui::theme::{self, ThemeColors};
use crate::gui::wheel::{Posters, RedrawHandle, WheelCanvas};
use crate::gui::window;
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use std::rc::Rc;
use std::sync::Arc;
use tokio::runtime::Handle;
use wheelkit::control::Command;
use wheelkit::poster::ReadyCallback;
use wheelkit::roll::{LocalRollService, RollError};
use wheelkit::spin::SpinOutcome;
use wheelkit::{AppState, Point, PresetId, RollOutcome, RollService, Store, View, WheelItem};

pub struct AppInit {
    pub config: Config,
    pub store: Rc<Store<AppState>>,
    pub roller: Arc<LocalRollService>,
    pub runtime: Handle,
    pub tx: async_channel::Sender<AppEvent>,
    pub rx: async_channel::Receiver<AppEvent>,
}

pub struct AppModel {
    store: Rc<Store<AppState>>,
    canvas: WheelCanvas,
    redraw: RedrawHandle,
    roller: Arc<LocalRollService>,
    runtime: Handle,
    events: async_channel::Sender<AppEvent>,
    config: Config,
    visible: bool,
    status: String,
}

#[derive(Debug)]
pub enum AppMsg {
    Show,
    Hide,
    /// Escape: stop a running spin, otherwise hide.
    Dismiss,
    Roll(Option<PresetId>),
    Replay(u64),
    RollResolved(Result<RollOutcome, String>),
    SpinFinished(SpinOutcome),
    CancelSpin,
    SetSpin {
        duration: Option<f64>,
        speed: Option<f64>,
    },
    SetView(View),
    CursorMove(Point),
    CursorLeave,
    Click(Point),
    Resized(i32, i32),
    PosterReady,
    ConfigReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::Control(cmd) => match cmd {
                Command::Show => AppMsg::Show,
                Command::Hide => AppMsg::Hide,
                Command::Roll(preset) => AppMsg::Roll(preset),
                Command::Replay(id) => AppMsg::Replay(id),
                Command::Cancel => AppMsg::CancelSpin,
                Command::SetDuration(secs) => AppMsg::SetSpin {
                    duration: Some(secs),
                    speed: None,
                },
                Command::SetSpeed(mult) => AppMsg::SetSpin {
                    duration: None,
                    speed: Some(mult),
                },
                Command::View(view) => AppMsg::SetView(view),
            },
            AppEvent::RollResolved(result) => AppMsg::RollResolved(result),
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

impl AppModel {
    fn busy(&self) -> Option<&'static str> {
        if self.canvas.is_spinning() {
            Some("a spin is in progress")
        } else if self.store.get_state().rolling {
            Some("a roll is still resolving")
        } else {
            None
        }
    }

    fn resolve_preset(&self, preset: Option<PresetId>) -> Option<PresetId> {
        preset
            .or_else(|| self.config.default_preset.clone())
            .or_else(|| self.roller.presets().first().map(|p| p.id.clone()))
    }

    /// Mark the store as rolling and resolve `request` on the runtime.
    fn dispatch<F, Fut>(&mut self, label: String, request: F)
    where
        F: FnOnce(Arc<LocalRollService>) -> Fut,
        Fut: Future<Output = Result<RollOutcome, RollError>> + Send + 'static,
    {
        self.visible = true;
        self.status = label;
        self.store.set_state(|s| {
            s.rolling = true;
            s.view = View::Wheel;
        });

        let tx = self.events.clone();
        let request = request(self.roller.clone());
        self.runtime.spawn(async move {
            let result = request.await.map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::RollResolved(result)).await;
        });
    }

    fn start_spin(&mut self, sender: &ComponentSender<Self>) {
        let state = self.store.get_state();
        let Some(wheel) = &state.wheel else {
            return;
        };
        let Some(winner) = &wheel.winner_id else {
            return;
        };

        match self.canvas.spin(&wheel.items, winner, &state.spin) {
            Ok(done) => {
                self.status = "Spinning…".into();
                let sender = sender.clone();
                relm4::spawn_local(async move {
                    sender.input(AppMsg::SpinFinished(done.wait().await));
                });
            }
            Err(e) => log::warn!("Not spinning: {}", e),
        }
    }

    fn winner(&self) -> Option<WheelItem> {
        let state = self.store.get_state();
        let wheel = state.wheel.as_ref()?;
        wheel.winner_item.clone().or_else(|| {
            let id = wheel.winner_id.as_ref()?;
            wheel.source.iter().find(|i| &i.id == id).cloned()
        })
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = AppInit;
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("Wheel of Next"),
            #[watch]
            set_visible: model.visible,
            add_css_class: "wheel-window",

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    if key == gtk::gdk::Key::Escape {
                        sender.input(AppMsg::Dismiss);
                        return glib::Propagation::Stop;
                    }
                    if key == gtk::gdk::Key::space || key == gtk::gdk::Key::Return {
                        sender.input(AppMsg::Roll(None));
                        return glib::Propagation::Stop;
                    }
                    glib::Propagation::Proceed
                }
            },

            gtk::Box {
                set_orientation: gtk::Orientation::Vertical,

                #[name = "drawing_area"]
                gtk::DrawingArea {
                    set_hexpand: true,
                    set_vexpand: true,
                    add_css_class: "wheel-area",

                    connect_resize[sender] => move |_, width, height| {
                        sender.input(AppMsg::Resized(width, height));
                    },

                    add_controller = gtk::EventControllerMotion {
                        connect_motion[sender] => move |_, x, y| {
                            sender.input(AppMsg::CursorMove(Point::new(x, y)));
                        },
                        connect_leave[sender] => move |_| {
                            sender.input(AppMsg::CursorLeave);
                        }
                    },

                    add_controller = gtk::GestureClick {
                        connect_released[sender] => move |_, _, x, y| {
                            sender.input(AppMsg::Click(Point::new(x, y)));
                        }
                    }
                },

                gtk::Label {
                    add_css_class: "wheel-status",
                    set_margin_all: 10,
                    #[watch]
                    set_label: &model.status,
                }
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let AppInit {
            config,
            store,
            roller,
            runtime,
            tx,
            rx,
        } = init;

        theme::load_css();
        window::init_window(&root, config.overlay);

        let posters = Posters::new(config.poster_concurrency, runtime.clone());

        let placeholder = gtk::DrawingArea::default();
        let model = AppModel {
            store: store.clone(),
            canvas: WheelCanvas::new(placeholder.clone()),
            redraw: RedrawHandle::new(&placeholder),
            roller,
            runtime,
            events: tx,
            config,
            visible: true,
            status: "Press Space to roll".into(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.canvas = WheelCanvas::new(widgets.drawing_area.clone());
        model.redraw = RedrawHandle::new(&widgets.drawing_area);

        let redraw = model.redraw.clone();
        let _ = store.subscribe(move |_| redraw.request());

        // bounded(1): a notification already queued covers every later poster
        let (ready_tx, ready_rx) = async_channel::bounded::<()>(1);

        let canvas = model.canvas.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, width, height| {
                let style_context = drawing_area.style_context();
                let colors = ThemeColors::from_context(&style_context);
                let state = store.get_state();
                let on_ready = || -> ReadyCallback {
                    let tx = ready_tx.clone();
                    Box::new(move || {
                        let _ = tx.try_send(());
                    })
                };
                if let Err(e) = canvas.draw(
                    cr,
                    width,
                    height,
                    state.items(),
                    &posters,
                    &colors,
                    &on_ready,
                ) {
                    log::error!("Drawing error: {}", e);
                }
            });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while ready_rx.recv().await.is_ok() {
                sender_clone.input(AppMsg::PosterReady);
            }
        });

        if let Some(last) = model.roller.history().last() {
            model.status = format!("Last roll: #{}", last.id);
            model.store.apply_snapshot(last.outcome.clone(), None);
        }

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            AppMsg::Show => {
                self.visible = true;
            }
            AppMsg::Hide => {
                // frame callbacks stop while unmapped
                self.canvas.cancel();
                self.visible = false;
            }
            AppMsg::Dismiss => {
                if !self.canvas.cancel() {
                    self.visible = false;
                }
            }
            AppMsg::Roll(preset) => {
                if let Some(reason) = self.busy() {
                    log::warn!("Ignoring roll request, {}", reason);
                    return;
                }
                let Some(preset) = self.resolve_preset(preset) else {
                    self.status = "No presets in the catalog".into();
                    return;
                };
                self.dispatch(format!("Rolling {}…", preset), move |roller| async move {
                    roller.begin_roll(&preset).await
                });
            }
            AppMsg::Replay(entry) => {
                if let Some(reason) = self.busy() {
                    log::warn!("Ignoring replay request, {}", reason);
                    return;
                }
                self.dispatch(format!("Replaying #{}…", entry), move |roller| async move {
                    roller.replay(entry).await
                });
            }
            AppMsg::RollResolved(Ok(outcome)) => {
                self.store
                    .apply_snapshot(outcome, self.canvas.outer_radius());
                self.start_spin(&sender);
            }
            AppMsg::RollResolved(Err(e)) => {
                log::error!("Roll failed: {}", e);
                self.status = format!("Roll failed: {}", e);
                self.store.set_state(|s| s.rolling = false);
            }
            AppMsg::SpinFinished(outcome) => {
                if self.canvas.take_deferred_resize() {
                    self.store.reexpand(self.canvas.outer_radius());
                }
                match outcome {
                    SpinOutcome::Finished => {
                        let winner = self.winner();
                        if let Some(item) = &winner {
                            log::info!("Spin settled on '{}'", item.title);
                            self.status = format!("Up next: {}", item.title);
                        }
                        self.store.set_state(|s| s.result = winner);
                    }
                    SpinOutcome::Cancelled => {
                        log::info!("Spin cancelled");
                        self.status = "Spin cancelled".into();
                    }
                }
                self.redraw.request();
            }
            AppMsg::CancelSpin => {
                self.canvas.cancel();
            }
            AppMsg::SetSpin { duration, speed } => {
                let mut spin = self.store.get_state().spin;
                if let Some(secs) = duration {
                    spin.duration_seconds = secs;
                }
                if let Some(mult) = speed {
                    spin.speed_multiplier = mult;
                }
                self.store.set_spin_settings(spin);

                let spin = self.store.get_state().spin;
                match spin.save() {
                    Ok(()) => log::info!("Spin settings saved: {:?}", spin),
                    Err(e) => log::error!("Failed to save spin settings: {}", e),
                }
                self.status = format!(
                    "Spins last {:.1}s at ×{:.1} speed",
                    spin.duration_seconds, spin.speed_multiplier
                );
            }
            AppMsg::SetView(view) => {
                self.store.set_state(|s| s.view = view);
                self.status = match view {
                    View::Wheel => "Press Space to roll".into(),
                    View::History => format!("{} past rolls", self.roller.history().len()),
                    View::Settings => {
                        let spin = self.store.get_state().spin;
                        format!(
                            "Spins last {:.1}s at ×{:.1} speed",
                            spin.duration_seconds, spin.speed_multiplier
                        )
                    }
                };
            }
            AppMsg::CursorMove(point) => {
                let state = self.store.get_state();
                let key = self.canvas.hit(state.items(), point).map(|h| h.key);
                if self.canvas.set_hovered(key) {
                    self.redraw.request();
                }
            }
            AppMsg::CursorLeave => {
                if self.canvas.set_hovered(None) {
                    self.redraw.request();
                }
            }
            AppMsg::Click(point) => {
                if self.canvas.is_spinning() {
                    return;
                }
                if self.canvas.in_hub(point) {
                    sender.input(AppMsg::Roll(None));
                    return;
                }
                let state = self.store.get_state();
                let Some(hit) = self.canvas.hit(state.items(), point) else {
                    return;
                };
                let origin = state
                    .wheel
                    .as_ref()
                    .and_then(|w| w.source.iter().find(|i| &i.id == hit.item.origin_id()))
                    .unwrap_or(hit.item)
                    .clone();
                self.status = origin.title.clone();
                self.store.set_state(|s| s.focused = Some(origin));
            }
            AppMsg::Resized(width, height) => {
                if !self.canvas.note_size(width, height) {
                    return;
                }
                if self.canvas.is_spinning() {
                    self.canvas.defer_resize();
                } else {
                    let radius = wheelkit::WheelGeometry::from_size(width as f64, height as f64)
                        .map(|g| g.radius);
                    self.store.reexpand(radius);
                }
            }
            AppMsg::PosterReady => {
                self.redraw.request();
            }
            AppMsg::ConfigReload => match config::load_config() {
                Ok(new_config) => {
                    if new_config.poster_concurrency != self.config.poster_concurrency
                        || new_config.overlay != self.config.overlay
                    {
                        log::info!("Poster concurrency and overlay changes apply after a restart");
                    }
                    self.config = new_config;
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_commands_map_to_messages() {
        let msg = AppMsg::from(AppEvent::Control(Command::SetSpeed(2.0)));
        assert!(matches!(
            msg,
            AppMsg::SetSpin {
                duration: None,
                speed: Some(s)
            } if s == 2.0
        ));

        let msg = AppMsg::from(AppEvent::Control(Command::Roll(Some(PresetId::from("movies")))));
        assert!(matches!(msg, AppMsg::Roll(Some(p)) if p.as_str() == "movies"));

        assert!(matches!(
            AppMsg::from(AppEvent::Control(Command::Cancel)),
            AppMsg::CancelSpin
        ));
        assert!(matches!(
            AppMsg::from(AppEvent::ConfigReload),
            AppMsg::ConfigReload
        ));
    }
}
