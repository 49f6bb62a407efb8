use gtk::prelude::*;
use gtk4 as gtk;
use gtk4_layer_shell::{KeyboardMode, Layer, LayerShell};

pub const DEFAULT_SIZE: (i32, i32) = (720, 780);

/// Either a centred layer-shell overlay or a plain decorated window.
pub fn init_window(window: &gtk::ApplicationWindow, overlay: bool) {
    if overlay && gtk4_layer_shell::is_supported() {
        window.init_layer_shell();
        window.set_layer(Layer::Overlay);
        window.set_namespace(Some("next-wheel"));
        window.set_exclusive_zone(-1);
        window.set_keyboard_mode(KeyboardMode::OnDemand);
        window.set_decorated(false);
        window.add_css_class("overlay");
    } else if overlay {
        log::warn!("Layer shell is not supported here, opening a regular window");
    }
    window.set_default_size(DEFAULT_SIZE.0, DEFAULT_SIZE.1);
}
