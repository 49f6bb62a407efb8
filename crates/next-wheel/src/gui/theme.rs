use cairo::Context;
use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::Srgba;

pub struct ThemeColors {
    pub segment_even: Srgba<f64>,
    pub segment_odd: Srgba<f64>,
    pub hovered: Srgba<f64>,
    pub winner: Srgba<f64>,
    pub border: Srgba<f64>,
    pub ring: Srgba<f64>,
    pub hub: Srgba<f64>,
    pub pointer: Srgba<f64>,
    pub placeholder: Srgba<f64>,
    pub text: Srgba<f64>,
}

impl ThemeColors {
    pub fn from_context(context: &gtk::StyleContext) -> Self {
        Self {
            segment_even: Self::lookup_color(
                context,
                "theme_bg_color",
                Srgba::new(0.16, 0.17, 0.22, 0.95),
                Some(0.95),
            ),
            segment_odd: Self::lookup_color(
                context,
                "theme_base_color",
                Srgba::new(0.22, 0.23, 0.30, 0.95),
                Some(0.95),
            ),
            hovered: Self::lookup_color(
                context,
                "theme_selected_bg_color",
                Srgba::new(0.4, 0.4, 0.8, 0.9),
                Some(0.45),
            ),
            winner: Self::lookup_color(
                context,
                "success_color",
                Srgba::new(0.3, 0.75, 0.45, 0.5),
                Some(0.5),
            ),
            border: Self::lookup_color(
                context,
                "borders",
                Srgba::new(0.05, 0.05, 0.08, 0.8),
                None,
            ),
            ring: Self::lookup_color(
                context,
                "theme_fg_color",
                Srgba::new(0.9, 0.9, 0.95, 0.9),
                Some(0.9),
            ),
            hub: Self::lookup_color(
                context,
                "theme_bg_color",
                Srgba::new(0.1, 0.1, 0.12, 0.95),
                Some(1.0),
            ),
            pointer: Self::lookup_color(
                context,
                "accent_bg_color",
                Srgba::new(0.95, 0.3, 0.3, 1.0),
                Some(1.0),
            ),
            placeholder: Self::lookup_color(
                context,
                "theme_fg_color",
                Srgba::new(1.0, 1.0, 1.0, 0.08),
                Some(0.08),
            ),
            text: Self::lookup_color(
                context,
                "theme_fg_color",
                Srgba::new(0.95, 0.95, 0.95, 1.0),
                None,
            ),
        }
    }

    fn lookup_color(
        context: &gtk::StyleContext,
        name: &str,
        fallback: Srgba<f64>,
        alpha_override: Option<f64>,
    ) -> Srgba<f64> {
        context
            .lookup_color(name)
            .map(|c| {
                let (r, g, b, a) = (
                    c.red() as f64,
                    c.green() as f64,
                    c.blue() as f64,
                    c.alpha() as f64,
                );
                Srgba::new(r, g, b, alpha_override.unwrap_or(a))
            })
            .unwrap_or(fallback)
    }
}

pub fn set_color(cr: &Context, color: Srgba<f64>) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a);
}

pub fn load_css() {
    let provider = gtk::CssProvider::new();
    let css_data = "
.wheel-window.overlay, .wheel-area {
    background: none;
    background-color: transparent;
}
.wheel-status {
    font-weight: bold;
}
";
    provider.load_from_data(css_data);

    if let Some(display) = gdk::Display::default() {
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}
