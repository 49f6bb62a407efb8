use cairo::{Context, Format, ImageSurface};
use gdk_pixbuf::Pixbuf;
use gdk_pixbuf::gio;
use gdk_pixbuf::gio::prelude::*;
use gdk4::prelude::*;
use palette::{FromColor, Hsv, Srgb, encoding};
use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::runtime::Handle;
use wheelkit::item::{MediaType, PosterUrl, WheelItem};
use wheelkit::poster::{PosterCache, PosterError, PosterLoader, PosterState, ReadyCallback};

/// Posters are decoded at this width; the renderer scales them further.
pub const POSTER_LOAD_WIDTH: i32 = 342;
const FALLBACK_SIZE: (i32, i32) = (200, 300);

/// Decodes posters from local paths or any URI gio can read.
pub struct PixbufLoader {
    width: i32,
}

impl PixbufLoader {
    pub fn new(width: i32) -> Self {
        Self { width }
    }

    fn decode(url: &PosterUrl, width: i32) -> Result<Pixbuf, PosterError> {
        let file = if url.contains("://") {
            gio::File::for_uri(url.as_str())
        } else {
            gio::File::for_path(url.as_str())
        };
        let stream = file
            .read(gio::Cancellable::NONE)
            .map_err(|e| PosterError::load(url, e))?;
        Pixbuf::from_stream_at_scale(&stream, width, -1, true, gio::Cancellable::NONE)
            .map_err(|e| PosterError::load(url, e))
    }
}

impl PosterLoader for PixbufLoader {
    type Image = Pixbuf;

    async fn load(&self, url: &PosterUrl) -> Result<Pixbuf, PosterError> {
        let owned = url.clone();
        let width = self.width;
        tokio::task::spawn_blocking(move || Self::decode(&owned, width))
            .await
            .map_err(|e| PosterError::load(url, e))?
    }
}

#[derive(Clone)]
pub enum Artwork {
    Poster(Pixbuf),
    Fallback(ImageSurface),
}

impl Artwork {
    pub fn size(&self) -> (f64, f64) {
        match self {
            Self::Poster(p) => (p.width() as f64, p.height() as f64),
            Self::Fallback(s) => (s.width() as f64, s.height() as f64),
        }
    }

    pub fn set_source(&self, cr: &Context) -> Result<(), cairo::Error> {
        match self {
            Self::Poster(p) => {
                cr.set_source_pixbuf(p, 0.0, 0.0);
                Ok(())
            }
            Self::Fallback(s) => cr.set_source_surface(s, 0.0, 0.0),
        }
    }
}

pub enum ArtState {
    Ready(Artwork),
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FallbackKey {
    media: Option<MediaType>,
    year: Option<u16>,
    title: String,
}

impl FallbackKey {
    fn of(item: &WheelItem) -> Self {
        Self {
            media: item.media_type,
            year: item.year,
            title: item.title.clone(),
        }
    }

    fn hue(&self) -> f64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        (hasher.finish() % 360) as f64
    }
}

/// Generated cover art for entries without a poster URL, cached per
/// media type, year and title.
#[derive(Default)]
pub struct FallbackArt {
    cache: RefCell<HashMap<FallbackKey, ImageSurface>>,
}

impl FallbackArt {
    pub fn get(&self, item: &WheelItem) -> Option<ImageSurface> {
        let key = FallbackKey::of(item);
        if let Some(surface) = self.cache.borrow().get(&key) {
            return Some(surface.clone());
        }
        match Self::render(&key) {
            Ok(surface) => {
                self.cache.borrow_mut().insert(key, surface.clone());
                Some(surface)
            }
            Err(e) => {
                log::error!("Failed to render fallback art for '{}': {}", key.title, e);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }

    fn render(key: &FallbackKey) -> Result<ImageSurface, cairo::Error> {
        let (w, h) = FALLBACK_SIZE;
        let surface = ImageSurface::create(Format::ARgb32, w, h)?;
        let cr = Context::new(&surface)?;
        let (w, h) = (w as f64, h as f64);

        let top = Srgb::<f64>::from_color(Hsv::<encoding::Srgb, f64>::new(key.hue(), 0.45, 0.55));
        let bottom =
            Srgb::<f64>::from_color(Hsv::<encoding::Srgb, f64>::new(key.hue(), 0.55, 0.25));
        let gradient = cairo::LinearGradient::new(0.0, 0.0, 0.0, h);
        let (r, g, b) = top.into_components();
        gradient.add_color_stop_rgb(0.0, r, g, b);
        let (r, g, b) = bottom.into_components();
        gradient.add_color_stop_rgb(1.0, r, g, b);
        cr.set_source(&gradient)?;
        cr.paint()?;

        cr.set_source_rgba(1.0, 1.0, 1.0, 0.9);
        cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
        cr.set_font_size(15.0);
        let mut y = h * 0.6;
        for line in wrap(&key.title, 16).iter().take(4) {
            let ext = cr.text_extents(line)?;
            cr.move_to((w - ext.width()) / 2.0 - ext.x_bearing(), y);
            cr.show_text(line)?;
            y += 20.0;
        }

        let caption = match (key.media, key.year) {
            (Some(media), Some(year)) => format!("{media} · {year}"),
            (Some(media), None) => media.to_string(),
            (None, Some(year)) => year.to_string(),
            (None, None) => String::new(),
        };
        if !caption.is_empty() {
            cr.set_source_rgba(1.0, 1.0, 1.0, 0.65);
            cr.set_font_size(12.0);
            let ext = cr.text_extents(&caption)?;
            cr.move_to((w - ext.width()) / 2.0 - ext.x_bearing(), h * 0.25);
            cr.show_text(&caption)?;
        }

        drop(cr);
        surface.flush();
        Ok(surface)
    }
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for word in text.split_whitespace() {
        match lines.last_mut() {
            Some(line) if line.chars().count() + 1 + word.chars().count() <= width => {
                line.push(' ');
                line.push_str(word);
            }
            _ => lines.push(word.to_string()),
        }
    }
    lines
}

/// Artwork lookups for the renderer: remote posters through the shared cache,
/// generated art for everything else.
pub struct Posters {
    cache: Arc<PosterCache<PixbufLoader>>,
    fallback: FallbackArt,
}

impl Posters {
    pub fn new(concurrency: usize, runtime: Handle) -> Self {
        Self {
            cache: PosterCache::new(PixbufLoader::new(POSTER_LOAD_WIDTH), concurrency, runtime),
            fallback: FallbackArt::default(),
        }
    }

    /// Never blocks. `on_ready` is only kept while the poster is still loading.
    pub fn artwork(&self, item: &WheelItem, on_ready: Option<ReadyCallback>) -> ArtState {
        match &item.poster_url {
            Some(url) => match self.cache.lookup(url, on_ready) {
                PosterState::Ready(pixbuf) => ArtState::Ready(Artwork::Poster(pixbuf)),
                PosterState::Pending => ArtState::Pending,
                PosterState::Failed => self.fallback_for(item),
            },
            None => self.fallback_for(item),
        }
    }

    fn fallback_for(&self, item: &WheelItem) -> ArtState {
        self.fallback
            .get(item)
            .map_or(ArtState::Failed, |s| ArtState::Ready(Artwork::Fallback(s)))
    }
}
