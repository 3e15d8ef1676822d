use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use wgpu_text::BrushBuilder;
use wgpu_text::TextBrush;
use wgpu_text::glyph_brush::Layout;
use wgpu_text::glyph_brush::OwnedSection;
use wgpu_text::glyph_brush::OwnedText;
use wgpu_text::glyph_brush::Section;
use wgpu_text::glyph_brush::ab_glyph::FontRef;
use winit::dpi::PhysicalSize;

use crate::constants::{CAPTION_HEIGHT, OVERLAY_MARGIN, PANEL_HEIGHT};
use crate::gallery::Memory;
use crate::settings::{ConfigKey, RenderConfig};

const FONT_SIZE: f32 = 18.0;
const TITLE_FONT_SIZE: f32 = 28.0;

const NORMAL_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 0.6]; // dim white
const HIGHLIGHT_COLOR: [f32; 4] = [0.29, 0.87, 0.5, 1.0]; // green
const TITLE_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0]; // white
const ERROR_COLOR: [f32; 4] = [1.0, 0.35, 0.35, 1.0]; // red

/// Where the active memory's image is in its lifecycle.
pub enum ImageStatus<'a> {
    Loading,
    Failed(&'a str),
    Shown,
}

pub struct Pipeline<'a> {
    brush: TextBrush<FontRef<'a>>,
    /// The parameter list in the top-left corner
    panel: OwnedSection,
    /// Title, date and description of the active memory along the bottom
    caption: OwnedSection,
    /// The parameter currently selected for editing, if any
    highlighted: Option<ConfigKey>,
    visible: bool,
}

/// One line per exposed parameter, in key binding order.
fn format_config(config: &RenderConfig) -> Vec<(ConfigKey, String)> {
    ConfigKey::ALL
        .iter()
        .filter(|key| key.is_exposed())
        .filter_map(|&key| {
            let binding = key.binding()?;
            let precision = if key.step() < 0.1 { 2 } else { 1 };
            let letter = format!("{binding:?}").trim_start_matches("Key").to_owned();
            let value = config.get(key);
            let label = key.label();
            Some((key, format!("[{letter}] {label:<15}{value:>6.precision$}\n")))
        })
        .collect()
}

/// The caption lines for the active memory, with the colour and scale of each.
fn format_caption(
    memory: &Memory,
    index: usize,
    len: usize,
    status: ImageStatus,
) -> Vec<(String, [f32; 4], f32)> {
    let mut lines = vec![(format!("{}\n", memory.title), TITLE_COLOR, TITLE_FONT_SIZE)];
    let mut details = format!("{} / {}", index + 1, len);
    if !memory.date.is_empty() {
        details = format!("{}  -  {details}", memory.date);
    }
    lines.push((format!("{details}\n"), NORMAL_COLOR, FONT_SIZE));
    if !memory.description.is_empty() {
        lines.push((format!("{}\n", memory.description), TITLE_COLOR, FONT_SIZE));
    }
    match status {
        ImageStatus::Loading => lines.push(("loading...\n".into(), NORMAL_COLOR, FONT_SIZE)),
        ImageStatus::Failed(reason) => {
            lines.push((format!("image unavailable: {reason}\n"), ERROR_COLOR, FONT_SIZE))
        }
        ImageStatus::Shown => {}
    }
    lines
}

impl Pipeline<'_> {
    /// Returns `None` if no usable monospace font is installed; the overlay is then skipped.
    pub fn new(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        render_format: wgpu::TextureFormat,
    ) -> Option<Self> {
        let font_handle = SystemSource::new()
            .select_best_match(&[FamilyName::Monospace], &Properties::new())
            .map_err(|err| log::warn!("no system monospace font, overlay disabled: {err}"))
            .ok()?;
        let font_vec = match font_handle {
            Handle::Memory { bytes, .. } => Vec::clone(&bytes),
            Handle::Path { path, .. } => std::fs::read(&path)
                .map_err(|err| log::warn!("could not read font {}: {err}", path.display()))
                .ok()?,
        };
        let font_bytes: &'static mut [u8] = font_vec.leak();
        let brush_builder = BrushBuilder::using_font_bytes(font_bytes)
            .map_err(|err| log::warn!("could not parse font: {err}"))
            .ok()?;
        let brush = brush_builder.build(device, size.width, size.height, render_format);

        Some(Self {
            brush,
            panel: Section::default().with_layout(Layout::default()).to_owned(),
            caption: Section::default()
                .with_layout(Layout::default_wrap())
                .to_owned(),
            highlighted: None,
            visible: true,
        })
    }

    pub fn resize(&mut self, queue: &wgpu::Queue, new_size: PhysicalSize<u32>) {
        let margin = OVERLAY_MARGIN as f32;
        let width = new_size.width.saturating_sub(2 * OVERLAY_MARGIN) as f32;
        self.panel.bounds = (width, PANEL_HEIGHT as f32);
        self.panel.screen_position = (margin, margin);
        self.caption.bounds = (width, CAPTION_HEIGHT as f32);
        self.caption.screen_position = (
            margin,
            new_size
                .height
                .saturating_sub(CAPTION_HEIGHT + OVERLAY_MARGIN) as f32,
        );
        self.brush
            .resize_view(new_size.width as f32, new_size.height as f32, queue);
    }

    pub fn toggle_visible(&mut self) {
        self.visible = !self.visible;
    }

    pub fn set_highlighted(&mut self, highlighted: Option<ConfigKey>) {
        self.highlighted = highlighted;
    }

    pub fn set_config(&mut self, config: &RenderConfig) {
        let highlighted = self.highlighted;
        self.panel.text.clear();
        self.panel
            .text
            .extend(format_config(config).into_iter().map(|(key, text)| {
                OwnedText::default()
                    .with_text(text)
                    .with_scale(FONT_SIZE)
                    .with_color(if Some(key) == highlighted {
                        HIGHLIGHT_COLOR
                    } else {
                        NORMAL_COLOR
                    })
            }));
    }

    pub fn set_caption(&mut self, memory: &Memory, index: usize, len: usize, status: ImageStatus) {
        self.caption.text.clear();
        self.caption.text.extend(
            format_caption(memory, index, len, status)
                .into_iter()
                .map(|(text, color, scale)| {
                    OwnedText::default()
                        .with_text(text)
                        .with_scale(scale)
                        .with_color(color)
                }),
        );
    }

    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if !self.visible {
            return;
        }
        if let Err(err) = self.brush.queue(device, queue, [&self.panel, &self.caption]) {
            log::warn!("queueing overlay text: {err}");
        }
    }

    pub fn render_pass<'pass>(&'pass self, render_pass: &mut wgpu::RenderPass<'pass>) {
        if self.visible {
            self.brush.draw(render_pass);
        }
    }
}
