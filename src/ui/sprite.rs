use chrono::Local;
use iced::widget::image::{FilterMethod, Handle, Image};
use iced::widget::{button, column, container, horizontal_space, row, text};
use iced::{Alignment, Element, Length};
use tracing::warn;

use crate::sprite::export::{DataUri, DEFAULT_EXPORT_SIZE};
use crate::state::data::GeneratedImage;
use crate::Message;

/// Width of one gallery card in logical pixels
pub const CARD_WIDTH: f32 = 240.0;

/// How a sprite is scaled on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Hard pixel edges
    #[default]
    Nearest,
    /// Bilinear blending
    Smooth,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            RenderMode::Nearest => RenderMode::Smooth,
            RenderMode::Smooth => RenderMode::Nearest,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RenderMode::Nearest => "Nearest",
            RenderMode::Smooth => "Smooth",
        }
    }

    pub fn filter_method(self) -> FilterMethod {
        match self {
            RenderMode::Nearest => FilterMethod::Nearest,
            RenderMode::Smooth => FilterMethod::Linear,
        }
    }
}

/// Local display state for one history record
#[derive(Debug, Clone)]
pub struct SpriteState {
    pub render_mode: RenderMode,
    /// Decoded once when the record enters the gallery
    handle: Option<Handle>,
}

impl SpriteState {
    pub fn new(record: &GeneratedImage) -> Self {
        let handle = match DataUri::parse(&record.image_data) {
            Ok(decoded) => Some(Handle::from_bytes(decoded.bytes)),
            Err(e) => {
                warn!("⚠️  Sprite {} has unreadable image data: {}", record.id, e);
                None
            }
        };

        Self {
            render_mode: RenderMode::default(),
            handle,
        }
    }

    pub fn toggle_render_mode(&mut self) {
        self.render_mode = self.render_mode.toggled();
    }

    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }

    /// Build the card for `record`
    pub fn view<'a>(&'a self, record: &'a GeneratedImage) -> Element<'a, Message> {
        let picture: Element<'a, Message> = match &self.handle {
            Some(handle) => Image::new(handle.clone())
                .filter_method(self.render_mode.filter_method())
                .width(Length::Fill)
                .height(Length::Fixed(CARD_WIDTH - 24.0))
                .into(),
            None => container(text("Image unavailable").size(14))
                .center_x(Length::Fill)
                .center_y(Length::Fixed(CARD_WIDTH - 24.0))
                .into(),
        };

        let exports = row![
            button(text(format!("{}x{}", DEFAULT_EXPORT_SIZE, DEFAULT_EXPORT_SIZE)).size(12))
                .on_press(Message::ExportResized(record.id.clone(), DEFAULT_EXPORT_SIZE)),
            button(text("HD").size(12))
                .style(button::secondary)
                .on_press(Message::ExportOriginal(record.id.clone())),
            horizontal_space(),
            button(text("Delete").size(12))
                .style(button::danger)
                .on_press(Message::Delete(record.id.clone())),
        ]
        .spacing(6)
        .align_y(Alignment::Center);

        let footer = row![
            button(text(self.render_mode.label()).size(12))
                .style(button::text)
                .on_press(Message::ToggleRenderMode(record.id.clone())),
            horizontal_space(),
            text(format!("{}×{}", record.width, record.height)).size(12),
            text(
                record
                    .created_at
                    .with_timezone(&Local)
                    .format("%H:%M")
                    .to_string()
            )
            .size(12),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        let card = column![picture, exports, text(&record.prompt).size(12), footer]
            .spacing(8)
            .padding(12)
            .width(Length::Fixed(CARD_WIDTH));

        container(card).style(container::rounded_box).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_nearest() {
        assert_eq!(RenderMode::default(), RenderMode::Nearest);
        assert_eq!(RenderMode::default().label(), "Nearest");
    }

    #[test]
    fn test_toggle_flips_and_returns() {
        let record = GeneratedImage::new("data:image/png;base64,AA==".into(), "p".into());
        let mut state = SpriteState::new(&record);

        state.toggle_render_mode();
        assert_eq!(state.render_mode, RenderMode::Smooth);
        assert_eq!(state.render_mode.filter_method(), FilterMethod::Linear);

        state.toggle_render_mode();
        assert_eq!(state.render_mode, RenderMode::Nearest);
    }

    #[test]
    fn test_invalid_data_has_no_handle() {
        let record = GeneratedImage::new("not-a-data-uri".into(), "p".into());
        assert!(SpriteState::new(&record).handle().is_none());
    }
}
