use iced::widget::image::Handle;
use iced::widget::{column, container, row, text};
use iced::{Alignment, Element, Length};
use iced_aw::Wrap;
use std::collections::HashMap;
use std::sync::mpsc::Receiver;

use super::sprite::SpriteState;
use crate::state::history::{HistoryEvent, HistoryStore};
use crate::Message;

/// Grid of every sprite in the session history.
///
/// Per-record display state is kept in step with the history store through
/// its change notifications; `sync` must run after anything that may have
/// mutated the store.
pub struct Gallery {
    events: Receiver<HistoryEvent>,
    sprites: HashMap<String, SpriteState>,
}

impl Gallery {
    pub fn new(history: &mut HistoryStore) -> Self {
        let events = history.subscribe();
        let sprites = history
            .records()
            .iter()
            .map(|record| (record.id.clone(), SpriteState::new(record)))
            .collect();

        Self { events, sprites }
    }

    /// Apply pending history notifications
    pub fn sync(&mut self, history: &HistoryStore) {
        for event in self.events.try_iter() {
            match event {
                HistoryEvent::Added { id } => {
                    if let Some(record) = history.get(&id) {
                        self.sprites.insert(id, SpriteState::new(record));
                    }
                }
                HistoryEvent::Removed { id } => {
                    self.sprites.remove(&id);
                }
            }
        }
    }

    pub fn sprite_mut(&mut self, id: &str) -> Option<&mut SpriteState> {
        self.sprites.get_mut(id)
    }

    pub fn handle(&self, id: &str) -> Option<&Handle> {
        self.sprites.get(id).and_then(SpriteState::handle)
    }

    pub fn view<'a>(&'a self, history: &'a HistoryStore) -> Element<'a, Message> {
        if history.is_empty() {
            return empty_state();
        }

        let cards: Vec<Element<'a, Message>> = history
            .records()
            .iter()
            .filter_map(|record| {
                self.sprites
                    .get(&record.id)
                    .map(|sprite| sprite.view(record))
            })
            .collect();

        let header = row![
            text("Collection").size(24),
            text(history.len().to_string()).size(16),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        column![
            header,
            Wrap::with_elements(cards).spacing(16.0).line_spacing(16.0),
        ]
        .spacing(16)
        .width(Length::Fill)
        .into()
    }
}

impl std::fmt::Debug for Gallery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gallery")
            .field("sprites", &self.sprites.len())
            .finish()
    }
}

fn empty_state<'a>() -> Element<'a, Message> {
    let content = column![
        text("No Sprites Yet").size(22),
        text("Enter a prompt above to start generating your pixel art collection.").size(14),
    ]
    .spacing(8)
    .align_x(Alignment::Center);

    container(content)
        .padding(60)
        .width(Length::Fill)
        .center_x(Length::Fill)
        .style(container::bordered_box)
        .into()
}
