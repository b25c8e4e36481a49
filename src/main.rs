use iced::widget::image::{FilterMethod, Handle, Image};
use iced::widget::{button, column, container, horizontal_space, row, scrollable, text, text_editor};
use iced::{Alignment, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod gemini;
mod sprite;
mod state;
mod ui;

use config::{Config, API_KEY_VAR};
use gemini::GeminiClient;
use sprite::export::{self, ExportArtifact};
use state::data::RequestState;
use state::shell::{GenerationOutcome, Shell, ShellEvent};
use ui::gallery::Gallery;

/// Side length of the latest-output preview
const PREVIEW_SIZE: f32 = 280.0;

/// Main application state
struct PixelForge {
    /// Prompt, request lifecycle and session history
    shell: Shell,
    /// Multi-line prompt buffer, mirrored into the shell on every edit
    editor: text_editor::Content,
    /// Lifecycle notifications from the shell
    shell_events: Receiver<ShellEvent>,
    /// Per-sprite display state
    gallery: Gallery,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User edited the prompt
    PromptEdited(text_editor::Action),
    /// User pressed "Generate Sprite"
    Generate,
    /// The pending generation resolved
    Generated(GenerationOutcome),
    /// User pressed "Reset Prompt"
    ResetPrompt,
    /// Delete one sprite from history
    Delete(String),
    /// Flip nearest/smooth rendering for one sprite
    ToggleRenderMode(String),
    /// Save the unmodified image
    ExportOriginal(String),
    /// Save a square nearest-neighbor resize
    ExportResized(String, u32),
    /// Background file write completed
    ExportFinished(Result<PathBuf, String>),
}

impl PixelForge {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config = Config::from_env();
        if !config.has_api_key() {
            warn!("⚠️  {} is not set; generations will fail until it is", API_KEY_VAR);
        }
        info!("🎨 PixelForge starting with model {}", config.model);

        let mut shell = Shell::new(Arc::new(GeminiClient::new(config)));
        let shell_events = shell.subscribe();
        let gallery = Gallery::new(shell.history_mut());
        let editor = text_editor::Content::with_text(shell.prompt());

        (
            PixelForge {
                shell,
                editor,
                shell_events,
                gallery,
                status: "Ready.".to_string(),
            },
            Task::none(),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let task = match message {
            Message::PromptEdited(action) => {
                self.editor.perform(action);
                self.shell.set_prompt(editor_text(&self.editor));
                Task::none()
            }
            Message::Generate => match self.shell.submit() {
                Some(pending) => Task::perform(pending, Message::Generated),
                None => Task::none(),
            },
            Message::Generated(outcome) => {
                self.shell.finish(outcome);
                Task::none()
            }
            Message::ResetPrompt => {
                self.shell.reset_prompt();
                self.editor = text_editor::Content::with_text(self.shell.prompt());
                Task::none()
            }
            Message::Delete(id) => {
                self.shell.delete(&id);
                Task::none()
            }
            Message::ToggleRenderMode(id) => {
                if let Some(sprite) = self.gallery.sprite_mut(&id) {
                    sprite.toggle_render_mode();
                }
                Task::none()
            }
            Message::ExportOriginal(id) => {
                let artifact = self
                    .shell
                    .history()
                    .get(&id)
                    .map(export::export_original);
                self.save(artifact)
            }
            Message::ExportResized(id, size) => {
                let artifact = self
                    .shell
                    .history()
                    .get(&id)
                    .map(|record| export::export_resized(record, size));
                self.save(artifact)
            }
            Message::ExportFinished(result) => {
                match result {
                    Ok(path) => {
                        info!("💾 Saved sprite to {}", path.display());
                        self.status = format!("Saved {}", path.display());
                    }
                    Err(e) => {
                        error!("Export failed: {}", e);
                        self.status = format!("Export failed: {}", e);
                    }
                }
                Task::none()
            }
        };

        self.gallery.sync(self.shell.history());
        self.drain_shell_events();
        task
    }

    /// Reflect lifecycle changes in the status line
    fn drain_shell_events(&mut self) {
        for event in self.shell_events.try_iter() {
            let ShellEvent::StateChanged { from, to } = event;
            debug!("status refresh after {} -> {}", from.as_str(), to.as_str());
            self.status = match to {
                RequestState::Idle => "Ready.".to_string(),
                RequestState::Pending => "Forging pixels...".to_string(),
                RequestState::Succeeded => {
                    format!("Sprite ready. {} in collection.", self.shell.history().len())
                }
                RequestState::Failed => "Generation failed.".to_string(),
            };
        }
    }

    /// Ask where to save an export, then write it in the background
    fn save(
        &mut self,
        artifact: Option<Result<ExportArtifact, export::ExportError>>,
    ) -> Task<Message> {
        let artifact = match artifact {
            Some(Ok(artifact)) => artifact,
            Some(Err(e)) => {
                error!("Export failed: {}", e);
                self.status = format!("Export failed: {}", e);
                return Task::none();
            }
            None => return Task::none(),
        };

        let mut dialog = FileDialog::new()
            .set_title("Save Sprite")
            .set_file_name(artifact.file_name.as_str())
            .add_filter("PNG image", &["png"]);
        if let Some(dir) = export::default_export_dir() {
            dialog = dialog.set_directory(dir);
        }

        match dialog.save_file() {
            Some(path) => {
                self.status = format!("Saving {}...", artifact.file_name);
                Task::perform(export::save_artifact(artifact, path), |result| {
                    Message::ExportFinished(result.map_err(|e| e.to_string()))
                })
            }
            None => {
                self.status = "Export cancelled.".to_string();
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let pending = self.shell.is_pending();

        let header = row![
            text("PixelForge").size(32),
            text("AI").size(14),
            horizontal_space(),
            text(&self.status).size(14),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let prompt_input = text_editor(&self.editor)
            .placeholder("e.g. A fantasy sword with a glowing blue blade, pixel art style...")
            .on_action(Message::PromptEdited)
            .height(Length::Fixed(128.0))
            .padding(12);

        let generate_label = if pending {
            "Generating..."
        } else {
            "Generate Sprite"
        };

        let actions = row![
            button(text(generate_label))
                .padding(12)
                .on_press_maybe(self.shell.can_submit().then_some(Message::Generate)),
            button(text("Reset Prompt"))
                .padding(12)
                .style(button::secondary)
                .on_press(Message::ResetPrompt),
            horizontal_space(),
            text(format!("{} chars", self.shell.prompt().chars().count())).size(12),
        ]
        .spacing(12)
        .align_y(Alignment::Center);

        let mut command_center = column![
            text("Command Center").size(24),
            text("Describe your sprite in detail. Include view, style, and colors.").size(14),
            prompt_input,
            actions,
        ]
        .spacing(14)
        .width(Length::Fill);

        if let Some(message) = self.shell.error() {
            command_center = command_center.push(
                container(text(message).style(text::danger))
                    .padding(12)
                    .width(Length::Fill)
                    .style(container::bordered_box),
            );
        }

        let top = row![command_center, self.preview()]
            .spacing(24)
            .align_y(Alignment::Start);

        let content = column![header, top, self.gallery.view(self.shell.history())]
            .spacing(32)
            .padding(32);

        scrollable(content).height(Length::Fill).into()
    }

    /// What the preview pane currently shows
    fn preview_content(&self) -> PreviewContent<'_> {
        if self.shell.is_pending() {
            return PreviewContent::Forging;
        }
        match self.shell.history().latest() {
            Some(latest) => match self.gallery.handle(&latest.id) {
                Some(handle) => PreviewContent::Latest(handle),
                None => PreviewContent::Unavailable,
            },
            None => PreviewContent::Empty,
        }
    }

    /// Latest output, a loading placeholder, or an empty hint
    fn preview(&self) -> Element<Message> {
        let body: Element<Message> = match self.preview_content() {
            PreviewContent::Forging => text("Forging Pixels...").size(16).into(),
            PreviewContent::Latest(handle) => Image::new(handle.clone())
                .filter_method(FilterMethod::Nearest)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            PreviewContent::Unavailable => text("Image unavailable").size(14).into(),
            PreviewContent::Empty => text("Preview will appear here").size(14).into(),
        };

        let mut pane = column![container(body)
            .width(Length::Fixed(PREVIEW_SIZE))
            .height(Length::Fixed(PREVIEW_SIZE))
            .center_x(Length::Fixed(PREVIEW_SIZE))
            .center_y(Length::Fixed(PREVIEW_SIZE))
            .style(container::bordered_box)]
        .spacing(6)
        .align_x(Alignment::Center);

        if !self.shell.history().is_empty() {
            pane = pane.push(text("Latest Output").size(12));
        }

        pane.into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Preview pane states
#[derive(Debug)]
enum PreviewContent<'a> {
    Forging,
    Latest(&'a Handle),
    /// The newest record's image data could not be decoded
    Unavailable,
    Empty,
}

/// Editor contents without the trailing newline the buffer always reports
fn editor_text(content: &text_editor::Content) -> String {
    let mut text = content.text();
    if text.ends_with('\n') {
        text.pop();
    }
    text
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pixel_forge=info")),
        )
        .init();

    iced::application("PixelForge", PixelForge::update, PixelForge::view)
        .theme(PixelForge::theme)
        .centered()
        .run_with(PixelForge::new)
}
