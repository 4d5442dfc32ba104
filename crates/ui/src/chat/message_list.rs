use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::Hasher;
use std::ops::Range;
use std::rc::Rc;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{ActiveTheme, h_flex, label::Label, v_flex, v_virtual_list};

use crate::chat::format::layout_segments;
use crate::chat::message::{Message, MessageId, MessageStatus, Role, TypingIndicator};
use crate::chat::scroll_manager::ScrollManager;

const DEFAULT_CONTENT_WIDTH: Pixels = px(680.);
const LIST_HORIZONTAL_PADDING: Pixels = px(16.);
const CONTENT_WIDTH_CHANGE_EPSILON: f32 = 1.0;
const USER_BUBBLE_MAX_WIDTH: Pixels = px(540.);
const USER_BUBBLE_PADDING_X: Pixels = px(14.);
const USER_BUBBLE_PADDING_Y: Pixels = px(10.);
const BOT_LABEL_HEIGHT: Pixels = px(16.);
const BOT_LABEL_GAP: Pixels = px(8.);
const ERROR_ROW_HEIGHT: Pixels = px(20.);
const ERROR_ROW_GAP: Pixels = px(8.);
const TYPING_ROW_HEIGHT: Pixels = px(20.);
const ESTIMATED_TEXT_LINE_HEIGHT: Pixels = px(18.);
const ESTIMATED_CHAR_WIDTH: f32 = 7.0;

/// Fixed placeholder text shown while a reply is pending.
pub const TYPING_PLACEHOLDER_TEXT: &str = "Bot is typing...";

struct SizeCacheEntry {
    layout_hash: u64,
    height: Pixels,
    measured: bool,
}

pub struct MessageList {
    messages: Vec<Message>,
    typing: TypingIndicator,
    item_sizes: Rc<Vec<Size<Pixels>>>,
    scroll_manager: ScrollManager,
    size_cache: HashMap<MessageId, SizeCacheEntry>,
    content_width: Option<Pixels>,
}

impl MessageList {
    pub fn new(_cx: &mut Context<Self>) -> Self {
        Self {
            messages: Vec::new(),
            typing: TypingIndicator::default(),
            item_sizes: Rc::new(Vec::new()),
            scroll_manager: ScrollManager::new(),
            size_cache: HashMap::new(),
            content_width: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn typing_shown(&self) -> bool {
        self.typing.is_shown()
    }

    /// Replaces the rendered sequence. Appends never move the viewport by
    /// themselves; scrolling is driven by the explicit notes below.
    pub fn sync_messages(&mut self, messages: Vec<Message>, cx: &mut Context<Self>) {
        self.messages = messages;
        self.rebuild_item_sizes();
        cx.notify();
    }

    /// Marks that the latest append came from the user: snap to the bottom
    /// only when the viewport already sat there.
    pub fn note_user_message_appended(&mut self, cx: &mut Context<Self>) {
        self.scroll_manager.request_scroll_if_at_bottom();
        cx.notify();
    }

    /// Shows the typing placeholder and snaps to the bottom unconditionally.
    /// Returns false (and changes nothing) when one is already shown.
    pub fn show_typing(&mut self, cx: &mut Context<Self>) -> bool {
        if !self.typing.show() {
            return false;
        }

        self.scroll_manager.request_scroll_to_bottom();
        self.rebuild_item_sizes();
        cx.notify();
        true
    }

    /// Removes the typing placeholder; a no-op when none is shown.
    pub fn remove_typing(&mut self, cx: &mut Context<Self>) -> bool {
        if !self.typing.dismiss() {
            return false;
        }

        self.rebuild_item_sizes();
        cx.notify();
        true
    }

    pub fn reset_scroll_tracking(&mut self, cx: &mut Context<Self>) {
        self.scroll_manager.reset();
        cx.notify();
    }

    fn row_count(&self) -> usize {
        self.messages.len() + usize::from(self.typing.is_shown())
    }

    fn update_content_width(&mut self, cx: &mut Context<Self>) {
        let list_width = self.scroll_manager.bounds().size.width;
        if list_width <= Pixels::ZERO {
            return;
        }

        let next_content_width = max_pixels(px(1.), list_width - LIST_HORIZONTAL_PADDING * 2);
        let width_changed = self.content_width.is_none_or(|current| {
            (f32::from(current) - f32::from(next_content_width)).abs()
                > CONTENT_WIDTH_CHANGE_EPSILON
        });

        if width_changed {
            self.content_width = Some(next_content_width);

            // Mark cached measurements dirty so row heights follow the new width.
            for entry in self.size_cache.values_mut() {
                entry.measured = false;
            }

            self.rebuild_item_sizes();
            cx.notify();
        }
    }

    fn rebuild_item_sizes(&mut self) {
        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        let mut active_ids = HashSet::with_capacity(self.messages.len());
        let mut sizes = Vec::with_capacity(self.row_count());

        for message in &self.messages {
            let next_hash = layout_hash(message);
            let estimated_height = estimate_message_height(message, content_width);

            let entry = self.size_cache.entry(message.id).or_insert(SizeCacheEntry {
                layout_hash: next_hash,
                height: estimated_height,
                measured: false,
            });

            // Cache entries are stable by message id; messages are immutable
            // once appended, so hashes only change when the panel is cleared.
            if entry.layout_hash != next_hash {
                entry.layout_hash = next_hash;
                entry.height = estimated_height;
                entry.measured = false;
            } else if !entry.measured {
                entry.height = estimated_height;
            }

            sizes.push(size(px(0.), entry.height));
            active_ids.insert(message.id);
        }

        if self.typing.is_shown() {
            sizes.push(size(px(0.), TYPING_ROW_HEIGHT));
        }

        self.size_cache.retain(|id, _| active_ids.contains(id));
        self.item_sizes = Rc::new(sizes);
    }

    fn measure_visible_items(
        &mut self,
        visible_range: Range<usize>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        if self.messages.is_empty() {
            return;
        }

        let content_width = self.content_width.unwrap_or(DEFAULT_CONTENT_WIDTH);
        let available_space = size(
            AvailableSpace::Definite(content_width),
            AvailableSpace::MinContent,
        );
        let mut updated = false;

        for index in visible_range {
            // The typing row has a fixed height and is never measured.
            let Some(message) = self.messages.get(index).cloned() else {
                continue;
            };

            let next_hash = layout_hash(&message);
            let estimated_height = estimate_message_height(&message, content_width);

            {
                let entry = self.size_cache.entry(message.id).or_insert(SizeCacheEntry {
                    layout_hash: next_hash,
                    height: estimated_height,
                    measured: false,
                });

                if entry.layout_hash != next_hash {
                    entry.layout_hash = next_hash;
                    entry.height = estimated_height;
                    entry.measured = false;
                }
            }

            let mut row = self.render_message_row(&message, cx);
            let measured_height = row.layout_as_root(available_space, window, cx).height;
            let Some(entry) = self.size_cache.get_mut(&message.id) else {
                continue;
            };
            let height_changed = !entry.measured || pixels_changed(entry.height, measured_height);
            if height_changed {
                entry.height = measured_height;
                updated = true;
            }
            entry.measured = true;
        }

        if updated {
            self.rebuild_item_sizes();
            cx.notify();
        }
    }

    fn render_row(&self, index: usize, cx: &mut Context<Self>) -> Option<AnyElement> {
        if let Some(message) = self.messages.get(index).cloned() {
            return Some(self.render_message_row(&message, cx));
        }

        if index == self.messages.len() && self.typing.is_shown() {
            return Some(self.render_typing_row(cx));
        }

        None
    }

    fn render_message_row(&self, message: &Message, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();

        if message.role == Role::User {
            return v_flex()
                .w_full()
                .items_end()
                .child(
                    v_flex()
                        .max_w(USER_BUBBLE_MAX_WIDTH)
                        .px(USER_BUBBLE_PADDING_X)
                        .py(USER_BUBBLE_PADDING_Y)
                        .rounded_lg()
                        .bg(theme.accent)
                        .text_color(theme.accent_foreground)
                        .children(render_segment_lines(&message.content)),
                )
                .into_any_element();
        }

        let error_message = if let MessageStatus::Error(error) = &message.status {
            Some(error.clone())
        } else {
            None
        };

        v_flex()
            .w_full()
            .gap_2()
            .child(
                Label::new("Bot")
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.5)),
            )
            .child(v_flex().w_full().children(render_segment_lines(&message.content)))
            .when_some(error_message, |column, error| {
                column.child(
                    Label::new(format!("Error: {error}"))
                        .text_xs()
                        .text_color(theme.danger),
                )
            })
            .into_any_element()
    }

    fn render_typing_row(&self, cx: &mut Context<Self>) -> AnyElement {
        let theme = cx.theme();

        h_flex()
            .w_full()
            .gap_2()
            .items_center()
            .child(div().size(px(8.)).rounded_full().bg(theme.primary))
            .child(
                Label::new(TYPING_PLACEHOLDER_TEXT)
                    .text_xs()
                    .text_color(theme.foreground.opacity(0.65)),
            )
            .into_any_element()
    }
}

impl Render for MessageList {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        self.update_content_width(cx);
        self.scroll_manager.apply_pending_scroll();
        self.scroll_manager.track_offsets();

        v_flex().size_full().min_h_0().child(
            v_virtual_list(
                cx.entity().clone(),
                "message-list",
                self.item_sizes.clone(),
                |this, visible_range, window, cx| {
                    // Measure only visible rows so long histories keep O(visible) layout work.
                    this.update_content_width(cx);
                    this.measure_visible_items(visible_range.clone(), window, cx);
                    visible_range
                        .filter_map(|index| this.render_row(index, cx))
                        .collect::<Vec<_>>()
                },
            )
            .size_full()
            .px_4()
            .py_3()
            .gap_4()
            .track_scroll(self.scroll_manager.handle()),
        )
    }
}

/// Folds formatting segments into visual lines: every break-before segment
/// opens a new line, everything else extends the current one.
fn segment_lines(content: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for segment in layout_segments(content) {
        if segment.break_before || lines.is_empty() {
            lines.push(segment.text);
        } else if let Some(last) = lines.last_mut() {
            last.push_str(&segment.text);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

fn render_segment_lines(content: &str) -> Vec<AnyElement> {
    segment_lines(content)
        .into_iter()
        .map(|line| {
            let text = if line.is_empty() { " ".to_string() } else { line };
            Label::new(text).text_sm().into_any_element()
        })
        .collect()
}

fn layout_hash(message: &Message) -> u64 {
    let mut hasher = DefaultHasher::new();

    hasher.write_u64(message.id.0);

    let role_tag = match message.role {
        Role::User => 0,
        Role::Bot => 1,
    };
    hasher.write_u8(role_tag);

    match &message.status {
        MessageStatus::Done => hasher.write_u8(0),
        MessageStatus::Error(error) => {
            hasher.write_u8(1);
            hasher.write(error.as_bytes());
        }
    }

    hasher.write(message.content.as_bytes());
    hasher.finish()
}

fn estimate_message_height(message: &Message, content_width: Pixels) -> Pixels {
    let text_width = match message.role {
        Role::User => {
            let bubble_width = min_pixels(content_width, USER_BUBBLE_MAX_WIDTH);
            max_pixels(px(1.), bubble_width - USER_BUBBLE_PADDING_X * 2)
        }
        Role::Bot => content_width,
    };

    let text_height = estimate_lines_height(&message.content, text_width);

    match message.role {
        Role::User => text_height + USER_BUBBLE_PADDING_Y * 2,
        Role::Bot => {
            let mut total_height = BOT_LABEL_HEIGHT + BOT_LABEL_GAP + text_height;
            if matches!(message.status, MessageStatus::Error(_)) {
                total_height += ERROR_ROW_GAP + ERROR_ROW_HEIGHT;
            }
            total_height
        }
    }
}

fn estimate_lines_height(content: &str, width: Pixels) -> Pixels {
    let width_as_f32 = f32::from(width);
    let chars_per_line = (width_as_f32 / ESTIMATED_CHAR_WIDTH).floor().max(1.0) as usize;

    let mut line_count = 0usize;
    for line in segment_lines(content) {
        let char_count = line.chars().count().max(1);
        line_count += char_count.div_ceil(chars_per_line);
    }

    ESTIMATED_TEXT_LINE_HEIGHT * line_count.max(1)
}

fn max_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) >= f32::from(b) { a } else { b }
}

fn min_pixels(a: Pixels, b: Pixels) -> Pixels {
    if f32::from(a) <= f32::from(b) { a } else { b }
}

fn pixels_changed(a: Pixels, b: Pixels) -> bool {
    (f32::from(a) - f32::from(b)).abs() > 0.5
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualizationMetric {
    pub message_id: MessageId,
    pub estimated_height: f32,
    pub layout_hash: u64,
}

pub fn virtualization_metrics(
    messages: &[Message],
    content_width: f32,
) -> Vec<VirtualizationMetric> {
    let bounded_width = px(content_width.max(1.0));

    messages
        .iter()
        .map(|message| VirtualizationMetric {
            message_id: message.id,
            estimated_height: f32::from(estimate_message_height(message, bounded_width)),
            layout_hash: layout_hash(message),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_lines_split_on_every_marker() {
        assert_eq!(
            segment_lines("intro\n• a • b\n- c"),
            vec!["intro", "• a ", "• b", "- c"]
        );
        assert_eq!(segment_lines("plain"), vec!["plain"]);
        assert_eq!(segment_lines(""), vec![""]);
    }

    #[test]
    fn bullet_replies_estimate_taller_than_single_lines() {
        let flat = Message::bot(MessageId::new(1), "one line answer");
        let list = Message::bot(MessageId::new(2), "options: • first • second • third");

        let width = px(680.);
        assert!(estimate_message_height(&list, width) > estimate_message_height(&flat, width));
    }

    #[test]
    fn long_history_fixture_keeps_row_metrics_deterministic() {
        let mut messages = (0..2_000)
            .map(|index| {
                let id = MessageId::new(index as u64 + 1);
                if index % 2 == 0 {
                    Message::user(id, format!("question {index}?"))
                } else {
                    Message::bot(id, format!("answer {index}\n• detail"))
                }
            })
            .collect::<Vec<_>>();

        let metrics_before = virtualization_metrics(&messages, 680.);
        assert_eq!(metrics_before.len(), 2_000);
        assert!(metrics_before
            .iter()
            .all(|metric| metric.estimated_height > 0.));

        if let Some(last_message) = messages.last_mut() {
            // Tail-only mutation must invalidate only the final row hash.
            last_message.content.push_str(" [edited]");
        }

        let metrics_after = virtualization_metrics(&messages, 680.);
        assert_eq!(
            metrics_before[..1_999]
                .iter()
                .map(|metric| metric.layout_hash)
                .collect::<Vec<_>>(),
            metrics_after[..1_999]
                .iter()
                .map(|metric| metric.layout_hash)
                .collect::<Vec<_>>(),
        );
        assert_ne!(
            metrics_before[1_999].layout_hash,
            metrics_after[1_999].layout_hash
        );
    }

    #[test]
    fn error_rows_reserve_extra_height() {
        let plain = Message::bot(MessageId::new(1), "same text");
        let failed = Message::bot_error(MessageId::new(2), "same text", "connection refused");

        let width = px(680.);
        assert!(estimate_message_height(&failed, width) > estimate_message_height(&plain, width));
    }
}
