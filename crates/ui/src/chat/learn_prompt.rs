use gpui::*;
use gpui_component::{
    ActiveTheme, Sizable,
    button::{Button, ButtonVariants},
    input::{Input, InputEvent, InputState},
    label::Label,
    v_flex,
};

use crate::chat::events::{LearnAnswerSubmitted, LearnPromptDismissed};

/// Inline teach-back prompt.
///
/// Shown when the service flags a question it could not answer. Unlike a
/// modal dialog it never blocks the event loop: the operator answers or
/// skips whenever they like, and the rest of the widget keeps working.
pub struct LearnPrompt {
    input_state: Entity<InputState>,
    question: String,
}

impl EventEmitter<LearnAnswerSubmitted> for LearnPrompt {}
impl EventEmitter<LearnPromptDismissed> for LearnPrompt {}

impl LearnPrompt {
    pub fn new(window: &mut Window, cx: &mut Context<Self>) -> Self {
        let input_state = cx.new(|cx| {
            InputState::new(window, cx).placeholder("Please enter the correct answer...")
        });

        cx.subscribe_in(
            &input_state,
            window,
            |this, _, event: &InputEvent, window, cx| {
                if let InputEvent::PressEnter { secondary } = event
                    && !*secondary
                {
                    this.handle_submit(window, cx);
                }
            },
        )
        .detach();

        Self {
            input_state,
            question: String::new(),
        }
    }

    /// Points the prompt at the question currently waiting for an answer.
    /// A newer unanswered question simply replaces the text.
    pub fn set_question(&mut self, question: impl Into<String>, cx: &mut Context<Self>) {
        self.question = question.into();
        cx.notify();
    }

    pub fn clear(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.input_state.update(cx, |state, cx| {
            state.set_value("", window, cx);
        });
    }

    fn handle_submit(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let answer = self.input_state.read(cx).value().to_string();
        let trimmed = answer.trim();
        if trimmed.is_empty() {
            // An empty answer teaches nothing; leave the prompt open.
            return;
        }

        cx.emit(LearnAnswerSubmitted {
            answer: trimmed.to_string(),
        });
        self.clear(window, cx);
    }

    fn handle_dismiss(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        self.clear(window, cx);
        cx.emit(LearnPromptDismissed);
    }
}

impl Render for LearnPrompt {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .w_full()
            .gap_2()
            .p_3()
            .border_t_1()
            .border_color(theme.border)
            .bg(theme.muted)
            .child(
                Label::new("I don't know this one yet. Teach me?")
                    .text_xs()
                    .text_color(theme.muted_foreground),
            )
            .child(
                Label::new(self.question.clone())
                    .text_sm()
                    .text_color(theme.foreground),
            )
            .child(
                div()
                    .w_full()
                    .px_3()
                    .py_2()
                    .rounded_lg()
                    .border_1()
                    .border_color(theme.border)
                    .bg(theme.background)
                    .child(Input::new(&self.input_state).w_full()),
            )
            .child(
                div()
                    .w_full()
                    .flex()
                    .justify_end()
                    .gap_2()
                    .child(
                        Button::new("learn-skip")
                            .small()
                            .ghost()
                            .child("Skip")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.handle_dismiss(window, cx);
                            })),
                    )
                    .child(
                        Button::new("learn-teach")
                            .small()
                            .primary()
                            .child("Teach")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.handle_submit(window, cx);
                            })),
                    ),
            )
    }
}
