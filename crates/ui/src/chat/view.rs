use std::sync::Arc;
use std::time::Duration;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::{ActiveTheme, v_flex};
use gpui_tokio_bridge::Tokio;

use banter_backend::{BackendError, ChatBackend, ChatTurnRequest, LearnSubmission};

use crate::chat::events::{ExchangeOutcome, LearnAnswerSubmitted, LearnPromptDismissed, Submit};
use crate::chat::message::{ChatSession, ExchangeId, Message, MessageId};
use crate::chat::{LearnPrompt, MessageInput, MessageList};

/// Artificial wait before the chat request goes out, so replies read as
/// considered rather than instantaneous. Purely pacing, not a timeout.
pub const DEFAULT_REPLY_DELAY_MS: u64 = 1000;

/// Parent coordinator for panel/input/prompt/backend orchestration.
pub struct ChatView {
    message_list: Entity<MessageList>,
    message_input: Entity<MessageInput>,
    learn_prompt: Entity<LearnPrompt>,
    learn_prompt_open: bool,
    backend: Arc<dyn ChatBackend>,
    reply_delay: Duration,
    session: ChatSession,
    next_message_id: u64,
    next_exchange_id: u64,
    chat_task: Option<Task<()>>,
    learn_task: Option<Task<()>>,
}

impl ChatView {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        reply_delay: Duration,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let message_list = cx.new(MessageList::new);
        let message_input = cx.new(|cx| MessageInput::new(window, cx));
        let learn_prompt = cx.new(|cx| LearnPrompt::new(window, cx));

        cx.subscribe(&message_input, |this, _, event: &Submit, cx| {
            this.handle_submit(event.clone(), cx);
        })
        .detach();

        cx.subscribe(
            &learn_prompt,
            |this, _, event: &LearnAnswerSubmitted, cx| {
                this.handle_learn_submitted(event.clone(), cx);
            },
        )
        .detach();

        cx.subscribe(
            &learn_prompt,
            |this, _, _event: &LearnPromptDismissed, cx| {
                this.handle_learn_dismissed(cx);
            },
        )
        .detach();

        Self {
            message_list,
            message_input,
            learn_prompt,
            learn_prompt_open: false,
            backend,
            reply_delay,
            session: ChatSession::new(),
            next_message_id: 1,
            next_exchange_id: 1,
            chat_task: None,
            learn_task: None,
        }
    }

    /// Clears the panel and every piece of in-flight state.
    pub fn clear_chat(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        // Dropping the tasks cancels the pacing timer and any pending request.
        self.chat_task = None;
        self.learn_task = None;

        self.session.clear();
        self.learn_prompt_open = false;

        self.message_list.update(cx, |list, cx| {
            list.remove_typing(cx);
            list.sync_messages(Vec::new(), cx);
            list.reset_scroll_tracking(cx);
        });
        self.message_input.update(cx, |input, cx| {
            input.set_awaiting_reply(false, cx);
            input.clear(window, cx);
        });
        self.learn_prompt.update(cx, |prompt, cx| {
            prompt.clear(window, cx);
        });

        cx.notify();
    }

    fn handle_submit(&mut self, event: Submit, cx: &mut Context<Self>) {
        if self.session.exchange_state.active_exchange().is_some() {
            // Single-flight: the composer is disabled while awaiting, so this
            // only fires on a race; refusing keeps rendered ordering stable.
            return;
        }

        let exchange_id = self.alloc_exchange_id();
        if let Err(rejection) = self
            .session
            .apply_exchange_transition(crate::chat::ExchangeTransition::Begin(exchange_id))
        {
            tracing::warn!(?rejection, "refused to begin a chat exchange");
            return;
        }

        let user_message_id = self.alloc_message_id();
        self.session
            .push_message(Message::user(user_message_id, event.content.clone()));

        self.message_list.update(cx, |list, cx| {
            // The at-bottom check must precede the append it judges.
            list.note_user_message_appended(cx);
        });
        self.sync_panel_messages(cx);
        self.message_list.update(cx, |list, cx| {
            list.show_typing(cx);
        });
        self.message_input.update(cx, |input, cx| {
            input.set_awaiting_reply(true, cx);
        });

        let backend = Arc::clone(&self.backend);
        let reply_delay = self.reply_delay;
        let sent_text = event.content.clone();
        let worker = Tokio::spawn(cx, async move {
            tokio::time::sleep(reply_delay).await;
            backend.send_chat(ChatTurnRequest::new(sent_text)).await
        });

        let question = event.content;
        self.chat_task = Some(cx.spawn(async move |this, cx| {
            let outcome = match worker.await {
                Ok(Ok(reply)) => ExchangeOutcome::Reply {
                    text: reply.response,
                    learn: reply.learn,
                },
                Ok(Err(error)) => {
                    tracing::error!(error = %error, "chat exchange failed");
                    ExchangeOutcome::Failed {
                        message: describe_backend_error(&error),
                    }
                }
                Err(join_error) => {
                    tracing::error!(error = %join_error, "chat worker was interrupted");
                    ExchangeOutcome::Failed {
                        message: "The reply task was interrupted.".to_string(),
                    }
                }
            };

            let _ = this.update(cx, |this, cx| {
                this.handle_exchange_settled(exchange_id, question, outcome, cx);
            });
        }));

        cx.notify();
    }

    fn handle_exchange_settled(
        &mut self,
        exchange_id: ExchangeId,
        question: String,
        outcome: ExchangeOutcome,
        cx: &mut Context<Self>,
    ) {
        if !self.session.exchange_state.accepts_settlement(exchange_id) {
            // Strict equality keeps a cleared or superseded exchange from
            // mutating the panel.
            return;
        }

        let _ = self
            .session
            .apply_exchange_transition(outcome.transition(exchange_id));

        self.chat_task = None;
        self.message_list.update(cx, |list, cx| {
            list.remove_typing(cx);
        });
        self.message_input.update(cx, |input, cx| {
            input.set_awaiting_reply(false, cx);
        });

        match outcome {
            ExchangeOutcome::Reply { text, learn } => {
                let bot_message_id = self.alloc_message_id();
                self.session.push_message(Message::bot(bot_message_id, text));

                if learn {
                    if let Some(displaced) = self.session.set_pending_learn(question) {
                        tracing::debug!(
                            displaced = %displaced,
                            "newer unanswered question displaced the stored one"
                        );
                    }
                    self.open_learn_prompt(cx);
                }
            }
            ExchangeOutcome::Failed { message } => {
                let error_message_id = self.alloc_message_id();
                self.session.push_message(Message::bot_error(
                    error_message_id,
                    message,
                    "chat request failed",
                ));
            }
        }

        self.sync_panel_messages(cx);
        cx.notify();
    }

    fn open_learn_prompt(&mut self, cx: &mut Context<Self>) {
        let Some(question) = self.session.pending_learn().map(str::to_string) else {
            return;
        };

        self.learn_prompt.update(cx, |prompt, cx| {
            prompt.set_question(question, cx);
        });
        self.learn_prompt_open = true;
        cx.notify();
    }

    fn handle_learn_submitted(&mut self, event: LearnAnswerSubmitted, cx: &mut Context<Self>) {
        if self.learn_task.is_some() {
            return;
        }

        let Some(question) = self.session.take_pending_learn() else {
            tracing::warn!("teach-back submitted with no pending question");
            self.learn_prompt_open = false;
            cx.notify();
            return;
        };

        self.learn_prompt_open = false;

        let backend = Arc::clone(&self.backend);
        let submission = LearnSubmission::new(question, event.answer);
        let worker = Tokio::spawn(cx, async move { backend.submit_learning(submission).await });

        self.learn_task = Some(cx.spawn(async move |this, cx| {
            let outcome = match worker.await {
                Ok(Ok(reply)) => Ok(reply.response),
                Ok(Err(error)) => {
                    tracing::error!(error = %error, "teach-back submission failed");
                    Err(describe_backend_error(&error))
                }
                Err(join_error) => {
                    tracing::error!(error = %join_error, "teach-back worker was interrupted");
                    Err("The teach-back task was interrupted.".to_string())
                }
            };

            let _ = this.update(cx, |this, cx| {
                this.handle_learn_settled(outcome, cx);
            });
        }));

        cx.notify();
    }

    fn handle_learn_settled(&mut self, outcome: Result<String, String>, cx: &mut Context<Self>) {
        self.learn_task = None;

        let message_id = self.alloc_message_id();
        let message = match outcome {
            Ok(confirmation) => Message::bot(message_id, confirmation),
            Err(description) => {
                Message::bot_error(message_id, description, "learn request failed")
            }
        };
        self.session.push_message(message);

        self.sync_panel_messages(cx);
        cx.notify();
    }

    fn handle_learn_dismissed(&mut self, cx: &mut Context<Self>) {
        // Not an error: the question stays stored until the next learn
        // trigger overwrites it.
        self.learn_prompt_open = false;
        cx.notify();
    }

    fn sync_panel_messages(&mut self, cx: &mut Context<Self>) {
        let messages = self.session.messages.clone();
        self.message_list.update(cx, |list, cx| {
            list.sync_messages(messages, cx);
        });
    }

    fn alloc_message_id(&mut self) -> MessageId {
        let id = MessageId::new(self.next_message_id);
        self.next_message_id = self.next_message_id.saturating_add(1);
        id
    }

    fn alloc_exchange_id(&mut self) -> ExchangeId {
        let id = ExchangeId::new(self.next_exchange_id);
        self.next_exchange_id = self.next_exchange_id.saturating_add(1);
        id
    }
}

/// Maps transport failures to the sentence shown in the panel. Details stay
/// in the log; the panel gets something an operator can act on.
fn describe_backend_error(error: &BackendError) -> String {
    match error {
        BackendError::InvalidEndpoint { .. } => {
            "The bot service endpoint is not configured correctly.".to_string()
        }
        BackendError::RequestFailed { .. } => {
            "Could not reach the bot service. Check that it is running.".to_string()
        }
        BackendError::UnexpectedStatus { status, .. } => {
            format!("The bot service returned HTTP {status}.")
        }
        BackendError::MalformedReply { .. } => {
            "The bot service sent a reply this client could not read.".to_string()
        }
    }
}

impl Render for ChatView {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme();

        v_flex()
            .id("chat-view")
            .relative()
            .size_full()
            .min_h_0()
            .overflow_hidden()
            .bg(theme.background)
            .child(
                div()
                    .id("chat-view-message-list")
                    .flex_1()
                    .min_h_0()
                    .child(self.message_list.clone()),
            )
            .when(self.learn_prompt_open, |column| {
                column.child(self.learn_prompt.clone())
            })
            .child(
                div()
                    .id("chat-view-message-input")
                    .flex_shrink_0()
                    .w_full()
                    .border_t_1()
                    .border_color(theme.border)
                    .child(self.message_input.clone()),
            )
    }
}
