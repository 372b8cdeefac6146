use retail_chat_core::{
    chart, ChatMessage, DisclosureState, MessageId, PendingReply, SubmissionController,
};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Question input
    pub input: String,
    pub cursor: usize,

    // Conversation
    pub controller: SubmissionController,
    pub pending: Option<PendingReply>,
    pub disclosure: DisclosureState,
    /// Assistant message whose disclosure and charts the keys act on.
    pub selected: Option<MessageId>,
    pub api_base_url: String,

    // Transcript viewport
    pub scroll: u16,
    pub chat_height: u16, // Inner height of the transcript, set on render
    pub chat_width: u16,  // Inner width, used for wrap estimates
    /// Snap to the newest row on the next render, once the layout is known.
    pub follow_bottom: bool,

    // Typing indicator frame (0..3)
    pub animation_frame: u8,

    revisions: watch::Receiver<u64>,
}

impl App {
    pub fn new(controller: SubmissionController, api_base_url: &str) -> Self {
        let revisions = controller.conversation().subscribe();
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            input: String::new(),
            cursor: 0,

            controller,
            pending: None,
            disclosure: DisclosureState::new(),
            selected: None,
            api_base_url: api_base_url.to_string(),

            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_bottom: false,

            animation_frame: 0,

            revisions,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.controller.conversation().messages()
    }

    pub fn is_awaiting(&self) -> bool {
        self.controller.conversation().is_awaiting()
    }

    /// Whether Enter would send right now.
    pub fn can_send(&self) -> bool {
        !self.is_awaiting() && !self.input.trim().is_empty()
    }

    /// Send the typed question. The input is only cleared when accepted.
    pub fn submit_input(&mut self) -> bool {
        if !self.can_send() {
            return false;
        }
        let text = self.input.clone();
        if self.ask(&text) {
            self.input.clear();
            self.cursor = 0;
            true
        } else {
            false
        }
    }

    /// Send the greeting's suggestion at `index` (zero based).
    pub fn submit_suggestion(&mut self, index: usize) -> bool {
        let Some(text) = self.controller.conversation().suggestions().get(index).cloned() else {
            return false;
        };
        self.ask(&text)
    }

    fn ask(&mut self, text: &str) -> bool {
        match self.controller.spawn(text) {
            Some(pending) => {
                self.pending = Some(pending);
                true
            }
            None => false,
        }
    }

    /// Fold a finished reply task back into the conversation.
    pub async fn poll_pending(&mut self) {
        if !self.pending.as_ref().is_some_and(PendingReply::is_finished) {
            return;
        }
        if let Some(pending) = self.pending.take() {
            let (ticket, outcome) = pending.join().await;
            self.controller.finish(ticket, outcome);
            self.selected = self.messages().last().map(|m| m.id);
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_awaiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        } else {
            self.animation_frame = 0;
        }
    }

    /// Jump to the newest row whenever the conversation changed. The render
    /// pass repeats the jump because a new answer can resize the transcript.
    pub fn sync_scroll(&mut self) {
        if self.revisions.has_changed().unwrap_or(false) {
            self.revisions.borrow_and_update();
            self.scroll_to_bottom();
            self.follow_bottom = true;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        let total = crate::ui::transcript_height(self, self.wrap_width());
        let visible = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.scroll = total.saturating_sub(visible);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        let total = crate::ui::transcript_height(self, self.wrap_width());
        let max = total.saturating_sub(self.chat_height.max(1));
        self.scroll = self.scroll.saturating_add(rows).min(max);
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.scroll = self.scroll.saturating_sub(rows);
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    fn wrap_width(&self) -> usize {
        // Default to 50 before the first render
        if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        }
    }

    fn assistant_ids(&self) -> Vec<MessageId> {
        self.messages()
            .iter()
            .filter(|m| m.is_assistant())
            .map(|m| m.id)
            .collect()
    }

    pub fn select_next(&mut self) {
        let ids = self.assistant_ids();
        self.selected = match self.selected.and_then(|id| ids.iter().position(|i| *i == id)) {
            Some(pos) if pos + 1 < ids.len() => Some(ids[pos + 1]),
            Some(pos) => Some(ids[pos]),
            None => ids.first().copied(),
        };
    }

    pub fn select_prev(&mut self) {
        let ids = self.assistant_ids();
        self.selected = match self.selected.and_then(|id| ids.iter().position(|i| *i == id)) {
            Some(pos) => Some(ids[pos.saturating_sub(1)]),
            None => ids.last().copied(),
        };
    }

    /// Message shown in the chart pane: the selection, else the newest answer.
    pub fn focused_message(&self) -> Option<&ChatMessage> {
        let conversation = self.controller.conversation();
        self.selected
            .and_then(|id| conversation.get(id))
            .or_else(|| self.messages().iter().rev().find(|m| m.is_assistant()))
    }

    /// Whether the focused message has anything for the chart pane.
    pub fn has_charts(&self) -> bool {
        self.focused_message()
            .is_some_and(|m| !chart::renderable(&m.chart_data).is_empty())
    }

    pub fn toggle_disclosure(&mut self) -> Option<bool> {
        let id = self.selected?;
        let message = self.controller.conversation().get(id)?;
        self.disclosure.toggle(message)
    }
}
