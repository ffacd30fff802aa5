//! Conversation-related types.

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// The person asking for support.
    User,
    /// The assistant.
    Assistant,
    /// A session-level notice (escalations, resolutions).
    System,
}

/// Metadata attached to an assistant message at finalization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    /// The classified intent.
    pub intent: Option<String>,
    /// The classification confidence.
    pub confidence: Option<f64>,
    /// The ticket this message belongs to.
    pub ticket_id: Option<String>,
    /// Whether the backend escalated the ticket.
    pub needs_human: bool,
    /// The ticket status after this turn.
    pub status: Option<String>,
}

/// One turn in the visible transcript.
#[derive(Clone, Debug)]
pub struct Message {
    pub(crate) id: u64,
    pub(crate) role: Role,
    pub(crate) content: String,
    pub(crate) streaming: bool,
    pub(crate) metadata: Option<Metadata>,
}

impl Message {
    /// Returns the author of this message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text content of this message.
    ///
    /// While the message is streaming, this is the concatenation of
    /// the tokens received so far.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns whether this message is still receiving tokens.
    #[inline]
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Returns the metadata attached at finalization, if any.
    #[inline]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }
}

/// The resolution confirmation offered to the user after a turn.
///
/// This is interactive state, not conversational history, so it
/// lives next to the message list instead of inside it. At most one
/// pending action exists at a time; a new submission supersedes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingAction {
    /// The ticket a resolution would be reported for.
    pub ticket_id: Option<String>,
}

/// The ticket-level continuation context.
///
/// A non-null ticket id means the next user turn is a follow-up on
/// that ticket; `None` means the next turn opens a new one.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub(crate) active_ticket_id: Option<String>,
}

impl Session {
    /// Returns the ticket the session is currently following up on.
    #[inline]
    pub fn active_ticket_id(&self) -> Option<&str> {
        self.active_ticket_id.as_deref()
    }
}

/// The visible conversation state: the message list plus the
/// optional pending action.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    pending: Option<PendingAction>,
    next_id: u64,
}

impl Transcript {
    /// Returns the messages in this transcript.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the pending resolution confirmation, if any.
    #[inline]
    pub fn pending_action(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub(crate) fn push(
        &mut self,
        role: Role,
        content: impl Into<String>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            role,
            content: content.into(),
            streaming: false,
            metadata: None,
        });
        id
    }

    /// Appends an empty assistant message that is about to receive
    /// tokens, and returns its correlation key.
    pub(crate) fn begin_streaming(&mut self) -> u64 {
        debug_assert!(
            self.messages.iter().all(|m| !m.streaming),
            "only one in-flight message is allowed per session"
        );
        let id = self.push(Role::Assistant, "");
        self.messages
            .last_mut()
            .expect("the message was just pushed")
            .streaming = true;
        id
    }

    pub(crate) fn append_content(&mut self, key: u64, token: &str) {
        if let Some(msg) = self.message_mut(key) {
            msg.content.push_str(token);
        }
    }

    /// Finalizes the message with the given correlation key. A
    /// `Some` content replaces whatever was accumulated.
    pub(crate) fn finalize(
        &mut self,
        key: u64,
        content: Option<String>,
        metadata: Option<Metadata>,
    ) {
        let Some(msg) = self.message_mut(key) else {
            return;
        };
        msg.streaming = false;
        if let Some(content) = content {
            msg.content = content;
        }
        msg.metadata = metadata;
    }

    pub(crate) fn set_pending(&mut self, action: PendingAction) {
        self.pending = Some(action);
    }

    pub(crate) fn take_pending(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    pub(crate) fn clear_pending(&mut self) {
        self.pending = None;
    }

    fn message_mut(&mut self, key: u64) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == key)
    }
}
