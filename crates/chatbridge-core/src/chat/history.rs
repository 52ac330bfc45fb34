//! Bounded chat history window.
//!
//! `ChatHistory` keeps the most recent `capacity` turns in chronological
//! order and evicts the oldest first. An optional initial turn (usually the
//! system instruction) sits outside the window and is never evicted.

use std::collections::VecDeque;

use chatbridge_types::chat::ChatTurn;
use chatbridge_types::llm::Message;

#[derive(Debug, Clone)]
pub struct ChatHistory {
    capacity: usize,
    initial: Option<ChatTurn>,
    turns: VecDeque<ChatTurn>,
}

impl ChatHistory {
    /// Create an empty history keeping at most `capacity` turns.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            initial: None,
            turns: VecDeque::with_capacity(capacity),
        }
    }

    /// Set the permanent first turn.
    pub fn initialize(&mut self, turn: ChatTurn) {
        self.initial = Some(turn);
    }

    /// Append a turn, evicting the oldest ones beyond capacity.
    pub fn append(&mut self, turn: ChatTurn) {
        self.turns.push_back(turn);
        while self.turns.len() > self.capacity {
            self.turns.pop_front();
        }
    }

    pub fn initial(&self) -> Option<&ChatTurn> {
        self.initial.as_ref()
    }

    /// Turns currently in the window, oldest first.
    pub fn turns(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter()
    }

    /// Number of turns in the window (the initial turn is not counted).
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Context that stays visible once one more turn is appended.
    ///
    /// This is the initial turn plus the newest `capacity - 1` turns, i.e.
    /// the window as it will look after the next turn evicts the oldest.
    pub fn context_for_next_turn(&self) -> Vec<Message> {
        let keep = self.capacity - 1;
        let skip = self.turns.len().saturating_sub(keep);
        self.initial
            .iter()
            .chain(self.turns.iter().skip(skip))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbridge_types::llm::MessageRole;

    fn turn(i: usize) -> ChatTurn {
        ChatTurn::new(MessageRole::User, format!("turn {i}"))
    }

    #[test]
    fn test_append_within_capacity() {
        let mut history = ChatHistory::new(3);
        history.append(turn(1));
        history.append(turn(2));
        assert_eq!(history.len(), 2);
        let contents: Vec<_> = history.turns().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["turn 1", "turn 2"]);
    }

    #[test]
    fn test_append_beyond_capacity_keeps_most_recent() {
        let mut history = ChatHistory::new(3);
        for i in 1..=10 {
            history.append(turn(i));
        }
        assert_eq!(history.len(), 3);
        let contents: Vec<_> = history.turns().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["turn 8", "turn 9", "turn 10"]);
    }

    #[test]
    fn test_initial_turn_is_never_evicted() {
        let mut history = ChatHistory::new(2);
        history.initialize(ChatTurn::system("be brief"));
        for i in 1..=5 {
            history.append(turn(i));
        }
        assert_eq!(history.len(), 2);
        let initial = history.initial().unwrap();
        assert_eq!(initial.role, MessageRole::System);
        assert_eq!(initial.content, "be brief");
        let contents: Vec<_> = history.turns().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["turn 4", "turn 5"]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut history = ChatHistory::new(0);
        history.append(turn(1));
        history.append(turn(2));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_context_for_next_turn_with_single_slot() {
        let mut history = ChatHistory::new(1);
        history.initialize(ChatTurn::system("sys"));
        history.append(turn(1));
        let context = history.context_for_next_turn();
        assert_eq!(context.len(), 1);
        assert_eq!(context[0].content, "sys");
    }

    #[test]
    fn test_context_for_next_turn_keeps_newest() {
        let mut history = ChatHistory::new(3);
        for i in 1..=4 {
            history.append(turn(i));
        }
        let context = history.context_for_next_turn();
        let contents: Vec<_> = context.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["turn 3", "turn 4"]);
    }
}
