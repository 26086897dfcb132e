//! Session state: the connection slot and the chat history.

use serde::Serialize;

use crate::connection::ConnectionManager;
use crate::llm::Message;

/// One question and, once the turn completed, its answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    /// The question as typed.
    pub question: String,
    /// The answer; absent when the turn failed.
    pub answer: Option<String>,
}

impl Turn {
    /// Returns true if the turn produced an answer.
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

/// State for one running instance of the program.
///
/// Turns are append-only. The only mutation of an existing turn is filling
/// in its answer, exactly once.
pub struct Session {
    connections: ConnectionManager,
    turns: Vec<Turn>,
}

impl Session {
    /// Creates an empty, disconnected session.
    pub fn new(connections: ConnectionManager) -> Self {
        Self {
            connections,
            turns: Vec::new(),
        }
    }

    /// The connection slot.
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// The connection slot, for connecting or replacing.
    pub fn connections_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connections
    }

    /// All turns in arrival order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Appends a new unanswered turn and returns its index.
    pub fn record_question(&mut self, question: impl Into<String>) -> usize {
        self.turns.push(Turn {
            question: question.into(),
            answer: None,
        });
        self.turns.len() - 1
    }

    /// Fills in the answer of the turn at `index`.
    ///
    /// Does nothing if the turn does not exist or already has an answer.
    pub fn attach_answer(&mut self, index: usize, answer: impl Into<String>) {
        if let Some(turn) = self.turns.get_mut(index) {
            if turn.answer.is_none() {
                turn.answer = Some(answer.into());
            }
        }
    }

    /// The history as chat messages: each question, then its answer if any.
    pub fn messages(&self) -> Vec<Message> {
        self.turns
            .iter()
            .flat_map(|turn| {
                std::iter::once(Message::user(&turn.question))
                    .chain(turn.answer.as_deref().map(Message::assistant))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    fn session() -> Session {
        Session::new(ConnectionManager::new(3))
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = session();
        assert!(session.turns().is_empty());
        assert!(!session.connections().is_connected());
    }

    #[test]
    fn test_record_and_answer() {
        let mut session = session();
        let first = session.record_question("how many albums we have in database");
        let second = session.record_question("how many artists?");

        session.attach_answer(first, "There are 347 albums in the database.");

        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert!(session.turns()[0].is_answered());
        assert!(!session.turns()[1].is_answered());
    }

    #[test]
    fn test_answer_is_set_once() {
        let mut session = session();
        let idx = session.record_question("q");

        session.attach_answer(idx, "first");
        session.attach_answer(idx, "second");
        session.attach_answer(42, "nowhere");

        assert_eq!(session.turns()[idx].answer.as_deref(), Some("first"));
        assert_eq!(session.turns().len(), 1);
    }

    #[test]
    fn test_messages_skip_missing_answers() {
        let mut session = session();
        let a = session.record_question("q1");
        session.attach_answer(a, "a1");
        session.record_question("q2");

        let messages = session.messages();
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();

        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(messages[2].content, "q2");
    }
}
