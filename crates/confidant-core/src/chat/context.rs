//! Short-term conversation memory.
//!
//! The full transcript is retained; the prompt only ever sees a window over
//! its tail, computed at read time.

use confidant_types::chat::{Speaker, Turn};

/// Append-only transcript with a bounded view.
#[derive(Debug, Clone, Default)]
pub struct ShortTermContext {
    turns: Vec<Turn>,
}

impl ShortTermContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The most recent `max_rounds * 2` turns, or all of them if fewer.
    ///
    /// A round is one user turn plus the agent turn that follows it.
    pub fn windowed(&self, max_rounds: usize) -> &[Turn] {
        let limit = max_rounds.saturating_mul(2);
        let start = self.turns.len().saturating_sub(limit);
        &self.turns[start..]
    }

    pub fn latest_user_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.speaker == Speaker::User)
    }

    /// Most recent user turn and most recent agent turn, each searched
    /// backwards independently.
    pub fn latest_exchange(&self) -> Option<(&Turn, &Turn)> {
        let agent = self.turns.iter().rev().find(|t| t.speaker == Speaker::Agent)?;
        let user = self.latest_user_turn()?;
        Some((user, agent))
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rounds(n: usize) -> ShortTermContext {
        let mut ctx = ShortTermContext::new();
        for i in 0..n {
            ctx.append(Turn::user(format!("u{i}")));
            ctx.append(Turn::agent(format!("a{i}")));
        }
        ctx
    }

    #[test]
    fn test_window_bounds_and_keeps_transcript() {
        let ctx = rounds(25);
        let window = ctx.windowed(20);
        assert_eq!(window.len(), 40);
        assert_eq!(window[0].text, "u5");
        assert_eq!(window[39].text, "a24");
        assert_eq!(ctx.len(), 50);
        assert_eq!(ctx.turns()[0].text, "u0");
    }

    #[test]
    fn test_window_returns_everything_when_short() {
        let ctx = rounds(3);
        assert_eq!(ctx.windowed(20).len(), 6);
        assert!(ctx.windowed(0).is_empty());
    }

    #[test]
    fn test_window_never_exceeds_twice_rounds() {
        for total in 0..12 {
            let ctx = rounds(total);
            for w in 0..8 {
                assert!(ctx.windowed(w).len() <= 2 * w);
                assert_eq!(ctx.windowed(w).len(), (2 * w).min(2 * total));
            }
        }
    }

    #[test]
    fn test_latest_exchange_searches_backwards() {
        let mut ctx = rounds(2);
        assert_eq!(ctx.latest_user_turn().unwrap().text, "u1");
        let (user, agent) = ctx.latest_exchange().unwrap();
        assert_eq!((user.text.as_str(), agent.text.as_str()), ("u1", "a1"));

        ctx.append(Turn::user("u2"));
        let (user, agent) = ctx.latest_exchange().unwrap();
        assert_eq!((user.text.as_str(), agent.text.as_str()), ("u2", "a1"));
    }

    #[test]
    fn test_empty_context() {
        let mut ctx = ShortTermContext::new();
        assert!(ctx.is_empty());
        assert!(ctx.latest_user_turn().is_none());
        assert!(ctx.latest_exchange().is_none());
        ctx.append(Turn::user("hello"));
        assert!(ctx.latest_exchange().is_none());
    }
}
