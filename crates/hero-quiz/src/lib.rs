#![deny(warnings)]

//! Question generation and the practice-session state machine.
//!
//! Randomness is always injected. Sessions own a seeded `ChaCha8Rng` so a run
//! can be replayed from its seed.

use hero_core::{MentorEvent, Question, TableId, LAST_TABLE, TOTAL_QUESTIONS};
use hero_progress::rate_session;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Largest distance between a distractor and the correct answer, before widening.
pub const MAX_OFFSET: u32 = 5;
/// Consecutive rejected distractors after which sampling stops and the
/// remaining slots are filled deterministically.
pub const FILL_AFTER: u32 = 32;
/// Correct answers in a row that earn a praise message.
pub const PRAISE_STREAK: u32 = 3;

/// Build one question for `table` with four shuffled answer choices.
///
/// Numeric tables fix one factor to the table and draw the other from 1..=10,
/// swapping the display order half of the time. The mixed challenge draws both
/// factors from 2..=10. Distractors are sampled within ±5 of the answer. After
/// 32 rejections in a row the rest are taken from correct+1, correct-1,
/// correct+2, ... so generation terminates for any `rng`.
pub fn generate_question<R: Rng>(table: TableId, rng: &mut R) -> Question {
    let (factor_a, factor_b) = match table {
        TableId::Mixed => (rng.gen_range(2..=10), rng.gen_range(2..=10)),
        TableId::Number(n) => {
            let fixed = u32::from(n.clamp(1, LAST_TABLE));
            let other = rng.gen_range(1..=10);
            if rng.gen_bool(0.5) {
                (other, fixed)
            } else {
                (fixed, other)
            }
        }
    };
    let correct = factor_a * factor_b;

    let mut options = [correct; 4];
    let mut filled = 1;
    let mut misses = 0;
    while filled < options.len() && misses < FILL_AFTER {
        let offset = rng.gen_range(1..=MAX_OFFSET);
        let candidate = if rng.gen_bool(0.5) {
            correct.checked_add(offset)
        } else {
            correct.checked_sub(offset)
        };
        match candidate {
            Some(c) if c > 0 && !options[..filled].contains(&c) => {
                options[filled] = c;
                filled += 1;
                misses = 0;
            }
            _ => misses += 1,
        }
    }
    if filled < options.len() {
        debug!(correct, filled, "sampling stalled, filling distractors in order");
        fill_nearest(&mut options, filled);
    }
    options.shuffle(rng);

    Question {
        factor_a,
        factor_b,
        correct_answer: correct,
        options,
    }
}

/// Fill `options[filled..]` with the nearest positive values around
/// `options[0]` that are not already present.
fn fill_nearest(options: &mut [u32; 4], mut filled: usize) {
    let correct = options[0];
    let mut distance = 1u32;
    while filled < options.len() {
        for candidate in [correct.checked_add(distance), correct.checked_sub(distance)] {
            match candidate {
                Some(c) if c > 0 && filled < options.len() && !options[..filled].contains(&c) => {
                    options[filled] = c;
                    filled += 1;
                }
                _ => {}
            }
        }
        distance += 1;
    }
}

/// Errors produced by session actions.
#[derive(Debug, Error, PartialEq)]
pub enum QuizError {
    #[error("question {0} was already answered")]
    AlreadyAnswered(u32),
    #[error("question {0} has not been answered yet")]
    NotAnswered(u32),
    #[error("session is over, no more questions")]
    Finished,
    #[error("session still running: {answered} of {total} answered")]
    InProgress { answered: u32, total: u32 },
}

/// Result of answering the current question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_answer: u32,
    /// Correct answers in a row, including this one.
    pub streak: u32,
    /// Mentor message worth requesting for this answer, if any.
    pub cue: Option<MentorEvent>,
}

/// Final tally of a session, ready for the progression engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SessionResult {
    pub table: TableId,
    pub score: u32,
    pub total: u32,
    pub stars: u8,
}

/// A fixed run of questions on one table.
pub struct PracticeSession {
    table: TableId,
    rng: ChaCha8Rng,
    total: u32,
    index: u32,
    score: u32,
    streak: u32,
    question: Question,
    answered: bool,
}

impl PracticeSession {
    /// Start a ten-question session with a seeded generator.
    pub fn new(table: TableId, seed: u64) -> Self {
        Self::with_rng(table, ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn with_rng(table: TableId, mut rng: ChaCha8Rng) -> Self {
        let question = generate_question(table, &mut rng);
        Self {
            table,
            rng,
            total: TOTAL_QUESTIONS,
            index: 0,
            score: 0,
            streak: 0,
            question,
            answered: false,
        }
    }

    pub fn table(&self) -> TableId {
        self.table
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    /// 1-based position of the current question.
    pub fn number(&self) -> u32 {
        self.index + 1
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// True once the last question has been answered.
    pub fn is_finished(&self) -> bool {
        self.answered && self.index + 1 >= self.total
    }

    /// Answer the current question. Each question accepts one answer.
    pub fn answer(&mut self, value: u32) -> Result<AnswerFeedback, QuizError> {
        if self.answered {
            return Err(QuizError::AlreadyAnswered(self.number()));
        }
        self.answered = true;
        let q = &self.question;
        let correct = value == q.correct_answer;
        let cue = if correct {
            self.score += 1;
            self.streak += 1;
            (self.streak % PRAISE_STREAK == 0).then(|| MentorEvent::Correct {
                question: q.to_string(),
            })
        } else {
            self.streak = 0;
            Some(MentorEvent::Mistake {
                question: q.to_string(),
                answer: value,
                correct_answer: q.correct_answer,
            })
        };
        debug!(
            number = self.index + 1,
            question = %q,
            value,
            correct,
            streak = self.streak,
            "answer checked"
        );
        Ok(AnswerFeedback {
            correct,
            correct_answer: q.correct_answer,
            streak: self.streak,
            cue,
        })
    }

    /// Move on to the next question.
    pub fn advance(&mut self) -> Result<&Question, QuizError> {
        if !self.answered {
            return Err(QuizError::NotAnswered(self.number()));
        }
        if self.is_finished() {
            return Err(QuizError::Finished);
        }
        self.index += 1;
        self.answered = false;
        self.question = generate_question(self.table, &mut self.rng);
        Ok(&self.question)
    }

    /// Close the session and rate it.
    pub fn finish(self) -> Result<SessionResult, QuizError> {
        if !self.is_finished() {
            let answered = self.index + u32::from(self.answered);
            return Err(QuizError::InProgress {
                answered,
                total: self.total,
            });
        }
        Ok(SessionResult {
            table: self.table,
            score: self.score,
            total: self.total,
            stars: rate_session(self.score, self.total),
        })
    }
}
