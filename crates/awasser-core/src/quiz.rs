//! One pass through a generated site quiz.

use crate::generation::QuizQuestion;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect { correct: usize },
    /// Already answered, out of range, or the round is over.
    Ignored,
}

#[derive(Clone, Debug, Default)]
pub struct QuizRound {
    questions: Vec<QuizQuestion>,
    index: usize,
    score: usize,
    answered: Option<usize>,
}

impl QuizRound {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.index)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answered(&self) -> Option<usize> {
        self.answered
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.questions.len()
    }

    /// One answer per question; later picks are ignored until `advance`.
    pub fn answer(&mut self, option: usize) -> AnswerOutcome {
        if self.answered.is_some() {
            return AnswerOutcome::Ignored;
        }
        let Some(q) = self.current() else {
            return AnswerOutcome::Ignored;
        };
        if option >= q.options.len() {
            return AnswerOutcome::Ignored;
        }
        let correct = q.correct_answer;
        self.answered = Some(option);
        if option == correct {
            self.score += 1;
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect { correct }
        }
    }

    /// Move past an answered question. Returns `true` when the round is over.
    pub fn advance(&mut self) -> bool {
        if self.answered.take().is_some() {
            self.index += 1;
        }
        self.is_finished()
    }
}
