// Host-side integration tests for the generation collaborator: prompt
// plumbing, structured replies, video polling and quiz rounds.

use async_trait::async_trait;
use awasser_core::generation::*;
use awasser_core::quiz::{AnswerOutcome, QuizRound};
use awasser_core::video::*;
use awasser_core::{Error, Result};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

/// Scripted service. Polls pop from `polls`; an empty script keeps reporting pending.
#[derive(Default)]
struct ScriptedService {
    text_prompts: RefCell<Vec<String>>,
    structured: RefCell<Option<Value>>,
    saw_image: RefCell<Option<InlineImage>>,
    polls: RefCell<VecDeque<OperationStatus>>,
    poll_count: RefCell<u32>,
    /// Polls that fail to reach the service before the script is consulted.
    unreachable_polls: RefCell<u32>,
    reject_submit: bool,
}

#[async_trait(?Send)]
impl GenerationService for ScriptedService {
    async fn complete_text(&self, prompt: &str) -> Result<String> {
        self.text_prompts.borrow_mut().push(prompt.to_string());
        Ok("A quiet courtyard remembers.".to_string())
    }

    async fn complete_structured(
        &self,
        _prompt: &str,
        _schema: &Value,
        image: Option<&InlineImage>,
    ) -> Result<Value> {
        *self.saw_image.borrow_mut() = image.cloned();
        self.structured
            .borrow()
            .clone()
            .ok_or_else(|| Error::Generation("no reply scripted".into()))
    }

    async fn edit_image(&self, source: &InlineImage, _instruction: &str) -> Result<String> {
        Ok(source.to_data_url())
    }

    async fn synthesize_speech(&self, _text: &str) -> Result<String> {
        Ok(String::new())
    }

    async fn submit_video(&self, _source: &InlineImage, _prompt: &str) -> Result<String> {
        if self.reject_submit {
            return Err(Error::Generation("quota exceeded".into()));
        }
        Ok("operations/42".to_string())
    }

    async fn poll_video(&self, operation: &str) -> Result<OperationStatus> {
        assert_eq!(operation, "operations/42");
        *self.poll_count.borrow_mut() += 1;
        let mut unreachable = self.unreachable_polls.borrow_mut();
        if *unreachable > 0 {
            *unreachable -= 1;
            return Err(Error::Generation("HTTP 503: unavailable".into()));
        }
        Ok(self
            .polls
            .borrow_mut()
            .pop_front()
            .unwrap_or(OperationStatus::Pending))
    }
}

fn scripted_polls(polls: Vec<OperationStatus>) -> ScriptedService {
    ScriptedService {
        polls: RefCell::new(polls.into()),
        ..ScriptedService::default()
    }
}

fn run_video(service: &ScriptedService) -> (Result<String>, Vec<Duration>) {
    let delays = RefCell::new(Vec::new());
    let frame = InlineImage::jpeg("AAAA");
    let result = pollster::block_on(synthesize_video(
        service,
        &frame,
        &reimagining_prompt("Kasbah"),
        PollPolicy::default(),
        |d| {
            delays.borrow_mut().push(d);
            std::future::ready(())
        },
    ));
    (result, delays.into_inner())
}

#[test]
fn video_ready_after_pending_polls() {
    let service = scripted_polls(vec![
        OperationStatus::Pending,
        OperationStatus::Pending,
        OperationStatus::Done {
            uri: Some("https://video/1".into()),
        },
    ]);
    let (result, delays) = run_video(&service);
    assert_eq!(result.unwrap(), "https://video/1");
    let secs: Vec<f64> = delays.iter().map(Duration::as_secs_f64).collect();
    assert_eq!(secs, vec![2.0, 4.0, 8.0]);
}

#[test]
fn video_times_out_after_max_polls() {
    let service = ScriptedService::default();
    let (result, delays) = run_video(&service);
    match result {
        Err(Error::VideoTimedOut { attempts }) => assert_eq!(attempts, 12),
        other => panic!("expected timeout, got {:?}", other),
    }
    assert_eq!(*service.poll_count.borrow(), 12);
    assert_eq!(delays.len(), 12);
    assert_eq!(delays[3], Duration::from_secs(16));
    assert!(delays[4..].iter().all(|d| *d == Duration::from_secs(30)));
}

#[test]
fn video_survives_a_failed_poll() {
    let service = scripted_polls(vec![OperationStatus::Done {
        uri: Some("https://video/2".into()),
    }]);
    *service.unreachable_polls.borrow_mut() = 1;
    let (result, delays) = run_video(&service);
    assert_eq!(result.unwrap(), "https://video/2");
    assert_eq!(*service.poll_count.borrow(), 2);
    // The failed poll still advances the backoff.
    assert_eq!(delays, vec![Duration::from_secs(2), Duration::from_secs(4)]);
}

#[test]
fn video_fails_when_every_poll_fails() {
    let service = ScriptedService::default();
    *service.unreachable_polls.borrow_mut() = 100;
    let (result, delays) = run_video(&service);
    match result {
        Err(Error::Generation(msg)) => assert!(msg.contains("HTTP 503"), "{}", msg),
        other => panic!("expected the last poll error, got {:?}", other),
    }
    assert_eq!(*service.poll_count.borrow(), 12);
    assert_eq!(delays.len(), 12);
}

#[test]
fn poll_errors_count_toward_the_cap() {
    let policy = PollPolicy {
        max_attempts: 3,
        ..PollPolicy::default()
    };
    let mut job = VideoJob::submitted("operations/7", policy);
    job.record_poll_error("reset");
    job.record(OperationStatus::Pending);
    assert!(matches!(job.state(), VideoJobState::Polling { attempt: 2, .. }));
    job.record_poll_error("reset again");
    assert_eq!(
        job.state(),
        &VideoJobState::Failed {
            reason: VideoFailure::Remote("reset again".into())
        }
    );
    assert_eq!(job.next_delay(), None);
    job.record_poll_error("late");
    assert_eq!(job.polls(), 3);
}

#[test]
fn video_remote_error_and_missing_uri_fail() {
    let service = scripted_polls(vec![OperationStatus::Error("safety filter".into())]);
    match run_video(&service).0 {
        Err(Error::Generation(msg)) => assert_eq!(msg, "safety filter"),
        other => panic!("expected remote failure, got {:?}", other),
    }

    let service = scripted_polls(vec![OperationStatus::Done { uri: None }]);
    assert!(matches!(run_video(&service).0, Err(Error::Generation(_))));
}

#[test]
fn rejected_submission_never_polls() {
    let service = ScriptedService {
        reject_submit: true,
        ..ScriptedService::default()
    };
    let (result, delays) = run_video(&service);
    assert!(result.is_err());
    assert!(delays.is_empty());
    assert_eq!(*service.poll_count.borrow(), 0);
}

#[test]
fn backoff_doubles_then_caps() {
    let policy = PollPolicy::default();
    assert_eq!(policy.delay_for(0), Duration::from_secs(2));
    assert_eq!(policy.delay_for(1), Duration::from_secs(4));
    assert_eq!(policy.delay_for(4), Duration::from_secs(30));
    assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(30));
}

#[test]
fn terminal_job_ignores_further_status() {
    let mut job = VideoJob::submitted("op", PollPolicy::default());
    assert_eq!(job.operation(), Some("op"));
    job.record(OperationStatus::Pending);
    assert_eq!(
        job.state(),
        &VideoJobState::Polling {
            operation: "op".into(),
            attempt: 1
        }
    );
    job.record(OperationStatus::Done {
        uri: Some("u".into()),
    });
    assert!(job.is_terminal());
    assert_eq!(job.next_delay(), None);

    job.record(OperationStatus::Error("late".into()));
    assert_eq!(job.state(), &VideoJobState::Ready { uri: "u".into() });
    assert_eq!(job.polls(), 2);
}

#[test]
fn download_uri_appends_key() {
    assert_eq!(
        downloadable_uri("https://v/file", "k1"),
        "https://v/file?key=k1"
    );
    assert_eq!(
        downloadable_uri("https://v/file?alt=media", "k1"),
        "https://v/file?alt=media&key=k1"
    );
}

#[test]
fn insight_prompt_names_site_and_artwork() {
    let service = ScriptedService::default();
    let text = pollster::block_on(cultural_insight(&service, "Old Medina", "Echoes")).unwrap();
    assert!(!text.is_empty());
    let prompts = service.text_prompts.borrow();
    assert!(prompts[0].contains("\"Old Medina\""));
    assert!(prompts[0].contains("\"Echoes\""));
}

#[test]
fn guide_rejects_blank_question() {
    let service = ScriptedService::default();
    assert!(pollster::block_on(ask_guide(&service, "   ", "ctx")).is_err());
    assert!(service.text_prompts.borrow().is_empty());

    pollster::block_on(ask_guide(&service, " Who built it? ", "Kasbah walls")).unwrap();
    assert_eq!(
        service.text_prompts.borrow()[0],
        "Context: Kasbah walls\n\nVisitor Question: Who built it?"
    );
}

#[test]
fn landmark_scan_sends_frame() {
    let service = ScriptedService {
        structured: RefCell::new(Some(json!({
            "recognized": true,
            "landmark": "Hassan Tower",
            "history": "Unfinished minaret",
            "suggestedTheme": "Incomplete Futures"
        }))),
        ..ScriptedService::default()
    };
    let frame = InlineImage::jpeg("Zm9v");
    let report = pollster::block_on(identify_landmark(&service, &frame)).unwrap();
    assert!(report.recognized);
    assert_eq!(report.suggested_theme, "Incomplete Futures");
    assert_eq!(service.saw_image.borrow().as_ref(), Some(&frame));
}

#[test]
fn unrecognized_landmark_decodes_with_defaults() {
    let report = decode_landmark(json!({ "recognized": false })).unwrap();
    assert!(!report.recognized);
    assert!(report.landmark.is_empty());
    assert!(matches!(decode_landmark(json!("nope")), Err(Error::Schema(_))));
}

fn question(options: &[&str], correct: usize) -> Value {
    json!({
        "question": "Which dynasty?",
        "options": options,
        "correctAnswer": correct,
        "explanation": "Carved in 1199."
    })
}

#[test]
fn quiz_with_out_of_range_answer_is_rejected() {
    let reply = json!([question(&["a", "b"], 0), question(&["a", "b"], 2)]);
    assert!(matches!(decode_quiz(reply), Err(Error::Schema(_))));
}

#[test]
fn site_quiz_decodes_questions() {
    let service = ScriptedService {
        structured: RefCell::new(Some(json!([
            question(&["Almohad", "Merinid", "Saadian"], 0),
            question(&["yes", "no"], 1)
        ]))),
        ..ScriptedService::default()
    };
    let quiz = pollster::block_on(site_quiz(&service, "Rabat", "Tower", "stone")).unwrap();
    assert_eq!(quiz.len(), 2);
    assert_eq!(quiz[1].correct_answer, 1);
    assert!(service.saw_image.borrow().is_none());
}

#[test]
fn quiz_round_scores_one_answer_per_question() {
    let questions = decode_quiz(json!([
        question(&["a", "b", "c"], 2),
        question(&["a", "b"], 0)
    ]))
    .unwrap();
    let mut round = QuizRound::new(questions);

    // Advancing before answering stays put.
    assert!(!round.advance());
    assert_eq!(round.index(), 0);

    assert_eq!(round.answer(9), AnswerOutcome::Ignored);
    assert_eq!(round.answer(2), AnswerOutcome::Correct);
    assert_eq!(round.answer(0), AnswerOutcome::Ignored);
    assert_eq!(round.score(), 1);
    assert!(!round.advance());

    assert_eq!(round.answer(1), AnswerOutcome::Incorrect { correct: 0 });
    assert_eq!(round.answered(), Some(1));
    assert!(round.advance());
    assert!(round.is_finished());
    assert_eq!(round.current(), None);
    assert_eq!(round.answer(0), AnswerOutcome::Ignored);
    assert_eq!(round.score(), 1);
}

#[test]
fn data_urls_round_trip_through_inline_images() {
    let image = InlineImage::from_data_url("data:image/png;base64,iVBORw0").unwrap();
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.data, "iVBORw0");
    assert_eq!(image.to_data_url(), "data:image/png;base64,iVBORw0");
    assert_eq!(InlineImage::from_data_url("iVBORw0"), None);
}
