//! AR viewer for one artwork: studio/camera modes, narration, the spatial
//! stage and the generative panels (insight, scan, reimagine, guide, live,
//! quiz).
//!
//! Every resource with an external lifetime lives in the shared
//! [`ViewerSession`]. Closures only hold a `Weak` reference to it, so the
//! [`Viewer`] is its sole owner and dropping the viewer tears it down.

use crate::audio::WebAudio;
use crate::camera::{self, MediaCamera};
use crate::config::AppConfig;
use crate::constants::*;
use crate::dom::{self, Listener};
use crate::events;
use crate::input::parse_slider;
use crate::live::WebLiveSession;
use crate::overlay;
use crate::services::GeminiClient;
use crate::visualizer::SpectrumView;
use awasser_core::content::Artwork;
use awasser_core::generation::{
    self, GenerationService, InlineImage, LandmarkReport, QuizQuestion,
};
use awasser_core::pcm::{decode_base64_pcm, DecodedPcm};
use awasser_core::quiz::{AnswerOutcome, QuizRound};
use awasser_core::video::{downloadable_uri, PollPolicy};
use awasser_core::view::{LoadState, Loader, ToggleAction};
use awasser_core::{
    drag_rotation, CameraStream, Error, StageStart, ViewMode, ViewerSession, NARRATION_SAMPLE_RATE,
};
use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

type Session = ViewerSession<WebAudio>;

/// Collaborators handed to a viewer when it opens.
#[derive(Clone)]
pub struct ViewerDeps {
    pub config: Rc<AppConfig>,
    pub generation: Option<Rc<GeminiClient>>,
}

#[derive(Default)]
struct Panels {
    insight: Loader<String>,
    narration: Loader<DecodedPcm>,
    scan: Loader<LandmarkReport>,
    reimagine: Loader<String>,
    variant: Loader<String>,
    guide: Loader<String>,
    quiz: Loader<Vec<QuizQuestion>>,
    round: Option<QuizRound>,
    /// Last camera frame sent for a scan; the reimagining panels reuse it.
    frame: Option<InlineImage>,
}

impl Panels {
    fn cancel_all(&mut self) {
        self.insight.cancel();
        self.narration.cancel();
        self.scan.cancel();
        self.reimagine.cancel();
        self.variant.cancel();
        self.guide.cancel();
        self.quiz.cancel();
    }
}

pub struct Viewer {
    session: Rc<RefCell<Session>>,
    panels: Rc<RefCell<Panels>>,
    spectrum: Option<Rc<SpectrumView>>,
    listeners: Vec<Listener>,
}

#[derive(Clone)]
struct Ctx {
    document: web::Document,
    artwork: Rc<Artwork>,
    deps: ViewerDeps,
    session: Weak<RefCell<Session>>,
    panels: Rc<RefCell<Panels>>,
}

impl Viewer {
    /// `on_close` runs from the close button; it must not drop the viewer
    /// synchronously.
    pub fn open(
        document: &web::Document,
        artwork: Artwork,
        deps: ViewerDeps,
        on_close: impl Fn() + 'static,
    ) -> Self {
        let session = Rc::new(RefCell::new(Session::new()));
        let panels = Rc::new(RefCell::new(Panels::default()));
        let ctx = Ctx {
            document: document.clone(),
            artwork: Rc::new(artwork),
            deps,
            session: Rc::downgrade(&session),
            panels: panels.clone(),
        };

        render_artwork(&ctx);

        let spectrum = document
            .get_element_by_id(SPECTRUM_CANVAS_ID)
            .and_then(|el| el.dyn_into::<web::HtmlCanvasElement>().ok())
            .and_then(|canvas| match SpectrumView::new(canvas) {
                Ok(view) => Some(Rc::new(view)),
                Err(e) => {
                    log::error!("[viewer] spectrum unavailable: {}", e);
                    None
                }
            });

        let mut listeners = Vec::new();
        listeners.extend(Listener::on_click(document, VIEWER_CLOSE_ID, on_close));
        wire_stage(&ctx, spectrum.clone(), &mut listeners);
        wire_mode_toggle(&ctx, &mut listeners);
        wire_narration(&ctx, &mut listeners);
        wire_panels(&ctx, &mut listeners);

        load_insight(&ctx);
        log::info!("[viewer] opened {}", ctx.artwork.id);

        Self {
            session,
            panels,
            spectrum,
            listeners,
        }
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        self.listeners.clear();
        self.panels.borrow_mut().cancel_all();
        self.session.borrow_mut().teardown();
        self.spectrum = None;
        if let Some(doc) = dom::window_document() {
            dom::set_hidden(&doc, REIMAGINE_VIDEO_ID, true);
            dom::set_hidden(&doc, VARIANT_IMAGE_ID, true);
            dom::set_text(&doc, LIVE_TRANSCRIPT_ID, "");
        }
    }
}

fn render_artwork(ctx: &Ctx) {
    let doc = &ctx.document;
    let art = &ctx.artwork;
    dom::set_text(doc, VIEWER_TITLE_ID, &art.title);
    dom::set_text(doc, VIEWER_ARTIST_ID, &format!("@{}", art.artist));
    dom::set_text(doc, VIEWER_DESCRIPTION_ID, &art.description);
    if let Some(img) = doc.get_element_by_id(VIEWER_IMAGE_ID) {
        _ = img.set_attribute("src", &art.image_url);
        _ = img.set_attribute("alt", &art.title);
    }
    dom::set_hidden(doc, STAGE_TOGGLE_ID, !art.supports_spatial_audio());
    dom::set_hidden(doc, STAGE_PANEL_ID, true);
    dom::set_hidden(doc, CAMERA_VIDEO_ID, true);
    dom::set_hidden(doc, SCAN_BUTTON_ID, true);
    dom::set_hidden(doc, REIMAGINE_BUTTON_ID, true);
    dom::set_hidden(doc, VARIANT_BUTTON_ID, true);
    dom::set_hidden(doc, REIMAGINE_VIDEO_ID, true);
    dom::set_hidden(doc, VARIANT_IMAGE_ID, true);
    dom::set_hidden(doc, QUIZ_PANEL_ID, true);
    dom::set_pressed(doc, MODE_TOGGLE_ID, false);
    dom::set_pressed(doc, NARRATION_TOGGLE_ID, false);
    dom::set_pressed(doc, STAGE_TOGGLE_ID, false);
    dom::set_pressed(doc, LIVE_TOGGLE_ID, false);
    for id in [INSIGHT_ID, SCAN_RESULT_ID, GUIDE_ANSWER_ID, LIVE_TRANSCRIPT_ID] {
        dom::set_text(doc, id, "");
    }
    for id in [
        INSIGHT_STATUS_ID,
        NARRATION_STATUS_ID,
        SCAN_STATUS_ID,
        REIMAGINE_STATUS_ID,
        VARIANT_STATUS_ID,
        GUIDE_STATUS_ID,
        QUIZ_STATUS_ID,
    ] {
        overlay::hide(doc, id);
    }
    dom::set_text(doc, ROTATION_READOUT_ID, "0°");
}

/// Start a tracked request and render its state into the panel as it settles.
/// Completions from superseded requests, or after the viewer closed, are dropped.
fn track<T, Fut>(
    ctx: &Ctx,
    slot: fn(&mut Panels) -> &mut Loader<T>,
    task: Fut,
    render: fn(&Ctx, &LoadState<T>),
) where
    T: Clone + 'static,
    Fut: Future<Output = awasser_core::Result<T>> + 'static,
{
    let ticket = slot(&mut ctx.panels.borrow_mut()).begin();
    render(ctx, &LoadState::Pending);
    let ctx = ctx.clone();
    spawn_local(async move {
        let result = task.await.map_err(|e| {
            log::error!("[viewer] request failed: {}", e);
            e.user_message()
        });
        let settled = {
            let mut panels = ctx.panels.borrow_mut();
            let loader = slot(&mut panels);
            loader.complete(ticket, result).then(|| loader.state().clone())
        };
        if let Some(state) = settled {
            render(&ctx, &state);
        }
    });
}

fn no_generation() -> Error {
    Error::Generation("no generation key configured".into())
}

/// Invoke `action` when the `.retry` button of `region_id` is clicked.
fn on_retry(ctx: &Ctx, region_id: &str, action: impl Fn() + 'static) -> Option<Listener> {
    let region = ctx.document.get_element_by_id(region_id)?;
    Listener::new(&region, "click", move |ev: web::Event| {
        let hit = ev
            .target()
            .and_then(|t| t.dyn_into::<web::Element>().ok())
            .and_then(|el| el.closest(&format!(".{}", RETRY_CLASS)).ok().flatten());
        if hit.is_some() {
            action();
        }
    })
}

// ---------------- Insight ----------------

fn load_insight(ctx: &Ctx) {
    let gen = ctx.deps.generation.clone();
    let art = ctx.artwork.clone();
    track(
        ctx,
        |p| &mut p.insight,
        async move {
            let gen = gen.ok_or_else(no_generation)?;
            generation::cultural_insight(gen.as_ref(), &art.location.name, &art.title).await
        },
        |ctx, state| {
            overlay::render(&ctx.document, INSIGHT_STATUS_ID, state, "Consulting the archive…");
            if let LoadState::Ready(text) = state {
                dom::set_text(&ctx.document, INSIGHT_ID, text);
            }
        },
    );
}

// ---------------- Narration ----------------

fn wire_narration(ctx: &Ctx, listeners: &mut Vec<Listener>) {
    let c = ctx.clone();
    let toggle = Rc::new(move || {
        let Some(session) = c.session.upgrade() else {
            return;
        };
        let playing = session.borrow().is_narrating();
        let action = c.panels.borrow_mut().narration.toggle(playing);
        match action {
            ToggleAction::Start => start_narration(&c),
            ToggleAction::Stop | ToggleAction::Cancel => {
                session.borrow_mut().stop_narration();
                overlay::hide(&c.document, NARRATION_STATUS_ID);
                dom::set_pressed(&c.document, NARRATION_TOGGLE_ID, false);
            }
        }
    });
    let t = toggle.clone();
    listeners.extend(Listener::on_click(&ctx.document, NARRATION_TOGGLE_ID, move || t()));
    listeners.extend(on_retry(ctx, NARRATION_STATUS_ID, move || toggle()));
}

fn start_narration(ctx: &Ctx) {
    let gen = ctx.deps.generation.clone();
    let text = generation::narration_text(&ctx.artwork.description);
    track(
        ctx,
        |p| &mut p.narration,
        async move {
            let gen = gen.ok_or_else(no_generation)?;
            let audio_b64 = gen.synthesize_speech(&text).await?;
            decode_base64_pcm(&audio_b64, NARRATION_SAMPLE_RATE, 1)
        },
        |ctx, state| {
            overlay::render(&ctx.document, NARRATION_STATUS_ID, state, "Preparing narration…");
            let playing = match state {
                LoadState::Ready(pcm) => match play_narration(ctx, pcm) {
                    Ok(()) => true,
                    Err(e) => {
                        log::error!("[narration] playback failed: {}", e);
                        overlay::show_failed(&ctx.document, NARRATION_STATUS_ID, &e.user_message());
                        false
                    }
                },
                _ => false,
            };
            dom::set_pressed(&ctx.document, NARRATION_TOGGLE_ID, playing);
        },
    );
}

/// Start a clip whose request is still current.
fn play_narration(ctx: &Ctx, pcm: &DecodedPcm) -> awasser_core::Result<()> {
    let Some(session) = ctx.session.upgrade() else {
        return Ok(());
    };
    let mut s = session.borrow_mut();
    let audio = s.audio_or_init(WebAudio::new)?.clone();
    let ended = ctx.session.clone();
    let doc = ctx.document.clone();
    let playback = audio.play_pcm(pcm, move || {
        if let Some(session) = ended.upgrade() {
            if let Ok(mut s) = session.try_borrow_mut() {
                s.narration_ended();
            }
        }
        dom::set_pressed(&doc, NARRATION_TOGGLE_ID, false);
    })?;
    s.begin_narration(Box::new(playback));
    Ok(())
}

// ---------------- Spatial stage ----------------

fn wire_stage(ctx: &Ctx, spectrum: Option<Rc<SpectrumView>>, listeners: &mut Vec<Listener>) {
    let c = ctx.clone();
    listeners.extend(Listener::on_click(&ctx.document, STAGE_TOGGLE_ID, move || {
        let Some(session) = c.session.upgrade() else {
            return;
        };
        if session.borrow().stage().is_active() {
            session.borrow_mut().stop_stage();
            dom::set_pressed(&c.document, STAGE_TOGGLE_ID, false);
            dom::set_hidden(&c.document, STAGE_PANEL_ID, true);
            return;
        }
        let eligible = c.artwork.supports_spatial_audio();
        let started = session.borrow_mut().start_stage(eligible, WebAudio::new);
        match started {
            Ok(StageStart::Started) => {
                // Push controls left from an earlier run of the stage.
                let distance = session.borrow().stage().distance();
                session.borrow_mut().set_distance(distance);
                dom::set_pressed(&c.document, STAGE_TOGGLE_ID, true);
                dom::set_hidden(&c.document, STAGE_PANEL_ID, false);
                if let Some(view) = &spectrum {
                    view.start(c.session.clone());
                }
            }
            Ok(StageStart::AlreadyActive) | Ok(StageStart::Ineligible) => {}
            Err(e) => log::error!("[stage] could not start: {}", e),
        }
    }));

    if let Some(slider) = ctx.document.get_element_by_id(DISTANCE_SLIDER_ID) {
        let c = ctx.clone();
        listeners.extend(Listener::new(&slider, "input", move |_| {
            let Some(d) = dom::input_value(&c.document, DISTANCE_SLIDER_ID)
                .as_deref()
                .and_then(parse_slider)
            else {
                return;
            };
            if let Some(session) = c.session.upgrade() {
                session.borrow_mut().set_distance(d);
            }
        }));
    }

    if let Some(surface) = ctx.document.get_element_by_id(VIEWER_STAGE_SURFACE_ID) {
        let c = ctx.clone();
        listeners.extend(events::wire_drag(&surface, move |dx| {
            let Some(session) = c.session.upgrade() else {
                return;
            };
            let mut s = session.borrow_mut();
            let rotation = drag_rotation(s.stage().rotation_deg(), dx);
            s.set_rotation(rotation);
            dom::set_text(
                &c.document,
                ROTATION_READOUT_ID,
                &format!("{:.0}°", s.stage().rotation_deg()),
            );
        }));
    }
}

// ---------------- Camera mode ----------------

fn camera_video(document: &web::Document) -> Option<web::HtmlVideoElement> {
    document
        .get_element_by_id(CAMERA_VIDEO_ID)?
        .dyn_into::<web::HtmlVideoElement>()
        .ok()
}

fn capture_canvas(document: &web::Document) -> Option<web::HtmlCanvasElement> {
    document
        .get_element_by_id(CAPTURE_CANVAS_ID)?
        .dyn_into::<web::HtmlCanvasElement>()
        .ok()
}

fn render_mode(document: &web::Document, mode: ViewMode) {
    let ar = mode == ViewMode::Ar;
    dom::set_pressed(document, MODE_TOGGLE_ID, ar);
    dom::set_hidden(document, CAMERA_VIDEO_ID, !ar);
    dom::set_hidden(document, VIEWER_IMAGE_ID, ar);
    dom::set_hidden(document, SCAN_BUTTON_ID, !ar);
}

fn wire_mode_toggle(ctx: &Ctx, listeners: &mut Vec<Listener>) {
    let c = ctx.clone();
    listeners.extend(Listener::on_click(&ctx.document, MODE_TOGGLE_ID, move || {
        let Some(session) = c.session.upgrade() else {
            return;
        };
        let next = match session.borrow().mode() {
            ViewMode::Studio => ViewMode::Ar,
            ViewMode::Ar => ViewMode::Studio,
        };
        session.borrow_mut().set_mode(next);
        render_mode(&c.document, next);
        if next == ViewMode::Studio {
            return;
        }
        let Some(video) = camera_video(&c.document) else {
            session.borrow_mut().camera_denied();
            render_mode(&c.document, ViewMode::Studio);
            return;
        };
        let weak = c.session.clone();
        let doc = c.document.clone();
        spawn_local(async move {
            let acquired = MediaCamera::acquire(video).await;
            let Some(session) = weak.upgrade() else {
                if let Ok(mut cam) = acquired {
                    cam.stop_tracks();
                }
                return;
            };
            let mut s = session.borrow_mut();
            match acquired {
                Ok(cam) => {
                    s.attach_camera(Box::new(cam));
                }
                Err(e) => {
                    log::info!("[camera] request failed: {}", e);
                    s.camera_denied();
                }
            }
            render_mode(&doc, s.mode());
        });
    }));
}

// ---------------- Generative panels ----------------

fn wire_panels(ctx: &Ctx, listeners: &mut Vec<Listener>) {
    let scan = {
        let c = ctx.clone();
        Rc::new(move || scan_landmark(&c))
    };
    let s = scan.clone();
    listeners.extend(Listener::on_click(&ctx.document, SCAN_BUTTON_ID, move || s()));
    listeners.extend(on_retry(ctx, SCAN_STATUS_ID, move || scan()));

    let reimagine = {
        let c = ctx.clone();
        Rc::new(move || reimagine_site(&c))
    };
    let r = reimagine.clone();
    listeners.extend(Listener::on_click(&ctx.document, REIMAGINE_BUTTON_ID, move || r()));
    listeners.extend(on_retry(ctx, REIMAGINE_STATUS_ID, move || reimagine()));

    let variant = {
        let c = ctx.clone();
        Rc::new(move || render_variant(&c))
    };
    let v = variant.clone();
    listeners.extend(Listener::on_click(&ctx.document, VARIANT_BUTTON_ID, move || v()));
    listeners.extend(on_retry(ctx, VARIANT_STATUS_ID, move || variant()));

    let ask = {
        let c = ctx.clone();
        Rc::new(move || ask_guide(&c))
    };
    let a = ask.clone();
    listeners.extend(Listener::on_click(&ctx.document, GUIDE_ASK_ID, move || a()));
    listeners.extend(on_retry(ctx, GUIDE_STATUS_ID, move || ask()));

    let c = ctx.clone();
    listeners.extend(on_retry(ctx, INSIGHT_STATUS_ID, move || load_insight(&c)));

    let quiz = {
        let c = ctx.clone();
        Rc::new(move || load_quiz(&c))
    };
    let q = quiz.clone();
    listeners.extend(Listener::on_click(&ctx.document, QUIZ_BUTTON_ID, move || q()));
    listeners.extend(on_retry(ctx, QUIZ_STATUS_ID, move || quiz()));
    wire_quiz_panel(ctx, listeners);

    let c = ctx.clone();
    listeners.extend(Listener::on_click(&ctx.document, LIVE_TOGGLE_ID, move || toggle_live(&c)));
}

fn scan_landmark(ctx: &Ctx) {
    let frame = match (camera_video(&ctx.document), capture_canvas(&ctx.document)) {
        (Some(video), Some(canvas)) => camera::capture_frame(&video, &canvas, 0),
        _ => None,
    };
    let Some(frame) = frame else {
        overlay::show_failed(&ctx.document, SCAN_STATUS_ID, "Point the camera at a landmark first.");
        return;
    };
    ctx.panels.borrow_mut().frame = Some(frame.clone());
    let gen = ctx.deps.generation.clone();
    track(
        ctx,
        |p| &mut p.scan,
        async move {
            let gen = gen.ok_or_else(no_generation)?;
            generation::identify_landmark(gen.as_ref(), &frame).await
        },
        |ctx, state| {
            overlay::render(&ctx.document, SCAN_STATUS_ID, state, "Scanning…");
            let recognized = match state {
                LoadState::Ready(report) if report.recognized => {
                    dom::set_text(
                        &ctx.document,
                        SCAN_RESULT_ID,
                        &format!("{}: {}", report.landmark, report.history),
                    );
                    true
                }
                LoadState::Ready(_) => {
                    dom::set_text(&ctx.document, SCAN_RESULT_ID, "No landmark recognized.");
                    false
                }
                _ => false,
            };
            dom::set_hidden(&ctx.document, REIMAGINE_BUTTON_ID, !recognized);
            dom::set_hidden(&ctx.document, VARIANT_BUTTON_ID, !recognized);
        },
    );
}

/// The recognized landmark and the frame it was recognized in.
fn scanned(ctx: &Ctx) -> Option<(LandmarkReport, InlineImage)> {
    let panels = ctx.panels.borrow();
    let report = panels.scan.state().ready().filter(|r| r.recognized)?.clone();
    Some((report, panels.frame.clone()?))
}

fn reimagine_site(ctx: &Ctx) {
    let Some((report, frame)) = scanned(ctx) else {
        return;
    };
    let gen = ctx.deps.generation.clone();
    track(
        ctx,
        |p| &mut p.reimagine,
        async move {
            let gen = gen.ok_or_else(no_generation)?;
            let uri = generation::synthesize_video(
                gen.as_ref(),
                &frame,
                &generation::reimagining_prompt(&report.landmark),
                PollPolicy::default(),
                |delay| dom::sleep_ms(delay.as_millis().min(i32::MAX as u128) as i32),
            )
            .await?;
            Ok(downloadable_uri(&uri, gen.api_key()))
        },
        |ctx, state| {
            overlay::render(
                &ctx.document,
                REIMAGINE_STATUS_ID,
                state,
                "Reconstructing the past… this can take a few minutes.",
            );
            if let LoadState::Ready(src) = state {
                if let Some(video) = ctx.document.get_element_by_id(REIMAGINE_VIDEO_ID) {
                    _ = video.set_attribute("src", src);
                    dom::set_element_hidden(&video, false);
                }
            }
        },
    );
}

fn render_variant(ctx: &Ctx) {
    let Some((report, frame)) = scanned(ctx) else {
        return;
    };
    let gen = ctx.deps.generation.clone();
    track(
        ctx,
        |p| &mut p.variant,
        async move {
            let gen = gen.ok_or_else(no_generation)?;
            gen.edit_image(&frame, &generation::variant_instruction(&report.suggested_theme))
                .await
        },
        |ctx, state| {
            overlay::render(&ctx.document, VARIANT_STATUS_ID, state, "Composing a variant…");
            if let LoadState::Ready(url) = state {
                if let Some(img) = ctx.document.get_element_by_id(VARIANT_IMAGE_ID) {
                    _ = img.set_attribute("src", url);
                    dom::set_element_hidden(&img, false);
                }
            }
        },
    );
}

fn guide_context(art: &Artwork) -> String {
    format!(
        "Artwork \"{}\" by {} at {}. {}",
        art.title, art.artist, art.location.name, art.description
    )
}

fn ask_guide(ctx: &Ctx) {
    let question = dom::input_value(&ctx.document, GUIDE_INPUT_ID).unwrap_or_default();
    if question.trim().is_empty() {
        return;
    }
    let gen = ctx.deps.generation.clone();
    let context = guide_context(&ctx.artwork);
    track(
        ctx,
        |p| &mut p.guide,
        async move {
            let gen = gen.ok_or_else(no_generation)?;
            generation::ask_guide(gen.as_ref(), &question, &context).await
        },
        |ctx, state| {
            overlay::render(&ctx.document, GUIDE_STATUS_ID, state, "The guide is thinking…");
            if let LoadState::Ready(answer) = state {
                dom::set_text(&ctx.document, GUIDE_ANSWER_ID, answer);
                dom::clear_input(&ctx.document, GUIDE_INPUT_ID);
            }
        },
    );
}

// ---------------- Live voice ----------------

fn toggle_live(ctx: &Ctx) {
    let Some(session) = ctx.session.upgrade() else {
        return;
    };
    if session.borrow().has_live() {
        session.borrow_mut().end_live();
        dom::set_pressed(&ctx.document, LIVE_TOGGLE_ID, false);
        return;
    }
    let Some(gen) = ctx.deps.generation.as_ref() else {
        dom::set_text(&ctx.document, LIVE_TRANSCRIPT_ID, &no_generation().to_string());
        return;
    };
    let audio = match session.borrow_mut().audio_or_init(WebAudio::new) {
        Ok(audio) => audio.clone(),
        Err(e) => {
            log::error!("[live] no audio context: {}", e);
            return;
        }
    };
    let instruction = format!(
        "You are a museum guide standing with the visitor in front of {}.",
        guide_context(&ctx.artwork)
    );
    let weak = ctx.session.clone();
    let doc = ctx.document.clone();
    let on_peer_close = move || {
        let weak = weak.clone();
        let doc = doc.clone();
        // Deferred: the closing socket's handler belongs to the session being dropped.
        spawn_local(async move {
            let Some(session) = weak.upgrade() else {
                return;
            };
            if session.borrow_mut().reap_live() {
                dom::set_pressed(&doc, LIVE_TOGGLE_ID, false);
            }
        });
    };
    let live = match WebLiveSession::connect(
        &ctx.deps.config,
        gen.api_key(),
        Some(&instruction),
        audio,
        ctx.document.clone(),
        on_peer_close,
    ) {
        Ok(live) => live,
        Err(e) => {
            log::error!("[live] connect failed: {}", e);
            return;
        }
    };
    let timer = if session.borrow().has_camera() {
        match (camera_video(&ctx.document), capture_canvas(&ctx.document)) {
            (Some(video), Some(canvas)) => live.frame_timer(video, canvas),
            _ => None,
        }
    } else {
        None
    };
    let timer = timer.map(|t| Box::new(t) as Box<dyn awasser_core::live::FrameTimer>);
    let attached = session.borrow_mut().attach_live(Box::new(live), timer);
    dom::set_pressed(&ctx.document, LIVE_TOGGLE_ID, attached);
}

// ---------------- Quiz ----------------

fn load_quiz(ctx: &Ctx) {
    ctx.panels.borrow_mut().round = None;
    let gen = ctx.deps.generation.clone();
    let art = ctx.artwork.clone();
    track(
        ctx,
        |p| &mut p.quiz,
        async move {
            let gen = gen.ok_or_else(no_generation)?;
            generation::site_quiz(gen.as_ref(), &art.location.name, &art.title, &art.description)
                .await
        },
        |ctx, state| {
            overlay::render(&ctx.document, QUIZ_STATUS_ID, state, "Writing your quiz…");
            if let LoadState::Ready(questions) = state {
                ctx.panels.borrow_mut().round = Some(QuizRound::new(questions.clone()));
                render_quiz(ctx, None);
            }
        },
    );
}

fn wire_quiz_panel(ctx: &Ctx, listeners: &mut Vec<Listener>) {
    let Some(panel) = ctx.document.get_element_by_id(QUIZ_PANEL_ID) else {
        return;
    };
    let c = ctx.clone();
    listeners.extend(Listener::new(&panel, "click", move |ev: web::Event| {
        let Some(el) = ev.target().and_then(|t| t.dyn_into::<web::Element>().ok()) else {
            return;
        };
        if el.has_attribute(QUIZ_NEXT_ATTR) {
            if let Some(round) = c.panels.borrow_mut().round.as_mut() {
                round.advance();
            }
            render_quiz(&c, None);
            return;
        }
        let Some(option) = crate::input::parse_index(el.get_attribute(QUIZ_OPTION_ATTR)) else {
            return;
        };
        let outcome = match c.panels.borrow_mut().round.as_mut() {
            Some(round) => round.answer(option),
            None => return,
        };
        if outcome != AnswerOutcome::Ignored {
            render_quiz(&c, Some(outcome));
        }
    }));
}

fn render_quiz(ctx: &Ctx, outcome: Option<AnswerOutcome>) {
    let js = |e: wasm_bindgen::JsValue| anyhow::anyhow!("{:?}", e);
    let build = || -> anyhow::Result<()> {
        let doc = &ctx.document;
        let Some(panel) = doc.get_element_by_id(QUIZ_PANEL_ID) else {
            return Ok(());
        };
        panel.set_inner_html("");
        let panels = ctx.panels.borrow();
        let Some(round) = panels.round.as_ref() else {
            dom::set_element_hidden(&panel, true);
            return Ok(());
        };
        dom::set_element_hidden(&panel, false);

        let Some(q) = round.current() else {
            let done = doc.create_element("p").map_err(js)?;
            done.set_text_content(Some(&format!(
                "You scored {} of {}.",
                round.score(),
                round.len()
            )));
            panel.append_child(&done).map_err(js)?;
            return Ok(());
        };

        let heading = doc.create_element("h4").map_err(js)?;
        heading.set_text_content(Some(&format!(
            "{}/{}: {}",
            round.index() + 1,
            round.len(),
            q.question
        )));
        panel.append_child(&heading).map_err(js)?;

        for (i, text) in q.options.iter().enumerate() {
            let btn = doc.create_element("button").map_err(js)?;
            btn.set_text_content(Some(text));
            btn.set_attribute(QUIZ_OPTION_ATTR, &i.to_string()).map_err(js)?;
            if round.answered().is_some() {
                btn.set_attribute("disabled", "").map_err(js)?;
                if i == q.correct_answer {
                    _ = btn.class_list().add_1("correct");
                } else if round.answered() == Some(i) {
                    _ = btn.class_list().add_1("incorrect");
                }
            }
            panel.append_child(&btn).map_err(js)?;
        }

        if round.answered().is_some() {
            let feedback = doc.create_element("p").map_err(js)?;
            let verdict = match outcome {
                Some(AnswerOutcome::Correct) => "Correct. ",
                Some(AnswerOutcome::Incorrect { .. }) => "Not quite. ",
                _ => "",
            };
            feedback.set_text_content(Some(&format!("{}{}", verdict, q.explanation)));
            panel.append_child(&feedback).map_err(js)?;
            let next = doc.create_element("button").map_err(js)?;
            next.set_text_content(Some("Next"));
            next.set_attribute(QUIZ_NEXT_ATTR, "").map_err(js)?;
            panel.append_child(&next).map_err(js)?;
        }
        Ok(())
    };
    if let Err(e) = build() {
        log::error!("[quiz] render failed: {}", e);
    }
}
