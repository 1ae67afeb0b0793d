use crate::audio::WebAudio;
use crate::camera::{self, capture_frame};
use crate::config::AppConfig;
use crate::constants::{LIVE_CAPTURE_WIDTH, LIVE_TRANSCRIPT_ID, MIC_BUFFER_SIZE};
use crate::dom;
use awasser_core::constants::{LIVE_FRAME_INTERVAL_MS, MIC_SAMPLE_RATE, NARRATION_SAMPLE_RATE};
use awasser_core::live::{parse_server_message, FrameTimer, LiveClientMessage, LiveEvent, LiveSession, PlaybackCursor, Transcript};
use awasser_core::pcm::{decode_base64_pcm, encode_base64_pcm};
use awasser_core::{AudioBackend, Error};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Socket plus the "setup acknowledged" flag; nothing is streamed before it.
#[derive(Clone)]
struct LiveLink {
    ws: web::WebSocket,
    ready: Rc<Cell<bool>>,
}

impl LiveLink {
    fn is_open(&self) -> bool {
        self.ws.ready_state() == web::WebSocket::OPEN
    }

    fn send(&self, message: &LiveClientMessage) -> awasser_core::Result<()> {
        if !self.is_open() {
            return Err(Error::SessionClosed);
        }
        let text = message.to_json()?;
        self.ws
            .send_with_str(&text)
            .map_err(|e| Error::Generation(format!("{:?}", e)))
    }

    fn stream(&self, message: &LiveClientMessage) {
        if self.ready.get() {
            if let Err(e) = self.send(message) {
                log::debug!("[live] dropped chunk: {}", e);
            }
        }
    }
}

#[derive(Default)]
struct Playout {
    transcript: Transcript,
    cursor: PlaybackCursor,
    queued: Vec<(web::AudioBufferSourceNode, f64)>,
}

impl Playout {
    fn interrupt(&mut self) {
        for (node, _) in self.queued.drain(..) {
            _ = node.stop();
        }
        self.cursor.reset();
    }
}

struct MicCapture {
    stream: web::MediaStream,
    ctx: web::AudioContext,
    source: web::MediaStreamAudioSourceNode,
    processor: web::ScriptProcessorNode,
    _on_audio: Closure<dyn FnMut(web::AudioProcessingEvent)>,
}

impl MicCapture {
    async fn start(link: LiveLink) -> anyhow::Result<Self> {
        let stream = camera::request_stream(false, true).await?;
        let opts = web::AudioContextOptions::new();
        opts.set_sample_rate(MIC_SAMPLE_RATE as f32);
        let ctx = web::AudioContext::new_with_context_options(&opts)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let source = ctx
            .create_media_stream_source(&stream)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let processor = ctx
            .create_script_processor_with_buffer_size_and_number_of_input_channels_and_number_of_output_channels(
                MIC_BUFFER_SIZE,
                1,
                1,
            )
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let on_audio = Closure::wrap(Box::new(move |ev: web::AudioProcessingEvent| {
            let Ok(buffer) = ev.input_buffer() else {
                return;
            };
            let Ok(samples) = buffer.get_channel_data(0) else {
                return;
            };
            link.stream(&LiveClientMessage::audio(encode_base64_pcm(&samples), MIC_SAMPLE_RATE));
        }) as Box<dyn FnMut(web::AudioProcessingEvent)>);
        processor.set_onaudioprocess(Some(on_audio.as_ref().unchecked_ref()));
        _ = source.connect_with_audio_node(&processor);
        _ = processor.connect_with_audio_node(&ctx.destination());
        log::info!("[live] microphone streaming at {} Hz", MIC_SAMPLE_RATE);
        Ok(Self {
            stream,
            ctx,
            source,
            processor,
            _on_audio: on_audio,
        })
    }

    fn stop(&self) {
        self.processor.set_onaudioprocess(None);
        _ = self.source.disconnect();
        _ = self.processor.disconnect();
        camera::stop_stream(&self.stream);
        _ = self.ctx.close();
    }
}

/// Live-voice session over a WebSocket.
pub struct WebLiveSession {
    link: LiveLink,
    mic: Rc<RefCell<Option<MicCapture>>>,
    closed: Rc<Cell<bool>>,
    playout: Rc<RefCell<Playout>>,
    _on_open: Closure<dyn FnMut(web::Event)>,
    _on_message: Closure<dyn FnMut(web::MessageEvent)>,
    _on_close: Closure<dyn FnMut(web::Event)>,
}

impl WebLiveSession {
    /// `on_peer_close` runs from the socket's close event when the server
    /// hangs up; it must not drop the session synchronously.
    pub fn connect(
        config: &AppConfig,
        api_key: &str,
        instruction: Option<&str>,
        audio: WebAudio,
        document: web::Document,
        on_peer_close: impl Fn() + 'static,
    ) -> anyhow::Result<Self> {
        let url = format!("{}?key={}", config.live_url, api_key);
        let ws = web::WebSocket::new(&url).map_err(|e| anyhow::anyhow!("{:?}", e))?;
        ws.set_binary_type(web::BinaryType::Arraybuffer);
        let link = LiveLink {
            ws: ws.clone(),
            ready: Rc::new(Cell::new(false)),
        };
        let mic: Rc<RefCell<Option<MicCapture>>> = Rc::new(RefCell::new(None));
        let closed = Rc::new(Cell::new(false));
        let playout = Rc::new(RefCell::new(Playout::default()));

        let setup = LiveClientMessage::setup(&config.live_model, &config.voice, instruction);
        let open_link = link.clone();
        let on_open = Closure::wrap(Box::new(move |_ev: web::Event| {
            if let Err(e) = open_link.send(&setup) {
                log::error!("[live] setup not sent: {}", e);
            }
        }) as Box<dyn FnMut(web::Event)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let msg_link = link.clone();
        let msg_mic = mic.clone();
        let msg_closed = closed.clone();
        let msg_playout = playout.clone();
        let on_message = Closure::wrap(Box::new(move |ev: web::MessageEvent| {
            let Some(raw) = message_text(&ev.data()) else {
                return;
            };
            let events = match parse_server_message(&raw) {
                Ok(events) => events,
                Err(e) => {
                    log::error!("[live] bad server frame: {}", e);
                    return;
                }
            };
            let mut changed = false;
            for event in events {
                if event == LiveEvent::SetupComplete && !msg_link.ready.replace(true) {
                    log::info!("[live] setup complete");
                    let link = msg_link.clone();
                    let mic = msg_mic.clone();
                    let closed = msg_closed.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        match MicCapture::start(link).await {
                            // The session may have ended while permission was pending.
                            Ok(capture) if closed.get() => capture.stop(),
                            Ok(capture) => *mic.borrow_mut() = Some(capture),
                            Err(e) => log::info!("[live] microphone unavailable: {}", e),
                        }
                    });
                }
                changed |= handle_event(&event, &audio, &mut msg_playout.borrow_mut());
            }
            if changed {
                let text = msg_playout.borrow().transcript.render();
                dom::set_text(&document, LIVE_TRANSCRIPT_ID, &text);
            }
        }) as Box<dyn FnMut(web::MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let close_link = link.clone();
        let close_mic = mic.clone();
        let close_flag = closed.clone();
        let close_playout = playout.clone();
        let on_close = Closure::wrap(Box::new(move |_ev: web::Event| {
            if close_flag.replace(true) {
                return;
            }
            log::info!("[live] socket closed by peer");
            halt(&close_link, &close_mic, &close_playout);
            on_peer_close();
        }) as Box<dyn FnMut(web::Event)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        Ok(Self {
            link,
            mic,
            closed,
            playout,
            _on_open: on_open,
            _on_message: on_message,
            _on_close: on_close,
        })
    }

    /// Repeating camera-frame upload for this session.
    pub fn frame_timer(
        &self,
        video: web::HtmlVideoElement,
        canvas: web::HtmlCanvasElement,
    ) -> Option<IntervalTimer> {
        let link = self.link.clone();
        IntervalTimer::start(LIVE_FRAME_INTERVAL_MS, move || {
            if let Some(frame) = capture_frame(&video, &canvas, LIVE_CAPTURE_WIDTH) {
                link.stream(&LiveClientMessage::image(frame.data));
            }
        })
    }
}

impl LiveSession for WebLiveSession {
    fn send(&mut self, message: &LiveClientMessage) -> awasser_core::Result<()> {
        self.link.send(message)
    }

    fn close(&mut self) {
        let ws = &self.link.ws;
        ws.set_onopen(None);
        ws.set_onmessage(None);
        ws.set_onclose(None);
        if self.closed.replace(true) {
            return;
        }
        _ = ws.close();
        halt(&self.link, &self.mic, &self.playout);
    }

    fn is_open(&self) -> bool {
        !self.closed.get() && self.link.is_open()
    }
}

impl Drop for WebLiveSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Stop streaming: no more chunks out, microphone released, queued speech cut.
fn halt(link: &LiveLink, mic: &RefCell<Option<MicCapture>>, playout: &RefCell<Playout>) {
    link.ready.set(false);
    if let Some(mic) = mic.borrow_mut().take() {
        mic.stop();
    }
    playout.borrow_mut().interrupt();
}

fn message_text(data: &wasm_bindgen::JsValue) -> Option<String> {
    if let Some(s) = data.as_string() {
        return Some(s);
    }
    let buf = data.dyn_ref::<js_sys::ArrayBuffer>()?;
    String::from_utf8(js_sys::Uint8Array::new(buf).to_vec()).ok()
}

/// Returns whether the transcript text changed.
fn handle_event(event: &LiveEvent, audio: &WebAudio, playout: &mut Playout) -> bool {
    let changed = playout.transcript.apply(event);
    match event {
        LiveEvent::Audio(data) => {
            let pcm = match decode_base64_pcm(data, NARRATION_SAMPLE_RATE, 1) {
                Ok(pcm) => pcm,
                Err(e) => {
                    log::error!("[live] audio chunk: {}", e);
                    return changed;
                }
            };
            let now = audio.current_time();
            let start = playout.cursor.schedule(now, pcm.duration_sec());
            if let Ok(node) = audio.schedule_pcm(&pcm, start) {
                playout.queued.retain(|(_, end)| *end > now);
                playout.queued.push((node, start + pcm.duration_sec()));
            }
        }
        LiveEvent::Interrupted => playout.interrupt(),
        _ => {}
    }
    changed
}

/// `setInterval` handle; cleared on `clear` or drop.
pub struct IntervalTimer {
    handle: Option<i32>,
    _closure: Closure<dyn FnMut()>,
}

impl IntervalTimer {
    pub fn start(interval_ms: i32, tick: impl FnMut() + 'static) -> Option<Self> {
        let closure = Closure::wrap(Box::new(tick) as Box<dyn FnMut()>);
        let handle = web::window()?
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                interval_ms,
            )
            .map_err(|e| log::error!("setInterval failed: {:?}", e))
            .ok()?;
        Some(Self {
            handle: Some(handle),
            _closure: closure,
        })
    }
}

impl FrameTimer for IntervalTimer {
    fn clear(&mut self) {
        if let (Some(handle), Some(w)) = (self.handle.take(), web::window()) {
            w.clear_interval_with_handle(handle);
        }
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.clear();
    }
}
