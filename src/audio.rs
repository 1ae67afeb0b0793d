use awasser_core::pcm::DecodedPcm;
use awasser_core::{AudioBackend, Error, OscillatorSpec, Playback, StageGraph, StageSpec, StageTargets, Waveform};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

fn js_err(label: &str, e: wasm_bindgen::JsValue) -> Error {
    log::error!("{} error: {:?}", label, e);
    Error::Audio(format!("{}: {:?}", label, e))
}

fn create_gain(audio_ctx: &web::AudioContext, value: f32, label: &str) -> Result<web::GainNode, Error> {
    match web::GainNode::new(audio_ctx) {
        Ok(g) => {
            g.gain().set_value(value);
            Ok(g)
        }
        Err(e) => Err(js_err(&format!("{} GainNode", label), e)),
    }
}

fn oscillator_type(w: Waveform) -> web::OscillatorType {
    match w {
        Waveform::Sine => web::OscillatorType::Sine,
        Waveform::Square => web::OscillatorType::Square,
        Waveform::Saw => web::OscillatorType::Sawtooth,
        Waveform::Triangle => web::OscillatorType::Triangle,
    }
}

/// The viewer's shared `AudioContext`.
#[derive(Clone)]
pub struct WebAudio {
    ctx: web::AudioContext,
}

impl WebAudio {
    pub fn new() -> awasser_core::Result<Self> {
        let ctx = web::AudioContext::new().map_err(|e| js_err("AudioContext", e))?;
        Ok(Self { ctx })
    }

    pub fn context(&self) -> &web::AudioContext {
        &self.ctx
    }

    /// Play decoded PCM once through the destination. `on_ended` fires when
    /// the clip finishes by itself.
    pub fn play_pcm(
        &self,
        pcm: &DecodedPcm,
        on_ended: impl FnOnce() + 'static,
    ) -> awasser_core::Result<WebPlayback> {
        self.resume_if_suspended();
        let source = self.buffer_source(pcm)?;
        _ = source.connect_with_audio_node(&self.ctx.destination());
        let on_ended = RefCell::new(Some(on_ended));
        let closure = Closure::wrap(Box::new(move || {
            if let Some(f) = on_ended.borrow_mut().take() {
                f();
            }
        }) as Box<dyn FnMut()>);
        source.set_onended(Some(closure.as_ref().unchecked_ref()));
        source.start().map_err(|e| js_err("narration start", e))?;
        Ok(WebPlayback {
            source,
            _on_ended: closure,
        })
    }

    /// Queue PCM at `at` on the audio clock (live-voice playback).
    pub fn schedule_pcm(&self, pcm: &DecodedPcm, at: f64) -> awasser_core::Result<web::AudioBufferSourceNode> {
        let source = self.buffer_source(pcm)?;
        _ = source.connect_with_audio_node(&self.ctx.destination());
        source
            .start_with_when(at)
            .map_err(|e| js_err("live chunk start", e))?;
        Ok(source)
    }

    fn buffer_source(&self, pcm: &DecodedPcm) -> awasser_core::Result<web::AudioBufferSourceNode> {
        let frames = pcm.frame_count().max(1) as u32;
        let buffer = self
            .ctx
            .create_buffer(pcm.channels.len().max(1) as u32, frames, pcm.sample_rate as f32)
            .map_err(|e| js_err("AudioBuffer", e))?;
        for (ch, data) in pcm.channels.iter().enumerate() {
            let mut data = data.clone();
            _ = buffer.copy_to_channel(&mut data, ch as i32);
        }
        let source = self
            .ctx
            .create_buffer_source()
            .map_err(|e| js_err("AudioBufferSourceNode", e))?;
        source.set_buffer(Some(&buffer));
        Ok(source)
    }
}

impl AudioBackend for WebAudio {
    type Graph = WebStageGraph;

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn resume_if_suspended(&self) {
        if self.ctx.state() == web::AudioContextState::Suspended {
            _ = self.ctx.resume();
        }
    }

    fn build_stage_graph(&self, spec: &StageSpec) -> awasser_core::Result<WebStageGraph> {
        let now = self.ctx.current_time();
        let oscillators = spec
            .oscillators
            .iter()
            .map(|o| self.create_oscillator(o, now))
            .collect::<awasser_core::Result<Vec<_>>>()?;

        let filter = web::BiquadFilterNode::new(&self.ctx).map_err(|e| js_err("BiquadFilterNode", e))?;
        filter.set_type(web::BiquadFilterType::Lowpass);
        _ = filter.frequency().set_value_at_time(spec.filter_cutoff_hz, now);

        let gain = create_gain(&self.ctx, 0.0, "Stage")?;

        let panner = web::PannerNode::new(&self.ctx).map_err(|e| js_err("PannerNode", e))?;
        panner.set_panning_model(web::PanningModelType::Hrtf);

        let analyser = web::AnalyserNode::new(&self.ctx).map_err(|e| js_err("AnalyserNode", e))?;
        analyser.set_fft_size(spec.analyser_fft_size);

        for osc in &oscillators {
            _ = osc.connect_with_audio_node(&filter);
        }
        _ = filter.connect_with_audio_node(&gain);
        _ = gain.connect_with_audio_node(&panner);
        _ = panner.connect_with_audio_node(&analyser);
        _ = analyser.connect_with_audio_node(&self.ctx.destination());

        Ok(WebStageGraph {
            oscillators,
            filter,
            gain,
            panner,
            analyser,
        })
    }

    fn close_after(&self, at: f64) {
        let ctx = self.ctx.clone();
        let wait_ms = ((at - ctx.current_time()) * 1000.0)
            .ceil()
            .clamp(0.0, i32::MAX as f64) as i32;
        wasm_bindgen_futures::spawn_local(async move {
            if wait_ms > 0 {
                crate::dom::sleep_ms(wait_ms).await;
            }
            if ctx.state() != web::AudioContextState::Closed {
                _ = ctx.close();
                log::info!("[audio] shared context closed");
            }
        });
    }
}

impl WebAudio {
    fn create_oscillator(&self, spec: &OscillatorSpec, now: f64) -> awasser_core::Result<web::OscillatorNode> {
        let osc = web::OscillatorNode::new(&self.ctx).map_err(|e| js_err("OscillatorNode", e))?;
        osc.set_type(oscillator_type(spec.waveform));
        _ = osc.frequency().set_value_at_time(spec.frequency_hz, now);
        Ok(osc)
    }
}

pub struct WebStageGraph {
    oscillators: Vec<web::OscillatorNode>,
    filter: web::BiquadFilterNode,
    gain: web::GainNode,
    panner: web::PannerNode,
    analyser: web::AnalyserNode,
}

impl StageGraph for WebStageGraph {
    fn set_gain_at(&self, value: f32, at: f64) {
        _ = self.gain.gain().set_value_at_time(value, at);
    }

    fn ramp_gain(&self, value: f32, from: f64, until: f64) {
        let param = self.gain.gain();
        // Pin the current value so the ramp starts from where the gain is now.
        _ = param.cancel_scheduled_values(from);
        _ = param.set_value_at_time(param.value(), from);
        _ = param.linear_ramp_to_value_at_time(value, until);
    }

    fn set_targets(&self, targets: &StageTargets, at: f64, time_constant: f64) {
        _ = self
            .panner
            .position_x()
            .set_target_at_time(targets.position.x, at, time_constant);
        _ = self
            .panner
            .position_z()
            .set_target_at_time(targets.position.z, at, time_constant);
        _ = self
            .filter
            .frequency()
            .set_target_at_time(targets.cutoff_hz, at, time_constant);
        _ = self
            .gain
            .gain()
            .set_target_at_time(targets.gain, at, time_constant);
    }

    fn start_generators(&self, at: f64) {
        for osc in &self.oscillators {
            if let Err(e) = osc.start_with_when(at) {
                log::error!("[stage] oscillator start failed: {:?}", e);
            }
        }
    }

    fn stop_generators(&self, at: f64) {
        for osc in &self.oscillators {
            _ = osc.stop_with_when(at);
        }
    }

    fn release(self) {
        // Disconnect once the last generator has ended; the closure frees itself.
        let Some(last) = self.oscillators.last().cloned() else {
            return;
        };
        let nodes = Rc::new(self);
        let on_ended = Closure::once_into_js(move || {
            for osc in &nodes.oscillators {
                _ = osc.disconnect();
            }
            _ = nodes.filter.disconnect();
            _ = nodes.gain.disconnect();
            _ = nodes.panner.disconnect();
            _ = nodes.analyser.disconnect();
            log::info!("[stage] nodes released");
        });
        last.set_onended(Some(on_ended.unchecked_ref()));
    }

    fn frequency_data(&self, out: &mut Vec<u8>) {
        out.resize(self.analyser.frequency_bin_count() as usize, 0);
        self.analyser.get_byte_frequency_data(out);
    }
}

/// A narration clip started by [`WebAudio::play_pcm`].
pub struct WebPlayback {
    source: web::AudioBufferSourceNode,
    _on_ended: Closure<dyn FnMut()>,
}

impl Playback for WebPlayback {
    fn stop(&mut self) {
        // Explicit stops do not report back as a natural end.
        self.source.set_onended(None);
        _ = self.source.stop();
        _ = self.source.disconnect();
    }
}
