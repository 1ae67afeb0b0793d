use crate::constants::CAPTURE_JPEG_QUALITY;
use crate::dom;
use crate::input::capture_size;
use awasser_core::generation::InlineImage;
use awasser_core::CameraStream;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

/// Rear-facing camera stream bound to a `<video>` element.
pub struct MediaCamera {
    stream: web::MediaStream,
    video: web::HtmlVideoElement,
}

impl MediaCamera {
    pub async fn acquire(video: web::HtmlVideoElement) -> anyhow::Result<Self> {
        let stream = request_stream(true, false).await?;
        video.set_src_object(Some(&stream));
        _ = video.play();
        log::info!("[camera] stream attached");
        Ok(Self { stream, video })
    }
}

impl CameraStream for MediaCamera {
    fn live_tracks(&self) -> usize {
        tracks(&self.stream)
            .filter(|t| t.ready_state() == web::MediaStreamTrackState::Live)
            .count()
    }

    fn stop_tracks(&mut self) {
        stop_stream(&self.stream);
        self.video.set_src_object(None);
    }
}

/// `getUserMedia` with the environment-facing camera and/or the microphone.
pub async fn request_stream(video: bool, audio: bool) -> anyhow::Result<web::MediaStream> {
    let devices = web::window()
        .ok_or_else(|| anyhow::anyhow!("no window"))?
        .navigator()
        .media_devices()
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    let constraints = web::MediaStreamConstraints::new();
    if video {
        let video_constraints = js_sys::Object::new();
        js_sys::Reflect::set(&video_constraints, &"facingMode".into(), &"environment".into())
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        constraints.set_video(&video_constraints);
    } else {
        constraints.set_video(&JsValue::FALSE);
    }
    constraints.set_audio(&JsValue::from_bool(audio));
    let promise = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    dom::await_promise(promise)
        .await?
        .dyn_into::<web::MediaStream>()
        .map_err(|e| anyhow::anyhow!("{:?}", e))
}

pub fn stop_stream(stream: &web::MediaStream) {
    for track in tracks(stream) {
        track.stop();
    }
}

fn tracks(stream: &web::MediaStream) -> impl Iterator<Item = web::MediaStreamTrack> {
    stream
        .get_tracks()
        .iter()
        .filter_map(|t| t.dyn_into::<web::MediaStreamTrack>().ok())
        .collect::<Vec<_>>()
        .into_iter()
}

/// Draw the current video frame into `canvas` and return it as inline JPEG.
/// `max_width` of zero keeps the native size.
pub fn capture_frame(
    video: &web::HtmlVideoElement,
    canvas: &web::HtmlCanvasElement,
    max_width: u32,
) -> Option<InlineImage> {
    let (vw, vh) = (video.video_width(), video.video_height());
    let (w, h) = if max_width == 0 {
        (vw, vh)
    } else {
        capture_size(vw, vh, max_width)
    };
    if w == 0 || h == 0 {
        return None;
    }
    canvas.set_width(w);
    canvas.set_height(h);
    let ctx = canvas
        .get_context("2d")
        .ok()
        .flatten()?
        .dyn_into::<web::CanvasRenderingContext2d>()
        .ok()?;
    ctx.draw_image_with_html_video_element_and_dw_and_dh(video, 0.0, 0.0, w as f64, h as f64)
        .ok()?;
    let url = canvas
        .to_data_url_with_type_and_encoder_options("image/jpeg", &JsValue::from_f64(CAPTURE_JPEG_QUALITY))
        .ok()?;
    InlineImage::from_data_url(&url)
}
