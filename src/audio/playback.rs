use anyhow::{bail, Result};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use log::{error, info, warn};
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use super::{DecodedAudio, FrequencyFrame, FrequencySampler, PlaybackState, TimerModel};

/// What the controller must do in response to a user trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    BeginLoad,
    Pause,
    Resume,
    Ignore,
}

/// The pure playback state machine: state transitions plus the elapsed-time
/// model, with no audio device attached. The controller drives it from
/// decode/ended/user events.
#[derive(Debug, Default)]
pub struct Transport {
    state: PlaybackState,
    timer: TimerModel,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn timer(&self) -> &TimerModel {
        &self.timer
    }

    /// A user trigger. Idle and Ended start a load; Playing pauses (never a
    /// second start); Paused resumes; a trigger mid-load is ignored.
    pub fn toggle(&mut self) -> ToggleAction {
        match self.state {
            PlaybackState::Idle | PlaybackState::Ended => ToggleAction::BeginLoad,
            PlaybackState::Loading => ToggleAction::Ignore,
            PlaybackState::Playing => {
                self.state = PlaybackState::Paused;
                ToggleAction::Pause
            }
            PlaybackState::Paused => {
                self.state = PlaybackState::Playing;
                ToggleAction::Resume
            }
        }
    }

    pub fn on_load_started(&mut self) {
        self.state = PlaybackState::Loading;
    }

    /// Decode finished and a fresh playback node is live.
    pub fn on_decoded(&mut self) {
        self.state = PlaybackState::Playing;
        self.timer.reset();
    }

    /// Decode failed; recoverable, the user may trigger again.
    pub fn on_decode_error(&mut self) {
        self.state = PlaybackState::Idle;
    }

    /// The playback node drained. Ended is ready-to-replay: the next trigger
    /// loads again (from cache, if the controller kept the buffer).
    pub fn on_ended(&mut self) {
        self.state = PlaybackState::Ended;
        self.timer.reset();
    }

    /// 1 Hz tick; only advances while Playing.
    pub fn tick_timer(&mut self) {
        if self.state == PlaybackState::Playing {
            self.timer.tick();
        }
    }
}

/// Wall-clock playhead: advances while playing, freezes across pauses.
#[derive(Debug, Clone, Copy, Default)]
struct PlayClock {
    base: Duration,
    resumed_at: Option<Instant>,
}

impl PlayClock {
    fn start(&mut self, now: Instant) {
        self.base = Duration::ZERO;
        self.resumed_at = Some(now);
    }

    fn pause(&mut self, now: Instant) {
        if let Some(resumed) = self.resumed_at.take() {
            self.base += now - resumed;
        }
    }

    fn resume(&mut self, now: Instant) {
        if self.resumed_at.is_none() {
            self.resumed_at = Some(now);
        }
    }

    fn reset(&mut self) {
        self.base = Duration::ZERO;
        self.resumed_at = None;
    }

    fn elapsed(&self, now: Instant) -> Duration {
        self.base + self.resumed_at.map(|t| now - t).unwrap_or_default()
    }
}

enum LoadEvent {
    Decoded(DecodedAudio),
    Failed(String),
}

fn decode_file(path: &Path) -> Result<DecodedAudio> {
    let file = BufReader::new(File::open(path)?);
    let source = Decoder::new(file)?;

    let channels = source.channels();
    let sample_rate = source.sample_rate();
    let interleaved: Vec<f32> = source.convert_samples().collect();
    if interleaved.is_empty() {
        bail!("no samples decoded from {:?}", path);
    }

    let mono = interleaved
        .chunks_exact(channels as usize)
        .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
        .collect();

    Ok(DecodedAudio {
        interleaved,
        mono,
        channels,
        sample_rate,
    })
}

fn spawn_decode(path: PathBuf, sender: Sender<LoadEvent>) {
    thread::spawn(move || {
        let event = match decode_file(&path) {
            Ok(decoded) => LoadEvent::Decoded(decoded),
            Err(e) => LoadEvent::Failed(e.to_string()),
        };
        if sender.send(event).is_err() {
            warn!("Decode result dropped: controller is gone");
        }
    });
}

/// Owns the audio graph and coordinates decode, playback, the 1 Hz timer
/// and frame-by-frame spectrum capture.
///
/// At most one playback node ([`Sink`]) is live at any time; a node is
/// single-use and a fresh one is bound from the cached decoded buffer for
/// every (re)start. Pause is per-instance: it suspends this controller's
/// sink, nothing else.
pub struct PlaybackController {
    audio_src: PathBuf,
    looped: bool,

    transport: Transport,
    sampler: FrequencySampler,
    clock: PlayClock,

    #[allow(dead_code)]
    stream: OutputStream,
    stream_handle: OutputStreamHandle,
    sink: Option<Sink>,
    decoded: Option<DecodedAudio>,

    load_rx: Option<Receiver<LoadEvent>>,
    next_timer_tick: Option<Instant>,
    held_frame: FrequencyFrame,
}

impl PlaybackController {
    pub fn new(audio_src: PathBuf, looped: bool) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default()?;

        Ok(Self {
            audio_src,
            looped,
            transport: Transport::new(),
            sampler: FrequencySampler::new(),
            clock: PlayClock::default(),
            stream,
            stream_handle,
            sink: None,
            decoded: None,
            load_rx: None,
            next_timer_tick: None,
            held_frame: FrequencyFrame::default(),
        })
    }

    pub fn state(&self) -> PlaybackState {
        self.transport.state()
    }

    pub fn time_display(&self) -> String {
        self.transport.timer().display()
    }

    /// The user trigger (a click on the canvas).
    pub fn toggle(&mut self) {
        match self.transport.toggle() {
            ToggleAction::BeginLoad => self.begin_load(),
            ToggleAction::Pause => {
                if let Some(sink) = &self.sink {
                    sink.pause();
                }
                self.clock.pause(Instant::now());
                self.next_timer_tick = None;
                info!("Playback paused");
            }
            ToggleAction::Resume => {
                if let Some(sink) = &self.sink {
                    sink.play();
                }
                let now = Instant::now();
                self.clock.resume(now);
                self.next_timer_tick = Some(now + Duration::from_secs(1));
                info!("Playback resumed");
            }
            ToggleAction::Ignore => {}
        }
    }

    /// Start loading the configured source (also the autoplay entry point).
    /// A previously decoded buffer replays without touching the file again.
    pub fn begin_load(&mut self) {
        if !matches!(self.state(), PlaybackState::Idle | PlaybackState::Ended) {
            return;
        }

        self.transport.on_load_started();

        if self.decoded.is_some() {
            self.start_playback();
            return;
        }

        info!("Loading audio from {:?}", self.audio_src);
        let (tx, rx) = unbounded();
        self.load_rx = Some(rx);
        spawn_decode(self.audio_src.clone(), tx);
    }

    /// Bind a fresh single-use playback node to the decoded buffer and start
    /// it at offset zero.
    fn start_playback(&mut self) {
        let Some(decoded) = &self.decoded else {
            return;
        };

        match Sink::try_new(&self.stream_handle) {
            Ok(sink) => {
                let buffer = SamplesBuffer::new(
                    decoded.channels,
                    decoded.sample_rate,
                    decoded.interleaved.clone(),
                );
                if self.looped {
                    sink.append(buffer.repeat_infinite());
                } else {
                    sink.append(buffer);
                }
                sink.play();

                let now = Instant::now();
                self.clock.start(now);
                self.next_timer_tick = Some(now + Duration::from_secs(1));
                self.sampler.reset();
                self.sink = Some(sink);
                self.transport.on_decoded();
                info!(
                    "Playback started ({} Hz, {} channels, {:.1}s)",
                    decoded.sample_rate,
                    decoded.channels,
                    decoded.duration_secs()
                );
            }
            Err(e) => {
                error!("Failed to create playback node: {}", e);
                self.transport.on_decode_error();
            }
        }
    }

    /// Per-tick housekeeping: decode completion, end-of-track detection and
    /// the 1 Hz timer cadence.
    pub fn update(&mut self, now: Instant) {
        if let Some(rx) = self.load_rx.take() {
            match rx.try_recv() {
                Ok(LoadEvent::Decoded(decoded)) => {
                    info!(
                        "Decoded {} samples at {} Hz",
                        decoded.mono.len(),
                        decoded.sample_rate
                    );
                    self.sampler.load(decoded.mono.clone());
                    self.decoded = Some(decoded);
                    self.start_playback();
                }
                Ok(LoadEvent::Failed(err)) => {
                    error!("Decoding audio file failed: {}", err);
                    self.transport.on_decode_error();
                }
                Err(TryRecvError::Empty) => {
                    self.load_rx = Some(rx);
                }
                Err(TryRecvError::Disconnected) => {
                    error!("Decode worker disappeared without a result");
                    self.transport.on_decode_error();
                }
            }
        }

        if self.state() == PlaybackState::Playing
            && self.sink.as_ref().map_or(false, |s| s.empty())
        {
            self.handle_ended();
        }

        if self.state() == PlaybackState::Playing {
            while let Some(due) = self.next_timer_tick {
                if now < due {
                    break;
                }
                self.transport.tick_timer();
                self.next_timer_tick = Some(due + Duration::from_secs(1));
            }
        }
    }

    fn handle_ended(&mut self) {
        info!("Playback ended");
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.clock.reset();
        self.next_timer_tick = None;
        self.held_frame = FrequencyFrame::default();
        self.sampler.reset();
        self.transport.on_ended();
    }

    /// The frame loop's data pull, gated by playback state: fresh spectrum
    /// while Playing, the frozen last frame while Paused, silence otherwise.
    pub fn sample_frame(&mut self) -> FrequencyFrame {
        match self.state() {
            PlaybackState::Playing => {
                let playhead = self.playhead_samples(Instant::now());
                let frame = self.sampler.sample(playhead);
                self.held_frame = frame.clone();
                frame
            }
            PlaybackState::Paused => self.held_frame.clone(),
            _ => FrequencyFrame::default(),
        }
    }

    fn playhead_samples(&self, now: Instant) -> usize {
        let Some(decoded) = &self.decoded else {
            return 0;
        };
        let mut playhead =
            (self.clock.elapsed(now).as_secs_f64() * decoded.sample_rate as f64) as usize;
        if self.looped && !decoded.mono.is_empty() {
            playhead %= decoded.mono.len();
        }
        playhead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_starts_idle() {
        assert_eq!(Transport::new().state(), PlaybackState::Idle);
    }

    #[test]
    fn idle_trigger_begins_load() {
        let mut transport = Transport::new();
        assert_eq!(transport.toggle(), ToggleAction::BeginLoad);
        transport.on_load_started();
        assert_eq!(transport.state(), PlaybackState::Loading);
    }

    #[test]
    fn trigger_while_loading_is_ignored() {
        let mut transport = Transport::new();
        transport.on_load_started();
        assert_eq!(transport.toggle(), ToggleAction::Ignore);
        assert_eq!(transport.state(), PlaybackState::Loading);
    }

    #[test]
    fn decode_success_enters_playing_with_zeroed_timer() {
        let mut transport = Transport::new();
        transport.on_load_started();
        transport.on_decoded();
        assert_eq!(transport.state(), PlaybackState::Playing);
        assert_eq!(transport.timer().display(), "00:00");
    }

    #[test]
    fn decode_failure_returns_to_idle() {
        let mut transport = Transport::new();
        transport.on_load_started();
        transport.on_decode_error();
        assert_eq!(transport.state(), PlaybackState::Idle);
        // recoverable: the next trigger loads again
        assert_eq!(transport.toggle(), ToggleAction::BeginLoad);
    }

    #[test]
    fn second_trigger_pauses_instead_of_double_starting() {
        let mut transport = Transport::new();
        transport.on_load_started();
        transport.on_decoded();
        assert_eq!(transport.toggle(), ToggleAction::Pause);
        assert_eq!(transport.state(), PlaybackState::Paused);
    }

    #[test]
    fn pause_resume_round_trip() {
        let mut transport = Transport::new();
        transport.on_load_started();
        transport.on_decoded();
        transport.toggle();
        assert_eq!(transport.toggle(), ToggleAction::Resume);
        assert_eq!(transport.state(), PlaybackState::Playing);
    }

    #[test]
    fn timer_only_ticks_while_playing() {
        let mut transport = Transport::new();
        transport.on_load_started();
        transport.on_decoded();
        transport.tick_timer();
        transport.tick_timer();
        assert_eq!(transport.timer().display(), "00:02");

        transport.toggle(); // pause
        transport.tick_timer();
        assert_eq!(transport.timer().display(), "00:02");
    }

    #[test]
    fn ended_resets_timer_and_allows_replay() {
        let mut transport = Transport::new();
        transport.on_load_started();
        transport.on_decoded();
        for _ in 0..95 {
            transport.tick_timer();
        }
        assert_eq!(transport.timer().display(), "01:35");

        transport.on_ended();
        assert_eq!(transport.state(), PlaybackState::Ended);
        assert_eq!(transport.timer().display(), "00:00");
        assert_eq!(transport.toggle(), ToggleAction::BeginLoad);
    }

    #[test]
    fn clock_accumulates_across_pause() {
        let t0 = Instant::now();
        let mut clock = PlayClock::default();

        clock.start(t0);
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(5)), Duration::from_secs(5));

        clock.pause(t0 + Duration::from_secs(5));
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(9)), Duration::from_secs(5));

        clock.resume(t0 + Duration::from_secs(9));
        assert_eq!(
            clock.elapsed(t0 + Duration::from_secs(10)),
            Duration::from_secs(6)
        );
    }

    #[test]
    fn clock_restart_begins_at_zero() {
        let t0 = Instant::now();
        let mut clock = PlayClock::default();
        clock.start(t0);
        clock.pause(t0 + Duration::from_secs(30));

        clock.start(t0 + Duration::from_secs(60));
        assert_eq!(
            clock.elapsed(t0 + Duration::from_secs(61)),
            Duration::from_secs(1)
        );

        clock.reset();
        assert_eq!(clock.elapsed(t0 + Duration::from_secs(61)), Duration::ZERO);
    }
}
