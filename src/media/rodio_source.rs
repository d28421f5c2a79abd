use crate::media::media_source::{MediaError, MediaResult, MediaSource};
use rodio::{Decoder, OutputStreamHandle, Sink};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Audio output through rodio
///
/// The `OutputStream` that owns the device is not `Send`, so it stays with
/// the caller; this type only holds the stream handle and the sink.
pub struct RodioMediaSource {
    handle: OutputStreamHandle,
    path: Option<PathBuf>,
    sink: Option<Sink>,
    rate: f64,
}

impl RodioMediaSource {
    pub fn new(handle: OutputStreamHandle) -> Self {
        Self {
            handle,
            path: None,
            sink: None,
            rate: 1.0,
        }
    }

    fn open_decoder(path: &Path) -> MediaResult<Decoder<BufReader<File>>> {
        let file = File::open(path).map_err(|source| MediaError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Decoder::new(BufReader::new(file)).map_err(|e| MediaError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Make sure the sink still has the decoded source queued
    ///
    /// A sink that played to the end of the file drops its source; seeking
    /// back into it needs a fresh decoder.
    fn ensure_queued(&mut self) -> MediaResult<&Sink> {
        let path = self.path.as_deref().ok_or(MediaError::NoSource)?;

        let needs_reload = self.sink.as_ref().map_or(true, |s| s.empty());
        if needs_reload {
            let sink = Sink::try_new(&self.handle).map_err(|e| MediaError::Output(e.to_string()))?;
            sink.pause();
            sink.set_speed(self.rate as f32);
            sink.append(Self::open_decoder(path)?);
            debug!("Queued {:?} on a new sink", path);
            self.sink = Some(sink);
        }

        self.sink.as_ref().ok_or(MediaError::NoSource)
    }
}

impl MediaSource for RodioMediaSource {
    fn set_source(&mut self, path: &Path) -> MediaResult<()> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn clear_source(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.path = None;
    }

    fn load(&mut self) -> MediaResult<()> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.ensure_queued()?;
        info!("Loaded audio {:?}", self.path);
        Ok(())
    }

    fn has_source(&self) -> bool {
        self.path.is_some()
    }

    fn play(&mut self) -> MediaResult<()> {
        self.ensure_queued()?.play();
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    fn is_paused(&self) -> bool {
        self.sink.as_ref().map_or(true, |s| s.is_paused() || s.empty())
    }

    fn current_time(&self) -> f64 {
        self.sink
            .as_ref()
            .map(|s| s.get_pos().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn set_current_time(&mut self, secs: f64) -> MediaResult<()> {
        let position = secs.max(0.0);
        self.ensure_queued()?
            .try_seek(Duration::from_secs_f64(position))
            .map_err(|e| MediaError::Seek {
                position,
                message: e.to_string(),
            })
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate;
        if let Some(sink) = &self.sink {
            sink.set_speed(rate as f32);
        }
    }
}
