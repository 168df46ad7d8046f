//! Background decoding of font sheets
//!
//! Each path-based font load runs on its own thread, which decodes the BMP
//! and sends the result back over a channel. The threads never touch any
//! surface; the owning surface drains finished jobs with
//! [`FontLoader::poll`] or [`FontLoader::wait`] on its own thread.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use log::{debug, warn};

use super::font::PendingFont;
use crate::error::{Result, RetroError};
use crate::image::Image;

type JobResult = (u64, Result<Image>);

pub(crate) struct FontLoader {
    sender: Sender<JobResult>,
    receiver: Receiver<JobResult>,
    next_job: u64,
    pending: HashMap<u64, PendingFont>,
}

impl FontLoader {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            next_job: 0,
            pending: HashMap::new(),
        }
    }

    /// Number of loads still in flight
    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    /// True if a load for font `id` is in flight
    pub(crate) fn is_loading(&self, id: &str) -> bool {
        self.pending.values().any(|p| p.layout.id == id)
    }

    /// Start decoding `path` on a worker thread
    pub(crate) fn submit(&mut self, path: PathBuf, job: PendingFont) {
        let id = self.next_job;
        self.next_job += 1;

        let sender = self.sender.clone();
        let name = format!("font-{}", job.layout.id);
        let source = path.clone();
        let spawned = thread::Builder::new().name(name).spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| Image::from_bmp(&path)))
                .unwrap_or_else(|_| {
                    Err(RetroError::ImageLoad {
                        source: path.clone(),
                        reason: "decoder panicked".to_string(),
                    })
                });
            // The surface may be gone; nothing to report to then
            let _ = sender.send((id, result));
        });

        match spawned {
            Ok(_) => {
                debug!("font '{}' loading from {}", job.layout.id, source.display());
            },
            Err(e) => {
                warn!("could not spawn loader thread: {}", e);
                let _ = self.sender.send((
                    id,
                    Err(RetroError::ImageLoad {
                        source,
                        reason: e.to_string(),
                    }),
                ));
            },
        }
        self.pending.insert(id, job);
    }

    /// Finished loads, without blocking
    pub(crate) fn poll(&mut self) -> Vec<(PendingFont, Result<Image>)> {
        let mut done = Vec::new();
        while let Ok((id, result)) = self.receiver.try_recv() {
            if let Some(job) = self.pending.remove(&id) {
                done.push((job, result));
            }
        }
        done
    }

    /// Block until the next load finishes. `None` when nothing is pending.
    pub(crate) fn wait(&mut self) -> Option<(PendingFont, Result<Image>)> {
        while !self.pending.is_empty() {
            let (id, result) = self.receiver.recv().ok()?;
            if let Some(job) = self.pending.remove(&id) {
                return Some((job, result));
            }
        }
        None
    }
}

impl Default for FontLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::font::FontLayout;

    fn job(id: &str) -> PendingFont {
        PendingFont {
            layout: FontLayout {
                id: id.to_string(),
                char_width: 8,
                char_height: 8,
                map: vec!['A'],
                invert: false,
            },
            on_success: None,
            on_error: None,
        }
    }

    #[test]
    fn test_missing_file_reports_error() {
        let mut loader = FontLoader::new();
        loader.submit(PathBuf::from("/nonexistent/font.bmp"), job("missing"));
        assert_eq!(loader.pending(), 1);
        assert!(loader.is_loading("missing"));

        let (done, result) = loader.wait().unwrap();
        assert_eq!(done.layout.id, "missing");
        assert!(matches!(result, Err(RetroError::ImageLoad { .. })));
        assert_eq!(loader.pending(), 0);
        assert!(loader.wait().is_none());
    }

    #[test]
    fn test_poll_drains_every_job() {
        let mut loader = FontLoader::new();
        loader.submit(PathBuf::from("/nonexistent/a.bmp"), job("a"));
        loader.submit(PathBuf::from("/nonexistent/b.bmp"), job("b"));

        let mut seen = Vec::new();
        while loader.pending() > 0 {
            for (done, _) in loader.poll() {
                seen.push(done.layout.id);
            }
            thread::yield_now();
        }
        seen.sort();
        assert_eq!(seen, vec!["a", "b"]);
    }
}
