//! Slide playback state machine.
//!
//! One player per opened story.  Text and image slides run 6 seconds,
//! video slides 30.  Exactly one slide's timer is conceptually active at a
//! time; `remaining` lives here as controller state, never inside a timer
//! callback, so pausing and resuming cannot drift.

use std::time::{Duration, Instant};

use thiserror::Error;

use parley_shared::{slide_duration, Slide, Story};

#[derive(Error, Debug)]
pub enum StoryError {
    /// A story must have at least one slide to be opened.
    #[error("story has no slides")]
    NoSlides,
}

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// The current slide's clock is running; it expires at
    /// `started + remaining`.
    Playing {
        index: usize,
        started: Instant,
        remaining: Duration,
    },
    /// Frozen mid-slide with `remaining` still to consume.
    Paused { index: usize, remaining: Duration },
    /// Past the last slide; the view should close.
    Finished,
}

/// Drives a story's ordered slides.
#[derive(Debug)]
pub struct StoryPlayer {
    story: Story,
    state: Playback,
}

impl StoryPlayer {
    /// Open a story, starting slide 0 at full duration.
    pub fn new(mut story: Story, now: Instant) -> Result<Self, StoryError> {
        let first = story.slides.first().ok_or(StoryError::NoSlides)?;
        let remaining = slide_duration(first.kind);
        story.slides[0].viewed = true;

        Ok(Self {
            story,
            state: Playback::Playing {
                index: 0,
                started: now,
                remaining,
            },
        })
    }

    pub fn state(&self) -> Playback {
        self.state
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    /// Index of the slide on screen, `None` once finished.
    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            Playback::Playing { index, .. } | Playback::Paused { index, .. } => Some(index),
            Playback::Finished => None,
        }
    }

    pub fn current_slide(&self) -> Option<&Slide> {
        self.current_index().map(|i| &self.story.slides[i])
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, Playback::Finished)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, Playback::Paused { .. })
    }

    /// When the current slide's clock expires, if it is running.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            Playback::Playing {
                started, remaining, ..
            } => Some(started + remaining),
            _ => None,
        }
    }

    /// Timer callback: advance if the current slide's clock has expired
    /// while playing.  Early or spurious wakeups are no-ops.
    pub fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.deadline() {
            if now >= deadline {
                self.advance(now);
            }
        }
    }

    /// Quick tap: manual "next".  Resets the new slide to full duration;
    /// on the last slide this finishes playback.  No-op once finished.
    pub fn tap(&mut self, now: Instant) {
        self.advance(now);
    }

    /// Long-press gesture: back to the previous slide at full duration.
    /// No-op at index 0 (the state, including a pause, is left untouched).
    pub fn previous(&mut self, now: Instant) {
        match self.current_index() {
            Some(index) if index > 0 => self.enter(index - 1, now),
            _ => {}
        }
    }

    /// Press-and-hold (or reply-field focus): freeze the clock, keeping
    /// the unconsumed remainder.
    pub fn pause(&mut self, now: Instant) {
        if let Playback::Playing {
            index,
            started,
            remaining,
        } = self.state
        {
            let elapsed = now.saturating_duration_since(started);
            self.state = Playback::Paused {
                index,
                remaining: remaining.saturating_sub(elapsed),
            };
        }
    }

    /// Release (or reply-field blur): restart the clock for exactly the
    /// stored remainder.
    pub fn resume(&mut self, now: Instant) {
        if let Playback::Paused { index, remaining } = self.state {
            self.state = Playback::Playing {
                index,
                started: now,
                remaining,
            };
        }
    }

    /// Elapsed fraction of slide `i` in `[0, 1]`: slides before the
    /// current index are full, slides after it empty, the current slide
    /// reports live progress (frozen while paused).
    pub fn progress(&self, i: usize, now: Instant) -> f32 {
        let (index, consumed) = match self.state {
            Playback::Finished => return 1.0,
            Playback::Playing {
                index,
                started,
                remaining,
            } => {
                let total = slide_duration(self.story.slides[index].kind);
                let running = now.saturating_duration_since(started);
                (index, total.saturating_sub(remaining) + running)
            }
            Playback::Paused { index, remaining } => {
                let total = slide_duration(self.story.slides[index].kind);
                (index, total.saturating_sub(remaining))
            }
        };

        if i < index {
            1.0
        } else if i > index {
            0.0
        } else {
            let total = slide_duration(self.story.slides[index].kind);
            (consumed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
        }
    }

    /// Full indicator row, one value per slide.
    pub fn progress_bars(&self, now: Instant) -> Vec<f32> {
        (0..self.story.slides.len())
            .map(|i| self.progress(i, now))
            .collect()
    }

    fn advance(&mut self, now: Instant) {
        let Some(index) = self.current_index() else {
            return;
        };
        if index + 1 < self.story.slides.len() {
            self.enter(index + 1, now);
        } else {
            self.state = Playback::Finished;
        }
    }

    fn enter(&mut self, index: usize, now: Instant) {
        self.story.slides[index].viewed = true;
        self.state = Playback::Playing {
            index,
            started: now,
            remaining: slide_duration(self.story.slides[index].kind),
        };
    }
}
