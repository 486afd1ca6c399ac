//! Timer-driven story playback.
//!
//! [`StoryHandle::open`] spawns a task that owns the [`StoryPlayer`] and a
//! single pending timer.  The loop re-derives the deadline on every
//! iteration, so any state change cancels the previous slide's timer and
//! arms a fresh one -- there is never more than one timer in flight and no
//! drift accumulates across slides.  Gestures arrive on an mpsc channel;
//! snapshots leave on a watch channel the view renders from.

use std::time::Instant;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use parley_shared::Story;

use super::player::{StoryError, StoryPlayer};

/// Gestures the view forwards to the playback task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryCommand {
    /// Finger down on the slide surface: pause.
    PressIn,
    /// Finger up: resume with the remaining duration.
    PressOut,
    /// Quick tap: manual next.
    Tap,
    /// Long-press gesture: previous slide.
    PreviousHold,
    /// Reply field focused: pause.
    ReplyFocus,
    /// Reply field blurred: resume.
    ReplyBlur,
    /// Close the story view.
    Close,
}

/// What the view needs to render the story chrome.
#[derive(Debug, Clone, PartialEq)]
pub struct StorySnapshot {
    /// Current slide, `None` once finished.
    pub index: Option<usize>,
    pub paused: bool,
    /// When true the view should close.
    pub finished: bool,
    /// One progress value per slide: completed slides full, current slide
    /// live, future slides empty.
    pub progress: Vec<f32>,
}

/// Handle to a running story playback task.
///
/// Dropping the handle closes the command channel, which stops the task.
pub struct StoryHandle {
    cmd_tx: mpsc::Sender<StoryCommand>,
    snapshot_rx: watch::Receiver<StorySnapshot>,
}

impl StoryHandle {
    /// Start playback of `story` at slide 0.
    pub fn open(story: Story) -> Result<Self, StoryError> {
        let now = now_std();
        let player = StoryPlayer::new(story, now)?;

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (snap_tx, snapshot_rx) = watch::channel(snapshot(&player, now));

        tokio::spawn(playback_loop(player, cmd_rx, snap_tx));

        Ok(Self {
            cmd_tx,
            snapshot_rx,
        })
    }

    /// Forward a gesture to the playback task.  A full queue (the view
    /// spamming gestures faster than they can be applied) drops the
    /// gesture rather than blocking the caller.
    pub fn send(&self, cmd: StoryCommand) {
        if let Err(e) = self.cmd_tx.try_send(cmd) {
            debug!(error = %e, "story command dropped");
        }
    }

    /// Subscribe to playback snapshots.
    pub fn subscribe(&self) -> watch::Receiver<StorySnapshot> {
        self.snapshot_rx.clone()
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> StorySnapshot {
        self.snapshot_rx.borrow().clone()
    }
}

// The tokio clock so that paused-time tests drive the loop; `into_std`
// keeps the player itself runtime-agnostic.
fn now_std() -> Instant {
    tokio::time::Instant::now().into_std()
}

fn snapshot(player: &StoryPlayer, now: Instant) -> StorySnapshot {
    StorySnapshot {
        index: player.current_index(),
        paused: player.is_paused(),
        finished: player.is_finished(),
        progress: player.progress_bars(now),
    }
}

async fn playback_loop(
    mut player: StoryPlayer,
    mut cmd_rx: mpsc::Receiver<StoryCommand>,
    snap_tx: watch::Sender<StorySnapshot>,
) {
    loop {
        // The single-shot timer for the current slide.  Recomputed each
        // iteration: a state change on the other select arm implicitly
        // cancels it.
        let deadline = player.deadline();

        tokio::select! {
            () = async {
                match deadline {
                    Some(d) => tokio::time::sleep_until(tokio::time::Instant::from_std(d)).await,
                    None => std::future::pending().await,
                }
            } => {
                player.tick(now_std());
            }

            cmd = cmd_rx.recv() => {
                let now = now_std();
                match cmd {
                    Some(StoryCommand::PressIn) | Some(StoryCommand::ReplyFocus) => {
                        player.pause(now);
                    }
                    Some(StoryCommand::PressOut) | Some(StoryCommand::ReplyBlur) => {
                        player.resume(now);
                    }
                    Some(StoryCommand::Tap) => player.tap(now),
                    Some(StoryCommand::PreviousHold) => player.previous(now),
                    Some(StoryCommand::Close) | None => break,
                }
            }
        }

        snap_tx.send_replace(snapshot(&player, now_std()));

        if player.is_finished() {
            debug!("story playback finished");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use parley_shared::{Slide, SlideKind};
    use uuid::Uuid;

    fn mixed_story() -> Story {
        Story {
            owner_id: Uuid::new_v4(),
            owner_avatar: "https://cdn/avatar.png".into(),
            owner_name: "Ada".into(),
            slides: vec![
                Slide::new(SlideKind::Text, "hello"),
                Slide::new(SlideKind::Image, "https://cdn/pic.jpg"),
                Slide::new(SlideKind::Video, "https://cdn/clip.mp4"),
            ],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn auto_advances_after_slide_duration() {
        let handle = StoryHandle::open(mixed_story()).unwrap();
        let mut rx = handle.subscribe();
        assert_eq!(rx.borrow().index, Some(0));

        tokio::time::advance(Duration::from_millis(6001)).await;
        rx.changed().await.unwrap();

        let snap = rx.borrow().clone();
        assert_eq!(snap.index, Some(1));
        assert!(!snap.finished);
        assert_eq!(snap.progress[0], 1.0);
        assert!(snap.progress[1] < 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn press_freezes_the_clock() {
        let handle = StoryHandle::open(mixed_story()).unwrap();
        let mut rx = handle.subscribe();

        tokio::time::advance(Duration::from_millis(3000)).await;
        handle.send(StoryCommand::PressIn);
        rx.changed().await.unwrap();
        assert!(rx.borrow().paused);

        // Held well past the slide's nominal duration: no advance.
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(rx.borrow().index, Some(0));

        // Releasing replays the remaining 3 seconds, not a full slide.
        handle.send(StoryCommand::PressOut);
        rx.changed().await.unwrap();
        assert!(!rx.borrow().paused);

        tokio::time::advance(Duration::from_millis(3001)).await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().index, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn tapping_through_the_last_slide_finishes() {
        let handle = StoryHandle::open(mixed_story()).unwrap();
        let mut rx = handle.subscribe();

        for expected in [Some(1), Some(2), None] {
            handle.send(StoryCommand::Tap);
            rx.changed().await.unwrap();
            assert_eq!(rx.borrow().index, expected);
        }

        assert!(rx.borrow().finished);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_focus_pauses_like_a_press() {
        let handle = StoryHandle::open(mixed_story()).unwrap();
        let mut rx = handle.subscribe();

        handle.send(StoryCommand::ReplyFocus);
        rx.changed().await.unwrap();
        assert!(rx.borrow().paused);

        handle.send(StoryCommand::ReplyBlur);
        rx.changed().await.unwrap();
        assert!(!rx.borrow().paused);
    }

    #[tokio::test(start_paused = true)]
    async fn previous_hold_steps_back() {
        let handle = StoryHandle::open(mixed_story()).unwrap();
        let mut rx = handle.subscribe();

        handle.send(StoryCommand::Tap);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().index, Some(1));

        handle.send(StoryCommand::PreviousHold);
        rx.changed().await.unwrap();
        let snap = rx.borrow().clone();
        assert_eq!(snap.index, Some(0));
        // Back at full duration: progress restarts from zero.
        assert!(snap.progress[0] < 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn switching_slides_cancels_the_old_timer() {
        let handle = StoryHandle::open(mixed_story()).unwrap();
        let mut rx = handle.subscribe();

        // 5s into slide 0, tap to slide 1.  The old deadline (t=6s) must
        // not fire for the new slide.
        tokio::time::advance(Duration::from_millis(5000)).await;
        handle.send(StoryCommand::Tap);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().index, Some(1));

        tokio::time::advance(Duration::from_millis(1500)).await;
        // t = 6.5s overall, but slide 1 is only 1.5s in.
        assert_eq!(rx.borrow().index, Some(1));

        tokio::time::advance(Duration::from_millis(4501)).await;
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().index, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_story_cannot_be_opened() {
        let story = Story {
            owner_id: Uuid::new_v4(),
            owner_avatar: String::new(),
            owner_name: "Ada".into(),
            slides: vec![],
        };
        assert!(StoryHandle::open(story).is_err());
    }
}
