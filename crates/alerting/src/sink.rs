//! Fire-and-forget alert dispatch

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::{FallbackBeep, SoundPlayer, SoundResource};

/// Receives the one-shot drowsiness alert from the frame loop.
///
/// `fire_alert` must return immediately; it never reports failure.
pub trait AlertSink {
    fn fire_alert(&self);
}

impl<S: AlertSink + ?Sized> AlertSink for &S {
    fn fire_alert(&self) {
        (**self).fire_alert()
    }
}

/// Plays the alert sound on the runtime's blocking pool.
///
/// Each call spawns one detached task: the handle is dropped, so the task
/// is never joined or cancelled and its outcome is only visible through
/// logs and the fallback beep.
pub struct AudioAlert {
    runtime: Handle,
    sound: Arc<SoundResource>,
    player: Arc<dyn SoundPlayer>,
    fallback: Arc<dyn FallbackBeep>,
}

impl AudioAlert {
    pub fn new(
        runtime: Handle,
        sound: SoundResource,
        player: Arc<dyn SoundPlayer>,
        fallback: Arc<dyn FallbackBeep>,
    ) -> Self {
        Self {
            runtime,
            sound: Arc::new(sound),
            player,
            fallback,
        }
    }
}

impl AlertSink for AudioAlert {
    fn fire_alert(&self) {
        let sound = Arc::clone(&self.sound);
        let player = Arc::clone(&self.player);
        let fallback = Arc::clone(&self.fallback);

        self.runtime.spawn_blocking(move || match player.play(&sound) {
            Ok(()) => debug!("Alert sound finished: {}", sound.path().display()),
            Err(e) => {
                warn!("Could not play alert sound: {}", e);
                metrics::counter!("alert_playback_failures_total").increment(1);
                fallback.beep();
            }
        });
    }
}
