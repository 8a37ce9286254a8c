use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use notify_rust::{Notification, Urgency};
use tracing::debug;

use crate::timer::Phase;

const APP_NAME: &str = "relogio";

/// Audible and desktop side effects of the timer. All of them are
/// best-effort: a failure here never reaches the timer.
pub trait Alert {
    /// Fired on every tick inside the final seconds of a phase.
    fn warning(&mut self, remaining: Duration);

    fn phase_end(&mut self, finished: Phase, next: Phase);

    fn notice(&mut self, title: &str, body: &str);
}

#[derive(Debug, Default)]
pub struct DesktopAlert;

impl Alert for DesktopAlert {
    fn warning(&mut self, remaining: Duration) {
        debug!(remaining_secs = remaining.as_secs(), "warning beep");
        bell();
    }

    fn phase_end(&mut self, finished: Phase, next: Phase) {
        bell();
        debug!(?finished, ?next, "phase end alert");
        show(&Toast::phase_end(finished));
    }

    fn notice(&mut self, title: &str, body: &str) {
        show(&Toast {
            title: title.to_string(),
            body: body.to_string(),
            icon: "dialog-warning",
            urgency: Urgency::Normal,
            chime: None,
        });
    }
}

/// A desktop notification plus the sound that goes with it.
struct Toast {
    title: String,
    body: String,
    icon: &'static str,
    urgency: Urgency,
    chime: Option<&'static str>,
}

impl Toast {
    // Running into a break can wait for the user; the end of a break cannot.
    fn phase_end(finished: Phase) -> Self {
        match finished {
            Phase::Work => Self {
                title: "Break Time! ☕".into(),
                body: "Work cycle complete. Take a short break.".into(),
                icon: "face-smile",
                urgency: Urgency::Normal,
                chime: Some("/usr/share/sounds/freedesktop/stereo/complete.oga"),
            },
            Phase::Break => Self {
                title: "Back to Work! 🎯".into(),
                body: "Break over. Let's focus again.".into(),
                icon: "alarm-clock",
                urgency: Urgency::Critical,
                chime: Some("/usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga"),
            },
        }
    }
}

fn bell() {
    let mut stdout = io::stdout();
    let _ = stdout.write_all(b"\x07");
    let _ = stdout.flush();
}

fn show(toast: &Toast) {
    let _ = Notification::new()
        .summary(&toast.title)
        .body(&toast.body)
        .appname(APP_NAME)
        .icon(toast.icon)
        .urgency(toast.urgency)
        .show();

    if let Some(chime) = toast.chime {
        std::thread::spawn(move || play(chime));
    }
}

// Plays the first sound file that exists, preferring the phase's own chime.
fn play(chime: &'static str) {
    let candidates = [
        ("paplay", chime),
        ("aplay", "/usr/share/sounds/sound-icons/guitar-11.wav"),
        ("aplay", "/usr/share/sounds/generic.wav"),
    ];
    if let Some((cmd, file)) = candidates.into_iter().find(|(_, f)| Path::new(f).exists()) {
        let _ = Command::new(cmd)
            .arg(file)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
    }
}
