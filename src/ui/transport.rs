use crate::media::MediaSource;
use crate::playback::{format_time, SegmentPlayer};
use crate::session::Command;
use imgui::{Condition, ProgressBar, Ui};

/// Back / Replay / Next controls with the playback clock
pub struct TransportWindow;

impl TransportWindow {
    pub fn new() -> Self {
        Self
    }

    /// Draw the transport; returns the command of a clicked button
    pub fn render<M: MediaSource + 'static>(
        &mut self,
        ui: &Ui,
        player: &SegmentPlayer<M>,
    ) -> Option<Command> {
        let mut command = None;

        ui.window("Player")
            .size([420.0, 120.0], Condition::FirstUseEver)
            .position([20.0, 40.0], Condition::FirstUseEver)
            .build(|| {
                if !player.has_source() {
                    ui.text_disabled("No audio loaded (Alt+O to open)");
                }

                if ui.button("Back") {
                    command = Some(Command::Back);
                }
                ui.same_line();
                if ui.button("Replay") {
                    command = Some(Command::Replay);
                }
                ui.same_line();
                if ui.button("Next") {
                    command = Some(Command::Next);
                }
                ui.same_line();
                ui.text(format_time(player.current_time()));

                let segment = player.segment_length();
                let remaining = player.remaining_segment_time();
                let fraction = segment_progress(remaining, segment);
                ProgressBar::new(fraction)
                    .size([-1.0, 0.0])
                    .overlay_text(format!(
                        "segment {} +{:.0}s",
                        format_time(player.current_position()),
                        segment
                    ))
                    .build(ui);

                let mut slow = player.slow_playback();
                if ui.checkbox("Slow playback", &mut slow) {
                    player.set_slow_playback(slow);
                }
                ui.same_line();
                ui.text_disabled(format!("{:.2}x", player.speed()));
            });

        command
    }
}

impl Default for TransportWindow {
    fn default() -> Self {
        Self::new()
    }
}

/// Fraction of the segment already played, 0 when idle
fn segment_progress(remaining: f64, segment: f64) -> f32 {
    if remaining <= 0.0 || segment <= 0.0 {
        return 0.0;
    }
    (1.0 - remaining / segment).clamp(0.0, 1.0) as f32
}
