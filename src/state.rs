use crate::constants::*;

/// Where a projection cycle is, `t` frames after the photo was taken.
/// Progress values are phase-local and lie in `[0, 1)`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ProjectionPhase {
    WhiteFade(f32), // Photo at rest under a fading white flash
    Hold,           // Photo at rest
    Fall(f32),      // Photo drops off the bottom of the wall
    BlackFade(f32), // Live feed returns from black
    Done,           // Cycle over, back to the live feed
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ProjectionTimeline {
    pub white_fade: u64,
    pub hold: u64,
    pub fall: u64,
    pub black_fade: u64,
}

impl Default for ProjectionTimeline {
    fn default() -> Self {
        Self {
            white_fade: WHITE_FADE_LENGTH,
            hold: HOLD_IMG_LENGTH,
            fall: FALL_IMG_LENGTH,
            black_fade: BLACK_FADE_LENGTH,
        }
    }
}

impl ProjectionTimeline {
    pub fn total(&self) -> u64 {
        self.white_fade + self.hold + self.fall + self.black_fade
    }

    pub fn phase(&self, t: u64) -> ProjectionPhase {
        let mut start = 0;

        if t < start + self.white_fade {
            return ProjectionPhase::WhiteFade(progress(t - start, self.white_fade));
        }
        start += self.white_fade;

        if t < start + self.hold {
            return ProjectionPhase::Hold;
        }
        start += self.hold;

        if t < start + self.fall {
            return ProjectionPhase::Fall(progress(t - start, self.fall));
        }
        start += self.fall;

        if t < start + self.black_fade {
            return ProjectionPhase::BlackFade(progress(t - start, self.black_fade));
        }

        ProjectionPhase::Done
    }
}

/// Frame counts driving the desktop interface. Unlike the projection its
/// stages overlap: the text field appears while the photo may still settle.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct DesktopTimeline {
    pub descend: u64,
    pub email_wait: u64,
    pub email_in: u64,
    pub out: u64,
    pub caret_blink: u64,
}

impl Default for DesktopTimeline {
    fn default() -> Self {
        Self {
            descend: DESCEND_LENGTH,
            email_wait: EMAIL_WAIT_LENGTH,
            email_in: EMAIL_IN_LENGTH,
            out: OUT_LENGTH,
            caret_blink: CARET_BLINK,
        }
    }
}

impl DesktopTimeline {
    /// Fraction of the descent still ahead, `None` once the photo has landed.
    pub fn descent_remaining(&self, t: u64) -> Option<f32> {
        (t < self.descend).then(|| progress(self.descend - t, self.descend))
    }

    /// Opacity of the text field, `None` while it is still hidden.
    pub fn text_alpha(&self, t: u64) -> Option<f32> {
        if t <= self.email_wait {
            return None;
        }
        let shown = t - self.email_wait;
        if shown < self.email_in {
            Some(progress(shown, self.email_in))
        } else {
            Some(1.0)
        }
    }

    pub fn caret_visible(&self, t: u64) -> bool {
        self.caret_blink == 0 || (t / self.caret_blink) % 2 == 0
    }

    /// Progress of the out-sequence `elapsed` frames in, `None` once it is over.
    pub fn out_progress(&self, elapsed: u64) -> Option<f32> {
        (elapsed < self.out).then(|| progress(elapsed, self.out))
    }
}

fn progress(offset: u64, length: u64) -> f32 {
    if length == 0 {
        return 1.0;
    }
    offset as f32 / length as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(phase: ProjectionPhase) -> &'static str {
        match phase {
            ProjectionPhase::WhiteFade(_) => "A",
            ProjectionPhase::Hold => "B",
            ProjectionPhase::Fall(_) => "C",
            ProjectionPhase::BlackFade(_) => "D",
            ProjectionPhase::Done => "idle",
        }
    }

    #[test]
    fn projection_phases_are_contiguous() {
        let timeline = ProjectionTimeline::default();
        let mut boundaries = Vec::new();
        let mut previous = label(timeline.phase(0));
        for t in 1..500 {
            let current = label(timeline.phase(t));
            if current != previous {
                boundaries.push((t, current));
                previous = current;
            }
        }
        assert_eq!(
            boundaries,
            vec![(100, "B"), (200, "C"), (320, "D"), (380, "idle")]
        );
        assert_eq!(timeline.total(), 380);
    }

    #[test]
    fn projection_progress_is_phase_local() {
        let timeline = ProjectionTimeline::default();
        assert_eq!(timeline.phase(0), ProjectionPhase::WhiteFade(0.0));
        assert_eq!(timeline.phase(50), ProjectionPhase::WhiteFade(0.5));
        assert_eq!(timeline.phase(260), ProjectionPhase::Fall(0.5));
        assert_eq!(timeline.phase(350), ProjectionPhase::BlackFade(0.5));
        assert_eq!(timeline.phase(u64::MAX / 2), ProjectionPhase::Done);
    }

    #[test]
    fn empty_phases_are_skipped() {
        let timeline = ProjectionTimeline {
            white_fade: 0,
            hold: 10,
            fall: 0,
            black_fade: 5,
        };
        assert_eq!(timeline.phase(0), ProjectionPhase::Hold);
        assert_eq!(timeline.phase(10), ProjectionPhase::BlackFade(0.0));
        assert_eq!(timeline.phase(15), ProjectionPhase::Done);
    }

    #[test]
    fn desktop_text_fades_in_after_wait() {
        let timeline = DesktopTimeline::default();
        assert_eq!(timeline.text_alpha(100), None);
        assert_eq!(timeline.text_alpha(115), Some(0.5));
        assert_eq!(timeline.text_alpha(130), Some(1.0));
        assert_eq!(timeline.text_alpha(1000), Some(1.0));
    }

    #[test]
    fn desktop_descent_and_out_windows() {
        let timeline = DesktopTimeline::default();
        assert_eq!(timeline.descent_remaining(0), Some(1.0));
        assert_eq!(timeline.descent_remaining(60), Some(0.5));
        assert_eq!(timeline.descent_remaining(120), None);

        assert_eq!(timeline.out_progress(0), Some(0.0));
        assert_eq!(timeline.out_progress(79), Some(79.0 / 80.0));
        assert_eq!(timeline.out_progress(80), None);
    }

    #[test]
    fn caret_blinks_on_even_windows() {
        let timeline = DesktopTimeline::default();
        assert!(timeline.caret_visible(0));
        assert!(timeline.caret_visible(29));
        assert!(!timeline.caret_visible(30));
        assert!(timeline.caret_visible(60));
    }
}
