/// Counts render ticks. Every timeline in the installation is measured
/// against it, so it must advance exactly once per tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameClock {
    frame: u64,
}

impl FrameClock {
    pub fn now(&self) -> u64 {
        self.frame
    }

    pub fn advance(&mut self) -> u64 {
        self.frame += 1;
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_one_frame_per_call() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.advance(), 1);
        assert_eq!(clock.advance(), 2);
        assert_eq!(clock.now(), 2);
    }
}
