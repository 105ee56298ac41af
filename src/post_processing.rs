//! Screen-space effect chain description.
//!
//! The chain order is fixed when the scene is composed. The renderer walks
//! the enabled effects in order, each one reading the previous result.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::{
    BloomOptions, ChromaticAberrationOptions, GlitchOptions, PostProcessingOptions,
    ScanlineOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Bloom,
    ChromaticAberration,
    Scanline,
    Glitch,
}

impl EffectKind {
    pub fn label(self) -> &'static str {
        match self {
            EffectKind::Bloom => "Bloom",
            EffectKind::ChromaticAberration => "Chromatic aberration",
            EffectKind::Scanline => "Scanline",
            EffectKind::Glitch => "Glitch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Bloom(BloomOptions),
    ChromaticAberration(ChromaticAberrationOptions),
    Scanline(ScanlineOptions),
    Glitch(GlitchOptions),
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::Bloom(_) => EffectKind::Bloom,
            Effect::ChromaticAberration(_) => EffectKind::ChromaticAberration,
            Effect::Scanline(_) => EffectKind::Scanline,
            Effect::Glitch(_) => EffectKind::Glitch,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            Effect::Bloom(options) => options.enabled,
            Effect::ChromaticAberration(options) => options.enabled,
            Effect::Scanline(options) => options.enabled,
            Effect::Glitch(options) => options.enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        match self {
            Effect::Bloom(options) => options.enabled = enabled,
            Effect::ChromaticAberration(options) => options.enabled = enabled,
            Effect::Scanline(options) => options.enabled = enabled,
            Effect::Glitch(options) => options.enabled = enabled,
        }
    }
}

/// Glitch state sampled for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlitchFrame {
    pub strength: f32,
    /// Changes once per glitch so the shader can vary the distortion pattern.
    pub seed: f32,
}

/// Schedules glitches at random intervals.
///
/// After each glitch ends, the next one starts `delay` seconds later and
/// lasts `duration` seconds, both drawn uniformly from their ranges.
#[derive(Debug, Clone)]
pub struct GlitchTimer {
    options: GlitchOptions,
    rng: StdRng,
    start: f32,
    end: f32,
    current: GlitchFrame,
}

fn sample_range(rng: &mut impl Rng, [min, max]: [f32; 2]) -> f32 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

impl GlitchTimer {
    pub fn new(options: GlitchOptions, mut rng: StdRng) -> Self {
        let start = sample_range(&mut rng, options.delay);
        let end = start + sample_range(&mut rng, options.duration);
        let current = GlitchFrame {
            strength: sample_range(&mut rng, options.strength),
            seed: rng.gen(),
        };

        Self {
            options,
            rng,
            start,
            end,
            current,
        }
    }

    fn schedule_after(&mut self, previous_end: f32) {
        self.start = previous_end + sample_range(&mut self.rng, self.options.delay);
        self.end = self.start + sample_range(&mut self.rng, self.options.duration);
        self.current = GlitchFrame {
            strength: sample_range(&mut self.rng, self.options.strength),
            seed: self.rng.gen(),
        };
    }

    /// Returns the active glitch at `time`, if any. `time` must not go
    /// backwards between calls.
    pub fn sample(&mut self, time: f32) -> Option<GlitchFrame> {
        while time >= self.end {
            let previous_end = self.end;
            self.schedule_after(previous_end);

            // A window that does not move forward would never reach `time`.
            if self.end <= previous_end {
                break;
            }
        }

        (time >= self.start && time < self.end).then_some(self.current)
    }

    #[cfg(test)]
    pub fn next_window(&self) -> (f32, f32) {
        (self.start, self.end)
    }
}

pub struct PostProcessChain {
    effects: Vec<Effect>,
    glitch: GlitchTimer,
}

impl PostProcessChain {
    pub fn new(options: &PostProcessingOptions) -> Self {
        Self::with_rng(options, StdRng::from_entropy())
    }

    pub fn with_rng(options: &PostProcessingOptions, rng: StdRng) -> Self {
        let effects = vec![
            Effect::Bloom(options.bloom),
            Effect::ChromaticAberration(options.chromatic_aberration),
            Effect::Scanline(options.scanline),
            Effect::Glitch(options.glitch),
        ];

        Self {
            effects,
            glitch: GlitchTimer::new(options.glitch, rng),
        }
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut [Effect] {
        &mut self.effects
    }

    pub fn enabled_effects(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter().filter(|effect| effect.enabled())
    }

    pub fn glitch_enabled(&self) -> bool {
        self.effects
            .iter()
            .any(|effect| effect.kind() == EffectKind::Glitch && effect.enabled())
    }

    /// Advances the glitch schedule. The schedule keeps running while the
    /// effect is disabled so re-enabling it does not trigger a backlog.
    pub fn sample_glitch(&mut self, time: f32) -> Option<GlitchFrame> {
        self.glitch.sample(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(seed: u64) -> GlitchTimer {
        GlitchTimer::new(GlitchOptions::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn chain_order_is_fixed() {
        let chain = PostProcessChain::with_rng(
            &PostProcessingOptions::default(),
            StdRng::seed_from_u64(0),
        );
        let kinds: Vec<_> = chain.effects().iter().map(Effect::kind).collect();
        assert_eq!(
            kinds,
            [
                EffectKind::Bloom,
                EffectKind::ChromaticAberration,
                EffectKind::Scanline,
                EffectKind::Glitch
            ]
        );
    }

    #[test]
    fn disabled_effects_are_skipped_but_keep_their_slot() {
        let mut chain = PostProcessChain::with_rng(
            &PostProcessingOptions::default(),
            StdRng::seed_from_u64(0),
        );
        chain.effects_mut()[1].set_enabled(false);

        let kinds: Vec<_> = chain.enabled_effects().map(Effect::kind).collect();
        assert_eq!(
            kinds,
            [EffectKind::Bloom, EffectKind::Scanline, EffectKind::Glitch]
        );
        assert_eq!(chain.effects().len(), 4);
    }

    #[test]
    fn first_glitch_waits_for_the_delay() {
        for seed in 0..20 {
            let mut timer = timer(seed);
            let (start, end) = timer.next_window();
            assert!((1.5..=3.5).contains(&start));
            assert!((0.2..=0.4 + 1e-6).contains(&(end - start)));
            assert_eq!(timer.sample(0.0), None);
            assert_eq!(timer.sample(1.49), None);
        }
    }

    #[test]
    fn glitch_windows_respect_ranges() {
        let mut timer = timer(42);
        let mut previous_end = 0.0;
        let mut windows = 0;
        let mut time = 0.0;
        let mut was_active = false;
        let mut window_start = 0.0;

        while time < 120.0 {
            let active = timer.sample(time);
            if let Some(frame) = active {
                assert!((0.2..=0.4).contains(&frame.strength));
            }
            match (was_active, active.is_some()) {
                (false, true) => {
                    window_start = time;
                    assert!(window_start - previous_end >= 1.5 - 0.02);
                    assert!(window_start - previous_end <= 3.5 + 0.02);
                }
                (true, false) => {
                    let length = time - window_start;
                    assert!((0.2 - 0.02..=0.4 + 0.02).contains(&length));
                    previous_end = time;
                    windows += 1;
                }
                _ => {}
            }
            was_active = active.is_some();
            time += 0.01;
        }

        assert!(windows >= 25);
    }

    #[test]
    fn large_time_jumps_skip_missed_glitches() {
        let mut timer = timer(5);
        timer.sample(10_000.0);
        let (start, _) = timer.next_window();
        assert!(start > 10_000.0 - 4.0);
    }

    #[test]
    fn degenerate_ranges_use_the_minimum() {
        let options = GlitchOptions {
            delay: [2.0, 2.0],
            duration: [0.5, 0.5],
            strength: [0.3, 0.3],
            ..Default::default()
        };
        let mut timer = GlitchTimer::new(options, StdRng::seed_from_u64(1));
        assert_eq!(timer.next_window(), (2.0, 2.5));
        assert_eq!(timer.sample(2.1).map(|f| f.strength), Some(0.3));
        assert_eq!(timer.sample(2.6), None);
        assert_eq!(timer.next_window(), (4.5, 5.0));
    }

    #[test]
    fn zero_length_cycle_returns_without_glitching() {
        let options = GlitchOptions {
            delay: [0.0, 0.0],
            duration: [0.0, 0.0],
            ..Default::default()
        };
        let mut timer = GlitchTimer::new(options, StdRng::seed_from_u64(2));
        assert_eq!(timer.sample(0.016), None);
        assert_eq!(timer.sample(1.0), None);
    }

    #[test]
    fn backwards_cycle_returns_without_glitching() {
        let options = GlitchOptions {
            delay: [-1.0, -1.0],
            duration: [0.5, 0.5],
            ..Default::default()
        };
        let mut timer = GlitchTimer::new(options, StdRng::seed_from_u64(3));
        assert_eq!(timer.sample(0.5), None);
    }
}
