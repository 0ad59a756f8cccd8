//! Vertical speed to beep pattern. Bands are checked from the strongest climb
//! down, then from the strongest sink up; every band bound is exclusive.

use fugit::{HertzU32 as Hertz, MillisDurationU32 as Duration};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Tone {
    /// Hz, zero for silence
    pub frequency: u32,
    /// ms
    pub duration: u32,
    /// ms
    pub pause: u32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum Band {
    Above(f64),
    Below(f64),
}

impl Band {
    fn contains(self, v_speed: f64) -> bool {
        match self {
            Self::Above(bound) => v_speed > bound,
            Self::Below(bound) => v_speed < bound,
        }
    }
}

const fn tone(frequency: u32, duration: u32, pause: u32) -> Tone {
    Tone { frequency, duration, pause }
}

pub const SILENT: Tone = tone(0, 0, 200);

const TABLE: [(Band, Tone); 7] = [
    (Band::Above(1.5), tone(1800, 100, 50)),
    (Band::Above(1.0), tone(1600, 120, 80)),
    (Band::Above(0.5), tone(1400, 150, 150)),
    (Band::Above(0.1), tone(1200, 200, 300)),
    (Band::Below(-2.0), tone(300, 500, 0)),
    (Band::Below(-1.0), tone(400, 400, 50)),
    (Band::Below(-0.5), tone(500, 300, 100)),
];

impl Tone {
    pub fn for_v_speed(v_speed: f64) -> Self {
        match TABLE.iter().find(|(band, _)| band.contains(v_speed)) {
            Some((_, tone)) => *tone,
            None => SILENT,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.frequency == 0
    }

    pub fn hertz(&self) -> Hertz {
        Hertz::from_raw(self.frequency)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_ticks(self.duration)
    }
}

mod test {
    #[test]
    fn test_climb_bands() {
        use super::{tone, Tone};

        assert_eq!(Tone::for_v_speed(3.0), tone(1800, 100, 50));
        assert_eq!(Tone::for_v_speed(1.51), tone(1800, 100, 50));
        assert_eq!(Tone::for_v_speed(1.5), tone(1600, 120, 80));
        assert_eq!(Tone::for_v_speed(1.0), tone(1400, 150, 150));
        assert_eq!(Tone::for_v_speed(0.5), tone(1200, 200, 300));
        assert_eq!(Tone::for_v_speed(0.3), tone(1200, 200, 300));
    }

    #[test]
    fn test_sink_bands() {
        use super::{tone, Tone};

        assert_eq!(Tone::for_v_speed(-5.0), tone(300, 500, 0));
        assert_eq!(Tone::for_v_speed(-2.0), tone(400, 400, 50));
        assert_eq!(Tone::for_v_speed(-1.0), tone(500, 300, 100));
        assert_eq!(Tone::for_v_speed(-0.51), tone(500, 300, 100));
    }

    #[test]
    fn test_dead_band() {
        use super::{Tone, SILENT};

        for v_speed in [0.1, 0.0, -0.0, -0.3, -0.5, f64::NAN] {
            assert_eq!(Tone::for_v_speed(v_speed), SILENT);
        }
        assert!(SILENT.is_silent());
        assert_eq!(SILENT.pause, 200);
    }

    #[test]
    fn test_total() {
        use super::{Band, Tone, TABLE};

        let mut v_speed = -4.0;
        while v_speed < 4.0 {
            let climb = TABLE.iter().any(|(b, _)| matches!(b, Band::Above(_)) && b.contains(v_speed));
            let sink = TABLE.iter().any(|(b, _)| matches!(b, Band::Below(_)) && b.contains(v_speed));
            assert!(!(climb && sink));
            assert_eq!(Tone::for_v_speed(v_speed).is_silent(), !climb && !sink);
            v_speed += 0.01;
        }
    }

    #[test]
    fn test_fugit_units() {
        use super::tone;

        let tone = tone(1400, 150, 150);
        assert_eq!(tone.hertz().raw(), 1400);
        assert_eq!(tone.duration().ticks(), 150);
    }
}
