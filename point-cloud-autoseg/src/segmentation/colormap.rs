/// Colormaps sampled to colour label subsets
use bevy::color::{Mix, Srgba};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PLASMA: [(u8, u8, u8); 10] = [
    (0x0d, 0x08, 0x87),
    (0x46, 0x03, 0x9f),
    (0x72, 0x01, 0xa8),
    (0x9c, 0x17, 0x9e),
    (0xbd, 0x37, 0x86),
    (0xd8, 0x57, 0x6b),
    (0xed, 0x79, 0x53),
    (0xfb, 0x9f, 0x3a),
    (0xfd, 0xca, 0x26),
    (0xf0, 0xf9, 0x21),
];

const VIRIDIS: [(u8, u8, u8); 10] = [
    (0x44, 0x01, 0x54),
    (0x48, 0x28, 0x78),
    (0x3e, 0x49, 0x89),
    (0x31, 0x68, 0x8e),
    (0x26, 0x82, 0x8e),
    (0x1f, 0x9e, 0x89),
    (0x35, 0xb7, 0x79),
    (0x6e, 0xce, 0x58),
    (0xb5, 0xde, 0x2b),
    (0xfd, 0xe7, 0x25),
];

const GRAY: [(u8, u8, u8); 2] = [(0x00, 0x00, 0x00), (0xff, 0xff, 0xff)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    #[default]
    Plasma,
    Viridis,
    #[serde(alias = "grey")]
    Gray,
}

impl Colormap {
    fn stops(&self) -> &'static [(u8, u8, u8)] {
        match self {
            Self::Plasma => &PLASMA,
            Self::Viridis => &VIRIDIS,
            Self::Gray => &GRAY,
        }
    }

    /// Colour at `t` in `[0, 1]`, linearly interpolated between stops.
    /// Out of range values clamp; NaN samples the low end.
    pub fn sample(&self, t: f32) -> Srgba {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (stops.len() - 1) as f32;
        let lower = (scaled.floor() as usize).min(stops.len() - 2);
        let (r0, g0, b0) = stops[lower];
        let (r1, g1, b1) = stops[lower + 1];
        Srgba::rgb_u8(r0, g0, b0).mix(&Srgba::rgb_u8(r1, g1, b1), scaled - lower as f32)
    }

    /// `count` colours at evenly spaced positions over `[0, 1]`, in label
    /// order, or in reverse order when `reversed` is set. A single colour
    /// samples position 0.
    pub fn sample_evenly(&self, count: usize, reversed: bool) -> Vec<Srgba> {
        let position = |i: usize| {
            if count <= 1 {
                0.0
            } else {
                i as f32 / (count - 1) as f32
            }
        };
        let mut colors: Vec<Srgba> = (0..count).map(|i| self.sample(position(i))).collect();
        if reversed {
            colors.reverse();
        }
        colors
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plasma => "plasma",
            Self::Viridis => "viridis",
            Self::Gray => "gray",
        })
    }
}

impl FromStr for Colormap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plasma" => Ok(Self::Plasma),
            "viridis" => Ok(Self::Viridis),
            "gray" | "grey" => Ok(Self::Gray),
            other => Err(format!("unknown colormap '{}'", other)),
        }
    }
}
