//! Colour-Doppler pixel classification.

/// Flow direction encoded by the colour map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowClass {
    /// Red-dominant pixel, flow towards the probe.
    Red,
    /// Blue-dominant pixel, flow away from the probe.
    Blue,
    Neutral,
}

/// Classified pixel: direction plus the dominant channel value as a velocity proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowVector {
    pub class: FlowClass,
    pub value: u8,
}

impl FlowVector {
    pub const NEUTRAL: Self = Self {
        class: FlowClass::Neutral,
        value: 0,
    };

    /// +1 for red, -1 for blue, 0 for neutral.
    pub fn dir(&self) -> f64 {
        match self.class {
            FlowClass::Red => 1.0,
            FlowClass::Blue => -1.0,
            FlowClass::Neutral => 0.0,
        }
    }

    pub fn is_flow(&self) -> bool {
        self.class != FlowClass::Neutral
    }
}

/// Classify an RGB triple. A channel is dominant when it exceeds both others
/// by more than `threshold`; red is checked first.
#[inline]
pub fn classify(rgb: [u8; 3], threshold: f32) -> FlowVector {
    let [r, g, b] = rgb.map(f32::from);
    if r > g + threshold && r > b + threshold {
        FlowVector {
            class: FlowClass::Red,
            value: rgb[0],
        }
    } else if b > g + threshold && b > r + threshold {
        FlowVector {
            class: FlowClass::Blue,
            value: rgb[2],
        }
    } else {
        FlowVector::NEUTRAL
    }
}
