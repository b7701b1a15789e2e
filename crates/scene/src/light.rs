use orbitview_common::Color;
use serde::{Deserialize, Serialize};

/// Uniform light applied to every surface regardless of orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self { color, intensity }
    }

    pub fn radiance(&self) -> Color {
        self.color.scaled(self.intensity)
    }
}

/// Omnidirectional light emitted from the node position.
///
/// `distance == 0` means unlimited range. Otherwise contribution falls off as
/// `(1 - d / distance)^decay` and is zero at and beyond `distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub distance: f32,
    pub decay: f32,
}

impl PointLight {
    pub fn new(color: Color, intensity: f32, distance: f32) -> Self {
        Self {
            color,
            intensity,
            distance,
            decay: 1.0,
        }
    }

    pub fn with_decay(mut self, decay: f32) -> Self {
        self.decay = decay;
        self
    }

    pub fn attenuation(&self, d: f32) -> f32 {
        if self.distance <= 0.0 {
            return 1.0;
        }
        (1.0 - d / self.distance).clamp(0.0, 1.0).powf(self.decay)
    }

    pub fn radiance(&self) -> Color {
        self.color.scaled(self.intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambient_radiance_scales_color() {
        let light = AmbientLight::new(Color::WHITE, 0.4);
        assert_eq!(light.radiance(), Color::rgb(0.4, 0.4, 0.4));
    }

    #[test]
    fn point_light_falls_off_linearly_by_default() {
        let light = PointLight::new(Color::from_hex(0x00baff), 1.0, 100.0);
        assert_eq!(light.attenuation(0.0), 1.0);
        assert_eq!(light.attenuation(50.0), 0.5);
        assert_eq!(light.attenuation(100.0), 0.0);
        assert_eq!(light.attenuation(250.0), 0.0);
    }

    #[test]
    fn point_light_decay_exponent() {
        let light = PointLight::new(Color::WHITE, 1.0, 10.0).with_decay(2.0);
        assert!((light.attenuation(5.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn zero_distance_is_unlimited() {
        let light = PointLight::new(Color::WHITE, 2.0, 0.0);
        assert_eq!(light.attenuation(1.0e6), 1.0);
        assert_eq!(light.radiance(), Color::rgb(2.0, 2.0, 2.0));
    }
}
