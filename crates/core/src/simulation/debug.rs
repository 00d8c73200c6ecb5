//! Heat-map colors for debug visualization

/// Color in the host's color-mask space: hue in `[0, 1]`, saturation and
/// value as offsets in `[-1, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

/// Temperature at which the map saturates to white (K)
pub const COLOR_MAX_TEMPERATURE: f32 = 2000.0;
/// Below this the map fades from black to blue (K)
pub const COLOR_LOW_TEMPERATURE: f32 = 265.0;
/// Between low and this the hue sweeps blue to red (K)
pub const COLOR_HIGH_TEMPERATURE: f32 = 500.0;

/// Heat-map color with the default range
pub fn temperature_color(temperature: f32) -> Hsv {
    temperature_color_in(
        temperature,
        COLOR_MAX_TEMPERATURE,
        COLOR_LOW_TEMPERATURE,
        COLOR_HIGH_TEMPERATURE,
    )
}

/// Black → blue below `low`, blue → red up to `high`, red → white up to `max`
pub fn temperature_color_in(temperature: f32, max: f32, low: f32, high: f32) -> Hsv {
    let t = temperature.clamp(0.0, max.max(0.0));

    let mut color = Hsv {
        h: 240.0 / 360.0,
        s: 1.0,
        v: 0.5,
    };

    if t < low {
        color.v = 1.5 * (t / low) - 1.0;
    } else if t < high {
        color.h = (240.0 - (t - low) / (high - low) * 240.0) / 360.0;
    } else {
        color.h = 0.0;
        color.s = if max > high {
            1.0 - 2.0 * ((t - high) / (max - high))
        } else {
            -1.0
        };
    }
    color
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_is_dark_blue() {
        let c = temperature_color(0.0);
        assert!((c.h - 240.0 / 360.0).abs() < 1e-6);
        assert!((c.v + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_hue_sweeps_to_red() {
        let mid = temperature_color(382.5);
        assert!((mid.h - 120.0 / 360.0).abs() < 1e-4);
        assert_eq!(temperature_color(500.0).h, 0.0);
    }

    #[test]
    fn test_white_hot_desaturates() {
        let c = temperature_color(5000.0);
        assert_eq!(c.h, 0.0);
        assert!((c.s + 1.0).abs() < 1e-6);
        assert!((c.v - 0.5).abs() < 1e-6);
    }
}
