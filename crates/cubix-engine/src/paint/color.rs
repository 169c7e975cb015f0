/// Opaque-by-default RGBA clear color, linear components in `[0, 1]`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Dark gray used as the viewer background.
    pub const DARK_GRAY: Color = Color::rgb(0.1, 0.1, 0.1);

    /// Opaque color from its RGB components.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_is_opaque() {
        assert_eq!(Color::rgb(0.2, 0.4, 0.6).a, 1.0);
    }

    #[test]
    fn converts_to_wgpu_clear_color() {
        let w: wgpu::Color = Color::DARK_GRAY.into();
        assert!((w.r - 0.1).abs() < 1e-6);
        assert!((w.g - 0.1).abs() < 1e-6);
        assert!((w.b - 0.1).abs() < 1e-6);
        assert_eq!(w.a, 1.0);
    }
}
