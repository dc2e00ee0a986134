/// sRGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    pub fn to_linear(self) -> Self {
        Self::new(
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        )
    }

    pub fn to_linear_array(self, alpha: f32) -> [f32; 4] {
        let linear = self.to_linear();
        [linear.r, linear.g, linear.b, alpha]
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        let linear = self.to_linear();
        wgpu::Color {
            r: linear.r as f64,
            g: linear.g as f64,
            b: linear.b as f64,
            a: 1.0,
        }
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_unchanged_by_linearization() {
        assert_eq!(Color::WHITE.to_linear(), Color::WHITE);
        assert_eq!(Color::BLACK.to_linear(), Color::BLACK);
    }

    #[test]
    fn mid_gray_is_darker_in_linear_space() {
        let gray = Color::from_rgb8(150, 150, 150);
        let linear = gray.to_linear();
        assert!(linear.r < gray.r);
        assert!((linear.r - 0.305).abs() < 0.01, "got {}", linear.r);
    }
}
