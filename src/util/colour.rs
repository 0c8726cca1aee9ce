use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colour {
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
    pub fn from_bytes(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
            a: f32::from(a) / 255.0,
        }
    }

    pub fn red() -> Self {
        Self {
            r: 1.0,
            ..Default::default()
        }
    }
    pub fn green() -> Self {
        Self {
            g: 1.0,
            ..Default::default()
        }
    }
    pub fn blue() -> Self {
        Self {
            b: 1.0,
            ..Default::default()
        }
    }
    pub fn black() -> Self {
        Self::default()
    }
    pub fn white() -> Self {
        Self {
            r: 1.0,
            g: 1.0,
            b: 1.0,
            a: 1.0,
        }
    }

    // Scene palette.
    pub fn neon_cyan() -> Self {
        Self::from_bytes(0x00, 0xf0, 0xff, 0xff)
    }
    pub fn neon_pink() -> Self {
        Self::from_bytes(0xff, 0x14, 0x93, 0xff)
    }
    pub fn gold() -> Self {
        Self::from_bytes(0xff, 0xd7, 0x00, 0xff)
    }
    pub fn background() -> Self {
        Self::from_bytes(10, 10, 20, 250)
    }
    pub fn grid() -> Self {
        Self::neon_cyan().with_alpha(0.15)
    }

    #[must_use]
    pub fn with_alpha(mut self, a: f32) -> Self {
        self.a = a;
        self
    }

    pub fn as_bytes(&self) -> [u8; 4] {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        [
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.a.clamp(0.0, 1.0) * 255.0).round() as u8,
        ]
    }

    /// `#rrggbb`, ignoring alpha.
    pub fn to_hex_rgb(&self) -> String {
        let [r, g, b, _] = self.as_bytes();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 1.0,
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.as_bytes();
        write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_output() {
        assert_eq!(Colour::neon_cyan().to_hex_rgb(), "#00f0ff");
        assert_eq!(Colour::neon_pink().to_hex_rgb(), "#ff1493");
        assert_eq!(Colour::gold().to_string(), "#ffd700ff");
        assert_eq!(Colour::red().with_alpha(0.5).as_bytes(), [255, 0, 0, 128]);
    }
}
