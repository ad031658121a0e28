// Time-varying noise wind added on export

use std::path::Path;

use glam::{Vec2, Vec3};
use ::noise::{NoiseFn, Perlin};

use crate::config::{NoiseConfig, NoiseMode};
use crate::error::WindFieldError;
use crate::tools;

/// 2D RGB texture sampled on the XZ plane. Texels are stored in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseTexture {
    width: u32,
    height: u32,
    texels: Vec<[f32; 3]>,
}

impl NoiseTexture {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WindFieldError> {
        let image = image::open(path)?.to_rgb32f();
        let (width, height) = image.dimensions();
        let texels = image.pixels().map(|p| p.0).collect();
        Self::from_texels(width, height, texels)
    }

    pub fn from_texels(width: u32, height: u32, texels: Vec<[f32; 3]>) -> Result<Self, WindFieldError> {
        if width == 0 || height == 0 || texels.len() != width as usize * height as usize {
            return Err(WindFieldError::invalid_config(format!(
                "noise texture of {}x{} needs {} texels, got {}",
                width,
                height,
                width as usize * height as usize,
                texels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn texel(&self, x: i64, y: i64) -> Vec3 {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        Vec3::from_array(self.texels[x + y * self.width as usize])
    }

    /// Bilinear sample with wrapping, `uv` in texture repeats
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        let p = uv * Vec2::new(self.width as f32, self.height as f32) - Vec2::splat(0.5);
        let base = p.floor();
        let f = p - base;
        let (x0, y0) = (base.x as i64, base.y as i64);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), f.x);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), f.x);
        top.lerp(bottom, f.y)
    }
}

/// Noise source selected by [`NoiseMode`]
#[derive(Debug, Clone)]
pub struct WindNoise {
    settings: NoiseConfig,
    seed: u32,
    perlin: [Perlin; 3],
    texture: Option<NoiseTexture>,
    warned_missing_texture: bool,
}

impl WindNoise {
    pub fn new(settings: NoiseConfig) -> Self {
        let seed = settings.seed.unwrap_or_else(tools::generate_seed8);
        Self {
            perlin: perlin_fields(seed),
            seed,
            settings,
            texture: None,
            warned_missing_texture: false,
        }
    }

    /// Build from config, loading the texture named there if any
    pub fn from_config(settings: &NoiseConfig) -> Result<Self, WindFieldError> {
        let mut noise = Self::new(settings.clone());
        if let Some(path) = &settings.texture_path {
            noise.texture = Some(NoiseTexture::load(path)?);
        }
        Ok(noise)
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn settings(&self) -> &NoiseConfig {
        &self.settings
    }

    /// Apply new settings. The Perlin fields are rebuilt only when the seed changes.
    pub fn set_settings(&mut self, settings: NoiseConfig) {
        if let Some(seed) = settings.seed.filter(|seed| *seed != self.seed) {
            self.seed = seed;
            self.perlin = perlin_fields(seed);
        }
        self.settings = settings;
    }

    pub fn set_texture(&mut self, texture: Option<NoiseTexture>) {
        self.texture = texture;
        self.warned_missing_texture = false;
    }

    pub fn texture(&self) -> Option<&NoiseTexture> {
        self.texture.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.settings.intensity != 0.0
    }

    /// Log once if texture noise is selected without a texture
    pub(crate) fn check_ready(&mut self) {
        if self.settings.mode == NoiseMode::Texture
            && self.texture.is_none()
            && self.is_active()
            && !self.warned_missing_texture
        {
            log::warn!("Texture noise selected but no noise texture is bound; noise wind is zero");
            self.warned_missing_texture = true;
        }
    }

    /// Noise wind at a world position and time
    pub fn sample(&self, position: Vec3, time: f32) -> Vec3 {
        if !self.is_active() {
            return Vec3::ZERO;
        }
        let s = &self.settings;
        let scroll = s.scroll_direction.normalize_or_zero() * s.scroll_speed * time;
        let q = (position + s.position_offset) * s.position_frequency + scroll;

        let raw = match s.mode {
            NoiseMode::Procedural => {
                let point = [q.x as f64, q.y as f64, q.z as f64];
                Vec3::new(
                    self.perlin[0].get(point) as f32,
                    self.perlin[1].get(point) as f32,
                    self.perlin[2].get(point) as f32,
                )
            }
            NoiseMode::Texture => match &self.texture {
                Some(texture) => texture.sample(Vec2::new(q.x, q.z)) * 2.0 - Vec3::ONE,
                None => Vec3::ZERO,
            },
        };
        raw * s.intensity
    }
}

fn perlin_fields(seed: u32) -> [Perlin; 3] {
    let seeds: [u32; 3] = tools::derive_seeds(seed);
    seeds.map(Perlin::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(mode: NoiseMode, intensity: f32) -> NoiseConfig {
        NoiseConfig {
            mode,
            intensity,
            seed: Some(7),
            position_frequency: Vec3::splat(0.37),
            ..NoiseConfig::default()
        }
    }

    #[test]
    fn test_zero_intensity_is_silent() {
        let noise = WindNoise::new(settings(NoiseMode::Procedural, 0.0));
        assert_eq!(noise.sample(Vec3::new(1.3, 2.1, 0.4), 3.0), Vec3::ZERO);
    }

    #[test]
    fn test_procedural_is_deterministic_and_bounded() {
        let a = WindNoise::new(settings(NoiseMode::Procedural, 2.0));
        let b = WindNoise::new(settings(NoiseMode::Procedural, 2.0));
        for i in 0..50 {
            let p = Vec3::new(i as f32 * 0.7, i as f32 * 0.3, -(i as f32) * 1.1);
            let v = a.sample(p, 0.5);
            assert_eq!(v, b.sample(p, 0.5));
            assert!(v.is_finite() && v.abs().max_element() <= 3.0, "{}", v);
        }
    }

    #[test]
    fn test_components_are_decorrelated() {
        let noise = WindNoise::new(settings(NoiseMode::Procedural, 1.0));
        let differs = (0..20).any(|i| {
            let v = noise.sample(Vec3::new(i as f32 * 0.9 + 0.1, 0.3, 0.2), 0.0);
            v.x != v.y || v.y != v.z
        });
        assert!(differs);
    }

    #[test]
    fn test_texture_sample_remaps_to_signed_range() {
        let texture = NoiseTexture::from_texels(1, 1, vec![[1.0, 0.5, 0.0]]).unwrap();
        let mut noise = WindNoise::new(settings(NoiseMode::Texture, 1.0));
        noise.set_texture(Some(texture));
        let v = noise.sample(Vec3::new(12.0, -3.0, 5.0), 1.0);
        assert!((v - Vec3::new(1.0, 0.0, -1.0)).length() < 1e-6, "{}", v);
    }

    #[test]
    fn test_texture_wraps_and_interpolates() {
        let texture = NoiseTexture::from_texels(2, 1, vec![[0.0; 3], [1.0; 3]]).unwrap();
        // texel centres at u = 0.25 and 0.75
        assert_eq!(texture.sample(Vec2::new(0.25, 0.5)), Vec3::ZERO);
        assert_eq!(texture.sample(Vec2::new(1.75, 0.5)), Vec3::ONE);
        let mid = texture.sample(Vec2::new(0.5, 0.5));
        assert!((mid - Vec3::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn test_texture_without_binding_is_zero() {
        let mut noise = WindNoise::new(settings(NoiseMode::Texture, 1.0));
        noise.check_ready();
        assert_eq!(noise.sample(Vec3::ONE, 0.0), Vec3::ZERO);
    }

    #[test]
    fn test_texel_count_mismatch_rejected() {
        assert!(NoiseTexture::from_texels(2, 2, vec![[0.0; 3]; 3]).is_err());
    }
}
