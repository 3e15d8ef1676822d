//! The live render configuration. It's tuned from the keyboard while browsing and read once per
//! frame as a snapshot; nothing here is ever written to disk.

use std::ops::RangeInclusive;

use winit::keyboard::KeyCode;

use crate::error::{Error, Result};

macro_rules! render_config {
    (pub struct $config:ident / pub enum $key:ident { $(
        $case:ident = $field:ident = $name:literal {
            default: $default:literal,
            range: [$min:literal, $max:literal],
            step: $step:literal,
            label: $label:literal,
            binding: $binding:expr,
        },
    )* }) => {
        /// All tunable parameters of the particle renderer.
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $config { $(
            pub $field: f32,
        )* }

        impl Default for $config {
            fn default() -> Self {
                Self { $(
                    $field: $default,
                )* }
            }
        }

        #[derive(Debug, Copy, Clone, PartialEq, Eq)]
        pub enum $key {
            $($case,)*
        }

        impl $key {
            pub const ALL: &[$key] = &[$($key::$case,)*];

            /// The key's external name, as used by the gallery front-end.
            pub fn name(self) -> &'static str {
                match self { $(
                    $key::$case => $name,
                )* }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name { $(
                    $name => Some($key::$case),
                )*
                    _ => None,
                }
            }

            pub fn label(self) -> &'static str {
                match self { $(
                    $key::$case => $label,
                )* }
            }

            pub fn default_value(self) -> f32 {
                match self { $(
                    $key::$case => $default,
                )* }
            }

            /// The range the UI keeps values in. The store itself accepts anything.
            pub fn range(self) -> RangeInclusive<f32> {
                match self { $(
                    $key::$case => $min..=$max,
                )* }
            }

            pub fn step(self) -> f32 {
                match self { $(
                    $key::$case => $step,
                )* }
            }

            /// The key that selects this parameter for editing, if it is exposed at all.
            pub fn binding(self) -> Option<KeyCode> {
                match self { $(
                    $key::$case => $binding,
                )* }
            }
        }

        impl $config {
            pub fn get(&self, key: $key) -> f32 {
                match key { $(
                    $key::$case => self.$field,
                )* }
            }

            /// Stores `value` as-is. No clamping, no validation.
            pub fn set(&mut self, key: $key, value: f32) {
                match key { $(
                    $key::$case => self.$field = value,
                )* }
            }
        }
    };
}

render_config!(
    pub struct RenderConfig / pub enum ConfigKey {
        Dispersion = dispersion = "dispersion" {
            default: 1.5,
            range: [0.0, 10.0],
            step: 0.1,
            label: "Dispersion",
            binding: Some(KeyCode::KeyQ),
        },
        ParticleSize = particle_size = "particleSize" {
            default: 2.0,
            range: [0.1, 5.0],
            step: 0.1,
            label: "Particle Size",
            binding: Some(KeyCode::KeyW),
        },
        Contrast = contrast = "contrast" {
            default: 1.1,
            range: [0.5, 2.0],
            step: 0.1,
            label: "Contrast",
            binding: Some(KeyCode::KeyE),
        },
        FlowSpeed = flow_speed = "flowSpeed" {
            default: 0.5,
            range: [0.0, 5.0],
            step: 0.1,
            label: "Flow Speed",
            binding: Some(KeyCode::KeyR),
        },
        FlowAmplitude = flow_amplitude = "flowAmplitude" {
            default: 0.5,
            range: [0.0, 2.0],
            step: 0.1,
            label: "Flow Amplitude",
            binding: Some(KeyCode::KeyT),
        },
        DepthStrength = depth_strength = "depthStrength" {
            default: 0.2,
            range: [0.0, 2.0],
            step: 0.05,
            label: "Depth Strength",
            binding: Some(KeyCode::KeyY),
        },
        // Reserved. Nothing in the renderer reads it yet, so it has no key binding.
        ColorShiftSpeed = color_shift_speed = "colorShiftSpeed" {
            default: 0.0,
            range: [0.0, 5.0],
            step: 0.1,
            label: "Color Shift",
            binding: None,
        },
    }
);

impl ConfigKey {
    pub fn activate(key: KeyCode) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|config_key| config_key.binding() == Some(key))
    }

    pub fn is_exposed(self) -> bool {
        self.binding().is_some()
    }
}

impl RenderConfig {
    /// Restores every parameter to its default, discarding all edits.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Moves `key` by `steps` UI steps, snapping to the step grid and keeping the result inside
    /// the recommended range. This is the slider behaviour; `set` stays unconstrained.
    pub fn nudge(&mut self, key: ConfigKey, steps: f32) {
        let step = key.step();
        let range = key.range();
        let current = self.get(key);
        let current = if current.is_finite() {
            current
        } else {
            key.default_value()
        };
        let snapped = ((current + steps * step) / step).round() * step;
        self.set(key, snapped.clamp(*range.start(), *range.end()));
    }

    /// Applies a `name=value` override such as `flowSpeed=1.2`, using the parameters' external
    /// names. Like `set`, the value is not range checked.
    pub fn apply_override(&mut self, text: &str) -> Result<()> {
        let bad = || Error::BadOverride(text.to_owned());
        let (name, value) = text.split_once('=').ok_or_else(bad)?;
        let key = ConfigKey::from_name(name.trim()).ok_or_else(bad)?;
        let value: f32 = value.trim().parse().map_err(|_| bad())?;
        self.set(key, value);
        Ok(())
    }

    /// Returns a copy safe to upload to the GPU: non-finite values fall back to their defaults.
    /// Finite values outside the recommended range pass through untouched.
    pub fn sanitized(&self) -> Self {
        let mut out = *self;
        for &key in ConfigKey::ALL {
            if !out.get(key).is_finite() {
                log::warn!(
                    "{} is {}, using default {}",
                    key.name(),
                    out.get(key),
                    key.default_value()
                );
                out.set(key, key.default_value());
            }
        }
        out
    }
}
