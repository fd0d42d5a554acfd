//! Noise profiles and the named profile library.
//!
//! A [`NoiseProfile`] is the whole user-facing configuration: evaluator
//! parameters, the ordered shape list, and output settings. Profiles are
//! plain serde values; compiling one into a [`NoiseEvaluator`] is a separate,
//! pure step (`apply`), so the same profile can feed any number of
//! independent synthesis calls.
//!
//! Cellular "noise lookup" profiles reference other profiles by name. The
//! [`ProfileLibrary`] resolves those references depth-first and rejects
//! unknown names and cycles before any evaluator is built.

use crate::config::NoiseConfig;
use crate::error::NoiseError;
use crate::evaluator::NoiseEvaluator;
use crate::field::{ColorFormat, FieldBuffer};
use crate::preset::Preset;
use crate::shape::Shape;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Texture edge length at resolution tier 0.
const BASE_TEXTURE_SIZE: usize = 32;
/// Highest resolution tier.
pub const MAX_RESOLUTION: u32 = 3;
/// Upper end of the accepted base value range.
const MAX_BASE_VALUE: f64 = 5.0;

/// Evaluator parameters, shapes, and output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseProfile {
    #[serde(flatten)]
    pub config: NoiseConfig,
    /// Accumulation order matters: later shapes add onto earlier ones.
    pub shapes: Vec<Shape>,
    /// Added to every noise sample before shape masking.
    pub base_value: f64,
    pub color_format: ColorFormat,
    /// Tier `t` gives `32 * 2^t` texels per axis.
    pub resolution: u32,
}

impl Default for NoiseProfile {
    fn default() -> Self {
        Self {
            config: NoiseConfig::default(),
            shapes: Vec::new(),
            base_value: 0.0,
            color_format: ColorFormat::Rgba32,
            resolution: 2,
        }
    }
}

impl NoiseProfile {
    /// A default profile carrying the shape list of `preset`.
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            shapes: preset.shapes(),
            ..Self::default()
        }
    }

    /// Parses a profile from JSON.
    pub fn from_json(json: &str) -> Result<Self, NoiseError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON profile file.
    pub fn load(path: &Path) -> Result<Self, NoiseError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| NoiseError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Pretty-printed JSON form.
    pub fn to_json_pretty(&self) -> Result<String, NoiseError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Texels per axis for the configured resolution tier.
    pub fn texture_size(&self) -> usize {
        BASE_TEXTURE_SIZE << self.resolution.min(MAX_RESOLUTION)
    }

    /// A zeroed 2D buffer of the profile's size and color format.
    pub fn new_buffer_2d(&self) -> Result<FieldBuffer, NoiseError> {
        let n = self.texture_size();
        FieldBuffer::new_2d(n, n, self.color_format)
    }

    /// A zeroed 3D buffer of the profile's size and color format.
    pub fn new_buffer_3d(&self) -> Result<FieldBuffer, NoiseError> {
        let n = self.texture_size();
        FieldBuffer::new_3d(n, n, n, self.color_format)
    }

    /// Checks every field against its accepted range.
    pub fn validate(&self) -> Result<(), NoiseError> {
        self.config.validate()?;
        if !(0.0..=MAX_BASE_VALUE).contains(&self.base_value) {
            return Err(NoiseError::invalid(
                "base_value",
                format!("must be in [0, {MAX_BASE_VALUE}]"),
            ));
        }
        if self.resolution > MAX_RESOLUTION {
            return Err(NoiseError::invalid(
                "resolution",
                format!("must be at most {MAX_RESOLUTION}"),
            ));
        }
        for (i, shape) in self.shapes.iter().enumerate() {
            if !(shape.fade_distance > 0.0 && shape.fade_distance <= 1.0) {
                return Err(NoiseError::invalid(
                    &format!("shapes[{i}].fade_distance"),
                    "must be in (0, 1]",
                ));
            }
            if !(0.0..=1.0).contains(&shape.fade) {
                return Err(NoiseError::invalid(
                    &format!("shapes[{i}].fade"),
                    "must be in [0, 1]",
                ));
            }
            if !(shape.position.is_finite() && shape.size.is_finite()) {
                return Err(NoiseError::invalid(
                    &format!("shapes[{i}]"),
                    "position and size must be finite",
                ));
            }
        }
        Ok(())
    }

    /// Compiles the evaluator for a profile without a cellular lookup.
    ///
    /// Profiles that sample a lookup must be compiled through a
    /// [`ProfileLibrary`]; here they fail with `NoiseError::MissingLookup`.
    pub fn apply(&self) -> Result<NoiseEvaluator, NoiseError> {
        self.validate()?;
        NoiseEvaluator::new(&self.config)
    }
}

/// Named profiles whose cellular lookups may reference each other.
#[derive(Debug, Clone, Default)]
pub struct ProfileLibrary {
    profiles: BTreeMap<String, NoiseProfile>,
}

impl ProfileLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a profile.
    pub fn insert(&mut self, name: impl Into<String>, profile: NoiseProfile) {
        self.profiles.insert(name.into(), profile);
    }

    pub fn get(&self, name: &str) -> Option<&NoiseProfile> {
        self.profiles.get(name)
    }

    /// Profile names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Loads every `*.json` file in `dir`, keyed by file stem.
    pub fn load_dir(dir: &Path) -> Result<Self, NoiseError> {
        let mut library = Self::new();
        let entries =
            std::fs::read_dir(dir).map_err(|e| NoiseError::Io(format!("{}: {e}", dir.display())))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            log::debug!("loading profile '{stem}' from {}", path.display());
            library.insert(stem, NoiseProfile::load(&path)?);
        }
        Ok(library)
    }

    /// Compiles `name` together with its chain of lookup profiles.
    ///
    /// Fails with `UnknownProfile` for dangling references, `MissingLookup`
    /// when a lookup profile is required but unnamed, and `LookupCycle` when
    /// the chain revisits a profile.
    pub fn compile(&self, name: &str) -> Result<NoiseEvaluator, NoiseError> {
        self.compile_chain(name, &mut Vec::new())
    }

    /// Checks that every profile in the library compiles.
    pub fn validate(&self) -> Result<(), NoiseError> {
        self.names().try_for_each(|name| self.compile(name).map(|_| ()))
    }

    fn compile_chain(
        &self,
        name: &str,
        chain: &mut Vec<String>,
    ) -> Result<NoiseEvaluator, NoiseError> {
        if let Some(start) = chain.iter().position(|n| n == name) {
            let mut cycle = chain[start..].to_vec();
            cycle.push(name.to_owned());
            return Err(NoiseError::LookupCycle(cycle));
        }
        let profile = self
            .get(name)
            .ok_or_else(|| NoiseError::UnknownProfile(name.to_owned()))?;
        profile.validate()?;

        let lookup = if profile.config.needs_lookup() {
            let target = profile
                .config
                .cellular_lookup
                .as_deref()
                .ok_or_else(|| NoiseError::MissingLookup(name.to_owned()))?;
            log::debug!("profile '{name}' looks up cellular noise from '{target}'");
            chain.push(name.to_owned());
            let compiled = self.compile_chain(target, chain)?;
            chain.pop();
            Some(compiled)
        } else {
            None
        };
        NoiseEvaluator::with_lookup(&profile.config, lookup)
    }
}
