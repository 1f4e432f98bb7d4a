//! Configuration options for the inscattering pass.

use serde::{Deserialize, Serialize};

use crate::error::{InscatterError, Result};

/// Where the pass runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ExecutionContext {
    /// Interactive editing context (no UV flip).
    Editor,
    /// Deployed player build (vertical UV flip enabled).
    #[default]
    Player,
}

/// Point in the host's frame at which the pass should be scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InjectionPoint {
    /// After opaque geometry.
    AfterOpaques,
    /// After transparent geometry (default).
    #[default]
    AfterTransparents,
    /// After all post-processing.
    AfterPostProcessing,
}

/// Filtering mode of the temporary target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TargetFilter {
    /// Nearest texel, no resampling (default).
    #[default]
    Nearest,
    /// Bilinear.
    Linear,
}

/// Configuration options for the inscattering pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InscatteringOptions {
    /// Execution context, selects the UV flip variant.
    pub context: ExecutionContext,
    /// Where the host should schedule the pass.
    pub injection_point: InjectionPoint,
    /// Filtering of the temporary target.
    pub temporary_filter: TargetFilter,
    /// Added to the volume yaw so the shader's canonical axis matches the
    /// authored forward of a volume.
    pub yaw_offset_degrees: f32,
    /// Radius = local X scale times this factor.
    pub radius_scale: f32,
    /// Whether the spherical-volume shader variant is enabled.
    pub spherical_volume: bool,
}

impl Default for InscatteringOptions {
    fn default() -> Self {
        Self {
            context: ExecutionContext::Player,
            injection_point: InjectionPoint::AfterTransparents,
            temporary_filter: TargetFilter::Nearest,
            yaw_offset_degrees: -90.0,
            radius_scale: 0.5,
            spherical_volume: true,
        }
    }
}

impl InscatteringOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the execution context.
    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// Sets the injection point.
    pub fn with_injection_point(mut self, injection_point: InjectionPoint) -> Self {
        self.injection_point = injection_point;
        self
    }

    /// Sets the temporary target filter.
    pub fn with_temporary_filter(mut self, filter: TargetFilter) -> Self {
        self.temporary_filter = filter;
        self
    }

    /// Sets the yaw offset in degrees.
    pub fn with_yaw_offset(mut self, degrees: f32) -> Self {
        self.yaw_offset_degrees = degrees;
        self
    }

    /// Sets the radius scale.
    pub fn with_radius_scale(mut self, scale: f32) -> Self {
        self.radius_scale = scale;
        self
    }

    /// Returns true if the vertical UV flip variant should be enabled.
    pub fn flip_uv(&self) -> bool {
        self.context == ExecutionContext::Player
    }

    /// Checks the options for values the pass cannot use.
    pub fn validate(&self) -> Result<()> {
        if !self.radius_scale.is_finite() || self.radius_scale <= 0.0 {
            return Err(InscatterError::InvalidOptions(format!(
                "radius_scale must be positive, got {}",
                self.radius_scale
            )));
        }
        if !self.yaw_offset_degrees.is_finite() {
            return Err(InscatterError::InvalidOptions(
                "yaw_offset_degrees must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Parses and validates options from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Serializes the options to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
