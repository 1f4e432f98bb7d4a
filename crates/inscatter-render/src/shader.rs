//! Shader management.

use std::collections::HashMap;

use crate::error::{RenderError, RenderResult};
use crate::params::INSCATTERING_SHADER;

/// WGSL source of the built-in inscattering program.
pub const INSCATTERING_WGSL: &str = include_str!("shaders/inscattering.wgsl");

/// A named WGSL program with its entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub source: String,
    pub vertex_entry: String,
    pub fragment_entry: String,
}

impl ShaderSource {
    /// Creates a program using the `vs_main` and `fs_main` entry points.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            vertex_entry: "vs_main".to_string(),
            fragment_entry: "fs_main".to_string(),
        }
    }

    /// Sets the vertex shader entry point.
    #[must_use]
    pub fn with_vertex_entry(mut self, entry: impl Into<String>) -> Self {
        self.vertex_entry = entry.into();
        self
    }

    /// Sets the fragment shader entry point.
    #[must_use]
    pub fn with_fragment_entry(mut self, entry: impl Into<String>) -> Self {
        self.fragment_entry = entry.into();
        self
    }

    fn check_entry_points(&self, name: &str) -> RenderResult<()> {
        for entry in [&self.vertex_entry, &self.fragment_entry] {
            if !self.source.contains(&format!("fn {entry}(")) {
                return Err(RenderError::PipelineCreationFailed(format!(
                    "shader '{name}' has no entry point '{entry}'"
                )));
            }
        }
        Ok(())
    }
}

/// Shader programs looked up by name when a pass is created.
#[derive(Debug, Clone)]
pub struct ShaderLibrary {
    programs: HashMap<String, ShaderSource>,
}

impl ShaderLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            programs: HashMap::new(),
        }
    }

    /// Creates a library holding the built-in programs.
    #[must_use]
    pub fn new() -> Self {
        let mut library = Self::empty();
        library.register(INSCATTERING_SHADER, ShaderSource::new(INSCATTERING_WGSL));
        library
    }

    /// Adds or replaces a program.
    pub fn register(&mut self, name: impl Into<String>, program: ShaderSource) {
        self.programs.insert(name.into(), program);
    }

    /// Looks up a program by name.
    pub fn get(&self, name: &str) -> RenderResult<&ShaderSource> {
        self.programs
            .get(name)
            .ok_or_else(|| RenderError::ShaderNotFound(name.to_string()))
    }

    /// Returns true if a program with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    /// Builds the shader module of a named program.
    pub fn build_module(
        &self,
        device: &wgpu::Device,
        name: &str,
    ) -> RenderResult<(wgpu::ShaderModule, &ShaderSource)> {
        let program = self.get(name)?;
        program.check_entry_points(name)?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(program.source.as_str().into()),
        });

        Ok((module, program))
    }
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_program_present() {
        let library = ShaderLibrary::new();
        assert!(library.contains(INSCATTERING_SHADER));
        let program = library.get(INSCATTERING_SHADER).unwrap();
        assert!(program.check_entry_points(INSCATTERING_SHADER).is_ok());
    }

    #[test]
    fn test_missing_program() {
        let library = ShaderLibrary::empty();
        assert!(matches!(
            library.get(INSCATTERING_SHADER),
            Err(RenderError::ShaderNotFound(name)) if name == INSCATTERING_SHADER
        ));
    }

    #[test]
    fn test_missing_entry_point() {
        let program = ShaderSource::new("@vertex fn vs_main() {}").with_fragment_entry("shade");
        assert!(matches!(
            program.check_entry_points("custom"),
            Err(RenderError::PipelineCreationFailed(_))
        ));
    }

    #[test]
    fn test_register_replaces() {
        let mut library = ShaderLibrary::empty();
        library.register("a", ShaderSource::new("x"));
        library.register("a", ShaderSource::new("y"));
        assert_eq!(library.get("a").unwrap().source, "y");
    }
}
