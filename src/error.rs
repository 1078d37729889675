//! Error types for vitrine.
//!
//! This module provides error types for GPU initialization, asset loading,
//! scene configuration, and view lifecycle operations.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur while loading scene assets.
#[derive(Debug)]
pub enum AssetError {
    /// Failed to read bytes from the asset source.
    Io(std::io::Error),
    /// Failed to decode an image payload.
    Decode(image::ImageError),
    /// The asset source rejected the request.
    Source(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::Io(e) => write!(f, "Failed to read asset: {}", e),
            AssetError::Decode(e) => write!(f, "Failed to decode image asset: {}", e),
            AssetError::Source(msg) => write!(f, "Asset source error: {}", msg),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io(e) => Some(e),
            AssetError::Decode(e) => Some(e),
            AssetError::Source(_) => None,
        }
    }
}

impl From<std::io::Error> for AssetError {
    fn from(e: std::io::Error) -> Self {
        AssetError::Io(e)
    }
}

impl From<image::ImageError> for AssetError {
    fn from(e: image::ImageError) -> Self {
        AssetError::Decode(e)
    }
}

/// Errors produced by invalid scene configuration.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The particle instance count must be positive.
    InvalidInstanceCount(u32),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidInstanceCount(n) => {
                write!(f, "Particle instance count must be positive (got {})", n)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors that can occur when mounting a scene view.
#[derive(Debug)]
pub enum ViewError {
    /// GPU initialization failed.
    Gpu(GpuError),
    /// Scene configuration was rejected.
    Config(ConfigError),
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::Gpu(e) => write!(f, "GPU error: {}", e),
            ViewError::Config(e) => write!(f, "Scene configuration error: {}", e),
        }
    }
}

impl std::error::Error for ViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewError::Gpu(e) => Some(e),
            ViewError::Config(e) => Some(e),
        }
    }
}

impl From<GpuError> for ViewError {
    fn from(e: GpuError) -> Self {
        ViewError::Gpu(e)
    }
}

impl From<ConfigError> for ViewError {
    fn from(e: ConfigError) -> Self {
        ViewError::Config(e)
    }
}
