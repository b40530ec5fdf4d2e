use crate::archive::ArchiveFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
    MacOS,
    Other,
}

impl Platform {
    /// Get the current platform
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOS
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    /// Get platform identifier as string
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::MacOS => "macos",
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Other => std::env::consts::OS,
        }
    }

    /// Zip on Windows, gzip-compressed tar everywhere else
    pub fn archive_format(&self) -> ArchiveFormat {
        match self {
            Platform::Windows => ArchiveFormat::Zip,
            _ => ArchiveFormat::TarGz,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Platform plus OS release, used to name staging directories and archives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub platform: Platform,
    pub release: String,
}

impl Host {
    pub fn new<S: Into<String>>(platform: Platform, release: S) -> Self {
        Self {
            platform,
            release: release.into(),
        }
    }

    pub fn current() -> Self {
        let release = sysinfo::System::kernel_version().unwrap_or_else(|| "unknown".to_string());
        Self::new(Platform::current(), release)
    }

    /// `<platform>-<release>`, e.g. `linux-6.8.0`
    pub fn tag(&self) -> String {
        format!("{}-{}", self.platform, self.release)
    }
}
