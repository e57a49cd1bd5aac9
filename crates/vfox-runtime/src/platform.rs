//! Platform identifiers in the spelling plugins match against.
//!
//! Plugins written for vfox compare `OS_TYPE` with `"darwin"`, `"linux"` and
//! `"windows"`, and `ARCH_TYPE` with `"amd64"`, `"arm64"` and `"386"`.

/// Identifier of the running operating system.
pub fn os_type() -> &'static str {
    map_os(std::env::consts::OS)
}

/// Identifier of the running CPU architecture.
pub fn arch_type() -> &'static str {
    map_arch(std::env::consts::ARCH)
}

fn map_os(os: &'static str) -> &'static str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

fn map_arch(arch: &'static str) -> &'static str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64",
        "s390x" => "s390x",
        "riscv64" => "riscv64",
        "loongarch64" => "loong64",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_os() {
        assert_eq!(map_os("macos"), "darwin");
        assert_eq!(map_os("linux"), "linux");
        assert_eq!(map_os("windows"), "windows");
    }

    #[test]
    fn test_map_arch() {
        assert_eq!(map_arch("x86_64"), "amd64");
        assert_eq!(map_arch("aarch64"), "arm64");
        assert_eq!(map_arch("x86"), "386");
    }

    #[test]
    fn test_current_platform_is_not_empty() {
        assert!(!os_type().is_empty());
        assert!(!arch_type().is_empty());
    }
}
