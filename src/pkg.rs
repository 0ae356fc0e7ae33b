// src/pkg.rs
// Package manager detection and command construction

use crate::utils::validate_token;
use crate::{MachinaError, Result};
use std::sync::OnceLock;

/// Package managers Machina knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
    Pacman,
    Zypper,
}

/// Detection priority. The first binary found on PATH wins, so identical
/// hosts always resolve identically.
pub const DETECTION_ORDER: [PackageManager; 5] = [
    PackageManager::Apt,
    PackageManager::Dnf,
    PackageManager::Yum,
    PackageManager::Pacman,
    PackageManager::Zypper,
];

/// Operations expressible against any supported manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageAction {
    Install,
    Remove,
    Update,
    Search,
    List,
}

impl PackageAction {
    pub fn parse(action: &str) -> Result<Self> {
        match action {
            "install" => Ok(Self::Install),
            "remove" => Ok(Self::Remove),
            "update" => Ok(Self::Update),
            "search" => Ok(Self::Search),
            "list" => Ok(Self::List),
            other => Err(MachinaError::InvalidInput(format!(
                "unknown package action `{other}`; use install/remove/update/search/list"
            ))),
        }
    }

    /// Whether this action mutates the system and therefore requires sudo.
    pub fn privileged(&self) -> bool {
        matches!(self, Self::Install | Self::Remove | Self::Update)
    }

    fn needs_package(&self) -> bool {
        matches!(self, Self::Install | Self::Remove | Self::Search)
    }
}

impl std::fmt::Display for PackageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Install => "install",
            Self::Remove => "remove",
            Self::Update => "update",
            Self::Search => "search",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

impl PackageManager {
    /// Binary probed for on PATH. `apt-get` stands in for the whole apt
    /// family: it is present wherever `apt` is.
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Pacman => "pacman",
            Self::Zypper => "zypper",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Pacman => "pacman",
            Self::Zypper => "zypper",
        }
    }

    /// Final command line for `action`, with the package name validated and
    /// substituted. `update` refreshes the package index; it does not
    /// upgrade installed packages.
    pub fn command(&self, action: PackageAction, package: Option<&str>) -> Result<String> {
        let package = if action.needs_package() {
            let name = package.ok_or_else(|| {
                MachinaError::InvalidInput(format!("package_name is required for {action}"))
            })?;
            validate_token(name, "package name")?;
            Some(name)
        } else {
            None
        };

        let command = match (self, action, package) {
            (Self::Apt, PackageAction::Install, Some(p)) => format!("apt-get install -y {p}"),
            (Self::Apt, PackageAction::Remove, Some(p)) => format!("apt-get remove -y {p}"),
            (Self::Apt, PackageAction::Update, _) => "apt-get update".to_string(),
            (Self::Apt, PackageAction::Search, Some(p)) => format!("apt-cache search {p}"),
            (Self::Apt, PackageAction::List, _) => "apt list --installed".to_string(),

            (Self::Dnf, PackageAction::Install, Some(p)) => format!("dnf install -y {p}"),
            (Self::Dnf, PackageAction::Remove, Some(p)) => format!("dnf remove -y {p}"),
            (Self::Dnf, PackageAction::Update, _) => "dnf check-update".to_string(),
            (Self::Dnf, PackageAction::Search, Some(p)) => format!("dnf search {p}"),
            (Self::Dnf, PackageAction::List, _) => "dnf list --installed".to_string(),

            (Self::Yum, PackageAction::Install, Some(p)) => format!("yum install -y {p}"),
            (Self::Yum, PackageAction::Remove, Some(p)) => format!("yum remove -y {p}"),
            (Self::Yum, PackageAction::Update, _) => "yum check-update".to_string(),
            (Self::Yum, PackageAction::Search, Some(p)) => format!("yum search {p}"),
            (Self::Yum, PackageAction::List, _) => "yum list installed".to_string(),

            (Self::Pacman, PackageAction::Install, Some(p)) => {
                format!("pacman -S --noconfirm {p}")
            }
            (Self::Pacman, PackageAction::Remove, Some(p)) => {
                format!("pacman -R --noconfirm {p}")
            }
            (Self::Pacman, PackageAction::Update, _) => "pacman -Sy".to_string(),
            (Self::Pacman, PackageAction::Search, Some(p)) => format!("pacman -Ss {p}"),
            (Self::Pacman, PackageAction::List, _) => "pacman -Q".to_string(),

            (Self::Zypper, PackageAction::Install, Some(p)) => {
                format!("zypper --non-interactive install {p}")
            }
            (Self::Zypper, PackageAction::Remove, Some(p)) => {
                format!("zypper --non-interactive remove {p}")
            }
            (Self::Zypper, PackageAction::Update, _) => "zypper refresh".to_string(),
            (Self::Zypper, PackageAction::Search, Some(p)) => format!("zypper search {p}"),
            (Self::Zypper, PackageAction::List, _) => {
                "zypper packages --installed-only".to_string()
            }

            // needs_package() guarantees the name is present above
            (_, _, None) => unreachable!("package presence checked before templating"),
        };
        Ok(command)
    }
}

/// Seam for probing PATH. Production uses the `which` crate; tests inject a
/// fixed set of binaries.
pub trait BinaryProbe: Send + Sync {
    fn exists(&self, binary: &str) -> bool;
}

/// Production probe backed by `which`.
#[derive(Debug, Default)]
pub struct WhichProbe;

impl BinaryProbe for WhichProbe {
    fn exists(&self, binary: &str) -> bool {
        which::which(binary).is_ok()
    }
}

/// Resolves the host's package manager once per process lifetime.
pub struct PackageResolver {
    probe: Box<dyn BinaryProbe>,
    resolved: OnceLock<Option<PackageManager>>,
}

impl PackageResolver {
    pub fn new() -> Self {
        Self::with_probe(Box::new(WhichProbe))
    }

    pub fn with_probe(probe: Box<dyn BinaryProbe>) -> Self {
        Self {
            probe,
            resolved: OnceLock::new(),
        }
    }

    /// First supported manager present on this host. Probed once, then
    /// cached; identical host state resolves identically.
    pub fn detect(&self) -> Option<PackageManager> {
        *self.resolved.get_or_init(|| {
            DETECTION_ORDER
                .into_iter()
                .find(|manager| self.probe.exists(manager.binary()))
        })
    }

    /// Build the command line for `action` on the detected manager.
    pub fn build_command(&self, action: PackageAction, package: Option<&str>) -> Result<String> {
        let manager = self.detect().ok_or(MachinaError::UnsupportedEnvironment)?;
        manager.command(action, package)
    }
}

impl Default for PackageResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProbe {
        present: HashSet<&'static str>,
        probes: AtomicUsize,
    }

    impl FixedProbe {
        fn new(present: &[&'static str]) -> Self {
            Self {
                present: present.iter().copied().collect(),
                probes: AtomicUsize::new(0),
            }
        }
    }

    impl BinaryProbe for FixedProbe {
        fn exists(&self, binary: &str) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.present.contains(binary)
        }
    }

    impl BinaryProbe for std::sync::Arc<FixedProbe> {
        fn exists(&self, binary: &str) -> bool {
            self.as_ref().exists(binary)
        }
    }

    #[test]
    fn test_detect_honors_priority_order() {
        let resolver = PackageResolver::with_probe(Box::new(FixedProbe::new(&["dnf", "pacman"])));
        assert_eq!(resolver.detect(), Some(PackageManager::Dnf));
    }

    #[test]
    fn test_detect_first_in_order_wins() {
        let resolver =
            PackageResolver::with_probe(Box::new(FixedProbe::new(&["zypper", "apt-get"])));
        assert_eq!(resolver.detect(), Some(PackageManager::Apt));
    }

    #[test]
    fn test_detect_none_found() {
        let resolver = PackageResolver::with_probe(Box::new(FixedProbe::new(&[])));
        assert_eq!(resolver.detect(), None);
        let err = resolver
            .build_command(PackageAction::Search, Some("vim"))
            .unwrap_err();
        assert!(matches!(err, MachinaError::UnsupportedEnvironment));
    }

    #[test]
    fn test_detect_probes_once() {
        let probe = std::sync::Arc::new(FixedProbe::new(&["pacman"]));
        let resolver = PackageResolver::with_probe(Box::new(probe.clone()));

        assert_eq!(resolver.detect(), Some(PackageManager::Pacman));
        let first = probe.probes.load(Ordering::SeqCst);
        assert_eq!(resolver.detect(), Some(PackageManager::Pacman));
        assert_eq!(probe.probes.load(Ordering::SeqCst), first);
    }

    #[test]
    fn test_build_command_templates() {
        let resolver = PackageResolver::with_probe(Box::new(FixedProbe::new(&["apt-get"])));
        assert_eq!(
            resolver
                .build_command(PackageAction::Install, Some("vim"))
                .unwrap(),
            "apt-get install -y vim"
        );
        assert_eq!(
            resolver.build_command(PackageAction::Update, None).unwrap(),
            "apt-get update"
        );
        assert_eq!(
            resolver
                .build_command(PackageAction::Search, Some("ripgrep"))
                .unwrap(),
            "apt-cache search ripgrep"
        );
    }

    #[test]
    fn test_pacman_noconfirm() {
        assert_eq!(
            PackageManager::Pacman
                .command(PackageAction::Install, Some("vim"))
                .unwrap(),
            "pacman -S --noconfirm vim"
        );
    }

    #[test]
    fn test_update_ignores_package_name() {
        assert_eq!(
            PackageManager::Dnf
                .command(PackageAction::Update, Some("vim"))
                .unwrap(),
            "dnf check-update"
        );
    }

    #[test]
    fn test_missing_package_name_rejected() {
        let err = PackageManager::Apt
            .command(PackageAction::Install, None)
            .unwrap_err();
        assert!(matches!(err, MachinaError::InvalidInput(_)));
    }

    #[test]
    fn test_metacharacters_in_package_name_rejected() {
        let err = PackageManager::Apt
            .command(PackageAction::Install, Some("vim; rm -rf /"))
            .unwrap_err();
        assert!(matches!(err, MachinaError::InvalidInput(_)));
    }

    #[test]
    fn test_action_parse() {
        assert_eq!(
            PackageAction::parse("install").unwrap(),
            PackageAction::Install
        );
        assert!(PackageAction::parse("frobnicate").is_err());
    }

    #[test]
    fn test_privileged_actions() {
        assert!(PackageAction::Install.privileged());
        assert!(PackageAction::Remove.privileged());
        assert!(PackageAction::Update.privileged());
        assert!(!PackageAction::Search.privileged());
        assert!(!PackageAction::List.privileged());
    }
}
