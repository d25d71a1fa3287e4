//! The keyword catalog.
//!
//! A keyword is a named bundle of Debian packages. Most keywords only install
//! and remove their package list; the few that need extra steps carry a
//! custom [`Setup`] strategy.

use crate::config::GitIdentity;
use crate::sudo::InvokingUser;
use crate::{runner, ui};
use aptkit::{Action, Client, Package};
use std::fmt;
use thiserror::Error;

pub const KEYWORD_MAX_LENGTH: usize = 8;

/// Name of the pseudo keyword standing for "every keyword".
pub const ALL: &str = "all";

// ============================================================================
// Operation
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Install,
    Remove,
}

impl Operation {
    pub fn verb(self) -> &'static str {
        match self {
            Self::Install => "installing",
            Self::Remove => "removing",
        }
    }

    pub fn past(self) -> &'static str {
        match self {
            Self::Install => "installed",
            Self::Remove => "removed",
        }
    }

    /// Infinitive, as in "could not install".
    pub fn infinitive(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Remove => "remove",
        }
    }

    fn action(self) -> Action {
        match self {
            Self::Install => Action::Install,
            Self::Remove => Action::Remove,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown keyword \"{0}\", see valid keyword names with $ tuffix list")]
pub struct UnknownKeyword(pub String);

/// Failure of a keyword's install or remove step.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Apt(#[from] aptkit::Error),

    /// apt ran but refused some packages
    #[error("{}", .0.join("; "))]
    Rejected(Vec<String>),

    /// The host is unsuitable for this keyword
    #[error("{0}")]
    Refused(String),

    #[error(transparent)]
    Host(#[from] hostinfo::Error),

    #[error("{0:#}")]
    Command(anyhow::Error),
}

// ============================================================================
// Setup strategies
// ============================================================================

/// Everything a setup step may touch.
pub struct SetupContext {
    pub client: Client,
    /// Identity written to the invoking user's git configuration
    pub git: Option<GitIdentity>,
    /// The user who ran `sudo tuffix`, for steps that act on their account
    pub user: Option<InvokingUser>,
}

impl SetupContext {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            git: None,
            user: None,
        }
    }
}

pub trait Setup: Sync {
    fn install(&self, keyword: &Keyword, ctx: &SetupContext) -> Result<(), SetupError>;
    fn remove(&self, keyword: &Keyword, ctx: &SetupContext) -> Result<(), SetupError>;
}

/// Run one apt transaction over `names` and turn rejected packages into an error.
fn transact(client: &Client, op: Operation, names: &[&str]) -> Result<(), SetupError> {
    if names.is_empty() {
        return Ok(());
    }
    let packages = Package::from_names(names);
    let report = match op.action() {
        Action::Install => client.install_all(&packages)?,
        Action::Remove => client.remove_all(&packages)?,
    };
    if report.is_success() {
        return Ok(());
    }

    let failures: Vec<String> = report
        .failures()
        .into_iter()
        .map(|(_, reason)| reason.to_string())
        .collect();
    if failures.is_empty() {
        return Err(SetupError::Rejected(vec![format!(
            "apt did not {} every package",
            op.infinitive()
        )]));
    }
    Err(SetupError::Rejected(failures))
}

/// Install or remove exactly the keyword's package list.
pub struct PackagesOnly;

impl Setup for PackagesOnly {
    fn install(&self, keyword: &Keyword, ctx: &SetupContext) -> Result<(), SetupError> {
        transact(&ctx.client, Operation::Install, keyword.packages)
    }

    fn remove(&self, keyword: &Keyword, ctx: &SetupContext) -> Result<(), SetupError> {
        transact(&ctx.client, Operation::Remove, keyword.packages)
    }
}

/// `apt-get update` followed by `apt-get upgrade`; nothing to undo.
pub struct SystemUpgrade;

impl Setup for SystemUpgrade {
    fn install(&self, _keyword: &Keyword, ctx: &SetupContext) -> Result<(), SetupError> {
        ctx.client.update()?;
        ctx.client.upgrade()?;
        Ok(())
    }

    fn remove(&self, _keyword: &Keyword, _ctx: &SetupContext) -> Result<(), SetupError> {
        ui::info("Nothing to remove for system upgrade, ignoring request");
        Ok(())
    }
}

/// Headers matching the running kernel, resolved when applied.
pub struct KernelHeaders;

impl KernelHeaders {
    fn package() -> Result<String, SetupError> {
        Ok(format!("linux-headers-{}", hostinfo::kernel_release()?))
    }
}

impl Setup for KernelHeaders {
    fn install(&self, _keyword: &Keyword, ctx: &SetupContext) -> Result<(), SetupError> {
        ui::warn(
            "Kernel exercises can break the host OS; work inside a VM snapshot you can restore",
        );
        let package = Self::package()?;
        transact(&ctx.client, Operation::Install, &[package.as_str()])
    }

    fn remove(&self, _keyword: &Keyword, ctx: &SetupContext) -> Result<(), SetupError> {
        let package = Self::package()?;
        transact(&ctx.client, Operation::Remove, &[package.as_str()])
    }
}

/// VirtualBox cannot run nested inside another hypervisor.
pub struct VirtualBox;

impl Setup for VirtualBox {
    fn install(&self, keyword: &Keyword, ctx: &SetupContext) -> Result<(), SetupError> {
        if hostinfo::is_virtual_machine()? {
            return Err(SetupError::Refused(
                "this is a virtual environment, not proceeding".to_string(),
            ));
        }
        transact(&ctx.client, Operation::Install, keyword.packages)
    }

    fn remove(&self, keyword: &Keyword, ctx: &SetupContext) -> Result<(), SetupError> {
        transact(&ctx.client, Operation::Remove, keyword.packages)
    }
}

/// Toolchain packages plus the invoking user's git identity.
pub struct BaseSetup;

impl BaseSetup {
    fn configure_git(ctx: &SetupContext) -> Result<(), SetupError> {
        let (Some(identity), Some(user)) = (&ctx.git, &ctx.user) else {
            ui::warn("git identity not configured; set [git] name and email in the tuffix config");
            return Ok(());
        };
        for (key, value) in [("user.name", &identity.name), ("user.email", &identity.email)] {
            let mut command = user.command("git");
            command.args(["config", "--global", key, value.as_str()]);
            runner::run_capture(command).map_err(SetupError::Command)?;
        }
        ui::success(&format!("Configured git for {}", user.name));
        Ok(())
    }
}

impl Setup for BaseSetup {
    fn install(&self, keyword: &Keyword, ctx: &SetupContext) -> Result<(), SetupError> {
        transact(&ctx.client, Operation::Install, keyword.packages)?;
        Self::configure_git(ctx)
    }

    fn remove(&self, keyword: &Keyword, ctx: &SetupContext) -> Result<(), SetupError> {
        transact(&ctx.client, Operation::Remove, keyword.packages)
    }
}

// ============================================================================
// Keyword
// ============================================================================

pub struct Keyword {
    pub name: &'static str,
    pub description: &'static str,
    pub packages: &'static [&'static str],
    pub setup: &'static dyn Setup,
    /// Stands for other keywords rather than a bundle of its own
    pub pseudo: bool,
}

impl Keyword {
    fn new(
        name: &'static str,
        description: &'static str,
        packages: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            description,
            packages,
            setup: &PackagesOnly,
            pseudo: false,
        }
    }

    fn with_setup(mut self, setup: &'static dyn Setup) -> Self {
        self.setup = setup;
        self
    }

    pub fn apply(&self, op: Operation, ctx: &SetupContext) -> Result<(), SetupError> {
        log::debug!("{} {} via {} package(s)", op.verb(), self.name, self.packages.len());
        match op {
            Operation::Install => self.setup.install(self, ctx),
            Operation::Remove => self.setup.remove(self, ctx),
        }
    }
}

impl fmt::Debug for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyword")
            .field("name", &self.name)
            .field("packages", &self.packages)
            .field("pseudo", &self.pseudo)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Catalog
// ============================================================================

const BASE_PACKAGES: &[&str] = &[
    "build-essential",
    "clang",
    "clang-format",
    "clang-tidy",
    "cmake",
    "gdb",
    "gcc",
    "git",
    "g++",
    "libc++-dev",
    "libc++abi-dev",
    "libgtest-dev",
    "libgmock-dev",
    "lldb",
];

const GENERAL_PACKAGES: &[&str] = &[
    "autoconf",
    "automake",
    "a2ps",
    "cscope",
    "curl",
    "dkms",
    "emacs",
    "enscript",
    "glibc-doc",
    "gpg",
    "graphviz",
    "gthumb",
    "libreadline-dev",
    "manpages-posix",
    "manpages-posix-dev",
    "meld",
    "nfs-common",
    "openssh-client",
    "openssh-server",
    "seahorse",
    "synaptic",
    "vim",
    "vim-gtk3",
];

const C223W_PACKAGES: &[&str] = &[
    "binutils",
    "curl",
    "gnupg2",
    "libc6-dev",
    "libcurl4",
    "libedit2",
    "libgcc-9-dev",
    "libpython2.7",
    "libsqlite3-0",
    "libstdc++-9-dev",
    "libxml2",
    "libz3-dev",
    "pkg-config",
    "tzdata",
    "zlib1g-dev",
];

const C484_PACKAGES: &[&str] = &[
    "freeglut3-dev",
    "libfreeimage-dev",
    "libgl1-mesa-dev",
    "libglew-dev",
    "libglu1-mesa-dev",
    "libopenctm-dev",
    "libx11-dev",
    "libxi-dev",
    "libxrandr-dev",
    "mesa-utils",
    "mesa-utils-extra",
    "openctm-doc",
    "openctm-tools",
];

/// Ordered: `all`, named keywords, course keywords, then `test`.
fn catalog() -> Vec<Keyword> {
    vec![
        Keyword {
            pseudo: true,
            ..Keyword::new(
                ALL,
                "all keywords available (glob pattern); to be used in conjunction with remove or add respectively",
                &[],
            )
        },
        Keyword::new("base", "CPSC 120-121-131-301 C++ development environment", BASE_PACKAGES)
            .with_setup(&BaseSetup),
        Keyword::new(
            "general",
            "General configuration, not tied to any specific course",
            GENERAL_PACKAGES,
        ),
        Keyword::new("latex", "LaTeX typesetting environment (large)", &["texlive-full"]),
        Keyword::new(
            "media",
            "Media Computation Tools",
            &["audacity", "blender", "gimp", "imagemagick", "sox", "vlc"],
        ),
        Keyword::new("upgrade", "Upgrade the entire system", &[]).with_setup(&SystemUpgrade),
        Keyword::new(
            "vbox",
            "A powerful x86 and AMD64/Intel64 virtualization product",
            &["virtualbox"],
        )
        .with_setup(&VirtualBox),
        Keyword::new("c121", "CPSC 121 (Object-Oriented Programming)", &["cimg-dev"]),
        Keyword::new(
            "c223j",
            "CPSC 223J (Java Programming)",
            &["geany", "gthumb", "openjdk-8-jdk", "openjdk-8-jre"],
        ),
        Keyword::new("c223n", "CPSC 223N (C# Programming)", &["mono-complete"]),
        Keyword::new(
            "c223p",
            "CPSC 223P (Python Programming)",
            &["python3", "python3-dev", "python3-pip", "virtualenvwrapper"],
        ),
        Keyword::new("c223w", "CPSC 223W (Swift Programming)", C223W_PACKAGES),
        Keyword::new("c240", "CPSC 240 (Assembler)", &["intel2gas", "nasm"]),
        Keyword::new("c351", "CPSC 351 (Operating Systems)", &[]).with_setup(&KernelHeaders),
        Keyword::new("c439", "CPSC 439 (Theory of Computation)", &["minisat2"]),
        Keyword::new(
            "c474",
            "CPSC 474 (Parallel and Distributed Computing)",
            &[
                "libopenmpi-dev",
                "mpi-default-dev",
                "mpich",
                "openmpi-bin",
                "openmpi-common",
            ],
        ),
        Keyword::new(
            "c481",
            "CPSC 481 (Artificial Intelligence)",
            &[
                "openjdk-8-jdk",
                "openjdk-8-jre",
                "sbcl",
                "swi-prolog-nox",
                "swi-prolog-x",
            ],
        ),
        Keyword::new(
            "c484",
            "CPSC 484 (Principles of Computer Graphics)",
            C484_PACKAGES,
        ),
        Keyword::new("test", "for testing purposes", &["cowsay"]),
    ]
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug)]
pub struct Registry {
    keywords: Vec<Keyword>,
}

impl Registry {
    pub fn builtin() -> Self {
        Self {
            keywords: catalog(),
        }
    }

    pub fn list_all(&self) -> &[Keyword] {
        &self.keywords
    }

    /// Exact, case-sensitive lookup.
    pub fn find(&self, name: &str) -> Result<&Keyword, UnknownKeyword> {
        self.keywords
            .iter()
            .find(|k| k.name == name)
            .ok_or_else(|| UnknownKeyword(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keywords.iter().any(|k| k.name == name)
    }

    /// Every real bundle, i.e. what `add all` installs.
    pub fn installable(&self) -> impl Iterator<Item = &Keyword> {
        self.keywords.iter().filter(|k| !k.pseudo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;
    use std::collections::HashSet;

    #[test]
    fn test_find_every_keyword() {
        let registry = Registry::builtin();
        for keyword in registry.list_all() {
            assert_eq!(registry.find(keyword.name).unwrap().name, keyword.name);
        }
    }

    #[test]
    fn test_find_unknown() {
        let registry = Registry::builtin();
        for name in ["doesnotexist", "", "Base", "BASE", "c121 ", "C121"] {
            let err = registry.find(name).unwrap_err();
            assert_eq!(err, UnknownKeyword(name.to_string()));
        }
        assert_eq!(
            UnknownKeyword("zoom".into()).to_string(),
            "unknown keyword \"zoom\", see valid keyword names with $ tuffix list"
        );
    }

    #[test]
    fn test_names_are_well_formed() {
        let registry = Registry::builtin();
        let mut seen = HashSet::new();
        for keyword in registry.list_all() {
            let name = keyword.name;
            assert!(name.len() <= KEYWORD_MAX_LENGTH, "{name} too long");
            assert!(name.starts_with(|c: char| c.is_ascii_lowercase()), "{name}");
            assert!(
                name.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()),
                "{name}"
            );
            assert!(seen.insert(name), "duplicate keyword {name}");
        }
    }

    #[test]
    fn test_package_names_are_valid() {
        for keyword in Registry::builtin().list_all() {
            for package in keyword.packages {
                assert!(Package::is_valid_name(package), "{}: {package}", keyword.name);
            }
        }
    }

    #[test]
    fn test_ordering() {
        let registry = Registry::builtin();
        let names: Vec<&str> = registry.list_all().iter().map(|k| k.name).collect();
        assert_eq!(names.first(), Some(&ALL));
        assert_eq!(names.last(), Some(&"test"));

        let first_course = names.iter().position(|n| n.starts_with('c')).unwrap();
        assert!(names[1..first_course].windows(2).all(|w| w[0] < w[1]));
        assert!(
            names[first_course..names.len() - 1]
                .iter()
                .all(|n| n.starts_with('c'))
        );
    }

    #[test]
    fn test_installable_excludes_all() {
        let registry = Registry::builtin();
        assert!(registry.installable().all(|k| k.name != ALL));
        assert_eq!(registry.installable().count(), registry.list_all().len() - 1);
    }

    #[test]
    fn test_apply_packages_only() {
        let backend = MockBackend::default();
        let ctx = SetupContext::new(backend.client());
        let registry = Registry::builtin();

        registry
            .find("media")
            .unwrap()
            .apply(Operation::Install, &ctx)
            .unwrap();
        assert_eq!(
            backend.calls(),
            vec!["install audacity blender gimp imagemagick sox vlc"]
        );

        registry
            .find("media")
            .unwrap()
            .apply(Operation::Remove, &ctx)
            .unwrap();
        assert_eq!(
            backend.calls().last().unwrap(),
            "remove audacity blender gimp imagemagick sox vlc"
        );
    }

    #[test]
    fn test_apply_rejected_package() {
        let backend = MockBackend::rejecting("cimg-dev");
        let ctx = SetupContext::new(backend.client());
        let err = Registry::builtin()
            .find("c121")
            .unwrap()
            .apply(Operation::Install, &ctx)
            .unwrap_err();
        assert!(matches!(err, SetupError::Rejected(_)));
        assert!(err.to_string().contains("cimg-dev"));
    }

    #[test]
    fn test_system_upgrade() {
        let backend = MockBackend::default();
        let ctx = SetupContext::new(backend.client());
        let registry = Registry::builtin();
        let upgrade = registry.find("upgrade").unwrap();

        upgrade.apply(Operation::Install, &ctx).unwrap();
        assert_eq!(backend.calls(), vec!["update", "upgrade"]);

        upgrade.apply(Operation::Remove, &ctx).unwrap();
        assert_eq!(backend.calls().len(), 2);
    }

    #[test]
    fn test_base_without_git_identity_only_installs() {
        let backend = MockBackend::default();
        let ctx = SetupContext::new(backend.client());
        Registry::builtin()
            .find("base")
            .unwrap()
            .apply(Operation::Install, &ctx)
            .unwrap();
        assert_eq!(backend.calls().len(), 1);
        assert!(backend.calls()[0].starts_with("install build-essential"));
    }
}
