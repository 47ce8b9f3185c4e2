use std::{
    borrow::Cow,
    env,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use xshell::Shell;

pub mod check;
pub mod manifests;

pub type DynError = Box<dyn std::error::Error>;
pub type Result<T> = std::result::Result<T, DynError>;

pub static CARGO: LazyLock<PathBuf> = LazyLock::new(|| env::var_os("CARGO").unwrap().into());

// Paths:
pub static WORKSPACE: LazyLock<PathBuf> = LazyLock::new(|| {
    Path::new(&env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(1)
        .unwrap()
        .to_path_buf()
});
pub static BIN_DIR: LazyLock<PathBuf> = LazyLock::new(|| WORKSPACE.join(".bin"));

/// Versions of external CLIs this workspace's `check`/`manifests` subcommands rely on for local
/// KinD testing, read from `[workspace.metadata.ci]` unless overridden by an env var of the same
/// name — the teacher's own `KUBE_VERSION`/`KIND_VERSION` scheme.
static METADATA: LazyLock<CargoMetadata> = LazyLock::new(|| {
    let cargo: &Path = &CARGO;
    let sh = Shell::new().expect("unable to create xshell");
    let out = xshell::cmd!(sh, "{cargo} metadata --format-version=1")
        .quiet()
        .output()
        .expect("failed to get cargo metadata");
    serde_json::from_slice(&out.stdout).expect("unable to parse JSON")
});

#[derive(serde::Deserialize)]
struct CargoMetadata {
    metadata: Metadata,
}

impl CargoMetadata {
    fn kube(&self) -> String {
        self.metadata.ci.kube.clone()
    }
    fn kind(&self) -> String {
        self.metadata.ci.kind.clone()
    }
}

#[derive(serde::Deserialize)]
struct Metadata {
    ci: CiVersions,
}

#[derive(serde::Deserialize)]
struct CiVersions {
    #[serde(rename = "kube-version")]
    kube: String,
    #[serde(rename = "kind-version")]
    kind: String,
}

pub static KUBE_VERSION: LazyLock<String> =
    LazyLock::new(|| env::var("KUBE_VERSION").unwrap_or_else(|_| METADATA.kube()));
pub static KIND_VERSION: LazyLock<String> =
    LazyLock::new(|| env::var("KIND_VERSION").unwrap_or_else(|_| METADATA.kind()));

/// Shell constructs a [`Shell`] with `.bin` prepended to `PATH`, the way the teacher's own
/// `xtask::shell` makes locally-downloaded tool binaries (`kind`, `kubectl`) visible.
pub fn shell() -> xshell::Result<Shell> {
    let sh = Shell::new()?;
    let p = env::var("PATH").expect("PATH environment variable missing");
    let paths = std::iter::once(BIN_DIR.to_path_buf()).chain(std::env::split_paths(&p));
    sh.set_var("PATH", std::env::join_paths(paths).expect("unable to reconstruct PATH"));
    sh.change_dir(WORKSPACE.as_path());
    Ok(sh)
}

/// Rel constructs a path relative to the workspace, for progress messages.
pub fn rel(p: &Path) -> Cow<'_, str> {
    p.strip_prefix(WORKSPACE.as_path()).unwrap().to_string_lossy()
}
