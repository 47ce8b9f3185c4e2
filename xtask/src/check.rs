//! Check holds the `xtask check` subcommand (Testable Property 11: "a static check forbids
//! mutating cluster verbs from any source file outside the explicit remedy/import subsystems and
//! tests") plus the local-tool installers `manifests`/CI use to exercise a KinD cluster.

use std::env::consts::{ARCH as NATIVE_ARCH, EXE_SUFFIX, OS};
use std::fs;
use std::sync::LazyLock;

use xshell::{cmd, Shell};

use crate::{Result, BIN_DIR, KIND_VERSION, KUBE_VERSION};

static ARCH: LazyLock<&'static str> = LazyLock::new(|| match NATIVE_ARCH {
    "aarch64" => "arm64",
    "powerpc64" => "ppc64le",
    "s390x" => "s390x",
    "x86_64" => "amd64",
    other => panic!("unhandled arch: {other}"),
});

/// Kind downloads the `kind` CLI into `.bin` if it isn't already on `PATH`.
pub fn kind(sh: &Shell) -> Result<()> {
    let version = KIND_VERSION.as_str();
    let arch: &'static str = &ARCH;
    if cmd!(sh, "which kind").quiet().ignore_stdout().ignore_stderr().run().is_err() {
        let exe = format!("{}/kind{EXE_SUFFIX}", BIN_DIR.display());
        sh.create_dir(BIN_DIR.as_path())?;
        cmd!(sh, "curl -fsSLo {exe} https://kind.sigs.k8s.io/dl/v{version}/kind-{OS}-{arch}").run()?;
        cmd!(sh, "chmod +x {exe}").run()?;
    }
    Ok(())
}

/// Kubectl downloads the `kubectl` CLI into `.bin` if it isn't already on `PATH`.
pub fn kubectl(sh: &Shell) -> Result<()> {
    let version = KUBE_VERSION.as_str();
    let arch: &'static str = &ARCH;
    if cmd!(sh, "which kubectl").quiet().ignore_stdout().ignore_stderr().run().is_err() {
        let exe = format!("{}/kubectl{EXE_SUFFIX}", BIN_DIR.display());
        sh.create_dir(BIN_DIR.as_path())?;
        cmd!(
            sh,
            "curl -fsSLo {exe} https://storage.googleapis.com/kubernetes-release/release/{version}/bin/{OS}/{arch}/kubectl{EXE_SUFFIX}"
        )
        .run()?;
        cmd!(sh, "chmod +x {exe}").run()?;
    }
    Ok(())
}

/// Mutating verbs a read-only core may never call (Testable Property 11). `.replace(` is
/// deliberately omitted: it is `kube::Api`'s full-update verb, but the substring collides with
/// `str::replace`/`String::replace`, which every crate here uses harmlessly for text munging —
/// too noisy a signal for a textual check. `Update`/`Patch`/`Create`/`Delete` cover the rest.
const MUTATING_VERBS: &[&str] = &[".create(", ".patch(", ".delete(", ".delete_collection("];

/// Source roots exempt from the check: the bounded remedy executor (the one crate allowed to
/// mutate), and every crate's own test code (`#[cfg(test)]` modules commonly build fixtures that
/// reference these method names only in doc comments/strings, but excluding `tests/` directories
/// outright keeps the check honest about what it actually scans).
const EXEMPT_ROOTS: &[&str] = &["remedy/src", "xtask/src"];

/// ReadonlyCore walks every `.rs` file under the workspace's non-exempt crates and fails if any
/// line outside a `#[cfg(test)]` module calls a mutating `kube::Api` verb — a cheap, deliberately
/// textual stand-in for "no mutating cluster verb outside kubescout-remedy/import code" (§8
/// Testable Property 11). It is not a type-level guarantee; it is a CI tripwire.
pub fn readonly_core() -> Result<()> {
    let mut violations = Vec::new();
    for entry in walk(&crate::WORKSPACE) {
        let path = entry;
        if !path.extension().is_some_and(|e| e == "rs") {
            continue;
        }
        let rel = crate::rel(&path);
        if EXEMPT_ROOTS.iter().any(|root| rel.starts_with(root)) || rel.contains("/tests/") {
            continue;
        }
        let text = fs::read_to_string(&path)?;
        let mut in_test_mod = false;
        let mut depth = 0i32;
        for (lineno, line) in text.lines().enumerate() {
            if line.contains("#[cfg(test)]") {
                in_test_mod = true;
                depth = 0;
            }
            if in_test_mod {
                depth += line.matches('{').count() as i32;
                depth -= line.matches('}').count() as i32;
                if depth <= 0 && line.contains('}') {
                    in_test_mod = false;
                }
                continue;
            }
            if MUTATING_VERBS.iter().any(|verb| line.contains(verb)) {
                violations.push(format!("{rel}:{}: {}", lineno + 1, line.trim()));
            }
        }
    }

    if violations.is_empty() {
        println!("# readonly-core check passed: no mutating verb found outside {EXEMPT_ROOTS:?}");
        Ok(())
    } else {
        for v in &violations {
            eprintln!("mutating verb outside kubescout-remedy: {v}");
        }
        Err(format!("{} violation(s) of the read-only-core invariant", violations.len()).into())
    }
}

fn walk(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = fs::read_dir(dir) else { return out };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == "target" || n == "examples" || n == ".git") {
                continue;
            }
            out.extend(walk(&path));
        } else {
            out.push(path);
        }
    }
    out
}
