//! Manifests holds the `xtask manifests` subcommand: render the CRD YAML for the foreign
//! Flux/Argo CRDs [`kubescout_api`] derives `kube::CustomResource` structs for, so a developer
//! can `kubectl apply` them into a local KinD cluster and exercise the scanner by hand. Not part
//! of the runtime binary — kubescout never installs CRDs, it only reads objects of these kinds.

use std::fs::File;
use std::path::{Path, PathBuf};

use kube::{CustomResourceExt, Resource};
use kubescout_api::argo::Application;
use kubescout_api::flux::{Bucket, GitRepository, HelmRelease, HelmRepository, Kustomization, OCIRepository};

use crate::Result;

macro_rules! write_crds {
    ($out_dir:ident, $($kind:ty),+ $(,)?) => {
        eprintln!("# writing to dir: {}", crate::rel($out_dir));
        $( write_crd::<$kind, _>($out_dir)?; )+
    };
}

pub fn command(opts: ManifestsOpts) -> Result<()> {
    let out = opts.out_dir.join("crd");
    let out = out.as_path();
    std::fs::create_dir_all(out)?;
    write_crds!(out, GitRepository, OCIRepository, HelmRepository, Bucket, Kustomization, HelmRelease, Application);
    Ok(())
}

fn write_crd<K, P>(out_dir: P) -> Result<()>
where
    K: Resource<DynamicType = ()> + CustomResourceExt,
    P: AsRef<Path>,
{
    let doc = serde_json::to_value(K::crd())?;
    let out = out_dir.as_ref().join(format!("{}.yaml", K::crd_name()));
    let w = File::create(&out)?;
    serde_yaml::to_writer(&w, &doc)?;
    eprintln!("# wrote: {}", out.file_name().unwrap().to_string_lossy());
    Ok(())
}

pub struct ManifestsOpts {
    out_dir: PathBuf,
}

impl From<&clap::ArgMatches> for ManifestsOpts {
    fn from(m: &clap::ArgMatches) -> Self {
        let mut out_dir = m
            .get_one::<String>("out_dir")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config/crd"));
        if !out_dir.is_absolute() {
            out_dir = crate::WORKSPACE.join(out_dir);
        }
        Self { out_dir }
    }
}
